//! Masternode record and lifecycle state machine

use crate::chain::ChainView;
use crate::heartbeat::Heartbeat;
use crate::schedules;
use crate::service::ServiceAddress;
use crate::signed_message::MessageVersion;
use meridian_core::{ChainParams, Hash256, Outpoint, TxIn, WireWriter};
use meridian_crypto::{hash_sha256d, p2pkh_script, public_key_to_address};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rate limit between non-forced checks of one record.
pub const CHECK_SECONDS: i64 = 5;

/// Minimum gap between a record's announcement time and its latest ping
/// before it graduates from pre-enabled. Doubles as the expected ping
/// cadence; duplicate pings within `MIN_PING_SECONDS - 60` are dropped.
pub const MIN_PING_SECONDS: i64 = 10 * 60;

/// Cool-down between accepted announcements for the same record.
pub const MIN_ANNOUNCE_SECONDS: i64 = 5 * 60;

/// A record not pinged for this long is expired.
pub const EXPIRATION_SECONDS: i64 = 65 * 60;

/// A record not pinged for this long is removed.
pub const REMOVAL_SECONDS: i64 = 75 * 60;

/// Confirmations the collateral needs before an announcement is
/// admitted.
pub const MIN_CONFIRMATIONS: i32 = 15;

/// A ping's referenced block must be within this many blocks of the
/// tip.
pub const PING_BLOCK_AGE_MAX: i32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MasternodeState {
    /// Announced, but the first post-announcement ping has not landed.
    PreEnabled,
    /// Alive and eligible for payment election.
    Enabled,
    /// No ping within [`EXPIRATION_SECONDS`].
    Expired,
    /// No ping within [`REMOVAL_SECONDS`]; swept on the next pass.
    Removed,
    /// Collateral was spent or burned. Terminal.
    CollateralSpent,
}

/// Everything `check` needs from the outside world.
pub struct CheckContext<'a> {
    pub chain: &'a dyn ChainView,
    pub params: &'a ChainParams,
    pub now: i64,
}

/// Live state of one known masternode. Owned exclusively by the
/// registry; everything else borrows for the duration of one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasternodeRecord {
    pub collateral: TxIn,
    pub service: ServiceAddress,
    pub collateral_pubkey: Vec<u8>,
    pub operator_pubkey: Vec<u8>,
    pub protocol_version: u32,
    pub sig_time: i64,
    pub mess_version: MessageVersion,
    pub signature: Vec<u8>,
    pub last_ping: Option<Heartbeat>,
    pub state: MasternodeState,
    pub last_check_time: i64,
    /// Mixing sequence counter; carried for peers, not interpreted here.
    pub last_dsq: i64,
}

impl MasternodeRecord {
    pub fn outpoint(&self) -> Outpoint {
        self.collateral.prevout
    }

    pub fn is_enabled(&self) -> bool {
        self.state == MasternodeState::Enabled
    }

    /// Was the last accepted ping within `window` seconds of `at`?
    pub fn is_pinged_within(&self, window: i64, at: i64) -> bool {
        match &self.last_ping {
            Some(ping) => at - ping.sig_time < window,
            None => false,
        }
    }

    /// Was the current announcement accepted within `window` seconds of
    /// `now`?
    pub fn is_broadcast_within(&self, window: i64, now: i64) -> bool {
        now - self.sig_time < window
    }

    /// Re-evaluate the lifecycle state.
    ///
    /// Rate-limited to once per [`CHECK_SECONDS`] unless forced. Returns
    /// without touching state on host shutdown, and keeps the previous
    /// state when the chain lock cannot be taken without blocking.
    pub fn check(&mut self, force: bool, ctx: &CheckContext) {
        if ctx.chain.shutdown_requested() {
            return;
        }

        if !force && ctx.now - self.last_check_time < CHECK_SECONDS {
            return;
        }
        self.last_check_time = ctx.now;

        // once spent, stop doing the checks
        if self.state == MasternodeState::CollateralSpent {
            return;
        }

        if !self.is_pinged_within(REMOVAL_SECONDS, ctx.now) {
            self.state = MasternodeState::Removed;
            return;
        }

        if !self.is_pinged_within(EXPIRATION_SECONDS, ctx.now) {
            self.state = MasternodeState::Expired;
            return;
        }

        let ping_gap = self
            .last_ping
            .as_ref()
            .map(|ping| ping.sig_time - self.sig_time)
            .unwrap_or(0);
        if ping_gap < MIN_PING_SECONDS {
            self.state = MasternodeState::PreEnabled;
            return;
        }

        if let Some(script) = p2pkh_script(&self.collateral_pubkey) {
            let tip = ctx.chain.tip_height();
            let required = schedules::collateral_at(tip);
            match ctx
                .chain
                .try_collateral_spendable(&self.outpoint(), required, &script)
            {
                None => {
                    debug!(masternode = %self.outpoint(), "check deferred, chain busy");
                    return;
                }
                Some(false) => {
                    self.state = MasternodeState::CollateralSpent;
                    return;
                }
                Some(true) => {}
            }
        }

        let address = public_key_to_address(ctx.params.address_prefix, &self.collateral_pubkey);
        if let Some(burn_height) = ctx.params.burn_height(&address) {
            if burn_height < ctx.chain.tip_height() {
                self.state = MasternodeState::CollateralSpent;
                return;
            }
        }

        self.state = MasternodeState::Enabled;
    }

    /// Digest binding this record's identity for payment tie-breaking.
    fn payment_fingerprint(&self) -> Hash256 {
        let mut w = WireWriter::new();
        w.write_outpoint(&self.outpoint());
        w.write_i64_le(self.sig_time);
        hash_sha256d(w.as_bytes())
    }

    /// Seconds since this masternode was last paid. With no payment on
    /// record (or one older than 30 days) the result is 30 days plus a
    /// deterministic per-record offset, so unpaid nodes sort in a
    /// stable, network-agreed order. The offset uses the compact hash
    /// encoding and is consensus-observable.
    pub fn seconds_since_payment(&self, now: i64, last_paid: i64) -> i64 {
        let sec = now - last_paid;
        let month = 60 * 60 * 24 * 30;
        if sec < month {
            return sec;
        }
        month + self.payment_fingerprint().get_compact() as i64
    }

    /// Deterministic tie-break offset in seconds, under 2.5 minutes.
    pub fn payment_rank_offset(&self) -> i64 {
        (self.payment_fingerprint().get_compact() % 150) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::Hash256;

    fn record_with_ping(sig_time: i64, ping_time: Option<i64>) -> MasternodeRecord {
        let outpoint = Outpoint::new(Hash256([7; 32]), 0);
        MasternodeRecord {
            collateral: TxIn::from_outpoint(outpoint),
            service: ServiceAddress::parse("203.0.113.1:10100", 10100).unwrap(),
            collateral_pubkey: vec![1; 32],
            operator_pubkey: vec![2; 32],
            protocol_version: meridian_core::PROTOCOL_VERSION,
            sig_time,
            mess_version: MessageVersion::LegacyStr,
            signature: Vec::new(),
            last_ping: ping_time.map(|t| Heartbeat {
                collateral: TxIn::from_outpoint(outpoint),
                block_hash: Hash256::ZERO,
                sig_time: t,
                mess_version: MessageVersion::LegacyStr,
                signature: Vec::new(),
            }),
            state: MasternodeState::PreEnabled,
            last_check_time: 0,
            last_dsq: 0,
        }
    }

    #[test]
    fn test_pinged_within() {
        let record = record_with_ping(1_000, Some(2_000));
        assert!(record.is_pinged_within(100, 2_050));
        assert!(!record.is_pinged_within(100, 2_100));
        assert!(!record_with_ping(1_000, None).is_pinged_within(i64::MAX, 0));
    }

    #[test]
    fn test_broadcast_within() {
        let record = record_with_ping(1_000, None);
        assert!(record.is_broadcast_within(300, 1_299));
        assert!(!record.is_broadcast_within(300, 1_300));
    }

    #[test]
    fn test_seconds_since_payment_recent() {
        let record = record_with_ping(1_000, None);
        assert_eq!(record.seconds_since_payment(5_000, 4_000), 1_000);
    }

    #[test]
    fn test_seconds_since_payment_sentinel_is_deterministic() {
        let record = record_with_ping(1_000, None);
        let month = 60 * 60 * 24 * 30;
        let a = record.seconds_since_payment(month + 1, 0);
        let b = record.seconds_since_payment(month + 99_999, 0);
        assert_eq!(a, b);
        assert!(a > month);
    }

    #[test]
    fn test_payment_rank_offset_bounded() {
        let offset = record_with_ping(1_000, None).payment_rank_offset();
        assert!((0..150).contains(&offset));
    }
}
