//! Masternode heartbeat (keep-alive ping)
//!
//! A ping binds the masternode's collateral outpoint to a recent block
//! hash and a timestamp, signed by the operator key. The block
//! reference sits 12 blocks behind the tip so short reorgs do not
//! invalidate pings in flight.

use crate::chain::ChainView;
use crate::error::{AdmitOutcome, RejectKind};
use crate::manager::MasternodeManager;
use crate::record::{CheckContext, MasternodeState, MIN_PING_SECONDS, PING_BLOCK_AGE_MAX};
use crate::signed_message::{MessageVersion, SignedMessage};
use meridian_core::{Hash256, Outpoint, TxIn, WireWriter, ACTIVE_PROTOCOL};
use meridian_crypto::hash_sha256d;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Depth of the block reference carried by a new ping.
const PING_BLOCK_DEPTH: i32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub collateral: TxIn,
    pub block_hash: Hash256,
    pub sig_time: i64,
    pub mess_version: MessageVersion,
    pub signature: Vec<u8>,
}

impl Heartbeat {
    /// Build an unsigned ping for `outpoint`, stamped `now`, referencing
    /// the block [`PING_BLOCK_DEPTH`] behind the tip once the chain is
    /// tall enough.
    pub fn new(outpoint: Outpoint, chain: &dyn ChainView, now: i64) -> Self {
        let mut block_hash = Hash256::ZERO;
        let tip = chain.tip_height();
        if tip > PING_BLOCK_DEPTH {
            if let Some(hash) = chain.block_hash_at(tip - PING_BLOCK_DEPTH) {
                block_hash = hash;
            }
        }
        Heartbeat {
            collateral: TxIn::from_outpoint(outpoint),
            block_hash,
            sig_time: now,
            mess_version: MessageVersion::LegacyStr,
            signature: Vec::new(),
        }
    }

    pub fn outpoint(&self) -> Outpoint {
        self.collateral.prevout
    }

    /// Inventory hash. The runtime salt, when set, perturbs every ping
    /// hash on the network at once; legacy-scheme pings omit the block
    /// hash exactly as they always have.
    pub fn hash(&self, salt: i64) -> Hash256 {
        let mut w = WireWriter::new();
        w.write_outpoint(&self.outpoint());
        if self.mess_version == MessageVersion::Hash {
            w.write_hash(&self.block_hash);
        }
        w.write_i64_le(self.sig_time);
        if salt > 0 {
            w.write_i64_le(salt);
        }
        hash_sha256d(w.as_bytes())
    }
}

impl SignedMessage for Heartbeat {
    fn mess_version(&self) -> MessageVersion {
        self.mess_version
    }

    fn set_mess_version(&mut self, version: MessageVersion) {
        self.mess_version = version;
    }

    fn signature(&self) -> &[u8] {
        &self.signature
    }

    fn set_signature(&mut self, signature: Vec<u8>) {
        self.signature = signature;
    }

    fn signature_hash(&self) -> Hash256 {
        let mut w = WireWriter::new();
        w.write_outpoint(&self.outpoint());
        w.write_hash(&self.block_hash);
        w.write_i64_le(self.sig_time);
        hash_sha256d(w.as_bytes())
    }

    fn str_message(&self) -> String {
        format!(
            "{}{}{}",
            self.outpoint(),
            self.block_hash.to_hex(),
            self.sig_time
        )
    }
}

impl MasternodeManager {
    /// Process a ping delivered by the network. Duplicates are dropped
    /// via the seen cache before any validation runs.
    pub fn submit_ping(&self, ping: Heartbeat) -> AdmitOutcome {
        let hash = ping.hash(self.sporks.ping_salt());
        if self.registry.has_seen_ping(&hash) {
            return AdmitOutcome::Ignored;
        }
        self.registry.note_seen_ping(hash, ping.clone());
        self.check_ping(&ping, false, false)
    }

    /// Shared ping validation. `sig_time_only` is the reduced mode used
    /// for the ping embedded in an announcement; `require_enabled`
    /// restricts updates to enabled records.
    pub(crate) fn check_ping(
        &self,
        ping: &Heartbeat,
        require_enabled: bool,
        sig_time_only: bool,
    ) -> AdmitOutcome {
        let now = self.clock.adjusted_time();
        if ping.sig_time > now + 60 * 60 {
            debug!(masternode = %ping.outpoint(), sig_time = ping.sig_time, "ping too far into the future");
            return AdmitOutcome::rejected(RejectKind::FutureTimestamp, 1);
        }
        if ping.sig_time <= now - 60 * 60 {
            debug!(masternode = %ping.outpoint(), sig_time = ping.sig_time, "ping too far into the past");
            return AdmitOutcome::rejected(RejectKind::StaleTimestamp, 1);
        }

        let record_arc = self.registry.find(&ping.outpoint());

        if sig_time_only {
            if let Some(arc) = record_arc {
                let record = arc.lock();
                if ping
                    .verify(&record.operator_pubkey, self.params.message_magic)
                    .is_err()
                {
                    return AdmitOutcome::rejected(RejectKind::BadSignature, 33);
                }
            }
            return AdmitOutcome::Accepted { relay: false };
        }

        let Some(arc) = record_arc else {
            // record may arrive later; not the peer's fault
            debug!(masternode = %ping.outpoint(), "ping for unknown masternode");
            return AdmitOutcome::Ignored;
        };
        let mut record = arc.lock();

        // spent collateral is terminal; nothing revives the record
        if record.state == MasternodeState::CollateralSpent {
            return AdmitOutcome::Ignored;
        }

        if record.protocol_version < ACTIVE_PROTOCOL {
            return AdmitOutcome::Ignored;
        }
        if require_enabled && !record.is_enabled() {
            return AdmitOutcome::Ignored;
        }

        // update only when the previous ping is old enough relative to
        // this one; anything quicker is a duplicate
        if record.is_pinged_within(MIN_PING_SECONDS - 60, ping.sig_time) {
            debug!(masternode = %ping.outpoint(), "ping arrived too early");
            return AdmitOutcome::Ignored;
        }

        if ping
            .verify(&record.operator_pubkey, self.params.message_magic)
            .is_err()
        {
            return AdmitOutcome::rejected(RejectKind::BadSignature, 33);
        }

        // the referenced block must exist, be on the active chain, and
        // sit close enough to the tip; otherwise keep the ping visible
        // but do not update the record and do not relay
        let Some(meta) = self.chain.find_block(&ping.block_hash) else {
            debug!(masternode = %ping.outpoint(), block = %ping.block_hash, "ping references unknown block");
            return AdmitOutcome::Ignored;
        };
        if !self.chain.contains(&ping.block_hash)
            || self.chain.tip_height() - meta.height > PING_BLOCK_AGE_MAX
        {
            debug!(masternode = %ping.outpoint(), block = %ping.block_hash, "ping block is stale or off-chain");
            return AdmitOutcome::Ignored;
        }

        record.last_ping = Some(ping.clone());
        self.registry.refresh_seen_announcement_ping(&record, ping);

        let ctx = CheckContext {
            chain: self.chain.as_ref(),
            params: &self.params,
            now,
        };
        record.check(true, &ctx);
        if !record.is_enabled() {
            return AdmitOutcome::Accepted { relay: false };
        }

        info!(masternode = %ping.outpoint(), "masternode ping accepted");
        self.network.relay(
            crate::net::InvKind::MasternodePing,
            ping.hash(self.sporks.ping_salt()),
        );
        AdmitOutcome::Accepted { relay: true }
    }
}
