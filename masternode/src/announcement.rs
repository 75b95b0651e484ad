//! Masternode announcement (broadcast)
//!
//! The signed message that introduces a masternode to the registry or
//! refreshes one already known. Carries a full record snapshot plus an
//! initial heartbeat, signed by the collateral key.

use crate::chain::{ChainView, TimeSource};
use crate::error::{AdmitOutcome, MasternodeError, RejectKind, Result};
use crate::heartbeat::Heartbeat;
use crate::manager::MasternodeManager;
use crate::net::InvKind;
use crate::record::{
    CheckContext, MasternodeRecord, MasternodeState, MIN_ANNOUNCE_SECONDS, MIN_CONFIRMATIONS,
};
use crate::schedules;
use crate::service::ServiceAddress;
use crate::signed_message::{MessageVersion, SignedMessage};
use crate::signer::WalletSigner;
use meridian_core::{
    ChainParams, Hash256, NetworkUpgrade, Outpoint, TxIn, WireWriter, ACTIVE_PROTOCOL,
    MIN_PEER_ANNOUNCE_PROTOCOL, PROTOCOL_VERSION,
};
use meridian_crypto::{hash_sha256d, key_id, p2pkh_script, KeyPair};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub collateral: TxIn,
    pub service: ServiceAddress,
    pub collateral_pubkey: Vec<u8>,
    pub operator_pubkey: Vec<u8>,
    pub protocol_version: u32,
    pub sig_time: i64,
    pub mess_version: MessageVersion,
    pub signature: Vec<u8>,
    pub last_ping: Option<Heartbeat>,
    pub last_dsq: i64,
}

impl Announcement {
    pub fn outpoint(&self) -> Outpoint {
        self.collateral.prevout
    }

    /// Inventory hash: timing and collateral key only, so re-announces
    /// that change nothing else dedupe against each other.
    pub fn hash(&self) -> Hash256 {
        let mut w = WireWriter::new();
        w.write_i64_le(self.sig_time);
        w.write_var_bytes(&self.collateral_pubkey);
        hash_sha256d(w.as_bytes())
    }

    pub fn from_record(record: &MasternodeRecord) -> Self {
        Announcement {
            collateral: record.collateral.clone(),
            service: record.service,
            collateral_pubkey: record.collateral_pubkey.clone(),
            operator_pubkey: record.operator_pubkey.clone(),
            protocol_version: record.protocol_version,
            sig_time: record.sig_time,
            mess_version: record.mess_version,
            signature: record.signature.clone(),
            last_ping: record.last_ping.clone(),
            last_dsq: record.last_dsq,
        }
    }

    /// Build, sign and sanity-check an announcement for our own
    /// masternode.
    ///
    /// `service` is `ip[:port]` with the network default substituted
    /// when omitted; `operator_secret` is the hex operator signing key;
    /// the collateral is named by txid and output index and must
    /// resolve, via the wallet, to an unspent output of exactly the
    /// collateral amount for the current height.
    pub fn create(
        service: &str,
        operator_secret: &str,
        collateral_txid: &str,
        collateral_index: &str,
        offline: bool,
        chain: &dyn ChainView,
        signer: &dyn WalletSigner,
        params: &ChainParams,
        clock: &dyn TimeSource,
    ) -> Result<Announcement> {
        // need correct blocks to send the embedded ping
        if !offline && !chain.is_blockchain_synced() {
            warn!("masternode announcement refused, blockchain not synced");
            return Err(MasternodeError::NotSynced);
        }

        let operator_keys = KeyPair::from_private_key_hex(operator_secret)
            .map_err(|_| MasternodeError::BadKey("invalid operator secret".to_string()))?;

        let txid = Hash256::from_hex(collateral_txid).ok_or_else(|| {
            MasternodeError::CollateralNotFound(format!("{}-{}", collateral_txid, collateral_index))
        })?;
        let index: u32 = collateral_index.parse().map_err(|_| {
            MasternodeError::CollateralNotFound(format!("{}-{}", collateral_txid, collateral_index))
        })?;

        let tip = chain.tip_height();
        let required = schedules::collateral_at(tip);
        let collateral = signer.collateral_keys(&txid, index, required).ok_or_else(|| {
            MasternodeError::CollateralNotFound(format!("{}-{}", collateral_txid, collateral_index))
        })?;

        let service = ServiceAddress::parse(service, params.default_port)?;
        if service.port() != params.default_port {
            return Err(MasternodeError::WrongPort {
                got: service.port(),
                expected: params.default_port,
            });
        }

        let hashed_scheme = chain.network_upgrade_active(NetworkUpgrade::HashedMessages, tip);
        let now = clock.adjusted_time();

        let mut ping = Heartbeat::new(collateral.txin.prevout, chain, now);
        ping.sign(&operator_keys, params.message_magic, hashed_scheme)?;

        let mut mnb = Announcement {
            collateral: collateral.txin.clone(),
            service,
            collateral_pubkey: collateral.keypair.public_key(),
            operator_pubkey: operator_keys.public_key(),
            protocol_version: PROTOCOL_VERSION,
            sig_time: now,
            mess_version: MessageVersion::LegacyStr,
            signature: Vec::new(),
            last_ping: Some(ping),
            last_dsq: 0,
        };
        mnb.sign(&collateral.keypair, params.message_magic, hashed_scheme)?;

        if !params.is_regtest() && !mnb.service.is_routable() {
            return Err(MasternodeError::BadAddress(mnb.service.to_string()));
        }

        info!(masternode = %mnb.outpoint(), service = %mnb.service, "masternode announcement created");
        Ok(mnb)
    }
}

impl SignedMessage for Announcement {
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
        w.write_u8(self.mess_version.wire_byte());
        w.write_var_str(&self.service.to_string());
        w.write_i64_le(self.sig_time);
        w.write_var_bytes(&self.collateral_pubkey);
        w.write_var_bytes(&self.operator_pubkey);
        w.write_u32_le(self.protocol_version);
        hash_sha256d(w.as_bytes())
    }

    fn str_message(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.service,
            self.sig_time,
            hex::encode(key_id(&self.collateral_pubkey)),
            hex::encode(key_id(&self.operator_pubkey)),
            self.protocol_version
        )
    }

    fn legacy_str_message(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.service,
            self.sig_time,
            hex::encode(&self.collateral_pubkey),
            hex::encode(&self.operator_pubkey),
            self.protocol_version
        )
    }
}

impl MasternodeManager {
    /// Process an announcement delivered by the network.
    ///
    /// Runs the structural checks, then either refreshes the existing
    /// record or, for an unknown collateral, verifies the collateral
    /// against the chain and inserts a new record.
    pub fn submit_announcement(&self, mnb: Announcement) -> AdmitOutcome {
        let hash = mnb.hash();
        if self.registry.has_seen_announcement(&hash) {
            debug!(masternode = %mnb.outpoint(), "duplicate announcement dropped");
            return AdmitOutcome::Ignored;
        }
        self.registry.note_seen_announcement(hash, mnb.clone());

        if let Err(outcome) = self.screen_announcement(&mnb) {
            return outcome;
        }
        if let Some(outcome) = self.update_existing(&mnb) {
            return outcome;
        }
        self.admit_new(&mnb, hash)
    }

    /// Structural and signature checks, in strict order, abort on first
    /// failure. No registry mutation happens here.
    fn screen_announcement(&self, mnb: &Announcement) -> std::result::Result<(), AdmitOutcome> {
        let now = self.clock.adjusted_time();

        // signature from the past is fine, the future is not
        if mnb.sig_time > now + 60 * 60 {
            debug!(masternode = %mnb.outpoint(), sig_time = mnb.sig_time, "announcement too far into the future");
            return Err(AdmitOutcome::rejected(RejectKind::FutureTimestamp, 1));
        }

        match &mnb.last_ping {
            None => {
                debug!(masternode = %mnb.outpoint(), "announcement without embedded ping");
                return Err(AdmitOutcome::Ignored);
            }
            Some(ping) => match self.check_ping(ping, false, true) {
                AdmitOutcome::Accepted { .. } => {}
                AdmitOutcome::Ignored => return Err(AdmitOutcome::Ignored),
                AdmitOutcome::RejectedTransient => return Err(AdmitOutcome::RejectedTransient),
                AdmitOutcome::RejectedPermanent { misbehavior, .. } => {
                    return Err(AdmitOutcome::rejected(RejectKind::BadPing, misbehavior));
                }
            },
        }

        if mnb.protocol_version < ACTIVE_PROTOCOL {
            debug!(masternode = %mnb.outpoint(), protocol = mnb.protocol_version, "outdated announcement protocol");
            return Err(AdmitOutcome::Ignored);
        }

        if p2pkh_script(&mnb.collateral_pubkey).is_none()
            || p2pkh_script(&mnb.operator_pubkey).is_none()
        {
            debug!(masternode = %mnb.outpoint(), "announcement pubkey of the wrong size");
            return Err(AdmitOutcome::rejected(RejectKind::BadKey, 100));
        }

        if !mnb.collateral.script_sig.is_empty() {
            debug!(masternode = %mnb.outpoint(), "announcement collateral carries a scriptSig");
            return Err(AdmitOutcome::Ignored);
        }

        match mnb.verify(&mnb.collateral_pubkey, self.params.message_magic) {
            Ok(scheme) => {
                debug!(masternode = %mnb.outpoint(), scheme = ?scheme, "announcement signature verified");
            }
            Err(_) => {
                // peers below the announce protocol cutoff still sign the
                // historic format; their mismatches carry no penalty
                if mnb.protocol_version <= MIN_PEER_ANNOUNCE_PROTOCOL {
                    return Err(AdmitOutcome::Ignored);
                }
                warn!(masternode = %mnb.outpoint(), "bad announcement signature");
                return Err(AdmitOutcome::rejected(RejectKind::BadSignature, 100));
            }
        }

        if mnb.service.port() != self.params.default_port {
            warn!(
                masternode = %mnb.outpoint(),
                port = mnb.service.port(),
                expected = self.params.default_port,
                "announcement with invalid port"
            );
            return Err(AdmitOutcome::rejected(RejectKind::WrongPort, 0));
        }

        Ok(())
    }

    /// Refresh path for a collateral we already track. None means no
    /// record exists and admission continues on the fresh path.
    fn update_existing(&self, mnb: &Announcement) -> Option<AdmitOutcome> {
        let arc = self.registry.find(&mnb.outpoint())?;
        let mut record = arc.lock();
        let now = self.clock.adjusted_time();

        // never roll a record back in time
        if mnb.sig_time <= record.sig_time {
            warn!(
                masternode = %mnb.outpoint(),
                incoming = mnb.sig_time,
                existing = record.sig_time,
                "announcement older than the record"
            );
            return Some(AdmitOutcome::rejected(RejectKind::StaleTimestamp, 100));
        }

        if !record.is_enabled() {
            return Some(AdmitOutcome::Accepted { relay: false });
        }

        if record.collateral_pubkey == mnb.collateral_pubkey
            && !record.is_broadcast_within(MIN_ANNOUNCE_SECONDS, now)
        {
            debug!(masternode = %mnb.outpoint(), "updated announcement for known masternode");
            record.update_from_announcement(mnb);
            if let Some(ping) = record.last_ping.clone() {
                self.registry
                    .note_seen_ping(ping.hash(self.sporks.ping_salt()), ping);
            }
            let ctx = CheckContext {
                chain: self.chain.as_ref(),
                params: &self.params,
                now,
            };
            record.check(false, &ctx);
            if record.is_enabled() {
                self.network.relay(InvKind::MasternodeAnnounce, mnb.hash());
                return Some(AdmitOutcome::Accepted { relay: true });
            }
        }

        Some(AdmitOutcome::Accepted { relay: false })
    }

    /// Admission path for an unknown collateral: prove the collateral
    /// against the chain, then insert.
    fn admit_new(&self, mnb: &Announcement, hash: Hash256) -> AdmitOutcome {
        // our own announcement coming back around; nothing to do
        if let Some(active) = self.active_masternode() {
            if active.outpoint == Some(mnb.outpoint()) && active.operator_pubkey == mnb.operator_pubkey
            {
                return AdmitOutcome::Accepted { relay: false };
            }
        }

        let Some(script) = p2pkh_script(&mnb.collateral_pubkey) else {
            return AdmitOutcome::rejected(RejectKind::BadKey, 100);
        };

        let tip = self.chain.tip_height();
        let required = schedules::collateral_at(tip);
        match self
            .chain
            .try_collateral_spendable(&mnb.outpoint(), required, &script)
        {
            None => {
                // not the announcement's fault; let it be checked again
                debug!(masternode = %mnb.outpoint(), "chain busy, announcement deferred");
                self.registry.forget_seen_announcement(&hash);
                return AdmitOutcome::RejectedTransient;
            }
            Some(false) => {
                warn!(masternode = %mnb.outpoint(), "announcement collateral not spendable");
                return AdmitOutcome::rejected(RejectKind::CollateralUnspendable, 0);
            }
            Some(true) => {}
        }

        let depth = self.chain.coin_depth_at(&mnb.outpoint(), tip);
        if depth < MIN_CONFIRMATIONS {
            debug!(
                masternode = %mnb.outpoint(),
                depth,
                required = MIN_CONFIRMATIONS,
                "collateral not confirmed yet, announcement deferred"
            );
            self.registry.forget_seen_announcement(&hash);
            return AdmitOutcome::RejectedTransient;
        }

        // the announcement cannot predate the block where the
        // collateral reached its confirmation threshold
        if let Some((_, including_block)) = self.chain.transaction(&mnb.outpoint().txid) {
            if let Some(included) = self.chain.find_block(&including_block) {
                if let Some(conf_block) =
                    self.chain.block_index_at(included.height + MIN_CONFIRMATIONS - 1)
                {
                    if conf_block.time > mnb.sig_time {
                        warn!(
                            masternode = %mnb.outpoint(),
                            sig_time = mnb.sig_time,
                            confirmed_at = conf_block.time,
                            "announcement predates collateral confirmation"
                        );
                        return AdmitOutcome::rejected(RejectKind::StaleTimestamp, 0);
                    }
                }
            }
        }

        info!(masternode = %mnb.outpoint(), service = %mnb.service, "new masternode entry accepted");
        let record = MasternodeRecord::from_announcement(mnb);
        if self.registry.add(record).is_err() {
            // raced with a concurrent admission for the same collateral
            return AdmitOutcome::Ignored;
        }
        if let Some(arc) = self.registry.find(&mnb.outpoint()) {
            let ctx = CheckContext {
                chain: self.chain.as_ref(),
                params: &self.params,
                now: self.clock.adjusted_time(),
            };
            arc.lock().check(true, &ctx);
        }

        // the announced operator key being ours means we have been
        // activated remotely
        if mnb.protocol_version == PROTOCOL_VERSION {
            self.enable_remote_if_ours(mnb);
        }

        let local = mnb.service.is_local() && !self.params.is_regtest();
        if !local {
            self.network.relay(InvKind::MasternodeAnnounce, hash);
        }
        AdmitOutcome::Accepted { relay: !local }
    }
}

impl MasternodeRecord {
    /// Take over the newer broadcast's view of this masternode. The
    /// caller has already validated the embedded ping.
    pub fn update_from_announcement(&mut self, mnb: &Announcement) -> bool {
        if mnb.sig_time <= self.sig_time {
            return false;
        }
        self.operator_pubkey = mnb.operator_pubkey.clone();
        self.collateral_pubkey = mnb.collateral_pubkey.clone();
        self.sig_time = mnb.sig_time;
        self.signature = mnb.signature.clone();
        self.mess_version = mnb.mess_version;
        self.protocol_version = mnb.protocol_version;
        self.service = mnb.service;
        self.last_ping = mnb.last_ping.clone();
        self.last_check_time = 0;
        true
    }

    pub fn from_announcement(mnb: &Announcement) -> Self {
        MasternodeRecord {
            collateral: mnb.collateral.clone(),
            service: mnb.service,
            collateral_pubkey: mnb.collateral_pubkey.clone(),
            operator_pubkey: mnb.operator_pubkey.clone(),
            protocol_version: mnb.protocol_version,
            sig_time: mnb.sig_time,
            mess_version: mnb.mess_version,
            signature: mnb.signature.clone(),
            last_ping: mnb.last_ping.clone(),
            state: MasternodeState::PreEnabled,
            last_check_time: 0,
            last_dsq: mnb.last_dsq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn announcement_at(sig_time: i64, collateral_pubkey: Vec<u8>) -> Announcement {
        Announcement {
            collateral: TxIn::from_outpoint(Outpoint::new(Hash256([5; 32]), 0)),
            service: ServiceAddress::parse("203.0.113.9:10100", 10100).unwrap(),
            collateral_pubkey,
            operator_pubkey: vec![2; 32],
            protocol_version: PROTOCOL_VERSION,
            sig_time,
            mess_version: MessageVersion::LegacyStr,
            signature: Vec::new(),
            last_ping: None,
            last_dsq: 0,
        }
    }

    #[test]
    fn test_hash_covers_timing_and_collateral_key_only() {
        let base = announcement_at(1_000, vec![1; 32]);
        let mut other = base.clone();
        other.operator_pubkey = vec![9; 32];
        other.protocol_version = 1;
        assert_eq!(base.hash(), other.hash());

        assert_ne!(base.hash(), announcement_at(1_001, vec![1; 32]).hash());
        assert_ne!(base.hash(), announcement_at(1_000, vec![3; 32]).hash());
    }

    #[test]
    fn test_update_from_announcement_requires_newer_sig_time() {
        let mnb = announcement_at(2_000, vec![1; 32]);
        let mut record = MasternodeRecord::from_announcement(&mnb);
        assert!(!record.update_from_announcement(&announcement_at(2_000, vec![1; 32])));
        assert!(!record.update_from_announcement(&announcement_at(1_999, vec![1; 32])));

        let mut newer = announcement_at(3_000, vec![1; 32]);
        newer.protocol_version = PROTOCOL_VERSION + 1;
        assert!(record.update_from_announcement(&newer));
        assert_eq!(record.sig_time, 3_000);
        assert_eq!(record.protocol_version, PROTOCOL_VERSION + 1);
        assert_eq!(record.last_check_time, 0);
    }

    #[test]
    fn test_record_round_trip_preserves_identity() {
        let mnb = announcement_at(2_000, vec![1; 32]);
        let record = MasternodeRecord::from_announcement(&mnb);
        assert_eq!(Announcement::from_record(&record), mnb);
    }
}
