//! Masternode registry: the record map and the seen-message caches

use crate::announcement::Announcement;
use crate::error::{MasternodeError, Result};
use crate::heartbeat::Heartbeat;
use crate::record::{MasternodeRecord, MasternodeState};
use meridian_core::{Hash256, Outpoint};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// The map of collateral outpoint to record, plus duplicate-suppression
/// caches keyed by message hash.
///
/// The caches are not primary state: dropping an entry only means a
/// later redelivery gets re-evaluated.
#[derive(Default)]
pub struct Registry {
    records: RwLock<HashMap<Outpoint, Arc<Mutex<MasternodeRecord>>>>,
    seen_announcements: RwLock<HashMap<Hash256, Announcement>>,
    seen_pings: RwLock<HashMap<Hash256, Heartbeat>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, outpoint: &Outpoint) -> Option<Arc<Mutex<MasternodeRecord>>> {
        self.records.read().get(outpoint).cloned()
    }

    /// Insert a new record; at most one record per collateral outpoint.
    pub fn add(&self, record: MasternodeRecord) -> Result<()> {
        let outpoint = record.outpoint();
        let mut records = self.records.write();
        if records.contains_key(&outpoint) {
            return Err(MasternodeError::AlreadyRegistered(outpoint));
        }
        records.insert(outpoint, Arc::new(Mutex::new(record)));
        Ok(())
    }

    pub fn remove(&self, outpoint: &Outpoint) -> Option<Arc<Mutex<MasternodeRecord>>> {
        self.records.write().remove(outpoint)
    }

    pub fn count(&self) -> usize {
        self.records.read().len()
    }

    pub fn count_enabled(&self) -> u32 {
        self.records
            .read()
            .values()
            .filter(|record| record.lock().is_enabled())
            .count() as u32
    }

    pub fn outpoints(&self) -> Vec<Outpoint> {
        self.records.read().keys().copied().collect()
    }

    /// Snapshot of every record, for ranking and host queries.
    pub fn snapshot(&self) -> Vec<MasternodeRecord> {
        self.records
            .read()
            .values()
            .map(|record| record.lock().clone())
            .collect()
    }

    pub fn has_seen_announcement(&self, hash: &Hash256) -> bool {
        self.seen_announcements.read().contains_key(hash)
    }

    pub fn note_seen_announcement(&self, hash: Hash256, announcement: Announcement) {
        self.seen_announcements.write().insert(hash, announcement);
    }

    /// Drop a cached announcement so a later delivery is re-evaluated.
    pub fn forget_seen_announcement(&self, hash: &Hash256) {
        self.seen_announcements.write().remove(hash);
    }

    pub fn seen_announcement(&self, hash: &Hash256) -> Option<Announcement> {
        self.seen_announcements.read().get(hash).cloned()
    }

    pub fn has_seen_ping(&self, hash: &Hash256) -> bool {
        self.seen_pings.read().contains_key(hash)
    }

    pub fn note_seen_ping(&self, hash: Hash256, ping: Heartbeat) {
        self.seen_pings.write().insert(hash, ping);
    }

    pub fn forget_seen_ping(&self, hash: &Hash256) {
        self.seen_pings.write().remove(hash);
    }

    pub fn seen_ping(&self, hash: &Hash256) -> Option<Heartbeat> {
        self.seen_pings.read().get(hash).cloned()
    }

    /// The cached announcement for `record` predates its newest ping;
    /// refresh it so inventory replies carry the current one.
    pub fn refresh_seen_announcement_ping(&self, record: &MasternodeRecord, ping: &Heartbeat) {
        let hash = Announcement::from_record(record).hash();
        if let Some(cached) = self.seen_announcements.write().get_mut(&hash) {
            cached.last_ping = Some(ping.clone());
        }
    }

    /// Forget every cached message belonging to a removed record.
    pub fn forget_record_messages(&self, outpoint: &Outpoint) {
        self.seen_announcements
            .write()
            .retain(|_, mnb| mnb.outpoint() != *outpoint);
        self.seen_pings
            .write()
            .retain(|_, ping| ping.outpoint() != *outpoint);
    }

    /// Outpoints of records currently in the given state.
    pub fn in_state(&self, state: MasternodeState) -> Vec<Outpoint> {
        self.records
            .read()
            .iter()
            .filter(|(_, record)| record.lock().state == state)
            .map(|(outpoint, _)| *outpoint)
            .collect()
    }
}
