//! Masternode manager: the boundary the host talks to
//!
//! Owns the registry and the collaborator handles, and exposes the
//! admission entry points (in the announcement and heartbeat modules)
//! plus periodic maintenance and scoring.

use crate::active::ActiveMasternode;
use crate::announcement::Announcement;
use crate::chain::{ChainView, TimeSource};
use crate::net::NetworkRelay;
use crate::record::{CheckContext, MasternodeState};
use crate::registry::Registry;
use crate::spork::SporkView;
use dashmap::DashMap;
use meridian_core::{ChainParams, Hash256, Outpoint};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

pub struct MasternodeManager {
    pub(crate) registry: Registry,
    pub(crate) chain: Arc<dyn ChainView>,
    pub(crate) network: Arc<dyn NetworkRelay>,
    pub(crate) sporks: Arc<dyn SporkView>,
    pub(crate) clock: Arc<dyn TimeSource>,
    pub(crate) params: ChainParams,
    active: RwLock<Option<ActiveMasternode>>,
    /// Height to block hash memo for scoring; append-only between
    /// reorgs.
    pub(crate) block_hash_cache: DashMap<i32, Hash256>,
}

impl MasternodeManager {
    pub fn new(
        params: ChainParams,
        chain: Arc<dyn ChainView>,
        network: Arc<dyn NetworkRelay>,
        sporks: Arc<dyn SporkView>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        MasternodeManager {
            registry: Registry::new(),
            chain,
            network,
            sporks,
            clock,
            params,
            active: RwLock::new(None),
            block_hash_cache: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Declare the operator key this node runs a masternode with.
    pub fn set_local_masternode(&self, operator_pubkey: Vec<u8>) {
        *self.active.write() = Some(ActiveMasternode::new(operator_pubkey));
    }

    pub fn active_masternode(&self) -> Option<ActiveMasternode> {
        self.active.read().clone()
    }

    pub(crate) fn enable_remote_if_ours(&self, mnb: &Announcement) {
        let mut active = self.active.write();
        if let Some(active) = active.as_mut() {
            if active.operator_pubkey == mnb.operator_pubkey {
                active.enable_remote(mnb.outpoint(), mnb.service);
            }
        }
    }

    /// Re-check every record and sweep the ones that went unreachable
    /// past the removal window, dropping their cached messages with
    /// them.
    pub fn check_and_remove(&self, force: bool) {
        let now = self.clock.adjusted_time();
        for outpoint in self.registry.outpoints() {
            if self.chain.shutdown_requested() {
                return;
            }
            if let Some(arc) = self.registry.find(&outpoint) {
                let ctx = CheckContext {
                    chain: self.chain.as_ref(),
                    params: &self.params,
                    now,
                };
                arc.lock().check(force, &ctx);
            }
        }

        for outpoint in self.registry.in_state(MasternodeState::Removed) {
            info!(masternode = %outpoint, "removing unreachable masternode");
            self.registry.remove(&outpoint);
            self.registry.forget_record_messages(&outpoint);
        }
    }

    /// Invalidate the scoring memo after a reorg; `height -> hash` is
    /// only immutable while the active chain stands.
    pub fn on_reorg(&self) {
        debug!("clearing score block hash cache after reorg");
        self.block_hash_cache.clear();
    }

    pub fn count_enabled(&self) -> u32 {
        self.registry.count_enabled()
    }

    /// Best-scoring enabled masternode for a height, if any.
    pub fn best_for_height(&self, height: i32) -> Option<Outpoint> {
        let mut best: Option<(Hash256, Outpoint)> = None;
        for record in self.registry.snapshot() {
            if record.state != MasternodeState::Enabled {
                continue;
            }
            let outpoint = record.outpoint();
            let score = self.score(&outpoint, height);
            match &best {
                Some((top, _)) if *top >= score => {}
                _ => best = Some((score, outpoint)),
            }
        }
        best.map(|(_, outpoint)| outpoint)
    }
}
