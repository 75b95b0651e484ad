//! Chain collaborator interface
//!
//! The core never touches the block store directly. Everything it needs
//! from the chain goes through [`ChainView`], handed in at construction.
//! The host node implements it over its index, UTXO set and mempool.

use chrono::Utc;
use meridian_core::{Hash256, NetworkUpgrade, Outpoint, Transaction};

/// Summary of one block index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMeta {
    pub height: i32,
    pub hash: Hash256,
    pub time: i64,
    pub prev: Hash256,
}

/// Read access to chain state.
///
/// `try_collateral_spendable` is the only call that competes for the
/// host's chain lock; it must try-lock and report contention instead of
/// blocking, so admissions never stall behind validation.
pub trait ChainView: Send + Sync {
    /// Height of the active tip, or -1 before the genesis block connects.
    fn tip_height(&self) -> i32;

    fn block_hash_at(&self, height: i32) -> Option<Hash256>;

    fn block_index_at(&self, height: i32) -> Option<BlockMeta>;

    /// Is this block part of the active chain?
    fn contains(&self, hash: &Hash256) -> bool;

    /// Look up a block by hash in the full index (active or not).
    fn find_block(&self, hash: &Hash256) -> Option<BlockMeta>;

    /// Confirmations of the coin at `height`, 0 if unknown.
    fn coin_depth_at(&self, outpoint: &Outpoint, height: i32) -> i32;

    /// The transaction and the hash of the block that includes it.
    fn transaction(&self, txid: &Hash256) -> Option<(Transaction, Hash256)>;

    /// Whether `outpoint` is an unspent output of exactly
    /// `expected_value` locked by `expected_script`. Returns None when
    /// the chain lock could not be taken without blocking.
    fn try_collateral_spendable(
        &self,
        outpoint: &Outpoint,
        expected_value: u64,
        expected_script: &[u8],
    ) -> Option<bool>;

    fn network_upgrade_active(&self, upgrade: NetworkUpgrade, height: i32) -> bool;

    fn is_blockchain_synced(&self) -> bool;

    /// Host shutdown signal; long-running sweeps bail out when set.
    fn shutdown_requested(&self) -> bool;
}

/// Source of network-adjusted time.
pub trait TimeSource: Send + Sync {
    fn adjusted_time(&self) -> i64;
}

/// Wall-clock time source used outside of tests.
#[derive(Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn adjusted_time(&self) -> i64 {
        Utc::now().timestamp()
    }
}
