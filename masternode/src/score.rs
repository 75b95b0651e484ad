//! Deterministic payment election score
//!
//! Every node must rank masternodes identically for a given height, so
//! the score is pure 256-bit arithmetic over double-SHA256 digests:
//! the distance between the block hash's digest and the digest of the
//! block hash combined with the masternode's collateral identity.
//! The furthest distance wins the election.

use crate::manager::MasternodeManager;
use meridian_core::{Hash256, Outpoint, WireWriter};
use meridian_crypto::hash_sha256d;
use tracing::debug;

/// Score of one masternode against one block hash. Pure; bit-exact
/// across implementations.
pub fn score_for_block(block_hash: &Hash256, outpoint: &Outpoint) -> Hash256 {
    let aux = outpoint.txid.wrapping_add_u32(outpoint.index);

    let h1 = hash_sha256d(block_hash.as_bytes());

    let mut w = WireWriter::new();
    w.write_hash(block_hash);
    w.write_hash(&aux);
    let h2 = hash_sha256d(w.as_bytes());

    h2.abs_diff(&h1)
}

impl MasternodeManager {
    /// Block hash used for scoring at `height`; 0 means the tip. Memoized
    /// per height, invalidated wholesale on reorg.
    pub fn score_block_hash(&self, height: i32) -> Option<Hash256> {
        let tip = self.chain.tip_height();
        if tip < 0 {
            return None;
        }
        let height = if height == 0 { tip } else { height };
        if height < 0 || height > tip {
            return None;
        }
        if let Some(hash) = self.block_hash_cache.get(&height) {
            return Some(*hash);
        }
        let hash = self.chain.block_hash_at(height)?;
        self.block_hash_cache.insert(height, hash);
        Some(hash)
    }

    /// Election score for a masternode at a height. A zero score is the
    /// sentinel for "no block hash available" and loses every tie.
    pub fn score(&self, outpoint: &Outpoint, height: i32) -> Hash256 {
        let Some(block_hash) = self.score_block_hash(height) else {
            debug!(height, "no block hash for score");
            return Hash256::ZERO;
        };
        score_for_block(&block_hash, outpoint)
    }
}
