//! Shared fixtures: a scripted chain, a recording relay and a pinned
//! clock, wired into a manager the way the host node would.
#![allow(dead_code)]

use meridian_core::{
    ChainParams, Hash256, NetworkUpgrade, Outpoint, Transaction, TxIn, PROTOCOL_VERSION,
};
use meridian_crypto::KeyPair;
use meridian_masternode::{
    Announcement, BlockMeta, ChainView, Heartbeat, InvKind, MasternodeManager, MessageVersion,
    NetworkRelay, ServiceAddress, SignedMessage, SporkView, StaticSporks, TimeSource,
};
use parking_lot::{Mutex, RwLock};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

/// Synthetic block hash stream: SHA256 of the height as big-endian u64.
pub fn block_hash_for_height(height: i32) -> Hash256 {
    let digest = Sha256::digest((height as u64).to_be_bytes());
    Hash256(digest.into())
}

/// Scripted chain view. Blocks are generated deterministically; the
/// spendable set, coin depths and lock contention are all test knobs.
pub struct MockChain {
    tip: AtomicI64,
    base_time: i64,
    time_overrides: RwLock<HashMap<i32, i64>>,
    spendable: RwLock<HashSet<Outpoint>>,
    depths: RwLock<HashMap<Outpoint, i32>>,
    tx_blocks: RwLock<HashMap<Hash256, Hash256>>,
    pub busy: AtomicBool,
    pub synced: AtomicBool,
    pub shutdown: AtomicBool,
    pub hashed_messages: AtomicBool,
}

impl MockChain {
    pub fn with_height(tip: i32, base_time: i64) -> Self {
        MockChain {
            tip: AtomicI64::new(tip as i64),
            base_time,
            time_overrides: RwLock::new(HashMap::new()),
            spendable: RwLock::new(HashSet::new()),
            depths: RwLock::new(HashMap::new()),
            tx_blocks: RwLock::new(HashMap::new()),
            busy: AtomicBool::new(false),
            synced: AtomicBool::new(true),
            shutdown: AtomicBool::new(false),
            hashed_messages: AtomicBool::new(true),
        }
    }

    pub fn set_tip(&self, height: i32) {
        self.tip.store(height as i64, Ordering::Relaxed);
    }

    pub fn set_block_time(&self, height: i32, time: i64) {
        self.time_overrides.write().insert(height, time);
    }

    pub fn mark_spendable(&self, outpoint: Outpoint) {
        self.spendable.write().insert(outpoint);
    }

    pub fn mark_spent(&self, outpoint: &Outpoint) {
        self.spendable.write().remove(outpoint);
    }

    pub fn set_depth(&self, outpoint: Outpoint, depth: i32) {
        self.depths.write().insert(outpoint, depth);
    }

    pub fn set_tx_block(&self, txid: Hash256, height: i32) {
        self.tx_blocks
            .write()
            .insert(txid, block_hash_for_height(height));
    }

    fn block_time(&self, height: i32) -> i64 {
        self.time_overrides
            .read()
            .get(&height)
            .copied()
            .unwrap_or(self.base_time + height as i64 * 60)
    }

    fn meta_at(&self, height: i32) -> Option<BlockMeta> {
        if height < 0 || height > self.tip_height() {
            return None;
        }
        Some(BlockMeta {
            height,
            hash: block_hash_for_height(height),
            time: self.block_time(height),
            prev: if height == 0 {
                Hash256::ZERO
            } else {
                block_hash_for_height(height - 1)
            },
        })
    }

    fn height_of(&self, hash: &Hash256) -> Option<i32> {
        (0..=self.tip_height()).find(|h| block_hash_for_height(*h) == *hash)
    }
}

impl ChainView for MockChain {
    fn tip_height(&self) -> i32 {
        self.tip.load(Ordering::Relaxed) as i32
    }

    fn block_hash_at(&self, height: i32) -> Option<Hash256> {
        self.meta_at(height).map(|meta| meta.hash)
    }

    fn block_index_at(&self, height: i32) -> Option<BlockMeta> {
        self.meta_at(height)
    }

    fn contains(&self, hash: &Hash256) -> bool {
        self.height_of(hash).is_some()
    }

    fn find_block(&self, hash: &Hash256) -> Option<BlockMeta> {
        self.height_of(hash).and_then(|h| self.meta_at(h))
    }

    fn coin_depth_at(&self, outpoint: &Outpoint, _height: i32) -> i32 {
        self.depths.read().get(outpoint).copied().unwrap_or(100)
    }

    fn transaction(&self, txid: &Hash256) -> Option<(Transaction, Hash256)> {
        self.tx_blocks
            .read()
            .get(txid)
            .map(|hash| (Transaction::default(), *hash))
    }

    fn try_collateral_spendable(
        &self,
        outpoint: &Outpoint,
        _expected_value: u64,
        _expected_script: &[u8],
    ) -> Option<bool> {
        if self.busy.load(Ordering::Relaxed) {
            return None;
        }
        Some(self.spendable.read().contains(outpoint))
    }

    fn network_upgrade_active(&self, _upgrade: NetworkUpgrade, _height: i32) -> bool {
        self.hashed_messages.load(Ordering::Relaxed)
    }

    fn is_blockchain_synced(&self) -> bool {
        self.synced.load(Ordering::Relaxed)
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

/// Captures relay requests instead of gossiping them.
#[derive(Default)]
pub struct RecordingNetwork {
    relayed: Mutex<Vec<(InvKind, Hash256)>>,
}

impl RecordingNetwork {
    pub fn relayed(&self) -> Vec<(InvKind, Hash256)> {
        self.relayed.lock().clone()
    }

    pub fn count_of(&self, kind: InvKind) -> usize {
        self.relayed.lock().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl NetworkRelay for RecordingNetwork {
    fn relay(&self, kind: InvKind, hash: Hash256) {
        self.relayed.lock().push((kind, hash));
    }
}

/// Pinned, manually advanced clock.
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn at(now: i64) -> Self {
        FixedClock {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::Relaxed);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::Relaxed);
    }
}

impl TimeSource for FixedClock {
    fn adjusted_time(&self) -> i64 {
        self.now.load(Ordering::Relaxed)
    }
}

pub struct TestBed {
    pub manager: MasternodeManager,
    pub chain: Arc<MockChain>,
    pub network: Arc<RecordingNetwork>,
    pub sporks: Arc<StaticSporks>,
    pub clock: Arc<FixedClock>,
    pub params: ChainParams,
}

pub const BASE_TIME: i64 = 1_700_000_000;

/// A manager over a synced 120-block chain at `BASE_TIME + tip * 60`,
/// with the clock pinned shortly after the tip's block time.
pub fn testbed() -> TestBed {
    testbed_with_params(ChainParams::mainnet())
}

pub fn testbed_with_params(params: ChainParams) -> TestBed {
    let tip = 120;
    let chain = Arc::new(MockChain::with_height(tip, BASE_TIME));
    let network = Arc::new(RecordingNetwork::default());
    let sporks = Arc::new(StaticSporks::new());
    let clock = Arc::new(FixedClock::at(BASE_TIME + tip as i64 * 60 + 30));
    let manager = MasternodeManager::new(
        params.clone(),
        chain.clone(),
        network.clone(),
        sporks.clone(),
        clock.clone(),
    );
    TestBed {
        manager,
        chain,
        network,
        sporks,
        clock,
        params,
    }
}

impl TestBed {
    pub fn now(&self) -> i64 {
        self.clock.adjusted_time()
    }
}

/// One masternode's keys and collateral, plus the chain bookkeeping to
/// make its announcement admissible.
pub struct TestMasternode {
    pub collateral_keys: KeyPair,
    pub operator_keys: KeyPair,
    pub outpoint: Outpoint,
    pub service: ServiceAddress,
}

impl TestMasternode {
    pub fn new(bed: &TestBed, seed: u8) -> Self {
        let outpoint = Outpoint::new(Hash256([seed; 32]), 0);
        let mn = TestMasternode {
            collateral_keys: KeyPair::generate(),
            operator_keys: KeyPair::generate(),
            outpoint,
            service: ServiceAddress::parse(
                &format!("203.0.113.{}:{}", seed, bed.params.default_port),
                bed.params.default_port,
            )
            .unwrap(),
        };
        bed.chain.mark_spendable(outpoint);
        bed.chain.set_depth(outpoint, 100);
        bed.chain.set_tx_block(outpoint.txid, 10);
        mn
    }

    /// A signed ping for this masternode, stamped `sig_time`.
    pub fn ping_at(&self, bed: &TestBed, sig_time: i64) -> Heartbeat {
        let mut ping = Heartbeat::new(self.outpoint, bed.chain.as_ref(), sig_time);
        ping.sign(
            &self.operator_keys,
            bed.params.message_magic,
            true,
        )
        .unwrap();
        ping
    }

    /// A fully signed announcement stamped `sig_time`, embedding a ping
    /// of the same stamp.
    pub fn announcement_at(&self, bed: &TestBed, sig_time: i64) -> Announcement {
        self.announcement_with_ping(bed, sig_time, sig_time)
    }

    /// A fully signed announcement whose embedded ping carries its own
    /// stamp, as a running masternode's refresh broadcast would.
    pub fn announcement_with_ping(
        &self,
        bed: &TestBed,
        sig_time: i64,
        ping_time: i64,
    ) -> Announcement {
        let mut mnb = Announcement {
            collateral: TxIn::from_outpoint(self.outpoint),
            service: self.service,
            collateral_pubkey: self.collateral_keys.public_key(),
            operator_pubkey: self.operator_keys.public_key(),
            protocol_version: PROTOCOL_VERSION,
            sig_time,
            mess_version: MessageVersion::LegacyStr,
            signature: Vec::new(),
            last_ping: Some(self.ping_at(bed, ping_time)),
            last_dsq: 0,
        };
        mnb.sign(&self.collateral_keys, bed.params.message_magic, true)
            .unwrap();
        mnb
    }

    /// Re-sign an announcement after a test mutated its fields.
    pub fn resign(&self, bed: &TestBed, mnb: &mut Announcement) {
        mnb.sign(&self.collateral_keys, bed.params.message_magic, true)
            .unwrap();
    }
}

/// Wallet stub holding exactly one collateral output.
pub struct MockSigner {
    pub keypair: KeyPair,
    pub outpoint: Outpoint,
    pub held_value: u64,
}

impl meridian_masternode::WalletSigner for MockSigner {
    fn collateral_keys(
        &self,
        txid: &Hash256,
        index: u32,
        expected_value: u64,
    ) -> Option<meridian_masternode::CollateralKeys> {
        if *txid != self.outpoint.txid
            || index != self.outpoint.index
            || expected_value != self.held_value
        {
            return None;
        }
        Some(meridian_masternode::CollateralKeys {
            txin: TxIn::from_outpoint(self.outpoint),
            keypair: self.keypair.clone(),
        })
    }
}

/// Current state of a record, if present.
pub fn record_state(
    bed: &TestBed,
    outpoint: &Outpoint,
) -> Option<meridian_masternode::MasternodeState> {
    bed.manager
        .registry()
        .find(outpoint)
        .map(|arc| arc.lock().state)
}

/// The current ping salt, for computing expected inventory hashes.
pub fn ping_salt(bed: &TestBed) -> i64 {
    bed.sporks.ping_salt()
}
