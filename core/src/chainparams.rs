//! Per-network consensus and wire parameters

use crate::constants::COIN;
use serde::{Deserialize, Serialize};

/// Wire protocol version advertised by this build.
pub const PROTOCOL_VERSION: u32 = 70921;

/// Minimum protocol a peer must advertise for its messages to be processed.
pub const ACTIVE_PROTOCOL: u32 = 70920;

/// Peers at or below this protocol still sign announcements with the
/// legacy string scheme; signature mismatches from them carry no penalty.
pub const MIN_PEER_ANNOUNCE_PROTOCOL: u32 = 70918;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

/// Named network upgrades with height-based activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkUpgrade {
    /// Signed messages switch from the legacy string scheme to signing
    /// the serialized-message digest.
    HashedMessages,
}

/// Parameters of one network. Constructed once at startup and threaded
/// into the core by handle; the core holds no global parameter state.
#[derive(Debug, Clone)]
pub struct ChainParams {
    pub network: Network,
    pub default_port: u16,
    pub max_money: u64,
    pub message_magic: &'static str,
    pub address_prefix: &'static str,
    /// Activation height for [`NetworkUpgrade::HashedMessages`].
    pub hashed_messages_height: i32,
    /// Addresses whose collateral is treated as unspendable from the
    /// paired height onward.
    pub burn_addresses: Vec<(String, i32)>,
}

impl ChainParams {
    pub fn mainnet() -> Self {
        ChainParams {
            network: Network::Mainnet,
            default_port: 10100,
            max_money: 2_147_483_647 * COIN,
            message_magic: "Meridian Signed Message:\n",
            address_prefix: "M",
            hashed_messages_height: 1541,
            burn_addresses: Vec::new(),
        }
    }

    pub fn testnet() -> Self {
        ChainParams {
            network: Network::Testnet,
            default_port: 20100,
            max_money: 1_000_000_000 * COIN,
            message_magic: "Meridian Signed Message:\n",
            address_prefix: "T",
            hashed_messages_height: 2541,
            burn_addresses: Vec::new(),
        }
    }

    pub fn regtest() -> Self {
        ChainParams {
            network: Network::Regtest,
            default_port: 30100,
            max_money: 1_000_000_000 * COIN,
            message_magic: "Meridian Signed Message:\n",
            address_prefix: "T",
            hashed_messages_height: 1,
            burn_addresses: Vec::new(),
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::mainnet(),
            Network::Testnet => Self::testnet(),
            Network::Regtest => Self::regtest(),
        }
    }

    pub fn is_regtest(&self) -> bool {
        self.network == Network::Regtest
    }

    pub fn upgrade_height(&self, upgrade: NetworkUpgrade) -> i32 {
        match upgrade {
            NetworkUpgrade::HashedMessages => self.hashed_messages_height,
        }
    }

    /// Height at which collateral paid to `address` stops counting, if
    /// the address is burned at all.
    pub fn burn_height(&self, address: &str) -> Option<i32> {
        self.burn_addresses
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, h)| *h)
    }
}
