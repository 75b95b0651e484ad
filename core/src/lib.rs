//! Meridian Core - chain primitives shared across the node

pub mod chainparams;
pub mod constants;
pub mod hash;
pub mod outpoint;
pub mod ser;
pub mod transaction;

pub use chainparams::{
    ChainParams, Network, NetworkUpgrade, ACTIVE_PROTOCOL, MIN_PEER_ANNOUNCE_PROTOCOL,
    PROTOCOL_VERSION,
};
pub use constants::{CENT, COIN};
pub use hash::Hash256;
pub use outpoint::Outpoint;
pub use ser::WireWriter;
pub use transaction::{Transaction, TxIn, TxOut};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
