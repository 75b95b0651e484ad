//! Network collaborator interface

use meridian_core::Hash256;

/// Inventory kinds the core asks the host to relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvKind {
    MasternodeAnnounce,
    MasternodePing,
}

/// Outbound gossip. The transport, peer selection and inventory
/// bookkeeping all live in the host; the core only names what to relay.
pub trait NetworkRelay: Send + Sync {
    fn relay(&self, kind: InvKind, hash: Hash256);
}
