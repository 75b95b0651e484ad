//! Masternode error types and admission outcomes

use meridian_core::Outpoint;
use meridian_crypto::CryptoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MasternodeError {
    #[error("Blockchain is not synced")]
    NotSynced,

    #[error("Invalid key: {0}")]
    BadKey(String),

    #[error("Collateral not found: {0}")]
    CollateralNotFound(String),

    #[error("Invalid service address: {0}")]
    BadAddress(String),

    #[error("Bad signature")]
    BadSignature,

    #[error("Timestamp {0} is too far in the past")]
    StaleTimestamp(i64),

    #[error("Timestamp {0} is too far in the future")]
    FutureTimestamp(i64),

    #[error("Invalid port {got}, only {expected} is supported on this network")]
    WrongPort { got: u16, expected: u16 },

    #[error("Collateral has {have} confirmations, {required} required")]
    InsufficientConfirmations { have: i32, required: i32 },

    #[error("Chain state busy, retry later")]
    ChainRetry,

    #[error("Masternode already registered: {0}")]
    AlreadyRegistered(Outpoint),

    #[error("Masternode not found: {0}")]
    NotFound(Outpoint),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

pub type Result<T> = std::result::Result<T, MasternodeError>;

/// Why a message was conclusively rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectKind {
    FutureTimestamp,
    StaleTimestamp,
    BadKey,
    BadSignature,
    WrongPort,
    CollateralUnspendable,
    BadPing,
}

/// Outcome of submitting an announcement or heartbeat to the manager.
///
/// Misbehavior scores are charged to the delivering peer by the host;
/// the core only assigns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    Accepted { relay: bool },
    /// Could not be decided against the current chain state; the seen
    /// caches have been dropped so the message can be retried.
    RejectedTransient,
    RejectedPermanent { kind: RejectKind, misbehavior: u8 },
    /// Dropped without penalty: duplicate, stale protocol, unknown
    /// record, or cool-down violation.
    Ignored,
}

impl AdmitOutcome {
    pub fn rejected(kind: RejectKind, misbehavior: u8) -> Self {
        AdmitOutcome::RejectedPermanent { kind, misbehavior }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, AdmitOutcome::Accepted { .. })
    }

    pub fn misbehavior(&self) -> u8 {
        match self {
            AdmitOutcome::RejectedPermanent { misbehavior, .. } => *misbehavior,
            _ => 0,
        }
    }
}
