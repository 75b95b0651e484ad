//! Minimal transaction types
//!
//! Only what the masternode core needs from the chain: enough shape to
//! identify the collateral input and to match an output against the
//! expected amount and locking script.

use crate::outpoint::Outpoint;
use serde::{Deserialize, Serialize};

/// A transaction input. Masternode announcements carry the collateral
/// input with an empty scriptSig; a populated scriptSig is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub prevout: Outpoint,
    pub script_sig: Vec<u8>,
}

impl TxIn {
    pub fn from_outpoint(prevout: Outpoint) -> Self {
        TxIn {
            prevout,
            script_sig: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Transaction {
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
}
