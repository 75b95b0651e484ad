//! Wallet signer collaborator interface

use meridian_core::{Hash256, TxIn};
use meridian_crypto::KeyPair;

/// The collateral input and the key that owns it, as resolved by the
/// wallet.
pub struct CollateralKeys {
    pub txin: TxIn,
    pub keypair: KeyPair,
}

/// Key material lookup. Implemented by the wallet; the core never
/// derives or stores collateral keys itself.
pub trait WalletSigner: Send + Sync {
    /// Resolve `(txid, index)` to an unspent output of exactly
    /// `expected_value` owned by a wallet key, returning the spendable
    /// input and the owning keypair. None if no such output is held.
    fn collateral_keys(&self, txid: &Hash256, index: u32, expected_value: u64)
        -> Option<CollateralKeys>;
}
