//! Meridian Cryptography
//!
//! Signature generation and verification

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use meridian_core::{Hash256, WireWriter};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length of a serialized public key.
pub const PUBKEY_LEN: usize = 32;

/// Length of a key id (truncated key digest).
pub const KEY_ID_LEN: usize = 20;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid private key")]
    InvalidPrivateKey,
}

/// Key pair for signing masternode messages
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Get public key bytes
    pub fn public_key(&self) -> Vec<u8> {
        self.verifying_key.as_bytes().to_vec()
    }

    /// Get public key as hex string
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.as_bytes())
    }

    /// Get private key as hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Create keypair from private key hex
    pub fn from_private_key_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(hex_str).map_err(|_| CryptoError::InvalidPrivateKey)?;

        let key_bytes: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidPrivateKey)?;

        let signing_key = SigningKey::from_bytes(&key_bytes);
        let verifying_key = signing_key.verifying_key();

        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// Sign raw bytes
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    /// Verify a signature over raw bytes
    pub fn verify(
        public_key: &[u8],
        message: &[u8],
        signature_bytes: &[u8],
    ) -> Result<(), CryptoError> {
        let pub_key_array: [u8; 32] = public_key
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)?;

        let verifying_key =
            VerifyingKey::from_bytes(&pub_key_array).map_err(|_| CryptoError::InvalidPublicKey)?;

        let sig_array: [u8; 64] = signature_bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature)?;

        let signature = Signature::from_bytes(&sig_array);

        verifying_key
            .verify(message, &signature)
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

/// Hash data with SHA256
pub fn hash_sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Double SHA256, the digest of every consensus-observable hash domain
pub fn hash_sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    Hash256(second.into())
}

/// Digest of a human-readable signed message: the network magic and the
/// message body, each compact-size prefixed, double-hashed.
pub fn signed_message_digest(magic: &str, message: &str) -> Hash256 {
    let mut w = WireWriter::new();
    w.write_var_str(magic);
    w.write_var_str(message);
    hash_sha256d(w.as_bytes())
}

/// Sign a text message under the network magic
pub fn sign_text_message(keypair: &KeyPair, magic: &str, message: &str) -> Vec<u8> {
    keypair.sign(signed_message_digest(magic, message).as_bytes())
}

/// Verify a text message signature under the network magic
pub fn verify_text_message(
    public_key: &[u8],
    magic: &str,
    message: &str,
    signature: &[u8],
) -> Result<(), CryptoError> {
    KeyPair::verify(
        public_key,
        signed_message_digest(magic, message).as_bytes(),
        signature,
    )
}

/// Truncated key digest identifying a public key in scripts and addresses
pub fn key_id(public_key: &[u8]) -> [u8; KEY_ID_LEN] {
    let digest = Sha256::digest(public_key);
    let mut id = [0u8; KEY_ID_LEN];
    id.copy_from_slice(&digest[..KEY_ID_LEN]);
    id
}

/// Standard 25-byte pay-to-key-hash locking script for a public key.
/// Returns None unless the key has the expected serialized length.
pub fn p2pkh_script(public_key: &[u8]) -> Option<Vec<u8>> {
    if public_key.len() != PUBKEY_LEN {
        return None;
    }
    let id = key_id(public_key);
    let mut script = Vec::with_capacity(25);
    script.push(0x76); // OP_DUP
    script.push(0xa9); // OP_HASH160
    script.push(KEY_ID_LEN as u8);
    script.extend_from_slice(&id);
    script.push(0x88); // OP_EQUALVERIFY
    script.push(0xac); // OP_CHECKSIG
    Some(script)
}

/// Generate address from a public key
pub fn public_key_to_address(prefix: &str, public_key: &[u8]) -> String {
    format!("{}{}", prefix, hex::encode(key_id(public_key)))
}
