//! Dual-scheme signed message contract
//!
//! The network is in a rolling upgrade of its message signing scheme.
//! Legacy messages sign a domain-specific concatenated string; upgraded
//! messages sign the hex digest of the message's serialized form. Both
//! must keep verifying; new signatures use the scheme the active
//! network upgrade dictates.

use crate::error::{MasternodeError, Result};
use meridian_core::Hash256;
use meridian_crypto::{sign_text_message, verify_text_message, KeyPair};
use serde::{Deserialize, Serialize};

/// Which signing scheme a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageVersion {
    /// Signature over the magic-prefixed concatenated string message.
    LegacyStr,
    /// Signature over the hex-encoded serialized-message digest.
    Hash,
}

impl MessageVersion {
    pub fn wire_byte(&self) -> u8 {
        match self {
            MessageVersion::LegacyStr => 0,
            MessageVersion::Hash => 1,
        }
    }
}

/// A message signed under one of the two schemes.
///
/// `verify` accepts a signature that validates under either scheme and
/// reports which one matched so callers can surface it in logs. `sign`
/// picks the scheme from the upgrade flag and round-trips the result
/// through `verify` before accepting it.
pub trait SignedMessage {
    fn mess_version(&self) -> MessageVersion;
    fn set_mess_version(&mut self, version: MessageVersion);
    fn signature(&self) -> &[u8];
    fn set_signature(&mut self, signature: Vec<u8>);

    /// Digest of the message's canonical serialization.
    fn signature_hash(&self) -> Hash256;

    /// Concatenated string message, current format.
    fn str_message(&self) -> String;

    /// Historic string format, where it ever differed.
    fn legacy_str_message(&self) -> String {
        self.str_message()
    }

    fn sign(&mut self, keypair: &KeyPair, magic: &str, hashed_scheme: bool) -> Result<()> {
        let message = if hashed_scheme {
            self.set_mess_version(MessageVersion::Hash);
            self.signature_hash().to_hex()
        } else {
            self.set_mess_version(MessageVersion::LegacyStr);
            self.legacy_str_message()
        };
        self.set_signature(sign_text_message(keypair, magic, &message));

        // a signature we cannot verify ourselves is never broadcast
        self.verify(&keypair.public_key(), magic).map(|_| ())
    }

    fn verify(&self, public_key: &[u8], magic: &str) -> Result<MessageVersion> {
        let candidates = [
            (MessageVersion::Hash, self.signature_hash().to_hex()),
            (MessageVersion::LegacyStr, self.str_message()),
            (MessageVersion::LegacyStr, self.legacy_str_message()),
        ];
        for (version, message) in candidates {
            if verify_text_message(public_key, magic, &message, self.signature()).is_ok() {
                return Ok(version);
            }
        }
        Err(MasternodeError::BadSignature)
    }
}
