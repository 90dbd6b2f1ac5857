//! Wallet identities and the signature handshake.
//!
//! An identity is a secp256k1 secret key plus its derived EIP-55
//! address. The remote service authenticates by having the wallet sign
//! a server-issued message under the EIP-191 personal-message prefix
//! convention, so the signature verifies against the claimed address.
//! Signing is pure computation — deterministic and side-effect free.

use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;

use crate::types::TrainerError;

/// A secret-key-derived actor authenticating to the remote service.
/// Immutable once constructed; never persisted.
pub struct Identity {
    signer: PrivateKeySigner,
    address: String,
}

impl Identity {
    /// Derive an identity from a hex secret key. A missing `0x` prefix
    /// is normalized; a malformed scalar fails with `InvalidKey`.
    pub fn from_secret_key(secret_key: &str) -> Result<Self, TrainerError> {
        let raw = secret_key.trim();
        let normalized = if raw.starts_with("0x") {
            raw.to_string()
        } else {
            format!("0x{raw}")
        };

        let signer: PrivateKeySigner = normalized
            .parse()
            .map_err(|e| TrainerError::InvalidKey(format!("{e}")))?;
        let address = signer.address().to_string();

        Ok(Self { signer, address })
    }

    /// The EIP-55 checksummed wallet address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Sign the UTF-8 bytes of `message` under the personal-message
    /// prefix. Returns the 65-byte signature as 0x-prefixed hex.
    pub fn sign_message(&self, message: &str) -> Result<String, TrainerError> {
        let signature = self
            .signer
            .sign_message_sync(message.as_bytes())
            .map_err(|e| TrainerError::Signing(format!("{e}")))?;
        Ok(alloy::primitives::hex::encode_prefixed(signature.as_bytes()))
    }
}

impl std::fmt::Debug for Identity {
    // Never print key material.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
