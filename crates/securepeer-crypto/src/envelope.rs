//! Wire envelopes.
//!
//! Everything that crosses a transport is one of three JSON structures,
//! with all binary fields base64url-encoded (no padding):
//!
//! ```text
//! EncryptedHandshake = { message, signature, publicSignKey }
//! EncryptedEnvelope  = { nonceB64, cipherB64 }
//! RelayEnvelope      = { nonceB64, cipherB64, encryptedKeyB64 }
//! ```
//!
//! The envelope structures are fixed; payload typing lives in the generic
//! encrypt/decrypt methods that produce and consume them. An
//! `EncryptedEnvelope` is a symmetric AEAD envelope (keyed by a channel
//! secret or a box-derived key); a `RelayEnvelope` additionally carries a
//! one-time symmetric key sealed to the recipient so an untrusted relay
//! can forward it blind.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Signed, encrypted handshake artifact, the only thing transmitted to
/// establish a channel. Self-contained: carries the sender's public
/// signing key. Carries no freshness proof, so it is replayable; see the
/// crate docs for the trust model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedHandshake {
    /// Base64 of the exact signed bytes (a serialized handshake message).
    pub message: String,
    /// Base64 detached Ed25519 signature over those bytes.
    pub signature: String,
    /// Base64 public signing key of the sender.
    pub public_sign_key: String,
}

/// Symmetric AEAD envelope: fresh random nonce plus ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEnvelope {
    pub nonce_b64: String,
    pub cipher_b64: String,
}

/// [`EncryptedEnvelope`] plus the one-time payload key, sealed anonymously
/// to the recipient's public encryption key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayEnvelope {
    pub nonce_b64: String,
    pub cipher_b64: String,
    pub encrypted_key_b64: String,
}

/// Encode bytes with the crate-wide base64 alphabet.
pub(crate) fn b64_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a base64 field. Callers map the failure to the error that fits
/// the context (tampered envelope vs malformed handshake).
pub(crate) fn b64_decode(s: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(s).ok()
}
