//! Protocol error taxonomy.
//!
//! Every failure in this crate is local, synchronous, and non-retryable:
//! a cryptographic failure is never transient. Callers sitting on a
//! transport boundary should close the connection on any of these and
//! must not echo the variant back to the remote party (distinguishable
//! errors make a convenient oracle).

use thiserror::Error;

/// Errors produced by key material, handshake, channel, and relay operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid seed: expected 32 bytes, got {0}")]
    InvalidSeed(usize),

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("malformed handshake")]
    MalformedHandshake,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("encryption failed")]
    EncryptionFailed,

    /// Wrong key, tampered nonce, tampered ciphertext, or truncated input.
    /// Deliberately carries no detail about which check failed.
    #[error("decryption failed")]
    DecryptionFailed,

    #[error("unknown peer id: {0}")]
    UnknownPeer(String),
}

/// Crate-wide result alias.
pub type Result<T, E = CryptoError> = std::result::Result<T, E>;
