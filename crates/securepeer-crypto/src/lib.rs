//! Peer identity and secure-channel protocol engine.
//!
//! This crate provides:
//! - Ed25519 + X25519 peer identity keys and hex peer ids
//! - A signed, box-encrypted handshake establishing a shared secret
//! - Secure channels for symmetric encryption of arbitrary payloads
//! - Sealed relay envelopes an untrusted relay can forward blind
//! - BIP39/BIP32 mnemonic-derived identities
//!
//! # Design
//!
//! All operations are synchronous, pure computations over in-memory
//! buffers; the only side effect is CSPRNG consumption for nonces,
//! ephemeral keys, and fresh secrets. Key and channel values are
//! immutable after construction and safe to share read-only across
//! threads.
//!
//! Transport, discovery, and push plumbing are collaborators, not part
//! of this crate: they carry the opaque wire envelopes defined in
//! [`envelope`] and hand received ones back in. A collaborator accepting
//! connections should treat any handshake failure as a reason to close
//! the transport, without echoing the failure detail to the remote side.
//!
//! Known limitations, by design: handshakes carry no freshness proof
//! (replayable), and nothing binds a handshake's signing key to the peer
//! id it is decrypted against; see [`handshake`] for the trust model.

#![forbid(unsafe_code)]

pub mod channel;
pub mod envelope;
pub mod error;
pub mod handshake;
pub mod identity;
pub mod mnemonic;
mod primitives;
pub mod relay;

pub use channel::SecureChannel;
pub use envelope::{EncryptedEnvelope, EncryptedHandshake, RelayEnvelope};
pub use error::{CryptoError, Result};
pub use handshake::{BoxHandshake, KeyExchange, SessionHandshake};
pub use identity::{PeerId, PeerKey};
pub use mnemonic::MnemonicKey;
pub use relay::encrypt_for_relay;
