//! Peer identity key material.
//!
//! A peer holds two keypairs derived (optionally) from one 32-byte seed:
//! an Ed25519 signing pair and an X25519 encryption ("box") pair. The
//! **peer id** is the lowercase hex encoding of the 32-byte box public key
//! (64 characters): stable, safe to share, and sufficient for anyone to
//! address encrypted messages to this peer.
//!
//! # Example
//!
//! ```
//! use securepeer_crypto::identity::PeerKey;
//!
//! // Random identity
//! let key = PeerKey::generate();
//! println!("peer id: {}", key.peer_id());
//!
//! // Deterministic identity from a password-style seed
//! let a = PeerKey::from_password("weak seed value").unwrap();
//! let b = PeerKey::from_password("weak seed value").unwrap();
//! assert_eq!(a.peer_id(), b.peer_id());
//! ```

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::envelope::{b64_decode, b64_encode};
use crate::error::{CryptoError, Result};
use crate::primitives;

/// Seed length accepted by [`PeerKey::from_seed`].
pub const SEED_LEN: usize = 32;

const BOX_SEED_INFO: &[u8] = b"securepeer box keypair v1";

/// Peer id: lowercase hex of the X25519 box public key.
///
/// 32 bytes encoded as 64 hex characters.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub(crate) fn from_public_key(public: &PublicKey) -> Self {
        Self(hex::encode(public.as_bytes()))
    }

    /// Parse a peer id from its string representation.
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::UnknownPeer(s.to_string()))?;
        if bytes.len() != 32 {
            return Err(CryptoError::UnknownPeer(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Decode back into the peer's public encryption key.
    pub(crate) fn public_key(&self) -> Result<PublicKey> {
        let bytes = hex::decode(&self.0).map_err(|_| CryptoError::UnknownPeer(self.0.clone()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::UnknownPeer(self.0.clone()))?;
        Ok(PublicKey::from(bytes))
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.0)
    }
}

/// Persisted form of a [`PeerKey`]: all four key components, base64.
///
/// For local storage only: this includes the private halves and must
/// never be placed on an outbound wire message.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeerKeyJson {
    sign_public_key: String,
    sign_private_key: String,
    box_public_key: String,
    box_private_key: String,
}

/// Peer identity key material: Ed25519 signing pair + X25519 box pair.
///
/// Immutable after construction. Secret halves are zeroized on drop by
/// the underlying dalek types.
pub struct PeerKey {
    signing_key: SigningKey,
    box_secret: StaticSecret,
    box_public: PublicKey,
}

impl PeerKey {
    /// Generate a new random identity using the OS CSPRNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let box_secret = StaticSecret::random_from_rng(OsRng);
        let box_public = PublicKey::from(&box_secret);
        Self {
            signing_key,
            box_secret,
            box_public,
        }
    }

    /// Derive a deterministic identity from a 32-byte seed.
    ///
    /// The same seed yields bit-identical keypairs. The signing key takes
    /// the seed directly; the box key is HKDF-separated from it so the two
    /// pairs never share secret bytes.
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let seed: [u8; SEED_LEN] = seed
            .try_into()
            .map_err(|_| CryptoError::InvalidSeed(seed.len()))?;

        let signing_key = SigningKey::from_bytes(&seed);

        let hk = hkdf::Hkdf::<sha2::Sha256>::new(None, &seed);
        let mut box_seed = [0u8; 32];
        hk.expand(BOX_SEED_INFO, &mut box_seed)
            .map_err(|_| CryptoError::InvalidSeed(seed.len()))?;
        let box_secret = StaticSecret::from(box_seed);
        box_seed.zeroize();

        let box_public = PublicKey::from(&box_secret);
        Ok(Self {
            signing_key,
            box_secret,
            box_public,
        })
    }

    /// Derive a deterministic identity from an arbitrary string.
    ///
    /// The string is stretched to 32 bytes with a generic hash first.
    /// Weak-entropy strings are accepted; the caller owns that tradeoff.
    pub fn from_password(password: &str) -> Result<Self> {
        let seed = primitives::hash32(password.as_bytes());
        Self::from_seed(&seed)
    }

    /// Get this peer's public identifier.
    pub fn peer_id(&self) -> PeerId {
        PeerId::from_public_key(&self.box_public)
    }

    /// Get the public signing key bytes.
    pub fn public_sign_key(&self) -> [u8; 32] {
        *self.signing_key.verifying_key().as_bytes()
    }

    /// Sign a message with this identity's signing key.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Verify a detached signature against an arbitrary public signing key.
    pub fn verify_with_key(public_sign_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let key_bytes: [u8; 32] = match public_sign_key.try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let verifying_key = match VerifyingKey::from_bytes(&key_bytes) {
            Ok(k) => k,
            Err(_) => return false,
        };
        let sig = match Signature::from_slice(signature) {
            Ok(s) => s,
            Err(_) => return false,
        };
        verifying_key.verify(message, &sig).is_ok()
    }

    /// Serialize the full key set to JSON for local persistence.
    pub fn to_json(&self) -> Result<String> {
        let json = PeerKeyJson {
            sign_public_key: b64_encode(&self.public_sign_key()),
            sign_private_key: b64_encode(&self.signing_key.to_keypair_bytes()),
            box_public_key: b64_encode(self.box_public.as_bytes()),
            box_private_key: b64_encode(&self.box_secret.to_bytes()),
        };
        serde_json::to_string(&json).map_err(|e| CryptoError::Deserialization(e.to_string()))
    }

    /// Reconstruct a key set persisted with [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: PeerKeyJson =
            serde_json::from_str(json).map_err(|e| CryptoError::Deserialization(e.to_string()))?;

        let deser = |field: &str| {
            b64_decode(field).ok_or_else(|| CryptoError::Deserialization("bad base64".into()))
        };

        let sign_keypair: [u8; 64] = deser(&parsed.sign_private_key)?
            .try_into()
            .map_err(|_| CryptoError::Deserialization("bad signing key length".into()))?;
        let signing_key = SigningKey::from_keypair_bytes(&sign_keypair)
            .map_err(|e| CryptoError::Deserialization(e.to_string()))?;

        if deser(&parsed.sign_public_key)? != signing_key.verifying_key().as_bytes() {
            return Err(CryptoError::Deserialization(
                "signing key mismatch".into(),
            ));
        }

        let box_bytes: [u8; 32] = deser(&parsed.box_private_key)?
            .try_into()
            .map_err(|_| CryptoError::Deserialization("bad box key length".into()))?;
        let box_secret = StaticSecret::from(box_bytes);
        let box_public = PublicKey::from(&box_secret);

        if deser(&parsed.box_public_key)? != box_public.as_bytes() {
            return Err(CryptoError::Deserialization("box key mismatch".into()));
        }

        Ok(Self {
            signing_key,
            box_secret,
            box_public,
        })
    }

    pub(crate) fn box_secret(&self) -> &StaticSecret {
        &self.box_secret
    }
}

impl fmt::Debug for PeerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print secret halves
        f.debug_struct("PeerKey")
            .field("peer_id", &self.peer_id())
            .finish_non_exhaustive()
    }
}
