//! Secure channel over an established shared secret.
//!
//! Stateless beyond the 32-byte secret: a channel can encrypt and decrypt
//! arbitrarily many messages, each under a fresh random nonce. There is no
//! forward secrecy or key rotation here; the channel lives as long as
//! both parties retain the secret.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::envelope::{b64_decode, b64_encode, EncryptedEnvelope};
use crate::error::{CryptoError, Result};
use crate::primitives;

/// Symmetric channel keyed by a shared secret.
///
/// Safe to share read-only across threads; every call is an independent
/// pure computation plus CSPRNG nonce draw.
pub struct SecureChannel {
    shared_secret: Zeroizing<[u8; 32]>,
}

impl SecureChannel {
    /// Wrap an established shared secret.
    pub fn new(shared_secret: [u8; 32]) -> Self {
        Self {
            shared_secret: Zeroizing::new(shared_secret),
        }
    }

    /// Combine two directional session keys into one channel secret.
    ///
    /// Both sides must pass the keys in initiator order for the hashes
    /// to agree.
    pub fn from_session_keys(first: &[u8; 32], second: &[u8; 32]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(first);
        hasher.update(second);
        Self::new(hasher.finalize().into())
    }

    /// The raw shared secret. Equal on both ends of a successful handshake.
    pub fn shared_secret(&self) -> &[u8; 32] {
        &self.shared_secret
    }

    /// Encrypt any serializable payload under a fresh random nonce.
    pub fn encrypt<T: Serialize>(&self, payload: &T) -> Result<EncryptedEnvelope> {
        let plaintext =
            serde_json::to_vec(payload).map_err(|e| CryptoError::Deserialization(e.to_string()))?;
        let (nonce, ciphertext) = primitives::secretbox_seal(&self.shared_secret, &plaintext)?;
        Ok(EncryptedEnvelope {
            nonce_b64: b64_encode(&nonce),
            cipher_b64: b64_encode(&ciphertext),
        })
    }

    /// Open an envelope and deserialize the payload.
    ///
    /// Any tamper (wrong key, modified nonce or ciphertext, truncation)
    /// fails with [`CryptoError::DecryptionFailed`]; a plaintext that is
    /// not valid JSON for `T` fails with [`CryptoError::Deserialization`].
    pub fn decrypt<T: DeserializeOwned>(&self, envelope: &EncryptedEnvelope) -> Result<T> {
        let nonce = b64_decode(&envelope.nonce_b64).ok_or(CryptoError::DecryptionFailed)?;
        let ciphertext = b64_decode(&envelope.cipher_b64).ok_or(CryptoError::DecryptionFailed)?;
        let plaintext = primitives::secretbox_open(&self.shared_secret, &nonce, &ciphertext)?;
        serde_json::from_slice(&plaintext).map_err(|e| CryptoError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn channel_pair() -> (SecureChannel, SecureChannel) {
        let secret = primitives::random_bytes::<32>();
        (SecureChannel::new(secret), SecureChannel::new(secret))
    }

    #[test]
    fn test_roundtrip_string() {
        let (a, b) = channel_pair();
        let envelope = a.encrypt(&"hello peer").unwrap();
        let message: String = b.decrypt(&envelope).unwrap();
        assert_eq!(message, "hello peer");
    }

    #[test]
    fn test_roundtrip_struct() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Ping {
            seq: u64,
            body: String,
        }

        let (a, b) = channel_pair();
        let payload = Ping {
            seq: 7,
            body: "pong".into(),
        };
        let envelope = a.encrypt(&payload).unwrap();
        assert_eq!(b.decrypt::<Ping>(&envelope).unwrap(), payload);
    }

    #[test]
    fn test_roundtrip_large_payload() {
        let (a, b) = channel_pair();
        let payload = "0123456789".repeat(3 * 1024); // 30 KB
        let envelope = a.encrypt(&payload).unwrap();
        let message: String = b.decrypt(&envelope).unwrap();
        assert_eq!(message, payload);
    }

    #[test]
    fn test_fresh_nonce_per_message() {
        let (a, _) = channel_pair();
        let e1 = a.encrypt(&"same").unwrap();
        let e2 = a.encrypt(&"same").unwrap();
        assert_ne!(e1.nonce_b64, e2.nonce_b64);
        assert_ne!(e1.cipher_b64, e2.cipher_b64);
    }

    #[test]
    fn test_tampered_cipher_rejected() {
        let (a, b) = channel_pair();
        let mut envelope = a.encrypt(&"payload").unwrap();
        let mut raw = b64_decode(&envelope.cipher_b64).unwrap();
        raw[0] ^= 0xff;
        envelope.cipher_b64 = b64_encode(&raw);
        assert!(matches!(
            b.decrypt::<String>(&envelope),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_truncated_cipher_rejected() {
        let (a, b) = channel_pair();
        let mut envelope = a.encrypt(&"payload").unwrap();
        envelope.cipher_b64.truncate(4);
        assert!(matches!(
            b.decrypt::<String>(&envelope),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let (a, _) = channel_pair();
        let other = SecureChannel::new(primitives::random_bytes::<32>());
        let envelope = a.encrypt(&"payload").unwrap();
        assert!(matches!(
            other.decrypt::<String>(&envelope),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_session_key_order_matters() {
        let x = primitives::random_bytes::<32>();
        let y = primitives::random_bytes::<32>();
        let a = SecureChannel::from_session_keys(&x, &y);
        let b = SecureChannel::from_session_keys(&x, &y);
        let c = SecureChannel::from_session_keys(&y, &x);

        assert_eq!(a.shared_secret(), b.shared_secret());
        assert_ne!(a.shared_secret(), c.shared_secret());
    }
}
