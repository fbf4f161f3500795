//! One-shot encryption through an untrusted relay, plus the directed
//! point-to-point variant.
//!
//! [`encrypt_for_relay`] needs no sender key at all: the payload is
//! sealed under a one-time symmetric key, and that key is sealed
//! anonymously to the recipient. The relay forwards the envelope without
//! learning the contents or the sender's identity; only the recipient's
//! private encryption key opens it.
//!
//! For messages that do not need relay anonymity there is a directed
//! pair, [`PeerKey::encrypt_to_peer`] / [`PeerKey::decrypt_from_peer`],
//! using the same sender-authenticated box construction as the handshake.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::envelope::{b64_decode, b64_encode, EncryptedEnvelope, RelayEnvelope};
use crate::error::{CryptoError, Result};
use crate::identity::{PeerId, PeerKey};
use crate::primitives;

/// Seal a payload for `recipient` without revealing the sender.
pub fn encrypt_for_relay<T: Serialize>(recipient: &PeerId, payload: &T) -> Result<RelayEnvelope> {
    let recipient_public = recipient.public_key()?;

    let plaintext =
        serde_json::to_vec(payload).map_err(|e| CryptoError::Deserialization(e.to_string()))?;

    let one_time_key = primitives::random_bytes::<32>();
    let (nonce, ciphertext) = primitives::secretbox_seal(&one_time_key, &plaintext)?;
    let sealed_key = primitives::sealed_box_seal(&recipient_public, &one_time_key)?;

    Ok(RelayEnvelope {
        nonce_b64: b64_encode(&nonce),
        cipher_b64: b64_encode(&ciphertext),
        encrypted_key_b64: b64_encode(&sealed_key),
    })
}

impl PeerKey {
    /// Open a relay envelope addressed to this identity.
    ///
    /// A tampered sealed key, tampered ciphertext, or wrong recipient key
    /// pair all fail with [`CryptoError::DecryptionFailed`].
    pub fn decrypt_from_relay<T: DeserializeOwned>(&self, envelope: &RelayEnvelope) -> Result<T> {
        let sealed_key =
            b64_decode(&envelope.encrypted_key_b64).ok_or(CryptoError::DecryptionFailed)?;
        let one_time_key = primitives::sealed_box_open(self.box_secret(), &sealed_key)?;
        let one_time_key: [u8; 32] = one_time_key
            .try_into()
            .map_err(|_| CryptoError::DecryptionFailed)?;

        let nonce = b64_decode(&envelope.nonce_b64).ok_or(CryptoError::DecryptionFailed)?;
        let ciphertext = b64_decode(&envelope.cipher_b64).ok_or(CryptoError::DecryptionFailed)?;
        let plaintext = primitives::secretbox_open(&one_time_key, &nonce, &ciphertext)?;

        serde_json::from_slice(&plaintext).map_err(|e| CryptoError::Deserialization(e.to_string()))
    }

    /// Encrypt a payload directly to `peer`, authenticated as this sender.
    pub fn encrypt_to_peer<T: Serialize>(
        &self,
        peer: &PeerId,
        payload: &T,
    ) -> Result<EncryptedEnvelope> {
        let peer_public = peer.public_key()?;
        let plaintext =
            serde_json::to_vec(payload).map_err(|e| CryptoError::Deserialization(e.to_string()))?;
        let (nonce, ciphertext) = primitives::box_seal(self.box_secret(), &peer_public, &plaintext)?;
        Ok(EncryptedEnvelope {
            nonce_b64: b64_encode(&nonce),
            cipher_b64: b64_encode(&ciphertext),
        })
    }

    /// Decrypt a payload sent by `peer` with
    /// [`encrypt_to_peer`](Self::encrypt_to_peer).
    pub fn decrypt_from_peer<T: DeserializeOwned>(
        &self,
        peer: &PeerId,
        envelope: &EncryptedEnvelope,
    ) -> Result<T> {
        let peer_public = peer.public_key()?;
        let nonce = b64_decode(&envelope.nonce_b64).ok_or(CryptoError::DecryptionFailed)?;
        let ciphertext = b64_decode(&envelope.cipher_b64).ok_or(CryptoError::DecryptionFailed)?;
        let plaintext =
            primitives::box_open(self.box_secret(), &peer_public, &nonce, &ciphertext)?;
        serde_json::from_slice(&plaintext).map_err(|e| CryptoError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_roundtrip() {
        let recipient = PeerKey::generate();
        let envelope = encrypt_for_relay(&recipient.peer_id(), &"push payload").unwrap();
        let message: String = recipient.decrypt_from_relay(&envelope).unwrap();
        assert_eq!(message, "push payload");
    }

    #[test]
    fn test_relay_roundtrip_large_payload() {
        let recipient = PeerKey::generate();
        let payload = "abcdefghij".repeat(3 * 1024); // 30 KB
        let envelope = encrypt_for_relay(&recipient.peer_id(), &payload).unwrap();
        let message: String = recipient.decrypt_from_relay(&envelope).unwrap();
        assert_eq!(message, payload);
    }

    #[test]
    fn test_relay_tampered_cipher_rejected() {
        let recipient = PeerKey::generate();
        let mut envelope = encrypt_for_relay(&recipient.peer_id(), &"payload").unwrap();

        let mut raw = b64_decode(&envelope.cipher_b64).unwrap();
        raw[0] ^= 0xff;
        envelope.cipher_b64 = b64_encode(&raw);

        assert!(matches!(
            recipient.decrypt_from_relay::<String>(&envelope),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_relay_tampered_key_rejected() {
        let recipient = PeerKey::generate();
        let mut envelope = encrypt_for_relay(&recipient.peer_id(), &"payload").unwrap();

        let mut raw = b64_decode(&envelope.encrypted_key_b64).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        envelope.encrypted_key_b64 = b64_encode(&raw);

        assert!(matches!(
            recipient.decrypt_from_relay::<String>(&envelope),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_relay_wrong_recipient_rejected() {
        let recipient = PeerKey::generate();
        let other = PeerKey::generate();

        let envelope = encrypt_for_relay(&recipient.peer_id(), &"payload").unwrap();

        assert!(matches!(
            other.decrypt_from_relay::<String>(&envelope),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_directed_roundtrip() {
        let alice = PeerKey::generate();
        let bob = PeerKey::generate();

        let envelope = alice.encrypt_to_peer(&bob.peer_id(), &"direct").unwrap();
        let message: String = bob.decrypt_from_peer(&alice.peer_id(), &envelope).unwrap();
        assert_eq!(message, "direct");
    }

    #[test]
    fn test_directed_wrong_sender_rejected() {
        let alice = PeerKey::generate();
        let bob = PeerKey::generate();
        let carol = PeerKey::generate();

        let envelope = alice.encrypt_to_peer(&bob.peer_id(), &"direct").unwrap();

        assert!(matches!(
            bob.decrypt_from_peer::<String>(&carol.peer_id(), &envelope),
            Err(CryptoError::DecryptionFailed)
        ));
    }
}
