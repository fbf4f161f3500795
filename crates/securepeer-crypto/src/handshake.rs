//! Authenticated key establishment between two peer identities.
//!
//! Two strategies sit behind the same [`KeyExchange`] contract:
//!
//! - [`BoxHandshake`] (canonical): the initiator draws a fresh 32-byte
//!   shared secret, box-encrypts it to the peer, signs the exact wire
//!   bytes, and ships the result as an [`EncryptedHandshake`]. One wire
//!   artifact, one round.
//! - [`SessionHandshake`]: a one-round key exchange deriving two
//!   directional session keys from a single DH and hashing them into one
//!   channel secret. Nothing is transmitted at all, at the cost of the
//!   primitive's initiator/responder role asymmetry.
//!
//! # Trust model
//!
//! `receive_handshake` verifies the signature with whatever signing key
//! the envelope itself carries, and decrypts with the caller-supplied
//! peer id. Nothing cryptographically binds those two keys to the same
//! entity; a caller that needs sender-identity binding must keep its
//! own trusted directory from peer id to expected signing key.
//!
//! The handshake also carries no freshness proof: a captured envelope
//! can be replayed to re-derive the same shared secret. Replay defense
//! is deliberately left to a higher layer.

use serde::{Deserialize, Serialize};

use crate::channel::SecureChannel;
use crate::envelope::{b64_decode, b64_encode, EncryptedHandshake};
use crate::error::{CryptoError, Result};
use crate::identity::{PeerId, PeerKey};
use crate::primitives;

/// Signed payload of the box handshake. Serialized with serde_json;
/// struct field order is stable, so the signature always covers the exact
/// transmitted bytes rather than a re-derived structure.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HandshakeMessage {
    nonce_b64: String,
    encrypted_shared_secret_b64: String,
}

impl PeerKey {
    /// Establish a new shared secret with `peer` and produce the wire
    /// artifact that lets them derive the same secret.
    pub fn initiate_handshake(
        &self,
        peer: &PeerId,
    ) -> Result<(SecureChannel, EncryptedHandshake)> {
        let peer_public = peer.public_key()?;

        let shared_secret = primitives::random_bytes::<32>();
        let (nonce, encrypted_secret) =
            primitives::box_seal(self.box_secret(), &peer_public, &shared_secret)?;

        let message = HandshakeMessage {
            nonce_b64: b64_encode(&nonce),
            encrypted_shared_secret_b64: b64_encode(&encrypted_secret),
        };
        let signed_bytes =
            serde_json::to_vec(&message).map_err(|e| CryptoError::Deserialization(e.to_string()))?;
        let signature = self.sign(&signed_bytes);

        let handshake = EncryptedHandshake {
            message: b64_encode(&signed_bytes),
            signature: b64_encode(&signature),
            public_sign_key: b64_encode(&self.public_sign_key()),
        };

        Ok((SecureChannel::new(shared_secret), handshake))
    }

    /// Derive the shared secret established by `peer`'s
    /// [`initiate_handshake`](Self::initiate_handshake).
    ///
    /// The signature check runs first and short-circuits before any
    /// decryption, so forged wire bytes are rejected early. The box is
    /// then opened against the caller-supplied `peer`, not any key the
    /// envelope claims. That is what pins the artifact to a specific
    /// known counterparty.
    pub fn receive_handshake(
        &self,
        peer: &PeerId,
        handshake: &EncryptedHandshake,
    ) -> Result<SecureChannel> {
        let signed_bytes =
            b64_decode(&handshake.message).ok_or(CryptoError::MalformedHandshake)?;

        let signature =
            b64_decode(&handshake.signature).ok_or(CryptoError::InvalidSignature)?;
        let public_sign_key =
            b64_decode(&handshake.public_sign_key).ok_or(CryptoError::InvalidSignature)?;
        if !PeerKey::verify_with_key(&public_sign_key, &signed_bytes, &signature) {
            return Err(CryptoError::InvalidSignature);
        }

        let message: HandshakeMessage =
            serde_json::from_slice(&signed_bytes).map_err(|_| CryptoError::MalformedHandshake)?;
        let nonce =
            b64_decode(&message.nonce_b64).ok_or(CryptoError::MalformedHandshake)?;
        let encrypted_secret = b64_decode(&message.encrypted_shared_secret_b64)
            .ok_or(CryptoError::MalformedHandshake)?;

        let peer_public = peer.public_key()?;
        let shared_secret =
            primitives::box_open(self.box_secret(), &peer_public, &nonce, &encrypted_secret)?;
        let shared_secret: [u8; 32] = shared_secret
            .try_into()
            .map_err(|_| CryptoError::DecryptionFailed)?;

        Ok(SecureChannel::new(shared_secret))
    }
}

/// One contract over both key-establishment strategies.
///
/// `Token` is whatever has to cross the wire for the responder to derive
/// the same secret: the signed envelope for the box strategy, nothing for
/// the session-key strategy.
pub trait KeyExchange {
    type Token;

    /// Initiator side: derive a channel and the token to send.
    fn initiate(&self, peer: &PeerId) -> Result<(SecureChannel, Self::Token)>;

    /// Responder side: derive the matching channel from the token.
    fn respond(&self, peer: &PeerId, token: Self::Token) -> Result<SecureChannel>;
}

/// Canonical strategy: random secret, box-encrypted and signed.
pub struct BoxHandshake<'a>(pub &'a PeerKey);

impl KeyExchange for BoxHandshake<'_> {
    type Token = EncryptedHandshake;

    fn initiate(&self, peer: &PeerId) -> Result<(SecureChannel, EncryptedHandshake)> {
        self.0.initiate_handshake(peer)
    }

    fn respond(&self, peer: &PeerId, token: EncryptedHandshake) -> Result<SecureChannel> {
        self.0.receive_handshake(peer, &token)
    }
}

/// Session-key strategy: one-round exchange, nothing transmitted.
pub struct SessionHandshake<'a>(pub &'a PeerKey);

impl KeyExchange for SessionHandshake<'_> {
    type Token = ();

    fn initiate(&self, peer: &PeerId) -> Result<(SecureChannel, ())> {
        let peer_public = peer.public_key()?;
        let (tx, rx) = primitives::session_keys(self.0.box_secret(), &peer_public, true)?;
        Ok((SecureChannel::from_session_keys(&tx, &rx), ()))
    }

    fn respond(&self, peer: &PeerId, _token: ()) -> Result<SecureChannel> {
        let peer_public = peer.public_key()?;
        let (tx, rx) = primitives::session_keys(self.0.box_secret(), &peer_public, false)?;
        // responder flips back to initiator order before combining
        Ok(SecureChannel::from_session_keys(&rx, &tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer_pair() -> (PeerKey, PeerKey) {
        (PeerKey::generate(), PeerKey::generate())
    }

    #[test]
    fn test_handshake_symmetry() {
        let (alice, bob) = peer_pair();

        let (alice_channel, handshake) = alice.initiate_handshake(&bob.peer_id()).unwrap();
        let bob_channel = bob.receive_handshake(&alice.peer_id(), &handshake).unwrap();

        assert_eq!(alice_channel.shared_secret(), bob_channel.shared_secret());
    }

    #[test]
    fn test_handshake_then_messages() {
        let (alice, bob) = peer_pair();

        let (alice_channel, handshake) = alice.initiate_handshake(&bob.peer_id()).unwrap();
        let bob_channel = bob.receive_handshake(&alice.peer_id(), &handshake).unwrap();

        let envelope = alice_channel.encrypt(&"welcome").unwrap();
        assert_eq!(bob_channel.decrypt::<String>(&envelope).unwrap(), "welcome");
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let (alice, bob) = peer_pair();
        let (_, mut handshake) = alice.initiate_handshake(&bob.peer_id()).unwrap();

        handshake.signature.truncate(10);

        assert!(matches!(
            bob.receive_handshake(&alice.peer_id(), &handshake),
            Err(CryptoError::InvalidSignature)
        ));
    }

    #[test]
    fn test_swapped_sign_key_rejected() {
        let (alice, bob) = peer_pair();
        let mallory = PeerKey::generate();
        let (_, mut handshake) = alice.initiate_handshake(&bob.peer_id()).unwrap();

        handshake.public_sign_key = b64_encode(&mallory.public_sign_key());

        assert!(matches!(
            bob.receive_handshake(&alice.peer_id(), &handshake),
            Err(CryptoError::InvalidSignature)
        ));
    }

    #[test]
    fn test_substituted_message_rejected() {
        let (alice, bob) = peer_pair();
        let (_, genuine) = alice.initiate_handshake(&bob.peer_id()).unwrap();
        let (_, other) = alice.initiate_handshake(&bob.peer_id()).unwrap();

        // valid blob, but not the one this signature covers
        let forged = EncryptedHandshake {
            message: other.message,
            signature: genuine.signature,
            public_sign_key: genuine.public_sign_key,
        };

        assert!(matches!(
            bob.receive_handshake(&alice.peer_id(), &forged),
            Err(CryptoError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_recipient_rejected() {
        let (alice, bob) = peer_pair();
        let carol = PeerKey::generate();

        // alice targets carol, but bob tries to receive it
        let (_, handshake) = alice.initiate_handshake(&carol.peer_id()).unwrap();

        assert!(matches!(
            bob.receive_handshake(&alice.peer_id(), &handshake),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_wrong_claimed_sender_rejected() {
        let (alice, bob) = peer_pair();
        let carol = PeerKey::generate();

        let (_, handshake) = alice.initiate_handshake(&bob.peer_id()).unwrap();

        // signature still verifies, but the box was not keyed by carol
        assert!(matches!(
            bob.receive_handshake(&carol.peer_id(), &handshake),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_garbled_message_is_malformed() {
        let (alice, bob) = peer_pair();
        let (_, handshake) = alice.initiate_handshake(&bob.peer_id()).unwrap();

        // re-sign arbitrary non-JSON bytes so the signature check passes
        let bytes = b"not a handshake message".to_vec();
        let forged = EncryptedHandshake {
            message: b64_encode(&bytes),
            signature: b64_encode(&alice.sign(&bytes)),
            public_sign_key: handshake.public_sign_key,
        };

        assert!(matches!(
            bob.receive_handshake(&alice.peer_id(), &forged),
            Err(CryptoError::MalformedHandshake)
        ));
    }

    #[test]
    fn test_strategy_contract_box() {
        let (alice, bob) = peer_pair();

        let (alice_channel, token) = BoxHandshake(&alice).initiate(&bob.peer_id()).unwrap();
        let bob_channel = BoxHandshake(&bob).respond(&alice.peer_id(), token).unwrap();

        assert_eq!(alice_channel.shared_secret(), bob_channel.shared_secret());
    }

    #[test]
    fn test_strategy_contract_session() {
        let (alice, bob) = peer_pair();

        let (alice_channel, ()) = SessionHandshake(&alice).initiate(&bob.peer_id()).unwrap();
        let bob_channel = SessionHandshake(&bob).respond(&alice.peer_id(), ()).unwrap();

        assert_eq!(alice_channel.shared_secret(), bob_channel.shared_secret());

        let envelope = bob_channel.encrypt(&42u32).unwrap();
        assert_eq!(alice_channel.decrypt::<u32>(&envelope).unwrap(), 42);
    }
}
