//! Low-level constructions shared by the protocol modules.
//!
//! Three building blocks, all keyed with 32 bytes and sealed with
//! XChaCha20-Poly1305 under a random 24-byte nonce:
//!
//! - **secretbox**: symmetric AEAD under a pre-shared key
//! - **box**: X25519 static-static DH -> HKDF-SHA256 -> AEAD. Both sides
//!   derive the same key, which is what gives the box its implicit sender
//!   authentication.
//! - **sealed box**: ephemeral X25519 keypair -> DH with the recipient ->
//!   HKDF-SHA256 -> AEAD. The ephemeral public key rides along with the
//!   ciphertext, so the sender stays anonymous.
//!
//! The session-key exchange derives two directional keys from a single DH
//! so no key material has to cross the wire at all.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::{CryptoError, Result};

/// Secretbox/box nonce size (XChaCha20).
pub(crate) const NONCE_LEN: usize = 24;

/// Symmetric key and shared-secret size.
pub(crate) const KEY_LEN: usize = 32;

const BOX_INFO: &[u8] = b"securepeer box v1";
const SEAL_INFO: &[u8] = b"securepeer seal v1";
const EXCHANGE_I2R_INFO: &[u8] = b"securepeer exchange i2r v1";
const EXCHANGE_R2I_INFO: &[u8] = b"securepeer exchange r2i v1";

/// 32-byte generic hash, used to stretch string seeds into key seeds.
pub(crate) fn hash32(data: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(data);
    digest.into()
}

/// Fill a fixed-size buffer from the OS CSPRNG.
pub(crate) fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}

fn derive_key(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);
    let mut key = [0u8; KEY_LEN];
    hk.expand(info, &mut key)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    Ok(key)
}

fn aead(key: &[u8; KEY_LEN]) -> XChaCha20Poly1305 {
    XChaCha20Poly1305::new(Key::from_slice(key))
}

/// Symmetric AEAD under `key` with a fresh random nonce.
pub(crate) fn secretbox_seal(
    key: &[u8; KEY_LEN],
    plaintext: &[u8],
) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
    let nonce = random_bytes::<NONCE_LEN>();
    let ciphertext = aead(key)
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    Ok((nonce, ciphertext))
}

/// Open a secretbox. Any tamper (wrong key, nonce, ciphertext, truncation)
/// collapses to [`CryptoError::DecryptionFailed`].
pub(crate) fn secretbox_open(
    key: &[u8; KEY_LEN],
    nonce: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::DecryptionFailed);
    }
    aead(key)
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Key for an authenticated box between `secret` and `public`.
///
/// DH is symmetric, so both directions derive the identical key.
fn box_key(secret: &StaticSecret, public: &PublicKey) -> Result<[u8; KEY_LEN]> {
    let shared = secret.diffie_hellman(public);
    derive_key(shared.as_bytes(), BOX_INFO)
}

/// Encrypt `plaintext` so that only the holder of `public`'s secret half
/// can open it, authenticated by `secret`.
pub(crate) fn box_seal(
    secret: &StaticSecret,
    public: &PublicKey,
    plaintext: &[u8],
) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
    let key = box_key(secret, public)?;
    secretbox_seal(&key, plaintext)
}

/// Open a box produced by [`box_seal`] on the other side.
pub(crate) fn box_open(
    secret: &StaticSecret,
    public: &PublicKey,
    nonce: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    let key = box_key(secret, public).map_err(|_| CryptoError::DecryptionFailed)?;
    secretbox_open(&key, nonce, ciphertext)
}

/// Seal `plaintext` anonymously to `recipient`.
///
/// Blob layout: `eph_pk(32) || nonce(24) || ciphertext`.
pub(crate) fn sealed_box_seal(recipient: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let eph_secret = StaticSecret::random_from_rng(OsRng);
    let eph_public = PublicKey::from(&eph_secret);

    let shared = eph_secret.diffie_hellman(recipient);
    let key = derive_key(shared.as_bytes(), SEAL_INFO)?;
    let (nonce, ciphertext) = secretbox_seal(&key, plaintext)?;

    let mut blob = Vec::with_capacity(32 + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(eph_public.as_bytes());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Open a sealed-box blob with the recipient's secret key.
pub(crate) fn sealed_box_open(secret: &StaticSecret, blob: &[u8]) -> Result<Vec<u8>> {
    // 16-byte Poly1305 tag makes this the minimum well-formed length
    if blob.len() < 32 + NONCE_LEN + 16 {
        return Err(CryptoError::DecryptionFailed);
    }
    let eph_bytes: [u8; 32] = blob[..32]
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let eph_public = PublicKey::from(eph_bytes);
    let nonce = &blob[32..32 + NONCE_LEN];
    let ciphertext = &blob[32 + NONCE_LEN..];

    let shared = secret.diffie_hellman(&eph_public);
    let key = derive_key(shared.as_bytes(), SEAL_INFO).map_err(|_| CryptoError::DecryptionFailed)?;
    secretbox_open(&key, nonce, ciphertext)
}

/// Directional session keys from a one-round exchange with `peer`.
///
/// Returns `(tx, rx)` for this side. The initiator's `tx` is the
/// responder's `rx` and vice versa.
pub(crate) fn session_keys(
    secret: &StaticSecret,
    peer: &PublicKey,
    initiator: bool,
) -> Result<([u8; KEY_LEN], [u8; KEY_LEN])> {
    let shared = secret.diffie_hellman(peer);
    let i2r = derive_key(shared.as_bytes(), EXCHANGE_I2R_INFO)?;
    let r2i = derive_key(shared.as_bytes(), EXCHANGE_R2I_INFO)?;
    Ok(if initiator { (i2r, r2i) } else { (r2i, i2r) })
}
