//! Mnemonic-derived key material.
//!
//! Wraps a [`PeerKey`] whose seed comes from a BIP39 phrase instead of
//! raw bytes, alongside a BIP32 master extended key for future sub-key
//! derivation. Composition rather than subclassing: the inner [`PeerKey`]
//! is reachable through `Deref`, so every protocol operation works on a
//! [`MnemonicKey`] unchanged.
//!
//! Derivation is fully deterministic: the same phrase always yields the
//! same peer id, master key, and signing keypair. The 12-word phrase is
//! therefore a complete backup of the identity.

use bip32::{Prefix, XPrv};
use bip39::Mnemonic;
use std::ops::Deref;

use crate::error::{CryptoError, Result};
use crate::identity::PeerKey;

/// Word count for generated phrases (128-bit entropy).
const WORD_COUNT: usize = 12;

/// A [`PeerKey`] derived from a BIP39 mnemonic, plus the BIP32 master key.
pub struct MnemonicKey {
    mnemonic: Mnemonic,
    master_key: XPrv,
    key: PeerKey,
}

impl MnemonicKey {
    /// Generate a fresh 12-word phrase and derive the identity from it.
    pub fn generate() -> Result<Self> {
        let mnemonic = Mnemonic::generate(WORD_COUNT)
            .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
        Self::from_mnemonic(mnemonic)
    }

    /// Derive the identity backed up by `phrase`.
    ///
    /// Wordlist and checksum validation happen here; a bad word or bad
    /// checksum fails with [`CryptoError::InvalidMnemonic`].
    pub fn from_phrase(phrase: &str) -> Result<Self> {
        let mnemonic =
            Mnemonic::parse(phrase).map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
        Self::from_mnemonic(mnemonic)
    }

    fn from_mnemonic(mnemonic: Mnemonic) -> Result<Self> {
        // master key from the full BIP39 seed, peer key from the raw
        // entropy (hex-encoded, then stretched like any string seed)
        let seed = mnemonic.to_seed("");
        let master_key =
            XPrv::new(seed).map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;

        let entropy = mnemonic.to_entropy();
        let key = PeerKey::from_password(&hex::encode(entropy))?;

        Ok(Self {
            mnemonic,
            master_key,
            key,
        })
    }

    /// The backup phrase, words separated by single spaces.
    pub fn phrase(&self) -> String {
        self.mnemonic.to_string()
    }

    /// Number of words in the phrase.
    pub fn word_count(&self) -> usize {
        self.mnemonic.word_count()
    }

    /// BIP32 master extended private key.
    pub fn master_key(&self) -> &XPrv {
        &self.master_key
    }

    /// Serialized master key (`xprv...`), for comparison and export.
    pub fn master_key_string(&self) -> String {
        self.master_key.to_string(Prefix::XPRV).to_string()
    }

    /// The derived protocol key material.
    pub fn key(&self) -> &PeerKey {
        &self.key
    }
}

impl Deref for MnemonicKey {
    type Target = PeerKey;

    fn deref(&self) -> &PeerKey {
        &self.key
    }
}
