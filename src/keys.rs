// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Twisted-ElGamal key pairs.
//!
//! The public key is `P = inv(s)·H` rather than the more familiar `s·G`; this
//! inversion is what lets the Sigma protocols in [`crate::sigma`] bind a single
//! secret `s` into both the "spend" and "decrypt" halves of a ciphertext.

use crate::{
    error::{ConfidentialAssetError, Result},
    group::{GroupElement, H},
    scalar,
};
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// A twisted-ElGamal decryption key: a scalar `s` with `1 <= s < n`.
///
/// Never serialized outside of a local secure context; `Debug` prints a redacted
/// placeholder rather than the scalar's bytes. Zeroized on drop; compared in
/// constant time.
#[derive(Clone)]
pub struct DecryptionKey(pub(crate) Scalar);

impl Drop for DecryptionKey {
    fn drop(&mut self) {
        let mut bytes = self.0.to_bytes();
        bytes.zeroize();
        self.0 = Scalar::zero();
    }
}

impl PartialEq for DecryptionKey {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.0.ct_eq(&other.0))
    }
}

impl Eq for DecryptionKey {}

impl DecryptionKey {
    /// Samples a uniformly random decryption key.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        // Rejection-sample until non-zero; zero has probability ~2^-252, but the
        // check keeps the invariant `1 <= s < n` total rather than probabilistic.
        loop {
            let s = scalar::rand_scalar(rng);
            if !bool::from(s.ct_eq(&Scalar::zero())) {
                return DecryptionKey(s);
            }
        }
    }

    /// Parses a decryption key from its 32-byte little-endian scalar encoding.
    ///
    /// Rejects the zero scalar and non-canonical encodings with [`ConfidentialAssetError::InvalidKey`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(ConfidentialAssetError::InvalidKey(
                "decryption key must be exactly 32 bytes",
            ));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        let s = Scalar::from_canonical_bytes(arr).ok_or(ConfidentialAssetError::InvalidKey(
            "decryption key bytes are not a canonical scalar",
        ))?;
        if bool::from(s.ct_eq(&Scalar::zero())) {
            return Err(ConfidentialAssetError::InvalidKey(
                "decryption key cannot be zero",
            ));
        }
        Ok(DecryptionKey(s))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Derives the associated encryption (public) key `P = inv(s)·H`.
    pub fn public_key(&self) -> Result<EncryptionKey> {
        let inv = scalar::inv_n(&self.0)?;
        Ok(EncryptionKey(inv * GroupElement(*H)))
    }

    pub(crate) fn scalar(&self) -> &Scalar {
        &self.0
    }
}

impl std::fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DecryptionKey(<redacted>)")
    }
}

/// A twisted-ElGamal encryption (public) key `P = inv(s)·H`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncryptionKey(pub(crate) GroupElement);

impl EncryptionKey {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        GroupElement::from_bytes(bytes).map(EncryptionKey)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.compress()
    }

    pub(crate) fn point(&self) -> &GroupElement {
        &self.0
    }
}

/// A hardened BIP-44-style derivation path convenience: derives a decryption key
/// deterministically from a seed and an account index.
///
/// This is a convenience for wallets that want a deterministic confidential-asset
/// key per account; it has no bearing on any security property of the protocol
/// itself, which treats `DecryptionKey` as an opaque uniform scalar however it was
/// produced.
pub fn derive_decryption_key_from_seed(seed: &[u8], account_index: u32) -> DecryptionKey {
    use sha2::{Digest, Sha512};
    let mut hasher = Sha512::new();
    hasher.update(b"AIP-80/ConfidentialAssetKeyDerivation");
    hasher.update(seed);
    hasher.update(account_index.to_le_bytes());
    let digest = hasher.finalize();
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&digest);
    DecryptionKey(Scalar::from_bytes_mod_order_wide(&wide))
}
