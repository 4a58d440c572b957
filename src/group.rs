// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! The Ristretto255 group element wrapper and the two well-known bases `G` and `H`
//! used throughout twisted-ElGamal encryption and the Sigma protocols.

use crate::error::{ConfidentialAssetError, Result};
use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT,
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
    traits::Identity,
};
use once_cell::sync::Lazy;
use std::ops::{Add, Mul, Neg, Sub};
use subtle::ConstantTimeEq;

/// Canonical 32-byte encoding of the second base point `H`, independent of `G`.
///
/// Derived (in the upstream protocol this core implements) by hashing the encoding
/// of `G` with SHA3-512 and folding the output into a Ristretto point; hardcoded
/// here as a constant since the exact bytes, not the derivation procedure, are
/// what any interoperating implementation must agree on.
pub const HASH_BASE_POINT: [u8; 32] = [
    0x8c, 0x92, 0x40, 0xb4, 0x56, 0xa9, 0xe6, 0xdc, 0x65, 0xc3, 0x77, 0xa1, 0x04, 0x8d, 0x74, 0x5f,
    0x94, 0xa0, 0x8c, 0xdb, 0x7f, 0x44, 0xcb, 0xcd, 0x7b, 0x46, 0xf3, 0x40, 0x48, 0x87, 0x11, 0x34,
];

/// The group generator `G` (the standard Ristretto255 basepoint).
pub static G: Lazy<RistrettoPoint> = Lazy::new(|| RISTRETTO_BASEPOINT_POINT);

/// The second independent base `H`, used as the randomness (blinding) base in
/// twisted ElGamal ciphertexts and in the Bulletproofs Pedersen commitments
/// built from them.
pub static H: Lazy<RistrettoPoint> = Lazy::new(|| {
    CompressedRistretto(HASH_BASE_POINT)
        .decompress()
        .expect("HASH_BASE_POINT must be a valid canonical Ristretto255 encoding")
});

/// A Ristretto255 group element.
#[derive(Clone, Copy, Debug)]
pub struct GroupElement(pub(crate) RistrettoPoint);

impl GroupElement {
    pub fn identity() -> Self {
        GroupElement(RistrettoPoint::identity())
    }

    pub fn generator() -> Self {
        GroupElement(*G)
    }

    /// The randomness (blinding) base `H`, independent of [`Self::generator`].
    pub fn blinding_base() -> Self {
        GroupElement(*H)
    }

    pub fn compress(&self) -> [u8; 32] {
        self.0.compress().to_bytes()
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        CompressedRistretto(*bytes)
            .decompress()
            .map(GroupElement)
            .ok_or(ConfidentialAssetError::InvalidKey(
                "bytes are not a valid canonical Ristretto255 point encoding",
            ))
    }

    pub fn inner(&self) -> &RistrettoPoint {
        &self.0
    }
}

impl PartialEq for GroupElement {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.0.compress().ct_eq(&other.0.compress()))
    }
}
impl Eq for GroupElement {}

impl Add for GroupElement {
    type Output = GroupElement;
    fn add(self, rhs: Self) -> Self::Output {
        GroupElement(self.0 + rhs.0)
    }
}

impl Sub for GroupElement {
    type Output = GroupElement;
    fn sub(self, rhs: Self) -> Self::Output {
        GroupElement(self.0 - rhs.0)
    }
}

impl Neg for GroupElement {
    type Output = GroupElement;
    fn neg(self) -> Self::Output {
        GroupElement(-self.0)
    }
}

impl Mul<GroupElement> for Scalar {
    type Output = GroupElement;
    fn mul(self, rhs: GroupElement) -> Self::Output {
        GroupElement(self * rhs.0)
    }
}

impl Mul<Scalar> for GroupElement {
    type Output = GroupElement;
    fn mul(self, rhs: Scalar) -> Self::Output {
        GroupElement(self.0 * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h_is_not_g() {
        assert_ne!(*G, *H);
    }

    #[test]
    fn h_decodes_to_exact_constant() {
        assert_eq!(H.compress().to_bytes(), HASH_BASE_POINT);
    }

    #[test]
    fn group_element_roundtrips_through_bytes() {
        let p = GroupElement::generator();
        let bytes = p.compress();
        let p2 = GroupElement::from_bytes(&bytes).unwrap();
        assert_eq!(p, p2);
    }

    #[test]
    fn rejects_non_canonical_bytes() {
        // All-0xff is not a valid Ristretto255 encoding.
        let bytes = [0xffu8; 32];
        assert!(GroupElement::from_bytes(&bytes).is_err());
    }
}
