// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Scalar arithmetic modulo the Ristretto255 / ed25519 group order `n`.
//!
//! All public functions here are thin, constant-time wrappers around
//! `curve25519_dalek::scalar::Scalar`. Reduction of an arbitrary-width integer
//! (`mod_n`) goes through `num_bigint` since `Scalar` itself only reduces up to
//! 64-byte inputs.

use crate::error::{ConfidentialAssetError, Result};
use curve25519_dalek::scalar::Scalar;
use num_bigint::BigUint;
use once_cell::sync::Lazy;
use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;

/// The order `n` of the Ristretto255 / ed25519 prime-order group, as a `BigUint`.
///
/// `n = 2^252 + 27742317777372353535851937790883648493`.
static CURVE_ORDER: Lazy<BigUint> = Lazy::new(|| {
    BigUint::parse_bytes(
        b"1000000000000000000000000000000014def9dea2f79cd65812631a5cf5d3ed",
        16,
    )
    .expect("curve order constant must parse")
});

/// Reduces an arbitrary-precision big-endian integer modulo the curve order.
pub fn mod_n(x_be: &[u8]) -> Scalar {
    let x = BigUint::from_bytes_be(x_be);
    let reduced = x % &*CURVE_ORDER;
    let mut le = reduced.to_bytes_le();
    le.resize(32, 0);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&le[..32]);
    Scalar::from_bytes_mod_order(bytes)
}

/// Computes the multiplicative inverse of `x` modulo `n`.
///
/// Fails with [`ConfidentialAssetError::InvalidScalar`] when `x` is zero, since zero has no
/// inverse and `Scalar::invert` would otherwise silently return zero.
pub fn inv_n(x: &Scalar) -> Result<Scalar> {
    if bool::from(x.ct_eq(&Scalar::zero())) {
        return Err(ConfidentialAssetError::InvalidScalar(
            "cannot invert the zero scalar",
        ));
    }
    Ok(x.invert())
}

/// Samples a uniformly random scalar by rejection-sampling 32 bytes until the
/// little-endian value falls below the curve order.
pub fn rand_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    loop {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        if let Some(scalar) = Scalar::from_canonical_bytes(bytes) {
            return scalar;
        }
    }
}

/// Samples `k` independent uniformly random scalars.
pub fn rand_scalar_list<R: RngCore + CryptoRng>(rng: &mut R, k: usize) -> Vec<Scalar> {
    (0..k).map(|_| rand_scalar(rng)).collect()
}

/// Converts a `u128` into its canonical scalar representation.
///
/// `u128 < 2^128 < n`, so no reduction is needed beyond zero-extending to 32 bytes.
pub fn scalar_from_u128(x: u128) -> Scalar {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(&x.to_le_bytes());
    Scalar::from_bits(bytes)
}
