// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Sigma (Schnorr-style) zero-knowledge protocols over twisted-ElGamal
//! ciphertexts: withdraw, transfer, key rotation, and normalization.
//!
//! All four share the same shape -- sample masks, form commitments, derive a
//! Fiat-Shamir challenge from [`crate::transcript`], compute masked responses --
//! and all four serialize as a flat concatenation of 32-byte scalars and group
//! elements in a fixed order documented on each proof type. None of them depend
//! on `merlin`: the challenge transcript is the crate's own
//! [`crate::transcript::FiatShamirTranscript`], not a STROBE-based one, so that
//! the byte-for-byte transcript construction is auditable independent of any
//! external transcript library's versioning.

pub mod normalization;
pub mod rotation;
pub mod transfer;
pub mod withdraw;

use crate::{cipher::Ciphertext, error::Result, group::GroupElement, scalar::scalar_from_u128};
use curve25519_dalek::scalar::Scalar;

/// Computes `sum_i 2^(i*chunk_bits) * C[i]` and the same weighted sum over `D[i]`.
pub(crate) fn weighted_sum(cts: &[Ciphertext], chunk_bits: u32) -> (GroupElement, GroupElement) {
    let mut c_sum = GroupElement::identity();
    let mut d_sum = GroupElement::identity();
    for (i, ct) in cts.iter().enumerate() {
        let weight = scalar_from_u128(1u128 << (i as u32 * chunk_bits));
        c_sum = c_sum + weight * ct.commitment();
        d_sum = d_sum + weight * ct.handle();
    }
    (c_sum, d_sum)
}

pub(crate) fn write_scalars(out: &mut Vec<u8>, scalars: &[Scalar]) {
    for s in scalars {
        out.extend_from_slice(s.as_bytes());
    }
}

pub(crate) fn write_points(out: &mut Vec<u8>, points: &[GroupElement]) {
    for p in points {
        out.extend_from_slice(&p.compress());
    }
}

pub(crate) fn read_scalar(bytes: &[u8], offset: &mut usize) -> Result<Scalar> {
    let chunk = read_chunk(bytes, offset)?;
    Scalar::from_canonical_bytes(chunk).ok_or(crate::error::ConfidentialAssetError::InvalidScalar(
        "sigma proof scalar is not a canonical encoding",
    ))
}

pub(crate) fn read_scalars(bytes: &[u8], offset: &mut usize, n: usize) -> Result<Vec<Scalar>> {
    (0..n).map(|_| read_scalar(bytes, offset)).collect()
}

pub(crate) fn read_point(bytes: &[u8], offset: &mut usize) -> Result<GroupElement> {
    let chunk = read_chunk(bytes, offset)?;
    GroupElement::from_bytes(&chunk)
}

pub(crate) fn read_points(bytes: &[u8], offset: &mut usize, n: usize) -> Result<Vec<GroupElement>> {
    (0..n).map(|_| read_point(bytes, offset)).collect()
}

fn read_chunk(bytes: &[u8], offset: &mut usize) -> Result<[u8; 32]> {
    let end = *offset + 32;
    if end > bytes.len() {
        return Err(crate::error::ConfidentialAssetError::BadProofLength {
            expected: end,
            actual: bytes.len(),
        });
    }
    let mut chunk = [0u8; 32];
    chunk.copy_from_slice(&bytes[*offset..end]);
    *offset = end;
    Ok(chunk)
}

/// Checks `bytes.len() == expected_units * 32`, the shape every sigma proof's
/// `from_bytes` starts with.
pub(crate) fn expect_len(bytes: &[u8], expected_units: usize) -> Result<()> {
    let expected = expected_units * crate::config::PROOF_CHUNK_SIZE;
    if bytes.len() != expected {
        return Err(crate::error::ConfidentialAssetError::BadProofLength {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}
