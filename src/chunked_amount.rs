// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Splitting a `u128` amount into fixed-width limbs suitable for per-limb range
//! proving and kangaroo decryption, and the per-limb ciphertext vector built on
//! top of them.

use crate::{
    cipher::Ciphertext,
    config::ChunkLayout,
    error::{ConfidentialAssetError, Result},
    keys::{DecryptionKey, EncryptionKey},
    scalar::scalar_from_u128,
};
use curve25519_dalek::scalar::Scalar;
use rayon::prelude::*;

/// A `u128` amount split into `layout.chunks` limbs of `layout.chunk_bits` bits each.
#[derive(Clone, Debug)]
pub struct ChunkedAmount {
    pub amount: u128,
    pub layout: ChunkLayout,
    pub chunks: Vec<Scalar>,
}

impl ChunkedAmount {
    /// Splits `amount` into limbs under `layout`.
    ///
    /// Fails with [`ConfidentialAssetError::ValueTooLarge`] when `amount` does not
    /// fit (`amount >= 2^(chunks * chunk_bits)`).
    pub fn split(amount: u128, layout: ChunkLayout) -> Result<Self> {
        if layout.chunk_bits < 128 && amount >= layout.capacity() {
            return Err(ConfidentialAssetError::ValueTooLarge {
                value: amount,
                chunks: layout.chunks,
                chunk_bits: layout.chunk_bits,
            });
        }
        let mask: u128 = if layout.chunk_bits >= 128 {
            u128::MAX
        } else {
            (1u128 << layout.chunk_bits) - 1
        };
        let chunks = (0..layout.chunks)
            .map(|i| {
                let shift = i as u32 * layout.chunk_bits;
                let limb = (amount >> shift) & mask;
                scalar_from_u128(limb)
            })
            .collect();
        Ok(ChunkedAmount {
            amount,
            layout,
            chunks,
        })
    }

    /// Recombines limb scalars into the amount they represent, verifying the
    /// result against an (optionally) expected value.
    ///
    /// Mismatches raise [`ConfidentialAssetError::InvariantViolation`]: a correctly
    /// constructed `ChunkedAmount` can never fail this check, so a failure here
    /// indicates a bug rather than malformed external input.
    pub fn join(chunks: &[Scalar], layout: ChunkLayout) -> Result<u128> {
        if chunks.len() != layout.chunks {
            return Err(ConfidentialAssetError::InvariantViolation(
                "chunk count does not match layout",
            ));
        }
        let mut total: u128 = 0;
        for (i, chunk) in chunks.iter().enumerate() {
            let limb = scalar_to_u128_checked(chunk, layout.chunk_bits)?;
            let shift = i as u32 * layout.chunk_bits;
            total = total
                .checked_add(limb << shift)
                .ok_or(ConfidentialAssetError::InvariantViolation(
                    "chunk recombination overflowed a u128",
                ))?;
        }
        Ok(total)
    }

    /// Encrypts every limb under `pubkey`, using the provided per-limb randomness.
    pub fn encrypt_chunks(
        chunks: &[Scalar],
        pubkey: &EncryptionKey,
        randomness: &[Scalar],
    ) -> Result<Vec<Ciphertext>> {
        if chunks.len() != randomness.len() {
            return Err(ConfidentialAssetError::InvariantViolation(
                "randomness length does not match chunk count",
            ));
        }
        Ok(chunks
            .iter()
            .zip(randomness.iter())
            .map(|(&m, &r)| Ciphertext::encrypt(m, pubkey, r))
            .collect())
    }

    /// Decrypts every ciphertext to its limb value, in parallel.
    pub fn decrypt_chunks(cts: &[Ciphertext], sk: &DecryptionKey) -> Result<Vec<u64>> {
        cts.par_iter()
            .map(|ct| ct.decrypt(sk))
            .collect::<Result<Vec<u64>>>()
    }
}

/// Converts a limb scalar back to a `u128`, checking it is within `chunk_bits`.
fn scalar_to_u128_checked(s: &Scalar, chunk_bits: u32) -> Result<u128> {
    let bytes = s.to_bytes();
    // A chunk always fits in the low 16 bytes for any supported layout (chunk_bits <= 32).
    if bytes[16..].iter().any(|&b| b != 0) {
        return Err(ConfidentialAssetError::InvariantViolation(
            "chunk scalar exceeds 128 bits",
        ));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&bytes[..16]);
    let value = u128::from_le_bytes(low);
    let bound = if chunk_bits >= 128 {
        u128::MAX
    } else {
        1u128 << chunk_bits
    };
    if chunk_bits < 128 && value >= bound {
        return Err(ConfidentialAssetError::InvariantViolation(
            "chunk value exceeds its declared bit width",
        ));
    }
    Ok(value)
}
