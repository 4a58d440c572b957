// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! The withdrawal Sigma proof: proves that a freshly re-encrypted balance,
//! under the same key as the old balance, equals the old balance minus a
//! public withdrawal amount -- without revealing either balance.
//!
//! Statement (public): the withdrawer's public key `P`, the old per-chunk
//! balance ciphertexts, the new per-chunk balance ciphertexts, and the public
//! withdrawal amount `a`.
//!
//! Witness (secret): the decryption key `s`, its inverse `s⁻¹`, the new
//! balance `v_new = v_old - a`, and the new balance's per-chunk plaintexts and
//! encryption randomness.
//!
//! Serialized layout (`5 + 4n` units of 32 bytes, `n` chunks):
//! `α1 | α2 | α3 | α4[0..n) | α5[0..n) | X1 | X2 | X3[0..n) | X4[0..n)`.
//! At the spec's illustrative `n = 4` that is 21 units, 672 bytes; this crate's
//! default balance layout (`ChunkLayout::CONFIDENTIAL_BALANCE`) uses `n = 8`.

use super::{expect_len, read_point, read_points, read_scalar, read_scalars, weighted_sum, write_points, write_scalars};
use crate::{
    cipher::Ciphertext,
    config::dst,
    error::{ConfidentialAssetError, Result},
    group::GroupElement,
    keys::{DecryptionKey, EncryptionKey},
    scalar::{inv_n, rand_scalar, rand_scalar_list, scalar_from_u128},
    transcript::FiatShamirTranscript,
};
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};

/// A withdrawal Sigma proof over `n = alpha4.len()` balance chunks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawProof {
    alpha1: Scalar,
    alpha2: Scalar,
    alpha3: Scalar,
    alpha4: Vec<Scalar>,
    alpha5: Vec<Scalar>,
    x1: GroupElement,
    x2: GroupElement,
    x3: Vec<GroupElement>,
    x4: Vec<GroupElement>,
}

/// Everything the prover needs beyond the public ciphertexts and amount.
pub struct WithdrawWitness<'a> {
    pub sk: &'a DecryptionKey,
    pub v_new: Scalar,
    pub chunks_new: &'a [Scalar],
    pub r_new: &'a [Scalar],
}

impl WithdrawProof {
    pub fn n(&self) -> usize {
        self.alpha4.len()
    }

    pub fn serialized_len(n: usize) -> usize {
        (5 + 4 * n) * crate::config::PROOF_CHUNK_SIZE
    }

    /// Produces a withdrawal proof for a balance split into `chunk_bits`-wide chunks.
    pub fn prove<R: RngCore + CryptoRng>(
        rng: &mut R,
        pubkey: &EncryptionKey,
        old_cts: &[Ciphertext],
        new_cts: &[Ciphertext],
        amount: u128,
        chunk_bits: u32,
        witness: &WithdrawWitness,
    ) -> Self {
        let n = witness.chunks_new.len();
        assert_eq!(old_cts.len(), n);
        assert_eq!(new_cts.len(), n);
        assert_eq!(witness.r_new.len(), n);

        let (_, d_old_sum) = weighted_sum(old_cts, chunk_bits);
        let inv_s = inv_n(witness.sk.scalar()).expect("decryption key is never zero");

        let x1_mask = rand_scalar(rng);
        let x2_mask = rand_scalar(rng);
        let x3_mask = rand_scalar(rng);
        let x4_mask = rand_scalar_list(rng, n);
        let x5_mask = rand_scalar_list(rng, n);

        let x1 = x1_mask * GroupElement::generator() + x2_mask * d_old_sum;
        let x2 = x3_mask * GroupElement::blinding_base();
        let x3: Vec<GroupElement> = (0..n)
            .map(|i| x4_mask[i] * GroupElement::generator() + x5_mask[i] * GroupElement::blinding_base())
            .collect();
        let x4: Vec<GroupElement> = (0..n).map(|i| x5_mask[i] * *pubkey.point()).collect();

        let p = challenge(pubkey, old_cts, new_cts, amount, &x1, &x2, &x3, &x4);

        let alpha1 = x1_mask - p * witness.v_new;
        let alpha2 = x2_mask - p * *witness.sk.scalar();
        let alpha3 = x3_mask - p * inv_s;
        let alpha4: Vec<Scalar> = (0..n).map(|i| x4_mask[i] - p * witness.chunks_new[i]).collect();
        let alpha5: Vec<Scalar> = (0..n).map(|i| x5_mask[i] - p * witness.r_new[i]).collect();

        WithdrawProof {
            alpha1,
            alpha2,
            alpha3,
            alpha4,
            alpha5,
            x1,
            x2,
            x3,
            x4,
        }
    }

    /// Verifies this proof against the public statement.
    pub fn verify(
        &self,
        pubkey: &EncryptionKey,
        old_cts: &[Ciphertext],
        new_cts: &[Ciphertext],
        amount: u128,
        chunk_bits: u32,
    ) -> Result<()> {
        let n = self.n();
        tracing::debug!(n, "verifying withdraw sigma proof");
        if old_cts.len() != n || new_cts.len() != n {
            return Err(ConfidentialAssetError::InvariantViolation(
                "withdraw proof chunk count does not match ciphertext count",
            ));
        }

        let (c_old_sum, d_old_sum) = weighted_sum(old_cts, chunk_bits);
        let p = challenge(pubkey, old_cts, new_cts, amount, &self.x1, &self.x2, &self.x3, &self.x4);
        let amount_scalar = scalar_from_u128(amount);

        let x1_check = self.alpha1 * GroupElement::generator()
            + self.alpha2 * d_old_sum
            + p * (c_old_sum - amount_scalar * GroupElement::generator());
        let x2_check = self.alpha3 * GroupElement::blinding_base() + p * *pubkey.point();

        if x1_check != self.x1 || x2_check != self.x2 {
            tracing::warn!("withdraw sigma proof failed on the balance-consistency check");
            return Err(ConfidentialAssetError::SigmaVerifyFailed);
        }

        for i in 0..n {
            let x3_check = self.alpha4[i] * GroupElement::generator()
                + self.alpha5[i] * GroupElement::blinding_base()
                + p * new_cts[i].commitment();
            let x4_check = self.alpha5[i] * *pubkey.point() + p * new_cts[i].handle();
            if x3_check != self.x3[i] || x4_check != self.x4[i] {
                tracing::warn!(chunk = i, "withdraw sigma proof failed on a chunk-ciphertext check");
                return Err(ConfidentialAssetError::SigmaVerifyFailed);
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::serialized_len(self.n()));
        write_scalars(&mut out, &[self.alpha1, self.alpha2, self.alpha3]);
        write_scalars(&mut out, &self.alpha4);
        write_scalars(&mut out, &self.alpha5);
        write_points(&mut out, &[self.x1, self.x2]);
        write_points(&mut out, &self.x3);
        write_points(&mut out, &self.x4);
        out
    }

    pub fn from_bytes(bytes: &[u8], n: usize) -> Result<Self> {
        expect_len(bytes, 5 + 4 * n)?;
        let mut offset = 0;
        let alpha1 = read_scalar(bytes, &mut offset)?;
        let alpha2 = read_scalar(bytes, &mut offset)?;
        let alpha3 = read_scalar(bytes, &mut offset)?;
        let alpha4 = read_scalars(bytes, &mut offset, n)?;
        let alpha5 = read_scalars(bytes, &mut offset, n)?;
        let x1 = read_point(bytes, &mut offset)?;
        let x2 = read_point(bytes, &mut offset)?;
        let x3 = read_points(bytes, &mut offset, n)?;
        let x4 = read_points(bytes, &mut offset, n)?;
        Ok(WithdrawProof {
            alpha1,
            alpha2,
            alpha3,
            alpha4,
            alpha5,
            x1,
            x2,
            x3,
            x4,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn challenge(
    pubkey: &EncryptionKey,
    old_cts: &[Ciphertext],
    new_cts: &[Ciphertext],
    amount: u128,
    x1: &GroupElement,
    x2: &GroupElement,
    x3: &[GroupElement],
    x4: &[GroupElement],
) -> Scalar {
    let mut t = FiatShamirTranscript::new(dst::WITHDRAW);
    t.append_point(&GroupElement::generator());
    t.append_point(&GroupElement::blinding_base());
    t.append_point(pubkey.point());
    for ct in old_cts {
        t.append_point(&ct.commitment());
        t.append_point(&ct.handle());
    }
    for ct in new_cts {
        t.append_point(&ct.commitment());
        t.append_point(&ct.handle());
    }
    t.append_bytes(&amount.to_le_bytes());
    t.append_point(x1);
    t.append_point(x2);
    t.append_points(x3);
    t.append_points(x4);
    t.challenge()
}
