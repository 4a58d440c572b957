// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! The key-rotation Sigma proof: proves that a balance re-encrypted under a
//! new key decrypts to the same value as the old balance under the old key,
//! and that the prover knows both the old and new decryption keys.
//!
//! Statement (public): old key `P`, new key `P'`, the old per-chunk balance
//! ciphertexts (under `P`), the new per-chunk balance ciphertexts (under `P'`).
//!
//! Witness (secret): old key `s` and `s⁻¹`, new key's inverse `s'⁻¹`, the
//! (unchanged) balance value `v`, and the new ciphertexts' per-chunk
//! plaintexts and encryption randomness.
//!
//! Serialized layout (`7 + 4n` units, `n` chunks):
//! `α1 | α2 | α3 | α4 | α5[0..n) | α6[0..n) | X1 | X2 | X3 | X4[0..n) | X5[0..n)`.
//! At the spec's illustrative `n = 4` that is 23 units, 736 bytes; this crate's
//! default balance layout (`ChunkLayout::CONFIDENTIAL_BALANCE`) uses `n = 8`.

use super::{expect_len, read_point, read_points, read_scalar, read_scalars, weighted_sum, write_points, write_scalars};
use crate::{
    cipher::Ciphertext,
    config::dst,
    error::{ConfidentialAssetError, Result},
    group::GroupElement,
    keys::{DecryptionKey, EncryptionKey},
    scalar::{inv_n, rand_scalar, rand_scalar_list},
    transcript::FiatShamirTranscript,
};
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};

/// A key-rotation Sigma proof over `n = alpha5.len()` balance chunks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRotationProof {
    alpha1: Scalar,
    alpha2: Scalar,
    alpha3: Scalar,
    alpha4: Scalar,
    alpha5: Vec<Scalar>,
    alpha6: Vec<Scalar>,
    x1: GroupElement,
    x2: GroupElement,
    x3: GroupElement,
    x4: Vec<GroupElement>,
    x5: Vec<GroupElement>,
}

pub struct KeyRotationWitness<'a> {
    pub old_sk: &'a DecryptionKey,
    pub new_sk: &'a DecryptionKey,
    pub v: Scalar,
    pub chunks_new: &'a [Scalar],
    pub r_new: &'a [Scalar],
}

impl KeyRotationProof {
    pub fn n(&self) -> usize {
        self.alpha5.len()
    }

    pub fn serialized_len(n: usize) -> usize {
        (7 + 4 * n) * crate::config::PROOF_CHUNK_SIZE
    }

    pub fn prove<R: RngCore + CryptoRng>(
        rng: &mut R,
        old_pubkey: &EncryptionKey,
        new_pubkey: &EncryptionKey,
        old_cts: &[Ciphertext],
        new_cts: &[Ciphertext],
        chunk_bits: u32,
        witness: &KeyRotationWitness,
    ) -> Self {
        let n = witness.chunks_new.len();
        assert_eq!(old_cts.len(), n);
        assert_eq!(new_cts.len(), n);
        assert_eq!(witness.r_new.len(), n);

        let (_, d_old_sum) = weighted_sum(old_cts, chunk_bits);
        let inv_old_s = inv_n(witness.old_sk.scalar()).expect("decryption key is never zero");
        let inv_new_s = inv_n(witness.new_sk.scalar()).expect("decryption key is never zero");

        let x1_mask = rand_scalar(rng);
        let x2_mask = rand_scalar(rng);
        let x3_mask = rand_scalar(rng);
        let x4_mask = rand_scalar(rng);
        let x5_mask = rand_scalar_list(rng, n);
        let x6_mask = rand_scalar_list(rng, n);

        let x1 = x1_mask * GroupElement::generator() + x2_mask * d_old_sum;
        let x2 = x3_mask * GroupElement::blinding_base();
        let x3 = x4_mask * GroupElement::blinding_base();
        let x4: Vec<GroupElement> = (0..n)
            .map(|i| x5_mask[i] * GroupElement::generator() + x6_mask[i] * GroupElement::blinding_base())
            .collect();
        let x5: Vec<GroupElement> = (0..n).map(|i| x6_mask[i] * *new_pubkey.point()).collect();

        let p = challenge(old_pubkey, new_pubkey, old_cts, new_cts, &x1, &x2, &x3, &x4, &x5);

        let alpha1 = x1_mask - p * witness.v;
        let alpha2 = x2_mask - p * *witness.old_sk.scalar();
        let alpha3 = x3_mask - p * inv_old_s;
        let alpha4 = x4_mask - p * inv_new_s;
        let alpha5: Vec<Scalar> = (0..n).map(|i| x5_mask[i] - p * witness.chunks_new[i]).collect();
        let alpha6: Vec<Scalar> = (0..n).map(|i| x6_mask[i] - p * witness.r_new[i]).collect();

        KeyRotationProof {
            alpha1,
            alpha2,
            alpha3,
            alpha4,
            alpha5,
            alpha6,
            x1,
            x2,
            x3,
            x4,
            x5,
        }
    }

    pub fn verify(
        &self,
        old_pubkey: &EncryptionKey,
        new_pubkey: &EncryptionKey,
        old_cts: &[Ciphertext],
        new_cts: &[Ciphertext],
        chunk_bits: u32,
    ) -> Result<()> {
        let n = self.n();
        tracing::debug!(n, "verifying key-rotation sigma proof");
        if old_cts.len() != n || new_cts.len() != n {
            return Err(ConfidentialAssetError::InvariantViolation(
                "key rotation proof chunk count does not match ciphertext count",
            ));
        }

        let (c_old_sum, d_old_sum) = weighted_sum(old_cts, chunk_bits);
        let p = challenge(old_pubkey, new_pubkey, old_cts, new_cts, &self.x1, &self.x2, &self.x3, &self.x4, &self.x5);

        let x1_check = self.alpha1 * GroupElement::generator() + self.alpha2 * d_old_sum + p * c_old_sum;
        let x2_check = self.alpha3 * GroupElement::blinding_base() + p * *old_pubkey.point();
        let x3_check = self.alpha4 * GroupElement::blinding_base() + p * *new_pubkey.point();

        if x1_check != self.x1 || x2_check != self.x2 || x3_check != self.x3 {
            tracing::warn!("key-rotation sigma proof failed on the balance-consistency check");
            return Err(ConfidentialAssetError::SigmaVerifyFailed);
        }

        for i in 0..n {
            let x4_check = self.alpha5[i] * GroupElement::generator()
                + self.alpha6[i] * GroupElement::blinding_base()
                + p * new_cts[i].commitment();
            let x5_check = self.alpha6[i] * *new_pubkey.point() + p * new_cts[i].handle();
            if x4_check != self.x4[i] || x5_check != self.x5[i] {
                tracing::warn!(chunk = i, "key-rotation sigma proof failed on a chunk-ciphertext check");
                return Err(ConfidentialAssetError::SigmaVerifyFailed);
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::serialized_len(self.n()));
        write_scalars(&mut out, &[self.alpha1, self.alpha2, self.alpha3, self.alpha4]);
        write_scalars(&mut out, &self.alpha5);
        write_scalars(&mut out, &self.alpha6);
        write_points(&mut out, &[self.x1, self.x2, self.x3]);
        write_points(&mut out, &self.x4);
        write_points(&mut out, &self.x5);
        out
    }

    pub fn from_bytes(bytes: &[u8], n: usize) -> Result<Self> {
        expect_len(bytes, 7 + 4 * n)?;
        let mut offset = 0;
        let alpha1 = read_scalar(bytes, &mut offset)?;
        let alpha2 = read_scalar(bytes, &mut offset)?;
        let alpha3 = read_scalar(bytes, &mut offset)?;
        let alpha4 = read_scalar(bytes, &mut offset)?;
        let alpha5 = read_scalars(bytes, &mut offset, n)?;
        let alpha6 = read_scalars(bytes, &mut offset, n)?;
        let x1 = read_point(bytes, &mut offset)?;
        let x2 = read_point(bytes, &mut offset)?;
        let x3 = read_point(bytes, &mut offset)?;
        let x4 = read_points(bytes, &mut offset, n)?;
        let x5 = read_points(bytes, &mut offset, n)?;
        Ok(KeyRotationProof {
            alpha1,
            alpha2,
            alpha3,
            alpha4,
            alpha5,
            alpha6,
            x1,
            x2,
            x3,
            x4,
            x5,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn challenge(
    old_pubkey: &EncryptionKey,
    new_pubkey: &EncryptionKey,
    old_cts: &[Ciphertext],
    new_cts: &[Ciphertext],
    x1: &GroupElement,
    x2: &GroupElement,
    x3: &GroupElement,
    x4: &[GroupElement],
    x5: &[GroupElement],
) -> Scalar {
    let mut t = FiatShamirTranscript::new(dst::KEY_ROTATION);
    t.append_point(&GroupElement::generator());
    t.append_point(&GroupElement::blinding_base());
    t.append_point(old_pubkey.point());
    t.append_point(new_pubkey.point());
    for ct in old_cts {
        t.append_point(&ct.commitment());
        t.append_point(&ct.handle());
    }
    for ct in new_cts {
        t.append_point(&ct.commitment());
        t.append_point(&ct.handle());
    }
    t.append_point(x1);
    t.append_point(x2);
    t.append_point(x3);
    t.append_points(x4);
    t.append_points(x5);
    t.challenge()
}
