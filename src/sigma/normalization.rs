// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! The normalization Sigma proof: structurally identical to [`super::withdraw`]
//! with the public amount fixed at zero. Used after repeated homomorphic
//! additions have pushed one or more balance chunks outside their declared
//! `chunk_bits` width, to re-encrypt the same value with every chunk back in
//! canonical range (a precondition the range-proof oracle otherwise rejects).
//!
//! Serialized layout: identical to [`super::withdraw::WithdrawProof`], `5 + 4n`
//! units (21 units / 672 bytes at the spec's illustrative `n = 4`; this crate's
//! default balance layout, `ChunkLayout::CONFIDENTIAL_BALANCE`, uses `n = 8`).

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

/// A normalization Sigma proof over `n = alpha4.len()` balance chunks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizationProof {
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

/// The prover's secrets: the balance value being re-chunked, its renormalized
/// per-chunk plaintexts, and the randomness used to re-encrypt them.
pub struct NormalizationWitness<'a> {
    pub sk: &'a DecryptionKey,
    pub v: Scalar,
    pub chunks_new: &'a [Scalar],
    pub r_new: &'a [Scalar],
}

impl NormalizationProof {
    pub fn n(&self) -> usize {
        self.alpha4.len()
    }

    pub fn serialized_len(n: usize) -> usize {
        (5 + 4 * n) * crate::config::PROOF_CHUNK_SIZE
    }

    pub fn prove<R: RngCore + CryptoRng>(
        rng: &mut R,
        pubkey: &EncryptionKey,
        old_cts: &[Ciphertext],
        new_cts: &[Ciphertext],
        chunk_bits: u32,
        witness: &NormalizationWitness,
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

        let p = challenge(pubkey, old_cts, new_cts, &x1, &x2, &x3, &x4);

        let alpha1 = x1_mask - p * witness.v;
        let alpha2 = x2_mask - p * *witness.sk.scalar();
        let alpha3 = x3_mask - p * inv_s;
        let alpha4: Vec<Scalar> = (0..n).map(|i| x4_mask[i] - p * witness.chunks_new[i]).collect();
        let alpha5: Vec<Scalar> = (0..n).map(|i| x5_mask[i] - p * witness.r_new[i]).collect();

        NormalizationProof {
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

    pub fn verify(
        &self,
        pubkey: &EncryptionKey,
        old_cts: &[Ciphertext],
        new_cts: &[Ciphertext],
        chunk_bits: u32,
    ) -> Result<()> {
        let n = self.n();
        tracing::debug!(n, "verifying normalization sigma proof");
        if old_cts.len() != n || new_cts.len() != n {
            return Err(ConfidentialAssetError::InvariantViolation(
                "normalization proof chunk count does not match ciphertext count",
            ));
        }

        let (c_old_sum, d_old_sum) = weighted_sum(old_cts, chunk_bits);
        let p = challenge(pubkey, old_cts, new_cts, &self.x1, &self.x2, &self.x3, &self.x4);

        let x1_check = self.alpha1 * GroupElement::generator() + self.alpha2 * d_old_sum + p * c_old_sum;
        let x2_check = self.alpha3 * GroupElement::blinding_base() + p * *pubkey.point();

        if x1_check != self.x1 || x2_check != self.x2 {
            tracing::warn!("normalization sigma proof failed on the balance-consistency check");
            return Err(ConfidentialAssetError::SigmaVerifyFailed);
        }

        for i in 0..n {
            let x3_check = self.alpha4[i] * GroupElement::generator()
                + self.alpha5[i] * GroupElement::blinding_base()
                + p * new_cts[i].commitment();
            let x4_check = self.alpha5[i] * *pubkey.point() + p * new_cts[i].handle();
            if x3_check != self.x3[i] || x4_check != self.x4[i] {
                tracing::warn!(chunk = i, "normalization sigma proof failed on a chunk-ciphertext check");
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
        Ok(NormalizationProof {
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

fn challenge(
    pubkey: &EncryptionKey,
    old_cts: &[Ciphertext],
    new_cts: &[Ciphertext],
    x1: &GroupElement,
    x2: &GroupElement,
    x3: &[GroupElement],
    x4: &[GroupElement],
) -> Scalar {
    let mut t = FiatShamirTranscript::new(dst::NORMALIZATION);
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
    t.append_point(x1);
    t.append_point(x2);
    t.append_points(x3);
    t.append_points(x4);
    t.challenge()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chunked_amount::ChunkedAmount, config::ChunkLayout, scalar};
    use rand::rngs::OsRng;

    #[test]
    fn normalization_proof_roundtrips_and_verifies() {
        let mut rng = OsRng;
        let layout = ChunkLayout::VEILED_BALANCE;
        let sk = DecryptionKey::generate(&mut rng);
        let pk = sk.public_key().unwrap();

        let value: u128 = 123_456_789;
        let old_chunked = ChunkedAmount::split(value, layout).unwrap();
        let old_r = scalar::rand_scalar_list(&mut rng, layout.chunks);
        let old_cts = ChunkedAmount::encrypt_chunks(&old_chunked.chunks, &pk, &old_r).unwrap();

        let new_chunked = ChunkedAmount::split(value, layout).unwrap();
        let new_r = scalar::rand_scalar_list(&mut rng, layout.chunks);
        let new_cts = ChunkedAmount::encrypt_chunks(&new_chunked.chunks, &pk, &new_r).unwrap();

        let witness = NormalizationWitness {
            sk: &sk,
            v: scalar::scalar_from_u128(value),
            chunks_new: &new_chunked.chunks,
            r_new: &new_r,
        };
        let proof = NormalizationProof::prove(&mut rng, &pk, &old_cts, &new_cts, 32, &witness);
        assert!(proof.verify(&pk, &old_cts, &new_cts, 32).is_ok());

        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), NormalizationProof::serialized_len(proof.n()));
        let proof2 = NormalizationProof::from_bytes(&bytes, proof.n()).unwrap();
        assert!(proof2.verify(&pk, &old_cts, &new_cts, 32).is_ok());
    }
}
