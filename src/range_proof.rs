// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! The batched range-proof adapter: a single interface over an external
//! Bulletproofs implementation, so the rest of the crate never depends directly
//! on `bulletproofs`' own curve types.
//!
//! `bulletproofs` 4.0 is built against `curve25519-dalek-ng` rather than the
//! `curve25519-dalek` version the rest of this crate uses, so every boundary
//! crossing here goes through a byte-level conversion (both crates encode
//! Ristretto255 points and scalars identically).
//!
//! Every chunk's value-base is `G` and its randomness-base is `H`, matching
//! [`crate::cipher::Ciphertext`]'s own `C = chunk·G + r·H` exactly: a ciphertext's
//! `C` component doubles as the Pedersen commitment a batched range proof is
//! checked against, with no separate commitment to construct. [`commit`] below
//! recomputes the same value for callers that only have `(chunk, r)` on hand.

use crate::{
    error::{ConfidentialAssetError, Result},
    group::{GroupElement, G, H},
};
use bulletproofs::{BulletproofGens, PedersenGens, RangeProof};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek_ng::{ristretto::CompressedRistretto as CompressedRistrettoNg, scalar::Scalar as ScalarNg};
use merlin::Transcript as MerlinTranscript;
use once_cell::sync::{Lazy, OnceCell};
use std::sync::Arc;

const MAX_BITSIZE: usize = 64;
const MAX_PARTIES: usize = 16;

static BULLETPROOF_GENS: Lazy<BulletproofGens> =
    Lazy::new(|| BulletproofGens::new(MAX_BITSIZE, MAX_PARTIES));

static PEDERSEN_GENS: Lazy<PedersenGens> = Lazy::new(|| PedersenGens {
    B: point_to_ng(&GroupElement::generator()),
    B_blinding: point_to_ng(&GroupElement::blinding_base()),
});

fn point_to_ng(p: &GroupElement) -> curve25519_dalek_ng::ristretto::RistrettoPoint {
    CompressedRistrettoNg(p.compress())
        .decompress()
        .expect("canonical Ristretto255 point must decompress under either curve crate")
}

fn scalar_to_ng(s: &Scalar) -> ScalarNg {
    ScalarNg::from_bytes_mod_order(s.to_bytes())
}

/// A batched range-proof oracle: generates and verifies proofs that every value
/// in a batch lies in `[0, 2^num_bits)`, committed to with value-base `G` and
/// randomness-base `H`.
pub trait RangeProofOracle: Send + Sync {
    fn generate_batch(&self, values: &[u64], randomness: &[Scalar], num_bits: usize) -> Result<Vec<u8>>;

    fn verify_batch(
        &self,
        proof: &[u8],
        commitments: &[GroupElement],
        num_bits: usize,
    ) -> Result<()>;
}

/// The default oracle, backed by the `bulletproofs` batched range-proof protocol.
pub struct BulletproofsOracle;

impl RangeProofOracle for BulletproofsOracle {
    fn generate_batch(&self, values: &[u64], randomness: &[Scalar], num_bits: usize) -> Result<Vec<u8>> {
        let blindings: Vec<ScalarNg> = randomness.iter().map(scalar_to_ng).collect();
        let mut transcript = MerlinTranscript::new(b"AptosConfidentialAsset/BatchedRangeProof");
        let (proof, _commitments) = RangeProof::prove_multiple(
            &BULLETPROOF_GENS,
            &PEDERSEN_GENS,
            &mut transcript,
            values,
            &blindings,
            num_bits,
        )
        .map_err(|_| ConfidentialAssetError::RangeProofFailed)?;
        Ok(proof.to_bytes())
    }

    fn verify_batch(
        &self,
        proof: &[u8],
        commitments: &[GroupElement],
        num_bits: usize,
    ) -> Result<()> {
        let proof = RangeProof::from_bytes(proof).map_err(|_| ConfidentialAssetError::RangeProofFailed)?;
        let compressed: Vec<CompressedRistrettoNg> = commitments
            .iter()
            .map(|c| CompressedRistrettoNg(c.compress()))
            .collect();
        let mut transcript = MerlinTranscript::new(b"AptosConfidentialAsset/BatchedRangeProof");
        proof
            .verify_multiple(
                &BULLETPROOF_GENS,
                &PEDERSEN_GENS,
                &mut transcript,
                &compressed,
                num_bits,
            )
            .map_err(|_| ConfidentialAssetError::RangeProofFailed)
    }
}

/// An oracle that records its inputs and always reports proofs as valid.
///
/// Useful for structural tests of the assemblers in [`crate::authorize`] that
/// don't want to pay for a real Bulletproofs proof; true cryptographic tests
/// must use [`BulletproofsOracle`].
#[derive(Default)]
pub struct MockRangeProofOracle {
    pub recorded_generate_calls: std::sync::Mutex<Vec<(Vec<u64>, usize)>>,
}

impl RangeProofOracle for MockRangeProofOracle {
    fn generate_batch(&self, values: &[u64], _randomness: &[Scalar], num_bits: usize) -> Result<Vec<u8>> {
        self.recorded_generate_calls
            .lock()
            .unwrap()
            .push((values.to_vec(), num_bits));
        Ok(b"mock-range-proof".to_vec())
    }

    fn verify_batch(&self, proof: &[u8], _commitments: &[GroupElement], _num_bits: usize) -> Result<()> {
        if proof == b"mock-range-proof" {
            Ok(())
        } else {
            Err(ConfidentialAssetError::RangeProofFailed)
        }
    }
}

/// Recomputes `value·G + randomness·H` -- the same commitment as
/// [`crate::cipher::Ciphertext::commitment`] for a ciphertext encrypted with
/// this `(value, randomness)` pair.
pub fn commit(value: u64, randomness: &Scalar) -> GroupElement {
    Scalar::from(value) * GroupElement(*G) + *randomness * GroupElement(*H)
}

static ORACLE: OnceCell<Arc<dyn RangeProofOracle>> = OnceCell::new();

/// Installs a range-proof oracle implementation. Must happen before the first
/// proof is generated or verified; calling this a second time is a logic error
/// and returns [`ConfidentialAssetError::InvariantViolation`].
pub fn install(oracle: Arc<dyn RangeProofOracle>) -> Result<()> {
    ORACLE
        .set(oracle)
        .map_err(|_| ConfidentialAssetError::InvariantViolation("range-proof oracle already installed"))
}

/// Returns the active oracle, defaulting to [`BulletproofsOracle`] if none was installed.
pub fn oracle() -> Arc<dyn RangeProofOracle> {
    ORACLE.get_or_init(|| Arc::new(BulletproofsOracle)).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::rand_scalar;
    use rand::rngs::OsRng;

    #[test]
    fn mock_oracle_roundtrips() {
        let oracle = MockRangeProofOracle::default();
        let proof = oracle.generate_batch(&[1, 2, 3], &[], 16).unwrap();
        assert!(oracle.verify_batch(&proof, &[], 16).is_ok());
    }

    #[test]
    fn bulletproofs_oracle_accepts_in_range_batch() {
        let mut rng = OsRng;
        let values: Vec<u64> = vec![0, 1, 65535, 42];
        let randomness: Vec<Scalar> = (0..values.len()).map(|_| rand_scalar(&mut rng)).collect();
        let oracle = BulletproofsOracle;
        let proof = oracle.generate_batch(&values, &randomness, 16).unwrap();
        let commitments: Vec<GroupElement> = values
            .iter()
            .zip(randomness.iter())
            .map(|(&v, r)| commit(v, r))
            .collect();
        assert!(oracle.verify_batch(&proof, &commitments, 16).is_ok());
    }

    #[test]
    fn bulletproofs_oracle_rejects_out_of_range_commitment() {
        let mut rng = OsRng;
        let values: Vec<u64> = vec![0, 1, 65535, 42];
        let randomness: Vec<Scalar> = (0..values.len()).map(|_| rand_scalar(&mut rng)).collect();
        let oracle = BulletproofsOracle;
        let proof = oracle.generate_batch(&values, &randomness, 16).unwrap();
        let mut commitments: Vec<GroupElement> = values
            .iter()
            .zip(randomness.iter())
            .map(|(&v, r)| commit(v, r))
            .collect();
        // Swap in a commitment to an out-of-range value under fresh randomness.
        let bad_r = rand_scalar(&mut rng);
        commitments[0] = commit(1 << 20, &bad_r);
        assert!(oracle.verify_batch(&proof, &commitments, 16).is_err());
    }
}
