// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! The transfer Sigma proof: proves that a confidential transfer moves a
//! consistent amount out of the sender's balance and into ciphertexts the
//! recipient (and, optionally, any auditors) can independently decrypt --
//! without revealing the transfer amount or either party's balance.
//!
//! A transfer amount chunk is encrypted once per recipient of the plaintext
//! (sender, recipient, each auditor) but all of those ciphertexts share the
//! same Pedersen commitment `C = m·G + r·H`, since `C` does not depend on a
//! public key; only each recipient's decrypt handle `D = r·P` differs. This
//! proof therefore binds one shared `r` into several handles at once, the same
//! "grouped ciphertext validity" shape used by other confidential-transfer
//! designs for the same reason.
//!
//! Statement (public): sender key `P_s`, recipient key `P_r`, `m` auditor keys
//! `P_a[0..m)`, the sender's old and new (post-transfer) per-chunk balance
//! ciphertexts (`n` chunks, under `P_s`), and the grouped transfer-amount
//! ciphertexts (`n` chunks: a shared commitment plus one handle per recipient
//! of the plaintext).
//!
//! Witness (secret): sender key `s` and `s⁻¹`, the post-transfer balance
//! `v_after`, its per-chunk plaintexts and randomness, and the transfer
//! amount's per-chunk plaintexts and shared randomness.
//!
//! Serialized layout (`5 + 9n + n·#auditors` units, `n` chunks):
//! `α1 | α2 | α3 | α4[0..n) | α5[0..n) | α6[0..n) | α7[0..n) |`
//! `X1 | X2 | X3[0..n) | X4[0..n) | X5[0..n) | X6[0..n) | X7[0..n) | X8[aud][0..n)`.
//! See `DESIGN.md` for why this count, not the example byte count in the
//! system-level proof-size table, is authoritative for this protocol.

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

/// A transfer-amount ciphertext shared across its recipients: one commitment,
/// one decrypt handle per recipient of the plaintext.
#[derive(Clone, Debug)]
pub struct GroupedCiphertext {
    pub commitment: GroupElement,
    pub sender_handle: GroupElement,
    pub recipient_handle: GroupElement,
    pub auditor_handles: Vec<GroupElement>,
}

impl GroupedCiphertext {
    /// Encrypts `m` once, producing a handle for the sender, the recipient, and
    /// every auditor key, all under the same randomness `r`.
    pub fn encrypt(
        m: Scalar,
        r: Scalar,
        sender_pubkey: &EncryptionKey,
        recipient_pubkey: &EncryptionKey,
        auditor_pubkeys: &[EncryptionKey],
    ) -> Self {
        let commitment = m * GroupElement::generator() + r * GroupElement::blinding_base();
        GroupedCiphertext {
            commitment,
            sender_handle: r * *sender_pubkey.point(),
            recipient_handle: r * *recipient_pubkey.point(),
            auditor_handles: auditor_pubkeys.iter().map(|pk| r * *pk.point()).collect(),
        }
    }
}

/// A transfer Sigma proof over `n = alpha4.len()` chunks and `auditor_count` auditors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferProof {
    alpha1: Scalar,
    alpha2: Scalar,
    alpha3: Scalar,
    alpha4: Vec<Scalar>,
    alpha5: Vec<Scalar>,
    alpha6: Vec<Scalar>,
    alpha7: Vec<Scalar>,
    x1: GroupElement,
    x2: GroupElement,
    x3: Vec<GroupElement>,
    x4: Vec<GroupElement>,
    x5: Vec<GroupElement>,
    x6: Vec<GroupElement>,
    x7: Vec<GroupElement>,
    /// `x8[j][i]`: the `i`-th chunk's handle-validity commitment for auditor `j`.
    x8: Vec<Vec<GroupElement>>,
}

pub struct TransferWitness<'a> {
    pub sender_sk: &'a DecryptionKey,
    pub v_after: Scalar,
    pub balance_chunks_new: &'a [Scalar],
    pub balance_r_new: &'a [Scalar],
    pub amount_chunks: &'a [Scalar],
    pub amount_r: &'a [Scalar],
}

impl TransferProof {
    pub fn n(&self) -> usize {
        self.alpha4.len()
    }

    pub fn auditor_count(&self) -> usize {
        self.x8.len()
    }

    pub fn serialized_len(n: usize, auditor_count: usize) -> usize {
        (5 + 9 * n + n * auditor_count) * crate::config::PROOF_CHUNK_SIZE
    }

    #[allow(clippy::too_many_arguments)]
    pub fn prove<R: RngCore + CryptoRng>(
        rng: &mut R,
        sender_pubkey: &EncryptionKey,
        recipient_pubkey: &EncryptionKey,
        auditor_pubkeys: &[EncryptionKey],
        old_balance_cts: &[Ciphertext],
        new_balance_cts: &[Ciphertext],
        amount_cts: &[GroupedCiphertext],
        balance_chunk_bits: u32,
        witness: &TransferWitness,
    ) -> Self {
        let n = witness.amount_chunks.len();
        assert_eq!(old_balance_cts.len(), n);
        assert_eq!(new_balance_cts.len(), n);
        assert_eq!(amount_cts.len(), n);
        assert_eq!(witness.balance_chunks_new.len(), n);
        assert_eq!(witness.balance_r_new.len(), n);
        assert_eq!(witness.amount_r.len(), n);
        let (_, d_old_sum) = weighted_sum(old_balance_cts, balance_chunk_bits);
        let inv_s = inv_n(witness.sender_sk.scalar()).expect("decryption key is never zero");

        let x1_mask = rand_scalar(rng);
        let x2_mask = rand_scalar(rng);
        let x3_mask = rand_scalar(rng);
        let x4_mask = rand_scalar_list(rng, n);
        let x5_mask = rand_scalar_list(rng, n);
        let x6_mask = rand_scalar_list(rng, n);
        let x7_mask = rand_scalar_list(rng, n);

        let x1 = x1_mask * GroupElement::generator() + x2_mask * d_old_sum;
        let x2 = x3_mask * GroupElement::blinding_base();
        let x3: Vec<GroupElement> = (0..n)
            .map(|i| x4_mask[i] * GroupElement::generator() + x5_mask[i] * GroupElement::blinding_base())
            .collect();
        let x4: Vec<GroupElement> = (0..n).map(|i| x5_mask[i] * *sender_pubkey.point()).collect();
        let x5: Vec<GroupElement> = (0..n)
            .map(|i| x6_mask[i] * GroupElement::generator() + x7_mask[i] * GroupElement::blinding_base())
            .collect();
        let x6: Vec<GroupElement> = (0..n).map(|i| x7_mask[i] * *sender_pubkey.point()).collect();
        let x7: Vec<GroupElement> = (0..n).map(|i| x7_mask[i] * *recipient_pubkey.point()).collect();
        let x8: Vec<Vec<GroupElement>> = auditor_pubkeys
            .iter()
            .map(|pk| (0..n).map(|i| x7_mask[i] * *pk.point()).collect())
            .collect();

        let p = challenge(
            sender_pubkey,
            recipient_pubkey,
            auditor_pubkeys,
            old_balance_cts,
            new_balance_cts,
            amount_cts,
            &x1,
            &x2,
            &x3,
            &x4,
            &x5,
            &x6,
            &x7,
            &x8,
        );

        let alpha1 = x1_mask - p * witness.v_after;
        let alpha2 = x2_mask - p * *witness.sender_sk.scalar();
        let alpha3 = x3_mask - p * inv_s;
        let alpha4: Vec<Scalar> = (0..n).map(|i| x4_mask[i] - p * witness.balance_chunks_new[i]).collect();
        let alpha5: Vec<Scalar> = (0..n).map(|i| x5_mask[i] - p * witness.balance_r_new[i]).collect();
        let alpha6: Vec<Scalar> = (0..n).map(|i| x6_mask[i] - p * witness.amount_chunks[i]).collect();
        let alpha7: Vec<Scalar> = (0..n).map(|i| x7_mask[i] - p * witness.amount_r[i]).collect();

        TransferProof {
            alpha1,
            alpha2,
            alpha3,
            alpha4,
            alpha5,
            alpha6,
            alpha7,
            x1,
            x2,
            x3,
            x4,
            x5,
            x6,
            x7,
            x8,
        }
    }

    pub fn verify(
        &self,
        sender_pubkey: &EncryptionKey,
        recipient_pubkey: &EncryptionKey,
        auditor_pubkeys: &[EncryptionKey],
        old_balance_cts: &[Ciphertext],
        new_balance_cts: &[Ciphertext],
        amount_cts: &[GroupedCiphertext],
        chunk_bits: u32,
    ) -> Result<()> {
        let n = self.n();
        tracing::debug!(n, auditors = self.auditor_count(), "verifying transfer sigma proof");
        if old_balance_cts.len() != n || new_balance_cts.len() != n || amount_cts.len() != n {
            return Err(ConfidentialAssetError::InvariantViolation(
                "transfer proof chunk count does not match ciphertext count",
            ));
        }
        if auditor_pubkeys.len() != self.auditor_count() {
            return Err(ConfidentialAssetError::InvariantViolation(
                "transfer proof auditor count does not match statement",
            ));
        }
        for handles in amount_cts.iter() {
            if handles.auditor_handles.len() != auditor_pubkeys.len() {
                return Err(ConfidentialAssetError::InvariantViolation(
                    "grouped ciphertext auditor handle count does not match statement",
                ));
            }
        }

        let (c_old_sum, d_old_sum) = weighted_sum(old_balance_cts, chunk_bits);
        let p = challenge(
            sender_pubkey,
            recipient_pubkey,
            auditor_pubkeys,
            old_balance_cts,
            new_balance_cts,
            amount_cts,
            &self.x1,
            &self.x2,
            &self.x3,
            &self.x4,
            &self.x5,
            &self.x6,
            &self.x7,
            &self.x8,
        );

        let x1_check = self.alpha1 * GroupElement::generator() + self.alpha2 * d_old_sum + p * c_old_sum;
        let x2_check = self.alpha3 * GroupElement::blinding_base() + p * *sender_pubkey.point();
        if x1_check != self.x1 || x2_check != self.x2 {
            tracing::warn!("transfer sigma proof failed on the sender balance-consistency check");
            return Err(ConfidentialAssetError::SigmaVerifyFailed);
        }

        for i in 0..n {
            let x3_check = self.alpha4[i] * GroupElement::generator()
                + self.alpha5[i] * GroupElement::blinding_base()
                + p * new_balance_cts[i].commitment();
            let x4_check = self.alpha5[i] * *sender_pubkey.point() + p * new_balance_cts[i].handle();
            if x3_check != self.x3[i] || x4_check != self.x4[i] {
                tracing::warn!(chunk = i, "transfer sigma proof failed on a new-balance chunk check");
                return Err(ConfidentialAssetError::SigmaVerifyFailed);
            }

            let x5_check = self.alpha6[i] * GroupElement::generator()
                + self.alpha7[i] * GroupElement::blinding_base()
                + p * amount_cts[i].commitment;
            let x6_check = self.alpha7[i] * *sender_pubkey.point() + p * amount_cts[i].sender_handle;
            let x7_check = self.alpha7[i] * *recipient_pubkey.point() + p * amount_cts[i].recipient_handle;
            if x5_check != self.x5[i] || x6_check != self.x6[i] || x7_check != self.x7[i] {
                tracing::warn!(chunk = i, "transfer sigma proof failed on a grouped-amount chunk check");
                return Err(ConfidentialAssetError::SigmaVerifyFailed);
            }

            for (j, pk) in auditor_pubkeys.iter().enumerate() {
                let x8_check = self.alpha7[i] * *pk.point() + p * amount_cts[i].auditor_handles[j];
                if x8_check != self.x8[j][i] {
                    tracing::warn!(chunk = i, auditor = j, "transfer sigma proof failed on an auditor-handle check");
                    return Err(ConfidentialAssetError::SigmaVerifyFailed);
                }
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let n = self.n();
        let mut out = Vec::with_capacity(Self::serialized_len(n, self.auditor_count()));
        write_scalars(&mut out, &[self.alpha1, self.alpha2, self.alpha3]);
        write_scalars(&mut out, &self.alpha4);
        write_scalars(&mut out, &self.alpha5);
        write_scalars(&mut out, &self.alpha6);
        write_scalars(&mut out, &self.alpha7);
        write_points(&mut out, &[self.x1, self.x2]);
        write_points(&mut out, &self.x3);
        write_points(&mut out, &self.x4);
        write_points(&mut out, &self.x5);
        write_points(&mut out, &self.x6);
        write_points(&mut out, &self.x7);
        for aud in &self.x8 {
            write_points(&mut out, aud);
        }
        out
    }

    pub fn from_bytes(bytes: &[u8], n: usize, auditor_count: usize) -> Result<Self> {
        expect_len(bytes, 5 + 9 * n + n * auditor_count)?;
        let mut offset = 0;
        let alpha1 = read_scalar(bytes, &mut offset)?;
        let alpha2 = read_scalar(bytes, &mut offset)?;
        let alpha3 = read_scalar(bytes, &mut offset)?;
        let alpha4 = read_scalars(bytes, &mut offset, n)?;
        let alpha5 = read_scalars(bytes, &mut offset, n)?;
        let alpha6 = read_scalars(bytes, &mut offset, n)?;
        let alpha7 = read_scalars(bytes, &mut offset, n)?;
        let x1 = read_point(bytes, &mut offset)?;
        let x2 = read_point(bytes, &mut offset)?;
        let x3 = read_points(bytes, &mut offset, n)?;
        let x4 = read_points(bytes, &mut offset, n)?;
        let x5 = read_points(bytes, &mut offset, n)?;
        let x6 = read_points(bytes, &mut offset, n)?;
        let x7 = read_points(bytes, &mut offset, n)?;
        let x8 = (0..auditor_count)
            .map(|_| read_points(bytes, &mut offset, n))
            .collect::<Result<Vec<_>>>()?;
        Ok(TransferProof {
            alpha1,
            alpha2,
            alpha3,
            alpha4,
            alpha5,
            alpha6,
            alpha7,
            x1,
            x2,
            x3,
            x4,
            x5,
            x6,
            x7,
            x8,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn challenge(
    sender_pubkey: &EncryptionKey,
    recipient_pubkey: &EncryptionKey,
    auditor_pubkeys: &[EncryptionKey],
    old_balance_cts: &[Ciphertext],
    new_balance_cts: &[Ciphertext],
    amount_cts: &[GroupedCiphertext],
    x1: &GroupElement,
    x2: &GroupElement,
    x3: &[GroupElement],
    x4: &[GroupElement],
    x5: &[GroupElement],
    x6: &[GroupElement],
    x7: &[GroupElement],
    x8: &[Vec<GroupElement>],
) -> Scalar {
    let mut t = FiatShamirTranscript::new(dst::TRANSFER);
    t.append_point(&GroupElement::generator());
    t.append_point(&GroupElement::blinding_base());
    t.append_point(sender_pubkey.point());
    t.append_point(recipient_pubkey.point());
    for pk in auditor_pubkeys {
        t.append_point(pk.point());
    }
    for ct in old_balance_cts {
        t.append_point(&ct.commitment());
        t.append_point(&ct.handle());
    }
    for ct in new_balance_cts {
        t.append_point(&ct.commitment());
        t.append_point(&ct.handle());
    }
    for ct in amount_cts {
        t.append_point(&ct.commitment);
        t.append_point(&ct.sender_handle);
        t.append_point(&ct.recipient_handle);
        t.append_points(&ct.auditor_handles);
    }
    t.append_point(x1);
    t.append_point(x2);
    t.append_points(x3);
    t.append_points(x4);
    t.append_points(x5);
    t.append_points(x6);
    t.append_points(x7);
    for aud in x8 {
        t.append_points(aud);
    }
    t.challenge()
}
