// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! High-level assemblers: decrypt, re-chunk, encrypt, Sigma-prove, and
//! range-prove a confidential withdrawal, transfer, key rotation, or
//! normalization in one call, and the matching verifiers on the other side.
//!
//! These are the entry points most callers want; [`crate::sigma`] and
//! [`crate::range_proof`] remain available directly for callers assembling a
//! non-standard proof bundle (e.g. batching several transfers' range proofs
//! into one Bulletproofs call).

use crate::{
    chunked_amount::ChunkedAmount,
    cipher::Ciphertext,
    config::ChunkLayout,
    error::{ConfidentialAssetError, Result},
    keys::{DecryptionKey, EncryptionKey},
    range_proof,
    scalar::{rand_scalar_list, scalar_from_u128},
    sigma::{
        normalization::{NormalizationProof, NormalizationWitness},
        rotation::{KeyRotationProof, KeyRotationWitness},
        transfer::{GroupedCiphertext, TransferProof, TransferWitness},
        withdraw::{WithdrawProof, WithdrawWitness},
    },
};
use rand::{CryptoRng, RngCore};

/// The output of [`authorize_withdraw`]: what the caller submits on-chain.
pub struct WithdrawAuthorization {
    pub new_balance_cts: Vec<Ciphertext>,
    pub sigma_proof: WithdrawProof,
    pub range_proof: Vec<u8>,
}

/// Decrypts `old_balance_cts`, subtracts `amount`, and produces a withdrawal
/// proof bundle re-encrypting the remaining balance under the same key.
pub fn authorize_withdraw<R: RngCore + CryptoRng>(
    rng: &mut R,
    sk: &DecryptionKey,
    pubkey: &EncryptionKey,
    old_balance_cts: &[Ciphertext],
    amount: u128,
    layout: ChunkLayout,
) -> Result<WithdrawAuthorization> {
    tracing::debug!(chunks = layout.chunks, chunk_bits = layout.chunk_bits, "authorizing withdrawal");
    let old_chunks = ChunkedAmount::decrypt_chunks(old_balance_cts, sk)?;
    let old_balance = ChunkedAmount::join(
        &old_chunks.iter().map(|&v| scalar_from_u128(v as u128)).collect::<Vec<_>>(),
        layout,
    )?;
    if amount > old_balance {
        tracing::warn!(requested = amount, "withdrawal exceeds decrypted balance");
        return Err(ConfidentialAssetError::InsufficientBalance {
            balance: old_balance,
            requested: amount,
        });
    }

    let new_balance = old_balance - amount;
    let new_chunked = ChunkedAmount::split(new_balance, layout)?;
    let new_r = rand_scalar_list(rng, layout.chunks);
    let new_balance_cts = ChunkedAmount::encrypt_chunks(&new_chunked.chunks, pubkey, &new_r)?;

    let witness = WithdrawWitness {
        sk,
        v_new: scalar_from_u128(new_balance),
        chunks_new: &new_chunked.chunks,
        r_new: &new_r,
    };
    let sigma_proof = WithdrawProof::prove(rng, pubkey, old_balance_cts, &new_balance_cts, amount, layout.chunk_bits, &witness);

    let new_chunk_values: Vec<u64> = new_chunked.chunks.iter().map(chunk_scalar_to_u64).collect();
    let range_proof = range_proof::oracle().generate_batch(&new_chunk_values, &new_r, layout.chunk_bits as usize)?;

    Ok(WithdrawAuthorization {
        new_balance_cts,
        sigma_proof,
        range_proof,
    })
}

/// Verifies a withdrawal proof bundle against the old and claimed new balance ciphertexts.
pub fn verify_withdraw(
    pubkey: &EncryptionKey,
    old_balance_cts: &[Ciphertext],
    new_balance_cts: &[Ciphertext],
    amount: u128,
    layout: ChunkLayout,
    sigma_proof: &WithdrawProof,
    range_proof_bytes: &[u8],
) -> Result<()> {
    tracing::debug!(chunks = layout.chunks, "verifying withdrawal proof bundle");
    if let Err(e) = sigma_proof.verify(pubkey, old_balance_cts, new_balance_cts, amount, layout.chunk_bits) {
        tracing::warn!(error = %e, "withdrawal sigma proof rejected");
        return Err(e);
    }
    let commitments: Vec<_> = new_balance_cts.iter().map(Ciphertext::commitment).collect();
    if let Err(e) = range_proof::oracle().verify_batch(range_proof_bytes, &commitments, layout.chunk_bits as usize) {
        tracing::warn!(error = %e, "withdrawal range proof rejected");
        return Err(e);
    }
    Ok(())
}

/// The output of [`authorize_transfer`].
pub struct TransferAuthorization {
    pub new_sender_balance_cts: Vec<Ciphertext>,
    pub amount_cts: Vec<GroupedCiphertext>,
    pub sigma_proof: TransferProof,
    pub balance_range_proof: Vec<u8>,
    pub amount_range_proof: Vec<u8>,
}

/// Decrypts the sender's balance, splits off `amount` into a grouped
/// ciphertext the recipient (and each auditor) can decrypt, and produces a
/// transfer proof bundle.
#[allow(clippy::too_many_arguments)]
pub fn authorize_transfer<R: RngCore + CryptoRng>(
    rng: &mut R,
    sender_sk: &DecryptionKey,
    sender_pubkey: &EncryptionKey,
    recipient_pubkey: &EncryptionKey,
    auditor_pubkeys: &[EncryptionKey],
    old_sender_balance_cts: &[Ciphertext],
    amount: u128,
    balance_layout: ChunkLayout,
    amount_layout: ChunkLayout,
) -> Result<TransferAuthorization> {
    tracing::debug!(auditors = auditor_pubkeys.len(), "authorizing transfer");
    let old_chunks = ChunkedAmount::decrypt_chunks(old_sender_balance_cts, sender_sk)?;
    let old_balance = ChunkedAmount::join(
        &old_chunks.iter().map(|&v| scalar_from_u128(v as u128)).collect::<Vec<_>>(),
        balance_layout,
    )?;
    if amount > old_balance {
        tracing::warn!(requested = amount, "transfer exceeds decrypted sender balance");
        return Err(ConfidentialAssetError::InsufficientBalance {
            balance: old_balance,
            requested: amount,
        });
    }

    let new_balance = old_balance - amount;
    let new_chunked = ChunkedAmount::split(new_balance, balance_layout)?;
    let balance_r_new = rand_scalar_list(rng, balance_layout.chunks);
    let new_sender_balance_cts =
        ChunkedAmount::encrypt_chunks(&new_chunked.chunks, sender_pubkey, &balance_r_new)?;

    let amount_chunked = ChunkedAmount::split(amount, amount_layout)?;
    let amount_r = rand_scalar_list(rng, amount_layout.chunks);
    let amount_cts: Vec<GroupedCiphertext> = amount_chunked
        .chunks
        .iter()
        .zip(amount_r.iter())
        .map(|(&m, &r)| GroupedCiphertext::encrypt(m, r, sender_pubkey, recipient_pubkey, auditor_pubkeys))
        .collect();

    let witness = TransferWitness {
        sender_sk,
        v_after: scalar_from_u128(new_balance),
        balance_chunks_new: &new_chunked.chunks,
        balance_r_new: &balance_r_new,
        amount_chunks: &amount_chunked.chunks,
        amount_r: &amount_r,
    };
    let sigma_proof = TransferProof::prove(
        rng,
        sender_pubkey,
        recipient_pubkey,
        auditor_pubkeys,
        old_sender_balance_cts,
        &new_sender_balance_cts,
        &amount_cts,
        balance_layout.chunk_bits,
        &witness,
    );

    let new_balance_values: Vec<u64> = new_chunked.chunks.iter().map(chunk_scalar_to_u64).collect();
    let balance_range_proof =
        range_proof::oracle().generate_batch(&new_balance_values, &balance_r_new, balance_layout.chunk_bits as usize)?;

    let amount_values: Vec<u64> = amount_chunked.chunks.iter().map(chunk_scalar_to_u64).collect();
    let amount_range_proof =
        range_proof::oracle().generate_batch(&amount_values, &amount_r, amount_layout.chunk_bits as usize)?;

    Ok(TransferAuthorization {
        new_sender_balance_cts,
        amount_cts,
        sigma_proof,
        balance_range_proof,
        amount_range_proof,
    })
}

/// Verifies a transfer proof bundle.
#[allow(clippy::too_many_arguments)]
pub fn verify_transfer(
    sender_pubkey: &EncryptionKey,
    recipient_pubkey: &EncryptionKey,
    auditor_pubkeys: &[EncryptionKey],
    old_sender_balance_cts: &[Ciphertext],
    new_sender_balance_cts: &[Ciphertext],
    amount_cts: &[GroupedCiphertext],
    balance_layout: ChunkLayout,
    amount_layout: ChunkLayout,
    sigma_proof: &TransferProof,
    balance_range_proof: &[u8],
    amount_range_proof: &[u8],
) -> Result<()> {
    tracing::debug!(auditors = auditor_pubkeys.len(), "verifying transfer proof bundle");
    if let Err(e) = sigma_proof.verify(
        sender_pubkey,
        recipient_pubkey,
        auditor_pubkeys,
        old_sender_balance_cts,
        new_sender_balance_cts,
        amount_cts,
        balance_layout.chunk_bits,
    ) {
        tracing::warn!(error = %e, "transfer sigma proof rejected");
        return Err(e);
    }

    let balance_commitments: Vec<_> = new_sender_balance_cts.iter().map(Ciphertext::commitment).collect();
    if let Err(e) = range_proof::oracle().verify_batch(balance_range_proof, &balance_commitments, balance_layout.chunk_bits as usize) {
        tracing::warn!(error = %e, "transfer balance range proof rejected");
        return Err(e);
    }

    let amount_commitments: Vec<_> = amount_cts.iter().map(|ct| ct.commitment).collect();
    let result = range_proof::oracle().verify_batch(amount_range_proof, &amount_commitments, amount_layout.chunk_bits as usize);
    if let Err(ref e) = result {
        tracing::warn!(error = %e, "transfer amount range proof rejected");
    }
    result
}

/// The output of [`authorize_rotate`].
pub struct KeyRotationAuthorization {
    pub new_balance_cts: Vec<Ciphertext>,
    pub sigma_proof: KeyRotationProof,
    pub range_proof: Vec<u8>,
}

/// Decrypts a balance under `old_sk` and re-encrypts it under `new_sk`'s public key.
pub fn authorize_rotate<R: RngCore + CryptoRng>(
    rng: &mut R,
    old_sk: &DecryptionKey,
    old_pubkey: &EncryptionKey,
    new_sk: &DecryptionKey,
    new_pubkey: &EncryptionKey,
    old_balance_cts: &[Ciphertext],
    layout: ChunkLayout,
) -> Result<KeyRotationAuthorization> {
    tracing::debug!(chunks = layout.chunks, "authorizing key rotation");
    let old_chunks = ChunkedAmount::decrypt_chunks(old_balance_cts, old_sk)?;
    let balance = ChunkedAmount::join(
        &old_chunks.iter().map(|&v| scalar_from_u128(v as u128)).collect::<Vec<_>>(),
        layout,
    )?;

    let new_chunked = ChunkedAmount::split(balance, layout)?;
    let r_new = rand_scalar_list(rng, layout.chunks);
    let new_balance_cts = ChunkedAmount::encrypt_chunks(&new_chunked.chunks, new_pubkey, &r_new)?;

    let witness = KeyRotationWitness {
        old_sk,
        new_sk,
        v: scalar_from_u128(balance),
        chunks_new: &new_chunked.chunks,
        r_new: &r_new,
    };
    let sigma_proof = KeyRotationProof::prove(rng, old_pubkey, new_pubkey, old_balance_cts, &new_balance_cts, layout.chunk_bits, &witness);

    let values: Vec<u64> = new_chunked.chunks.iter().map(chunk_scalar_to_u64).collect();
    let range_proof = range_proof::oracle().generate_batch(&values, &r_new, layout.chunk_bits as usize)?;

    Ok(KeyRotationAuthorization {
        new_balance_cts,
        sigma_proof,
        range_proof,
    })
}

/// Verifies a key-rotation proof bundle.
pub fn verify_rotate(
    old_pubkey: &EncryptionKey,
    new_pubkey: &EncryptionKey,
    old_balance_cts: &[Ciphertext],
    new_balance_cts: &[Ciphertext],
    layout: ChunkLayout,
    sigma_proof: &KeyRotationProof,
    range_proof_bytes: &[u8],
) -> Result<()> {
    tracing::debug!(chunks = layout.chunks, "verifying key-rotation proof bundle");
    if let Err(e) = sigma_proof.verify(old_pubkey, new_pubkey, old_balance_cts, new_balance_cts, layout.chunk_bits) {
        tracing::warn!(error = %e, "key-rotation sigma proof rejected");
        return Err(e);
    }
    let commitments: Vec<_> = new_balance_cts.iter().map(Ciphertext::commitment).collect();
    let result = range_proof::oracle().verify_batch(range_proof_bytes, &commitments, layout.chunk_bits as usize);
    if let Err(ref e) = result {
        tracing::warn!(error = %e, "key-rotation range proof rejected");
    }
    result
}

/// The output of [`authorize_normalize`].
pub struct NormalizationAuthorization {
    pub new_balance_cts: Vec<Ciphertext>,
    pub sigma_proof: NormalizationProof,
    pub range_proof: Vec<u8>,
}

/// Re-chunks a balance into canonical per-chunk range, without changing its value or key.
pub fn authorize_normalize<R: RngCore + CryptoRng>(
    rng: &mut R,
    sk: &DecryptionKey,
    pubkey: &EncryptionKey,
    old_balance_cts: &[Ciphertext],
    layout: ChunkLayout,
) -> Result<NormalizationAuthorization> {
    tracing::debug!(chunks = layout.chunks, "authorizing normalization");
    let old_chunks = ChunkedAmount::decrypt_chunks(old_balance_cts, sk)?;
    let balance = ChunkedAmount::join(
        &old_chunks.iter().map(|&v| scalar_from_u128(v as u128)).collect::<Vec<_>>(),
        layout,
    )?;

    let new_chunked = ChunkedAmount::split(balance, layout)?;
    let r_new = rand_scalar_list(rng, layout.chunks);
    let new_balance_cts = ChunkedAmount::encrypt_chunks(&new_chunked.chunks, pubkey, &r_new)?;

    let witness = NormalizationWitness {
        sk,
        v: scalar_from_u128(balance),
        chunks_new: &new_chunked.chunks,
        r_new: &r_new,
    };
    let sigma_proof = NormalizationProof::prove(rng, pubkey, old_balance_cts, &new_balance_cts, layout.chunk_bits, &witness);

    let values: Vec<u64> = new_chunked.chunks.iter().map(chunk_scalar_to_u64).collect();
    let range_proof = range_proof::oracle().generate_batch(&values, &r_new, layout.chunk_bits as usize)?;

    Ok(NormalizationAuthorization {
        new_balance_cts,
        sigma_proof,
        range_proof,
    })
}

/// Verifies a normalization proof bundle.
pub fn verify_normalize(
    pubkey: &EncryptionKey,
    old_balance_cts: &[Ciphertext],
    new_balance_cts: &[Ciphertext],
    layout: ChunkLayout,
    sigma_proof: &NormalizationProof,
    range_proof_bytes: &[u8],
) -> Result<()> {
    tracing::debug!(chunks = layout.chunks, "verifying normalization proof bundle");
    if let Err(e) = sigma_proof.verify(pubkey, old_balance_cts, new_balance_cts, layout.chunk_bits) {
        tracing::warn!(error = %e, "normalization sigma proof rejected");
        return Err(e);
    }
    let commitments: Vec<_> = new_balance_cts.iter().map(Ciphertext::commitment).collect();
    let result = range_proof::oracle().verify_batch(range_proof_bytes, &commitments, layout.chunk_bits as usize);
    if let Err(ref e) = result {
        tracing::warn!(error = %e, "normalization range proof rejected");
    }
    result
}

fn chunk_scalar_to_u64(s: &curve25519_dalek::scalar::Scalar) -> u64 {
    let bytes = s.to_bytes();
    let mut low = [0u8; 8];
    low.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(low)
}
