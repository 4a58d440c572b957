// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios from the protocol's testable-properties list: one
//! test per named scenario (S1-S6), plus a few of the universally quantified
//! properties that don't fit naturally as a unit test alongside the code they
//! exercise (auditor binding, key-rotation total preservation, normalization
//! idempotence). Per-module invariants (encrypt/decrypt roundtrip,
//! chunk/unchunk roundtrip, per-proof completeness/soundness/serialization)
//! live next to their code in `src/`.

use aptos_confidential_asset_core::{
    kangaroo::test_support::ensure_small_table_registered,
    keys::EncryptionKey,
    prelude::*,
    scalar::{rand_scalar_list, scalar_from_u128},
};
use rand::rngs::OsRng;

const ALICE_BAL: u128 = 18_446_744_073_709_551_716;

/// Registers a 17-bit kangaroo table, exactly once per test process. The S5
/// scenario's overflowed chunks (`2^16 + 100`) exceed the 16-bit table's
/// range, so decrypting them (a step `authorize_normalize` performs
/// internally) needs a wider table on hand.
fn ensure_17_bit_table_registered() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        aptos_confidential_asset_core::kangaroo::register_table(aptos_confidential_asset_core::kangaroo::precompute(17));
    });
}

fn encrypt_balance(
    rng: &mut OsRng,
    balance: u128,
    pubkey: &EncryptionKey,
    layout: ChunkLayout,
) -> Vec<Ciphertext> {
    let chunked = ChunkedAmount::split(balance, layout).unwrap();
    let r = rand_scalar_list(rng, layout.chunks);
    ChunkedAmount::encrypt_chunks(&chunked.chunks, pubkey, &r).unwrap()
}

fn decrypt_balance(cts: &[Ciphertext], sk: &DecryptionKey, layout: ChunkLayout) -> u128 {
    let chunks = ChunkedAmount::decrypt_chunks(cts, sk).unwrap();
    ChunkedAmount::join(
        &chunks.iter().map(|&v| scalar_from_u128(v as u128)).collect::<Vec<_>>(),
        layout,
    )
    .unwrap()
}

// S1: withdraw 2^16 from Alice's balance; verifier accepts; new balance is exact.
#[test]
fn s1_withdraw_reduces_balance_by_exact_amount() {
    ensure_small_table_registered();
    let mut rng = OsRng;
    let layout = ChunkLayout::CONFIDENTIAL_BALANCE;
    let alice_sk = DecryptionKey::generate(&mut rng);
    let alice_pk = alice_sk.public_key().unwrap();
    let old_cts = encrypt_balance(&mut rng, ALICE_BAL, &alice_pk, layout);

    let withdrawn = 1u128 << 16;
    let auth = authorize_withdraw(&mut rng, &alice_sk, &alice_pk, &old_cts, withdrawn, layout).unwrap();
    verify_withdraw(&alice_pk, &old_cts, &auth.new_balance_cts, withdrawn, layout, &auth.sigma_proof, &auth.range_proof)
        .expect("withdrawal proof must verify");

    let new_balance = decrypt_balance(&auth.new_balance_cts, &alice_sk, layout);
    assert_eq!(new_balance, ALICE_BAL - withdrawn);
}

// S2: Alice transfers 10 to Bob's fresh key; both legs decrypt to the expected values.
#[test]
fn s2_transfer_splits_balance_between_sender_and_recipient() {
    ensure_small_table_registered();
    let mut rng = OsRng;
    let balance_layout = ChunkLayout::CONFIDENTIAL_BALANCE;
    let amount_layout = ChunkLayout::CONFIDENTIAL_TRANSFER;

    let alice_sk = DecryptionKey::generate(&mut rng);
    let alice_pk = alice_sk.public_key().unwrap();
    let bob_sk = DecryptionKey::generate(&mut rng);
    let bob_pk = bob_sk.public_key().unwrap();

    let old_cts = encrypt_balance(&mut rng, ALICE_BAL, &alice_pk, balance_layout);

    let amount = 10u128;
    let auth = authorize_transfer(
        &mut rng,
        &alice_sk,
        &alice_pk,
        &bob_pk,
        &[],
        &old_cts,
        amount,
        balance_layout,
        amount_layout,
    )
    .unwrap();

    verify_transfer(
        &alice_pk,
        &bob_pk,
        &[],
        &old_cts,
        &auth.new_sender_balance_cts,
        &auth.amount_cts,
        balance_layout,
        amount_layout,
        &auth.sigma_proof,
        &auth.balance_range_proof,
        &auth.amount_range_proof,
    )
    .expect("transfer proof must verify");

    let new_sender_balance = decrypt_balance(&auth.new_sender_balance_cts, &alice_sk, balance_layout);
    assert_eq!(new_sender_balance, ALICE_BAL - amount);

    let amount_chunks: Vec<u64> = auth
        .amount_cts
        .iter()
        .map(|ct| {
            // Bob only has public access to his own leg of the grouped ciphertext
            // (commitment + his handle); repack it as an ordinary `Ciphertext` so
            // decryption goes through the crate's public `Ciphertext::decrypt`.
            let mut bytes = [0u8; 64];
            bytes[..32].copy_from_slice(&ct.commitment.compress());
            bytes[32..].copy_from_slice(&ct.recipient_handle.compress());
            Ciphertext::from_bytes(&bytes).unwrap().decrypt(&bob_sk).unwrap()
        })
        .collect();
    let received: u128 = ChunkedAmount::join(
        &amount_chunks.iter().map(|&v| scalar_from_u128(v as u128)).collect::<Vec<_>>(),
        amount_layout,
    )
    .unwrap();
    assert_eq!(received, amount);
}

// S3: same transfer, once with an auditor present (accepts), once verified
// against a substituted auditor key (rejects).
#[test]
fn s3_transfer_with_auditor_accepts_correct_key_rejects_substituted() {
    ensure_small_table_registered();
    let mut rng = OsRng;
    let balance_layout = ChunkLayout::CONFIDENTIAL_BALANCE;
    let amount_layout = ChunkLayout::CONFIDENTIAL_TRANSFER;

    let alice_sk = DecryptionKey::generate(&mut rng);
    let alice_pk = alice_sk.public_key().unwrap();
    let bob_pk = DecryptionKey::generate(&mut rng).public_key().unwrap();
    let auditor_pk = DecryptionKey::generate(&mut rng).public_key().unwrap();
    let impostor_pk = DecryptionKey::generate(&mut rng).public_key().unwrap();

    let old_cts = encrypt_balance(&mut rng, ALICE_BAL, &alice_pk, balance_layout);
    let auth = authorize_transfer(
        &mut rng,
        &alice_sk,
        &alice_pk,
        &bob_pk,
        &[auditor_pk],
        &old_cts,
        10,
        balance_layout,
        amount_layout,
    )
    .unwrap();

    verify_transfer(
        &alice_pk,
        &bob_pk,
        &[auditor_pk],
        &old_cts,
        &auth.new_sender_balance_cts,
        &auth.amount_cts,
        balance_layout,
        amount_layout,
        &auth.sigma_proof,
        &auth.balance_range_proof,
        &auth.amount_range_proof,
    )
    .expect("transfer with correct auditor must verify");

    let err = verify_transfer(
        &alice_pk,
        &bob_pk,
        &[impostor_pk],
        &old_cts,
        &auth.new_sender_balance_cts,
        &auth.amount_cts,
        balance_layout,
        amount_layout,
        &auth.sigma_proof,
        &auth.balance_range_proof,
        &auth.amount_range_proof,
    );
    assert!(err.is_err(), "substituted auditor key must be rejected");
}

// S4: Alice rotates from s to s'; new ciphertext under s' decrypts to the same
// balance; verifying against the swapped key pair fails.
#[test]
fn s4_key_rotation_preserves_balance_and_rejects_swapped_keys() {
    ensure_small_table_registered();
    let mut rng = OsRng;
    let layout = ChunkLayout::CONFIDENTIAL_BALANCE;

    let old_sk = DecryptionKey::generate(&mut rng);
    let old_pk = old_sk.public_key().unwrap();
    let new_sk = DecryptionKey::generate(&mut rng);
    let new_pk = new_sk.public_key().unwrap();

    let old_cts = encrypt_balance(&mut rng, ALICE_BAL, &old_pk, layout);
    let auth = authorize_rotate(&mut rng, &old_sk, &old_pk, &new_sk, &new_pk, &old_cts, layout).unwrap();

    verify_rotate(&old_pk, &new_pk, &old_cts, &auth.new_balance_cts, layout, &auth.sigma_proof, &auth.range_proof)
        .expect("rotation proof must verify");

    let recovered = decrypt_balance(&auth.new_balance_cts, &new_sk, layout);
    assert_eq!(recovered, ALICE_BAL);

    // Swap (old, new) -> (new, old): same ciphertexts no longer match the statement.
    assert!(verify_rotate(&new_pk, &old_pk, &old_cts, &auth.new_balance_cts, layout, &auth.sigma_proof, &auth.range_proof).is_err());
}

// S5: an unnormalized balance (seven chunks overflowed by 100, one zero chunk)
// normalizes to ciphertexts that decrypt to the same total and pass range proof.
#[test]
fn s5_normalization_preserves_total_for_overflowed_chunks() {
    ensure_small_table_registered();
    ensure_17_bit_table_registered();
    let mut rng = OsRng;
    let layout = ChunkLayout::CONFIDENTIAL_BALANCE;
    let sk = DecryptionKey::generate(&mut rng);
    let pk = sk.public_key().unwrap();

    // Seven chunks overflowed by 100 past their 16-bit width, one zero chunk.
    // `ChunkedAmount::split` always produces in-range limbs; to model an
    // out-of-canonical-range input we build the ciphertexts directly rather
    // than through `split`, since that's the only way such a balance arises
    // (e.g. homomorphic addition of several transfers into the same chunk).
    let overflowed_limb: u128 = (1u128 << layout.chunk_bits) + 100;
    let mut total: u128 = 0;
    let mut cts = Vec::with_capacity(layout.chunks);
    for i in 0..layout.chunks {
        let limb = if i < layout.chunks - 1 { overflowed_limb } else { 0 };
        total += limb << (i as u32 * layout.chunk_bits);
        let r = aptos_confidential_asset_core::scalar::rand_scalar(&mut rng);
        cts.push(Ciphertext::encrypt(scalar_from_u128(limb), &pk, r));
    }

    let auth = authorize_normalize(&mut rng, &sk, &pk, &cts, layout).unwrap();
    verify_normalize(&pk, &cts, &auth.new_balance_cts, layout, &auth.sigma_proof, &auth.range_proof)
        .expect("normalization proof must verify");

    let normalized_total = decrypt_balance(&auth.new_balance_cts, &sk, layout);
    assert_eq!(normalized_total, total);
}

// S6: a single flipped bit in a withdrawal Sigma proof is rejected as SigmaVerifyFailed.
#[test]
fn s6_tampered_withdraw_proof_byte_is_rejected() {
    ensure_small_table_registered();
    let mut rng = OsRng;
    let layout = ChunkLayout::CONFIDENTIAL_BALANCE;
    let sk = DecryptionKey::generate(&mut rng);
    let pk = sk.public_key().unwrap();
    let old_cts = encrypt_balance(&mut rng, ALICE_BAL, &pk, layout);

    let amount = 1u128 << 16;
    let auth = authorize_withdraw(&mut rng, &sk, &pk, &old_cts, amount, layout).unwrap();

    let mut bytes = auth.sigma_proof.to_bytes();
    bytes[0] ^= 0x01;
    let tampered =
        aptos_confidential_asset_core::sigma::withdraw::WithdrawProof::from_bytes(&bytes, auth.sigma_proof.n()).unwrap();

    let err = tampered.verify(&pk, &old_cts, &auth.new_balance_cts, amount, layout.chunk_bits);
    assert_eq!(err, Err(ConfidentialAssetError::SigmaVerifyFailed));
}

// Property 6 (auditor binding): removing an auditor from the verification set,
// rather than substituting one, is also rejected (length mismatch, not a
// forged-proof mismatch).
#[test]
fn property_auditor_removed_from_verification_set_is_rejected() {
    ensure_small_table_registered();
    let mut rng = OsRng;
    let balance_layout = ChunkLayout::CONFIDENTIAL_BALANCE;
    let amount_layout = ChunkLayout::CONFIDENTIAL_TRANSFER;

    let alice_sk = DecryptionKey::generate(&mut rng);
    let alice_pk = alice_sk.public_key().unwrap();
    let bob_pk = DecryptionKey::generate(&mut rng).public_key().unwrap();
    let auditor_pk = DecryptionKey::generate(&mut rng).public_key().unwrap();

    let old_cts = encrypt_balance(&mut rng, 5_000, &alice_pk, balance_layout);
    let auth = authorize_transfer(
        &mut rng,
        &alice_sk,
        &alice_pk,
        &bob_pk,
        &[auditor_pk],
        &old_cts,
        100,
        balance_layout,
        amount_layout,
    )
    .unwrap();

    let err = verify_transfer(
        &alice_pk,
        &bob_pk,
        &[],
        &old_cts,
        &auth.new_sender_balance_cts,
        &auth.amount_cts,
        balance_layout,
        amount_layout,
        &auth.sigma_proof,
        &auth.balance_range_proof,
        &auth.amount_range_proof,
    );
    assert!(err.is_err());
}

// Property 8 (normalization idempotence): normalizing an already-canonical
// balance is a no-op on its decrypted value and still produces a verifying proof.
#[test]
fn property_normalizing_a_canonical_balance_is_idempotent() {
    ensure_small_table_registered();
    let mut rng = OsRng;
    let layout = ChunkLayout::CONFIDENTIAL_BALANCE;
    let sk = DecryptionKey::generate(&mut rng);
    let pk = sk.public_key().unwrap();

    let balance = 777_000u128;
    let old_cts = encrypt_balance(&mut rng, balance, &pk, layout);
    let auth = authorize_normalize(&mut rng, &sk, &pk, &old_cts, layout).unwrap();
    verify_normalize(&pk, &old_cts, &auth.new_balance_cts, layout, &auth.sigma_proof, &auth.range_proof).unwrap();

    let once = decrypt_balance(&auth.new_balance_cts, &sk, layout);
    assert_eq!(once, balance);

    let auth2 = authorize_normalize(&mut rng, &sk, &pk, &auth.new_balance_cts, layout).unwrap();
    verify_normalize(&pk, &auth.new_balance_cts, &auth2.new_balance_cts, layout, &auth2.sigma_proof, &auth2.range_proof).unwrap();
    let twice = decrypt_balance(&auth2.new_balance_cts, &sk, layout);
    assert_eq!(twice, balance);
}

// Property: a withdrawal that requests more than the decrypted balance holds
// is rejected before any proof is produced.
#[test]
fn property_withdraw_above_balance_is_rejected_before_proving() {
    ensure_small_table_registered();
    let mut rng = OsRng;
    let layout = ChunkLayout::CONFIDENTIAL_BALANCE;
    let sk = DecryptionKey::generate(&mut rng);
    let pk = sk.public_key().unwrap();
    let old_cts = encrypt_balance(&mut rng, 500, &pk, layout);

    let err = authorize_withdraw(&mut rng, &sk, &pk, &old_cts, 501, layout);
    assert_eq!(
        err.unwrap_err(),
        ConfidentialAssetError::InsufficientBalance {
            balance: 500,
            requested: 501
        }
    );
}
