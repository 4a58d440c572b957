// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Cryptographic core for confidential-balance proofs.
//!
//! This crate implements twisted-ElGamal encryption over Ristretto255, the
//! Sigma zero-knowledge proofs that authorize withdrawals, transfers, key
//! rotations, and chunk normalizations against those ciphertexts, a batched
//! Bulletproofs range-proof adapter, and the Pollard's-kangaroo solver that
//! recovers a chunk's plaintext scalar after decryption.
//!
//! [`authorize`] is the entry point most callers want: it composes
//! decryption, re-chunking, re-encryption, Sigma proving, and range proving
//! into one call per operation, with a matching verifier on the other side.
//! The lower-level pieces ([`sigma`], [`range_proof`], [`cipher`]) remain
//! public for callers assembling a non-standard proof bundle.
//!
//! No on-chain or networking concerns live here; this crate only proves and
//! verifies. Bundling a proof into a transaction, submitting it, and reading
//! back ciphertexts from chain state are all a caller's responsibility.

pub mod authorize;
pub mod chunked_amount;
pub mod cipher;
pub mod config;
pub mod error;
pub mod group;
pub mod kangaroo;
pub mod keys;
pub mod range_proof;
pub mod scalar;
pub mod sigma;
pub mod transcript;

/// Common types most callers need, re-exported for a single `use` line.
pub mod prelude {
    pub use crate::{
        authorize::{
            authorize_normalize, authorize_rotate, authorize_transfer, authorize_withdraw,
            verify_normalize, verify_rotate, verify_transfer, verify_withdraw,
            KeyRotationAuthorization, NormalizationAuthorization, TransferAuthorization,
            WithdrawAuthorization,
        },
        chunked_amount::ChunkedAmount,
        cipher::Ciphertext,
        config::ChunkLayout,
        error::{ConfidentialAssetError, Result},
        keys::{DecryptionKey, EncryptionKey},
    };
}
