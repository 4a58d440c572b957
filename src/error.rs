// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the confidential-asset cryptographic core.
//!
//! Every fallible entry point in this crate returns a [`ConfidentialAssetError`].
//! Internal-consistency failures (chunk recombination, length mismatches between
//! an auditor list and its proof) are distinguished from external-input failures
//! (malformed proof bytes, failed verification) so that callers know which
//! errors are safe to retry with corrected inputs.

use thiserror::Error;

/// Errors produced by the confidential-asset cryptographic core.
///
/// `InvariantViolation` indicates a bug in the core or its caller (a chunk sum
/// not equal to its claimed amount, an auditor-list/proof length mismatch) and
/// is never expected to occur given well-formed inputs. Every other variant is
/// a data-level failure: the caller supplied bytes, keys, or amounts that don't
/// satisfy a documented precondition, and retrying with corrected input is safe.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfidentialAssetError {
    /// A scalar was zero or otherwise out of the required range (e.g. inverting `s = 0`).
    #[error("invalid scalar: {0}")]
    InvalidScalar(&'static str),

    /// A decryption key or encryption-key encoding was malformed or zero.
    #[error("invalid key: {0}")]
    InvalidKey(&'static str),

    /// An amount did not fit the configured chunk layout.
    #[error("value {value} does not fit in {chunks} chunks of {chunk_bits} bits")]
    ValueTooLarge {
        value: u128,
        chunks: usize,
        chunk_bits: u32,
    },

    /// A withdrawal or transfer requested more than the decrypted balance holds.
    #[error("balance {balance} is insufficient to withdraw or transfer {requested}")]
    InsufficientBalance { balance: u128, requested: u128 },

    /// A Sigma proof's byte length did not match the size implied by its chunk layout.
    #[error("sigma proof has {actual} bytes, expected {expected}")]
    BadProofLength { expected: usize, actual: usize },

    /// One or more reconstructed Sigma commitments did not match the received ones.
    #[error("sigma proof failed verification")]
    SigmaVerifyFailed,

    /// The range-proof oracle rejected a proof.
    #[error("range proof failed verification")]
    RangeProofFailed,

    /// The kangaroo solver exhausted every registered table without recovering a scalar.
    #[error("discrete-log recovery failed")]
    DecryptionFailed,

    /// An internal consistency check failed; this indicates a bug, not malformed input.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfidentialAssetError>;
