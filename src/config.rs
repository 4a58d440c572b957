// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Chunk-layout configuration.
//!
//! The source protocol this core implements carries two incompatible generations
//! of chunking constants (`N=4, CHUNK_BITS=32` "veiled", and `N=8, CHUNK_BITS=16`
//! "confidential"); proofs produced under one layout do not verify under the
//! other. [`ChunkLayout`] reifies the choice as a value rather than a compile-time
//! constant, so a deployment can select (and a verifier can reject mismatched)
//! layouts explicitly. See `DESIGN.md` for why `CONFIDENTIAL_BALANCE` is this
//! crate's default.

/// Describes how a balance or transfer amount is split into range-provable chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkLayout {
    /// Number of chunks.
    pub chunks: usize,
    /// Bit width of each chunk; every chunk lies in `[0, 2^chunk_bits)`.
    pub chunk_bits: u32,
}

impl ChunkLayout {
    /// The balance layout: 8 chunks of 16 bits, covering amounts up to 128 bits.
    pub const CONFIDENTIAL_BALANCE: ChunkLayout = ChunkLayout {
        chunks: 8,
        chunk_bits: 16,
    };

    /// The transfer-amount layout: 4 chunks of 16 bits, covering amounts up to 64 bits.
    pub const CONFIDENTIAL_TRANSFER: ChunkLayout = ChunkLayout {
        chunks: 4,
        chunk_bits: 16,
    };

    /// The predecessor "veiled" balance layout: 4 chunks of 32 bits. Kept for
    /// compatibility with proofs produced by that generation; not proof-compatible
    /// with the `CONFIDENTIAL_*` layouts above.
    pub const VEILED_BALANCE: ChunkLayout = ChunkLayout {
        chunks: 4,
        chunk_bits: 32,
    };

    /// The maximum amount (exclusive) representable under this layout.
    pub fn capacity(&self) -> u128 {
        if self.total_bits() >= 128 {
            u128::MAX
        } else {
            1u128 << self.total_bits()
        }
    }

    fn total_bits(&self) -> u32 {
        self.chunks as u32 * self.chunk_bits
    }
}

/// Domain-separation tags for the four Sigma-proof Fiat-Shamir transcripts.
///
/// An older code path in the source protocol uses `AptosVeiledCoin/...` tags; the
/// two taxonomies produce different, mutually incompatible challenges. This crate
/// fixes the more recent `AptosConfidentialAsset/...` taxonomy (see `DESIGN.md`).
pub mod dst {
    pub const WITHDRAW: &[u8] = b"AptosConfidentialAsset/WithdrawalProofFiatShamir";
    pub const TRANSFER: &[u8] = b"AptosConfidentialAsset/TransferProofFiatShamir";
    pub const KEY_ROTATION: &[u8] = b"AptosConfidentialAsset/RotationProofFiatShamir";
    pub const NORMALIZATION: &[u8] = b"AptosConfidentialAsset/NormalizationProofFiatShamir";
}

/// Size in bytes of a single serialized scalar or group element.
pub const PROOF_CHUNK_SIZE: usize = 32;

/// Per-chunk unit counts for each Sigma proof, as a function of the chunk
/// count `n` they operate over. Withdraw, key rotation, and normalization
/// match the byte-exact sizes quoted elsewhere for `n = 4` chunks exactly;
/// transfer's own unit count grows faster in `n` (it binds a shared-randomness
/// grouped ciphertext per chunk in addition to the sender-balance rebinding
/// withdraw/normalization already need) -- see `DESIGN.md`.
pub fn sigma_proof_withdraw_units(n: usize) -> usize {
    5 + 4 * n
}

pub fn sigma_proof_normalization_units(n: usize) -> usize {
    5 + 4 * n
}

pub fn sigma_proof_key_rotation_units(n: usize) -> usize {
    7 + 4 * n
}

pub fn sigma_proof_transfer_units(n: usize, auditor_count: usize) -> usize {
    5 + 9 * n + n * auditor_count
}
