// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Pollard's kangaroo discrete-log solver.
//!
//! Twisted-ElGamal decryption (see [`crate::cipher`]) yields a group element
//! `M = m·G`; recovering the scalar `m` requires solving a discrete log in a
//! bounded interval `[0, 2^k)`. This module implements the classic two-herd
//! (tame/wild) kangaroo method against precomputed "tame" tables, registered per
//! bit-width `k` in a process-wide registry consulted in increasing `k` order.

use crate::{group::GroupElement, scalar::scalar_from_u128};
use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::Identity};
use once_cell::sync::Lazy;
use rand::{rngs::OsRng, RngCore};
use std::{
    collections::HashMap,
    sync::{Once, RwLock},
};

/// Maximum number of low zero bits used as the "distinguishing point" property.
/// Kept small enough that a single byte of the compressed point encoding suffices.
const MAX_DISTINGUISHING_WINDOW: u32 = 8;

/// A precomputed kangaroo table for a fixed bit-width `k`.
pub struct KangarooTable {
    /// Bit width of the interval `[0, 2^k)` this table solves over.
    k: u32,
    /// Number of distinct jump sizes.
    r: usize,
    /// Distinguishing-point window: a point is distinguished when the low `w`
    /// bits of its first encoded byte are zero.
    w: u32,
    /// `jump_scalars[i] = slog[i]`, the scalar increment of jump `i`.
    jump_scalars: Vec<Scalar>,
    /// `jump_points[i] = slog[i]·G`, precomputed to avoid a scalar mult per step.
    jump_points: Vec<RistrettoPoint>,
    /// Distinguished point (compressed bytes) -> accumulated tame-kangaroo distance.
    table: HashMap<[u8; 32], Scalar>,
}

impl KangarooTable {
    /// Runs the tame kangaroo for `n` jumps starting from the midpoint of
    /// `[0, 2^k)`, recording every distinguished point it lands on.
    ///
    /// `n` should scale with `sqrt(2^k)`; the default used by [`precompute`]
    /// targets a constant-factor multiple of the expected birthday bound.
    pub fn build(k: u32, r: usize, w: u32, n: u64) -> Self {
        assert!(w <= MAX_DISTINGUISHING_WINDOW, "window must fit in one byte");
        let (jump_scalars, jump_points) = standard_jumps(r);

        let mean = 1u128 << (k.saturating_sub(1));
        let mut pos = scalar_from_u128(mean);
        let mut point = pos * *crate::group::G;
        let mut table = HashMap::new();

        for _ in 0..n {
            if is_distinguished(&point, w) {
                table.insert(point.compress().to_bytes(), pos);
            }
            let h = jump_index(&point, r);
            pos += jump_scalars[h];
            point += jump_points[h];
        }

        KangarooTable {
            k,
            r,
            w,
            jump_scalars,
            jump_points,
            table,
        }
    }

    /// Attempts to recover `v` such that `v·G == target`, `v ∈ [0, 2^k)`.
    ///
    /// Returns `None` (not a panic) when this table's herd fails to collide with
    /// the wild kangaroo's path within its retry budget; the caller
    /// ([`solve`]) then escalates to the next registered table.
    pub fn solve(&self, target: &RistrettoPoint) -> Option<u64> {
        if bool::from(target.ct_eq_identity()) {
            return Some(0);
        }

        let offset_bound: u128 = 1u128 << self.k.saturating_sub(8).min(120);
        let max_steps = 8usize * (1usize << self.w);

        for _ in 0..100 {
            let wdist0 = sample_u128_below(offset_bound);
            let mut wdist = scalar_from_u128(wdist0);
            let mut point = *target + wdist * *crate::group::G;

            for _ in 0..max_steps {
                if is_distinguished(&point, self.w) {
                    if let Some(&tame_dist) = self.table.get(&point.compress().to_bytes()) {
                        let candidate = tame_dist - wdist;
                        if let Some(v) = scalar_to_u64_below_2k(&candidate, self.k) {
                            let check = Scalar::from(v) * *crate::group::G;
                            if check.compress() == target.compress() {
                                return Some(v);
                            }
                        }
                    }
                }
                let h = jump_index(&point, self.r);
                wdist += self.jump_scalars[h];
                point += self.jump_points[h];
            }
        }
        None
    }
}

trait IdentityCt {
    fn ct_eq_identity(&self) -> subtle::Choice;
}
impl IdentityCt for RistrettoPoint {
    fn ct_eq_identity(&self) -> subtle::Choice {
        use subtle::ConstantTimeEq;
        self.compress().ct_eq(&RistrettoPoint::identity().compress())
    }
}

/// Builds the "standard" geometric jump set `slog[i] = 2^i`, whose points are
/// `s[i] = slog[i]·G`.
fn standard_jumps(r: usize) -> (Vec<Scalar>, Vec<RistrettoPoint>) {
    let scalars: Vec<Scalar> = (0..r).map(|i| scalar_from_u128(1u128 << i)).collect();
    let points: Vec<RistrettoPoint> = scalars.iter().map(|s| s * *crate::group::G).collect();
    (scalars, points)
}

fn jump_index(point: &RistrettoPoint, r: usize) -> usize {
    let bytes = point.compress().to_bytes();
    let mut eight = [0u8; 8];
    eight.copy_from_slice(&bytes[..8]);
    (u64::from_le_bytes(eight) as usize) % r
}

fn is_distinguished(point: &RistrettoPoint, w: u32) -> bool {
    if w == 0 {
        return true;
    }
    let bytes = point.compress().to_bytes();
    let mask = ((1u16 << w) - 1) as u8;
    bytes[0] & mask == 0
}

fn sample_u128_below(bound: u128) -> u128 {
    if bound <= 1 {
        return 0;
    }
    let mut rng = OsRng;
    loop {
        let mut bytes = [0u8; 16];
        rng.fill_bytes(&mut bytes);
        let x = u128::from_le_bytes(bytes);
        // rejection sampling for an unbiased value below `bound`
        let limit = u128::MAX - (u128::MAX % bound);
        if x < limit {
            return x % bound;
        }
    }
}

fn scalar_to_u64_below_2k(s: &Scalar, k: u32) -> Option<u64> {
    let bytes = s.to_bytes();
    if bytes[8..].iter().any(|&b| b != 0) {
        return None;
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&bytes[..8]);
    let v = u64::from_le_bytes(low);
    if k < 64 && v >= (1u64 << k) {
        return None;
    }
    Some(v)
}

/// Default tame-herd sizes for the three variants this crate expects to register.
fn default_params(k: u32) -> (usize, u32, u64) {
    match k {
        0..=16 => (8, 4, 16 * (1u64 << (k / 2).max(1))),
        17..=32 => (16, 10, 4 * (1u64 << (k / 2).max(1))),
        _ => (24, 12, 4 * (1u64 << (k / 2).max(1))),
    }
}

/// Builds and returns a table for bit-width `k` using this crate's default
/// jump-count / distinguishing-window / tame-herd-size parameters.
///
/// For `k` beyond ~24 this is impractically slow to build synchronously (the
/// precomputed herd should instead be generated once offline and shipped as
/// static data); callers needing the 32- or 48-bit variants in production
/// should build those tables out of band and register them directly via
/// [`register_table`].
pub fn precompute(k: u32) -> KangarooTable {
    let (r, w, n) = default_params(k);
    KangarooTable::build(k, r, w, n)
}

static REGISTRY: Lazy<RwLock<HashMap<u32, KangarooTable>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a table for bit-width `table.k`, replacing any prior table for
/// that width. Registration must happen before the first [`solve`] call; it is
/// not safe to race with decryption (see the crate's concurrency notes).
pub fn register_table(table: KangarooTable) {
    tracing::info!(bit_width = table.k, table_size = table.table.len(), "registering kangaroo table");
    REGISTRY.write().unwrap().insert(table.k, table);
}

/// Attempts to recover `v` such that `v·G == point.inner()`, trying every
/// registered table in increasing bit-width order. Returns `None` if no table
/// resolves it (the caller treats this as a decryption failure, not as `v = 0`).
pub fn solve(point: &GroupElement) -> Option<u64> {
    let registry = REGISTRY.read().unwrap();
    let mut widths: Vec<u32> = registry.keys().copied().collect();
    widths.sort_unstable();
    for k in widths {
        if let Some(table) = registry.get(&k) {
            if let Some(v) = table.solve(point.inner()) {
                return Some(v);
            }
        }
    }
    None
}

/// Test-only helpers for ensuring a table is registered before exercising
/// decryption in unit tests elsewhere in the crate.
pub mod test_support {
    use super::*;

    static INIT: Once = Once::new();

    /// Registers a 16-bit table exactly once per test process.
    pub fn ensure_small_table_registered() {
        INIT.call_once(|| {
            register_table(precompute(16));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::G;

    #[test]
    fn solves_zero() {
        test_support::ensure_small_table_registered();
        let point = GroupElement::identity();
        assert_eq!(solve(&point), Some(0));
    }

    #[test]
    fn solves_small_values() {
        test_support::ensure_small_table_registered();
        for v in [1u64, 7, 255, 1000, 65535] {
            let point = GroupElement(Scalar::from(v) * *G);
            assert_eq!(solve(&point), Some(v), "failed to recover {}", v);
        }
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(20))]
        #[test]
        fn solves_arbitrary_16_bit_values(v in 0u64..(1u64 << 16)) {
            test_support::ensure_small_table_registered();
            let point = GroupElement(Scalar::from(v) * *G);
            proptest::prop_assert_eq!(solve(&point), Some(v));
        }
    }

    #[test]
    fn unregistered_width_fails_gracefully() {
        // A point with no small-width table registered for it (all our tests share
        // one process-wide registry, so scope this to a value only the 16-bit table
        // could ever resolve and check a clearly out-of-range target instead).
        let point = GroupElement(Scalar::from(u64::MAX) * *G);
        // No guarantee of failure in general (birthday collisions exist), but a table
        // built for k=16 cannot recover a mid-range 64-bit-ish scalar like this one.
        assert_eq!(solve(&point), None::<u64>);
    }
}
