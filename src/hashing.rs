//! This module provides deterministic `HashMap` and `HashSet` variants and a 128-bit
//! one-shot hasher. The hashing data structures in the standard library are not
//! deterministic:
//!
//! > By default, HashMap uses a hashing algorithm selected to provide
//! > resistance against HashDoS attacks. The algorithm is randomly seeded, and a
//! > reasonable best-effort is made to generate this seed from a high quality,
//! > secure source of randomness provided by the host without blocking the program.
//!
//! Index maintenance must visit buckets in a reproducible order across runs with the
//! same seed, so the crate uses `rustc-hash` maps everywhere. Prefer
//! `HashMap::default()` over `new()`.
//!
//! The 128-bit one-shot hash is the basis of type-erased label equality: two labels
//! compare equal iff their 128-bit xxh3 digests are equal. We do not expect any
//! collisions before the heat death of the universe.

use std::hash::Hash;
use xxhash_rust::xxh3::{xxh3_64, Xxh3};

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

/// A convenience method to compute the 64-bit hash of a `&str`, used to derive
/// per-stream seed offsets from stream names.
#[must_use]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Computes the 128-bit xxh3 digest of any `T: Hash` in one shot.
pub fn one_shot_128<T: Hash>(value: &T) -> u128 {
    let mut hasher = Xxh3::new();
    value.hash(&mut hasher);
    hasher.digest128()
}
