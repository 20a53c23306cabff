//! Integer mixing functions.
//!
//! The spatial grid picks a bucket with [`cell_hash`]; collision pairs are
//! keyed with [`symmetric_pair_hash`] so that `(a, b)` and `(b, a)` land on
//! the same entry.

/// Thomas Wang's 64-bit integer mix.
#[inline]
#[must_use]
pub const fn wang_64(mut key: u64) -> u64 {
    key = (!key).wrapping_add(key << 21);
    key ^= key >> 24;
    key = key.wrapping_add(key << 3).wrapping_add(key << 8);
    key ^= key >> 14;
    key = key.wrapping_add(key << 2).wrapping_add(key << 4);
    key ^= key >> 28;
    key = key.wrapping_add(key << 31);
    key
}

/// Combines a cell coordinate pair into a single well-mixed hash.
///
/// `(x, y)` and `(y, x)` hash differently.
#[inline]
#[must_use]
pub const fn cell_hash(x: i32, y: i32) -> u64 {
    wang_64(((x as u32 as u64) << 32) | (y as u32 as u64))
}

/// Order-independent hash of two identities: `f(a, b) == f(b, a)`.
#[inline]
#[must_use]
pub const fn symmetric_pair_hash(a: u64, b: u64) -> u64 {
    wang_64(a) ^ wang_64(b)
}
