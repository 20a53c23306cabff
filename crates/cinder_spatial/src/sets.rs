//! # Query Result Sets
//!
//! Multi-cell membership means one body can be found in several buckets
//! during a single query. These sets absorb the duplicates.

use std::collections::hash_set::{self, HashSet};
use std::hash::{Hash, Hasher};

use cinder_shared::symmetric_pair_hash;

use crate::body::BodyId;

/// Set of bodies found by a region query.
#[derive(Debug, Clone, Default)]
pub struct BodySet {
    bodies: HashSet<BodyId>,
}

impl BodySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a body; returns false if it was already present.
    pub fn insert(&mut self, body: BodyId) -> bool {
        self.bodies.insert(body)
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, body: BodyId) -> bool {
        self.bodies.contains(&body)
    }

    /// Number of bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// True when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Removes everything, keeping the allocation.
    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    /// Iterates in unspecified order.
    pub fn iter(&self) -> hash_set::Iter<'_, BodyId> {
        self.bodies.iter()
    }
}

impl<'a> IntoIterator for &'a BodySet {
    type Item = &'a BodyId;
    type IntoIter = hash_set::Iter<'a, BodyId>;

    fn into_iter(self) -> Self::IntoIter {
        self.bodies.iter()
    }
}

/// Unordered pair of distinct bodies.
///
/// `BodyPair::new(a, b) == BodyPair::new(b, a)`, and both hash alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyPair {
    first: BodyId,
    second: BodyId,
}

impl BodyPair {
    /// Builds the pair, normalizing its order.
    #[must_use]
    pub fn new(a: BodyId, b: BodyId) -> Self {
        if a.to_bits() <= b.to_bits() {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// Lower-ordered member.
    #[inline]
    #[must_use]
    pub const fn first(&self) -> BodyId {
        self.first
    }

    /// Higher-ordered member.
    #[inline]
    #[must_use]
    pub const fn second(&self) -> BodyId {
        self.second
    }

    /// Whether `body` is one of the two.
    #[must_use]
    pub fn involves(&self, body: BodyId) -> bool {
        self.first == body || self.second == body
    }

    /// The member that is not `body`, if `body` is a member.
    #[must_use]
    pub fn other(&self, body: BodyId) -> Option<BodyId> {
        if self.first == body {
            Some(self.second)
        } else if self.second == body {
            Some(self.first)
        } else {
            None
        }
    }
}

impl Hash for BodyPair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(symmetric_pair_hash(
            self.first.to_bits(),
            self.second.to_bits(),
        ));
    }
}

/// Set of colliding pairs, each reported once regardless of order.
#[derive(Debug, Clone, Default)]
pub struct BodyPairSet {
    pairs: HashSet<BodyPair>,
}

impl BodyPairSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the pair `{a, b}`.
    ///
    /// Returns false if it was already present or if `a == b`; a body never
    /// pairs with itself.
    pub fn insert(&mut self, a: BodyId, b: BodyId) -> bool {
        if a == b {
            return false;
        }
        self.pairs.insert(BodyPair::new(a, b))
    }

    /// Membership test, in either order.
    #[must_use]
    pub fn contains(&self, a: BodyId, b: BodyId) -> bool {
        self.pairs.contains(&BodyPair::new(a, b))
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Removes everything, keeping the allocation.
    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Iterates in unspecified order.
    pub fn iter(&self) -> hash_set::Iter<'_, BodyPair> {
        self.pairs.iter()
    }
}

impl<'a> IntoIterator for &'a BodyPairSet {
    type Item = &'a BodyPair;
    type IntoIter = hash_set::Iter<'a, BodyPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}
