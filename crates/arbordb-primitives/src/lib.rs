//! Shared primitives for ArborDB: the `PrimaryKey` scalar and the ordered
//! [`IdSet`] used at the hierarchy-index boundary.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

///
/// PrimaryKey
///
/// Entity primary key. Hierarchy nodes and queried entities share this
/// representation; a key is only meaningful within its entity type.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, From, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
pub struct PrimaryKey(pub u32);

impl PrimaryKey {
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

///
/// IdSet
///
/// Ordered set of distinct primary keys, ascending. Backs the root-node
/// supplier and filter-result sets; supports membership, first-element
/// access, and intersection.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct IdSet(Vec<PrimaryKey>);

impl IdSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a set from arbitrary input, sorting and deduplicating.
    #[must_use]
    pub fn from_unsorted(mut keys: Vec<PrimaryKey>) -> Self {
        keys.sort_unstable();
        keys.dedup();
        Self(keys)
    }

    //
    // Cardinality
    //

    /// Number of keys in the set, truncated to `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn cardinality(&self) -> u32 {
        self.0.len() as u32
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    //
    // Access
    //

    #[must_use]
    pub fn contains(&self, key: PrimaryKey) -> bool {
        self.0.binary_search(&key).is_ok()
    }

    /// Smallest key in the set, if any.
    #[must_use]
    pub fn first(&self) -> Option<PrimaryKey> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = PrimaryKey> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[PrimaryKey] {
        &self.0
    }

    //
    // Algebra
    //

    /// Keys present in both sets. Linear merge walk over the two orderings.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let mut out = Vec::with_capacity(self.0.len().min(other.0.len()));
        let mut a = self.0.iter().peekable();
        let mut b = other.0.iter().peekable();

        while let (Some(&&x), Some(&&y)) = (a.peek(), b.peek()) {
            match x.cmp(&y) {
                std::cmp::Ordering::Less => {
                    a.next();
                }
                std::cmp::Ordering::Greater => {
                    b.next();
                }
                std::cmp::Ordering::Equal => {
                    out.push(x);
                    a.next();
                    b.next();
                }
            }
        }

        Self(out)
    }
}

impl FromIterator<PrimaryKey> for IdSet {
    fn from_iter<I: IntoIterator<Item = PrimaryKey>>(iter: I) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

impl FromIterator<u32> for IdSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self::from_unsorted(iter.into_iter().map(PrimaryKey).collect())
    }
}

impl IntoIterator for IdSet {
    type Item = PrimaryKey;
    type IntoIter = std::vec::IntoIter<PrimaryKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
