//! Capability interfaces implemented by the containers.
//!
//! Each container declares the capability groups it supports, so generic
//! code can accept "anything with membership and iteration" instead of a
//! concrete container type. Every operation is fallible because it may hit
//! storage.

use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;

use crate::error::Result;

/// Operations shared by every container.
pub trait Container {
    /// Number of elements.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every element.
    fn clear(&self) -> Result<()>;
}

/// Membership testing.
pub trait Membership<T> {
    fn contains(&self, item: &T) -> Result<bool>;
}

/// Zero-based positional access; negative indices count from the end.
pub trait Indexable<T> {
    fn get(&self, index: isize) -> Result<T>;

    fn set(&self, index: isize, value: &T) -> Result<()>;
}

/// Key/value mapping.
pub trait Mapping<K, V> {
    fn get(&self, key: &K) -> Result<V>;

    fn set(&self, key: &K, value: &V) -> Result<()>;

    fn delete(&self, key: &K) -> Result<()>;

    fn contains_key(&self, key: &K) -> Result<bool>;
}

/// A finite collection supporting membership tests and iteration.
///
/// The operand type accepted by set comparisons; it need not be a
/// persistent container.
pub trait SetLike<T>: Membership<T> {
    /// Number of distinct members.
    fn cardinality(&self) -> Result<usize>;

    /// Iterate over the members.
    fn members(&self) -> Box<dyn Iterator<Item = Result<T>> + '_>;
}

impl<T: Eq + Hash> Membership<T> for HashSet<T> {
    fn contains(&self, item: &T) -> Result<bool> {
        Ok(HashSet::contains(self, item))
    }
}

impl<T: Eq + Hash + Clone> SetLike<T> for HashSet<T> {
    fn cardinality(&self) -> Result<usize> {
        Ok(HashSet::len(self))
    }

    fn members(&self) -> Box<dyn Iterator<Item = Result<T>> + '_> {
        Box::new(self.iter().cloned().map(Ok))
    }
}

impl<T: Ord> Membership<T> for BTreeSet<T> {
    fn contains(&self, item: &T) -> Result<bool> {
        Ok(BTreeSet::contains(self, item))
    }
}

impl<T: Ord + Clone> SetLike<T> for BTreeSet<T> {
    fn cardinality(&self) -> Result<usize> {
        Ok(BTreeSet::len(self))
    }

    fn members(&self) -> Box<dyn Iterator<Item = Result<T>> + '_> {
        Box::new(self.iter().cloned().map(Ok))
    }
}
