//! Identity registry of a document scope.
//!
//! The registry tracks every id allocated in one document and hands out fresh
//! ones. Generated ids are short random lowercase hex strings that start with
//! a letter (`a`..`f`), so they are valid identifiers in pathway files: five
//! digits while the scope is small, eight once it holds more than 65 536 ids.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::trace;
use rand::{Rng, SeedableRng, rngs::StdRng};

use pathweave_core::identifier::Id;

/// Number of ids above which generated ids grow to eight hex digits.
const LARGE_SCOPE: usize = 0x10000;

/// Set of allocated ids of one document scope.
///
/// Allocation cannot fail: ids are drawn until an unused one comes up.
///
/// # Examples
///
/// ```
/// # use pathweave::registry::IdentityRegistry;
/// # use pathweave_core::identifier::Id;
/// let mut registry = IdentityRegistry::with_seed(7);
///
/// let a = registry.reserve(Id::new("a"));
/// assert_eq!(a, "a");
///
/// // Taken ids fall back to a generated one
/// let other = registry.reserve(Id::new("a"));
/// assert_ne!(other, "a");
/// assert!(registry.is_allocated(other));
/// ```
#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    allocated: HashSet<Id>,
    rng: StdRng,
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityRegistry {
    /// Creates an empty registry seeded from the operating system.
    pub fn new() -> Self {
        Self {
            allocated: HashSet::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates an empty registry with a deterministic id sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            allocated: HashSet::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn generate(&mut self) -> Id {
        let (range, min) = if self.allocated.len() > LARGE_SCOPE {
            (0x6000_0000_u64, 0xa000_0000_u64)
        } else {
            (0x6_0000_u64, 0xa_0000_u64)
        };
        loop {
            let candidate = Id::new(&format!("{:x}", self.rng.random_range(0..range) + min));
            if !self.allocated.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Allocates a fresh, unused id.
    pub fn allocate(&mut self) -> Id {
        let id = self.generate();
        self.allocated.insert(id);
        id
    }

    /// Allocates `preferred` when it is free, otherwise a fresh id.
    ///
    /// The empty id is never allocated; it falls back to a fresh id.
    pub fn reserve(&mut self, preferred: Id) -> Id {
        if preferred.is_empty() || self.allocated.contains(&preferred) {
            let id = self.allocate();
            trace!(preferred = preferred.to_string(), allocated = id.to_string(); "Preferred id unavailable");
            return id;
        }
        self.allocated.insert(preferred);
        preferred
    }

    /// Maps every input id to a fresh id.
    ///
    /// The result is a bijection: new ids are distinct from each other and
    /// from every id allocated before the call. Repeated input ids map once.
    pub fn remap(&mut self, ids: impl IntoIterator<Item = Id>) -> IndexMap<Id, Id> {
        let mut mapping = IndexMap::new();
        for id in ids {
            if !mapping.contains_key(&id) {
                let fresh = self.allocate();
                mapping.insert(id, fresh);
            }
        }
        mapping
    }

    /// Returns an id to the pool. Returns `false` if it was not allocated.
    pub fn release(&mut self, id: Id) -> bool {
        self.allocated.remove(&id)
    }

    pub fn is_allocated(&self, id: Id) -> bool {
        self.allocated.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.allocated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocated.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_generated_shape(id: Id, digits: usize) -> bool {
        let text = id.to_string();
        text.len() == digits
            && text.starts_with(|c: char| ('a'..='f').contains(&c))
            && text.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    }

    #[test]
    fn test_allocate_shape() {
        let mut registry = IdentityRegistry::with_seed(1);
        for _ in 0..200 {
            let id = registry.allocate();
            assert!(is_generated_shape(id, 5), "{id}");
        }
        assert_eq!(registry.len(), 200);
    }

    #[test]
    fn test_seeded_sequence_is_deterministic() {
        let mut a = IdentityRegistry::with_seed(42);
        let mut b = IdentityRegistry::with_seed(42);
        let ids_a: Vec<_> = (0..10).map(|_| a.allocate()).collect();
        let ids_b: Vec<_> = (0..10).map(|_| b.allocate()).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_reserve_empty_allocates() {
        let mut registry = IdentityRegistry::with_seed(3);
        let id = registry.reserve(Id::new(""));
        assert!(!id.is_empty());
        assert!(!registry.is_allocated(Id::new("")));
    }

    #[test]
    fn test_remap_disjoint_from_scope() {
        let mut registry = IdentityRegistry::with_seed(5);
        let existing: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| registry.reserve(Id::new(name)))
            .collect();

        let mapping = registry.remap(existing.iter().copied().chain([Id::new("a")]));

        assert_eq!(mapping.len(), 3);
        for (old, new) in &mapping {
            assert!(existing.contains(old));
            assert!(!existing.contains(new));
            assert!(registry.is_allocated(*new));
        }
        let distinct: HashSet<_> = mapping.values().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_release() {
        let mut registry = IdentityRegistry::with_seed(9);
        let id = registry.reserve(Id::new("n1"));
        assert!(registry.release(id));
        assert!(!registry.release(id));
        assert_eq!(registry.reserve(Id::new("n1")), "n1");
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn names_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z][a-z0-9]{0,3}", 0..40)
    }

    /// Reserving any sequence of names never hands out the same id twice.
    fn check_reserve_unique(seed: u64, names: Vec<String>) -> Result<(), TestCaseError> {
        let mut registry = IdentityRegistry::with_seed(seed);
        let mut seen = HashSet::new();
        for name in &names {
            let id = registry.reserve(Id::new(name));
            prop_assert!(seen.insert(id), "id {} handed out twice", id);
        }
        prop_assert_eq!(registry.len(), names.len());
        Ok(())
    }

    proptest! {
        #[test]
        fn reserve_unique(seed in any::<u64>(), names in names_strategy()) {
            check_reserve_unique(seed, names)?;
        }
    }
}
