use crate::{InvariantViolation, KeyValueRef};

/// Shape of a tree, as measured by a full invariant check.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TreeStats {
    /// Number of keys stored.
    pub keys: usize,
    /// Nodes on the longest root-to-leaf path (0 for an empty tree).
    pub height: usize,
    /// Black nodes on every root-to-nil path. Every root-to-leaf path of the 2-3 tree
    /// has the same length, so there it equals `height`.
    pub black_height: usize,
}

/// The ordered `u32`-keyed map contract shared by every tree in this crate.
///
/// Not finding a key is never an error: [`lookup`](Self::lookup) and
/// [`delete`](Self::delete) return `None`. A broken invariant is a bug, reported by
/// [`check_invariants`](Self::check_invariants) and turned into a panic by
/// [`sanity_check`](Self::sanity_check).
///
/// # Examples
///
/// ```
/// use balanced_maps::{BasicRedBlackTree, KeyValueRef, LeftLeaningRedBlackTree, OrderedMap, TwoThreeExternalTree};
///
/// fn fill<T: OrderedMap<char> + Default>() -> T {
///     let mut tree = T::default();
///     for (key, payload) in [(3, 'c'), (1, 'a'), (2, 'b')] {
///         tree.insert(KeyValueRef::new(key, payload));
///         tree.sanity_check();
///     }
///     tree
/// }
///
/// let llrb: LeftLeaningRedBlackTree<char> = fill();
/// let basic: BasicRedBlackTree<char> = fill();
/// let two_three: TwoThreeExternalTree<char> = fill();
///
/// assert_eq!(llrb.lookup(2), Some('b'));
/// assert!(basic.traverse_in_order().eq([1, 2, 3]));
/// assert_eq!(two_three.key_count(), 3);
/// ```
pub trait OrderedMap<P: Copy> {
    /// Short name used in harness reports and plots.
    const NAME: &'static str;

    /// Returns the payload stored under `key`.
    fn lookup(&self, key: u32) -> Option<P>;

    /// Stores `entry`. An existing key keeps its place and gets the new payload; the
    /// previous payload is returned.
    fn insert(&mut self, entry: KeyValueRef<P>) -> Option<P>;

    /// Removes `key`, returning its payload. Absent keys leave the contents unchanged.
    fn delete(&mut self, key: u32) -> Option<P>;

    /// Number of keys, from the cached count.
    fn len(&self) -> usize;

    /// Number of keys, counted by walking every node.
    fn key_count(&self) -> usize;

    /// Lazily visits every entry in ascending key order.
    fn iter(&self) -> impl Iterator<Item = KeyValueRef<P>> + '_;

    /// Entry with the smallest key.
    fn first(&self) -> Option<KeyValueRef<P>>;

    /// Entry with the largest key.
    fn last(&self) -> Option<KeyValueRef<P>>;

    /// Releases every node and leaves the tree empty.
    fn free_all(&mut self);

    /// Walks the whole tree and verifies every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    fn check_invariants(&self) -> Result<TreeStats, InvariantViolation>;

    /// Returns `true` if the tree holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `key` is present.
    fn contains_key(&self, key: u32) -> bool {
        self.lookup(key).is_some()
    }

    /// Keys in ascending order.
    fn traverse_in_order(&self) -> impl Iterator<Item = u32> + '_ {
        self.iter().map(|entry| entry.key)
    }

    /// Asserts every structural invariant. O(n), meant for tests and fuzzing.
    ///
    /// # Panics
    ///
    /// Panics if [`check_invariants`](Self::check_invariants) reports a violation.
    fn sanity_check(&self) {
        if let Err(violation) = self.check_invariants() {
            panic!("{} invariant violated: {violation}", Self::NAME);
        }
    }
}

/// Implements [`OrderedMap`] for a tree by forwarding to its inherent methods.
macro_rules! forward_ordered_map {
    ($tree:ident, $name:literal) => {
        impl<P: Copy> $crate::OrderedMap<P> for $tree<P> {
            const NAME: &'static str = $name;

            fn lookup(&self, key: u32) -> Option<P> {
                $tree::lookup(self, key)
            }

            fn insert(&mut self, entry: $crate::KeyValueRef<P>) -> Option<P> {
                $tree::insert(self, entry)
            }

            fn delete(&mut self, key: u32) -> Option<P> {
                $tree::delete(self, key)
            }

            fn len(&self) -> usize {
                $tree::len(self)
            }

            fn key_count(&self) -> usize {
                $tree::key_count(self)
            }

            fn iter(&self) -> impl Iterator<Item = $crate::KeyValueRef<P>> + '_ {
                $tree::iter(self)
            }

            fn first(&self) -> Option<$crate::KeyValueRef<P>> {
                $tree::first(self)
            }

            fn last(&self) -> Option<$crate::KeyValueRef<P>> {
                $tree::last(self)
            }

            fn free_all(&mut self) {
                $tree::free_all(self);
            }

            fn check_invariants(&self) -> Result<$crate::TreeStats, $crate::InvariantViolation> {
                $tree::check_invariants(self)
            }
        }

        impl<P: Copy> Default for $tree<P> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<P: Copy> FromIterator<$crate::KeyValueRef<P>> for $tree<P> {
            fn from_iter<I: IntoIterator<Item = $crate::KeyValueRef<P>>>(iter: I) -> Self {
                let mut tree = Self::new();
                tree.extend(iter);
                tree
            }
        }

        impl<P: Copy> Extend<$crate::KeyValueRef<P>> for $tree<P> {
            fn extend<I: IntoIterator<Item = $crate::KeyValueRef<P>>>(&mut self, iter: I) {
                for entry in iter {
                    self.insert(entry);
                }
            }
        }

        impl<P: Copy + core::fmt::Debug> core::fmt::Debug for $tree<P> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_map().entries(self.iter().map(|entry| (entry.key, entry.payload))).finish()
            }
        }
    };
}

pub(crate) use forward_ordered_map;
