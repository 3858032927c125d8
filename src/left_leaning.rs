//! Sedgewick's left-leaning red-black tree.
//!
//! Insertion and deletion are recursive. Every stack frame restores the left-leaning
//! shape on the way back up, so no parent or grandparent links are needed.

use core::cmp::Ordering;
use core::mem;

use crate::ordered_map::forward_ordered_map;
use crate::raw::{self, Arena, BinaryNode, Color, Handle, InOrder, Lean};
use crate::{InvariantViolation, KeyValueRef, TreeStats};

#[derive(Clone)]
struct Node<P> {
    entry: KeyValueRef<P>,
    color: Color,
    left: Option<Handle>,
    right: Option<Handle>,
}

impl<P> BinaryNode for Node<P> {
    type Payload = P;

    fn entry(&self) -> &KeyValueRef<P> {
        &self.entry
    }

    fn color(&self) -> Color {
        self.color
    }

    fn left(&self) -> Option<Handle> {
        self.left
    }

    fn right(&self) -> Option<Handle> {
        self.right
    }
}

/// A left-leaning red-black tree mapping `u32` keys to payload handles.
///
/// Red links only ever lean left, which makes every red-black 3-node look the same
/// and keeps the balancing code down to two rotations and a color flip.
///
/// Cloning produces an independent deep copy.
///
/// # Examples
///
/// ```
/// use balanced_maps::{KeyValueRef, LeftLeaningRedBlackTree};
///
/// let mut tree = LeftLeaningRedBlackTree::new();
/// for key in 1..=100 {
///     tree.insert(KeyValueRef::new(key, key * 10));
/// }
/// assert_eq!(tree.lookup(42), Some(420));
/// assert_eq!(tree.delete(42), Some(420));
/// assert_eq!(tree.lookup(42), None);
/// assert_eq!(tree.len(), 99);
/// tree.sanity_check();
/// ```
#[derive(Clone)]
pub struct LeftLeaningRedBlackTree<P> {
    nodes: Arena<Node<P>>,
    root: Option<Handle>,
    len: usize,
}

forward_ordered_map!(LeftLeaningRedBlackTree, "llrb");

impl<P: Copy> LeftLeaningRedBlackTree<P> {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
        }
    }

    /// Returns the payload stored under `key`.
    #[must_use]
    pub fn lookup(&self, key: u32) -> Option<P> {
        let mut link = self.root;
        while let Some(handle) = link {
            let node = self.nodes.get(handle);
            link = match key.cmp(&node.entry.key) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(node.entry.payload),
            };
        }
        None
    }

    /// Inserts `entry`, returning the payload it replaced if the key was present.
    pub fn insert(&mut self, entry: KeyValueRef<P>) -> Option<P> {
        let (root, previous) = self.insert_at(self.root, entry);
        self.nodes.get_mut(root).color = Color::Black;
        self.root = Some(root);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Removes `key`, returning its payload.
    pub fn delete(&mut self, key: u32) -> Option<P> {
        let root = self.root?;
        // The descent below reshapes the tree on the assumption that the key is there.
        self.lookup(key)?;

        if !self.is_red(self.left(root)) && !self.is_red(self.right(root)) {
            self.nodes.get_mut(root).color = Color::Red;
        }
        let (root, removed) = self.delete_at(root, key);
        self.root = root;
        if let Some(root) = root {
            self.nodes.get_mut(root).color = Color::Black;
        }
        self.len -= 1;
        Some(removed.payload)
    }

    /// Number of keys in the tree.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree holds no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Counts the keys by visiting every node.
    #[must_use]
    pub fn key_count(&self) -> usize {
        raw::count(&self.nodes, self.root)
    }

    /// Nodes on the longest root-to-leaf path.
    #[must_use]
    pub fn height(&self) -> usize {
        raw::height(&self.nodes, self.root)
    }

    /// Iterates over the entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = KeyValueRef<P>> + '_ {
        InOrder::new(&self.nodes, self.root)
    }

    /// Entry with the smallest key.
    #[must_use]
    pub fn first(&self) -> Option<KeyValueRef<P>> {
        raw::leftmost(&self.nodes, self.root)
    }

    /// Entry with the largest key.
    #[must_use]
    pub fn last(&self) -> Option<KeyValueRef<P>> {
        raw::rightmost(&self.nodes, self.root)
    }

    /// Drops every node.
    pub fn free_all(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    /// Verifies ordering, coloring, left-leaning and black balance.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn check_invariants(&self) -> Result<TreeStats, InvariantViolation> {
        raw::check_red_black(&self.nodes, self.root, self.len, Lean::Left)
    }

    /// Panics if any invariant is violated.
    ///
    /// # Panics
    ///
    /// Panics with the violated invariant.
    pub fn sanity_check(&self) {
        crate::OrderedMap::sanity_check(self);
    }

    fn insert_at(&mut self, link: Option<Handle>, entry: KeyValueRef<P>) -> (Handle, Option<P>) {
        let Some(handle) = link else {
            let leaf = self.nodes.alloc(Node {
                entry,
                color: Color::Red,
                left: None,
                right: None,
            });
            return (leaf, None);
        };

        let previous = match entry.key.cmp(&self.key(handle)) {
            Ordering::Less => {
                let (left, previous) = self.insert_at(self.left(handle), entry);
                self.nodes.get_mut(handle).left = Some(left);
                previous
            }
            Ordering::Greater => {
                let (right, previous) = self.insert_at(self.right(handle), entry);
                self.nodes.get_mut(handle).right = Some(right);
                previous
            }
            Ordering::Equal => {
                let node = self.nodes.get_mut(handle);
                return (handle, Some(mem::replace(&mut node.entry.payload, entry.payload)));
            }
        };

        let mut handle = handle;
        if self.is_red(self.right(handle)) && !self.is_red(self.left(handle)) {
            handle = self.rotate_left(handle);
        }
        if self.left_pair_is_red(handle) {
            handle = self.rotate_right(handle);
        }
        if self.is_red(self.left(handle)) && self.is_red(self.right(handle)) {
            self.flip_colors(handle);
        }
        (handle, previous)
    }

    /// Removes `key`, which must be present under `handle`.
    fn delete_at(&mut self, handle: Handle, key: u32) -> (Option<Handle>, KeyValueRef<P>) {
        let mut handle = handle;
        let removed;

        if key < self.key(handle) {
            if self.needs_red_left(handle) {
                handle = self.move_red_left(handle);
            }
            let left = self.left(handle).expect("`delete_at()` - key missing from left subtree");
            let (left, entry) = self.delete_at(left, key);
            self.nodes.get_mut(handle).left = left;
            removed = entry;
        } else {
            if self.is_red(self.left(handle)) {
                handle = self.rotate_right(handle);
            }
            if key == self.key(handle) && self.right(handle).is_none() {
                return (None, self.nodes.take(handle).entry);
            }
            let right_left = self.right(handle).and_then(|right| self.left(right));
            if !self.is_red(self.right(handle)) && !self.is_red(right_left) {
                handle = self.move_red_right(handle);
            }
            let right = self.right(handle).expect("`delete_at()` - key missing from right subtree");
            if key == self.key(handle) {
                let (right, successor) = self.delete_min(right);
                let node = self.nodes.get_mut(handle);
                node.right = right;
                removed = mem::replace(&mut node.entry, successor);
            } else {
                let (right, entry) = self.delete_at(right, key);
                self.nodes.get_mut(handle).right = right;
                removed = entry;
            }
        }

        (Some(self.fix_up(handle)), removed)
    }

    fn delete_min(&mut self, handle: Handle) -> (Option<Handle>, KeyValueRef<P>) {
        if self.left(handle).is_none() {
            return (None, self.nodes.take(handle).entry);
        }

        let mut handle = handle;
        if self.needs_red_left(handle) {
            handle = self.move_red_left(handle);
        }
        let left = self.left(handle).expect("`delete_min()` - left link vanished");
        let (left, min) = self.delete_min(left);
        self.nodes.get_mut(handle).left = left;
        (Some(self.fix_up(handle)), min)
    }

    /// Makes the left child or one of its children red.
    fn move_red_left(&mut self, handle: Handle) -> Handle {
        self.flip_colors(handle);
        let Some(right) = self.right(handle) else {
            return handle;
        };
        if !self.is_red(self.left(right)) {
            return handle;
        }
        let right = self.rotate_right(right);
        self.nodes.get_mut(handle).right = Some(right);
        let handle = self.rotate_left(handle);
        self.flip_colors(handle);
        handle
    }

    /// Makes the right child or one of its children red.
    fn move_red_right(&mut self, handle: Handle) -> Handle {
        self.flip_colors(handle);
        if !self.left_pair_is_red(handle) {
            return handle;
        }
        let handle = self.rotate_right(handle);
        self.flip_colors(handle);
        handle
    }

    fn fix_up(&mut self, handle: Handle) -> Handle {
        let mut handle = handle;
        if self.is_red(self.right(handle)) {
            handle = self.rotate_left(handle);
        }
        if self.left_pair_is_red(handle) {
            handle = self.rotate_right(handle);
        }
        if self.is_red(self.left(handle)) && self.is_red(self.right(handle)) {
            self.flip_colors(handle);
        }
        handle
    }

    //      h                x
    //     / \              / \
    //    a  (x)   =>     (h)  c
    //       / \          / \
    //      b   c        a   b
    fn rotate_left(&mut self, handle: Handle) -> Handle {
        let x = self.right(handle).expect("`rotate_left()` - no right child");
        let color = self.nodes.get(handle).color;
        let inner = self.left(x);

        let node = self.nodes.get_mut(handle);
        node.right = inner;
        node.color = Color::Red;

        let top = self.nodes.get_mut(x);
        top.left = Some(handle);
        top.color = color;
        x
    }

    //        h            x
    //       / \          / \
    //     (x)  c   =>   a  (h)
    //     / \              / \
    //    a   b            b   c
    fn rotate_right(&mut self, handle: Handle) -> Handle {
        let x = self.left(handle).expect("`rotate_right()` - no left child");
        let color = self.nodes.get(handle).color;
        let inner = self.right(x);

        let node = self.nodes.get_mut(handle);
        node.left = inner;
        node.color = Color::Red;

        let top = self.nodes.get_mut(x);
        top.right = Some(handle);
        top.color = color;
        x
    }

    fn flip_colors(&mut self, handle: Handle) {
        let node = self.nodes.get_mut(handle);
        node.color = node.color.flipped();
        let children = [node.left, node.right];
        for child in children.into_iter().flatten() {
            let child = self.nodes.get_mut(child);
            child.color = child.color.flipped();
        }
    }

    fn is_red(&self, link: Option<Handle>) -> bool {
        link.is_some_and(|handle| self.nodes.get(handle).color.is_red())
    }

    /// Left child and left grandchild are both red.
    fn left_pair_is_red(&self, handle: Handle) -> bool {
        self.left(handle)
            .is_some_and(|left| self.is_red(Some(left)) && self.is_red(self.left(left)))
    }

    /// Neither the left child nor its left child is red, so descending left would
    /// reach a 2-node.
    fn needs_red_left(&self, handle: Handle) -> bool {
        let left = self.left(handle);
        !self.is_red(left) && !self.is_red(left.and_then(|left| self.left(left)))
    }

    fn left(&self, handle: Handle) -> Option<Handle> {
        self.nodes.get(handle).left
    }

    fn right(&self, handle: Handle) -> Option<Handle> {
        self.nodes.get(handle).right
    }

    fn key(&self, handle: Handle) -> u32 {
        self.nodes.get(handle).entry.key
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    fn tree_of(keys: impl IntoIterator<Item = u32>) -> LeftLeaningRedBlackTree<u32> {
        let mut tree = LeftLeaningRedBlackTree::new();
        for key in keys {
            tree.insert(KeyValueRef::new(key, key));
            tree.sanity_check();
        }
        tree
    }

    #[test]
    fn empty_tree() {
        let mut tree: LeftLeaningRedBlackTree<u32> = LeftLeaningRedBlackTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.lookup(1), None);
        assert_eq!(tree.delete(1), None);
        assert_eq!(tree.first(), None);
        assert_eq!(tree.check_invariants(), Ok(TreeStats::default()));
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let tree = tree_of(1..=1023);
        let stats = tree.check_invariants().unwrap();
        assert_eq!(stats.keys, 1023);
        // A red-black tree never exceeds 2 * log2(n + 1).
        assert!(stats.height <= 20, "height {}", stats.height);
    }

    #[test]
    fn descending_inserts_stay_balanced() {
        let tree = tree_of((1..=500).rev());
        assert!(tree.traverse_in_order_is_sorted());
        assert_eq!(tree.key_count(), 500);
    }

    #[test]
    fn overwrite_keeps_one_entry() {
        let mut tree = tree_of([5, 3, 8]);
        assert_eq!(tree.insert(KeyValueRef::new(3, 30)), Some(3));
        assert_eq!(tree.lookup(3), Some(30));
        assert_eq!(tree.key_count(), 3);
        assert_eq!(tree.len(), 3);
        tree.sanity_check();
    }

    #[test]
    fn deleting_an_absent_key_changes_nothing() {
        let mut tree = tree_of([10, 20, 30, 40]);
        let before: Vec<_> = tree.iter().collect();
        assert_eq!(tree.delete(25), None);
        assert_eq!(tree.iter().collect::<Vec<_>>(), before);
        tree.sanity_check();
    }

    #[test]
    fn delete_everything_then_reuse() {
        let mut tree = tree_of(1..=64);
        for key in (1..=64).step_by(2).chain((2..=64).step_by(2)) {
            assert_eq!(tree.delete(key), Some(key));
            tree.sanity_check();
        }
        assert!(tree.is_empty());
        tree.insert(KeyValueRef::new(7, 70));
        assert_eq!(tree.lookup(7), Some(70));
        tree.sanity_check();
    }

    #[test]
    fn clone_is_deep() {
        let original = tree_of(1..=32);
        let mut copy = original.clone();
        copy.delete(16);
        copy.insert(KeyValueRef::new(1, 100));
        assert_eq!(original.lookup(16), Some(16));
        assert_eq!(original.lookup(1), Some(1));
        assert_eq!(copy.lookup(16), None);
        original.sanity_check();
        copy.sanity_check();
    }

    #[test]
    fn free_all_resets() {
        let mut tree = tree_of(1..=10);
        tree.free_all();
        assert!(tree.is_empty());
        assert_eq!(tree.key_count(), 0);
        tree.sanity_check();
    }

    #[test]
    fn red_root_is_reported() {
        let mut tree = tree_of([1, 2, 3]);
        let root = tree.root.unwrap();
        tree.nodes.get_mut(root).color = Color::Red;
        assert_eq!(tree.check_invariants(), Err(InvariantViolation::RedRoot { key: 2 }));
    }

    #[test]
    fn red_right_link_is_reported() {
        let mut tree = tree_of([1, 2, 3]);
        let root = tree.root.unwrap();
        assert_eq!(tree.key(root), 2);
        let right = tree.right(root).unwrap();
        tree.nodes.get_mut(right).color = Color::Red;
        assert_eq!(tree.check_invariants(), Err(InvariantViolation::RightLeaningRed { key: 2 }));
    }

    #[test]
    fn black_imbalance_is_reported() {
        let mut tree = tree_of([1, 2]);
        let root = tree.root.unwrap();
        let left = tree.left(root).unwrap();
        assert_eq!(tree.key(left), 1);
        tree.nodes.get_mut(left).color = Color::Black;
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::UnbalancedBlacks { key: 2, left: 1, right: 0 })
        );
    }

    #[test]
    #[should_panic(expected = "llrb invariant violated: tree records 4 keys but 3 are reachable")]
    fn sanity_check_panics_on_a_wrong_length() {
        let mut tree = tree_of([1, 2, 3]);
        tree.len += 1;
        tree.sanity_check();
    }

    impl LeftLeaningRedBlackTree<u32> {
        fn traverse_in_order_is_sorted(&self) -> bool {
            let keys: Vec<u32> = self.iter().map(|entry| entry.key).collect();
            keys.windows(2).all(|pair| pair[0] < pair[1])
        }
    }

    #[derive(Clone, Debug)]
    enum Op {
        Insert(u32, u32),
        Delete(u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0u32..400, any::<u32>()).prop_map(|(key, payload)| Op::Insert(key, payload)),
            2 => (0u32..400).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn matches_btreemap_and_keeps_invariants(ops in prop::collection::vec(op_strategy(), 0..400)) {
            let mut tree = LeftLeaningRedBlackTree::new();
            let mut model = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(key, payload) => {
                        prop_assert_eq!(tree.insert(KeyValueRef::new(key, payload)), model.insert(key, payload));
                    }
                    Op::Delete(key) => {
                        prop_assert_eq!(tree.delete(key), model.remove(&key));
                    }
                }
                tree.sanity_check();
            }

            let entries: Vec<(u32, u32)> = tree.iter().map(|entry| (entry.key, entry.payload)).collect();
            let expected: Vec<(u32, u32)> = model.into_iter().collect();
            prop_assert_eq!(entries, expected);
        }
    }
}
