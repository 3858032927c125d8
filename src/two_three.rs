//! External-node 2-3 tree.
//!
//! Every entry lives in a leaf and every leaf is at the same depth. Internal nodes only
//! route: they hold 2 or 3 children and a cache of the smallest key under each of them.
//! Splits push one overflow node up per level on insertion; deletions steal from or
//! merge with a sibling and pull an under-full condition up the same way.

use core::mem;

use smallvec::SmallVec;

use crate::ordered_map::forward_ordered_map;
use crate::raw::{Arena, Handle};
use crate::{InvariantViolation, KeyValueRef, TreeStats};

mod node;

use node::{InternalNode, LowKeys, MAX_CHILDREN, MIN_CHILDREN, Node};

/// Result of inserting below an internal node.
struct Insertion<P> {
    /// Payload replaced by an overwrite.
    previous: Option<P>,
    /// Right half of a node that split; the caller adopts it as a new child.
    overflow: Option<Handle>,
}

/// A 2-3 tree that keeps its entries in leaves and routes on cached low keys.
///
/// Cloning produces an independent deep copy.
///
/// # Examples
///
/// ```
/// use balanced_maps::{KeyValueRef, TwoThreeExternalTree};
///
/// let mut tree: TwoThreeExternalTree<u64> = (1..=10).map(|key| KeyValueRef::new(key, u64::from(key) * 1000)).collect();
/// assert_eq!(tree.lookup(3), Some(3000));
/// for key in 4..=10 {
///     tree.delete(key);
/// }
/// assert!(tree.iter().map(|entry| entry.key).eq(1..=3));
/// tree.sanity_check();
/// ```
#[derive(Clone)]
pub struct TwoThreeExternalTree<P> {
    nodes: Arena<Node<P>>,
    root: Option<Handle>,
    len: usize,
}

forward_ordered_map!(TwoThreeExternalTree, "two-three");

impl<P: Copy> TwoThreeExternalTree<P> {
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
        let mut handle = self.root?;
        loop {
            match self.nodes.get(handle) {
                Node::Leaf(leaf) => return (leaf.key == key).then_some(leaf.payload),
                Node::Internal(internal) => handle = internal.child(internal.lows().route(key)),
            }
        }
    }

    /// Inserts `entry`, returning the payload it replaced if the key was present.
    pub fn insert(&mut self, entry: KeyValueRef<P>) -> Option<P> {
        let Some(root) = self.root else {
            self.root = Some(self.nodes.alloc(Node::Leaf(entry)));
            self.len = 1;
            return None;
        };

        let outcome = match self.leaf_entry(root) {
            Some(leaf) if leaf.key == entry.key => {
                return Some(self.overwrite(root, entry.payload));
            }
            Some(leaf) => {
                let new_leaf = self.nodes.alloc(Node::Leaf(entry));
                let pair = if entry.key < leaf.key { [new_leaf, root] } else { [root, new_leaf] };
                self.root = Some(self.new_internal(&pair));
                Insertion { previous: None, overflow: None }
            }
            None => self.insert_below(root, entry),
        };

        if let Some(overflow) = outcome.overflow {
            self.root = Some(self.new_internal(&[root, overflow]));
        }
        if outcome.previous.is_none() {
            self.len += 1;
        }
        outcome.previous
    }

    /// Removes `key`, returning its payload.
    pub fn delete(&mut self, key: u32) -> Option<P> {
        let root = self.root?;

        let removed = match self.leaf_entry(root) {
            Some(leaf) if leaf.key == key => {
                self.nodes.take(root);
                self.root = None;
                leaf.payload
            }
            Some(_) => return None,
            None => {
                let removed = self.delete_below(root, key)?;
                let internal = self.internal(root);
                if internal.len() == 1 {
                    let only = internal.child(0);
                    self.nodes.take(root);
                    self.root = Some(only);
                }
                removed
            }
        };

        self.len -= 1;
        Some(removed)
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

    /// Counts the keys by visiting every leaf.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.root.map_or(0, |root| self.count_leaves(root))
    }

    /// Levels in the tree, leaves included.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut link = self.root;
        while let Some(handle) = link {
            height += 1;
            link = match self.nodes.get(handle) {
                Node::Leaf(_) => None,
                Node::Internal(internal) => Some(internal.child(0)),
            };
        }
        height
    }

    /// Iterates over the entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = KeyValueRef<P>> + '_ {
        Leaves {
            nodes: &self.nodes,
            stack: self.root.into_iter().collect(),
        }
    }

    /// Entry with the smallest key.
    #[must_use]
    pub fn first(&self) -> Option<KeyValueRef<P>> {
        self.edge_leaf(|internal| internal.child(0))
    }

    /// Entry with the largest key.
    #[must_use]
    pub fn last(&self) -> Option<KeyValueRef<P>> {
        self.edge_leaf(|internal| internal.child(internal.len() - 1))
    }

    /// Drops every node.
    pub fn free_all(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    /// Verifies fanout, equal leaf depth, key order and the low-key caches.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn check_invariants(&self) -> Result<TreeStats, InvariantViolation> {
        let Some(root) = self.root else {
            if self.len != 0 {
                return Err(InvariantViolation::CountMismatch { recorded: self.len, counted: 0 });
            }
            if !self.nodes.is_empty() {
                return Err(InvariantViolation::LeakedNodes { live: self.nodes.len(), reachable: 0 });
            }
            return Ok(TreeStats::default());
        };

        let mut leaf_depth = None;
        let span = self.check_subtree(root, 0, &mut leaf_depth)?;
        if span.leaves != self.len {
            return Err(InvariantViolation::CountMismatch { recorded: self.len, counted: span.leaves });
        }
        if span.nodes != self.nodes.len() {
            return Err(InvariantViolation::LeakedNodes { live: self.nodes.len(), reachable: span.nodes });
        }

        let height = leaf_depth.unwrap_or(0) + 1;
        Ok(TreeStats {
            keys: span.leaves,
            height,
            black_height: height,
        })
    }

    /// Panics if any invariant is violated.
    ///
    /// # Panics
    ///
    /// Panics with the violated invariant.
    pub fn sanity_check(&self) {
        crate::OrderedMap::sanity_check(self);
    }

    /// Inserts below the internal node `handle`, splitting it if it ends up with four
    /// children.
    fn insert_below(&mut self, handle: Handle, entry: KeyValueRef<P>) -> Insertion<P> {
        let internal = self.internal(handle);
        let slot = internal.lows().route(entry.key);
        let child = internal.child(slot);

        match self.leaf_entry(child) {
            Some(leaf) if leaf.key == entry.key => {
                return Insertion {
                    previous: Some(self.overwrite(child, entry.payload)),
                    overflow: None,
                };
            }
            Some(leaf) => {
                let position = if entry.key < leaf.key { slot } else { slot + 1 };
                let new_leaf = self.nodes.alloc(Node::Leaf(entry));
                self.internal_mut(handle).insert_child(position, new_leaf);
            }
            None => {
                let below = self.insert_below(child, entry);
                if below.previous.is_some() {
                    return below;
                }
                if let Some(overflow) = below.overflow {
                    self.internal_mut(handle).insert_child(slot + 1, overflow);
                }
            }
        }

        let overflow = if self.internal(handle).len() > MAX_CHILDREN {
            let right = self.internal_mut(handle).split_off(MIN_CHILDREN);
            Some(self.new_internal(&right))
        } else {
            None
        };
        self.fix_lows(handle);
        Insertion { previous: None, overflow }
    }

    /// Deletes `key` below the internal node `handle`. On success `handle` may be left
    /// with a single child for its parent to repair.
    fn delete_below(&mut self, handle: Handle, key: u32) -> Option<P> {
        let internal = self.internal(handle);
        let slot = internal.lows().route(key);
        let child = internal.child(slot);

        let removed = match self.leaf_entry(child) {
            Some(leaf) if leaf.key == key => {
                self.nodes.take(child);
                self.internal_mut(handle).remove_child(slot);
                leaf.payload
            }
            Some(_) => return None,
            None => {
                let removed = self.delete_below(child, key)?;
                if self.internal(child).len() < MIN_CHILDREN {
                    self.repair_underflow(handle, slot);
                }
                removed
            }
        };

        self.fix_lows(handle);
        Some(removed)
    }

    /// Gives the single-child node at `slot` a second child, either by taking one from
    /// a 3-child sibling or by merging into a 2-child sibling.
    fn repair_underflow(&mut self, parent: Handle, slot: usize) {
        let internal = self.internal(parent);
        let lone = internal.child(slot);
        let from_left = slot > 0;
        let sibling = if from_left {
            internal.child(slot - 1)
        } else {
            internal.child(slot + 1)
        };

        if self.internal(sibling).len() > MIN_CHILDREN {
            if from_left {
                let moved = self.internal_mut(sibling).pop_child();
                self.internal_mut(lone).insert_child(0, moved);
            } else {
                let moved = self.internal_mut(sibling).remove_child(0);
                self.internal_mut(lone).push_child(moved);
            }
            self.fix_lows(sibling);
            self.fix_lows(lone);
        } else {
            let orphan = self.internal(lone).child(0);
            if from_left {
                self.internal_mut(sibling).push_child(orphan);
            } else {
                self.internal_mut(sibling).insert_child(0, orphan);
            }
            self.fix_lows(sibling);
            self.nodes.take(lone);
            self.internal_mut(parent).remove_child(slot);
        }
    }

    /// Rebuilds the low-key cache of `handle` from its children, whose own caches must
    /// already be current.
    fn fix_lows(&mut self, handle: Handle) {
        let lows = LowKeys::recompute(self.internal(handle).children(), |child| self.min_key(child));
        self.internal_mut(handle).install_lows(lows);
    }

    fn new_internal(&mut self, children: &[Handle]) -> Handle {
        let handle = self.nodes.alloc(Node::Internal(InternalNode::new(children)));
        self.fix_lows(handle);
        handle
    }

    fn min_key(&self, handle: Handle) -> u32 {
        match self.nodes.get(handle) {
            Node::Leaf(leaf) => leaf.key,
            Node::Internal(internal) => internal.lows().min(),
        }
    }

    fn overwrite(&mut self, leaf: Handle, payload: P) -> P {
        match self.nodes.get_mut(leaf) {
            Node::Leaf(entry) => mem::replace(&mut entry.payload, payload),
            Node::Internal(_) => panic!("`overwrite()` - expected a leaf"),
        }
    }

    fn leaf_entry(&self, handle: Handle) -> Option<KeyValueRef<P>> {
        match self.nodes.get(handle) {
            Node::Leaf(leaf) => Some(*leaf),
            Node::Internal(_) => None,
        }
    }

    fn internal(&self, handle: Handle) -> &InternalNode {
        match self.nodes.get(handle) {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    fn internal_mut(&mut self, handle: Handle) -> &mut InternalNode {
        match self.nodes.get_mut(handle) {
            Node::Internal(internal) => internal,
            Node::Leaf(_) => panic!("expected internal node"),
        }
    }

    fn edge_leaf(&self, pick: impl Fn(&InternalNode) -> Handle) -> Option<KeyValueRef<P>> {
        let mut handle = self.root?;
        loop {
            match self.nodes.get(handle) {
                Node::Leaf(leaf) => return Some(*leaf),
                Node::Internal(internal) => handle = pick(internal),
            }
        }
    }

    fn count_leaves(&self, handle: Handle) -> usize {
        match self.nodes.get(handle) {
            Node::Leaf(_) => 1,
            Node::Internal(internal) => internal.children().iter().map(|&child| self.count_leaves(child)).sum(),
        }
    }

    fn check_subtree(
        &self,
        handle: Handle,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> Result<Span, InvariantViolation> {
        let internal = match self.nodes.get(handle) {
            Node::Leaf(leaf) => {
                let expected = *leaf_depth.get_or_insert(depth);
                if depth != expected {
                    return Err(InvariantViolation::UnevenLeafDepth { key: leaf.key, depth, expected });
                }
                return Ok(Span {
                    min: leaf.key,
                    max: leaf.key,
                    leaves: 1,
                    nodes: 1,
                });
            }
            Node::Internal(internal) => internal,
        };

        let mut spans: SmallVec<[Span; MAX_CHILDREN + 1]> = SmallVec::new();
        for &child in internal.children() {
            let span = self.check_subtree(child, depth + 1, leaf_depth)?;
            if let Some(previous) = spans.last()
                && span.min <= previous.max
            {
                return Err(InvariantViolation::OutOfOrder { key: span.min, bound: previous.max });
            }
            spans.push(span);
        }

        let (Some(first), Some(last)) = (spans.first(), spans.last()) else {
            return Err(InvariantViolation::BadFanout { low: 0, children: 0 });
        };
        if !(MIN_CHILDREN..=MAX_CHILDREN).contains(&spans.len()) {
            return Err(InvariantViolation::BadFanout {
                low: first.min,
                children: spans.len(),
            });
        }

        let Some(lows) = internal.cached_lows() else {
            return Err(InvariantViolation::UncachedLowKeys { children: spans.len() });
        };
        for (slot, span) in spans.iter().enumerate() {
            if lows.get(slot) != span.min {
                return Err(InvariantViolation::StaleLowKey {
                    slot,
                    cached: lows.get(slot),
                    actual: span.min,
                });
            }
        }

        Ok(Span {
            min: first.min,
            max: last.max,
            leaves: spans.iter().map(|span| span.leaves).sum(),
            nodes: 1 + spans.iter().map(|span| span.nodes).sum::<usize>(),
        })
    }
}

/// Key range and size of a checked subtree.
struct Span {
    min: u32,
    max: u32,
    leaves: usize,
    nodes: usize,
}

/// Depth-first walk yielding leaves left to right.
struct Leaves<'a, P> {
    nodes: &'a Arena<Node<P>>,
    stack: SmallVec<[Handle; 32]>,
}

impl<P: Copy> Iterator for Leaves<'_, P> {
    type Item = KeyValueRef<P>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(handle) = self.stack.pop() {
            match self.nodes.get(handle) {
                Node::Leaf(leaf) => return Some(*leaf),
                Node::Internal(internal) => self.stack.extend(internal.children().iter().rev().copied()),
            }
        }
        None
    }
}
