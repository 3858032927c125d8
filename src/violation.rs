use thiserror::Error;

/// A broken structural invariant, reported by
/// [`check_invariants`](crate::OrderedMap::check_invariants).
///
/// Every variant points at a logic defect in a tree implementation; none of them can be
/// caused by the keys or payloads a caller passes in.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum InvariantViolation {
    /// The recorded length disagrees with the number of reachable keys.
    #[error("tree records {recorded} keys but {counted} are reachable")]
    CountMismatch {
        /// The cached length.
        recorded: usize,
        /// Keys found by walking the tree.
        counted: usize,
    },
    /// The arena holds nodes that are not reachable from the root.
    #[error("{live} nodes are allocated but only {reachable} are reachable")]
    LeakedNodes {
        /// Live arena slots.
        live: usize,
        /// Nodes found by walking the tree.
        reachable: usize,
    },
    /// A key sits on the wrong side of an ancestor.
    #[error("key {key} violates the search order bound {bound}")]
    OutOfOrder {
        /// The misplaced key.
        key: u32,
        /// The ancestor key (or routing key) it should be strictly beyond.
        bound: u32,
    },
    /// The root of a red-black tree is red.
    #[error("root {key} is red")]
    RedRoot {
        /// Key held by the root.
        key: u32,
    },
    /// A red node has a red child.
    #[error("red node {key} has a red child")]
    ConsecutiveReds {
        /// Key held by the red parent.
        key: u32,
    },
    /// A red link leans right in a left-leaning tree.
    #[error("node {key} has a red right link")]
    RightLeaningRed {
        /// Key held by the parent of the red right child.
        key: u32,
    },
    /// The two subtrees of a node have different black heights.
    #[error("node {key} has black height {left} on the left but {right} on the right")]
    UnbalancedBlacks {
        /// Key held by the node.
        key: u32,
        /// Black height of the left subtree.
        left: usize,
        /// Black height of the right subtree.
        right: usize,
    },
    /// A 2-3 internal node does not have 2 or 3 children.
    #[error("internal node with low key {low} has {children} children")]
    BadFanout {
        /// Smallest key under the node.
        low: u32,
        /// Its child count.
        children: usize,
    },
    /// Two leaves of a 2-3 tree sit at different depths.
    #[error("leaf {key} is at depth {depth}, expected {expected}")]
    UnevenLeafDepth {
        /// Key held by the leaf.
        key: u32,
        /// Its depth.
        depth: usize,
        /// The depth of the first leaf visited.
        expected: usize,
    },
    /// A 2-3 internal node was left without its low-key cache.
    #[error("internal node with {children} children has no low keys cached")]
    UncachedLowKeys {
        /// Its child count.
        children: usize,
    },
    /// A cached low key disagrees with the minimum of its child.
    #[error("low key cache holds {cached} for child {slot}, whose minimum is {actual}")]
    StaleLowKey {
        /// Child position within the internal node.
        slot: usize,
        /// The cached value.
        cached: u32,
        /// The child's real minimum key.
        actual: u32,
    },
}
