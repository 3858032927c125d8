use smallvec::SmallVec;

use crate::KeyValueRef;
use crate::raw::Handle;

pub(super) const MIN_CHILDREN: usize = 2;
pub(super) const MAX_CHILDREN: usize = 3;

/// Room for the extra child an insertion adds just before the node splits.
type Children = SmallVec<[Handle; MAX_CHILDREN + 1]>;

#[derive(Clone)]
pub(super) enum Node<P> {
    Leaf(KeyValueRef<P>),
    Internal(InternalNode),
}

/// Routing node: 2 or 3 children plus the minimum key reachable through each.
#[derive(Clone)]
pub(super) struct InternalNode {
    children: Children,
    // `None` between a change to `children` and the next `install_lows`.
    lows: Option<LowKeys>,
}

/// The minimum key under each child of an internal node, in child order.
///
/// The cache is derived state. It can only be built by [`LowKeys::recompute`] from the
/// children it describes, and any change to a node's children drops it until the tree
/// recomputes it bottom-up. Routing through a node whose cache was dropped panics.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct LowKeys(SmallVec<[u32; MAX_CHILDREN + 1]>);

impl LowKeys {
    pub(super) fn recompute(children: &[Handle], min_key: impl Fn(Handle) -> u32) -> Self {
        Self(children.iter().map(|&child| min_key(child)).collect())
    }

    pub(super) fn get(&self, slot: usize) -> u32 {
        self.0[slot]
    }

    /// Smallest key under the whole node.
    pub(super) fn min(&self) -> u32 {
        self.0[0]
    }

    /// The last child whose low key is at most `key`, or the first child.
    pub(super) fn route(&self, key: u32) -> usize {
        self.0.iter().rposition(|&low| low <= key).unwrap_or(0)
    }
}

impl InternalNode {
    pub(super) fn new(children: &[Handle]) -> Self {
        Self {
            children: SmallVec::from_slice(children),
            lows: None,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.children.len()
    }

    pub(super) fn child(&self, slot: usize) -> Handle {
        self.children[slot]
    }

    pub(super) fn children(&self) -> &[Handle] {
        &self.children
    }

    pub(super) fn lows(&self) -> &LowKeys {
        self.lows.as_ref().expect("`InternalNode::lows()` - low keys are stale")
    }

    /// Cached lows, without panicking on a stale cache.
    pub(super) fn cached_lows(&self) -> Option<&LowKeys> {
        self.lows.as_ref()
    }

    pub(super) fn install_lows(&mut self, lows: LowKeys) {
        assert_eq!(lows.0.len(), self.children.len(), "`InternalNode::install_lows()` - one low key per child");
        self.lows = Some(lows);
    }

    pub(super) fn insert_child(&mut self, slot: usize, child: Handle) {
        self.children.insert(slot, child);
        self.lows = None;
    }

    pub(super) fn push_child(&mut self, child: Handle) {
        self.children.push(child);
        self.lows = None;
    }

    pub(super) fn remove_child(&mut self, slot: usize) -> Handle {
        self.lows = None;
        self.children.remove(slot)
    }

    pub(super) fn pop_child(&mut self) -> Handle {
        self.lows = None;
        self.children.pop().expect("`InternalNode::pop_child()` - no children")
    }

    /// Moves the children from `slot` onwards into a new list.
    pub(super) fn split_off(&mut self, slot: usize) -> Children {
        self.lows = None;
        self.children.drain(slot..).collect()
    }
}
