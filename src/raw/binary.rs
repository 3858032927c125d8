//! Walks shared by the two red-black variants: in-order iteration, counting and
//! the red-black invariant checker.

use smallvec::SmallVec;

use super::arena::Arena;
use super::color::Color;
use super::handle::Handle;
use crate::{InvariantViolation, KeyValueRef, TreeStats};

/// Read access to a binary search tree node stored in an [`Arena`].
pub(crate) trait BinaryNode {
    type Payload;

    fn entry(&self) -> &KeyValueRef<Self::Payload>;
    fn color(&self) -> Color;
    fn left(&self) -> Option<Handle>;
    fn right(&self) -> Option<Handle>;
}

/// Whether red links may lean right.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Lean {
    Either,
    Left,
}

/// Lazy in-order walk. The stack holds the nodes whose left subtree is being visited.
pub(crate) struct InOrder<'a, N> {
    nodes: &'a Arena<N>,
    stack: SmallVec<[Handle; 64]>,
    cursor: Option<Handle>,
}

impl<'a, N> InOrder<'a, N> {
    pub(crate) fn new(nodes: &'a Arena<N>, root: Option<Handle>) -> Self {
        Self {
            nodes,
            stack: SmallVec::new(),
            cursor: root,
        }
    }
}

impl<N: BinaryNode<Payload: Copy>> Iterator for InOrder<'_, N> {
    type Item = KeyValueRef<N::Payload>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(handle) = self.cursor {
            self.stack.push(handle);
            self.cursor = self.nodes.get(handle).left();
        }
        let handle = self.stack.pop()?;
        let node = self.nodes.get(handle);
        self.cursor = node.right();
        Some(*node.entry())
    }
}

pub(crate) fn count<N: BinaryNode>(nodes: &Arena<N>, link: Option<Handle>) -> usize {
    link.map_or(0, |handle| {
        let node = nodes.get(handle);
        1 + count(nodes, node.left()) + count(nodes, node.right())
    })
}

pub(crate) fn height<N: BinaryNode>(nodes: &Arena<N>, link: Option<Handle>) -> usize {
    link.map_or(0, |handle| {
        let node = nodes.get(handle);
        1 + height(nodes, node.left()).max(height(nodes, node.right()))
    })
}

pub(crate) fn leftmost<N>(nodes: &Arena<N>, root: Option<Handle>) -> Option<KeyValueRef<N::Payload>>
where
    N: BinaryNode<Payload: Copy>,
{
    let mut node = nodes.get(root?);
    while let Some(left) = node.left() {
        node = nodes.get(left);
    }
    Some(*node.entry())
}

pub(crate) fn rightmost<N>(nodes: &Arena<N>, root: Option<Handle>) -> Option<KeyValueRef<N::Payload>>
where
    N: BinaryNode<Payload: Copy>,
{
    let mut node = nodes.get(root?);
    while let Some(right) = node.right() {
        node = nodes.get(right);
    }
    Some(*node.entry())
}

/// Checks ordering, coloring, black balance and bookkeeping of a red-black tree.
pub(crate) fn check_red_black<N: BinaryNode>(
    nodes: &Arena<N>,
    root: Option<Handle>,
    len: usize,
    lean: Lean,
) -> Result<TreeStats, InvariantViolation> {
    let Some(root) = root else {
        if len != 0 {
            return Err(InvariantViolation::CountMismatch { recorded: len, counted: 0 });
        }
        if !nodes.is_empty() {
            return Err(InvariantViolation::LeakedNodes { live: nodes.len(), reachable: 0 });
        }
        return Ok(TreeStats::default());
    };

    let root_node = nodes.get(root);
    if root_node.color().is_red() {
        return Err(InvariantViolation::RedRoot { key: root_node.entry().key });
    }

    let shape = walk(nodes, root, None, None, lean)?;
    if shape.count != len {
        return Err(InvariantViolation::CountMismatch { recorded: len, counted: shape.count });
    }
    if nodes.len() != shape.count {
        return Err(InvariantViolation::LeakedNodes { live: nodes.len(), reachable: shape.count });
    }

    Ok(TreeStats {
        keys: shape.count,
        height: shape.height,
        black_height: shape.black_height,
    })
}

struct Shape {
    count: usize,
    height: usize,
    black_height: usize,
}

fn walk<N: BinaryNode>(
    nodes: &Arena<N>,
    handle: Handle,
    lower: Option<u32>,
    upper: Option<u32>,
    lean: Lean,
) -> Result<Shape, InvariantViolation> {
    let node = nodes.get(handle);
    let key = node.entry().key;

    if let Some(bound) = lower.filter(|&bound| key <= bound) {
        return Err(InvariantViolation::OutOfOrder { key, bound });
    }
    if let Some(bound) = upper.filter(|&bound| key >= bound) {
        return Err(InvariantViolation::OutOfOrder { key, bound });
    }

    let red = node.color().is_red();
    for child in [node.left(), node.right()].into_iter().flatten() {
        if red && nodes.get(child).color().is_red() {
            return Err(InvariantViolation::ConsecutiveReds { key });
        }
    }
    if lean == Lean::Left
        && let Some(right) = node.right()
        && nodes.get(right).color().is_red()
    {
        return Err(InvariantViolation::RightLeaningRed { key });
    }

    let left = match node.left() {
        Some(left) => walk(nodes, left, lower, Some(key), lean)?,
        None => Shape { count: 0, height: 0, black_height: 0 },
    };
    let right = match node.right() {
        Some(right) => walk(nodes, right, Some(key), upper, lean)?,
        None => Shape { count: 0, height: 0, black_height: 0 },
    };
    if left.black_height != right.black_height {
        return Err(InvariantViolation::UnbalancedBlacks {
            key,
            left: left.black_height,
            right: right.black_height,
        });
    }

    Ok(Shape {
        count: left.count + right.count + 1,
        height: left.height.max(right.height) + 1,
        black_height: left.black_height + usize::from(!red),
    })
}
