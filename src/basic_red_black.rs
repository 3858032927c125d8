//! Classic red-black tree with top-down, single-pass insertion and deletion.
//!
//! Both operations walk from the root to the bottom once, fixing colors on the way
//! down through a small window of ancestors, instead of recursing and repairing on
//! the way back up.

use core::mem;

use crate::ordered_map::forward_ordered_map;
use crate::raw::{self, Arena, BinaryNode, Color, Handle, InOrder, Lean};
use crate::{InvariantViolation, KeyValueRef, TreeStats};

const LEFT: usize = 0;
const RIGHT: usize = 1;

#[derive(Clone)]
struct Node<P> {
    entry: KeyValueRef<P>,
    color: Color,
    /// Children indexed by direction, so a comparison result can pick a side.
    link: [Option<Handle>; 2],
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
        self.link[LEFT]
    }

    fn right(&self) -> Option<Handle> {
        self.link[RIGHT]
    }
}

/// A position in the ancestor window.
///
/// `Head` stands for a black pseudo-node above the root whose right link is the root,
/// so the root can be rotated like any other child.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Slot {
    Head,
    Node(Handle),
}

/// A red-black tree balanced top-down in a single pass.
///
/// Cloning produces an independent deep copy.
///
/// # Examples
///
/// ```
/// use balanced_maps::{BasicRedBlackTree, KeyValueRef, OrderedMap};
///
/// let labels = ["a", "b", "c", "d"];
/// let mut tree = BasicRedBlackTree::new();
/// for (key, label) in labels.iter().enumerate() {
///     tree.insert(KeyValueRef::new(key as u32, label));
/// }
/// assert_eq!(tree.lookup(2), Some(&"c"));
/// tree.delete(2);
/// assert!(tree.traverse_in_order().eq([0, 1, 3]));
/// ```
#[derive(Clone)]
pub struct BasicRedBlackTree<P> {
    nodes: Arena<Node<P>>,
    root: Option<Handle>,
    len: usize,
}

forward_ordered_map!(BasicRedBlackTree, "basic-rb");

impl<P: Copy> BasicRedBlackTree<P> {
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
            if node.entry.key == key {
                return Some(node.entry.payload);
            }
            link = node.link[usize::from(node.entry.key < key)];
        }
        None
    }

    /// Inserts `entry`, returning the payload it replaced if the key was present.
    pub fn insert(&mut self, entry: KeyValueRef<P>) -> Option<P> {
        let Some(root) = self.root else {
            self.root = Some(self.nodes.alloc(Node {
                entry,
                color: Color::Black,
                link: [None, None],
            }));
            self.len = 1;
            return None;
        };

        // Great-grandparent, grandparent, parent and current node.
        let mut t = Slot::Head;
        let mut g: Option<Handle> = None;
        let mut p: Option<Handle> = None;
        let mut next = Some(root);
        let mut dir = RIGHT;
        let mut last = RIGHT;
        let mut created = false;
        let previous;

        loop {
            let q = if let Some(q) = next {
                if self.is_red(self.link(Slot::Node(q), LEFT)) && self.is_red(self.link(Slot::Node(q), RIGHT)) {
                    self.flip_colors(q);
                }
                q
            } else {
                let parent = p.expect("`insert()` - new node without a parent");
                let q = self.nodes.alloc(Node {
                    entry,
                    color: Color::Red,
                    link: [None, None],
                });
                self.set_link(Slot::Node(parent), dir, Some(q));
                self.len += 1;
                created = true;
                q
            };

            if let Some(parent) = p
                && self.is_red(Some(q))
                && self.is_red(Some(parent))
            {
                // A red parent is never the root, so the grandparent exists.
                let grandparent = g.expect("`insert()` - red parent without a grandparent");
                let side = usize::from(self.link(t, RIGHT) == Some(grandparent));
                let top = if self.link(Slot::Node(parent), last) == Some(q) {
                    self.rotate_single(grandparent, 1 - last)
                } else {
                    self.rotate_double(grandparent, 1 - last)
                };
                self.set_link(t, side, Some(top));
            }

            let key = self.nodes.get(q).entry.key;
            if key == entry.key {
                previous = if created {
                    None
                } else {
                    let node = self.nodes.get_mut(q);
                    Some(mem::replace(&mut node.entry.payload, entry.payload))
                };
                break;
            }

            last = dir;
            dir = usize::from(key < entry.key);
            if let Some(grandparent) = g {
                t = Slot::Node(grandparent);
            }
            g = p;
            p = Some(q);
            next = self.link(Slot::Node(q), dir);
        }

        self.paint_root_black();
        previous
    }

    /// Removes `key`, returning its payload.
    ///
    /// The walk pushes a red node down the search path so that the node finally
    /// unlinked is red or has a red child. When the key sits in an internal node, its
    /// in-order successor's entry is moved up and the successor's node is unlinked.
    pub fn delete(&mut self, key: u32) -> Option<P> {
        self.root?;

        let mut q = Slot::Head;
        let mut p: Option<Slot> = None;
        let mut g: Option<Slot>;
        let mut found: Option<Handle> = None;
        let mut dir = RIGHT;

        while let Some(child) = self.link(q, dir) {
            let last = dir;
            g = p;
            p = Some(q);
            q = Slot::Node(child);

            let child_key = self.nodes.get(child).entry.key;
            if child_key == key {
                found = Some(child);
            }
            // Equal keys continue right, towards the successor.
            dir = usize::from(child_key <= key);

            if self.is_red(Some(child)) || self.is_red(self.link(q, dir)) {
                continue;
            }
            let parent = p.expect("`delete()` - descent without a parent");

            if self.is_red(self.link(q, 1 - dir)) {
                let top = self.rotate_single(child, dir);
                self.set_link(parent, last, Some(top));
                p = Some(Slot::Node(top));
            } else if let Some(sibling) = self.link(parent, 1 - last) {
                let Slot::Node(parent) = parent else {
                    unreachable!("the head has no left link");
                };
                if !self.is_red(self.link(Slot::Node(sibling), 1 - last))
                    && !self.is_red(self.link(Slot::Node(sibling), last))
                {
                    self.set_color(parent, Color::Black);
                    self.set_color(sibling, Color::Red);
                    self.set_color(child, Color::Red);
                } else {
                    let grandparent = g.expect("`delete()` - sibling without a grandparent");
                    let side = usize::from(self.link(grandparent, RIGHT) == Some(parent));
                    let top = if self.is_red(self.link(Slot::Node(sibling), last)) {
                        self.rotate_double(parent, last)
                    } else {
                        self.rotate_single(parent, last)
                    };
                    self.set_link(grandparent, side, Some(top));

                    self.set_color(child, Color::Red);
                    self.set_color(top, Color::Red);
                    let below_top = self.nodes.get(top).link;
                    for below in below_top.into_iter().flatten() {
                        self.set_color(below, Color::Black);
                    }
                }
            }
        }

        let removed = found.map(|found| {
            let Slot::Node(bottom) = q else {
                unreachable!("a found key means the walk left the head");
            };
            let parent = p.expect("`delete()` - bottom node without a parent");

            let replacement = self.nodes.get(bottom).entry;
            let removed = mem::replace(&mut self.nodes.get_mut(found).entry, replacement);

            let orphan = self.link(q, usize::from(self.link(q, LEFT).is_none()));
            let side = usize::from(self.link(parent, RIGHT) == Some(bottom));
            self.set_link(parent, side, orphan);
            self.nodes.take(bottom);
            self.len -= 1;
            removed.payload
        });

        self.paint_root_black();
        removed
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

    /// Verifies ordering, coloring and black balance.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn check_invariants(&self) -> Result<TreeStats, InvariantViolation> {
        raw::check_red_black(&self.nodes, self.root, self.len, Lean::Either)
    }

    /// Panics if any invariant is violated.
    ///
    /// # Panics
    ///
    /// Panics with the violated invariant.
    pub fn sanity_check(&self) {
        crate::OrderedMap::sanity_check(self);
    }

    /// Rotates `root` towards `dir`. The old root turns red, the new one black.
    fn rotate_single(&mut self, root: Handle, dir: usize) -> Handle {
        let save = self.nodes.get(root).link[1 - dir].expect("`rotate_single()` - nothing to rotate up");
        let inner = self.nodes.get(save).link[dir];

        let node = self.nodes.get_mut(root);
        node.link[1 - dir] = inner;
        node.color = Color::Red;

        let top = self.nodes.get_mut(save);
        top.link[dir] = Some(root);
        top.color = Color::Black;
        save
    }

    fn rotate_double(&mut self, root: Handle, dir: usize) -> Handle {
        let child = self.nodes.get(root).link[1 - dir].expect("`rotate_double()` - nothing to rotate up");
        let child = self.rotate_single(child, 1 - dir);
        self.nodes.get_mut(root).link[1 - dir] = Some(child);
        self.rotate_single(root, dir)
    }

    fn flip_colors(&mut self, handle: Handle) {
        let node = self.nodes.get_mut(handle);
        node.color = node.color.flipped();
        let children = node.link;
        for child in children.into_iter().flatten() {
            let child = self.nodes.get_mut(child);
            child.color = child.color.flipped();
        }
    }

    fn link(&self, slot: Slot, dir: usize) -> Option<Handle> {
        match slot {
            Slot::Head if dir == RIGHT => self.root,
            Slot::Head => None,
            Slot::Node(handle) => self.nodes.get(handle).link[dir],
        }
    }

    fn set_link(&mut self, slot: Slot, dir: usize, child: Option<Handle>) {
        match slot {
            Slot::Head => {
                debug_assert_eq!(dir, RIGHT, "the head only links to the root");
                self.root = child;
            }
            Slot::Node(handle) => self.nodes.get_mut(handle).link[dir] = child,
        }
    }

    fn set_color(&mut self, handle: Handle, color: Color) {
        self.nodes.get_mut(handle).color = color;
    }

    fn is_red(&self, link: Option<Handle>) -> bool {
        link.is_some_and(|handle| self.nodes.get(handle).color.is_red())
    }

    fn paint_root_black(&mut self) {
        if let Some(root) = self.root {
            self.set_color(root, Color::Black);
        }
    }
}
