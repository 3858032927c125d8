//! Three self-balancing search trees behind one ordered map contract.
//!
//! Every tree maps `u32` keys to an opaque, caller-owned payload handle and implements
//! [`OrderedMap`]:
//!
//! - [`LeftLeaningRedBlackTree`] - Sedgewick's LLRB, balanced recursively on the way up
//! - [`BasicRedBlackTree`] - a classic red-black tree balanced top-down in one pass
//! - [`TwoThreeExternalTree`] - a 2-3 tree with all entries in leaves and cached
//!   low keys in the routing nodes
//!
//! Each tree can verify its own structure with
//! [`check_invariants`](OrderedMap::check_invariants), and the [`harness`] module runs
//! the same shuffled workload against all of them.
//!
//! # Example
//!
//! ```
//! use balanced_maps::{KeyValueRef, LeftLeaningRedBlackTree, OrderedMap};
//!
//! let scores = [100, 85, 92];
//! let mut tree = LeftLeaningRedBlackTree::new();
//! for (id, score) in scores.iter().enumerate() {
//!     tree.insert(KeyValueRef::new(id as u32, score));
//! }
//!
//! assert_eq!(tree.lookup(1), Some(&85));
//! assert_eq!(tree.delete(0), Some(&100));
//! assert!(tree.traverse_in_order().eq([1, 2]));
//! tree.sanity_check();
//! ```
//!
//! # Implementation
//!
//! Nodes live in a per-tree arena and link to each other by index, so every node has
//! exactly one owner slot, a dropped tree frees everything at once, and `Clone` is a
//! deep copy. The crate is `no_std` and only needs `alloc`.

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod key_value_ref;
mod ordered_map;
mod raw;
mod violation;

pub mod basic_red_black;
pub mod harness;
pub mod left_leaning;
pub mod two_three;

pub use basic_red_black::BasicRedBlackTree;
pub use key_value_ref::KeyValueRef;
pub use left_leaning::LeftLeaningRedBlackTree;
pub use ordered_map::{OrderedMap, TreeStats};
pub use two_three::TwoThreeExternalTree;
pub use violation::InvariantViolation;
