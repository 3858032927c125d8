mod arena;
mod binary;
mod color;
mod handle;

pub(crate) use arena::Arena;
pub(crate) use binary::{BinaryNode, InOrder, Lean, check_red_black, count, height, leftmost, rightmost};
pub(crate) use color::Color;
pub(crate) use handle::Handle;
