mod arena;
mod handle;
mod node;
mod raw_aa_tree;

pub(crate) use handle::Handle;
pub use node::Direction;
pub(crate) use node::{LinkedNode, Node};
pub(crate) use raw_aa_tree::{Order, RawAaTree};
