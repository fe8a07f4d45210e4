use core::fmt;

use crate::raw::{Direction, Handle, LinkedNode, RawAaTree};

/// A read-only view of one tree node, as returned by
/// [`OrderedMultiIndex::nodes`](super::OrderedMultiIndex::nodes).
///
/// Each node holds every value sharing one key. Useful for printing the tree
/// shape:
///
/// ```
/// use aa_index::OrderedMultiIndex;
///
/// let index = OrderedMultiIndex::from([1, 2, 3]);
/// let mut dump = String::new();
/// for node in index.nodes() {
///     dump.push_str(&"--".repeat(node.depth()));
///     dump.push_str(&format!(" {}\n", node.key()));
/// }
/// assert_eq!(dump, "-- 1\n 2\n-- 3\n");
/// ```
pub struct NodeView<'a, T> {
    raw: &'a RawAaTree<T>,
    handle: Handle,
}

impl<'a, T> NodeView<'a, T> {
    pub(super) fn new(raw: &'a RawAaTree<T>, handle: Handle) -> Self {
        Self { raw, handle }
    }

    fn node(&self) -> &'a LinkedNode<T> {
        self.raw.node(self.handle)
    }

    /// The first value inserted under this key.
    #[must_use]
    pub fn key(&self) -> &'a T {
        self.node().key()
    }

    /// Every value stored under this key, in insertion order.
    #[must_use]
    pub fn values(&self) -> &'a [T] {
        self.node().bucket()
    }

    /// The AA level; leaves are level 1.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.node().level()
    }

    /// Which child slot of its parent this node occupies.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.node().direction()
    }

    /// Distance from the root, which has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.raw.depth(self.handle)
    }
}

impl<T> Clone for NodeView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeView<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for NodeView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("level", &self.level())
            .field("direction", &self.direction())
            .field("values", &self.values())
            .finish()
    }
}
