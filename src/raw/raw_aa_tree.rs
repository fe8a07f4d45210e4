use alloc::vec::Vec;
use core::cmp::Ordering::{Equal, Greater, Less};
use core::ops::Bound;

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{Direction, LinkedNode, Node};
use crate::comparator::Comparator;

/// Direction of travel through the key order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Order {
    Ascending,
    Descending,
}

/// Ancestors along a search path (root first), or a bottom-up list of nodes
/// awaiting rebalancing. AA-tree height is at most 2 * log2(n).
type Path = SmallVec<[Handle; 64]>;

/// The AA-tree backing `OrderedMultiIndex`.
///
/// All links are arena handles: `left`/`right` own, `parent` points back.
/// Comparators are passed per call so this type stays independent of them.
#[derive(Clone)]
pub(crate) struct RawAaTree<T> {
    /// Every node slot, linked or retired.
    nodes: Arena<Node<T>>,
    root: Option<Handle>,
    /// Sum of all bucket lengths.
    len: usize,
}

impl<T> RawAaTree<T> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
            len: 0,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    /// Number of retired nodes still waiting for [`RawAaTree::release_retired`].
    pub(crate) const fn retired_len(&self) -> usize {
        self.nodes.deferred_len()
    }

    /// Frees every retired node no cursor is parked on, as reported by `pinned`.
    pub(crate) fn release_retired<P>(&mut self, pinned: P)
    where
        P: FnMut(Handle) -> bool,
    {
        self.nodes.release_deferred(pinned);
    }

    /// Upper bound (exclusive) on the index of any handle this tree gives out.
    pub(crate) fn extent(&self) -> usize {
        self.nodes.extent()
    }

    /// Returns the slot at `handle`, linked or retired.
    pub(crate) fn slot(&self, handle: Handle) -> Option<&Node<T>> {
        self.nodes.try_get(handle)
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &LinkedNode<T> {
        self.nodes.get(handle).as_linked()
    }

    #[inline]
    fn node_mut(&mut self, handle: Handle) -> &mut LinkedNode<T> {
        self.nodes.get_mut(handle).as_linked_mut()
    }

    #[inline]
    fn level_of(&self, handle: Option<Handle>) -> u32 {
        handle.map_or(0, |h| self.node(h).level())
    }

    pub(crate) fn root_level(&self) -> u32 {
        self.level_of(self.root)
    }

    /// Number of parent links between `handle` and the root.
    pub(crate) fn depth(&self, handle: Handle) -> usize {
        let mut depth = 0;
        let mut current = self.node(handle).parent();
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent();
        }
        depth
    }

    /// Points the `direction` slot of `parent` (or the root) at `child`.
    fn attach(&mut self, parent: Option<Handle>, direction: Direction, child: Option<Handle>) {
        match parent {
            Some(parent) => self.node_mut(parent).set_child(direction, child),
            None => self.root = child,
        }
    }

    /// Follows `direction` links from `handle` as far as they go.
    fn outermost(&self, mut handle: Handle, direction: Direction) -> Handle {
        while let Some(child) = self.node(handle).child(direction) {
            handle = child;
        }
        handle
    }

    /// Right rotation removing a left horizontal link. Returns the new subtree root.
    fn skew(&mut self, handle: Handle) -> Handle {
        let node = self.node(handle);
        let Some(left) = node.left() else {
            return handle;
        };
        if self.node(left).level() != node.level() {
            return handle;
        }
        let (parent, direction) = (node.parent(), node.direction());

        let left_right = self.node(left).right();
        self.node_mut(handle).set_left(left_right);
        if let Some(left_right) = left_right {
            self.node_mut(left_right).set_parent(Some(handle), Direction::Left);
        }

        let new_root = self.node_mut(left);
        new_root.set_right(Some(handle));
        new_root.set_parent(parent, direction);
        self.node_mut(handle).set_parent(Some(left), Direction::Right);
        self.attach(parent, direction, Some(left));
        left
    }

    /// Left rotation removing two consecutive right horizontal links, promoting
    /// the middle node one level. Returns the new subtree root.
    fn split(&mut self, handle: Handle) -> Handle {
        let node = self.node(handle);
        let Some(right) = node.right() else {
            return handle;
        };
        let Some(right_right) = self.node(right).right() else {
            return handle;
        };
        if self.node(right_right).level() != node.level() {
            return handle;
        }
        let (parent, direction) = (node.parent(), node.direction());

        let right_left = self.node(right).left();
        self.node_mut(handle).set_right(right_left);
        if let Some(right_left) = right_left {
            self.node_mut(right_left).set_parent(Some(handle), Direction::Right);
        }

        let new_root = self.node_mut(right);
        new_root.set_left(Some(handle));
        new_root.set_parent(parent, direction);
        new_root.set_level(new_root.level() + 1);
        self.node_mut(handle).set_parent(Some(right), Direction::Left);
        self.attach(parent, direction, Some(right));
        right
    }

    /// Lowers `handle` (and a right child sharing its level) when a child
    /// subtree has become too shallow.
    fn decrease_level(&mut self, handle: Handle) {
        let node = self.node(handle);
        let should_be = self.level_of(node.left()).min(self.level_of(node.right())) + 1;
        if should_be >= node.level() {
            return;
        }
        let right = node.right();
        self.node_mut(handle).set_level(should_be);
        if let Some(right) = right {
            let right = self.node_mut(right);
            if right.level() > should_be {
                right.set_level(should_be);
            }
        }
    }

    /// Restores the AA invariants at `handle` after a removal below it.
    fn rebalance_after_remove(&mut self, handle: Handle) {
        self.decrease_level(handle);

        let handle = self.skew(handle);
        if let Some(right) = self.node(handle).right() {
            let right = self.skew(right);
            if let Some(right_right) = self.node(right).right() {
                self.skew(right_right);
            }
        }

        let handle = self.split(handle);
        if let Some(right) = self.node(handle).right() {
            self.split(right);
        }
    }

    /// Finds the node whose key compares equal to `value`, collecting its
    /// ancestors root-first into `path`.
    fn find<C>(&self, value: &T, comparator: &C, path: &mut Path) -> Option<Handle>
    where
        C: Comparator<T> + ?Sized,
    {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.node(handle);
            current = match comparator.compare(value, node.key()) {
                Less => node.left(),
                Greater => node.right(),
                Equal => return Some(handle),
            };
            path.push(handle);
        }
        None
    }

    /// Returns the node holding values comparator-equal to `value`.
    pub(crate) fn search<C>(&self, value: &T, comparator: &C) -> Option<Handle>
    where
        C: Comparator<T> + ?Sized,
    {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.node(handle);
            current = match comparator.compare(value, node.key()) {
                Less => node.left(),
                Greater => node.right(),
                Equal => return Some(handle),
            };
        }
        None
    }

    /// Inserts `value`, appending to an existing bucket when the key is present.
    pub(crate) fn insert<C>(&mut self, value: T, comparator: &C)
    where
        C: Comparator<T> + ?Sized,
    {
        let mut path = Path::new();
        let mut current = self.root;
        let mut direction = Direction::Root;

        while let Some(handle) = current {
            let node = self.node(handle);
            match comparator.compare(&value, node.key()) {
                Less => {
                    direction = Direction::Left;
                    current = node.left();
                }
                Greater => {
                    direction = Direction::Right;
                    current = node.right();
                }
                Equal => {
                    // Same key: no structural change, nothing to rebalance.
                    self.node_mut(handle).push(value);
                    self.len += 1;
                    return;
                }
            }
            path.push(handle);
        }

        let parent = path.last().copied();
        let handle = self.nodes.alloc(Node::Linked(LinkedNode::new(value, parent, direction)));
        self.attach(parent, direction, Some(handle));
        self.len += 1;

        for &ancestor in path.iter().rev() {
            let subtree = self.skew(ancestor);
            self.split(subtree);
        }
    }

    /// Removes the first value (or, with `all_copies`, every value) equal to
    /// `value` from the bucket whose key compares equal to it. Returns how many
    /// values were removed.
    ///
    /// A node whose bucket empties is spliced out. If `pinned` reports a
    /// cursor parked on it, its slot is retired rather than freed, so that
    /// cursor stays valid.
    pub(crate) fn remove<C, P>(&mut self, value: &T, all_copies: bool, comparator: &C, pinned: P) -> usize
    where
        T: PartialEq,
        C: Comparator<T> + ?Sized,
        P: FnOnce(Handle) -> bool,
    {
        let mut ancestors = Path::new();
        let Some(handle) = self.find(value, comparator, &mut ancestors) else {
            return 0;
        };

        let node = self.node_mut(handle);
        let (removed, last) = if all_copies {
            node.remove_all(value)
        } else {
            match node.remove_first(value) {
                Some(removed) => (1, Some(removed)),
                None => (0, None),
            }
        };
        self.len -= removed;

        if let Some(anchor) = last.filter(|_| self.node(handle).is_empty()) {
            self.excise(handle, &ancestors, anchor, pinned(handle));
        }
        removed
    }

    /// Splices the empty node `handle` out of the tree, promoting its in-order
    /// successor (no left subtree) or predecessor into its position.
    fn excise(&mut self, handle: Handle, ancestors: &Path, anchor: T, defer: bool) {
        let node = self.node(handle);
        let (parent, direction, level) = (node.parent(), node.direction(), node.level());
        let (left, right) = (node.left(), node.right());

        // Nodes whose subtrees lost a level, deepest first.
        let mut pending = Path::new();

        let replacement = match (left, right) {
            (None, None) => None,
            (None, Some(right)) => {
                let successor = self.outermost(right, Direction::Left);
                if successor != right {
                    let successor_node = self.node(successor);
                    let successor_parent = successor_node.parent().expect("`RawAaTree::excise()` - orphaned successor!");
                    let successor_right = successor_node.right();
                    if let Some(successor_right) = successor_right {
                        self.node_mut(successor_right).set_parent(Some(successor_parent), Direction::Left);
                    }
                    self.node_mut(successor_parent).set_left(successor_right);
                    self.collect_until(successor_parent, handle, &mut pending);

                    self.node_mut(successor).set_right(Some(right));
                    self.node_mut(right).set_parent(Some(successor), Direction::Right);
                }
                Some(successor)
            }
            (Some(left), right) => {
                let predecessor = self.outermost(left, Direction::Right);
                if predecessor != left {
                    let predecessor_node = self.node(predecessor);
                    let predecessor_parent =
                        predecessor_node.parent().expect("`RawAaTree::excise()` - orphaned predecessor!");
                    let predecessor_left = predecessor_node.left();
                    if let Some(predecessor_left) = predecessor_left {
                        self.node_mut(predecessor_left).set_parent(Some(predecessor_parent), Direction::Right);
                    }
                    self.node_mut(predecessor_parent).set_right(predecessor_left);
                    self.collect_until(predecessor_parent, handle, &mut pending);

                    self.node_mut(predecessor).set_left(Some(left));
                    self.node_mut(left).set_parent(Some(predecessor), Direction::Left);
                }
                self.node_mut(predecessor).set_right(right);
                if let Some(right) = right {
                    self.node_mut(right).set_parent(Some(predecessor), Direction::Right);
                }
                Some(predecessor)
            }
        };

        if let Some(replacement) = replacement {
            let promoted = self.node_mut(replacement);
            promoted.set_parent(parent, direction);
            promoted.set_level(level);
            pending.push(replacement);
        }
        self.attach(parent, direction, replacement);
        pending.extend(ancestors.iter().rev().copied());

        self.nodes.replace(handle, Node::Retired(anchor));
        if defer {
            self.nodes.defer_free(handle);
        } else {
            self.nodes.free(handle);
        }

        for &handle in &pending {
            self.rebalance_after_remove(handle);
        }
    }

    /// Pushes `from` and its ancestors onto `out`, stopping before `until`.
    fn collect_until(&self, from: Handle, until: Handle, out: &mut Path) {
        let mut current = from;
        while current != until {
            out.push(current);
            current = self.node(current).parent().expect("`RawAaTree::collect_until()` - `until` is not an ancestor!");
        }
    }

    /// Locates the first node a walk in `order` visits when starting at `start`.
    ///
    /// Ascending, this is the smallest key at or above `start` (strictly above
    /// for `Excluded`); descending mirrors it. `Unbounded` starts at the edge.
    pub(crate) fn seek<C>(&self, start: Bound<&T>, order: Order, comparator: &C) -> Option<Handle>
    where
        C: Comparator<T> + ?Sized,
    {
        let inclusive = !matches!(start, Bound::Excluded(_));
        let mut current = self.root;
        let mut candidate = None;

        while let Some(handle) = current {
            let node = self.node(handle);
            let ordering = match start {
                Bound::Included(start) | Bound::Excluded(start) => comparator.compare(start, node.key()),
                Bound::Unbounded => match order {
                    Order::Ascending => Less,
                    Order::Descending => Greater,
                },
            };
            current = match (order, ordering) {
                (_, Equal) if inclusive => return Some(handle),
                (Order::Ascending, Less) => {
                    candidate = Some(handle);
                    node.left()
                }
                (Order::Ascending, Equal | Greater) => node.right(),
                (Order::Descending, Greater) => {
                    candidate = Some(handle);
                    node.right()
                }
                (Order::Descending, Equal | Less) => node.left(),
            };
        }
        candidate
    }

    /// Returns the in-order neighbour of a linked node, re-derived from the
    /// current links.
    pub(crate) fn step(&self, handle: Handle, order: Order) -> Option<Handle> {
        let (down, across) = match order {
            Order::Ascending => (Direction::Right, Direction::Left),
            Order::Descending => (Direction::Left, Direction::Right),
        };
        if let Some(child) = self.node(handle).child(down) {
            return Some(self.outermost(child, across));
        }

        let mut current = handle;
        loop {
            let node = self.node(current);
            match node.parent() {
                Some(parent) if node.direction() == down => current = parent,
                parent => return parent,
            }
        }
    }

    /// Every linked node in ascending key order.
    pub(crate) fn in_order(&self) -> Vec<Handle> {
        let mut handles = Vec::new();
        let mut current = self.root.map(|root| self.outermost(root, Direction::Left));
        while let Some(handle) = current {
            handles.push(handle);
            current = self.step(handle, Order::Ascending);
        }
        handles
    }
}
