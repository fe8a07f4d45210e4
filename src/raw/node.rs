use smallvec::SmallVec;

use super::handle::Handle;

/// Values sharing one comparator-equal key, in insertion order.
pub(crate) type Bucket<T> = SmallVec<[T; 1]>;

/// Which child slot of its parent a node occupies.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    /// The node is its parent's left child.
    Left,
    /// The node is its parent's right child.
    Right,
    /// The node is the root and has no parent.
    Root,
}

pub(crate) enum Node<T> {
    /// A node reachable from the root.
    Linked(LinkedNode<T>),
    /// A spliced-out node kept alive for cursors parked on it. Holds the last
    /// value removed from its bucket so a cursor can seek past it.
    Retired(T),
}

// AA-tree node. `left`/`right` own their subtrees; `parent` is a back link.
pub(crate) struct LinkedNode<T> {
    level: u32,
    left: Option<Handle>,
    right: Option<Handle>,
    parent: Option<Handle>,
    direction: Direction,
    bucket: Bucket<T>,
}

impl<T> Node<T> {
    /// Returns the linked node, panicking if it has been retired.
    pub(crate) fn as_linked(&self) -> &LinkedNode<T> {
        match self {
            Node::Linked(node) => node,
            Node::Retired(_) => panic!("`Node::as_linked()` - node is retired!"),
        }
    }

    /// Returns the linked node mutably, panicking if it has been retired.
    pub(crate) fn as_linked_mut(&mut self) -> &mut LinkedNode<T> {
        match self {
            Node::Linked(node) => node,
            Node::Retired(_) => panic!("`Node::as_linked_mut()` - node is retired!"),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_linked(&self) -> bool {
        matches!(self, Node::Linked(_))
    }
}

impl<T> LinkedNode<T> {
    /// Creates a level-1 leaf holding `value`.
    pub(crate) fn new(value: T, parent: Option<Handle>, direction: Direction) -> Self {
        let mut bucket = Bucket::new();
        bucket.push(value);
        Self {
            level: 1,
            left: None,
            right: None,
            parent,
            direction,
            bucket,
        }
    }

    #[inline]
    pub(crate) fn level(&self) -> u32 {
        self.level
    }

    pub(crate) fn set_level(&mut self, level: u32) {
        self.level = level;
    }

    #[inline]
    pub(crate) fn left(&self) -> Option<Handle> {
        self.left
    }

    pub(crate) fn set_left(&mut self, left: Option<Handle>) {
        self.left = left;
    }

    #[inline]
    pub(crate) fn right(&self) -> Option<Handle> {
        self.right
    }

    pub(crate) fn set_right(&mut self, right: Option<Handle>) {
        self.right = right;
    }

    /// Returns the child in slot `direction`; `Root` has no slot.
    #[inline]
    pub(crate) fn child(&self, direction: Direction) -> Option<Handle> {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::Root => None,
        }
    }

    pub(crate) fn set_child(&mut self, direction: Direction, child: Option<Handle>) {
        match direction {
            Direction::Left => self.left = child,
            Direction::Right => self.right = child,
            Direction::Root => panic!("`LinkedNode::set_child()` - `Root` is not a child slot!"),
        }
    }

    #[inline]
    pub(crate) fn parent(&self) -> Option<Handle> {
        self.parent
    }

    #[inline]
    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    /// Re-homes this node under `parent` in slot `direction`.
    pub(crate) fn set_parent(&mut self, parent: Option<Handle>, direction: Direction) {
        self.parent = parent;
        self.direction = direction;
    }

    /// The representative value every comparison against this node uses.
    #[inline]
    pub(crate) fn key(&self) -> &T {
        &self.bucket[0]
    }

    pub(crate) fn bucket(&self) -> &[T] {
        &self.bucket
    }

    #[inline]
    pub(crate) fn count(&self) -> usize {
        self.bucket.len()
    }

    #[inline]
    pub(crate) fn value(&self, index: usize) -> Option<&T> {
        self.bucket.get(index)
    }

    /// Appends a comparator-equal value behind the ones already stored.
    pub(crate) fn push(&mut self, value: T) {
        self.bucket.push(value);
    }

    /// Removes the first value equal to `value`, preserving the order of the rest.
    pub(crate) fn remove_first(&mut self, value: &T) -> Option<T>
    where
        T: PartialEq,
    {
        let index = self.bucket.iter().position(|v| v == value)?;
        Some(self.bucket.remove(index))
    }

    /// Removes every value equal to `value`. Returns how many were removed and
    /// the last of them, which is what a retired node keeps as its anchor.
    pub(crate) fn remove_all(&mut self, value: &T) -> (usize, Option<T>)
    where
        T: PartialEq,
    {
        let mut removed = 0;
        let mut last = None;
        let mut kept = Bucket::with_capacity(self.bucket.len());
        for v in core::mem::take(&mut self.bucket) {
            if v == *value {
                removed += 1;
                last = Some(v);
            } else {
                kept.push(v);
            }
        }
        self.bucket = kept;
        (removed, last)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bucket.is_empty()
    }
}

impl<T: Clone> Clone for Node<T> {
    fn clone(&self) -> Self {
        match self {
            Node::Linked(node) => Node::Linked(LinkedNode {
                level: node.level,
                left: node.left,
                right: node.right,
                parent: node.parent,
                direction: node.direction,
                bucket: node.bucket.clone(),
            }),
            Node::Retired(anchor) => Node::Retired(anchor.clone()),
        }
    }
}
