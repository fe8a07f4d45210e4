use core::cmp::Ordering::{Greater, Less};
use core::fmt;
use core::iter::FusedIterator;
use core::ops::Bound;

use super::OrderedMultiIndex;
use super::pins::{Pin, Pins};
use crate::comparator::Comparator;
use crate::raw::{Handle, Node, Order};

/// A restartable, mutation-tolerant walk over an [`OrderedMultiIndex`].
///
/// This `struct` is created by [`OrderedMultiIndex::forward_from`] and
/// [`OrderedMultiIndex::backward_from`]. It remembers only the node it is on,
/// its position inside that node's bucket and the stop bound. Each call to
/// [`next`](Cursor::next) re-derives the following node from the index as it
/// is *now*, so the index may be changed between calls:
///
/// - values removed before the cursor reaches them are not yielded;
/// - removing the value the cursor is on moves the walk to its live neighbour;
/// - values appended to the bucket being walked are yielded if the cursor has
///   not yet left that bucket.
///
/// A cursor only walks the index that created it. Against any other index, or
/// after [`OrderedMultiIndex::clear`], it yields nothing.
///
/// While it lives, a cursor keeps the one node it is parked on from being
/// reused. Once finished it holds nothing.
///
/// # Examples
///
/// ```
/// use core::ops::Bound::{Excluded, Included, Unbounded};
/// use aa_index::OrderedMultiIndex;
///
/// let mut index = OrderedMultiIndex::from([1, 2, 3, 99, 100, 101]);
/// let mut seen = Vec::new();
/// let mut cursor = index.forward_from(Included(&2), Unbounded);
/// while let Some(&v) = cursor.next(&index) {
///     seen.push(v);
///     // Drop the value right after the current one.
///     if let Some(&next) = index.min(Excluded(&v)) {
///         index.remove(&next);
///     }
/// }
/// assert_eq!(seen, [2, 99, 101]);
/// ```
#[must_use = "cursors are lazy and do nothing unless stepped"]
pub struct Cursor<'q, T> {
    order: Order,
    position: Position,
    stop: Bound<&'q T>,
    /// Held on the slot of `position`; `None` once the walk is done.
    pin: Option<Pin>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Position {
    /// On `handle`; the next value to yield is `bucket[offset]`.
    At { handle: Handle, offset: usize },
    Done,
}

impl<'q, T> Cursor<'q, T> {
    pub(super) fn new(order: Order, first: Option<Handle>, stop: Bound<&'q T>, pins: &Pins) -> Self {
        let mut cursor = Self {
            order,
            position: Position::Done,
            stop,
            pin: None,
        };
        cursor.move_to(first, pins);
        cursor
    }

    /// Parks on the start of `handle`'s bucket, or finishes the walk.
    fn move_to(&mut self, handle: Option<Handle>, pins: &Pins) {
        match handle {
            Some(handle) => {
                pins.park(&mut self.pin, handle);
                self.position = Position::At { handle, offset: 0 };
            }
            None => self.finish(),
        }
    }

    fn finish(&mut self) {
        self.position = Position::Done;
        self.pin = None;
    }

    /// Returns `true` once the walk has ended; `next` will keep returning `None`.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.position == Position::Done
    }

    /// Advances the walk and returns the next value of `index`.
    ///
    /// # Complexity
    ///
    /// Amortized O(1); O(log n) when the walk crosses a subtree boundary or
    /// resumes from a removed node.
    pub fn next<'a, C>(&mut self, index: &'a OrderedMultiIndex<T, C>) -> Option<&'a T>
    where
        C: Comparator<T>,
    {
        if !self.pin.as_ref().is_some_and(|pin| index.pins().owns(pin)) {
            self.finish();
            return None;
        }

        let raw = index.raw();
        loop {
            let Position::At { handle, offset } = self.position else {
                return None;
            };
            match raw.slot(handle) {
                Some(Node::Linked(node)) => {
                    if let Some(value) = node.value(offset) {
                        if offset == 0 && self.is_past_stop(node.key(), index.comparator()) {
                            self.finish();
                            return None;
                        }
                        self.position = Position::At {
                            handle,
                            offset: offset + 1,
                        };
                        return Some(value);
                    }
                    self.move_to(raw.step(handle, self.order), index.pins());
                }
                // Spliced out while we were parked on it; resume past its key.
                Some(Node::Retired(anchor)) => {
                    let next = raw.seek(Bound::Excluded(anchor), self.order, index.comparator());
                    self.move_to(next, index.pins());
                }
                None => self.finish(),
            }
        }
    }

    /// Binds the cursor to `index`, producing a borrowing iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::ops::Bound::{Excluded, Included};
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let index = OrderedMultiIndex::from([-123, -67, -45, 45, 67, 123]);
    /// let values: Vec<_> = index.forward_from(Included(&-100), Excluded(&0)).attach(&index).collect();
    /// assert_eq!(values, [&-67, &-45]);
    /// ```
    pub fn attach<'a, C>(self, index: &'a OrderedMultiIndex<T, C>) -> Range<'a, T, C>
    where
        'q: 'a,
        C: Comparator<T>,
    {
        Range { cursor: self, index }
    }

    fn is_past_stop<C: Comparator<T>>(&self, key: &T, comparator: &C) -> bool {
        let (stop, inclusive) = match self.stop {
            Bound::Unbounded => return false,
            Bound::Included(stop) => (stop, true),
            Bound::Excluded(stop) => (stop, false),
        };
        let beyond = match self.order {
            Order::Ascending => Greater,
            Order::Descending => Less,
        };
        let ordering = comparator.compare(key, stop);
        ordering == beyond || (ordering.is_eq() && !inclusive)
    }
}

impl<T> Clone for Cursor<'_, T> {
    /// Forks the walk; both cursors continue independently from here.
    fn clone(&self) -> Self {
        Self {
            order: self.order,
            position: self.position,
            stop: self.stop,
            pin: self.pin.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("order", &self.order)
            .field("position", &self.position)
            .field("stop", &self.stop)
            .finish()
    }
}

/// A borrowing iterator over a walk of an [`OrderedMultiIndex`].
///
/// This `struct` is created by [`Cursor::attach`] and
/// [`OrderedMultiIndex::iter`]. The index cannot change while it is borrowed,
/// so use a bare [`Cursor`] when mutating between steps.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, T, C> {
    cursor: Cursor<'a, T>,
    index: &'a OrderedMultiIndex<T, C>,
}

impl<'a, T, C: Comparator<T>> Iterator for Range<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.cursor.next(self.index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.cursor.is_finished() {
            (0, Some(0))
        } else {
            (0, Some(self.index.len()))
        }
    }
}

impl<T, C: Comparator<T>> FusedIterator for Range<'_, T, C> {}

impl<T, C> Clone for Range<'_, T, C> {
    fn clone(&self) -> Self {
        Range {
            cursor: self.cursor.clone(),
            index: self.index,
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for Range<'_, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Range").field("cursor", &self.cursor).finish_non_exhaustive()
    }
}
