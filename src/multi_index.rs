//! An ordered multiset backed by an AA-tree.

use alloc::vec::Vec;
use core::fmt;
use core::ops::Bound;

use crate::comparator::{Comparator, NaturalOrder};
use crate::raw::{Order, RawAaTree};

mod capacity;
mod cursor;
mod nodes;
mod pins;

pub use cursor::{Cursor, Range};
pub use nodes::NodeView;
use pins::Pins;

/// An ordered multiset based on a self-balancing AA-tree.
///
/// Values are ordered by a [`Comparator`] chosen at construction time
/// ([`NaturalOrder`] by default). Values the comparator considers equal are all
/// kept; they share one tree node and are visited in insertion order.
///
/// Walks are driven by [`Cursor`]s, which do not borrow the index between
/// steps. The index may therefore be mutated while a walk is in progress, and
/// the walk continues from the live tree: removed values are not revisited,
/// and values still ahead of the cursor are not skipped.
///
/// It is a logic error for a value to be modified in such a way that its
/// ordering relative to any other value, as determined by the comparator,
/// changes while it is in the index. Remove it, change it, and insert it again.
///
/// # Examples
///
/// ```
/// use core::ops::Bound::{Excluded, Included, Unbounded};
/// use aa_index::OrderedMultiIndex;
///
/// let mut index = OrderedMultiIndex::new();
/// index.insert(123);
/// index.insert(45);
/// assert_eq!(index.max(Included(&100)), Some(&45));
/// assert_eq!(index.min(Included(&100)), Some(&123));
///
/// index.insert(67);
/// assert_eq!(index.max(Included(&67)), Some(&67));
/// assert_eq!(index.max(Excluded(&67)), Some(&45));
/// assert_eq!(index.max(Excluded(&45)), None);
///
/// // Mirror every value while walking the index.
/// let mut cursor = index.forward_from(Unbounded, Unbounded);
/// while let Some(&v) = cursor.next(&index) {
///     index.insert(-v);
/// }
/// let values: Vec<_> = index.iter().copied().collect();
/// assert_eq!(values, [-123, -67, -45, 45, 67, 123]);
/// ```
pub struct OrderedMultiIndex<T, C = NaturalOrder> {
    raw: RawAaTree<T>,
    comparator: C,
    /// Which slots live cursors are parked on. Removed nodes in those slots
    /// are retired instead of freed.
    pins: Pins,
}

impl<T> OrderedMultiIndex<T> {
    /// Makes a new, empty index ordered by [`Ord`].
    ///
    /// Does not allocate node storage until values are inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let mut index = OrderedMultiIndex::new();
    /// index.insert(1);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<T, C> OrderedMultiIndex<T, C> {
    /// Makes a new, empty index ordered by `comparator`.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let mut index = OrderedMultiIndex::with_comparator(|a: &i32, b: &i32| b.cmp(a));
    /// index.extend([1, 3, 2]);
    /// assert_eq!(index.iter().copied().collect::<Vec<_>>(), [3, 2, 1]);
    /// ```
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            raw: RawAaTree::new(),
            comparator,
            pins: Pins::new(0),
        }
    }

    /// Returns the number of values in the index, duplicates included.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let index = OrderedMultiIndex::from([1, 1, 2]);
    /// assert_eq!(index.len(), 3);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the index contains no values.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the comparator ordering this index.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns the AA level of the root node, or `0` when empty.
    ///
    /// The level is at most `log2(n + 1)` for `n` distinct keys.
    #[must_use]
    pub fn root_level(&self) -> u32 {
        self.raw.root_level()
    }

    /// Removes every value.
    ///
    /// Cursors created before the call are exhausted: they yield nothing more.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::ops::Bound::Unbounded;
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let mut index = OrderedMultiIndex::from([1, 2]);
    /// let mut cursor = index.forward_from(Unbounded, Unbounded);
    /// index.clear();
    /// assert!(index.is_empty());
    /// assert_eq!(cursor.next(&index), None);
    /// ```
    pub fn clear(&mut self) {
        self.pins = Pins::new(0);
        self.raw.clear();
    }

    /// Returns the live nodes in ascending key order.
    ///
    /// Intended for diagnostics and visualisation, e.g. dumping the tree shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let index = OrderedMultiIndex::from([2, 1, 2, 3]);
    /// let dump: Vec<_> = index
    ///     .nodes()
    ///     .iter()
    ///     .map(|n| (*n.key(), n.values().len(), n.depth()))
    ///     .collect();
    /// assert_eq!(dump, [(1, 1, 1), (2, 2, 0), (3, 1, 1)]);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n)
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeView<'_, T>> {
        self.raw.in_order().into_iter().map(|handle| NodeView::new(&self.raw, handle)).collect()
    }

    pub(crate) fn raw(&self) -> &RawAaTree<T> {
        &self.raw
    }

    pub(crate) fn pins(&self) -> &Pins {
        &self.pins
    }

    /// Frees retired nodes no cursor is parked on any more.
    fn collect_retired(&mut self) {
        if self.raw.retired_len() > 0 {
            let pins = &self.pins;
            self.raw.release_retired(|slot| pins.is_pinned(slot));
        }
    }
}

impl<T, C: Comparator<T>> OrderedMultiIndex<T, C> {
    /// Makes an index ordered by `comparator` holding `values`, inserted one by
    /// one in iteration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::{ByKey, OrderedMultiIndex};
    ///
    /// let index = OrderedMultiIndex::from_values_with(ByKey::new(|s: &&str| s.len()), ["ccc", "a", "bb", "b"]);
    /// assert_eq!(index.iter().copied().collect::<Vec<_>>(), ["a", "b", "bb", "ccc"]);
    /// ```
    #[must_use]
    pub fn from_values_with<I: IntoIterator<Item = T>>(comparator: C, values: I) -> Self {
        let mut index = Self::with_comparator(comparator);
        index.extend(values);
        index
    }

    /// Adds a value to the index.
    ///
    /// A value comparing equal to stored ones is placed after them.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::{ByKey, OrderedMultiIndex};
    ///
    /// let mut index = OrderedMultiIndex::with_comparator(ByKey::new(|v: &(i32, &str)| v.0));
    /// index.insert((1, "first"));
    /// index.insert((0, "zero"));
    /// index.insert((1, "second"));
    /// assert_eq!(
    ///     index.iter().map(|v| v.1).collect::<Vec<_>>(),
    ///     ["zero", "first", "second"]
    /// );
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, value: T) {
        self.collect_retired();
        self.raw.insert(value, &self.comparator);
        self.pins.cover(self.raw.extent(), self.raw.capacity());
    }

    /// Removes the first stored value equal to `value`.
    ///
    /// The comparator locates the key; `PartialEq` then picks the value, so a
    /// value that merely compares equal to stored ones removes nothing.
    /// Returns whether a value was removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::{ByKey, OrderedMultiIndex};
    ///
    /// let mut index = OrderedMultiIndex::with_comparator(ByKey::new(|v: &(i32, &str)| v.0));
    /// index.insert((5, "kept"));
    /// assert!(!index.remove(&(5, "never inserted")));
    /// assert!(index.remove(&(5, "kept")));
    /// assert!(index.is_empty());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n + k) for a bucket of k equal keys.
    pub fn remove(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.collect_retired();
        let pins = &self.pins;
        self.raw.remove(value, false, &self.comparator, |slot| pins.is_pinned(slot)) == 1
    }

    /// Removes every stored value equal to `value`, returning how many were removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let mut index = OrderedMultiIndex::from([1, 2, 2, 3, 2]);
    /// assert_eq!(index.remove_all(&2), 3);
    /// assert_eq!(index.remove_all(&2), 0);
    /// assert_eq!(index.len(), 2);
    /// ```
    pub fn remove_all(&mut self, value: &T) -> usize
    where
        T: PartialEq,
    {
        self.collect_retired();
        let pins = &self.pins;
        self.raw.remove(value, true, &self.comparator, |slot| pins.is_pinned(slot))
    }

    /// Returns `true` if a value equal to `value` is stored.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::{ByKey, OrderedMultiIndex};
    ///
    /// let index = OrderedMultiIndex::from_values_with(ByKey::new(|v: &(u8, u8)| v.0), [(1, 1)]);
    /// assert!(index.contains(&(1, 1)));
    /// assert!(!index.contains(&(1, 2)));
    /// ```
    #[must_use]
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.raw
            .search(value, &self.comparator)
            .is_some_and(|handle| self.raw.node(handle).bucket().contains(value))
    }

    /// Returns how many stored values compare equal to `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let index = OrderedMultiIndex::from([4, 4, 5]);
    /// assert_eq!(index.count(&4), 2);
    /// assert_eq!(index.count(&6), 0);
    /// ```
    #[must_use]
    pub fn count(&self, value: &T) -> usize {
        self.raw.search(value, &self.comparator).map_or(0, |handle| self.raw.node(handle).count())
    }

    /// Returns the smallest value within `limit`.
    ///
    /// `Included(x)` finds the smallest value not less than `x`, `Excluded(x)`
    /// the smallest value greater than `x`, and `Unbounded` the smallest value
    /// overall. Among equal values the earliest inserted is returned.
    ///
    /// This is the first value of [`forward_from(limit, Unbounded)`](Self::forward_from).
    ///
    /// # Examples
    ///
    /// ```
    /// use core::ops::Bound::{Excluded, Included, Unbounded};
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let index = OrderedMultiIndex::from([10, 20, 30]);
    /// assert_eq!(index.min(Unbounded), Some(&10));
    /// assert_eq!(index.min(Included(&20)), Some(&20));
    /// assert_eq!(index.min(Excluded(&20)), Some(&30));
    /// assert_eq!(index.min(Excluded(&30)), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn min(&self, limit: Bound<&T>) -> Option<&T> {
        self.forward_from(limit, Bound::Unbounded).attach(self).next()
    }

    /// Returns the largest value within `limit`.
    ///
    /// Mirrors [`min`](Self::min). Among equal values the earliest inserted is
    /// returned, as that is the first one a backward walk visits.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::ops::Bound::{Excluded, Included, Unbounded};
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let index = OrderedMultiIndex::from([10, 20, 30]);
    /// assert_eq!(index.max(Unbounded), Some(&30));
    /// assert_eq!(index.max(Included(&25)), Some(&20));
    /// assert_eq!(index.max(Excluded(&20)), Some(&10));
    /// assert_eq!(index.max(Excluded(&10)), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn max(&self, limit: Bound<&T>) -> Option<&T> {
        self.backward_from(limit, Bound::Unbounded).attach(self).next()
    }

    /// Returns the smallest value, or `None` if the index is empty.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.min(Bound::Unbounded)
    }

    /// Returns the largest value, or `None` if the index is empty.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.max(Bound::Unbounded)
    }

    /// Creates a cursor walking values in ascending order.
    ///
    /// The walk starts at `start` (`Unbounded` for the smallest value) and
    /// ends before the first key beyond `stop`. Equal values are visited in
    /// insertion order. Every call returns an independent cursor.
    ///
    /// The cursor does not borrow the index, so values may be inserted or
    /// removed between calls to [`Cursor::next`].
    ///
    /// # Examples
    ///
    /// ```
    /// use core::ops::Bound::{Excluded, Included, Unbounded};
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let mut index = OrderedMultiIndex::from([1, 2, 3, 99, 100, 101]);
    ///
    /// let range: Vec<_> = index.forward_from(Included(&2), Excluded(&100)).attach(&index).copied().collect();
    /// assert_eq!(range, [2, 3, 99]);
    ///
    /// // Removing each value as it is yielded does not disturb the walk.
    /// let mut seen = Vec::new();
    /// let mut cursor = index.forward_from(Included(&2), Unbounded);
    /// while let Some(&v) = cursor.next(&index) {
    ///     seen.push(v);
    ///     index.remove(&v);
    /// }
    /// assert_eq!(seen, [2, 3, 99, 100, 101]);
    /// assert_eq!(index.len(), 1);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n) to create; each step is amortized O(1), O(log n) worst case.
    pub fn forward_from<'q>(&self, start: Bound<&T>, stop: Bound<&'q T>) -> Cursor<'q, T> {
        let first = self.raw.seek(start, Order::Ascending, &self.comparator);
        Cursor::new(Order::Ascending, first, stop, &self.pins)
    }

    /// Creates a cursor walking values in descending order.
    ///
    /// Mirrors [`forward_from`](Self::forward_from): the walk starts at the
    /// largest value within `start` and ends before the first key below
    /// `stop`. Equal values are still visited in insertion order.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::ops::Bound::{Included, Unbounded};
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let index = OrderedMultiIndex::from([45, 67, 123]);
    /// let values: Vec<_> = index.backward_from(Included(&100), Unbounded).attach(&index).copied().collect();
    /// assert_eq!(values, [67, 45]);
    /// ```
    pub fn backward_from<'q>(&self, start: Bound<&T>, stop: Bound<&'q T>) -> Cursor<'q, T> {
        let first = self.raw.seek(start, Order::Descending, &self.comparator);
        Cursor::new(Order::Descending, first, stop, &self.pins)
    }

    /// Gets an iterator over every value in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let index = OrderedMultiIndex::from([3, 1, 2]);
    /// let mut iter = index.iter();
    /// assert_eq!(iter.next(), Some(&1));
    /// assert_eq!(iter.next(), Some(&2));
    /// assert_eq!(iter.next(), Some(&3));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn iter(&self) -> Range<'_, T, C> {
        self.forward_from(Bound::Unbounded, Bound::Unbounded).attach(self)
    }
}

impl<T: Clone, C: Clone> Clone for OrderedMultiIndex<T, C> {
    /// Clones the values and comparator. Cursors stay with the original.
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            comparator: self.comparator.clone(),
            pins: Pins::new(self.raw.extent()),
        }
    }
}

impl<T: fmt::Debug, C: Comparator<T>> fmt::Debug for OrderedMultiIndex<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Default for OrderedMultiIndex<T> {
    fn default() -> Self {
        OrderedMultiIndex::new()
    }
}

impl<T: PartialEq, C: Comparator<T>> PartialEq for OrderedMultiIndex<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, C: Comparator<T>> Eq for OrderedMultiIndex<T, C> {}

impl<T: Ord> FromIterator<T> for OrderedMultiIndex<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut index = OrderedMultiIndex::new();
        index.extend(iter);
        index
    }
}

impl<T, C: Comparator<T>> Extend<T> for OrderedMultiIndex<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T: 'a + Copy, C: Comparator<T>> Extend<&'a T> for OrderedMultiIndex<T, C> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for &value in iter {
            self.insert(value);
        }
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for OrderedMultiIndex<T> {
    fn from(arr: [T; N]) -> Self {
        arr.into_iter().collect()
    }
}

impl<'a, T, C: Comparator<T>> IntoIterator for &'a OrderedMultiIndex<T, C> {
    type Item = &'a T;
    type IntoIter = Range<'a, T, C>;

    fn into_iter(self) -> Range<'a, T, C> {
        self.iter()
    }
}
