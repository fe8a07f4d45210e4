use super::OrderedMultiIndex;
use crate::comparator::NaturalOrder;
use crate::raw::RawAaTree;

impl<T> OrderedMultiIndex<T, NaturalOrder> {
    /// Creates an empty index with room for at least `capacity` distinct keys.
    ///
    /// Values sharing a key share a node, so duplicates do not count against
    /// the capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let index: OrderedMultiIndex<i32> = OrderedMultiIndex::with_capacity(16);
    /// assert!(index.is_empty());
    /// assert!(index.capacity() >= 16);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, NaturalOrder)
    }
}

impl<T, C> OrderedMultiIndex<T, C> {
    /// Creates an empty index ordered by `comparator` with room for at least
    /// `capacity` distinct keys.
    #[must_use]
    pub fn with_capacity_and_comparator(capacity: usize, comparator: C) -> Self {
        let mut index = Self::with_comparator(comparator);
        index.raw = RawAaTree::with_capacity(capacity);
        index
    }

    /// Returns how many nodes the index can hold without reallocating.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let index: OrderedMultiIndex<i32> = OrderedMultiIndex::with_capacity(32);
    /// assert!(index.capacity() >= 32);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Reserves room for at least `additional` more distinct keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use aa_index::OrderedMultiIndex;
    ///
    /// let mut index = OrderedMultiIndex::from([1]);
    /// index.reserve(10);
    /// assert!(index.capacity() >= 11);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        self.raw.reserve(additional);
    }

    /// Releases unused node storage at the end of the arena.
    ///
    /// A removed node that a cursor is still parked on is only released once
    /// that cursor moves on (or is dropped) and the index is next mutated.
    pub fn shrink_to_fit(&mut self) {
        self.raw.shrink_to_fit();
    }
}
