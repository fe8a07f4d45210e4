//! Ordering strategies for [`OrderedMultiIndex`](crate::OrderedMultiIndex).
//!
//! The index never calls `Ord` directly; it asks its comparator. Values the
//! comparator reports as [`Equal`](Ordering::Equal) share a node and keep
//! their insertion order.
//!
//! It is a logic error for a comparator to not be a total preorder (for
//! example, to report `a < b` and `b < a`). The resulting tree shape is
//! unspecified, but the index stays memory-safe.

use core::cmp::Ordering;
use core::fmt;

/// A three-way comparison over `T`.
///
/// Any `Fn(&T, &T) -> Ordering` closure is a comparator.
///
/// # Examples
///
/// ```
/// use core::cmp::Ordering;
/// use aa_index::OrderedMultiIndex;
///
/// // First element ascending, then second element descending.
/// let mut index = OrderedMultiIndex::with_comparator(|a: &(i32, char), b: &(i32, char)| {
///     a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1))
/// });
/// index.insert((5, 'c'));
/// index.insert((5, 'q'));
/// index.insert((1, 'a'));
///
/// let values: Vec<_> = index.iter().copied().collect();
/// assert_eq!(values, [(1, 'a'), (5, 'q'), (5, 'c')]);
/// ```
pub trait Comparator<T: ?Sized> {
    /// Compares `a` with `b`.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T: ?Sized, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Orders values by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct NaturalOrder;

impl<T: ?Sized + Ord> Comparator<T> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Orders values by the natural order of a key extracted from each of them.
///
/// # Examples
///
/// ```
/// use aa_index::{ByKey, OrderedMultiIndex};
///
/// #[derive(Debug, PartialEq)]
/// struct Employee {
///     id: u32,
///     name: &'static str,
///     salary: u32,
/// }
///
/// let mut staff = OrderedMultiIndex::with_comparator(ByKey::new(|e: &Employee| (e.salary, e.name)));
/// staff.insert(Employee { id: 1, name: "John", salary: 1000 });
/// staff.insert(Employee { id: 2, name: "Alice", salary: 1000 });
/// staff.insert(Employee { id: 3, name: "Paul", salary: 900 });
///
/// let ids: Vec<_> = staff.iter().map(|e| e.id).collect();
/// assert_eq!(ids, [3, 2, 1]);
/// ```
#[derive(Clone, Copy, Default)]
pub struct ByKey<F> {
    key: F,
}

impl<F> ByKey<F> {
    /// Wraps a key extraction function.
    pub const fn new(key: F) -> Self {
        Self { key }
    }
}

impl<T: ?Sized, K: Ord, F> Comparator<T> for ByKey<F>
where
    F: Fn(&T) -> K,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.key)(a).cmp(&(self.key)(b))
    }
}

impl<F> fmt::Debug for ByKey<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByKey").finish_non_exhaustive()
    }
}
