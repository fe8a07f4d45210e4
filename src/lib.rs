//! An ordered multi-index backed by an AA tree.
//!
//! This crate provides [`OrderedMultiIndex`], a sorted container that keeps
//! duplicates, orders values with a pluggable [`Comparator`] and can be walked
//! in either direction by a [`Cursor`] that tolerates changes to the index
//! between steps.
//!
//! # Example
//!
//! ```
//! use core::ops::Bound::{Excluded, Included, Unbounded};
//! use aa_index::OrderedMultiIndex;
//!
//! let mut index = OrderedMultiIndex::from([45, -45, 67, -67, 123, -123]);
//! index.insert(45);
//! assert_eq!(index.len(), 7);
//!
//! // Smallest value strictly above 45 and largest value at or below 0.
//! assert_eq!(index.min(Excluded(&45)), Some(&67));
//! assert_eq!(index.max(Included(&0)), Some(&-45));
//!
//! // Walk forward from -67 and drop every negative value on the way.
//! let mut cursor = index.forward_from(Included(&-67), Unbounded);
//! let mut seen = Vec::new();
//! while let Some(&v) = cursor.next(&index) {
//!     seen.push(v);
//!     if v < 0 {
//!         index.remove(&v);
//!     }
//! }
//! assert_eq!(seen, [-67, -45, 45, 45, 67, 123]);
//! assert_eq!(index.first(), Some(&-123));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Duplicates** - Comparator-equal values share one node, in insertion order
//! - **Mutation-tolerant cursors** - Insert and remove while a walk is in progress
//! - **No unsafe code** - Nodes live in an arena and link to each other by handle
//!
//! # Implementation
//!
//! The tree is an AA tree: a red-black tree whose red links may only lean
//! right, which reduces rebalancing to two operations, `skew` and `split`.
//! A node removed while a cursor is parked on it is retired rather than freed,
//! so the cursor can find its way back into the tree on its next step. Every
//! other removed node is freed at once.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
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

mod raw;

pub mod comparator;
pub mod multi_index;

pub use comparator::{ByKey, Comparator, NaturalOrder};
pub use multi_index::{Cursor, NodeView, OrderedMultiIndex, Range};
pub use raw::Direction;
