//! Lazily sorted lists.
//!
//! [`LazySorted`] owns a copy of its input and answers order-statistic and
//! sorted-order queries exactly as a fully sorted copy would, while only
//! doing the partitioning work each query demands. Asking for the median of
//! a million elements costs an expected O(n); asking for everything costs
//! one quicksort; asking twice costs almost nothing the second time.

pub mod compare;
pub mod error;
pub mod lazy;
mod pivots;
mod select;

pub use compare::{ByFn, Compare, Natural, Partial};
pub use error::{Result, SortError};
pub use lazy::{Iter, LazySorted};
