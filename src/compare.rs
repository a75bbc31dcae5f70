use std::cmp::Ordering;

use crate::error::{Result, SortError};

/// An ordering strategy for the elements of a [`LazySorted`](crate::LazySorted) list.
///
/// Comparison is fallible: a comparator may refuse to order a pair of
/// elements, in which case the in-progress query is abandoned and the error
/// propagates to the caller. Comparators may carry state, so `try_cmp` takes
/// `&mut self`.
pub trait Compare<T> {
    /// Orders `a` relative to `b`.
    fn try_cmp(&mut self, a: &T, b: &T) -> Result<Ordering>;
}

/// Natural ordering through [`Ord`]. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct Natural;

impl<T: Ord> Compare<T> for Natural {
    #[inline]
    fn try_cmp(&mut self, a: &T, b: &T) -> Result<Ordering> {
        Ok(a.cmp(b))
    }
}

/// Ordering through a caller-supplied comparison function. Never fails.
#[derive(Debug, Clone, Copy)]
pub struct ByFn<F>(pub F);

impl<T, F> Compare<T> for ByFn<F>
where
    F: FnMut(&T, &T) -> Ordering,
{
    #[inline]
    fn try_cmp(&mut self, a: &T, b: &T) -> Result<Ordering> {
        Ok((self.0)(a, b))
    }
}

/// Ordering through [`PartialOrd`].
///
/// Fails with [`SortError::Incomparable`] on pairs with no ordering, such as
/// floating-point NaN.
#[derive(Debug, Default, Clone, Copy)]
pub struct Partial;

impl<T: PartialOrd> Compare<T> for Partial {
    #[inline]
    fn try_cmp(&mut self, a: &T, b: &T) -> Result<Ordering> {
        a.partial_cmp(b)
            .ok_or_else(|| SortError::incomparable("partial_cmp returned no ordering"))
    }
}
