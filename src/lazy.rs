use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::iter::FusedIterator;
use std::ops::Range;

use log::trace;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::compare::{ByFn, Compare, Natural, Partial};
use crate::error::{Result, SortError};
use crate::pivots::{PivotSet, Run};
use crate::select::{insertion_sort, lower_bound, partition3, quicksort, SORT_THRESH};

/// A list that sorts itself lazily, one query at a time.
///
/// `LazySorted` owns a copy of its input and answers order-statistic queries
/// (`at`), sorted slices (`slice`), and ascending iteration exactly as a
/// fully sorted copy would, while only doing the partitioning work each
/// query actually demands. Results of that work are kept, so repeated and
/// overlapping queries get cheaper over time, and querying every position
/// costs no more than one full sort in expectation.
///
/// Queries take `&mut self` because they reorder the internal buffer; the
/// borrow checker thereby enforces the exclusive access a single instance
/// requires.
///
/// # Examples
/// ```
/// use lazysorted::LazySorted;
///
/// let mut ls = LazySorted::new(vec![31, 7, 22, 3, 15]);
/// assert_eq!(ls.len(), 5);
/// assert_eq!(ls.at(2), Ok(&15)); // median, without sorting everything
/// assert_eq!(ls.slice(0..2), Ok(&[3, 7][..]));
/// ```
pub struct LazySorted<T, C = Natural> {
    items: Vec<T>,
    pivots: PivotSet,
    cmp: C,
    rng: SmallRng,
}

impl<T: Ord> LazySorted<T> {
    /// Builds a lazily sorted list from any finite source of elements,
    /// under their natural ordering.
    ///
    /// Construction copies the elements and does no comparison work at all.
    /// An empty source is fine and yields a structure with no queryable
    /// index.
    pub fn new<I>(source: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::with_compare(source, Natural)
    }

    /// Builds from a source that can fail mid-iteration, such as parsed or
    /// streamed input. The first error is returned as-is and no structure
    /// is built.
    pub fn try_new<I, E>(source: I) -> std::result::Result<Self, E>
    where
        I: IntoIterator<Item = std::result::Result<T, E>>,
    {
        let items = source
            .into_iter()
            .collect::<std::result::Result<Vec<_>, E>>()?;
        Ok(Self::new(items))
    }
}

impl<T, F> LazySorted<T, ByFn<F>>
where
    F: FnMut(&T, &T) -> Ordering,
{
    /// Builds a lazily sorted list ordered by a comparison function.
    pub fn by<I>(source: I, cmp: F) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::with_compare(source, ByFn(cmp))
    }
}

impl<T: PartialOrd> LazySorted<T, Partial> {
    /// Builds a lazily sorted list over a partially ordered element type,
    /// such as floats.
    ///
    /// Pairs with no ordering (NaN against anything) surface as
    /// [`SortError::Incomparable`] from whichever query first compares
    /// them, never at construction.
    pub fn partial<I>(source: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::with_compare(source, Partial)
    }
}

impl<T, C: Compare<T>> LazySorted<T, C> {
    /// Builds a lazily sorted list with an explicit [`Compare`] strategy.
    pub fn with_compare<I>(source: I, cmp: C) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = source.into_iter().collect();
        let pivots = PivotSet::new(items.len());
        LazySorted {
            items,
            pivots,
            cmp,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Reseeds the pivot-choice RNG, making partitioning reproducible.
    /// Only meaningful before the first query.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Number of elements. O(1), infallible.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The element that would sit at position `k` if the list were fully
    /// sorted.
    ///
    /// Runs randomized selection confined to the unresolved run around `k`.
    /// Fails with [`SortError::IndexOutOfRange`] when `k >= len`.
    ///
    /// # Examples
    /// ```
    /// use lazysorted::LazySorted;
    ///
    /// let mut ls = LazySorted::new(vec![3, 1, 2]);
    /// assert_eq!(ls.at(0), Ok(&1));
    /// assert_eq!(ls.at(2), Ok(&3));
    /// assert!(ls.at(3).is_err());
    /// ```
    ///
    /// # Complexity
    /// * Expected O(run length) for a fresh position, independent of input
    ///   order thanks to the uniform pivot choice
    /// * O(log m) when the position was already resolved, where m is the
    ///   number of recorded boundaries
    pub fn at(&mut self, k: usize) -> Result<&T> {
        if k >= self.items.len() {
            return Err(SortError::IndexOutOfRange {
                index: k,
                len: self.items.len(),
            });
        }
        self.sort_point(k)?;
        Ok(&self.items[k])
    }

    /// The sorted elements at positions `range`, as a borrowed view.
    ///
    /// Resolves the whole range in one go, quicksorting entire unresolved
    /// runs rather than selecting position by position. Fails with
    /// [`SortError::RangeOutOfRange`] when the range is inverted or extends
    /// past the end.
    pub fn slice(&mut self, range: Range<usize>) -> Result<&[T]> {
        if range.start > range.end || range.end > self.items.len() {
            return Err(SortError::RangeOutOfRange {
                start: range.start,
                end: range.end,
                len: self.items.len(),
            });
        }
        self.sort_range(range.start, range.end)?;
        Ok(&self.items[range])
    }

    /// The elements whose sorted positions fall in `range`, in unspecified
    /// order.
    ///
    /// Only the range endpoints are resolved, so this is much cheaper than
    /// [`slice`](Self::slice) when the interior order does not matter,
    /// e.g. trimming outliers from a sample. Out-of-range bounds clamp to
    /// the length; an empty or inverted range yields an empty slice.
    pub fn between(&mut self, range: Range<usize>) -> Result<&[T]> {
        let n = self.items.len();
        let start = range.start.min(n);
        let end = range.end.min(n);
        if start >= end {
            return Ok(&[]);
        }
        if start > 0 {
            self.sort_point(start)?;
        }
        if end < n {
            self.sort_point(end)?;
        }
        Ok(&self.items[start..end])
    }

    /// Lazily yields the elements in ascending order.
    ///
    /// One-pass and non-restartable: call `iter` again for a fresh
    /// traversal. Driving the iterator resolves positions front to back, so
    /// dropping it after `k` items has only paid for the smallest `k`;
    /// `ls.iter().take(k)` is a top-k query. Elements are cloned out as
    /// they resolve. A comparator error ends the iteration.
    pub fn iter(&mut self) -> Iter<'_, T, C> {
        Iter { ls: self, front: 0 }
    }

    /// Resolves every position and returns the fully sorted buffer.
    pub fn into_sorted_vec(mut self) -> Result<Vec<T>> {
        let n = self.items.len();
        self.sort_range(0, n)?;
        Ok(self.items)
    }

    /// First sorted position holding an element equal to `item`, or `None`.
    ///
    /// Narrows in on `item` by value the same way [`at`](Self::at) narrows
    /// in on a position, so it does not force a full sort either.
    pub fn rank_of(&mut self, item: &T) -> Result<Option<usize>> {
        self.find_first(item)
    }

    /// True if some element equals `item` under the active ordering.
    pub fn contains(&mut self, item: &T) -> Result<bool> {
        Ok(self.find_first(item)?.is_some())
    }

    /// Number of elements equal to `item` under the active ordering.
    pub fn count(&mut self, item: &T) -> Result<usize> {
        let first = match self.find_first(item)? {
            Some(k) => k,
            None => return Ok(0),
        };
        // Every further duplicate lies before the first fence whose value
        // exceeds `item`; fences in between carry equal values.
        let mut stop = self.items.len();
        for f in self.pivots.positions() {
            if f > first && self.cmp.try_cmp(&self.items[f], item)? == Ordering::Greater {
                stop = f;
                break;
            }
        }
        let mut count = 0;
        for i in first..stop {
            if self.cmp.try_cmp(&self.items[i], item)? == Ordering::Equal {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Positions whose final element is already known, ascending.
    ///
    /// Diagnostic aid: lets callers (and tests) observe how much of the
    /// list a sequence of queries actually forced into place.
    pub fn resolved_positions(&self) -> Vec<usize> {
        (0..self.items.len())
            .filter(|&k| self.pivots.is_resolved(k))
            .collect()
    }

    /// Narrows the unresolved run around `k` until position `k` holds its
    /// final element.
    ///
    /// An explicit loop rather than recursion: each partition step shrinks
    /// the run containing `k`, and only that run is pursued. Every step
    /// records the pivot's whole equal span, so the work also benefits
    /// later queries against either side.
    fn sort_point(&mut self, k: usize) -> Result<()> {
        debug_assert!(k < self.items.len());
        loop {
            let (lo, hi) = match self.pivots.run_containing(k) {
                Run::Resolved => return Ok(()),
                Run::Open { lo, hi } => (lo, hi),
            };
            if hi - lo <= SORT_THRESH {
                insertion_sort(&mut self.items[lo..hi], &mut self.cmp)?;
                self.pivots.mark_sorted(lo, hi);
                return Ok(());
            }
            let (a, b) = partition3(&mut self.items[lo..hi], &mut self.cmp, &mut self.rng)?;
            let (a, b) = (lo + a, lo + b);
            trace!("partitioned run {lo}..{hi}: equal span {a}..{b}, target {k}");
            self.pivots.record_span(a, b);
            if (a..b).contains(&k) {
                return Ok(());
            }
        }
    }

    /// Fully sorts every open run intersecting positions `start..end`.
    ///
    /// Pins both endpoints with point selections, then quicksorts whole
    /// runs; since the caller wants the entire range in order there is
    /// nothing to be lazy about inside it.
    fn sort_range(&mut self, start: usize, end: usize) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        self.sort_point(start)?;
        if end < self.items.len() {
            self.sort_point(end)?;
        }
        while let Some((lo, hi)) = self.pivots.next_open_gap(start, end) {
            trace!("sorting whole run {lo}..{hi}");
            quicksort(&mut self.items[lo..hi], &mut self.cmp, &mut self.rng)?;
            self.pivots.mark_sorted(lo, hi);
        }
        Ok(())
    }

    /// First sorted position of `item`, resolving only what the search
    /// touches.
    fn find_first(&mut self, item: &T) -> Result<Option<usize>> {
        let n = self.items.len();
        if n == 0 {
            return Ok(None);
        }

        // Bracket `item` between adjacent fences by value: fences hold
        // resolved positions, so their elements ascend with position.
        let fences = self.pivots.positions();
        let (mut fl, mut fh) = (0, fences.len());
        while fl < fh {
            let mid = fl + (fh - fl) / 2;
            if self.cmp.try_cmp(&self.items[fences[mid]], item)? == Ordering::Less {
                fl = mid + 1;
            } else {
                fh = mid;
            }
        }
        // Everything left of `lo` is strictly less than `item`; the fence
        // at `hi` (if any) is the first with value >= `item`.
        let mut lo = if fl == 0 { 0 } else { fences[fl - 1] + 1 };
        let mut hi = fences.get(fl).copied().unwrap_or(n);

        loop {
            if hi - lo > SORT_THRESH && !self.pivots.run_is_sorted(lo) {
                let (a, b) = partition3(&mut self.items[lo..hi], &mut self.cmp, &mut self.rng)?;
                let (a, b) = (lo + a, lo + b);
                self.pivots.record_span(a, b);
                match self.cmp.try_cmp(&self.items[a], item)? {
                    // Everything before the equal span in this run is
                    // strictly less, so `a` is the first occurrence.
                    Ordering::Equal => return Ok(Some(a)),
                    Ordering::Less => lo = b,
                    Ordering::Greater => hi = a,
                }
            } else {
                if hi - lo > 1 && !self.pivots.run_is_sorted(lo) {
                    insertion_sort(&mut self.items[lo..hi], &mut self.cmp)?;
                    self.pivots.mark_sorted(lo, hi);
                }
                let idx = lo + lower_bound(&self.items[lo..hi], item, &mut self.cmp)?;
                if idx < hi && self.cmp.try_cmp(&self.items[idx], item)? == Ordering::Equal {
                    return Ok(Some(idx));
                }
                // The run exhausted below `item`; the right fence itself may
                // hold it.
                if idx == hi
                    && hi < n
                    && self.cmp.try_cmp(&self.items[hi], item)? == Ordering::Equal
                {
                    return Ok(Some(hi));
                }
                return Ok(None);
            }
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for LazySorted<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySorted")
            .field("len", &self.items.len())
            .field("pivots", &self.pivots)
            .finish_non_exhaustive()
    }
}

impl<T: Ord> FromIterator<T> for LazySorted<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<T: Ord> From<Vec<T>> for LazySorted<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

/// Keys only; values are dropped.
impl<K: Ord, V, S> From<HashMap<K, V, S>> for LazySorted<K> {
    fn from(map: HashMap<K, V, S>) -> Self {
        Self::new(map.into_keys())
    }
}

/// Keys only; values are dropped.
impl<K: Ord, V> From<BTreeMap<K, V>> for LazySorted<K> {
    fn from(map: BTreeMap<K, V>) -> Self {
        Self::new(map.into_keys())
    }
}

impl<'a, T: Clone, C: Compare<T>> IntoIterator for &'a mut LazySorted<T, C> {
    type Item = Result<T>;
    type IntoIter = Iter<'a, T, C>;

    fn into_iter(self) -> Iter<'a, T, C> {
        self.iter()
    }
}

/// Lazy ascending iterator over a [`LazySorted`] list.
///
/// Created by [`LazySorted::iter`]. Resolves one position per step and
/// clones the element out; dropping it early leaves the tail unresolved.
pub struct Iter<'a, T, C = Natural> {
    ls: &'a mut LazySorted<T, C>,
    front: usize,
}

impl<T: Clone, C: Compare<T>> Iterator for Iter<'_, T, C> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.ls.len() {
            return None;
        }
        let k = self.front;
        match self.ls.sort_point(k) {
            Ok(()) => {
                self.front += 1;
                Some(Ok(self.ls.items[k].clone()))
            }
            Err(e) => {
                self.front = self.ls.len();
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // A comparator error can cut the sequence short, so only the upper
        // bound is firm.
        (0, Some(self.ls.len() - self.front))
    }
}

impl<T: Clone, C: Compare<T>> FusedIterator for Iter<'_, T, C> {}
