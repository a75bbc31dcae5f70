use std::collections::BTreeMap;

/// Sortedness of the runs on either side of a fence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Flags {
    /// The run ending just before this fence is fully sorted.
    sorted_before: bool,
    /// The run starting just after this fence is fully sorted.
    sorted_after: bool,
}

/// The unresolved run around a queried position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Run {
    /// The position already holds the element a full sort would put there.
    Resolved,
    /// Positions `lo..hi` still need partitioning work.
    Open { lo: usize, hi: usize },
}

/// Tracks which buffer positions have had their final sorted rank determined.
///
/// Fences are resolved positions. They are stored in a coordinate space
/// shifted up by one so that the two sentinels conceptually bounding the
/// buffer (positions `-1` and `n`) are representable in `usize` as `0` and
/// `n + 1`; a real position `p` is stored as `p + 1`. Each fence carries
/// flags recording whether the run on either side of it is fully sorted,
/// which lets a whole region count as resolved without a fence per position.
/// A fence interior to one merged sorted region is dropped.
#[derive(Debug, Clone)]
pub(crate) struct PivotSet {
    len: usize,
    fences: BTreeMap<usize, Flags>,
}

impl PivotSet {
    /// An empty boundary set over a buffer of `len` elements: just the two
    /// sentinels.
    pub fn new(len: usize) -> Self {
        let mut fences = BTreeMap::new();
        fences.insert(0, Flags::default());
        fences.insert(len + 1, Flags::default());
        PivotSet { len, fences }
    }

    /// Locates the unresolved run containing position `k`, or reports the
    /// position resolved. O(log m) in the number of fences.
    ///
    /// Runs of length 0 or 1 count as resolved without any bookkeeping: a
    /// single element wedged between two fences is already in its final
    /// place by the partition invariant.
    pub fn run_containing(&self, k: usize) -> Run {
        debug_assert!(k < self.len);
        let c = k + 1;
        if self.fences.contains_key(&c) {
            return Run::Resolved;
        }
        let (&left, flags) = self.fences.range(..c).next_back().expect("left sentinel");
        let (&right, _) = self.fences.range(c..).next().expect("right sentinel");
        if flags.sorted_after {
            return Run::Resolved;
        }
        let (lo, hi) = (left, right - 1);
        if hi - lo <= 1 {
            Run::Resolved
        } else {
            Run::Open { lo, hi }
        }
    }

    /// True if position `k` conclusively holds its final element.
    pub fn is_resolved(&self, k: usize) -> bool {
        matches!(self.run_containing(k), Run::Resolved)
    }

    /// Records that position `k` holds its final element.
    pub fn insert(&mut self, k: usize) {
        debug_assert!(k < self.len);
        self.fences.entry(k + 1).or_default();
    }

    /// Records a partition step's equal-element span `lo..hi`: every
    /// position in the span holds its final element, and the span interior
    /// is trivially in order.
    pub fn record_span(&mut self, lo: usize, hi: usize) {
        debug_assert!(lo < hi && hi <= self.len);
        self.insert(lo);
        if hi - lo > 1 {
            self.insert(hi - 1);
            self.mark_sorted(lo + 1, hi - 1);
        }
    }

    /// Marks the fence-bounded run `lo..hi` as fully sorted and merges it
    /// with sorted neighbours.
    pub fn mark_sorted(&mut self, lo: usize, hi: usize) {
        let (lc, rc) = (lo, hi + 1);
        debug_assert!(self.fences.contains_key(&lc));
        debug_assert!(self.fences.contains_key(&rc));
        self.fences.get_mut(&lc).expect("left fence").sorted_after = true;
        self.fences.get_mut(&rc).expect("right fence").sorted_before = true;
        self.coalesce(lc);
        self.coalesce(rc);
    }

    /// True if the run starting at position `lo` (a fence coordinate) is
    /// fully sorted.
    pub fn run_is_sorted(&self, lo: usize) -> bool {
        self.fences.get(&lo).map_or(false, |f| f.sorted_after)
    }

    /// Drops a fence that has become interior to one merged sorted region.
    /// The sentinels never qualify: nothing lies before the left one or
    /// after the right one, so each can carry at most one flag.
    fn coalesce(&mut self, c: usize) {
        if let Some(f) = self.fences.get(&c) {
            if f.sorted_before && f.sorted_after {
                self.fences.remove(&c);
            }
        }
    }

    /// The first unsorted run of length > 1 intersecting positions
    /// `from..until`, if any.
    pub fn next_open_gap(&self, from: usize, until: usize) -> Option<(usize, usize)> {
        let start = *self
            .fences
            .range(..=from + 1)
            .next_back()
            .expect("left sentinel")
            .0;
        let mut fences = self.fences.range(start..);
        let mut prev = fences
            .next()
            .map(|(&c, f)| (c, *f))
            .expect("fence at start");
        for (&c, f) in fences {
            let (lo, hi) = (prev.0, c - 1);
            if lo >= until {
                break;
            }
            if hi - lo > 1 && !prev.1.sorted_after {
                return Some((lo, hi));
            }
            prev = (c, *f);
        }
        None
    }

    /// Resolved positions that are fences, ascending. By the partition
    /// invariant their elements are ascending too.
    pub fn positions(&self) -> Vec<usize> {
        self.fences
            .keys()
            .filter(|&&c| c != 0 && c != self.len + 1)
            .map(|&c| c - 1)
            .collect()
    }
}
