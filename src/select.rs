use std::cmp::Ordering;

use rand::Rng;

use crate::compare::Compare;
use crate::error::Result;

/// Runs at or below this length are finished off with insertion sort
/// instead of further partitioning.
pub(crate) const SORT_THRESH: usize = 8;

/// Three-way partition of `items` around a uniformly chosen pivot.
///
/// Reorders `items` in place into `[less | equal | greater]` and returns the
/// half-open span of elements equal to the pivot. Every position in that
/// span holds the element a full sort would put there. The uniform pivot
/// choice keeps the expected cost linear regardless of input order; the
/// three-way split keeps it linear on inputs dense with duplicates.
///
/// On a comparator error the slice is left partially rearranged, but still a
/// permutation of its input.
pub(crate) fn partition3<T, C, R>(
    items: &mut [T],
    cmp: &mut C,
    rng: &mut R,
) -> Result<(usize, usize)>
where
    C: Compare<T>,
    R: Rng,
{
    debug_assert!(!items.is_empty());
    let pivot = rng.gen_range(0..items.len());
    items.swap(0, pivot);

    // Dutch-flag pass against the pivot parked at index 0, so the pivot
    // value keeps a stable referent while everything else moves:
    // [pivot | less | equal | unscanned | greater]
    let mut less = 1;
    let mut i = 1;
    let mut greater = items.len();
    while i < greater {
        match cmp.try_cmp(&items[i], &items[0])? {
            Ordering::Less => {
                items.swap(i, less);
                less += 1;
                i += 1;
            }
            Ordering::Equal => i += 1,
            Ordering::Greater => {
                greater -= 1;
                items.swap(i, greater);
            }
        }
    }

    // Park the pivot at the head of its equal span.
    items.swap(0, less - 1);
    Ok((less - 1, greater))
}

/// Insertion sort, for runs too small to be worth partitioning.
pub(crate) fn insertion_sort<T, C>(items: &mut [T], cmp: &mut C) -> Result<()>
where
    C: Compare<T>,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && cmp.try_cmp(&items[j - 1], &items[j])? == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
    Ok(())
}

/// Randomized quicksort over a whole run.
///
/// Used when a caller has asked for an entire range in order, so there is no
/// single target position to chase. Iterates on the larger partition half
/// and recurses only into the smaller, bounding stack depth at O(log n).
pub(crate) fn quicksort<T, C, R>(items: &mut [T], cmp: &mut C, rng: &mut R) -> Result<()>
where
    C: Compare<T>,
    R: Rng,
{
    let mut rest = items;
    loop {
        if rest.len() <= SORT_THRESH {
            return insertion_sort(rest, cmp);
        }
        let (eq_lo, eq_hi) = partition3(rest, cmp, rng)?;
        let run = rest;
        let (left, tail) = run.split_at_mut(eq_lo);
        let right = &mut tail[eq_hi - eq_lo..];
        if left.len() <= right.len() {
            quicksort(left, cmp, rng)?;
            rest = right;
        } else {
            quicksort(right, cmp, rng)?;
            rest = left;
        }
    }
}

/// First index in sorted `items` whose element is not less than `item`.
pub(crate) fn lower_bound<T, C>(items: &[T], item: &T, cmp: &mut C) -> Result<usize>
where
    C: Compare<T>,
{
    let (mut lo, mut hi) = (0, items.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if cmp.try_cmp(&items[mid], item)? == Ordering::Less {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Natural;
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    #[test]
    fn test_partition3_separates_three_ways() {
        let mut rng = SmallRng::seed_from_u64(1);
        for seed in 0..20 {
            let mut xs = vec![5, 3, 8, 5, 1, 5, 9, 2, 5, 7];
            xs.shuffle(&mut SmallRng::seed_from_u64(seed));
            let (lo, hi) = partition3(&mut xs, &mut Natural, &mut rng).unwrap();
            assert!(lo < hi && hi <= xs.len());
            let p = xs[lo];
            for (i, &x) in xs.iter().enumerate() {
                if i < lo {
                    assert!(x < p, "xs = {xs:?}, span = {lo}..{hi}");
                } else if i < hi {
                    assert_eq!(x, p, "xs = {xs:?}, span = {lo}..{hi}");
                } else {
                    assert!(x > p, "xs = {xs:?}, span = {lo}..{hi}");
                }
            }
        }
    }

    #[test]
    fn test_partition3_all_equal() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut xs = vec![4; 7];
        let (lo, hi) = partition3(&mut xs, &mut Natural, &mut rng).unwrap();
        assert_eq!((lo, hi), (0, 7));
    }

    #[test]
    fn test_partition3_single_element() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut xs = vec![42];
        assert_eq!(partition3(&mut xs, &mut Natural, &mut rng), Ok((0, 1)));
    }

    #[test]
    fn test_insertion_sort_sorts() {
        let mut xs = vec![5, 1, 4, 2, 3, 2];
        insertion_sort(&mut xs, &mut Natural).unwrap();
        assert_eq!(xs, vec![1, 2, 2, 3, 4, 5]);
    }

    #[test]
    fn test_insertion_sort_empty_and_single() {
        let mut xs: Vec<i32> = vec![];
        insertion_sort(&mut xs, &mut Natural).unwrap();
        let mut xs = vec![1];
        insertion_sort(&mut xs, &mut Natural).unwrap();
        assert_eq!(xs, vec![1]);
    }

    #[test]
    fn test_quicksort_matches_std_sort() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut xs: Vec<u32> = (0..1000).map(|i| i * 7 % 313).collect();
        xs.shuffle(&mut rng);
        let mut expected = xs.clone();
        expected.sort_unstable();
        quicksort(&mut xs, &mut Natural, &mut rng).unwrap();
        assert_eq!(xs, expected);
    }

    #[test]
    fn test_lower_bound() {
        let xs = vec![1, 3, 3, 5, 7];
        assert_eq!(lower_bound(&xs, &0, &mut Natural), Ok(0));
        assert_eq!(lower_bound(&xs, &3, &mut Natural), Ok(1));
        assert_eq!(lower_bound(&xs, &4, &mut Natural), Ok(3));
        assert_eq!(lower_bound(&xs, &8, &mut Natural), Ok(5));
    }
}
