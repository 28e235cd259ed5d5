//! Interval merging for page and time ranges.
//!
//! Pages are discrete: `[1,3]` and `[4,6]` touch and merge into `[1,6]`.
//! Time is continuous: `[1.0,3.0]` and `[3.0,5.0]` merge, `[1.0,3.0]` and
//! `[3.5,5.0]` do not.

use std::cmp::Ordering;

/// A numeric bound type with its own adjacency rule.
pub trait Bound: Copy + PartialOrd {
    /// Whether an interval starting at `next_start` continues one ending at `end`.
    fn adjoins(end: Self, next_start: Self) -> bool;
}

impl Bound for i64 {
    fn adjoins(end: Self, next_start: Self) -> bool {
        next_start <= end.saturating_add(1)
    }
}

impl Bound for f64 {
    fn adjoins(end: Self, next_start: Self) -> bool {
        next_start <= end
    }
}

/// A closed interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<T> {
    pub start: T,
    pub end: T,
}

impl<T: Bound> Interval<T> {
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }

    /// Build an interval from optional bounds. Both must be present and
    /// ordered; anything else is not an interval.
    pub fn from_bounds(start: Option<T>, end: Option<T>) -> Option<Self> {
        match (start, end) {
            (Some(start), Some(end)) if start <= end => Some(Self { start, end }),
            _ => None,
        }
    }
}

/// Merge intervals into the minimal sorted list covering the same points.
pub fn merge<T: Bound>(mut intervals: Vec<Interval<T>>) -> Vec<Interval<T>> {
    intervals.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));

    let mut merged: Vec<Interval<T>> = Vec::with_capacity(intervals.len());
    let mut current: Option<Interval<T>> = None;

    for next in intervals {
        current = match current {
            None => Some(next),
            Some(mut acc) if T::adjoins(acc.end, next.start) => {
                if next.end > acc.end {
                    acc.end = next.end;
                }
                Some(acc)
            }
            Some(acc) => {
                merged.push(acc);
                Some(next)
            }
        };
    }

    merged.extend(current);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(pairs: &[(i64, i64)]) -> Vec<Interval<i64>> {
        pairs.iter().map(|&(s, e)| Interval::new(s, e)).collect()
    }

    fn times(pairs: &[(f64, f64)]) -> Vec<Interval<f64>> {
        pairs.iter().map(|&(s, e)| Interval::new(s, e)).collect()
    }

    /// Deterministic pseudo-random page sets.
    fn page_sets() -> Vec<Vec<Interval<i64>>> {
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = move |bound: u64| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) % bound
        };
        (0..200)
            .map(|_| {
                let n = next(8) as usize;
                (0..n)
                    .map(|_| {
                        let start = next(50) as i64;
                        let len = next(6) as i64;
                        Interval::new(start, start + len)
                    })
                    .collect()
            })
            .collect()
    }

    /// Deterministic pseudo-random time sets on a half-second grid.
    fn time_sets() -> Vec<Vec<Interval<f64>>> {
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = move |bound: u64| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) % bound
        };
        (0..200)
            .map(|_| {
                let n = next(8) as usize;
                (0..n)
                    .map(|_| {
                        let start = next(100) as f64 / 2.0;
                        let len = next(12) as f64 / 2.0;
                        Interval::new(start, start + len)
                    })
                    .collect()
            })
            .collect()
    }

    fn covers<T: PartialOrd + Copy>(intervals: &[Interval<T>], point: T) -> bool {
        intervals.iter().any(|i| i.start <= point && point <= i.end)
    }

    #[test]
    fn empty_input() {
        assert!(merge::<i64>(vec![]).is_empty());
        assert!(merge::<f64>(vec![]).is_empty());
    }

    #[test]
    fn single_interval_unchanged() {
        assert_eq!(merge(pages(&[(4, 9)])), pages(&[(4, 9)]));
    }

    #[test]
    fn adjacent_pages_merge() {
        assert_eq!(
            merge(pages(&[(1, 3), (4, 6), (10, 12)])),
            pages(&[(1, 6), (10, 12)])
        );
    }

    #[test]
    fn unordered_and_contained_pages() {
        assert_eq!(
            merge(pages(&[(10, 12), (2, 8), (3, 4), (1, 1)])),
            pages(&[(1, 8), (10, 12)])
        );
    }

    #[test]
    fn touching_times_merge_without_gap_closing() {
        assert_eq!(
            merge(times(&[(1.0, 3.0), (3.0, 5.0), (10.0, 11.0)])),
            times(&[(1.0, 5.0), (10.0, 11.0)])
        );
        assert_eq!(
            merge(times(&[(1.0, 3.0), (3.5, 5.0)])),
            times(&[(1.0, 3.0), (3.5, 5.0)])
        );
    }

    #[test]
    fn overlapping_times_take_max_end() {
        assert_eq!(
            merge(times(&[(0.0, 10.0), (2.0, 4.0)])),
            times(&[(0.0, 10.0)])
        );
    }

    #[test]
    fn page_adjacency_at_max_does_not_overflow() {
        assert_eq!(
            merge(pages(&[(i64::MAX - 1, i64::MAX), (i64::MAX, i64::MAX)])),
            pages(&[(i64::MAX - 1, i64::MAX)])
        );
    }

    #[test]
    fn from_bounds_rejects_partial_and_reversed() {
        assert_eq!(
            Interval::<i64>::from_bounds(Some(1), Some(3)),
            Some(Interval::new(1, 3))
        );
        assert_eq!(Interval::<i64>::from_bounds(Some(1), None), None);
        assert_eq!(Interval::<i64>::from_bounds(None, Some(3)), None);
        assert_eq!(Interval::<i64>::from_bounds(Some(5), Some(3)), None);
        assert_eq!(
            Interval::<f64>::from_bounds(Some(0.0), Some(0.0)),
            Some(Interval::new(0.0, 0.0))
        );
    }

    #[test]
    fn merged_output_is_sorted_and_separated() {
        for input in page_sets() {
            let out = merge(input);
            for pair in out.windows(2) {
                assert!(pair[0].end + 1 < pair[1].start, "not separated: {pair:?}");
            }
        }
    }

    #[test]
    fn merge_preserves_covered_pages() {
        for input in page_sets() {
            let out = merge(input.clone());
            for point in -1..60 {
                assert_eq!(covers(&input, point), covers(&out, point), "point {point}");
            }
        }
    }

    #[test]
    fn merge_is_idempotent() {
        for input in page_sets() {
            let once = merge(input);
            let twice = merge(once.clone());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn merged_times_are_sorted_and_separated() {
        for input in time_sets() {
            let out = merge(input);
            for pair in out.windows(2) {
                assert!(pair[0].end < pair[1].start, "not separated: {pair:?}");
            }
        }
    }

    #[test]
    fn merge_preserves_covered_times() {
        for input in time_sets() {
            let out = merge(input.clone());
            for step in -4..240 {
                let point = step as f64 / 4.0;
                assert_eq!(covers(&input, point), covers(&out, point), "point {point}");
            }
        }
    }

    #[test]
    fn time_merge_is_idempotent() {
        for input in time_sets() {
            let once = merge(input);
            let twice = merge(once.clone());
            assert_eq!(once, twice);
        }
    }
}
