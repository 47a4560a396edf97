//! Static interval index for overlap and point queries.
//!
//! Intervals are half-open `[start, end)`. Lookups are served by a
//! [`rust_lapper::Lapper`] holding positions into the start-sorted interval
//! list, so payloads need no trait bounds and results come back in start
//! order (input order among equal starts).
//!
//! Intervals with `start > end` are rejected at build time and never show up
//! in query results; see [`IntervalIndex::rejected`].

use rust_lapper::Lapper;

/// An interval carrying a payload value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval<T> {
    pub start: i64,
    pub end: i64,
    pub val: T,
}

impl<T> Interval<T> {
    pub fn new(start: i64, end: i64, val: T) -> Self {
        Interval { start, end, val }
    }

    /// True when the interval satisfies `start <= end`.
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

/// Order-preserving map of signed coordinates onto lapper's unsigned axis.
fn to_key(x: i64) -> u64 {
    (x as u64) ^ (1 << 63)
}

/// Immutable interval index; rebuild it for every chromosome/strand subset.
#[derive(Debug, Clone)]
pub struct IntervalIndex<T> {
    intervals: Vec<Interval<T>>,
    lapper: Lapper<u64, usize>,
    rejected: Vec<Interval<T>>,
}

impl<T> IntervalIndex<T> {
    /// Build an index from a list of intervals.
    ///
    /// Intervals with equal starts keep their input order.
    pub fn build(intervals: Vec<Interval<T>>) -> Self {
        let (mut intervals, rejected): (Vec<_>, Vec<_>) =
            intervals.into_iter().partition(Interval::is_valid);
        intervals.sort_by_key(|iv| iv.start);

        let entries = intervals
            .iter()
            .enumerate()
            .map(|(pos, iv)| rust_lapper::Interval {
                start: to_key(iv.start),
                stop: to_key(iv.end),
                val: pos,
            })
            .collect();

        IntervalIndex {
            intervals,
            lapper: Lapper::new(entries),
            rejected,
        }
    }

    /// Number of indexed intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Intervals that were refused at build time because `start > end`.
    pub fn rejected(&self) -> &[Interval<T>] {
        &self.rejected
    }

    /// All intervals with `start < hi` and `end > lo`, in start order.
    ///
    /// An empty query range (`lo >= hi`) matches nothing.
    pub fn find(&self, lo: i64, hi: i64) -> Vec<&Interval<T>> {
        if lo >= hi || self.intervals.is_empty() {
            return Vec::new();
        }
        let mut positions: Vec<usize> = self
            .lapper
            .find(to_key(lo), to_key(hi))
            .map(|hit| hit.val)
            .collect();
        positions.sort_unstable();
        positions.into_iter().map(|pos| &self.intervals[pos]).collect()
    }

    /// All intervals with `start <= p < end`, in start order.
    pub fn find_point(&self, p: i64) -> Vec<&Interval<T>> {
        self.find(p, p.saturating_add(1))
    }
}
