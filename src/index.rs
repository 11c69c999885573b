//! Interval indexing for fast overlap queries.

use crate::interval::Interval;
use crate::interval_set::IntervalSet;
use rustc_hash::FxHashMap;

/// Positions of one chromosome's intervals, sorted by start then end.
#[derive(Debug, Default)]
struct ChromEntries {
    indices: Vec<usize>,
    max_len: u64,
}

/// Overlap index over an [`IntervalSet`].
///
/// The set may be unsorted and contain overlaps. The index borrows the set,
/// so the set cannot be modified while the index is alive.
#[derive(Debug)]
pub struct ChromosomalIndex<'a> {
    set: &'a IntervalSet,
    by_chrom: FxHashMap<&'a str, ChromEntries>,
}

impl<'a> ChromosomalIndex<'a> {
    /// Build an index from an interval set.
    pub fn new(set: &'a IntervalSet) -> Self {
        let mut by_chrom: FxHashMap<&'a str, ChromEntries> = FxHashMap::default();

        for (idx, interval) in set.iter().enumerate() {
            let entries = by_chrom.entry(interval.chrom()).or_default();
            entries.indices.push(idx);
            entries.max_len = entries.max_len.max(interval.len());
        }

        for entries in by_chrom.values_mut() {
            entries.indices.sort_by(|&a, &b| {
                let (a, b) = (&set[a], &set[b]);
                a.start().cmp(&b.start()).then(a.end().cmp(&b.end()))
            });
        }

        Self { set, by_chrom }
    }

    /// The indexed set.
    pub fn set(&self) -> &'a IntervalSet {
        self.set
    }

    /// Indices of all intervals overlapping `[start, end]` on `chrom`.
    ///
    /// Lazy: candidates begin at the first interval whose start is at least
    /// `start - max_len` (no earlier interval can reach `start`) and the scan
    /// stops at the first interval starting after `end`.
    pub fn regions_overlapping<'s>(
        &'s self,
        chrom: &str,
        start: u64,
        end: u64,
    ) -> impl Iterator<Item = usize> + 's {
        let set: &'s IntervalSet = self.set;
        let candidates: &[usize] = match self.by_chrom.get(chrom) {
            Some(entries) => {
                let lower = start.saturating_sub(entries.max_len);
                let first = entries
                    .indices
                    .partition_point(|&i| set[i].start() < lower);
                &entries.indices[first..]
            }
            None => &[],
        };

        candidates
            .iter()
            .copied()
            .take_while(move |&i| set[i].start() <= end)
            .filter(move |&i| set[i].end() >= start)
    }

    /// Index of the first overlapping interval in start order.
    pub fn first_overlapping(&self, chrom: &str, start: u64, end: u64) -> Option<usize> {
        self.regions_overlapping(chrom, start, end).next()
    }

    pub fn has_overlap(&self, chrom: &str, start: u64, end: u64) -> bool {
        self.first_overlapping(chrom, start, end).is_some()
    }

    /// All overlapping indices, sorted by start position of the intervals.
    pub fn matching_indices(&self, chrom: &str, start: u64, end: u64) -> Vec<usize> {
        self.regions_overlapping(chrom, start, end).collect()
    }

    /// Intervals overlapping another interval.
    pub fn overlapping_intervals<'q>(
        &'q self,
        query: &Interval,
    ) -> impl Iterator<Item = &'a Interval> + 'q {
        let set: &'a IntervalSet = self.set;
        self.regions_overlapping(query.chrom(), query.start(), query.end())
            .map(move |i| &set[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[(&str, u64, u64)]) -> IntervalSet {
        items
            .iter()
            .map(|&(c, s, e)| Interval::new(c, s, e).unwrap())
            .collect()
    }

    #[test]
    fn test_basic_overlap() {
        let s = set(&[("chr1", 100, 200), ("chr1", 300, 400), ("chr2", 100, 200)]);
        let index = ChromosomalIndex::new(&s);

        assert_eq!(index.matching_indices("chr1", 150, 350), vec![0, 1]);
        assert_eq!(index.matching_indices("chr1", 201, 299), Vec::<usize>::new());
        assert_eq!(index.matching_indices("chr2", 200, 200), vec![2]);
        assert!(!index.has_overlap("chr3", 1, 1000));
    }

    #[test]
    fn test_unsorted_and_overlapping_input() {
        // a long interval early in start order must still be found
        let s = set(&[("chr1", 500, 510), ("chr1", 1, 1000), ("chr1", 400, 450), ("chr1", 2, 3)]);
        let index = ChromosomalIndex::new(&s);

        assert_eq!(index.matching_indices("chr1", 505, 505), vec![1, 0]);
        assert_eq!(index.first_overlapping("chr1", 420, 430), Some(1));
        assert_eq!(index.matching_indices("chr1", 1001, 2000), Vec::<usize>::new());
    }

    #[test]
    fn test_matches_linear_scan() {
        let s = set(&[
            ("chr1", 10, 20),
            ("chr1", 15, 90),
            ("chr1", 30, 35),
            ("chr1", 50, 50),
            ("chr1", 88, 120),
        ]);
        let index = ChromosomalIndex::new(&s);

        for start in 1..130 {
            for end in start..(start + 15) {
                let mut got = index.matching_indices("chr1", start, end);
                got.sort_unstable();
                let expected: Vec<usize> = (0..s.len())
                    .filter(|&i| s[i].overlaps_with("chr1", start, end))
                    .collect();
                assert_eq!(got, expected, "query {}-{}", start, end);
            }
        }
    }

    #[test]
    fn test_overlapping_intervals() {
        let s = set(&[("chr1", 100, 200)]);
        let index = ChromosomalIndex::new(&s);
        let query = Interval::new("chr1", 200, 300).unwrap();
        let hits: Vec<_> = index.overlapping_intervals(&query).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(index.set().len(), 1);
    }
}
