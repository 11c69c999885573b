//! Parallel processing utilities using Rayon.
//!
//! All interval operations are chromosome-local, so work is split by
//! chromosome and results are concatenated in a deterministic order.

use crate::interval::Interval;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::ops::Range;

/// Minimum number of intervals before enabling parallelization.
/// Below this threshold, sequential processing is faster due to
/// thread spawn overhead.
pub const PARALLEL_THRESHOLD: usize = 10_000;

/// Stable sort, parallel for large inputs.
pub fn sort_intervals_by<F>(intervals: &mut [Interval], compare: F)
where
    F: Fn(&Interval, &Interval) -> Ordering + Sync,
{
    if intervals.len() < PARALLEL_THRESHOLD {
        intervals.sort_by(compare);
    } else {
        intervals.par_sort_by(compare);
    }
}

/// Stable sort by chromosome, start and end.
pub fn sort_intervals(intervals: &mut [Interval]) {
    sort_intervals_by(intervals, Interval::cmp_position);
}

/// Contiguous per-chromosome index ranges of a chromosome-grouped slice.
///
/// A chromosome that appears in several separate runs yields several ranges.
pub fn chromosome_blocks(intervals: &[Interval]) -> Vec<(String, Range<usize>)> {
    let mut blocks: Vec<(String, Range<usize>)> = Vec::new();
    let mut begin = 0;
    for i in 1..=intervals.len() {
        if i == intervals.len() || intervals[i].chrom() != intervals[begin].chrom() {
            blocks.push((intervals[begin].chrom().to_string(), begin..i));
            begin = i;
        }
    }
    blocks
}
