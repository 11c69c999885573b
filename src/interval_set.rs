//! Ordered interval collections and the set algebra on them.
//!
//! `IntervalSet` is a plain ordered list that may be unsorted and contain
//! overlaps. Set operations take their second operand as a
//! [`MergedIntervals`], which can only be obtained by merging or by a
//! checked conversion, so the sorted-and-merged precondition is carried by
//! the type.

use crate::chromosome::ChromosomeOrder;
use crate::config::MergeOptions;
use crate::genome::Genome;
use crate::interval::{same_range, Interval, IntervalError, Result};
use crate::parallel::{chromosome_blocks, sort_intervals, sort_intervals_by};
use rustc_hash::{FxHashMap, FxHashSet};
use std::ops::{Deref, Index, IndexMut, Range};

/// An ordered collection of intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            intervals: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    #[inline]
    pub fn push(&mut self, interval: Interval) {
        self.intervals.push(interval);
    }

    /// Checked element access.
    pub fn get(&self, index: usize) -> Result<&Interval> {
        self.intervals.get(index).ok_or(IntervalError::Index {
            index,
            len: self.intervals.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    /// Mutable iteration. Only annotations are writable on `Interval`.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Interval> {
        self.intervals.iter_mut()
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn into_vec(self) -> Vec<Interval> {
        self.intervals
    }

    /// Append all intervals of `other`.
    pub fn add(&mut self, other: &IntervalSet) {
        self.intervals.extend_from_slice(&other.intervals);
    }

    /// Total number of bases covered, counting overlapping bases repeatedly.
    pub fn base_count(&self) -> u64 {
        self.intervals.iter().map(Interval::len).sum()
    }

    /// Distinct chromosome names in order of first appearance.
    pub fn chromosomes(&self) -> Vec<&str> {
        let mut seen = FxHashSet::default();
        let mut names = Vec::new();
        for interval in &self.intervals {
            if seen.insert(interval.chrom()) {
                names.push(interval.chrom());
            }
        }
        names
    }

    /// Linear scan for any interval overlapping the range.
    pub fn overlaps_with(&self, chrom: &str, start: u64, end: u64) -> bool {
        self.intervals
            .iter()
            .any(|i| i.overlaps_with(chrom, start, end))
    }

    pub fn clear_annotations(&mut self) {
        for interval in &mut self.intervals {
            interval.annotations.clear();
        }
    }

    // --- ordering ---

    /// Stable sort by chromosome, start and end.
    pub fn sort(&mut self) {
        sort_intervals(&mut self.intervals);
    }

    /// Sort and drop intervals with the same chromosome, start and end as
    /// their predecessor. The first occurrence and its annotations survive.
    pub fn sort_unique(&mut self) {
        self.sort();
        self.dedup_adjacent();
    }

    /// Drop intervals with the same range as their direct predecessor.
    /// Works under any sort order that groups equal ranges.
    pub fn dedup_adjacent(&mut self) {
        self.intervals.dedup_by(|next, kept| same_range(next, kept));
    }

    /// Sort with chromosomes arranged by `order`, then start and end.
    pub fn sort_by_order(&mut self, order: &ChromosomeOrder) {
        sort_intervals_by(&mut self.intervals, |a, b| {
            order
                .compare(a.chrom(), b.chrom())
                .then(a.start().cmp(&b.start()))
                .then(a.end().cmp(&b.end()))
        });
    }

    /// Sort by position and use the name column as the final tie-breaker.
    pub fn sort_with_name(&mut self) {
        sort_intervals_by(&mut self.intervals, |a, b| {
            a.cmp_position(b).then_with(|| a.name().cmp(&b.name()))
        });
    }

    /// Drop consecutive duplicates of a sorted set.
    pub fn remove_duplicates(&mut self) -> Result<()> {
        if !self.is_sorted() {
            return Err(IntervalError::PreconditionViolation(
                "remove_duplicates requires a sorted interval set".to_string(),
            ));
        }
        self.dedup_adjacent();
        Ok(())
    }

    /// Sorted by chromosome, start and end; annotations are ignored.
    pub fn is_sorted(&self) -> bool {
        self.intervals
            .windows(2)
            .all(|w| w[0].cmp_position(&w[1]) != std::cmp::Ordering::Greater)
    }

    /// True if no two intervals overlap, regardless of order.
    pub fn is_merged(&self) -> bool {
        let mut order: Vec<&Interval> = self.intervals.iter().collect();
        order.sort_by(|a, b| a.cmp_position(b));
        order
            .windows(2)
            .all(|w| w[0].chrom() != w[1].chrom() || w[0].end() < w[1].start())
    }

    /// Sorted and free of overlaps. Back-to-back intervals are allowed.
    pub fn is_merged_and_sorted(&self) -> bool {
        self.is_merged_and_sorted_with(false)
    }

    /// Sorted and free of overlaps; with `back_to_back` touching intervals
    /// also count as unmerged.
    pub fn is_merged_and_sorted_with(&self, back_to_back: bool) -> bool {
        self.intervals.windows(2).all(|w| {
            let (a, b) = (&w[0], &w[1]);
            match a.chrom().cmp(b.chrom()) {
                std::cmp::Ordering::Less => true,
                std::cmp::Ordering::Greater => false,
                std::cmp::Ordering::Equal => {
                    a.end() < b.start() && !(back_to_back && a.end() + 1 == b.start())
                }
            }
        })
    }

    // --- merging ---

    /// Merge overlapping (and optionally touching) intervals in place.
    /// The result is sorted.
    pub fn merge(&mut self, options: MergeOptions) {
        let mut intervals = std::mem::take(&mut self.intervals);
        if !intervals
            .windows(2)
            .all(|w| w[0].cmp_position(&w[1]) != std::cmp::Ordering::Greater)
        {
            sort_intervals(&mut intervals);
        }
        self.intervals = merge_sorted(intervals, options);
    }

    /// Merge and wrap the result, so it can serve as a set-operation operand.
    pub fn into_merged(mut self, options: MergeOptions) -> MergedIntervals {
        self.merge(options);
        MergedIntervals::new_unchecked(self)
    }

    // --- set algebra ---

    /// Replace each interval by its parts that lie inside `other`.
    ///
    /// Pieces of one interval appear in `other` order; intervals without
    /// overlap are dropped. Annotations are kept on every piece.
    pub fn intersect(&mut self, other: &MergedIntervals) {
        let mut cursor = SweepCursor::new(other);
        let mut result = Vec::with_capacity(self.intervals.len());
        for interval in &self.intervals {
            for hit in cursor.overlapping(interval) {
                if let Some(piece) = interval.clipped(hit.start(), hit.end()) {
                    result.push(piece);
                }
            }
        }
        self.intervals = result;
    }

    /// Replace each interval by its parts not covered by `other`, left to right.
    pub fn subtract(&mut self, other: &MergedIntervals) {
        let mut cursor = SweepCursor::new(other);
        let mut result = Vec::with_capacity(self.intervals.len());
        for interval in std::mem::take(&mut self.intervals) {
            let hits = cursor.overlapping(&interval);
            if hits.is_empty() {
                result.push(interval);
                continue;
            }

            // first uncovered position, None once the chromosome end is covered
            let mut pos = Some(interval.start());
            for hit in hits {
                let Some(p) = pos else { break };
                if hit.start() > p {
                    result.extend(interval.clipped(p, hit.start() - 1));
                }
                pos = hit.end().checked_add(1).map(|next| next.max(p));
            }
            if let Some(p) = pos {
                result.extend(interval.clipped(p, interval.end()));
            }
        }
        self.intervals = result;
    }

    /// Keep only intervals that overlap `other`.
    pub fn overlapping(&mut self, other: &MergedIntervals) {
        let mut cursor = SweepCursor::new(other);
        self.intervals
            .retain(|interval| !cursor.overlapping(interval).is_empty());
    }

    // --- resizing ---

    /// Grow every interval by `n` bases on both sides (start clamped to 1).
    pub fn extend(&mut self, n: u64) -> Result<()> {
        if n == 0 {
            return Err(IntervalError::InvalidArgument(
                "extend requires a positive number of bases".to_string(),
            ));
        }
        for interval in &mut self.intervals {
            interval.extend(n);
        }
        Ok(())
    }

    /// Shrink every interval by `n` bases on both sides; intervals that
    /// would become inverted are removed.
    pub fn shrink(&mut self, n: u64) -> Result<()> {
        if n == 0 {
            return Err(IntervalError::InvalidArgument(
                "shrink requires a positive number of bases".to_string(),
            ));
        }
        let intervals = std::mem::take(&mut self.intervals);
        self.intervals = intervals.into_iter().filter_map(|i| i.shrink(n)).collect();
        Ok(())
    }

    /// Clip intervals to the chromosome sizes of `genome`. Intervals on
    /// unknown chromosomes are kept; intervals starting past the
    /// chromosome end are removed.
    pub fn clamp_to_genome(&mut self, genome: &Genome) {
        let intervals = std::mem::take(&mut self.intervals);
        self.intervals = intervals
            .into_iter()
            .filter_map(|i| match genome.chrom_size(i.chrom()) {
                Some(size) if i.end() > size => i.clipped(i.start(), size),
                _ => Some(i),
            })
            .collect();
    }

    /// Split intervals longer than `size` into near-equal consecutive pieces.
    ///
    /// The piece count is whichever of `len / size` (rounded down) or one
    /// more gives pieces closer to `size`; the remainder is spread one base
    /// at a time over the pieces.
    pub fn chunk(&mut self, size: u64) -> Result<()> {
        if size == 0 {
            return Err(IntervalError::InvalidArgument(
                "chunk size must be positive".to_string(),
            ));
        }
        let mut result = Vec::with_capacity(self.intervals.len());
        for interval in std::mem::take(&mut self.intervals) {
            if interval.len() <= size {
                result.push(interval);
                continue;
            }
            for (start, end) in chunk_bounds(interval.start(), interval.len(), size) {
                result.push(Interval::from_valid(
                    interval.chrom(),
                    start,
                    end,
                    interval.annotations.clone(),
                ));
            }
        }
        self.intervals = result;
        Ok(())
    }
}

fn chunk_bounds(start: u64, len: u64, size: u64) -> Vec<(u64, u64)> {
    let length = len as f64;
    let target = size as f64;
    let mut n = len / size;
    if (target - length / n as f64).abs() > (target - length / (n + 1) as f64).abs() {
        n += 1;
    }

    let n = n as usize;
    let mut sizes = vec![size as i64; n];
    let mut rest = len as i64 - (n as i64) * (size as i64);
    let mut current = 0;
    while rest != 0 {
        let step = rest.signum();
        sizes[current] += step;
        rest -= step;
        current = (current + 1) % n;
    }

    let mut bounds = Vec::with_capacity(n);
    let mut pos = start;
    for piece in sizes {
        let end = pos + piece as u64 - 1;
        bounds.push((pos, end));
        pos = end + 1;
    }
    bounds
}

/// Single linear sweep over a sorted vector.
fn merge_sorted(intervals: Vec<Interval>, options: MergeOptions) -> Vec<Interval> {
    let mut result = Vec::new();
    let mut iter = intervals.into_iter();
    let Some(first) = iter.next() else {
        return result;
    };

    let mut chrom = first.chrom().to_string();
    let mut start = first.start();
    let mut end = first.end();
    let mut names = vec![name_of(&first)];

    for interval in iter {
        let joins = interval.chrom() == chrom
            && (interval.start() <= end
                || (options.merge_back_to_back && interval.start() == end.saturating_add(1)));

        if joins {
            end = end.max(interval.end());
            if options.merge_names {
                let name = name_of(&interval);
                if !options.unique_names || !names.contains(&name) {
                    names.push(name);
                }
            }
        } else {
            result.push(merged_interval(&chrom, start, end, &names, options));
            if interval.chrom() != chrom {
                chrom = interval.chrom().to_string();
            }
            start = interval.start();
            end = interval.end();
            names.clear();
            names.push(name_of(&interval));
        }
    }
    result.push(merged_interval(&chrom, start, end, &names, options));
    result
}

fn name_of(interval: &Interval) -> String {
    interval.name().unwrap_or_default().to_string()
}

fn merged_interval(
    chrom: &str,
    start: u64,
    end: u64,
    names: &[String],
    options: MergeOptions,
) -> Interval {
    let annotations = if options.merge_names {
        vec![names.join(",")]
    } else {
        Vec::new()
    };
    Interval::from_valid(chrom, start, end, annotations)
}

impl From<Vec<Interval>> for IntervalSet {
    fn from(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }
}

impl FromIterator<Interval> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        Self {
            intervals: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for IntervalSet {
    type Item = Interval;
    type IntoIter = std::vec::IntoIter<Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.into_iter()
    }
}

impl<'a> IntoIterator for &'a IntervalSet {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

impl Index<usize> for IntervalSet {
    type Output = Interval;

    fn index(&self, index: usize) -> &Interval {
        &self.intervals[index]
    }
}

impl IndexMut<usize> for IntervalSet {
    fn index_mut(&mut self, index: usize) -> &mut Interval {
        &mut self.intervals[index]
    }
}

/// A sorted interval set without overlaps.
///
/// Dereferences to the underlying [`IntervalSet`] for read access.
#[derive(Debug, Clone, Default)]
pub struct MergedIntervals {
    set: IntervalSet,
    blocks: FxHashMap<String, Range<usize>>,
}

impl MergedIntervals {
    fn new_unchecked(set: IntervalSet) -> Self {
        let blocks = chromosome_blocks(set.as_slice()).into_iter().collect();
        Self { set, blocks }
    }

    /// The intervals on one chromosome, sorted by position.
    pub fn block(&self, chrom: &str) -> &[Interval] {
        match self.blocks.get(chrom) {
            Some(range) => &self.set.as_slice()[range.clone()],
            None => &[],
        }
    }

    pub fn as_set(&self) -> &IntervalSet {
        &self.set
    }

    pub fn into_inner(self) -> IntervalSet {
        self.set
    }
}

impl Deref for MergedIntervals {
    type Target = IntervalSet;

    fn deref(&self) -> &IntervalSet {
        &self.set
    }
}

impl TryFrom<IntervalSet> for MergedIntervals {
    type Error = IntervalError;

    fn try_from(set: IntervalSet) -> Result<Self> {
        if !set.is_merged_and_sorted() {
            return Err(IntervalError::PreconditionViolation(
                "interval set must be merged and sorted".to_string(),
            ));
        }
        Ok(Self::new_unchecked(set))
    }
}

/// Per-chromosome position into a merged operand.
///
/// Moves forward while the queried starts are non-decreasing and falls
/// back to a binary search when they go backwards or the chromosome changes.
struct SweepCursor<'a> {
    other: &'a MergedIntervals,
    chrom: String,
    block: &'a [Interval],
    last_start: u64,
    pos: usize,
}

impl<'a> SweepCursor<'a> {
    fn new(other: &'a MergedIntervals) -> Self {
        Self {
            other,
            chrom: String::new(),
            block: &[],
            last_start: 0,
            pos: 0,
        }
    }

    /// All intervals of the merged operand overlapping `query`, in order.
    fn overlapping(&mut self, query: &Interval) -> &'a [Interval] {
        if self.chrom != query.chrom() {
            self.chrom.clear();
            self.chrom.push_str(query.chrom());
            self.block = self.other.block(query.chrom());
            self.pos = self.block.partition_point(|b| b.end() < query.start());
        } else if query.start() < self.last_start {
            self.pos = self.block.partition_point(|b| b.end() < query.start());
        } else {
            while self.pos < self.block.len() && self.block[self.pos].end() < query.start() {
                self.pos += 1;
            }
        }
        self.last_start = query.start();

        let block: &'a [Interval] = self.block;
        let first = self.pos;
        let mut last = first;
        while last < block.len() && block[last].start() <= query.end() {
            last += 1;
        }
        &block[first..last]
    }
}
