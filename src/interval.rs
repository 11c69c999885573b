//! Core interval type for genomic region representation.
//!
//! Coordinates are 1-based and fully closed: `[start, end]` covers
//! `end - start + 1` bases. Conversion from/to the 0-based half-open BED
//! on-disk format happens in [`crate::bed`].

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Errors raised by interval construction and interval-set operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    #[error("Invalid interval {chrom}:{start}-{end} (start after end)")]
    InvalidInterval { chrom: String, start: u64, end: u64 },

    #[error("Invalid interval {chrom}:{start}-{end} (positions are 1-based, start must be at least 1)")]
    ZeroStart { chrom: String, start: u64, end: u64 },

    #[error("Index {index} out of range (length {len})")]
    Index { index: usize, len: usize },

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, IntervalError>;

/// A genomic interval with chromosome, start, end and annotation columns.
///
/// `1 <= start <= end` holds for every constructed value; the coordinate fields
/// are private so the invariant cannot be broken from outside.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    chrom: String,
    start: u64,
    end: u64,
    /// BED columns 4 and following, in file order.
    pub annotations: Vec<String>,
}

impl Interval {
    /// Create a new interval without annotations.
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Result<Self> {
        Self::with_annotations(chrom, start, end, Vec::new())
    }

    /// Create a new interval carrying the given annotation columns.
    pub fn with_annotations(
        chrom: impl Into<String>,
        start: u64,
        end: u64,
        annotations: Vec<String>,
    ) -> Result<Self> {
        let chrom = chrom.into();
        if start == 0 {
            return Err(IntervalError::ZeroStart { chrom, start, end });
        }
        if start > end {
            return Err(IntervalError::InvalidInterval { chrom, start, end });
        }
        Ok(Self {
            chrom,
            start,
            end,
            annotations,
        })
    }

    /// Build an interval from bounds already known to satisfy `start <= end`.
    #[inline]
    pub(crate) fn from_valid(chrom: &str, start: u64, end: u64, annotations: Vec<String>) -> Self {
        debug_assert!(start >= 1 && start <= end);
        Self {
            chrom: chrom.to_string(),
            start,
            end,
            annotations,
        }
    }

    #[inline]
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    /// Start position (1-based, inclusive).
    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// End position (1-based, inclusive).
    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bases covered (closed interval, so never zero).
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false; a closed interval covers at least one base.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The name column (first annotation), if present.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.annotations.first().map(String::as_str)
    }

    /// Checked read access to an annotation column.
    pub fn annotation(&self, index: usize) -> Result<&str> {
        self.annotations
            .get(index)
            .map(String::as_str)
            .ok_or(IntervalError::Index {
                index,
                len: self.annotations.len(),
            })
    }

    /// Checked write access to an annotation column.
    pub fn annotation_mut(&mut self, index: usize) -> Result<&mut String> {
        let len = self.annotations.len();
        self.annotations
            .get_mut(index)
            .ok_or(IntervalError::Index { index, len })
    }

    /// Check overlap with a chromosomal range.
    #[inline]
    pub fn overlaps_with(&self, chrom: &str, start: u64, end: u64) -> bool {
        self.chrom == chrom && self.overlaps_range(start, end)
    }

    /// Check overlap with a position range on the same chromosome.
    #[inline]
    pub fn overlaps_range(&self, start: u64, end: u64) -> bool {
        self.start.max(start) <= self.end.min(end)
    }

    /// Check if this interval overlaps with another.
    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.overlaps_with(&other.chrom, other.start, other.end)
    }

    /// Check if the range directly touches this interval, with no gap and no overlap.
    #[inline]
    pub fn adjacent_to(&self, chrom: &str, start: u64, end: u64) -> bool {
        self.chrom == chrom && (self.start == end + 1 || self.end + 1 == start)
    }

    /// Number of bases shared with another interval.
    #[inline]
    pub fn overlap_length(&self, other: &Interval) -> u64 {
        if !self.overlaps(other) {
            return 0;
        }
        self.end.min(other.end) - self.start.max(other.start) + 1
    }

    /// Grow by `n` bases on both sides. The start is clamped to position 1.
    pub fn extend(&mut self, n: u64) {
        self.start = self.start.saturating_sub(n).max(1);
        self.end = self.end.saturating_add(n);
    }

    /// Shrink by `n` bases on both sides.
    ///
    /// Returns `None` when the interval would invert; callers drop such
    /// intervals instead of keeping an invalid marker around.
    pub fn shrink(mut self, n: u64) -> Option<Interval> {
        let start = self.start.checked_add(n)?;
        let end = self.end.checked_sub(n)?;
        if start > end {
            return None;
        }
        self.start = start;
        self.end = end;
        Some(self)
    }

    /// Clip to the part shared with `[start, end]`, keeping annotations.
    pub(crate) fn clipped(&self, start: u64, end: u64) -> Option<Interval> {
        let s = self.start.max(start);
        let e = self.end.min(end);
        if s > e {
            return None;
        }
        Some(Self::from_valid(&self.chrom, s, e, self.annotations.clone()))
    }

    /// Compare by chromosome (lexicographic), start and end only.
    #[inline]
    pub fn cmp_position(&self, other: &Interval) -> Ordering {
        self.chrom
            .cmp(&other.chrom)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
    }

    /// Human readable `chr:start-end` form (1-based).
    pub fn to_region_string(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start, self.end)
    }

    /// Parse a region string such as `chr1:1,000-2,000`, `chr1 1000 2000`
    /// or a tab separated triple. Coordinates are taken as 1-based.
    pub fn from_region_string(text: &str) -> Result<Interval> {
        let cleaned: String = text
            .trim()
            .chars()
            .filter(|c| *c != ',')
            .map(|c| if c == ':' || c == '-' || c == ' ' { '\t' } else { c })
            .collect();
        let parts: Vec<&str> = cleaned.split('\t').filter(|p| !p.is_empty()).collect();
        if parts.len() < 3 {
            return Err(IntervalError::InvalidArgument(format!(
                "Cannot parse region '{}'",
                text
            )));
        }
        let parse = |s: &str, what: &str| {
            s.parse::<u64>().map_err(|_| {
                IntervalError::InvalidArgument(format!(
                    "Invalid {} position '{}' in region '{}'",
                    what, s, text
                ))
            })
        };
        let start = parse(parts[1], "start")?;
        let end = parse(parts[2], "end")?;
        Interval::new(parts[0], start, end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start, self.end)?;
        for anno in &self.annotations {
            write!(f, "\t{}", anno)?;
        }
        Ok(())
    }
}

/// Sort order: chromosome (lexicographic), start, end, then annotations.
impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_position(other)
            .then_with(|| self.annotations.cmp(&other.annotations))
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// True if both intervals cover the same chromosome range, ignoring annotations.
#[inline]
pub fn same_range(a: &Interval, b: &Interval) -> bool {
    a.start == b.start && a.end == b.end && a.chrom == b.chrom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(chrom: &str, start: u64, end: u64) -> Interval {
        Interval::new(chrom, start, end).unwrap()
    }

    #[test]
    fn test_rejects_inverted() {
        let err = Interval::new("chr1", 20, 10).unwrap_err();
        assert!(matches!(err, IntervalError::InvalidInterval { start: 20, end: 10, .. }));
        assert!(Interval::new("chr1", 10, 10).is_ok());
    }

    #[test]
    fn test_rejects_position_zero() {
        let err = Interval::new("chr1", 0, 5).unwrap_err();
        assert!(matches!(err, IntervalError::ZeroStart { start: 0, end: 5, .. }));
        assert!(matches!(
            Interval::from_region_string("chr1:0-5"),
            Err(IntervalError::ZeroStart { .. })
        ));
        assert!(Interval::from_region_string("chr1:1-5").is_ok());
    }

    #[test]
    fn test_ordering_agrees_with_equality() {
        let a = Interval::with_annotations("chr1", 1, 5, vec!["a".to_string()]).unwrap();
        let b = Interval::with_annotations("chr1", 1, 5, vec!["b".to_string()]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Less);
        assert_eq!(a.cmp_position(&b), Ordering::Equal);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);

        let set: std::collections::BTreeSet<Interval> = [b.clone(), a.clone(), b].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_length_is_closed() {
        assert_eq!(iv("chr1", 1, 100).len(), 100);
        assert_eq!(iv("chr1", 5, 5).len(), 1);
    }

    #[test]
    fn test_interval_overlap() {
        let a = iv("chr1", 100, 200);
        assert!(a.overlaps(&iv("chr1", 150, 250)));
        // closed coordinates: a shared end base is an overlap
        assert!(a.overlaps(&iv("chr1", 200, 300)));
        assert!(!a.overlaps(&iv("chr1", 201, 300)));
        assert!(!a.overlaps(&iv("chr2", 100, 200)));
    }

    #[test]
    fn test_adjacent() {
        let a = iv("chr1", 100, 200);
        assert!(a.adjacent_to("chr1", 201, 300));
        assert!(a.adjacent_to("chr1", 1, 99));
        assert!(!a.adjacent_to("chr1", 200, 300));
        assert!(!a.adjacent_to("chr2", 201, 300));
    }

    #[test]
    fn test_overlap_length() {
        let a = iv("chr1", 100, 200);
        assert_eq!(a.overlap_length(&iv("chr1", 150, 250)), 51);
        assert_eq!(a.overlap_length(&iv("chr1", 300, 400)), 0);
    }

    #[test]
    fn test_extend_clamps_at_one() {
        let mut a = iv("chr2", 5, 10);
        a.extend(10);
        assert_eq!((a.start(), a.end()), (1, 20));
    }

    #[test]
    fn test_shrink() {
        assert_eq!(iv("chr13", 10, 20).shrink(1).map(|i| (i.start(), i.end())), Some((11, 19)));
        assert_eq!(iv("chr16", 1, 3).shrink(1).map(|i| (i.start(), i.end())), Some((2, 2)));
        assert!(iv("chr11", 1, 2).shrink(1).is_none());
    }

    #[test]
    fn test_annotation_access() {
        let mut a =
            Interval::with_annotations("chr1", 1, 10, vec!["geneA".into(), "0.5".into()]).unwrap();
        assert_eq!(a.name(), Some("geneA"));
        assert_eq!(a.annotation(1).unwrap(), "0.5");
        assert_eq!(a.annotation(2), Err(IntervalError::Index { index: 2, len: 2 }));
        *a.annotation_mut(0).unwrap() = "geneB".into();
        assert_eq!(a.name(), Some("geneB"));
    }

    #[test]
    fn test_region_string() {
        let a = Interval::from_region_string("chr1:1,000-2,000").unwrap();
        assert_eq!((a.chrom(), a.start(), a.end()), ("chr1", 1000, 2000));
        assert_eq!(a.to_region_string(), "chr1:1000-2000");

        let b = Interval::from_region_string("chrX  5   9").unwrap();
        assert_eq!((b.chrom(), b.start(), b.end()), ("chrX", 5, 9));

        assert!(Interval::from_region_string("chr1:abc-5").is_err());
        assert!(Interval::from_region_string("chr1").is_err());
    }

    #[test]
    fn test_interval_ordering() {
        let mut intervals = [iv("chr2", 100, 200), iv("chr1", 200, 300), iv("chr1", 100, 200)];
        intervals.sort();

        assert_eq!(intervals[0].chrom(), "chr1");
        assert_eq!(intervals[0].start(), 100);
        assert_eq!(intervals[1].start(), 200);
        assert_eq!(intervals[2].chrom(), "chr2");
    }
}
