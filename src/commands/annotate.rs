//! Annotate regions with the overlapping regions of a second file.
//!
//! Each region gets one new column: the source column of every overlapping
//! source region joined with ",", or with `overlap` the covered fraction
//! followed by those values in brackets.

use crate::bed;
use crate::config::MergeOptions;
use crate::error::Result;
use crate::index::ChromosomalIndex;
use crate::interval::{Interval, IntervalError};
use crate::interval_set::IntervalSet;
use log::info;
use std::io::Write;
use std::path::Path;

/// First BED column holding annotations.
const FIRST_ANNOTATION_COLUMN: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct AnnotateCommand {
    /// BED column (1-based) of the source file to copy.
    pub column: usize,
    /// Drop existing annotations of the input first.
    pub clear: bool,
    /// Report each value once, sorted.
    pub no_duplicates: bool,
    /// Report the fraction of the region covered by the source.
    pub overlap: bool,
    pub normalize_chromosomes: bool,
}

impl Default for AnnotateCommand {
    fn default() -> Self {
        Self {
            column: FIRST_ANNOTATION_COLUMN,
            clear: false,
            no_duplicates: false,
            overlap: false,
            normalize_chromosomes: false,
        }
    }
}

impl AnnotateCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, column: usize) -> Self {
        self.column = column;
        self
    }

    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn with_no_duplicates(mut self, enabled: bool) -> Self {
        self.no_duplicates = enabled;
        self
    }

    pub fn with_overlap(mut self, enabled: bool) -> Self {
        self.overlap = enabled;
        self
    }

    pub fn with_normalized_chromosomes(mut self, enabled: bool) -> Self {
        self.normalize_chromosomes = enabled;
        self
    }

    /// Append the annotation column to every region of `set`.
    ///
    /// Source values are listed in source position order. A source region
    /// without the requested column contributes `yes` (nothing in overlap mode).
    pub fn apply(&self, set: &mut IntervalSet, source: &IntervalSet) -> Result<()> {
        let col = self
            .column
            .checked_sub(FIRST_ANNOTATION_COLUMN)
            .ok_or_else(|| {
                IntervalError::InvalidArgument(format!(
                    "annotation column must be at least {}, got {}",
                    FIRST_ANNOTATION_COLUMN, self.column
                ))
            })?;

        if self.clear {
            set.clear_annotations();
        }

        let index = ChromosomalIndex::new(source);
        let mut annotated = 0usize;
        for region in set.iter_mut() {
            let mut values: Vec<&str> = Vec::new();
            let mut covered = IntervalSet::new();

            let hits = index.matching_indices(region.chrom(), region.start(), region.end());
            if !hits.is_empty() {
                annotated += 1;
            }
            for idx in hits {
                let hit = &source[idx];
                match hit.annotations.get(col).map(String::as_str) {
                    Some(value) => values.push(value),
                    None if !self.overlap => values.push("yes"),
                    None => {}
                }
                if self.overlap {
                    covered.push(Interval::from_valid(
                        region.chrom(),
                        region.start().max(hit.start()),
                        region.end().min(hit.end()),
                        Vec::new(),
                    ));
                }
            }

            if self.no_duplicates {
                values.sort_unstable();
                values.dedup();
            }

            let value = if self.overlap {
                covered.merge(MergeOptions::default());
                let fraction = covered.base_count() as f64 / region.len() as f64;
                if values.is_empty() {
                    format!("{:.3}", fraction)
                } else {
                    format!("{:.3} ({})", fraction, values.join(","))
                }
            } else {
                values.join(",")
            };
            region.annotations.push(value);
        }

        info!(
            "annotate: {} of {} regions overlap the source",
            annotated,
            set.len()
        );
        Ok(())
    }

    pub fn run<W: Write>(&self, input: Option<&Path>, source: &Path, output: W) -> Result<()> {
        let (headers, mut set) = bed::read_input(input, self.normalize_chromosomes)?;
        let (_, source) = bed::read_input(Some(source), self.normalize_chromosomes)?;
        self.apply(&mut set, &source)?;
        bed::write_set(output, &set, &headers)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const SOURCE: &str = "chr1\t10\t20\tB\tx\n\
                          chr1\t0\t10\tA\n\
                          chr1\t15\t30\tA\n\
                          chr2\t0\t5\n";

    fn annotate(command: AnnotateCommand, input: &str) -> String {
        let mut set = bed::parse_intervals(input).unwrap();
        let source = bed::parse_intervals(SOURCE).unwrap();
        command.apply(&mut set, &source).unwrap();
        bed::to_text(&set).unwrap()
    }

    #[test]
    fn test_names_in_position_order() {
        assert_eq!(
            annotate(AnnotateCommand::new(), "chr1\t5\t25\tr1\nchr3\t0\t5\tr2\n"),
            "chr1\t5\t25\tr1\tA,B,A\nchr3\t0\t5\tr2\t\n"
        );
    }

    #[test]
    fn test_no_duplicates_and_clear() {
        let command = AnnotateCommand::new()
            .with_no_duplicates(true)
            .with_clear(true);
        assert_eq!(annotate(command, "chr1\t5\t25\tr1\n"), "chr1\t5\t25\tA,B\n");
    }

    #[test]
    fn test_missing_column_is_yes() {
        let command = AnnotateCommand::new().with_column(5);
        assert_eq!(annotate(command, "chr1\t12\t18\n"), "chr1\t12\t18\tx,yes\n");
        assert_eq!(annotate(command, "chr1\t0\t5\n"), "chr1\t0\t5\tyes\n");
        assert_eq!(annotate(AnnotateCommand::new(), "chr2\t1\t2\n"), "chr2\t1\t2\tyes\n");
    }

    #[test]
    fn test_overlap_fraction() {
        let command = AnnotateCommand::new().with_overlap(true);
        // bases 21-30 of 21-40 are covered by the third source region
        assert_eq!(
            annotate(command, "chr1\t20\t40\n"),
            "chr1\t20\t40\t0.500 (A)\n"
        );
        assert_eq!(annotate(command, "chr2\t0\t10\n"), "chr2\t0\t10\t0.500\n");
        assert_eq!(annotate(command, "chr3\t0\t10\n"), "chr3\t0\t10\t0.000\n");
    }

    #[test]
    fn test_column_below_four_rejected() {
        let mut set = bed::parse_intervals("chr1\t0\t5\n").unwrap();
        let err = AnnotateCommand::new()
            .with_column(3)
            .apply(&mut set, &IntervalSet::new())
            .unwrap_err();
        assert!(matches!(err, Error::Interval(IntervalError::InvalidArgument(_))));
    }
}
