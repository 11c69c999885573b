//! Intersect, subtract and overlap filtering of two region files.
//!
//! The second file is merged before use; the first keeps its order,
//! duplicates and annotations.

use crate::bed;
use crate::config::MergeOptions;
use crate::error::Result;
use crate::interval_set::{IntervalSet, MergedIntervals};
use log::info;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperation {
    /// Parts of A inside B.
    Intersect,
    /// Parts of A outside B.
    Subtract,
    /// Whole entries of A touching B.
    Overlapping,
}

impl SetOperation {
    fn name(self) -> &'static str {
        match self {
            SetOperation::Intersect => "intersect",
            SetOperation::Subtract => "subtract",
            SetOperation::Overlapping => "overlapping",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SetOpCommand {
    pub operation: SetOperation,
    /// Sort and merge the output.
    pub merge_output: bool,
    /// Applied to both inputs.
    pub normalize_chromosomes: bool,
}

impl SetOpCommand {
    pub fn new(operation: SetOperation) -> Self {
        Self {
            operation,
            merge_output: false,
            normalize_chromosomes: false,
        }
    }

    pub fn with_merge_output(mut self, enabled: bool) -> Self {
        self.merge_output = enabled;
        self
    }

    pub fn with_normalized_chromosomes(mut self, enabled: bool) -> Self {
        self.normalize_chromosomes = enabled;
        self
    }

    pub fn apply(&self, a: &mut IntervalSet, b: &MergedIntervals) {
        let before = a.len();
        match self.operation {
            SetOperation::Intersect => a.intersect(b),
            SetOperation::Subtract => a.subtract(b),
            SetOperation::Overlapping => a.overlapping(b),
        }
        if self.merge_output {
            a.merge(MergeOptions::default());
        }
        info!(
            "{}: {} regions in, {} regions out",
            self.operation.name(),
            before,
            a.len()
        );
    }

    pub fn run<W: Write>(&self, a: Option<&Path>, b: &Path, output: W) -> Result<()> {
        let (headers, mut set_a) = bed::read_input(a, self.normalize_chromosomes)?;
        let set_b = bed::read_input(Some(b), self.normalize_chromosomes)?
            .1
            .into_merged(MergeOptions::default());
        self.apply(&mut set_a, &set_b);
        bed::write_set(output, &set_a, &headers)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(text: &str) -> MergedIntervals {
        bed::parse_intervals(text)
            .unwrap()
            .into_merged(MergeOptions::default())
    }

    #[test]
    fn test_operations() {
        let b = merged("chr1\t49\t200\n");
        let a_text = "chr1\t0\t100\tgene\n";

        let mut a = bed::parse_intervals(a_text).unwrap();
        SetOpCommand::new(SetOperation::Intersect).apply(&mut a, &b);
        assert_eq!(bed::to_text(&a).unwrap(), "chr1\t49\t100\tgene\n");

        let mut a = bed::parse_intervals(a_text).unwrap();
        SetOpCommand::new(SetOperation::Subtract).apply(&mut a, &b);
        assert_eq!(bed::to_text(&a).unwrap(), "chr1\t0\t49\tgene\n");

        let mut a = bed::parse_intervals("chr1\t0\t10\nchr1\t150\t160\n").unwrap();
        SetOpCommand::new(SetOperation::Overlapping).apply(&mut a, &b);
        assert_eq!(bed::to_text(&a).unwrap(), "chr1\t150\t160\n");
    }

    #[test]
    fn test_merge_output() {
        let b = merged("chr1\t0\t1000\n");
        let mut a = bed::parse_intervals("chr1\t100\t200\nchr1\t150\t300\n").unwrap();
        SetOpCommand::new(SetOperation::Intersect)
            .with_merge_output(true)
            .apply(&mut a, &b);
        assert_eq!(bed::to_text(&a).unwrap(), "chr1\t100\t300\n");
    }

    #[test]
    fn test_run_with_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bed");
        let b = dir.path().join("b.bed");
        std::fs::write(&a, "chr1\t0\t100\n").unwrap();
        std::fs::write(&b, "chr1\t20\t30\nchr1\t25\t40\n").unwrap();

        let mut out = Vec::new();
        SetOpCommand::new(SetOperation::Subtract)
            .run(Some(&a), &b, &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "chr1\t0\t20\nchr1\t40\t100\n");
    }
}
