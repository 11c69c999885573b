//! Merge command implementation.
//!
//! Uses O(n log n) sort + O(n) single-pass sweep-line merge.

use crate::bed;
use crate::config::MergeOptions;
use crate::error::Result;
use crate::interval_set::IntervalSet;
use log::info;
use std::io::Write;
use std::path::Path;

/// Merge command configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeCommand {
    pub options: MergeOptions,
    pub normalize_chromosomes: bool,
}

impl MergeCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also merge intervals that touch without overlapping.
    pub fn with_back_to_back(mut self, enabled: bool) -> Self {
        self.options = self.options.with_back_to_back(enabled);
        self
    }

    /// Keep names of merged intervals as a comma-separated list.
    pub fn with_names(mut self, enabled: bool, unique: bool) -> Self {
        self.options = self.options.with_names(enabled).with_unique_names(unique);
        self
    }

    pub fn with_normalized_chromosomes(mut self, enabled: bool) -> Self {
        self.normalize_chromosomes = enabled;
        self
    }

    pub fn apply(&self, set: &mut IntervalSet) {
        let before = set.len();
        set.merge(self.options);
        info!("merge: {} regions merged into {}", before, set.len());
    }

    pub fn run<W: Write>(&self, input: Option<&Path>, output: W) -> Result<()> {
        let (headers, mut set) = bed::read_input(input, self.normalize_chromosomes)?;
        self.apply(&mut set);
        bed::write_set(output, &set, &headers)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_back_to_back_flag() {
        let input = "chr1\t0\t10\nchr1\t10\t20\nchr1\t5\t8\n";

        let mut set = bed::parse_intervals(input).unwrap();
        MergeCommand::new().with_back_to_back(false).apply(&mut set);
        assert_eq!(bed::to_text(&set).unwrap(), "chr1\t0\t10\nchr1\t10\t20\n");

        let mut set = bed::parse_intervals(input).unwrap();
        MergeCommand::new().apply(&mut set);
        assert_eq!(bed::to_text(&set).unwrap(), "chr1\t0\t20\n");
    }

    #[test]
    fn test_merge_names() {
        let mut set = bed::parse_intervals("chr1\t0\t10\tA\nchr1\t5\t20\tB\nchr1\t8\t9\tA\n").unwrap();
        MergeCommand::new().with_names(true, true).apply(&mut set);
        assert_eq!(bed::to_text(&set).unwrap(), "chr1\t0\t20\tA,B\n");
    }
}
