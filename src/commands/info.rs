//! Summary statistics of a region file.

use crate::bed;
use crate::error::Result;
use crate::interval::Interval;
use crate::interval_set::IntervalSet;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct BedSummary {
    pub regions: usize,
    pub bases: u64,
    pub chromosomes: Vec<String>,
    pub sorted: bool,
    pub merged: bool,
    pub min_length: u64,
    pub max_length: u64,
    pub mean_length: f64,
}

impl BedSummary {
    pub fn of(set: &IntervalSet) -> Self {
        let lengths = || set.iter().map(Interval::len);
        Self {
            regions: set.len(),
            bases: set.base_count(),
            chromosomes: set.chromosomes().into_iter().map(str::to_string).collect(),
            sorted: set.is_sorted(),
            merged: set.is_merged(),
            min_length: lengths().min().unwrap_or(0),
            max_length: lengths().max().unwrap_or(0),
            mean_length: if set.is_empty() {
                0.0
            } else {
                set.base_count() as f64 / set.len() as f64
            },
        }
    }

    pub fn write<W: Write>(&self, mut output: W) -> std::io::Result<()> {
        let yes_no = |flag: bool| if flag { "yes" } else { "no" };
        writeln!(output, "Regions     : {}", self.regions)?;
        writeln!(output, "Bases       : {}", self.bases)?;
        writeln!(output, "Chromosomes : {}", self.chromosomes.join(", "))?;
        writeln!(output, "Is sorted   : {}", yes_no(self.sorted))?;
        writeln!(output, "Is merged   : {}", yes_no(self.merged))?;
        writeln!(output, "Min length  : {}", self.min_length)?;
        writeln!(output, "Max length  : {}", self.max_length)?;
        writeln!(output, "Mean length : {:.2}", self.mean_length)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InfoCommand {
    pub normalize_chromosomes: bool,
}

impl InfoCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalized_chromosomes(mut self, enabled: bool) -> Self {
        self.normalize_chromosomes = enabled;
        self
    }

    pub fn run<W: Write>(&self, input: Option<&Path>, output: W) -> Result<()> {
        let set = bed::read_input(input, self.normalize_chromosomes)?.1;
        BedSummary::of(&set).write(output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let set = bed::parse_intervals("chr1\t0\t10\nchr2\t5\t25\nchr1\t8\t9\n").unwrap();
        let summary = BedSummary::of(&set);
        assert_eq!(summary.regions, 3);
        assert_eq!(summary.bases, 31);
        assert_eq!(summary.chromosomes, vec!["chr1", "chr2"]);
        assert!(!summary.sorted);
        assert!(!summary.merged);
        assert_eq!((summary.min_length, summary.max_length), (1, 20));

        let mut out = Vec::new();
        summary.write(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Regions     : 3"));
        assert!(text.contains("Mean length : 10.33"));
    }

    #[test]
    fn test_empty_summary() {
        let summary = BedSummary::of(&IntervalSet::new());
        assert_eq!(summary.regions, 0);
        assert_eq!(summary.mean_length, 0.0);
    }
}
