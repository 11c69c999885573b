// Clippy allows for the whole crate
#![allow(clippy::should_implement_trait)]
#![allow(clippy::type_complexity)]

//! ngs-bed: genomic interval sets and read coverage
//!
//! Intervals use 1-based closed coordinates internally; BED input and
//! output are converted at the reader and writer.
//!
//! # Features
//!
//! - **Interval sets**: sort, merge, intersect, subtract, extend, shrink, chunk
//! - **Chromosomal index**: overlap queries on unsorted sets
//! - **Coverage**: average, low and high coverage from aligned reads
//! - **Read pairs**: keep pairs whose mates both pass a filter
//! - **BAM/CRAM**: with the `bam` feature
//!
//! # Example
//!
//! ```rust,no_run
//! use ngs_bed::{bed, MergeOptions};
//!
//! let mut targets = bed::load("targets.bed").unwrap();
//! let exclude = bed::load("blacklist.bed")
//!     .unwrap()
//!     .into_merged(MergeOptions::default());
//!
//! targets.merge(MergeOptions::default());
//! targets.subtract(&exclude);
//! bed::store("clean.bed", &targets, &[]).unwrap();
//! ```

#[cfg(feature = "bam")]
pub mod bam;
pub mod bed;
pub mod chromosome;
pub mod commands;
pub mod config;
pub mod coverage;
pub mod error;
pub mod genome;
pub mod index;
pub mod interval;
pub mod interval_set;
pub mod pairs;
pub mod parallel;
pub mod reads;

// Re-export commonly used types
pub use bed::{BedError, BedReader, BedWriter};
pub use config::{CoverageOptions, MergeOptions, ReadFilter};
pub use error::{Error, Result};
pub use genome::Genome;
pub use index::ChromosomalIndex;
pub use interval::{Interval, IntervalError};
pub use interval_set::{IntervalSet, MergedIntervals};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bed::{load, store, BedReader};
    pub use crate::commands::{
        CoverageCommand, CoverageMode, MergeCommand, SetOpCommand, SetOperation, SortCommand,
    };
    pub use crate::config::{CoverageOptions, MergeOptions, ReadFilter};
    pub use crate::coverage::CoverageAccumulator;
    pub use crate::index::ChromosomalIndex;
    pub use crate::interval::Interval;
    pub use crate::interval_set::{IntervalSet, MergedIntervals};
    pub use crate::reads::{AlignedRead, ReadSource};
}

#[cfg(test)]
mod tests {
    use crate::bed::{parse_intervals, to_text};
    use crate::config::MergeOptions;

    #[test]
    fn test_basic_workflow() {
        let mut set = parse_intervals("chr1\t100\t200\nchr1\t150\t250\nchr1\t300\t400\n").unwrap();
        set.merge(MergeOptions::default());

        assert_eq!(set.len(), 2);
        assert_eq!(set[0].start(), 101);
        assert_eq!(set[0].end(), 250);
    }

    #[test]
    fn test_subtract_workflow() {
        let mut a = parse_intervals("chr1\t0\t1000\nchr2\t0\t50\n").unwrap();
        let b = parse_intervals("chr1\t100\t200\nchr1\t150\t300\n")
            .unwrap()
            .into_merged(MergeOptions::default());

        a.subtract(&b);
        assert_eq!(to_text(&a).unwrap(), "chr1\t0\t100\nchr1\t300\t1000\nchr2\t0\t50\n");
    }

    #[test]
    fn test_index_on_unsorted_set() {
        use crate::index::ChromosomalIndex;

        let set = parse_intervals("chr2\t0\t10\nchr1\t50\t60\nchr1\t0\t100\n").unwrap();
        let index = ChromosomalIndex::new(&set);
        let hits: Vec<usize> = index.regions_overlapping("chr1", 55, 56).collect();
        assert_eq!(hits.len(), 2);
        assert!(!index.has_overlap("chr3", 1, 10));
    }
}
