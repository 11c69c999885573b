//! Command implementations for the `ngsbed` binary.
//!
//! Each command is a small configuration struct with builder methods, an
//! `apply`/`compute` step working on in-memory sets, and a `run` entry
//! point doing the file I/O.

pub mod annotate;
pub mod coverage;
pub mod filter_pairs;
pub mod info;
pub mod merge;
pub mod resize;
pub mod setops;
pub mod sort;

pub use annotate::AnnotateCommand;
pub use coverage::{open_reads, CoverageCommand, CoverageMode, DepthCommand};
pub use filter_pairs::FilterPairsCommand;
pub use info::{BedSummary, InfoCommand};
pub use merge::MergeCommand;
pub use resize::{Resize, ResizeCommand};
pub use setops::{SetOpCommand, SetOperation};
pub use sort::SortCommand;
