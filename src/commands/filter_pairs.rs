//! Keep read pairs whose mates both pass the read filter.
//!
//! SAM input is written back as SAM with the original header and lines;
//! BAM/CRAM input (feature `bam`) is written as BAM.

use crate::bed;
use crate::commands::coverage::is_binary_alignment;
use crate::config::ReadFilter;
use crate::coverage::check_read;
use crate::error::{Error, Result};
use crate::pairs::{filter_pairs, GateStats};
use crate::reads::{SamReader, SamRecord};
use log::info;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct FilterPairsCommand {
    pub filter: ReadFilter,
    pub threads: usize,
}

impl FilterPairsCommand {
    pub fn new(filter: ReadFilter) -> Self {
        Self { filter, threads: 1 }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Filter SAM text from `input` to `output`.
    pub fn filter_sam<R: Read, W: Write>(&self, input: R, output: W) -> Result<GateStats> {
        let mut reader = SamReader::new(input);
        let mut writer = BufWriter::new(output);
        for header in reader.read_headers()? {
            writeln!(writer, "{}", header)?;
        }

        let stats = filter_pairs(
            || reader.next_record(),
            |read| check_read(&self.filter, read).is_ok(),
            |first: SamRecord, second: SamRecord| {
                writeln!(writer, "{}", first.line)?;
                writeln!(writer, "{}", second.line)?;
                Ok(())
            },
        )?;
        writer.flush()?;
        Ok(stats)
    }

    pub fn run<W: Write>(&self, input: Option<&Path>, output: Option<&Path>, stdout: W) -> Result<()> {
        let stats = match input {
            Some(path) if is_binary_alignment(path) => self.run_binary(path, output)?,
            _ => {
                let source = bed::open_input(input)?;
                match output {
                    Some(out) if out.as_os_str() != "-" => {
                        self.filter_sam(source, std::fs::File::create(out)?)?
                    }
                    _ => self.filter_sam(source, stdout)?,
                }
            }
        };
        info!(
            "filter-pairs: {} reads, {} pairs kept, {} pairs dropped, {} without mate",
            stats.reads, stats.pairs_passed, stats.pairs_dropped, stats.unpaired
        );
        Ok(())
    }

    #[cfg(feature = "bam")]
    fn run_binary(&self, input: &Path, output: Option<&Path>) -> Result<GateStats> {
        let output = output.ok_or_else(|| {
            Error::InvalidInput("BAM output needs an output path (--output)".to_string())
        })?;
        let filter = self.filter;
        Ok(crate::bam::filter_bam_pairs(input, output, self.threads, |read| {
            check_read(&filter, read).is_ok()
        })?)
    }

    #[cfg(not(feature = "bam"))]
    fn run_binary(&self, input: &Path, _output: Option<&Path>) -> Result<GateStats> {
        Err(Error::InvalidInput(format!(
            "{}: BAM/CRAM input requires building with the `bam` feature",
            input.display()
        )))
    }
}
