//! Coverage commands: average depth per target, low/high coverage regions,
//! and bedgraph depth output.

use crate::bed::{self, BedWriter};
use crate::config::{CoverageOptions, MergeOptions};
use crate::coverage::{CoverageAccumulator, CoverageStats, DepthTrack};
use crate::error::{Error, Result};
use crate::genome::Genome;
use crate::interval_set::{IntervalSet, MergedIntervals};
use crate::reads::{ReadSource, SamReader};
use log::info;
use std::io::Write;
use std::path::Path;

/// True for paths handled by htslib rather than the SAM text reader.
pub(crate) fn is_binary_alignment(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bam") || ext.eq_ignore_ascii_case("cram"))
}

/// Open an alignment file. SAM text is read directly (`-` or `None` is
/// stdin); BAM and CRAM need the `bam` feature.
pub fn open_reads(path: Option<&Path>, threads: usize) -> Result<Box<dyn ReadSource>> {
    match path {
        Some(p) if is_binary_alignment(p) => open_binary(p, threads),
        _ => Ok(Box::new(SamReader::new(bed::open_input(path)?))),
    }
}

#[cfg(feature = "bam")]
fn open_binary(path: &Path, threads: usize) -> Result<Box<dyn ReadSource>> {
    Ok(Box::new(crate::bam::BamReadSource::from_path(path, threads)?))
}

#[cfg(not(feature = "bam"))]
fn open_binary(path: &Path, _threads: usize) -> Result<Box<dyn ReadSource>> {
    Err(Error::InvalidInput(format!(
        "{}: BAM/CRAM input requires building with the `bam` feature",
        path.display()
    )))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageMode {
    /// Mean depth appended to every target region.
    Average,
    /// Target parts (or genome parts) with depth below the cutoff.
    Low,
    /// Target parts (or genome parts) with depth at or above the cutoff.
    High,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageCommand {
    pub options: CoverageOptions,
    /// Decompression threads for BAM/CRAM input.
    pub threads: usize,
}

impl CoverageCommand {
    pub fn new(options: CoverageOptions) -> Self {
        Self {
            options,
            threads: 1,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Compute coverage of target regions from a read source.
    ///
    /// Average mode requires the targets to be merged and sorted already,
    /// so the output lines correspond to the input lines.
    pub fn compute<S: ReadSource + ?Sized>(
        &self,
        mode: CoverageMode,
        targets: IntervalSet,
        reads: &mut S,
    ) -> Result<(IntervalSet, CoverageStats)> {
        let targets: MergedIntervals = match mode {
            CoverageMode::Average => targets.try_into()?,
            CoverageMode::Low | CoverageMode::High => {
                let named = targets.iter().any(|t| t.name().is_some());
                targets.into_merged(
                    MergeOptions::default()
                        .with_names(named)
                        .with_unique_names(true),
                )
            }
        };

        let mut accumulator = CoverageAccumulator::new(&targets, self.options.filter);
        accumulator.consume(reads)?;

        let result = match mode {
            CoverageMode::Average => accumulator.average_coverage(self.options.decimals),
            CoverageMode::Low => accumulator.low_coverage(self.options.cutoff),
            CoverageMode::High => accumulator.high_coverage(self.options.cutoff),
        };
        Ok((result, accumulator.stats()))
    }

    /// Genome-wide low/high coverage without target regions.
    pub fn compute_genome_wide<S: ReadSource + ?Sized>(
        &self,
        mode: CoverageMode,
        genome: Option<&Genome>,
        reads: &mut S,
    ) -> Result<(IntervalSet, CoverageStats)> {
        let (track, stats) = DepthTrack::from_source(reads, &self.options.filter)?;
        let result = match (mode, genome) {
            (CoverageMode::High, _) => track
                .regions_with_depth_at_least(self.options.cutoff)
                .into_inner(),
            (CoverageMode::Low, Some(genome)) => track.regions_below(self.options.cutoff, genome),
            (CoverageMode::Low, None) => {
                return Err(Error::InvalidInput(
                    "genome-wide low coverage needs chromosome sizes (--genome)".to_string(),
                ))
            }
            (CoverageMode::Average, _) => {
                return Err(Error::InvalidInput(
                    "average coverage needs target regions".to_string(),
                ))
            }
        };
        Ok((result, stats))
    }

    pub fn run<W: Write>(
        &self,
        mode: CoverageMode,
        targets: Option<&Path>,
        reads: Option<&Path>,
        genome: Option<&Genome>,
        output: W,
    ) -> Result<()> {
        if targets.is_none() && reads.is_none() {
            return Err(Error::InvalidInput(
                "targets and reads cannot both come from stdin".to_string(),
            ));
        }

        let mut source = open_reads(reads, self.threads)?;
        let (headers, result, stats) = match targets {
            Some(path) => {
                let (headers, set) = bed::load_with_headers(Some(path))?;
                info!("coverage: {} target regions", set.len());
                let (result, stats) = self.compute(mode, set, source.as_mut())?;
                (headers, result, stats)
            }
            None => {
                let (result, stats) = self.compute_genome_wide(mode, genome, source.as_mut())?;
                (Vec::new(), result, stats)
            }
        };

        info!(
            "coverage: {} regions written, {} of {} reads used",
            result.len(),
            stats.reads_used,
            stats.reads_seen
        );
        bed::write_set(output, &result, &headers)?;
        Ok(())
    }
}

/// Bedgraph output of read depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthCommand {
    pub options: CoverageOptions,
    pub threads: usize,
}

impl DepthCommand {
    pub fn new(options: CoverageOptions) -> Self {
        Self {
            options,
            threads: 1,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn write_depth<S: ReadSource + ?Sized, W: Write>(
        &self,
        reads: &mut S,
        output: W,
    ) -> Result<CoverageStats> {
        let (track, stats) = DepthTrack::from_source(reads, &self.options.filter)?;
        let mut writer = BedWriter::new(output);
        for segment in track.segments() {
            writer.write_value_line(&segment.chrom, segment.start, segment.end, u64::from(segment.depth))?;
        }
        writer.flush()?;
        Ok(stats)
    }

    pub fn run<W: Write>(&self, reads: Option<&Path>, output: W) -> Result<()> {
        let mut source = open_reads(reads, self.threads)?;
        let stats = self.write_depth(source.as_mut(), output)?;
        info!("depth: {} of {} reads used", stats.reads_used, stats.reads_seen);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::IntervalError;
    use crate::reads::{flags, AlignedRead};

    fn read(start: u64, end: u64) -> AlignedRead {
        AlignedRead {
            name: format!("r{}", start),
            chrom: "chr1".to_string(),
            start,
            end,
            mapq: 60,
            flags: flags::PAIRED | flags::PROPER_PAIR,
        }
    }

    fn reads() -> std::vec::IntoIter<AlignedRead> {
        vec![read(100, 110), read(105, 115), read(200, 210)].into_iter()
    }

    fn options() -> CoverageOptions {
        CoverageOptions {
            cutoff: 2,
            ..CoverageOptions::default()
        }
    }

    #[test]
    fn test_average_requires_merged_targets() {
        let targets = bed::parse_intervals("chr1\t0\t100\nchr1\t50\t150\n").unwrap();
        let err = CoverageCommand::new(options())
            .compute(CoverageMode::Average, targets, &mut reads())
            .unwrap_err();
        assert!(matches!(err, Error::Interval(IntervalError::PreconditionViolation(_))));
    }

    #[test]
    fn test_average() {
        let targets = bed::parse_intervals("chr1\t99\t109\nchr1\t199\t219\n").unwrap();
        let (result, stats) = CoverageCommand::new(options())
            .compute(CoverageMode::Average, targets, &mut reads())
            .unwrap();
        assert_eq!(bed::to_text(&result).unwrap(), "chr1\t99\t109\t1.50\nchr1\t199\t219\t0.55\n");
        assert_eq!(stats.reads_used, 3);
    }

    #[test]
    fn test_low_merges_output() {
        let targets = bed::parse_intervals("chr1\t0\t150\tA\nchr1\t150\t300\tB\n").unwrap();
        let (result, _) = CoverageCommand::new(options())
            .compute(CoverageMode::Low, targets, &mut reads())
            .unwrap();
        assert_eq!(
            bed::to_text(&result).unwrap(),
            "chr1\t0\t104\tA,B\nchr1\t110\t300\tA,B\n"
        );
    }

    #[test]
    fn test_genome_wide() {
        let command = CoverageCommand::new(options());
        let (high, _) = command
            .compute_genome_wide(CoverageMode::High, None, &mut reads())
            .unwrap();
        assert_eq!(bed::to_text(&high).unwrap(), "chr1\t104\t110\n");

        assert!(command
            .compute_genome_wide(CoverageMode::Low, None, &mut reads())
            .is_err());
    }

    #[test]
    fn test_depth_bedgraph() {
        let mut out = Vec::new();
        DepthCommand::new(CoverageOptions::default())
            .write_depth(&mut reads(), &mut out)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "chr1\t99\t104\t1\nchr1\t104\t110\t2\nchr1\t110\t115\t1\nchr1\t199\t210\t1\n"
        );
    }

    #[test]
    fn test_bam_path_detection() {
        assert!(is_binary_alignment(Path::new("x.BAM")));
        assert!(is_binary_alignment(Path::new("dir/x.cram")));
        assert!(!is_binary_alignment(Path::new("x.sam")));
    }
}
