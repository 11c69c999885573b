//! Read coverage over target regions.
//!
//! Depth is computed with an event sweep: every accepted read adds `+1` at
//! its start and `-1` one base past its end. Sorting the events of a
//! chromosome and accumulating them yields constant-depth segments without
//! per-base arrays.

use crate::config::{MergeOptions, ReadFilter};
use crate::genome::Genome;
use crate::index::ChromosomalIndex;
use crate::interval::Interval;
use crate::interval_set::{IntervalSet, MergedIntervals};
use crate::reads::{AlignedRead, ReadSource, Result};
use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Why a read was not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Unmapped,
    NotPrimary,
    Duplicate,
    LowMappingQuality,
    Anomalous,
    Singleton,
}

/// Apply a [`ReadFilter`] to one read.
pub fn check_read(filter: &ReadFilter, read: &AlignedRead) -> std::result::Result<(), Rejection> {
    if read.is_unmapped() || read.start == 0 || read.end < read.start {
        return Err(Rejection::Unmapped);
    }
    if read.is_secondary() || read.is_supplementary() {
        return Err(Rejection::NotPrimary);
    }
    if read.is_duplicate() && !filter.include_duplicates {
        return Err(Rejection::Duplicate);
    }
    if read.mapq < filter.min_mapq {
        return Err(Rejection::LowMappingQuality);
    }
    if read.is_anomalous() && !filter.include_anomalous {
        return Err(Rejection::Anomalous);
    }
    if read.is_singleton() && !filter.include_singletons {
        return Err(Rejection::Singleton);
    }
    Ok(())
}

/// Read counters of a coverage run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoverageStats {
    pub reads_seen: u64,
    pub reads_used: u64,
    pub unmapped: u64,
    pub not_primary: u64,
    pub duplicates: u64,
    pub low_mapq: u64,
    pub anomalous: u64,
    pub singletons: u64,
    /// Accepted reads that do not touch any target region.
    pub off_target: u64,
}

impl CoverageStats {
    fn reject(&mut self, reason: Rejection) {
        let counter = match reason {
            Rejection::Unmapped => &mut self.unmapped,
            Rejection::NotPrimary => &mut self.not_primary,
            Rejection::Duplicate => &mut self.duplicates,
            Rejection::LowMappingQuality => &mut self.low_mapq,
            Rejection::Anomalous => &mut self.anomalous,
            Rejection::Singleton => &mut self.singletons,
        };
        *counter += 1;
    }

    pub fn filtered(&self) -> u64 {
        self.unmapped
            + self.not_primary
            + self.duplicates
            + self.low_mapq
            + self.anomalous
            + self.singletons
    }
}

/// A maximal run of bases with the same non-zero depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthSegment {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub depth: u32,
}

/// Per-chromosome depth change events.
#[derive(Debug, Default, Clone)]
pub struct DepthTrack {
    events: FxHashMap<String, Vec<(u64, i32)>>,
}

impl DepthTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one base range `[start, end]`. Ranges at position 0 or
    /// inverted ranges are ignored.
    pub fn add(&mut self, chrom: &str, start: u64, end: u64) {
        if start == 0 || end < start {
            return;
        }
        let stop = end.saturating_add(1);
        if let Some(events) = self.events.get_mut(chrom) {
            events.push((start, 1));
            events.push((stop, -1));
            return;
        }
        self.events
            .insert(chrom.to_string(), vec![(start, 1), (stop, -1)]);
    }

    /// Build a track from every read of `source` that passes `filter`.
    pub fn from_source<S: ReadSource + ?Sized>(
        source: &mut S,
        filter: &ReadFilter,
    ) -> Result<(Self, CoverageStats)> {
        let mut track = Self::new();
        let mut stats = CoverageStats::default();
        while let Some(read) = source.next_read()? {
            stats.reads_seen += 1;
            if let Err(reason) = check_read(filter, &read) {
                stats.reject(reason);
                continue;
            }
            stats.reads_used += 1;
            track.add(&read.chrom, read.start, read.end);
        }
        debug!(
            "depth track: {} of {} reads used",
            stats.reads_used, stats.reads_seen
        );
        Ok((track, stats))
    }

    /// Chromosomes with at least one event, sorted lexicographically.
    pub fn chromosomes(&self) -> Vec<&str> {
        let mut chroms: Vec<&str> = self.events.keys().map(String::as_str).collect();
        chroms.sort_unstable();
        chroms
    }

    /// Constant-depth segments (depth > 0), ordered by chromosome and position.
    ///
    /// Chromosomes are swept in parallel and concatenated in name order.
    pub fn segments(&self) -> Vec<DepthSegment> {
        self.chromosomes()
            .par_iter()
            .map(|&chrom| sweep_chromosome(chrom, &self.events[chrom]))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }

    /// Regions with depth `>= cutoff`, merged. A cutoff of 0 is treated as 1
    /// since zero-depth regions are not tracked.
    pub fn regions_with_depth_at_least(&self, cutoff: u32) -> MergedIntervals {
        let cutoff = cutoff.max(1);
        self.segments()
            .into_iter()
            .filter(|segment| segment.depth >= cutoff)
            .map(|segment| Interval::from_valid(&segment.chrom, segment.start, segment.end, Vec::new()))
            .collect::<IntervalSet>()
            .into_merged(MergeOptions::default())
    }

    /// Regions of the genome with depth `< cutoff`, in genome file order.
    pub fn regions_below(&self, cutoff: u32, genome: &Genome) -> IntervalSet {
        if cutoff == 0 {
            return IntervalSet::new();
        }
        let mut whole: IntervalSet = genome
            .chromosomes()
            .filter_map(|chrom| {
                let size = genome.chrom_size(chrom)?;
                (size > 0).then(|| Interval::from_valid(chrom, 1, size, Vec::new()))
            })
            .collect();
        whole.subtract(&self.regions_with_depth_at_least(cutoff));
        whole
    }
}

/// Sweep one chromosome's events into segments, merging adjacent runs of
/// equal depth.
fn sweep_chromosome(chrom: &str, events: &[(u64, i32)]) -> Vec<DepthSegment> {
    let mut events = events.to_vec();
    events.sort_unstable_by_key(|e| e.0);

    let mut result: Vec<DepthSegment> = Vec::new();
    let mut depth: i64 = 0;
    let mut prev_pos: u64 = 0;

    for (pos, delta) in events {
        if pos > prev_pos && depth > 0 {
            let cur_depth = depth as u32;
            match result.last_mut() {
                Some(last) if last.depth == cur_depth && last.end + 1 == prev_pos => {
                    last.end = pos - 1;
                }
                _ => result.push(DepthSegment {
                    chrom: chrom.to_string(),
                    start: prev_pos,
                    end: pos - 1,
                    depth: cur_depth,
                }),
            }
        }
        depth += i64::from(delta);
        prev_pos = pos;
    }

    result
}

/// Accumulates read coverage over a fixed set of merged target regions.
pub struct CoverageAccumulator<'a> {
    targets: &'a MergedIntervals,
    index: ChromosomalIndex<'a>,
    filter: ReadFilter,
    covered_bases: Vec<u64>,
    depth: DepthTrack,
    stats: CoverageStats,
}

impl<'a> CoverageAccumulator<'a> {
    pub fn new(targets: &'a MergedIntervals, filter: ReadFilter) -> Self {
        Self {
            targets,
            index: ChromosomalIndex::new(targets.as_set()),
            filter,
            covered_bases: vec![0; targets.len()],
            depth: DepthTrack::new(),
            stats: CoverageStats::default(),
        }
    }

    /// Add a single read.
    pub fn add_read(&mut self, read: &AlignedRead) {
        self.stats.reads_seen += 1;
        if let Err(reason) = check_read(&self.filter, read) {
            self.stats.reject(reason);
            return;
        }

        let mut on_target = false;
        for idx in self
            .index
            .regions_overlapping(&read.chrom, read.start, read.end)
        {
            let target = &self.targets[idx];
            let overlap = read.end.min(target.end()) - read.start.max(target.start()) + 1;
            self.covered_bases[idx] += overlap;
            on_target = true;
        }

        if on_target {
            self.stats.reads_used += 1;
            self.depth.add(&read.chrom, read.start, read.end);
        } else {
            self.stats.off_target += 1;
        }
    }

    /// Drain a read source.
    pub fn consume<S: ReadSource + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        while let Some(read) = source.next_read()? {
            self.add_read(&read);
        }
        info!(
            "coverage: {} reads seen, {} used, {} filtered, {} off target",
            self.stats.reads_seen,
            self.stats.reads_used,
            self.stats.filtered(),
            self.stats.off_target
        );
        Ok(())
    }

    pub fn stats(&self) -> CoverageStats {
        self.stats
    }

    /// Mean depth of one target region.
    pub fn mean_depth(&self, idx: usize) -> f64 {
        self.covered_bases[idx] as f64 / self.targets[idx].len() as f64
    }

    /// Copy of the targets with the mean depth appended as an annotation.
    pub fn average_coverage(&self, decimals: usize) -> IntervalSet {
        self.targets
            .iter()
            .enumerate()
            .map(|(idx, target)| {
                let mut target = target.clone();
                target
                    .annotations
                    .push(format!("{:.*}", decimals, self.mean_depth(idx)));
                target
            })
            .collect()
    }

    /// Parts of the targets with depth `>= cutoff`.
    pub fn high_coverage(&self, cutoff: u32) -> IntervalSet {
        let mut result = self.targets.as_set().clone();
        if cutoff > 0 {
            result.intersect(&self.depth.regions_with_depth_at_least(cutoff));
        }
        self.merge_output(result)
    }

    /// Parts of the targets with depth `< cutoff`.
    pub fn low_coverage(&self, cutoff: u32) -> IntervalSet {
        if cutoff == 0 {
            return IntervalSet::new();
        }
        let mut result = self.targets.as_set().clone();
        result.subtract(&self.depth.regions_with_depth_at_least(cutoff));
        self.merge_output(result)
    }

    /// Depth segments of the reads that touched a target.
    pub fn depth_segments(&self) -> Vec<DepthSegment> {
        self.depth.segments()
    }

    fn merge_output(&self, mut result: IntervalSet) -> IntervalSet {
        let named = self.targets.iter().any(|t| t.name().is_some());
        result.merge(
            MergeOptions::default()
                .with_names(named)
                .with_unique_names(true),
        );
        result
    }
}
