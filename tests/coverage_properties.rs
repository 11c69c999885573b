//! Property tests of read coverage against per-base brute force.

use ngs_bed::coverage::{CoverageAccumulator, DepthTrack};
use ngs_bed::reads::{flags, AlignedRead};
use ngs_bed::{Interval, IntervalSet, MergeOptions, ReadFilter};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const MIN_MAPQ: u8 = 2;

fn read_strategy() -> impl Strategy<Value = AlignedRead> {
    (
        prop::sample::select(vec!["chr1", "chr2"]),
        1u64..200,
        0u64..30,
        0u8..=3,
    )
        .prop_map(|(chrom, start, len, mapq)| AlignedRead {
            name: format!("r{}-{}", chrom, start),
            chrom: chrom.to_string(),
            start,
            end: start + len,
            mapq,
            flags: flags::PAIRED | flags::PROPER_PAIR,
        })
}

fn target_strategy() -> impl Strategy<Value = IntervalSet> {
    let interval = (prop::sample::select(vec!["chr1", "chr2", "chr3"]), 1u64..220, 0u64..40)
        .prop_map(|(chrom, start, len)| Interval::new(chrom, start, start + len).unwrap());
    prop::collection::vec(interval, 1..12).prop_map(IntervalSet::from)
}

fn filter() -> ReadFilter {
    ReadFilter::new().with_min_mapq(MIN_MAPQ)
}

/// Depth of every covered base, counting reads that pass the filter.
fn depth(reads: &[AlignedRead]) -> BTreeMap<(String, u64), u32> {
    let mut bases = BTreeMap::new();
    for read in reads.iter().filter(|r| r.mapq >= MIN_MAPQ) {
        for pos in read.start..=read.end {
            *bases.entry((read.chrom.clone(), pos)).or_insert(0) += 1;
        }
    }
    bases
}

fn bases<'a>(intervals: impl IntoIterator<Item = &'a Interval>) -> BTreeSet<(String, u64)> {
    intervals
        .into_iter()
        .flat_map(|iv| (iv.start()..=iv.end()).map(move |pos| (iv.chrom().to_string(), pos)))
        .collect()
}

proptest! {
    #[test]
    fn prop_depth_track_matches_per_base_count(
        reads in prop::collection::vec(read_strategy(), 0..40),
    ) {
        let mut source = reads.clone().into_iter();
        let (track, stats) = DepthTrack::from_source(&mut source, &filter()).unwrap();
        let segments = track.segments();

        let mut observed = BTreeMap::new();
        for segment in &segments {
            prop_assert!(segment.depth > 0);
            for pos in segment.start..=segment.end {
                let previous = observed.insert((segment.chrom.clone(), pos), segment.depth);
                prop_assert!(previous.is_none());
            }
        }
        prop_assert_eq!(observed, depth(&reads));

        for pair in segments.windows(2) {
            let touching = pair[0].chrom == pair[1].chrom && pair[0].end + 1 == pair[1].start;
            prop_assert!(!(touching && pair[0].depth == pair[1].depth));
        }
        let used = reads.iter().filter(|r| r.mapq >= MIN_MAPQ).count() as u64;
        prop_assert_eq!(stats.reads_used, used);
    }

    #[test]
    fn prop_target_coverage_matches_per_base_count(
        reads in prop::collection::vec(read_strategy(), 0..40),
        targets in target_strategy(),
        cutoff in 1u32..4,
    ) {
        let targets = targets.into_merged(MergeOptions::default());
        let mut accumulator = CoverageAccumulator::new(&targets, filter());
        for read in &reads {
            accumulator.add_read(read);
        }
        let depth = depth(&reads);
        let depth_at = |chrom: &str, pos: u64| depth.get(&(chrom.to_string(), pos)).copied().unwrap_or(0);

        let averages = accumulator.average_coverage(2);
        prop_assert_eq!(averages.len(), targets.len());
        for (target, average) in targets.iter().zip(averages.iter()) {
            let total: u64 = (target.start()..=target.end())
                .map(|pos| u64::from(depth_at(target.chrom(), pos)))
                .sum();
            let expected = format!("{:.2}", total as f64 / target.len() as f64);
            prop_assert_eq!(average.annotation(0).unwrap(), expected.as_str());
        }

        let target_bases = bases(targets.iter());
        let (expected_high, expected_low): (BTreeSet<_>, BTreeSet<_>) = target_bases
            .into_iter()
            .partition(|(chrom, pos)| depth_at(chrom, *pos) >= cutoff);
        let high = accumulator.high_coverage(cutoff);
        let low = accumulator.low_coverage(cutoff);
        prop_assert!(high.is_merged_and_sorted());
        prop_assert!(low.is_merged_and_sorted());
        prop_assert_eq!(bases(high.iter()), expected_high);
        prop_assert_eq!(bases(low.iter()), expected_low);
    }
}
