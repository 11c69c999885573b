//! Pair-aware read filtering.
//!
//! Reads of a pair are buffered by name until the mate arrives; the pair is
//! then released together or dropped together.

use crate::reads::{AlignedRead, AlignedRecord, NamedRead};
use log::debug;
use rustc_hash::FxHashMap;

/// Result of offering one read to the gate.
#[derive(Debug, PartialEq, Eq)]
pub enum PairOutcome<T> {
    /// The mate has not been seen yet.
    Buffered,
    /// Both mates passed: earlier read first.
    Passed(T, T),
    /// The pair is complete but at least one mate failed.
    Dropped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GateStats {
    pub reads: u64,
    pub pairs_passed: u64,
    pub pairs_dropped: u64,
    /// Reads still waiting for a mate when the input ended.
    pub unpaired: u64,
}

/// Buffers reads by name and releases a pair only if both mates pass.
pub struct PairedReadGate<T: NamedRead> {
    pending: FxHashMap<Vec<u8>, (T, bool)>,
    stats: GateStats,
}

impl<T: NamedRead> Default for PairedReadGate<T> {
    fn default() -> Self {
        Self {
            pending: FxHashMap::default(),
            stats: GateStats::default(),
        }
    }
}

impl<T: NamedRead> PairedReadGate<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a read together with its own filter verdict.
    pub fn push(&mut self, read: T, passes: bool) -> PairOutcome<T> {
        self.stats.reads += 1;
        match self.pending.remove(read.read_name()) {
            Some((mate, mate_passes)) => {
                if passes && mate_passes {
                    self.stats.pairs_passed += 1;
                    PairOutcome::Passed(mate, read)
                } else {
                    self.stats.pairs_dropped += 1;
                    PairOutcome::Dropped
                }
            }
            None => {
                self.pending.insert(read.read_name().to_vec(), (read, passes));
                PairOutcome::Buffered
            }
        }
    }

    /// Number of reads waiting for their mate.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> GateStats {
        self.stats
    }

    /// Discard reads without mate and return the final counters.
    pub fn finish(self) -> GateStats {
        let mut stats = self.stats;
        stats.unpaired = self.pending.len() as u64;
        if stats.unpaired > 0 {
            debug!("{} reads ended without a mate and were discarded", stats.unpaired);
        }
        stats
    }
}

/// Pull records from `next` until it yields `None`, run every primary
/// alignment through a gate and hand passing pairs to `emit`.
///
/// Records reach `emit` unchanged, so SAM lines or raw BAM records can be
/// written back as they were read.
pub fn filter_pairs<T, X, N, P, E>(mut next: N, mut predicate: P, mut emit: E) -> Result<GateStats, X>
where
    T: AlignedRecord,
    N: FnMut() -> Result<Option<T>, X>,
    P: FnMut(&AlignedRead) -> bool,
    E: FnMut(T, T) -> Result<(), X>,
{
    let mut gate = PairedReadGate::new();
    while let Some(record) = next()? {
        let read = record.alignment();
        if read.is_secondary() || read.is_supplementary() {
            continue;
        }
        let passes = predicate(read);
        if let PairOutcome::Passed(first, second) = gate.push(record, passes) {
            emit(first, second)?;
        }
    }
    Ok(gate.finish())
}
