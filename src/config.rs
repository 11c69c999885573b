//! Option structs for engine operations.
//!
//! Every operation receives its configuration explicitly; there is no
//! process-wide state. The CLI maps its flags onto these structs.

/// How `IntervalSet::merge` joins intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Also merge intervals that touch without overlapping (`end + 1 == next.start`).
    pub merge_back_to_back: bool,
    /// Keep the name column: names of merged intervals joined with `,`.
    pub merge_names: bool,
    /// With `merge_names`, list each distinct name only once.
    pub unique_names: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            merge_back_to_back: true,
            merge_names: false,
            unique_names: false,
        }
    }
}

impl MergeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_back_to_back(mut self, enabled: bool) -> Self {
        self.merge_back_to_back = enabled;
        self
    }

    pub fn with_names(mut self, enabled: bool) -> Self {
        self.merge_names = enabled;
        self
    }

    pub fn with_unique_names(mut self, enabled: bool) -> Self {
        self.unique_names = enabled;
        self
    }
}

/// Which aligned reads count towards coverage.
///
/// Unmapped, secondary and supplementary alignments are always excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadFilter {
    /// Minimum mapping quality (inclusive).
    pub min_mapq: u8,
    /// Count reads of pairs that are not properly paired.
    pub include_anomalous: bool,
    /// Count unpaired reads and reads whose mate is unmapped.
    pub include_singletons: bool,
    /// Count PCR/optical duplicates.
    pub include_duplicates: bool,
}

impl Default for ReadFilter {
    fn default() -> Self {
        Self {
            min_mapq: 1,
            include_anomalous: false,
            include_singletons: false,
            include_duplicates: false,
        }
    }
}

impl ReadFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_mapq(mut self, min_mapq: u8) -> Self {
        self.min_mapq = min_mapq;
        self
    }

    pub fn with_anomalous(mut self, enabled: bool) -> Self {
        self.include_anomalous = enabled;
        self
    }

    pub fn with_singletons(mut self, enabled: bool) -> Self {
        self.include_singletons = enabled;
        self
    }

    pub fn with_duplicates(mut self, enabled: bool) -> Self {
        self.include_duplicates = enabled;
        self
    }
}

/// Settings shared by the coverage commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageOptions {
    pub filter: ReadFilter,
    /// Depth threshold for high/low coverage detection.
    pub cutoff: u32,
    /// Decimal places of the average coverage annotation.
    pub decimals: usize,
}

impl Default for CoverageOptions {
    fn default() -> Self {
        Self {
            filter: ReadFilter::default(),
            cutoff: 20,
            decimals: 2,
        }
    }
}
