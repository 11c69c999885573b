//! Sort command implementation.
//!
//! Sort order:
//! 1. Primary: chromosome (lexicographic, karyotype, or genome file order)
//! 2. Secondary: start coordinate
//! 3. Tertiary: end coordinate
//! 4. Ties: input order preserved (stable sort), or the name column with `--with-name`

use crate::bed;
use crate::chromosome::ChromosomeOrder;
use crate::error::Result;
use crate::interval_set::IntervalSet;
use log::info;
use std::io::Write;
use std::path::Path;

/// Sort command configuration.
#[derive(Debug, Clone, Default)]
pub struct SortCommand {
    pub order: ChromosomeOrder,
    /// Drop entries with identical chromosome, start and end.
    pub unique: bool,
    /// Break position ties by name.
    pub with_name: bool,
    pub normalize_chromosomes: bool,
}

impl SortCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: ChromosomeOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn with_name(mut self, with_name: bool) -> Self {
        self.with_name = with_name;
        self
    }

    /// Rewrite chromosome names to the `chr` form while reading.
    pub fn with_normalized_chromosomes(mut self, enabled: bool) -> Self {
        self.normalize_chromosomes = enabled;
        self
    }

    /// Sort a set in place.
    pub fn apply(&self, set: &mut IntervalSet) {
        match (&self.order, self.with_name) {
            (ChromosomeOrder::Lexicographic, true) => set.sort_with_name(),
            (ChromosomeOrder::Lexicographic, false) => set.sort(),
            (order, _) => set.sort_by_order(order),
        }
        if self.unique {
            let before = set.len();
            set.dedup_adjacent();
            info!("sort: removed {} duplicate regions", before - set.len());
        }
    }

    pub fn run<W: Write>(&self, input: Option<&Path>, output: W) -> Result<()> {
        let (headers, mut set) = bed::read_input(input, self.normalize_chromosomes)?;
        info!("sort: {} regions loaded", set.len());
        self.apply(&mut set);
        bed::write_set(output, &set, &headers)?;
        Ok(())
    }
}
