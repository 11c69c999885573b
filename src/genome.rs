//! Genome file parser for chromosome sizes.
//!
//! Parses .genome / .fai style files (tab-delimited: chrom\tsize[\t...]).
//! The file order defines a chromosome sort order and the sizes bound
//! `extend` operations.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::bed::BedError;

/// Chromosome sizes in input file order.
#[derive(Debug, Clone, Default)]
pub struct Genome {
    sizes: FxHashMap<String, u64>,
    order: Vec<String>,
}

impl Genome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load genome from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BedError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load genome from any readable source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, BedError> {
        let reader = BufReader::new(reader);
        let mut genome = Genome::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 2 {
                return Err(BedError::Parse {
                    line: line_num + 1,
                    message: "Genome file requires two columns: chrom and size".to_string(),
                });
            }

            let size: u64 = fields[1].parse().map_err(|_| BedError::Parse {
                line: line_num + 1,
                message: format!("Invalid chromosome size: {}", fields[1]),
            })?;

            genome.insert(fields[0].to_string(), size);
        }

        Ok(genome)
    }

    /// Get the size of a chromosome.
    #[inline]
    pub fn chrom_size(&self, chrom: &str) -> Option<u64> {
        self.sizes.get(chrom).copied()
    }

    #[inline]
    pub fn has_chrom(&self, chrom: &str) -> bool {
        self.sizes.contains_key(chrom)
    }

    /// All chromosome names in file order.
    pub fn chromosomes(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Insert a chromosome size (appends to order if new).
    pub fn insert(&mut self, chrom: String, size: u64) {
        if !self.sizes.contains_key(&chrom) {
            self.order.push(chrom.clone());
        }
        self.sizes.insert(chrom, size);
    }
}
