//! Chromosome name normalization and chromosome sort orders.
//!
//! The engine treats chromosome names as opaque strings. Normalization is
//! only applied when explicitly requested (reader option, karyotype order).

use crate::genome::Genome;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

/// Strip a leading `chr` prefix (any case).
fn strip_prefix(name: &str) -> &str {
    if name.len() > 3 && name[..3].eq_ignore_ascii_case("chr") {
        &name[3..]
    } else {
        name
    }
}

/// Normalize a chromosome name to the `chr`-prefixed form.
///
/// `1` and `CHR1` become `chr1`, `x`/`chrX` become `chrX`, and both `M` and
/// `MT` become `chrMT`. Other names only get the prefix.
pub fn normalize(name: &str) -> String {
    let core = strip_prefix(name.trim());
    if core.eq_ignore_ascii_case("M") || core.eq_ignore_ascii_case("MT") {
        return "chrMT".to_string();
    }
    if core.eq_ignore_ascii_case("X") || core.eq_ignore_ascii_case("Y") {
        return format!("chr{}", core.to_ascii_uppercase());
    }
    format!("chr{}", core)
}

/// Rank used by the karyotype order: autosomes by number, then X, Y, MT,
/// then everything else.
fn karyotype_rank(name: &str) -> (u8, u64) {
    let core = strip_prefix(name);
    if let Ok(n) = core.parse::<u64>() {
        return (0, n);
    }
    if core.eq_ignore_ascii_case("X") {
        (1, 0)
    } else if core.eq_ignore_ascii_case("Y") {
        (2, 0)
    } else if core.eq_ignore_ascii_case("M") || core.eq_ignore_ascii_case("MT") {
        (3, 0)
    } else {
        (4, 0)
    }
}

/// Order in which chromosomes are arranged by [`IntervalSet::sort_by_order`].
///
/// [`IntervalSet::sort_by_order`]: crate::interval_set::IntervalSet::sort_by_order
#[derive(Debug, Clone, Default)]
pub enum ChromosomeOrder {
    /// Plain string comparison (`chr1 < chr10 < chr2`).
    #[default]
    Lexicographic,
    /// `chr1, chr2, ..., chr22, chrX, chrY, chrMT`, then other names lexicographically.
    Karyotype,
    /// Order taken from a genome file; unknown chromosomes go last.
    Custom(FxHashMap<String, usize>),
}

impl ChromosomeOrder {
    /// Use the chromosome order of a genome file.
    pub fn from_genome(genome: &Genome) -> Self {
        let ranks = genome
            .chromosomes()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        ChromosomeOrder::Custom(ranks)
    }

    /// Compare two chromosome names under this order.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            ChromosomeOrder::Lexicographic => a.cmp(b),
            ChromosomeOrder::Karyotype => karyotype_rank(a)
                .cmp(&karyotype_rank(b))
                .then_with(|| a.cmp(b)),
            ChromosomeOrder::Custom(ranks) => {
                let ra = ranks.get(a).copied().unwrap_or(usize::MAX);
                let rb = ranks.get(b).copied().unwrap_or(usize::MAX);
                ra.cmp(&rb).then_with(|| a.cmp(b))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("1"), "chr1");
        assert_eq!(normalize("chr1"), "chr1");
        assert_eq!(normalize("CHRX"), "chrX");
        assert_eq!(normalize("chry"), "chrY");
        assert_eq!(normalize("M"), "chrMT");
        assert_eq!(normalize("chrM"), "chrMT");
        assert_eq!(normalize("MT"), "chrMT");
        assert_eq!(normalize("GL000220.1"), "chrGL000220.1");
    }

    #[test]
    fn test_karyotype_order() {
        let order = ChromosomeOrder::Karyotype;
        let mut names = vec!["chrMT", "chr10", "chrY", "chr2", "chrUn", "chrX", "chr1"];
        names.sort_by(|a, b| order.compare(a, b));
        assert_eq!(names, vec!["chr1", "chr2", "chr10", "chrX", "chrY", "chrMT", "chrUn"]);
    }

    #[test]
    fn test_lexicographic_order() {
        let order = ChromosomeOrder::default();
        assert_eq!(order.compare("chr10", "chr2"), Ordering::Less);
    }

    #[test]
    fn test_genome_order() {
        let mut genome = Genome::new();
        genome.insert("chr9".to_string(), 100);
        genome.insert("chr10".to_string(), 100);
        let order = ChromosomeOrder::from_genome(&genome);
        assert_eq!(order.compare("chr9", "chr10"), Ordering::Less);
        assert_eq!(order.compare("chrZ", "chr10"), Ordering::Greater);
    }
}
