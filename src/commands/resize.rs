//! Extend, shrink and chunk commands.

use crate::bed;
use crate::error::Result;
use crate::genome::Genome;
use crate::interval_set::IntervalSet;
use log::info;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resize {
    /// Add bases on both sides.
    Extend(u64),
    /// Remove bases on both sides, dropping regions that vanish.
    Shrink(u64),
    /// Split long regions into pieces of about this size.
    Chunk(u64),
}

#[derive(Debug, Clone)]
pub struct ResizeCommand {
    pub resize: Resize,
    /// Chromosome sizes to clip extended regions to.
    pub genome: Option<Genome>,
    pub normalize_chromosomes: bool,
}

impl ResizeCommand {
    pub fn new(resize: Resize) -> Self {
        Self {
            resize,
            genome: None,
            normalize_chromosomes: false,
        }
    }

    pub fn with_genome(mut self, genome: Option<Genome>) -> Self {
        self.genome = genome;
        self
    }

    pub fn with_normalized_chromosomes(mut self, enabled: bool) -> Self {
        self.normalize_chromosomes = enabled;
        self
    }

    pub fn apply(&self, set: &mut IntervalSet) -> Result<()> {
        let before = set.len();
        match self.resize {
            Resize::Extend(n) => set.extend(n)?,
            Resize::Shrink(n) => set.shrink(n)?,
            Resize::Chunk(size) => set.chunk(size)?,
        }
        if let Some(genome) = &self.genome {
            set.clamp_to_genome(genome);
        }
        info!("{:?}: {} regions in, {} regions out", self.resize, before, set.len());
        Ok(())
    }

    pub fn run<W: Write>(&self, input: Option<&Path>, output: W) -> Result<()> {
        let (headers, mut set) = bed::read_input(input, self.normalize_chromosomes)?;
        self.apply(&mut set)?;
        bed::write_set(output, &set, &headers)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::interval::IntervalError;

    #[test]
    fn test_extend_with_genome() {
        let mut genome = Genome::new();
        genome.insert("chr1".to_string(), 120);

        let mut set = bed::parse_intervals("chr1\t4\t10\nchr1\t100\t110\n").unwrap();
        ResizeCommand::new(Resize::Extend(20))
            .with_genome(Some(genome))
            .apply(&mut set)
            .unwrap();
        assert_eq!(bed::to_text(&set).unwrap(), "chr1\t0\t30\nchr1\t80\t120\n");
    }

    #[test]
    fn test_shrink_drops_small() {
        let mut set = bed::parse_intervals("chr1\t0\t2\nchr1\t9\t20\n").unwrap();
        ResizeCommand::new(Resize::Shrink(1)).apply(&mut set).unwrap();
        assert_eq!(bed::to_text(&set).unwrap(), "chr1\t10\t19\n");
    }

    #[test]
    fn test_zero_rejected() {
        let mut set = bed::parse_intervals("chr1\t0\t2\n").unwrap();
        let err = ResizeCommand::new(Resize::Chunk(0)).apply(&mut set).unwrap_err();
        assert!(matches!(err, Error::Interval(IntervalError::InvalidArgument(_))));
        assert_eq!(set.len(), 1);
    }
}
