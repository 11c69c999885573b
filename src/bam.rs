//! BAM/CRAM input through rust-htslib.
//!
//! Only compiled with the `bam` feature.

use crate::pairs::{filter_pairs, GateStats};
use crate::reads::{AlignedRead, AlignedRecord, NamedRead, ReadSource, Result};
use rust_htslib::bam::{self, Read, Record};
use std::path::Path;

/// Reads alignments from a BAM/SAM/CRAM file as [`AlignedRead`]s.
pub struct BamReadSource {
    reader: bam::Reader,
    record: Record,
    target_names: Vec<String>,
}

impl BamReadSource {
    pub fn from_path<P: AsRef<Path>>(path: P, threads: usize) -> Result<Self> {
        let mut reader = bam::Reader::from_path(path.as_ref())?;
        if threads > 1 {
            reader.set_threads(threads)?;
        }
        let target_names = reader
            .header()
            .target_names()
            .iter()
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect();
        Ok(Self {
            reader,
            record: Record::new(),
            target_names,
        })
    }

    fn convert(&self) -> AlignedRead {
        let record = &self.record;
        let chrom = usize::try_from(record.tid())
            .ok()
            .and_then(|tid| self.target_names.get(tid))
            .cloned()
            .unwrap_or_else(|| "*".to_string());
        let (start, end) = if record.pos() < 0 {
            (0, 0)
        } else {
            let start = record.pos() as u64 + 1;
            // cigar end_pos is 0-based exclusive, i.e. the 1-based inclusive end
            let end = (record.cigar().end_pos() as u64).max(start);
            (start, end)
        };
        AlignedRead {
            name: String::from_utf8_lossy(record.qname()).into_owned(),
            chrom,
            start,
            end,
            mapq: record.mapq(),
            flags: record.flags(),
        }
    }
}

impl ReadSource for BamReadSource {
    fn next_read(&mut self) -> Result<Option<AlignedRead>> {
        match self.reader.read(&mut self.record) {
            None => Ok(None),
            Some(Err(e)) => Err(e.into()),
            Some(Ok(())) => Ok(Some(self.convert())),
        }
    }
}

/// A raw htslib record as a pair-gate member.
pub struct BamRecord {
    pub record: Record,
    pub read: AlignedRead,
}

impl NamedRead for BamRecord {
    fn read_name(&self) -> &[u8] {
        self.record.qname()
    }
}

impl AlignedRecord for BamRecord {
    fn alignment(&self) -> &AlignedRead {
        &self.read
    }
}

/// Copy the pairs of `input` whose mates both pass `predicate` to `output`
/// (BAM), keeping the input header. Secondary and supplementary alignments
/// are skipped.
pub fn filter_bam_pairs<P, F>(input: P, output: P, threads: usize, predicate: F) -> Result<GateStats>
where
    P: AsRef<Path>,
    F: FnMut(&AlignedRead) -> bool,
{
    let mut source = BamReadSource::from_path(input, threads)?;
    let header = bam::Header::from_template(source.reader.header());
    let mut writer = bam::Writer::from_path(output.as_ref(), &header, bam::Format::Bam)?;
    if threads > 1 {
        writer.set_threads(threads)?;
    }

    filter_pairs(
        || match source.reader.read(&mut source.record) {
            None => Ok(None),
            Some(result) => {
                result?;
                Ok(Some(BamRecord {
                    read: source.convert(),
                    record: source.record.clone(),
                }))
            }
        },
        predicate,
        |first: BamRecord, second: BamRecord| {
            writer.write(&first.record)?;
            writer.write(&second.record)?;
            Ok(())
        },
    )
}
