//! Aligned reads and the sources that produce them.
//!
//! A [`ReadSource`] yields reads one at a time. Adapters exist for SAM text
//! ([`SamReader`]), in-memory vectors, and BAM files behind the `bam`
//! feature (`crate::bam`).

use memchr::memchr_iter;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("SAM parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[cfg(feature = "bam")]
    #[error("BAM error: {0}")]
    Bam(#[from] rust_htslib::errors::Error),
}

pub type Result<T> = std::result::Result<T, ReadError>;

/// SAM flag bits used by the filters.
pub mod flags {
    pub const PAIRED: u16 = 0x1;
    pub const PROPER_PAIR: u16 = 0x2;
    pub const UNMAPPED: u16 = 0x4;
    pub const MATE_UNMAPPED: u16 = 0x8;
    pub const REVERSE: u16 = 0x10;
    pub const SECONDARY: u16 = 0x100;
    pub const QC_FAIL: u16 = 0x200;
    pub const DUPLICATE: u16 = 0x400;
    pub const SUPPLEMENTARY: u16 = 0x800;
}

/// A single alignment, reduced to what coverage and pairing need.
///
/// `start` and `end` are 1-based and inclusive; `end` is derived from the
/// CIGAR reference length. Unmapped reads carry position 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedRead {
    pub name: String,
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub mapq: u8,
    pub flags: u16,
}

impl AlignedRead {
    #[inline]
    fn has(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    pub fn is_paired(&self) -> bool {
        self.has(flags::PAIRED)
    }

    #[inline]
    pub fn is_proper_pair(&self) -> bool {
        self.has(flags::PROPER_PAIR)
    }

    #[inline]
    pub fn is_unmapped(&self) -> bool {
        self.has(flags::UNMAPPED)
    }

    #[inline]
    pub fn is_mate_unmapped(&self) -> bool {
        self.has(flags::MATE_UNMAPPED)
    }

    #[inline]
    pub fn is_secondary(&self) -> bool {
        self.has(flags::SECONDARY)
    }

    #[inline]
    pub fn is_supplementary(&self) -> bool {
        self.has(flags::SUPPLEMENTARY)
    }

    #[inline]
    pub fn is_duplicate(&self) -> bool {
        self.has(flags::DUPLICATE)
    }

    /// Paired, mate mapped, but not flagged as a proper pair.
    pub fn is_anomalous(&self) -> bool {
        self.is_paired() && !self.is_mate_unmapped() && !self.is_proper_pair()
    }

    /// Unpaired, or paired with an unmapped mate.
    pub fn is_singleton(&self) -> bool {
        !self.is_paired() || self.is_mate_unmapped()
    }
}

/// Anything carrying a read name; used to match mates.
pub trait NamedRead {
    fn read_name(&self) -> &[u8];
}

impl NamedRead for AlignedRead {
    fn read_name(&self) -> &[u8] {
        self.name.as_bytes()
    }
}

/// A record that carries its parsed alignment, e.g. a SAM line or a raw
/// BAM record, so pair filters can write it back unchanged.
pub trait AlignedRecord: NamedRead {
    fn alignment(&self) -> &AlignedRead;
}

impl AlignedRecord for AlignedRead {
    fn alignment(&self) -> &AlignedRead {
        self
    }
}

/// A pull-based stream of aligned reads.
pub trait ReadSource {
    fn next_read(&mut self) -> Result<Option<AlignedRead>>;
}

impl ReadSource for std::vec::IntoIter<AlignedRead> {
    fn next_read(&mut self) -> Result<Option<AlignedRead>> {
        Ok(self.next())
    }
}

/// Number of reference bases consumed by a CIGAR string (`M`, `D`, `N`, `=`, `X`).
pub fn cigar_reference_length(cigar: &str) -> std::result::Result<u64, String> {
    if cigar == "*" {
        return Ok(0);
    }
    let mut total = 0u64;
    let mut count = 0u64;
    let mut has_digits = false;
    for byte in cigar.bytes() {
        match byte {
            b'0'..=b'9' => {
                count = count * 10 + u64::from(byte - b'0');
                has_digits = true;
            }
            b'M' | b'D' | b'N' | b'=' | b'X' | b'I' | b'S' | b'H' | b'P' => {
                if !has_digits {
                    return Err(format!("missing length before '{}'", byte as char));
                }
                if matches!(byte, b'M' | b'D' | b'N' | b'=' | b'X') {
                    total += count;
                }
                count = 0;
                has_digits = false;
            }
            _ => return Err(format!("invalid operation '{}'", byte as char)),
        }
    }
    if has_digits {
        return Err("trailing length without operation".to_string());
    }
    Ok(total)
}

/// One SAM alignment line together with its parsed form.
#[derive(Debug, Clone)]
pub struct SamRecord {
    pub read: AlignedRead,
    /// The original line without line terminator.
    pub line: String,
}

impl NamedRead for SamRecord {
    fn read_name(&self) -> &[u8] {
        self.read.name.as_bytes()
    }
}

impl AlignedRecord for SamRecord {
    fn alignment(&self) -> &AlignedRead {
        &self.read
    }
}

/// Streaming SAM text reader. Header lines (`@...`) are collected, not returned.
pub struct SamReader<R: Read> {
    reader: BufReader<R>,
    line_buf: String,
    line_number: usize,
    headers: Vec<String>,
}

impl SamReader<File> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> SamReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(256 * 1024, reader),
            line_buf: String::with_capacity(1024),
            line_number: 0,
            headers: Vec::new(),
        }
    }

    /// Header lines seen so far.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Consume the header block at the start of the input and return the
    /// headers seen so far. The first alignment line is left unread.
    pub fn read_headers(&mut self) -> Result<&[String]> {
        loop {
            let at_header = self.reader.fill_buf()?.first() == Some(&b'@');
            if !at_header {
                return Ok(&self.headers);
            }
            self.line_buf.clear();
            self.reader.read_line(&mut self.line_buf)?;
            self.line_number += 1;
            self.headers
                .push(self.line_buf.trim_end_matches(['\n', '\r']).to_string());
        }
    }

    /// Read the next alignment line.
    pub fn next_record(&mut self) -> Result<Option<SamRecord>> {
        loop {
            self.line_buf.clear();
            if self.reader.read_line(&mut self.line_buf)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.line_buf.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }
            if line.starts_with('@') {
                self.headers.push(line.to_string());
                continue;
            }

            let read = parse_sam_line(line, self.line_number)?;
            return Ok(Some(SamRecord {
                read,
                line: line.to_string(),
            }));
        }
    }
}

impl<R: Read> ReadSource for SamReader<R> {
    fn next_read(&mut self) -> Result<Option<AlignedRead>> {
        Ok(self.next_record()?.map(|record| record.read))
    }
}

fn parse_sam_line(line: &str, line_number: usize) -> Result<AlignedRead> {
    let bytes = line.as_bytes();
    let mut fields: [&str; 6] = [""; 6];
    let mut field = 0;
    let mut begin = 0;
    for pos in memchr_iter(b'\t', bytes).chain(std::iter::once(bytes.len())) {
        if field == fields.len() {
            break;
        }
        fields[field] = &line[begin..pos];
        field += 1;
        begin = pos + 1;
    }

    let parse_error = |message: String| ReadError::Parse {
        line: line_number,
        message,
    };

    if field < fields.len() {
        return Err(parse_error(format!(
            "expected at least 6 columns, found {}",
            field
        )));
    }

    let [name, flag, chrom, pos, mapq, cigar] = fields;
    let flags: u16 = flag
        .parse()
        .map_err(|_| parse_error(format!("invalid FLAG '{}'", flag)))?;
    let start: u64 = pos
        .parse()
        .map_err(|_| parse_error(format!("invalid POS '{}'", pos)))?;
    let mapq: u8 = mapq
        .parse()
        .map_err(|_| parse_error(format!("invalid MAPQ '{}'", mapq)))?;
    if start == 0 && flags & self::flags::UNMAPPED == 0 {
        return Err(parse_error(format!(
            "mapped read '{}' has POS 0 (positions are 1-based)",
            name
        )));
    }
    let ref_len = cigar_reference_length(cigar)
        .map_err(|e| parse_error(format!("invalid CIGAR '{}': {}", cigar, e)))?;

    let end = if ref_len == 0 { start } else { start + ref_len - 1 };

    Ok(AlignedRead {
        name: name.to_string(),
        chrom: chrom.to_string(),
        start,
        end,
        mapq,
        flags,
    })
}
