//! BED file reading and writing.
//!
//! On disk BED is 0-based and half-open; in memory intervals are 1-based
//! and closed. The reader adds one to the start column, the writer
//! subtracts it again. The end column is identical in both conventions.

use crate::chromosome;
use crate::interval::{Interval, IntervalError};
use crate::interval_set::IntervalSet;
use memchr::memchr_iter;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during BED parsing.
#[derive(Error, Debug)]
pub enum BedError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Interval(#[from] IntervalError),
}

pub type Result<T> = std::result::Result<T, BedError>;

/// Default output buffer size (2 MB).
const DEFAULT_OUTPUT_BUFFER: usize = 2 * 1024 * 1024;

/// Returns true for lines kept as headers instead of records.
#[inline]
fn is_header_line(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("track ") || line.starts_with("browser ")
}

/// A streaming BED file reader.
pub struct BedReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
    headers: Vec<String>,
    normalize_chromosomes: bool,
}

impl BedReader<File> {
    /// Open a BED file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> BedReader<R> {
    /// Create a new BED reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(1024),
            headers: Vec::new(),
            normalize_chromosomes: false,
        }
    }

    /// Rewrite chromosome names to the `chr`-prefixed normalized form.
    pub fn with_normalized_chromosomes(mut self, enabled: bool) -> Self {
        self.normalize_chromosomes = enabled;
        self
    }

    /// Header lines (`#`, `track`, `browser`) seen so far.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn into_headers(self) -> Vec<String> {
        self.headers
    }

    /// Read the next record, converting it to 1-based closed coordinates.
    pub fn read_record(&mut self) -> Result<Option<Interval>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }
            if is_header_line(line) {
                self.headers.push(line.trim().to_string());
                continue;
            }

            let record = self.parse_line(line)?;
            return Ok(Some(record));
        }
    }

    /// Parse a single BED line.
    fn parse_line(&self, line: &str) -> Result<Interval> {
        let bytes = line.as_bytes();
        let mut fields: Vec<&str> = Vec::with_capacity(8);
        let mut prev = 0;
        for tab in memchr_iter(b'\t', bytes) {
            fields.push(&line[prev..tab]);
            prev = tab + 1;
        }
        fields.push(&line[prev..]);

        if fields.len() < 3 {
            return Err(self.parse_error(format!(
                "BED line with less than three fields: '{}'",
                line.trim()
            )));
        }

        let start0 = self.parse_position(fields[1], "start")?;
        let end = self.parse_position(fields[2], "end")?;
        let start = start0
            .checked_add(1)
            .ok_or_else(|| self.parse_error(format!("Start position out of range: {}", start0)))?;

        let chrom = if self.normalize_chromosomes {
            chromosome::normalize(fields[0])
        } else {
            fields[0].to_string()
        };
        if chrom.is_empty() {
            return Err(self.parse_error("empty chromosome name".to_string()));
        }

        let annotations = fields[3..].iter().map(|s| s.to_string()).collect();
        Interval::with_annotations(chrom, start, end, annotations).map_err(|_| {
            self.parse_error(format!(
                "Invalid range: start ({}) must be smaller than end ({})",
                start0, end
            ))
        })
    }

    fn parse_position(&self, s: &str, field_name: &str) -> Result<u64> {
        s.trim().parse().map_err(|_| {
            self.parse_error(format!("Invalid {} position: '{}'", field_name, s))
        })
    }

    fn parse_error(&self, message: String) -> BedError {
        BedError::Parse {
            line: self.line_number,
            message,
        }
    }

    /// Get an iterator over all records.
    pub fn records(self) -> BedRecordIter<R> {
        BedRecordIter { reader: self }
    }

    /// Read all remaining records into a set.
    pub fn read_set(&mut self) -> Result<IntervalSet> {
        let mut set = IntervalSet::new();
        while let Some(record) = self.read_record()? {
            set.push(record);
        }
        Ok(set)
    }
}

/// Iterator over BED records.
pub struct BedRecordIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> Iterator for BedRecordIter<R> {
    type Item = Result<Interval>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

/// Open a file for reading, or stdin for `None` / `-`.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(p) if p.as_os_str() != "-" => Ok(Box::new(File::open(p)?)),
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

/// Open a file for writing, or stdout for `None` / `-`.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) if p.as_os_str() != "-" => Ok(Box::new(File::create(p)?)),
        _ => Ok(Box::new(io::stdout().lock())),
    }
}

/// Load a BED file into a set (headers are discarded).
pub fn load<P: AsRef<Path>>(path: P) -> Result<IntervalSet> {
    BedReader::from_path(path)?.read_set()
}

/// Load a BED file, keeping its header lines.
pub fn load_with_headers(path: Option<&Path>) -> Result<(Vec<String>, IntervalSet)> {
    read_input(path, false)
}

/// Load BED input (`None` or `-` is stdin) with its header lines, optionally
/// rewriting chromosome names to the normalized `chr` form.
pub fn read_input(
    path: Option<&Path>,
    normalize_chromosomes: bool,
) -> Result<(Vec<String>, IntervalSet)> {
    let mut reader =
        BedReader::new(open_input(path)?).with_normalized_chromosomes(normalize_chromosomes);
    let set = reader.read_set()?;
    Ok((reader.into_headers(), set))
}

/// Parse BED text (useful for testing).
pub fn parse_intervals(content: &str) -> Result<IntervalSet> {
    BedReader::new(content.as_bytes()).read_set()
}

/// Store a set as BED, preserving the set's order.
pub fn store<P: AsRef<Path>>(path: P, set: &IntervalSet, headers: &[String]) -> Result<()> {
    let file = File::create(path)?;
    write_set(file, set, headers)
}

/// Write a set as BED text to any writer.
pub fn write_set<W: Write>(output: W, set: &IntervalSet, headers: &[String]) -> Result<()> {
    let mut writer = BedWriter::new(output);
    for header in headers {
        writer.write_header(header)?;
    }
    for interval in set.iter() {
        writer.write_interval(interval)?;
    }
    writer.flush()
}

/// Convert a set to BED text.
pub fn to_text(set: &IntervalSet) -> Result<String> {
    let mut out = Vec::new();
    write_set(&mut out, set, &[])?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Buffered BED writer using itoa for coordinates.
pub struct BedWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
}

impl<W: Write> BedWriter<W> {
    pub fn new(output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(DEFAULT_OUTPUT_BUFFER, output),
            itoa_buf: itoa::Buffer::new(),
        }
    }

    /// Write a header line verbatim.
    pub fn write_header(&mut self, header: &str) -> Result<()> {
        self.writer.write_all(header.trim().as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write one interval, converting back to 0-based half-open.
    #[inline]
    pub fn write_interval(&mut self, interval: &Interval) -> Result<()> {
        self.writer.write_all(interval.chrom().as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(interval.start() - 1).as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(interval.end()).as_bytes())?;
        for anno in &interval.annotations {
            self.writer.write_all(b"\t")?;
            self.writer.write_all(anno.as_bytes())?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write a bedgraph-style line `chrom start end value` (1-based closed input).
    #[inline]
    pub fn write_value_line(&mut self, chrom: &str, start: u64, end: u64, value: u64) -> Result<()> {
        if start == 0 {
            return Err(IntervalError::ZeroStart {
                chrom: chrom.to_string(),
                start,
                end,
            }
            .into());
        }
        self.writer.write_all(chrom.as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(start - 1).as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer.write_all(self.itoa_buf.format(end).as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer.write_all(self.itoa_buf.format(value).as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
