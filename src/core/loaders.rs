//! Loaders for CHI electrochemical-workstation text exports.
//!
//! A CHI cyclic voltammetry export is a free-form header (instrument
//! metadata, step descriptions) followed by two comma-delimited columns:
//! potential and current. Segment separator lines may be interleaved with
//! the numeric rows.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use csv::{ReaderBuilder, Trim};
use log::debug;
use regex::Regex;
use thiserror::Error;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No numeric data row found after {header_lines} header lines")]
    NoNumericData { header_lines: usize },

    #[error("Malformed data at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),
}

impl LoaderError {
    /// True when the input text itself is at fault rather than the filesystem.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            LoaderError::Csv(_)
                | LoaderError::NoNumericData { .. }
                | LoaderError::Malformed { .. }
                | LoaderError::EmptyFile(_)
        )
    }
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Descriptive preamble preceding the first numeric row, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    text: String,
    line_count: usize,
}

impl HeaderBlock {
    /// Raw header text, line terminators included.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of header lines.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.line_count == 0
    }
}

/// Potential/current samples in acquisition order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CvSeries {
    /// Applied potential for each sample.
    pub voltage: Vec<f64>,
    /// Measured current for each sample.
    pub current: Vec<f64>,
}

impl CvSeries {
    /// Creates a new empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new series with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            voltage: Vec::with_capacity(capacity),
            current: Vec::with_capacity(capacity),
        }
    }

    /// Creates a series from two equal-length columns.
    ///
    /// Returns `None` if the columns differ in length.
    pub fn from_columns(voltage: Vec<f64>, current: Vec<f64>) -> Option<Self> {
        if voltage.len() != current.len() {
            return None;
        }
        Some(Self { voltage, current })
    }

    /// Returns the number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.voltage.len()
    }

    /// Returns true if the series holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty()
    }

    /// Adds a sample to the series.
    #[inline]
    pub fn push(&mut self, voltage: f64, current: f64) {
        self.voltage.push(voltage);
        self.current.push(current);
    }

    /// Potential step between the first two samples.
    pub fn sample_interval(&self) -> Option<f64> {
        match self.voltage.as_slice() {
            [first, second, ..] => Some((first - second).abs()),
            _ => None,
        }
    }

    /// Iterates over `(voltage, current)` pairs.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.voltage.iter().copied().zip(self.current.iter().copied())
    }
}

/// A loaded CV export: header plus numeric body.
#[derive(Debug, Clone)]
pub struct CvFile {
    pub header: HeaderBlock,
    pub series: CvSeries,
    /// Source file path.
    pub source_path: Option<PathBuf>,
}

fn numeric_row_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"-?\d+\.\d+, -?\d+\.\d+").expect("numeric row pattern is valid")
    })
}

/// Returns true if `line` looks like a CHI `"<potential>, <current>"` row.
pub fn is_numeric_row(line: &str, segment_marker: &str) -> bool {
    if !segment_marker.is_empty() && line.contains(segment_marker) {
        return false;
    }
    numeric_row_pattern().is_match(line)
}

/// Split raw file content into the header block and the numeric body.
///
/// The header ends at the first line matching the numeric row pattern that
/// does not carry the segment marker. The body is returned as a slice of
/// `content` starting at that line.
///
/// # Errors
///
/// Returns `LoaderError::NoNumericData` if no line matches.
pub fn split_header<'a>(content: &'a str, segment_marker: &str) -> Result<(HeaderBlock, &'a str)> {
    let mut offset = 0;
    let mut line_count = 0;

    for line in content.split_inclusive('\n') {
        if is_numeric_row(line, segment_marker) {
            let header = HeaderBlock {
                text: content[..offset].to_string(),
                line_count,
            };
            return Ok((header, &content[offset..]));
        }
        offset += line.len();
        line_count += 1;
    }

    Err(LoaderError::NoNumericData {
        header_lines: line_count,
    })
}

/// Parse the numeric body of a CHI export into a `CvSeries`.
///
/// Text from `segment_marker` to end of line is treated as a comment and
/// rows left blank are skipped. Every other row must hold exactly two
/// numeric fields.
///
/// # Arguments
///
/// * `body` - Text following the header block
/// * `first_line` - 1-based line number of the first body line, for error messages
/// * `segment_marker` - Comment token (empty disables comment stripping)
pub fn parse_series(body: &str, first_line: usize, segment_marker: &str) -> Result<CvSeries> {
    let mut cleaned = String::with_capacity(body.len());
    let mut line_numbers = Vec::new();

    for (idx, raw) in body.lines().enumerate() {
        let data = match raw.find(segment_marker) {
            Some(pos) if !segment_marker.is_empty() => &raw[..pos],
            _ => raw,
        };
        let data = data.trim();
        if data.is_empty() {
            continue;
        }
        cleaned.push_str(data);
        cleaned.push('\n');
        line_numbers.push(first_line + idx);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(cleaned.as_bytes());

    let mut series = CvSeries::with_capacity(line_numbers.len());

    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .and_then(|p| line_numbers.get(p.line().saturating_sub(1) as usize))
            .or_else(|| line_numbers.get(idx))
            .copied()
            .unwrap_or(first_line + idx);

        if record.len() != 2 {
            return Err(LoaderError::Malformed {
                line,
                reason: format!("expected 2 fields, found {}", record.len()),
            });
        }

        let parse_field = |field: &str| -> Result<f64> {
            field.parse::<f64>().map_err(|_| LoaderError::Malformed {
                line,
                reason: format!("invalid number '{}'", field),
            })
        };

        let voltage = parse_field(&record[0])?;
        let current = parse_field(&record[1])?;
        series.push(voltage, current);
    }

    Ok(series)
}

/// Split and parse CV export content already held in memory.
pub fn parse_cv_content(content: &str, segment_marker: &str) -> Result<CvFile> {
    let (header, body) = split_header(content, segment_marker)?;
    let series = parse_series(body, header.line_count() + 1, segment_marker)?;

    if series.is_empty() {
        return Err(LoaderError::NoNumericData {
            header_lines: header.line_count(),
        });
    }

    Ok(CvFile {
        header,
        series,
        source_path: None,
    })
}

/// Load a CHI cyclic voltammetry export from disk.
///
/// # Arguments
///
/// * `path` - Path to the CHI text export
/// * `segment_marker` - Segment separator token (normally `"Segment"`)
///
/// # Errors
///
/// Returns an error if the file cannot be read, contains no numeric rows,
/// or a data row does not hold exactly two numbers.
pub fn load_cv_file<P: AsRef<Path>>(path: P, segment_marker: &str) -> Result<CvFile> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    if content.trim().is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    let mut file = parse_cv_content(&content, segment_marker)?;
    file.source_path = Some(path.to_path_buf());

    debug!(
        "Loaded {}: {} header lines, {} samples",
        path.display(),
        file.header.line_count(),
        file.series.len()
    );

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CHI_SAMPLE: &str = "Apr. 15, 2018   10:21:03\r\n\
Cyclic Voltammetry\r\n\
Init E (V) = 0.2\r\n\
\r\n\
Potential/V, Current/A\r\n\
\r\n\
0.200, -1.234e-6\r\n\
0.210, -1.100e-6\r\n\
Segment 2:\r\n\
0.220, 2.5e-7\r\n";

    #[test]
    fn test_numeric_row_detection() {
        assert!(is_numeric_row("0.200, -1.234e-6\n", "Segment"));
        assert!(is_numeric_row("-0.100, 3.0\n", "Segment"));
        assert!(!is_numeric_row("Potential/V, Current/A\n", "Segment"));
        assert!(!is_numeric_row("Init E (V) = 0.2\n", "Segment"));
        assert!(!is_numeric_row("Segment 1: 0.200, 1.000\n", "Segment"));
    }

    #[test]
    fn test_split_header_preserves_bytes() {
        let (header, body) = split_header(CHI_SAMPLE, "Segment").unwrap();
        assert_eq!(header.line_count(), 6);
        assert_eq!(
            header.as_str(),
            "Apr. 15, 2018   10:21:03\r\nCyclic Voltammetry\r\nInit E (V) = 0.2\r\n\r\nPotential/V, Current/A\r\n\r\n"
        );
        assert!(body.starts_with("0.200, -1.234e-6"));
    }

    #[test]
    fn test_split_header_without_data() {
        let err = split_header("header only\nno numbers here\n", "Segment").unwrap_err();
        assert!(matches!(err, LoaderError::NoNumericData { header_lines: 2 }));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_parse_skips_segment_lines() {
        let file = parse_cv_content(CHI_SAMPLE, "Segment").unwrap();
        assert_eq!(file.series.len(), 3);
        assert_eq!(file.series.voltage, vec![0.2, 0.21, 0.22]);
        assert_eq!(file.series.current[2], 2.5e-7);
    }

    #[test]
    fn test_parse_rejects_three_fields() {
        let err = parse_series("0.1, 0.2\n0.3, 0.4, 0.5\n", 4, "Segment").unwrap_err();
        match err {
            LoaderError::Malformed { line, reason } => {
                assert_eq!(line, 5);
                assert!(reason.contains("found 3"));
            }
            other => panic!("Expected Malformed error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_non_numeric_field() {
        let err = parse_series("0.1, 0.2\n0.3, abc\n", 1, "Segment").unwrap_err();
        assert!(matches!(err, LoaderError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_sample_interval() {
        let series = CvSeries::from_columns(vec![0.2, 0.19, 0.18], vec![0.0; 3]).unwrap();
        let interval = series.sample_interval().unwrap();
        assert!((interval - 0.01).abs() < 1e-12);
        assert!(CvSeries::from_columns(vec![0.0], vec![]).is_none());
    }

    #[test]
    fn test_load_cv_file() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", CHI_SAMPLE).unwrap();
        file.flush().unwrap();

        let loaded = load_cv_file(file.path(), "Segment")?;
        assert_eq!(loaded.series.len(), 3);
        assert_eq!(loaded.source_path.as_deref(), Some(file.path()));

        Ok(())
    }

    #[test]
    fn test_load_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let err = load_cv_file(file.path(), "Segment").unwrap_err();
        assert!(matches!(err, LoaderError::EmptyFile(_)));
        assert!(err.is_malformed());
    }
}
