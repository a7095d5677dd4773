//! Writers for extracted CV cycles.
//!
//! Output files keep the source header verbatim and append the windowed
//! samples as `"<potential>, <current>"` rows, so they can be fed back into
//! the same loader.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::loaders::{CvSeries, HeaderBlock};
use super::transforms::format_value;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Input path has no file name to derive an output name from.
    #[error("cannot derive output name from '{0}'")]
    NoFileName(String),
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Derive the output path for an input file.
///
/// The input extension is replaced by `suffix`:
/// `data/cv01.txt` with `_last_round.txt` becomes `data/cv01_last_round.txt`.
/// Files without an extension get the suffix appended to the full name.
pub fn last_round_path(input: &Path, suffix: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| WriteError::NoFileName(input.display().to_string()))?;

    let mut name = stem.to_os_string();
    name.push(suffix);
    Ok(input.with_file_name(name))
}

/// Render header and samples into the final output text.
pub fn render_last_round(header: &HeaderBlock, series: &CvSeries) -> String {
    // ~48 bytes per row covers two shortest-repr f64 values
    let mut out = String::with_capacity(header.as_str().len() + series.len() * 48);
    out.push_str(header.as_str());
    if !header.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for (voltage, current) in series.rows() {
        out.push_str(&format_value(voltage));
        out.push_str(", ");
        out.push_str(&format_value(current));
        out.push('\n');
    }
    out
}

/// Write an extracted cycle with its original header.
///
/// The whole file is rendered in memory and written in one pass, so a
/// successful return leaves the file complete.
///
/// # Arguments
///
/// * `path` - Output file path (parent directories will be created if needed)
/// * `header` - Header block from the source file
/// * `series` - Windowed samples
///
/// # Example
///
/// ```no_run
/// use cv_last_round::core::loaders::{CvSeries, HeaderBlock};
/// use cv_last_round::core::writers::write_last_round;
/// use std::path::Path;
///
/// let series = CvSeries::from_columns(vec![0.1, 0.2], vec![1e-6, 2e-6]).unwrap();
/// write_last_round(Path::new("cv_last_round.txt"), &HeaderBlock::default(), &series).unwrap();
/// ```
pub fn write_last_round(path: &Path, header: &HeaderBlock, series: &CvSeries) -> Result<()> {
    ensure_parent_dirs(path)?;

    let content = render_last_round(header, series);
    let path_str = path.display().to_string();

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path_str.clone(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    writer
        .write_all(content.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| WriteError::WriteFile {
            path: path_str,
            source: e,
        })?;

    Ok(())
}

/// Write a list of paths, one per line.
pub fn write_path_list(path: &Path, paths: &[PathBuf]) -> Result<()> {
    ensure_parent_dirs(path)?;

    let mut content = String::new();
    for p in paths {
        content.push_str(&p.display().to_string());
        content.push('\n');
    }

    fs::write(path, content).map_err(|e| WriteError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })
}
