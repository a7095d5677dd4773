//! Single-file last-round extraction.
//!
//! Runs load, windowing and write in order. Each stage produces an owned
//! value consumed by the next; a failing stage stops the run before any
//! output file is touched by later stages.

use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::config::ExtractorConfig;
use crate::core::loaders::{self, CvFile, CvSeries, LoaderError};
use crate::core::transforms::{self, LastRound, TransformError};
use crate::core::writers::{self, WriteError};

/// Errors that can occur while extracting the last round of a file.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to load '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: LoaderError,
    },

    #[error("failed to find last round in '{path}': {source}")]
    Window {
        path: PathBuf,
        #[source]
        source: TransformError,
    },

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl ExtractError {
    /// True when the input file content is at fault.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, ExtractError::Load { source, .. } if source.is_malformed())
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Summary of a completed extraction.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub header_lines: usize,
    pub input_samples: usize,
    pub output_samples: usize,
    pub round: LastRound,
}

impl ExtractionReport {
    /// Status lines produced while windowing, in emission order.
    pub fn diagnostics(&self) -> &[String] {
        &self.round.diagnostics
    }
}

/// Window an already loaded file, returning the selection and its samples.
pub fn window_last_round(
    file: &CvFile,
    tolerance: f64,
) -> std::result::Result<(LastRound, CvSeries), TransformError> {
    let round = transforms::find_last_round(&file.series, tolerance)?;
    let samples = transforms::slice_window(&file.series, round.window);
    Ok((round, samples))
}

/// Extract the last sweep cycle of a CHI export and write it next to the input.
///
/// # Arguments
///
/// * `input` - CHI text export
/// * `output` - Explicit output path; derived from `input` and
///   `config.output_suffix` when `None`
/// * `config` - Extractor settings
///
/// # Returns
///
/// An `ExtractionReport` carrying the selected window and diagnostics.
pub fn extract_last_round(
    input: &Path,
    output: Option<&Path>,
    config: &ExtractorConfig,
) -> Result<ExtractionReport> {
    info!("The file to process is {}", input.display());

    let file = loaders::load_cv_file(input, &config.segment_marker).map_err(|source| {
        ExtractError::Load {
            path: input.to_path_buf(),
            source,
        }
    })?;

    let (round, samples) =
        window_last_round(&file, config.peak_tolerance).map_err(|source| ExtractError::Window {
            path: input.to_path_buf(),
            source,
        })?;

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => writers::last_round_path(input, &config.output_suffix)?,
    };

    writers::write_last_round(&output, &file.header, &samples)?;

    debug!(
        "Wrote {} of {} samples to {}",
        samples.len(),
        file.series.len(),
        output.display()
    );

    Ok(ExtractionReport {
        input: input.to_path_buf(),
        output,
        header_lines: file.header.line_count(),
        input_samples: file.series.len(),
        output_samples: samples.len(),
        round,
    })
}
