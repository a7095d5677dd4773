//! Sequential batch extraction over a directory of CHI exports.

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};
use thiserror::Error;

use super::last_round::{extract_last_round, ExtractError, ExtractionReport};
use crate::config::ExtractorConfig;
use crate::core::writers::{self, WriteError};

/// Errors that abort a batch run as a whole.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Failed to list directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write failure list: {0}")]
    FailureLog(#[from] WriteError),
}

/// Result type for batch operations.
pub type Result<T> = std::result::Result<T, BatchError>;

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Files attempted.
    pub processed: usize,
    /// Files extracted without error.
    pub succeeded: usize,
    /// Failing paths with their error messages, in processing order.
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn failed_paths(&self) -> Vec<PathBuf> {
        self.failures.iter().map(|(path, _)| path.clone()).collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// List candidate input files in `dir`, sorted by path.
///
/// Subdirectories, previous outputs (names ending in `config.output_suffix`),
/// files named `config.failure_log` and `failure_log` (wherever the failure
/// list is actually written) are skipped.
pub fn find_inputs(
    dir: &Path,
    config: &ExtractorConfig,
    failure_log: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(BatchError::DirectoryNotFound(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|source| BatchError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut inputs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            !name.ends_with(&config.output_suffix) && name != config.failure_log
        })
        .filter(|path| !failure_log.is_some_and(|log| same_file(path, log)))
        .collect();

    inputs.sort();
    Ok(inputs)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Extract the last round of every input file in `dir`, one at a time.
///
/// A failing file is logged and recorded; processing continues with the
/// next file. `on_file` is called after each file with its outcome.
/// `failure_log` is the path the failure list will be written to, if any;
/// it is never treated as an input.
pub fn run_batch<F>(
    dir: &Path,
    config: &ExtractorConfig,
    failure_log: Option<&Path>,
    mut on_file: F,
) -> Result<BatchSummary>
where
    F: FnMut(&Path, &std::result::Result<ExtractionReport, ExtractError>),
{
    let inputs = find_inputs(dir, config, failure_log)?;
    info!("Found {} files in {}", inputs.len(), dir.display());

    let mut summary = BatchSummary::default();

    for input in &inputs {
        summary.processed += 1;
        let outcome = extract_last_round(input, None, config);

        match &outcome {
            Ok(report) => {
                summary.succeeded += 1;
                for line in report.diagnostics() {
                    info!("{}: {}", input.display(), line);
                }
            }
            Err(e) => {
                error!("{}: {}", input.display(), e);
                summary.failures.push((input.clone(), e.to_string()));
            }
        }

        on_file(input, &outcome);
    }

    Ok(summary)
}

/// Write the failing paths of `summary` to `path`, one per line.
pub fn write_failure_log(path: &Path, summary: &BatchSummary) -> Result<()> {
    writers::write_path_list(path, &summary.failed_paths())?;
    Ok(())
}
