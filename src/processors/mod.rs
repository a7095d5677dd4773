//! Extraction pipelines built on the core loaders, transforms and writers.

pub mod batch;
pub mod last_round;

// Re-export key types for convenience
pub use batch::{find_inputs, run_batch, write_failure_log, BatchError, BatchSummary};
pub use last_round::{extract_last_round, window_last_round, ExtractError, ExtractionReport};
