//! Post-processing for CHI electrochemical-workstation cyclic voltammetry exports.
//!
//! This crate provides tools for:
//! - Splitting a CHI text export into its header and potential/current rows
//! - Locating the last complete sweep cycle from repeated peak potentials
//! - Writing that cycle back out under the original header
//! - Running the extraction over a whole directory of exports
//!
//! # Example
//!
//! ```no_run
//! use cv_last_round::{processors::last_round::extract_last_round, ExtractorConfig};
//! use std::path::Path;
//!
//! let report = extract_last_round(Path::new("cv01.txt"), None, &ExtractorConfig::default()).unwrap();
//! for line in report.diagnostics() {
//!     println!("{}", line);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use config::ExtractorConfig;
pub use crate::core::loaders::{CvFile, CvSeries, HeaderBlock};
pub use crate::core::transforms::{LastRound, RoundWindow};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
