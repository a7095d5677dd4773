//! Configuration types for the CV last-round extractor.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings shared by single-file extraction and the batch driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Suffix replacing the input extension on the output file
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,

    /// Token marking segment separator/comment text in CHI exports
    #[serde(default = "default_segment_marker")]
    pub segment_marker: String,

    /// Absolute tolerance when matching samples against the peak voltage.
    /// Zero means exact equality.
    #[serde(default)]
    pub peak_tolerance: f64,

    /// File name for the list of failed paths written by batch runs
    #[serde(default = "default_failure_log")]
    pub failure_log: String,
}

fn default_output_suffix() -> String {
    "_last_round.txt".to_string()
}

fn default_segment_marker() -> String {
    "Segment".to_string()
}

fn default_failure_log() -> String {
    "wrong.txt".to_string()
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            output_suffix: default_output_suffix(),
            segment_marker: default_segment_marker(),
            peak_tolerance: 0.0,
            failure_log: default_failure_log(),
        }
    }
}

impl ExtractorConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ExtractorConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
