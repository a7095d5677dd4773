//! Command-line interface for the CV last-round extractor.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::ExtractorConfig;
use crate::processors::{batch, last_round};

/// Prefix for user-facing status lines.
const STATUS_PREFIX: &str = "------>  ";

#[derive(Parser)]
#[command(name = "cv-last-round")]
#[command(about = "Extract the last sweep cycle from CHI cyclic voltammetry exports", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the last round of a single CHI export
    Extract {
        /// CHI text export to process
        file: PathBuf,
        /// Output file (defaults to <stem>_last_round.txt next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Absolute tolerance for matching the peak potential (0 = exact)
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Extract the last round of every file in a directory
    Batch {
        /// Directory containing CHI text exports
        directory: PathBuf,
        /// Where to write the list of failed files (defaults to <directory>/wrong.txt)
        #[arg(long)]
        failures: Option<PathBuf>,
        /// Do not write a failure list
        #[arg(long)]
        no_failure_log: bool,
        /// Absolute tolerance for matching the peak potential (0 = exact)
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Write a default config file
    InitConfig {
        /// Destination YAML path
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{pos}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 38 {
            let head: String = value.chars().take(35).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<38} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match ExtractorConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                ExtractorConfig::default()
            }
        },
        None => ExtractorConfig::default(),
    };

    let result = match cli.command {
        Commands::Extract { file, output, tolerance } => {
            cmd_extract(&file, output.as_deref(), tolerance, config)
        }
        Commands::Batch { directory, failures, no_failure_log, tolerance } => {
            cmd_batch(&directory, failures, no_failure_log, tolerance, config)
        }
        Commands::InitConfig { path } => cmd_init_config(&path),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn with_tolerance(mut config: ExtractorConfig, tolerance: Option<f64>) -> ExtractorConfig {
    if let Some(tol) = tolerance {
        config.peak_tolerance = tol;
    }
    config
}

fn cmd_extract(
    file: &Path,
    output: Option<&Path>,
    tolerance: Option<f64>,
    config: ExtractorConfig,
) -> Result<()> {
    let config = with_tolerance(config, tolerance);
    let start = Instant::now();

    println!("{}The file to process is {}", STATUS_PREFIX, file.display());

    let report = last_round::extract_last_round(file, output, &config)
        .with_context(|| format!("Extraction failed for {}", file.display()))?;

    for line in report.diagnostics() {
        println!("{}{}", STATUS_PREFIX, line);
    }

    print_summary(
        "Last Round Extraction Complete",
        &[
            ("Input file", report.input.display().to_string()),
            ("Output file", report.output.display().to_string()),
            ("Header lines", report.header_lines.to_string()),
            ("Input samples", report.input_samples.to_string()),
            ("Output samples", report.output_samples.to_string()),
            (
                "Window",
                format!("[{}, {}]", report.round.window.lo, report.round.window.hi),
            ),
            ("Sample interval", report.round.sample_interval.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}

fn cmd_batch(
    directory: &Path,
    failures: Option<PathBuf>,
    no_failure_log: bool,
    tolerance: Option<f64>,
    config: ExtractorConfig,
) -> Result<()> {
    let config = with_tolerance(config, tolerance);
    let start = Instant::now();

    println!("Processing CHI exports in {}", directory.display());

    let failure_log = if no_failure_log {
        None
    } else {
        Some(failures.unwrap_or_else(|| directory.join(&config.failure_log)))
    };

    let spinner = create_spinner("Scanning directory...");

    let summary = batch::run_batch(directory, &config, failure_log.as_deref(), |path, outcome| {
        spinner.inc(1);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match outcome {
            Ok(_) => spinner.set_message(format!("{} done", name)),
            Err(e) => spinner.println(format!("process.....{}: {}", path.display(), e)),
        }
    })
    .with_context(|| format!("Batch run failed for {}", directory.display()))?;

    spinner.finish_and_clear();

    if let Some(path) = &failure_log {
        batch::write_failure_log(path, &summary)
            .with_context(|| format!("Failed to write failure list {}", path.display()))?;
    }

    println!("success {}/{}", summary.succeeded, summary.processed);

    print_summary(
        "Batch Extraction Complete",
        &[
            ("Directory", directory.display().to_string()),
            ("Files processed", summary.processed.to_string()),
            ("Succeeded", summary.succeeded.to_string()),
            ("Failed", summary.failures.len().to_string()),
            (
                "Failure list",
                failure_log
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    if !summary.all_succeeded() {
        anyhow::bail!(
            "{} of {} files failed",
            summary.failures.len(),
            summary.processed
        );
    }

    Ok(())
}

fn cmd_init_config(path: &Path) -> Result<()> {
    ExtractorConfig::default()
        .to_yaml(path)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
