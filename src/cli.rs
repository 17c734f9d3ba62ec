use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::config::{Config, LapSource, MergeOptions};
use crate::error::AppError;
use crate::pipeline::{self, MergeSummary};
use crate::types::activity::{ClockOffset, FileFormat};

#[derive(Parser, Debug)]
#[command(author, version, about = "Splice heart rate from one workout recording into another", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge a structural recording with a heart-rate recording into one TCX file
    Merge(MergeArgs),
    /// Serve the merge API over HTTP
    Serve,
}

#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// Record missing heart-rate readings as 0 instead of skipping them
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    pub distance_only: bool,

    /// Recording with distance, cadence and position (TCX or FIT)
    #[arg(value_hint = ValueHint::FilePath)]
    pub structural: PathBuf,

    /// Recording with heart rate (TCX or FIT)
    #[arg(value_hint = ValueHint::FilePath)]
    pub heart_rate: PathBuf,

    /// Output TCX path
    #[arg(short, long, default_value = "converted.tcx", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Which recording provides the laps and the output document
    #[arg(long, value_enum)]
    pub lap_source: Option<LapSource>,

    /// Hours added to structural timestamps
    #[arg(long, allow_hyphen_values = true)]
    pub structural_offset_hours: Option<i64>,

    /// Hours added to heart-rate timestamps
    #[arg(long, allow_hyphen_values = true)]
    pub heart_rate_offset_hours: Option<i64>,

    /// Drop structural points that have no heart-rate value for their second
    #[arg(long, action = ArgAction::SetTrue)]
    pub require_heart_rate: bool,
}

impl MergeArgs {
    /// Command-line flags layered over the environment configuration.
    pub fn options(&self, config: &Config) -> MergeOptions {
        let mut options = config.merge;
        options.distance_only = self.distance_only;
        if let Some(lap_source) = self.lap_source {
            options.lap_source = lap_source;
        }
        if let Some(hours) = self.structural_offset_hours {
            options.structural_offset = ClockOffset::hours(hours);
        }
        if let Some(hours) = self.heart_rate_offset_hours {
            options.heart_rate_offset = ClockOffset::hours(hours);
        }
        options.require_heart_rate |= self.require_heart_rate;
        options
    }
}

/// Reads both inputs, merges them and writes the output file. Nothing is written
/// unless the whole merge succeeds.
pub fn run_merge(args: &MergeArgs, config: &Config) -> Result<MergeSummary, AppError> {
    let options = args.options(config);
    let structural_format = detect_format(&args.structural)?;
    let heart_rate_format = detect_format(&args.heart_rate)?;

    let structural = read_input(&args.structural)?;
    let heart_rate = read_input(&args.heart_rate)?;

    let (document, summary) = pipeline::splice_bytes(
        &structural,
        structural_format,
        &heart_rate,
        heart_rate_format,
        &options,
    )?;

    std::fs::write(&args.output, document).map_err(|e| {
        AppError::Internal(format!("Failed to write {}: {}", args.output.display(), e))
    })?;
    tracing::info!("File saved to {}", args.output.display());
    Ok(summary)
}

fn detect_format(path: &Path) -> Result<FileFormat, AppError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(FileFormat::from_filename)
        .ok_or_else(|| AppError::BadRequest(format!("Unsupported file format: {}", path.display())))
}

fn read_input(path: &Path) -> Result<Vec<u8>, AppError> {
    std::fs::read(path)
        .map_err(|e| AppError::BadRequest(format!("Failed to read {}: {}", path.display(), e)))
}
