pub mod aggregate;
pub mod laps;
pub mod merge;
pub mod parse;
pub mod resample;
pub mod write;

use serde::Serialize;

use crate::config::{LapSource, MergeOptions};
use crate::error::AppError;
use crate::types::activity::{FileFormat, MergeStats, MergedActivity, ParsedActivity, TIMESTAMP_FORMAT};
use crate::types::heart_rate::HeartRateSeries;

/// Merges a parsed structural recording with a parsed heart-rate recording.
pub fn splice(
    structural: ParsedActivity,
    heart_rate: ParsedActivity,
    options: &MergeOptions,
) -> Result<MergedActivity, AppError> {
    let samples = HeartRateSeries::from_points(&heart_rate.points, options.distance_only);
    let dense = resample::densify(&samples)?;
    tracing::info!(
        "Resampled {} heart-rate samples to {} seconds",
        samples.len(),
        dense.len()
    );

    let (laps, template) = match options.lap_source {
        LapSource::HeartRate => (heart_rate.laps, heart_rate.document),
        LapSource::Structural => (structural.laps, structural.document),
    };

    let points = merge::structural_points(structural.points)?;
    let rules = merge::SpliceRules {
        require_heart_rate: options.require_heart_rate,
    };
    let (laps, stats) = merge::merge(laps, points, dense, rules)?;

    let merged = MergedActivity {
        laps,
        stats,
        template,
    };
    tracing::info!(
        "Merged {} laps: {} spliced, {} filler, {} dropped seconds, {} dropped points, {:.0} m",
        merged.laps.len(),
        stats.spliced_points,
        stats.filler_points,
        stats.dropped_seconds,
        stats.dropped_points,
        merged.total_distance()
    );
    Ok(merged)
}

/// Parses both recordings, merges them and serializes the result to TCX.
pub fn splice_bytes(
    structural: &[u8],
    structural_format: FileFormat,
    heart_rate: &[u8],
    heart_rate_format: FileFormat,
    options: &MergeOptions,
) -> Result<(Vec<u8>, MergeSummary), AppError> {
    let structural = parse::parse(structural, structural_format, options.structural_offset)?;
    let heart_rate = parse::parse(heart_rate, heart_rate_format, options.heart_rate_offset)?;
    let merged = splice(structural, heart_rate, options)?;
    let document = write::write(&merged)?;
    Ok((document, MergeSummary::from(&merged)))
}

#[derive(Debug, Clone, Serialize)]
pub struct LapSummary {
    pub start_time: String,
    pub total_time_seconds: f64,
    pub points: usize,
    pub distance_meters: Option<f64>,
    pub maximum_speed: Option<f64>,
    pub average_speed: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub laps: Vec<LapSummary>,
    pub stats: MergeStats,
    pub total_distance_meters: f64,
}

impl From<&MergedActivity> for MergeSummary {
    fn from(activity: &MergedActivity) -> Self {
        let laps = activity
            .laps
            .iter()
            .map(|lap| LapSummary {
                start_time: lap.start_time.format(TIMESTAMP_FORMAT).to_string(),
                total_time_seconds: lap.total_time_seconds,
                points: lap.points.len(),
                distance_meters: lap.aggregates.map(|a| a.distance_meters),
                maximum_speed: lap.aggregates.map(|a| a.maximum_speed),
                average_speed: lap.aggregates.map(|a| a.average_speed),
            })
            .collect();

        Self {
            laps,
            stats: activity.stats,
            total_distance_meters: activity.total_distance(),
        }
    }
}
