use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::activity::ClockOffset;

/// Hours added to timestamps of the structural (distance/cadence) recording.
pub const STRUCTURAL_CLOCK_OFFSET_HOURS: i64 = 0;
/// Hours added to timestamps of the heart-rate recording. The two recorders
/// disagree on local time by this much; the value is carried over unverified.
pub const HEART_RATE_CLOCK_OFFSET_HOURS: i64 = 2;

/// Which input provides the lap skeleton and the output document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LapSource {
    #[default]
    HeartRate,
    Structural,
}

impl FromStr for LapSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "heart-rate" | "heart_rate" | "heartrate" => Ok(LapSource::HeartRate),
            "structural" => Ok(LapSource::Structural),
            other => Err(format!("Unknown lap source: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    pub structural_offset: ClockOffset,
    pub heart_rate_offset: ClockOffset,
    pub lap_source: LapSource,
    /// Zero-fill missing heart-rate readings before resampling.
    pub distance_only: bool,
    /// Drop structural points that have no heart-rate value for their own second.
    pub require_heart_rate: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            structural_offset: ClockOffset::hours(STRUCTURAL_CLOCK_OFFSET_HOURS),
            heart_rate_offset: ClockOffset::hours(HEART_RATE_CLOCK_OFFSET_HOURS),
            lap_source: LapSource::HeartRate,
            distance_only: false,
            require_heart_rate: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub max_file_size: usize,
    pub cache_ttl: Duration,
    pub merge: MergeOptions,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let max_file_size_mb = std::env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(25);

        let cache_ttl_seconds = std::env::var("CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);

        let structural_offset_hours = std::env::var("HRSPLICE_STRUCTURAL_OFFSET_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(STRUCTURAL_CLOCK_OFFSET_HOURS);

        let heart_rate_offset_hours = std::env::var("HRSPLICE_HEART_RATE_OFFSET_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(HEART_RATE_CLOCK_OFFSET_HOURS);

        let lap_source = std::env::var("HRSPLICE_LAP_SOURCE")
            .ok()
            .and_then(|s| s.parse::<LapSource>().ok())
            .unwrap_or_default();

        let require_heart_rate = std::env::var("HRSPLICE_REQUIRE_HEART_RATE")
            .ok()
            .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            port,
            max_file_size: max_file_size_mb * 1024 * 1024,
            cache_ttl: Duration::from_secs(cache_ttl_seconds),
            merge: MergeOptions {
                structural_offset: ClockOffset::hours(structural_offset_hours),
                heart_rate_offset: ClockOffset::hours(heart_rate_offset_hours),
                lap_source,
                distance_only: false,
                require_heart_rate,
            },
        }
    }
}
