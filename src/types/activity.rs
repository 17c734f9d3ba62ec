use chrono::{Duration, NaiveDateTime};
use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

/// Absolute time at one-second resolution.
pub type Timestamp = NaiveDateTime;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Fixed hour correction applied to every timestamp of one source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockOffset {
    pub hours: i64,
}

impl ClockOffset {
    pub fn hours(hours: i64) -> Self {
        Self { hours }
    }

    pub fn apply(&self, time: NaiveDateTime) -> Timestamp {
        time + Duration::hours(self.hours)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    Tcx,
    Fit,
}

impl FileFormat {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit('.').next()?.to_lowercase();
        match ext.as_str() {
            "tcx" => Some(FileFormat::Tcx),
            "fit" => Some(FileFormat::Fit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Tcx => "tcx",
            FileFormat::Fit => "fit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

/// The XML events of one `<Trackpoint>` element, start and end tags included.
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    pub events: Vec<Event<'static>>,
}

/// A trackpoint as read from either source. Fields the file did not carry stay `None`.
#[derive(Debug, Clone)]
pub struct TrackPoint {
    pub time: Timestamp,
    pub distance_meters: Option<f64>,
    pub cadence: Option<u16>,
    pub heart_rate: Option<u16>,
    pub position: Option<Position>,
    pub raw: Option<RawElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LapRecord {
    pub start_time: Timestamp,
    pub total_time_seconds: f64,
}

#[derive(Debug, Clone)]
pub struct ParsedActivity {
    pub laps: Vec<LapRecord>,
    pub points: Vec<TrackPoint>,
    pub file_format: FileFormat,
    /// Original document bytes, kept for TCX so the writer can re-stream it.
    pub document: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointKind {
    Recorded { raw: Option<RawElement> },
    Filler,
}

/// A point on the merged timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedPoint {
    pub time: Timestamp,
    pub distance_meters: f64,
    pub cadence: u16,
    pub heart_rate: Option<u16>,
    pub position: Option<Position>,
    pub kind: PointKind,
}

impl MergedPoint {
    /// Stationary filler: interpolated heart rate, unchanged distance, zero cadence
    /// and the (0, 0) position sentinel.
    pub fn filler(time: Timestamp, heart_rate: u16, distance_meters: f64) -> Self {
        Self {
            time,
            distance_meters,
            cadence: 0,
            heart_rate: Some(heart_rate),
            position: Some(Position { lat: 0.0, lon: 0.0 }),
            kind: PointKind::Filler,
        }
    }

    pub fn is_filler(&self) -> bool {
        matches!(self.kind, PointKind::Filler)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LapAggregates {
    pub distance_meters: f64,
    /// Maximum cadence seen in the lap. Kept in the speed slot as the legacy tool did.
    pub maximum_speed: f64,
    pub average_speed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedLap {
    pub start_time: Timestamp,
    pub total_time_seconds: f64,
    pub points: Vec<MergedPoint>,
    /// `None` for laps the merge never reached.
    pub aggregates: Option<LapAggregates>,
}

impl MergedLap {
    pub fn new(record: LapRecord) -> Self {
        Self {
            start_time: record.start_time,
            total_time_seconds: record.total_time_seconds,
            points: Vec::new(),
            aggregates: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub spliced_points: usize,
    pub filler_points: usize,
    pub dropped_seconds: usize,
    pub dropped_points: usize,
    pub heart_rate_seconds: usize,
}

#[derive(Debug, Clone)]
pub struct MergedActivity {
    pub laps: Vec<MergedLap>,
    pub stats: MergeStats,
    /// TCX document the lap skeleton came from, if any.
    pub template: Option<Vec<u8>>,
}

impl MergedActivity {
    pub fn total_distance(&self) -> f64 {
        self.laps
            .iter()
            .filter_map(|lap| lap.aggregates.map(|a| a.distance_meters))
            .sum()
    }

    pub fn point_count(&self) -> usize {
        self.laps.iter().map(|lap| lap.points.len()).sum()
    }
}
