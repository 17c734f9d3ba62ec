use fitparser::profile::MesgNum;
use fitparser::Value;

use crate::error::ParseError;
use crate::pipeline::parse::Parser;
use crate::types::activity::{ClockOffset, FileFormat, LapRecord, ParsedActivity, Position, Timestamp, TrackPoint};

pub struct FitParser;

impl Parser for FitParser {
    fn parse(&self, bytes: &[u8], offset: ClockOffset) -> Result<ParsedActivity, ParseError> {
        let data = fitparser::from_bytes(bytes)
            .map_err(|e| ParseError::InvalidFit(format!("Failed to parse FIT file: {}", e)))?;

        let mut points = Vec::new();
        let mut laps = Vec::new();

        for record in data {
            match record.kind() {
                MesgNum::Record => {
                    let mut time = None;
                    let mut distance_meters = None;
                    let mut cadence = None;
                    let mut heart_rate = None;
                    let mut lat = None;
                    let mut lon = None;

                    for field in record.fields() {
                        match field.name() {
                            "timestamp" => time = timestamp(field.value(), offset),
                            "distance" => distance_meters = number(field.value()),
                            "cadence" => cadence = count(field.value()),
                            "heart_rate" => heart_rate = count(field.value()),
                            "position_lat" => {
                                if let Value::SInt32(val) = field.value() {
                                    lat = Some(semicircles_to_degrees(*val));
                                }
                            }
                            "position_long" => {
                                if let Value::SInt32(val) = field.value() {
                                    lon = Some(semicircles_to_degrees(*val));
                                }
                            }
                            _ => {}
                        }
                    }

                    let Some(time) = time else {
                        return Err(ParseError::MissingField {
                            record: "record",
                            index: points.len(),
                            field: "timestamp",
                        });
                    };
                    let position = match (lat, lon) {
                        (Some(lat), Some(lon)) => Some(Position { lat, lon }),
                        _ => None,
                    };
                    points.push(TrackPoint {
                        time,
                        distance_meters,
                        cadence,
                        heart_rate,
                        position,
                        raw: None,
                    });
                }
                MesgNum::Lap => {
                    let mut start_time = None;
                    let mut total_time_seconds = None;
                    for field in record.fields() {
                        match field.name() {
                            "start_time" => start_time = timestamp(field.value(), offset),
                            "total_timer_time" => total_time_seconds = number(field.value()),
                            "total_elapsed_time" if total_time_seconds.is_none() => {
                                total_time_seconds = number(field.value())
                            }
                            _ => {}
                        }
                    }

                    let index = laps.len();
                    let start_time = start_time.ok_or(ParseError::MissingField {
                        record: "lap",
                        index,
                        field: "start_time",
                    })?;
                    let total_time_seconds = total_time_seconds.ok_or(ParseError::MissingField {
                        record: "lap",
                        index,
                        field: "total_timer_time",
                    })?;
                    laps.push(LapRecord {
                        start_time,
                        total_time_seconds,
                    });
                }
                _ => {}
            }
        }

        if points.is_empty() {
            return Err(ParseError::EmptyFile);
        }

        // FIT lap messages are written when a lap ends, not when it starts.
        laps.sort_by_key(|lap| lap.start_time);

        Ok(ParsedActivity {
            laps,
            points,
            file_format: FileFormat::Fit,
            document: None,
        })
    }
}

fn timestamp(value: &Value, offset: ClockOffset) -> Option<Timestamp> {
    match value {
        Value::Timestamp(val) => Some(offset.apply(val.naive_utc())),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Float64(v) => Some(*v),
        Value::Float32(v) => Some(f64::from(*v)),
        Value::UInt8(v) | Value::UInt8z(v) | Value::Byte(v) => Some(f64::from(*v)),
        Value::UInt16(v) | Value::UInt16z(v) => Some(f64::from(*v)),
        Value::UInt32(v) | Value::UInt32z(v) => Some(f64::from(*v)),
        Value::SInt8(v) => Some(f64::from(*v)),
        Value::SInt16(v) => Some(f64::from(*v)),
        Value::SInt32(v) => Some(f64::from(*v)),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn count(value: &Value) -> Option<u16> {
    number(value)
        .filter(|v| *v >= 0.0 && *v <= f64::from(u16::MAX))
        .map(|v| v.round() as u16)
}

fn semicircles_to_degrees(semicircles: i32) -> f64 {
    (semicircles as f64) * (180.0 / 2_147_483_648.0)
}
