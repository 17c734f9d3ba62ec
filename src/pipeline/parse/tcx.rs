use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ParseError;
use crate::pipeline::parse::{parse_timestamp, Parser};
use crate::types::activity::{
    ClockOffset, FileFormat, LapRecord, ParsedActivity, Position, RawElement, TrackPoint,
};

pub struct TcxParser;

#[derive(Default)]
struct PointDraft {
    index: usize,
    time: Option<String>,
    distance: Option<String>,
    cadence: Option<String>,
    run_cadence: Option<String>,
    heart_rate: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    raw: Vec<Event<'static>>,
}

#[derive(Default)]
struct LapDraft {
    index: usize,
    start_time: Option<String>,
    total_time: Option<String>,
}

impl Parser for TcxParser {
    fn parse(&self, bytes: &[u8], offset: ClockOffset) -> Result<ParsedActivity, ParseError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut points = Vec::new();
        let mut laps = Vec::new();
        let mut stack: Vec<String> = Vec::new();
        let mut current_point: Option<PointDraft> = None;
        let mut current_lap: Option<LapDraft> = None;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| ParseError::InvalidTcx(e.to_string()))?;

            let mut point_finished = false;
            let mut lap_finished = false;
            let mut eof = false;

            match &event {
                Event::Start(e) => {
                    let name = element_name(e.local_name().as_ref())?;
                    match name.as_str() {
                        "Trackpoint" => {
                            current_point = Some(PointDraft {
                                index: points.len(),
                                ..PointDraft::default()
                            });
                        }
                        "Lap" => {
                            current_lap = Some(LapDraft {
                                index: laps.len(),
                                start_time: attribute(e, "StartTime")?,
                                ..LapDraft::default()
                            });
                        }
                        _ => {}
                    }
                    stack.push(name);
                }
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|e| ParseError::InvalidTcx(e.to_string()))?
                        .into_owned();
                    let top = stack.last().map(String::as_str);
                    let parent = stack.len().checked_sub(2).map(|i| stack[i].as_str());

                    if let Some(point) = current_point.as_mut() {
                        match (top, parent) {
                            (Some("Time"), Some("Trackpoint")) => point.time = Some(text),
                            (Some("DistanceMeters"), Some("Trackpoint")) => point.distance = Some(text),
                            (Some("Cadence"), Some("Trackpoint")) => point.cadence = Some(text),
                            (Some("RunCadence"), _) => point.run_cadence = Some(text),
                            (Some("Value"), Some("HeartRateBpm")) => point.heart_rate = Some(text),
                            (Some("LatitudeDegrees"), Some("Position")) => point.lat = Some(text),
                            (Some("LongitudeDegrees"), Some("Position")) => point.lon = Some(text),
                            _ => {}
                        }
                    } else if let Some(lap) = current_lap.as_mut() {
                        if top == Some("TotalTimeSeconds") && parent == Some("Lap") {
                            lap.total_time = Some(text);
                        }
                    }
                }
                Event::End(e) => {
                    let name = element_name(e.local_name().as_ref())?;
                    match name.as_str() {
                        "Trackpoint" => point_finished = true,
                        "Lap" => lap_finished = true,
                        _ => {}
                    }
                    stack.pop();
                }
                Event::Eof => eof = true,
                _ => {}
            }

            if let Some(point) = current_point.as_mut() {
                point.raw.push(event.into_owned());
            }
            if point_finished {
                if let Some(draft) = current_point.take() {
                    points.push(draft.finish(offset)?);
                }
            }
            if lap_finished {
                if let Some(draft) = current_lap.take() {
                    laps.push(draft.finish(offset)?);
                }
            }
            if eof {
                break;
            }
        }

        if points.is_empty() {
            return Err(ParseError::EmptyFile);
        }

        Ok(ParsedActivity {
            laps,
            points,
            file_format: FileFormat::Tcx,
            document: Some(bytes.to_vec()),
        })
    }
}

impl PointDraft {
    fn finish(self, offset: ClockOffset) -> Result<TrackPoint, ParseError> {
        const RECORD: &str = "Trackpoint";
        let index = self.index;

        let time_text = self.time.ok_or(ParseError::MissingField {
            record: RECORD,
            index,
            field: "Time",
        })?;
        let time = parse_timestamp(&time_text, offset).ok_or_else(|| ParseError::InvalidField {
            record: RECORD,
            index,
            field: "Time",
            value: time_text.clone(),
        })?;

        let distance_meters = self
            .distance
            .map(|text| parse_number(&text).ok_or_else(|| invalid(RECORD, index, "DistanceMeters", text)))
            .transpose()?;

        let cadence = match self.run_cadence.or(self.cadence) {
            Some(text) => Some(parse_count(&text).ok_or_else(|| invalid(RECORD, index, "RunCadence", text))?),
            None => None,
        };

        let heart_rate = self
            .heart_rate
            .map(|text| parse_count(&text).ok_or_else(|| invalid(RECORD, index, "HeartRateBpm", text)))
            .transpose()?;

        let position = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => match (parse_number(&lat), parse_number(&lon)) {
                (Some(lat), Some(lon)) => Some(Position { lat, lon }),
                _ => None,
            },
            _ => None,
        };

        Ok(TrackPoint {
            time,
            distance_meters,
            cadence,
            heart_rate,
            position,
            raw: Some(RawElement { events: self.raw }),
        })
    }
}

impl LapDraft {
    fn finish(self, offset: ClockOffset) -> Result<LapRecord, ParseError> {
        const RECORD: &str = "Lap";
        let index = self.index;

        let start_text = self.start_time.ok_or(ParseError::MissingField {
            record: RECORD,
            index,
            field: "StartTime",
        })?;
        let start_time = parse_timestamp(&start_text, offset)
            .ok_or_else(|| invalid(RECORD, index, "StartTime", start_text.clone()))?;

        let total_text = self.total_time.ok_or(ParseError::MissingField {
            record: RECORD,
            index,
            field: "TotalTimeSeconds",
        })?;
        let total_time_seconds = parse_number(&total_text)
            .ok_or_else(|| invalid(RECORD, index, "TotalTimeSeconds", total_text))?;

        Ok(LapRecord {
            start_time,
            total_time_seconds,
        })
    }
}

fn element_name(bytes: &[u8]) -> Result<String, ParseError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| ParseError::InvalidTcx(e.to_string()))
}

fn attribute(element: &BytesStart<'_>, key: &str) -> Result<Option<String>, ParseError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| ParseError::InvalidTcx(e.to_string()))?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::InvalidTcx(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Non-negative integer counts (cadence, bpm). Some devices write them as decimals.
fn parse_count(text: &str) -> Option<u16> {
    let text = text.trim();
    text.parse::<u16>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && *v <= f64::from(u16::MAX))
            .map(|v| v.round() as u16)
    })
}

fn invalid(record: &'static str, index: usize, field: &'static str, value: String) -> ParseError {
    ParseError::InvalidField {
        record,
        index,
        field,
        value,
    }
}
