use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::WriteError;
use crate::types::activity::{
    LapAggregates, MergedActivity, MergedLap, MergedPoint, PointKind, RawElement, Timestamp,
    TIMESTAMP_FORMAT,
};

const TCX_NAMESPACE: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const ACTIVITY_EXTENSION_V1: &str = "http://www.garmin.com/xmlschemas/ActivityExtension/v1";
const ACTIVITY_EXTENSION_V2: &str = "http://www.garmin.com/xmlschemas/ActivityExtension/v2";
const FAT_CALORIES_V1: &str = "http://www.garmin.com/xmlschemas/FatCalories/v1";

type XmlWriter = Writer<Vec<u8>>;

/// Serializes a merged activity to TCX. With a template the original document is
/// re-streamed and only tracks and lap aggregates change; otherwise a minimal
/// document is built from the merged laps.
pub fn write(activity: &MergedActivity) -> Result<Vec<u8>, WriteError> {
    match &activity.template {
        Some(template) => rewrite_template(template, &activity.laps),
        None => synthesize(&activity.laps),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LapField {
    Distance,
    MaximumSpeed,
    AverageSpeed,
}

impl LapField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"DistanceMeters" => Some(LapField::Distance),
            b"MaximumSpeed" => Some(LapField::MaximumSpeed),
            b"AvgSpeed" => Some(LapField::AverageSpeed),
            _ => None,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }

    fn value(self, aggregates: &LapAggregates) -> String {
        match self {
            LapField::Distance => aggregates.distance_meters.to_string(),
            LapField::MaximumSpeed => aggregates.maximum_speed.to_string(),
            LapField::AverageSpeed => aggregates.average_speed.to_string(),
        }
    }
}

fn rewrite_template(template: &[u8], laps: &[MergedLap]) -> Result<Vec<u8>, WriteError> {
    let mut reader = Reader::from_reader(template);
    reader.trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut merged_laps = laps.iter();
    let mut current: Option<&MergedLap> = None;
    let mut patched = [false; 3];
    let mut replacing: Option<(LapField, LapAggregates)> = None;
    // Depth inside a discarded <Track>; zero when not skipping.
    let mut skip_depth = 0usize;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf).map_err(xml_error)?;
        match &event {
            Event::Eof => break,
            _ if skip_depth > 0 => match &event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                _ => {}
            },
            Event::Start(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if name == b"Lap" {
                    current = merged_laps.next();
                    patched = [false; 3];
                    emit(&mut writer, &event)?;
                } else if current.is_some() && name == b"Track" {
                    skip_depth = 1;
                } else {
                    if let Some((field, aggregates)) = patchable(current, name, &patched) {
                        patched[field.slot()] = true;
                        replacing = Some((field, aggregates));
                    }
                    emit(&mut writer, &event)?;
                }
            }
            Event::Empty(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if current.is_some() && name == b"Track" {
                    // replaced by the merged track at the end of the lap
                } else if let Some((field, aggregates)) = patchable(current, name, &patched) {
                    patched[field.slot()] = true;
                    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    text_element(&mut writer, &tag, &field.value(&aggregates))?;
                } else {
                    emit(&mut writer, &event)?;
                }
            }
            Event::Text(_) => match replacing.take() {
                Some((field, aggregates)) => {
                    emit(&mut writer, &Event::Text(BytesText::new(&field.value(&aggregates))))?;
                }
                None => emit(&mut writer, &event)?,
            },
            Event::End(e) => {
                if let Some((field, aggregates)) = replacing.take() {
                    emit(&mut writer, &Event::Text(BytesText::new(&field.value(&aggregates))))?;
                }
                if e.local_name().as_ref() == b"Lap" {
                    if let Some(lap) = current.take() {
                        write_track(&mut writer, lap)?;
                    }
                }
                emit(&mut writer, &event)?;
            }
            _ => emit(&mut writer, &event)?,
        }
    }

    Ok(writer.into_inner())
}

fn patchable(
    current: Option<&MergedLap>,
    name: &[u8],
    patched: &[bool; 3],
) -> Option<(LapField, LapAggregates)> {
    let aggregates = current?.aggregates?;
    let field = LapField::from_name(name)?;
    if patched[field.slot()] {
        return None;
    }
    Some((field, aggregates))
}

fn synthesize(laps: &[MergedLap]) -> Result<Vec<u8>, WriteError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    emit(&mut writer, &Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("TrainingCenterDatabase");
    root.push_attribute(("xmlns", TCX_NAMESPACE));
    root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
    emit(&mut writer, &Event::Start(root))?;
    start(&mut writer, "Activities")?;

    let mut activity = BytesStart::new("Activity");
    activity.push_attribute(("Sport", "Running"));
    emit(&mut writer, &Event::Start(activity))?;
    if let Some(first) = laps.first() {
        text_element(&mut writer, "Id", &format_time(first.start_time))?;
    }

    for lap in laps {
        let mut lap_start = BytesStart::new("Lap");
        lap_start.push_attribute(("StartTime", format_time(lap.start_time).as_str()));
        emit(&mut writer, &Event::Start(lap_start))?;
        text_element(&mut writer, "TotalTimeSeconds", &lap.total_time_seconds.to_string())?;
        // ActivityLap_t requires DistanceMeters and Calories, in this order.
        match &lap.aggregates {
            Some(aggregates) => {
                text_element(&mut writer, "DistanceMeters", &LapField::Distance.value(aggregates))?;
                text_element(&mut writer, "MaximumSpeed", &LapField::MaximumSpeed.value(aggregates))?;
            }
            None => text_element(&mut writer, "DistanceMeters", "0")?,
        }
        text_element(&mut writer, "Calories", "0")?;
        text_element(&mut writer, "Intensity", "Active")?;
        text_element(&mut writer, "TriggerMethod", "Manual")?;
        write_track(&mut writer, lap)?;
        if let Some(aggregates) = &lap.aggregates {
            start(&mut writer, "Extensions")?;
            let mut lx = BytesStart::new("LX");
            lx.push_attribute(("xmlns", ACTIVITY_EXTENSION_V2));
            emit(&mut writer, &Event::Start(lx))?;
            text_element(&mut writer, "AvgSpeed", &LapField::AverageSpeed.value(aggregates))?;
            end(&mut writer, "LX")?;
            end(&mut writer, "Extensions")?;
        }
        end(&mut writer, "Lap")?;
    }

    end(&mut writer, "Activity")?;
    end(&mut writer, "Activities")?;
    end(&mut writer, "TrainingCenterDatabase")?;
    Ok(writer.into_inner())
}

fn write_track(writer: &mut XmlWriter, lap: &MergedLap) -> Result<(), WriteError> {
    start(writer, "Track")?;
    for point in &lap.points {
        match &point.kind {
            PointKind::Recorded { raw: Some(raw) } => write_raw_point(writer, raw, point.heart_rate)?,
            _ => write_point(writer, point)?,
        }
    }
    end(writer, "Track")
}

/// Replays a recorded trackpoint, replacing (or inserting) its heart-rate value.
fn write_raw_point(writer: &mut XmlWriter, raw: &RawElement, bpm: Option<u16>) -> Result<(), WriteError> {
    let mut depth = 0usize;
    let mut in_heart_rate = false;
    let mut in_value = false;
    let mut heart_rate_written = bpm.is_none();

    for event in &raw.events {
        match event {
            Event::Start(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if depth == 1
                    && !heart_rate_written
                    && matches!(name, b"Cadence" | b"SensorState" | b"Extensions")
                {
                    write_heart_rate(writer, bpm)?;
                    heart_rate_written = true;
                }
                if name == b"HeartRateBpm" {
                    in_heart_rate = true;
                    heart_rate_written = true;
                } else if in_heart_rate && name == b"Value" {
                    in_value = true;
                }
                depth += 1;
                emit(writer, event)?;
            }
            Event::Text(_) if in_value => match bpm {
                Some(bpm) => emit(writer, &Event::Text(BytesText::new(&bpm.to_string())))?,
                None => emit(writer, event)?,
            },
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"Value" => in_value = false,
                    b"HeartRateBpm" => in_heart_rate = false,
                    _ => {}
                }
                if depth == 0 && !heart_rate_written {
                    write_heart_rate(writer, bpm)?;
                    heart_rate_written = true;
                }
                emit(writer, event)?;
            }
            _ => emit(writer, event)?,
        }
    }
    Ok(())
}

/// Builds a trackpoint from its fields. Fillers carry the zeroed footpod extensions.
fn write_point(writer: &mut XmlWriter, point: &MergedPoint) -> Result<(), WriteError> {
    start(writer, "Trackpoint")?;
    text_element(writer, "Time", &format_time(point.time))?;
    if let Some(position) = point.position {
        start(writer, "Position")?;
        text_element(writer, "LatitudeDegrees", &format!("{:?}", position.lat))?;
        text_element(writer, "LongitudeDegrees", &format!("{:?}", position.lon))?;
        end(writer, "Position")?;
    }
    text_element(writer, "DistanceMeters", &point.distance_meters.to_string())?;
    write_heart_rate(writer, point.heart_rate)?;

    start(writer, "Extensions")?;
    if point.is_filler() {
        let mut fat_calories = BytesStart::new("FatCalories");
        fat_calories.push_attribute(("xmlns", FAT_CALORIES_V1));
        emit(writer, &Event::Start(fat_calories))?;
        text_element(writer, "Value", "0")?;
        end(writer, "FatCalories")?;
    }
    let mut extension = BytesStart::new("ActivityTrackpointExtension");
    extension.push_attribute(("xmlns", ACTIVITY_EXTENSION_V1));
    extension.push_attribute(("SourceSensor", "Footpod"));
    emit(writer, &Event::Start(extension))?;
    text_element(writer, "RunCadence", &point.cadence.to_string())?;
    end(writer, "ActivityTrackpointExtension")?;
    end(writer, "Extensions")?;

    end(writer, "Trackpoint")
}

fn write_heart_rate(writer: &mut XmlWriter, bpm: Option<u16>) -> Result<(), WriteError> {
    let Some(bpm) = bpm else {
        return Ok(());
    };
    let mut element = BytesStart::new("HeartRateBpm");
    element.push_attribute(("xsi:type", "HeartRateInBeatsPerMinute_t"));
    emit(writer, &Event::Start(element))?;
    text_element(writer, "Value", &bpm.to_string())?;
    end(writer, "HeartRateBpm")
}

fn format_time(time: Timestamp) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<(), WriteError> {
    start(writer, name)?;
    emit(writer, &Event::Text(BytesText::new(text)))?;
    end(writer, name)
}

fn start(writer: &mut XmlWriter, name: &str) -> Result<(), WriteError> {
    emit(writer, &Event::Start(BytesStart::new(name)))
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<(), WriteError> {
    emit(writer, &Event::End(BytesEnd::new(name)))
}

fn emit(writer: &mut XmlWriter, event: &Event<'_>) -> Result<(), WriteError> {
    writer.write_event(event).map_err(xml_error)
}

fn xml_error(err: impl std::fmt::Display) -> WriteError {
    WriteError::Xml(err.to_string())
}
