#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use hrsplice_rs::config::{LapSource, MergeOptions};
use hrsplice_rs::types::activity::{ClockOffset, MergedPoint, PointKind};

pub fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .expect("valid time")
}

pub fn point(time: NaiveDateTime, distance_meters: f64, cadence: u16) -> MergedPoint {
    MergedPoint {
        time,
        distance_meters,
        cadence,
        heart_rate: None,
        position: None,
        kind: PointKind::Recorded { raw: None },
    }
}

pub fn options() -> MergeOptions {
    MergeOptions::default()
}

pub fn unshifted_options() -> MergeOptions {
    MergeOptions {
        structural_offset: ClockOffset::hours(0),
        heart_rate_offset: ClockOffset::hours(0),
        lap_source: LapSource::HeartRate,
        distance_only: false,
        require_heart_rate: false,
    }
}

/// Heart-rate recording in UTC, two hours behind the structural recording.
/// Lap aggregates hold junk values that the merge must overwrite.
pub fn garmin_tcx() -> String {
    garmin_tcx_with_lap_time("4")
}

pub fn garmin_tcx_with_lap_time(total_time: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<TrainingCenterDatabase xmlns="http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Activities>
    <Activity Sport="Running">
      <Id>2024-05-01T07:00:00Z</Id>
      <Lap StartTime="2024-05-01T07:00:00Z">
        <TotalTimeSeconds>{total_time}</TotalTimeSeconds>
        <DistanceMeters>999</DistanceMeters>
        <MaximumSpeed>9.9</MaximumSpeed>
        <Intensity>Active</Intensity>
        <TriggerMethod>Manual</TriggerMethod>
        <Track>
          <Trackpoint>
            <Time>2024-05-01T07:00:00Z</Time>
            <DistanceMeters>1</DistanceMeters>
            <HeartRateBpm xsi:type="HeartRateInBeatsPerMinute_t"><Value>100</Value></HeartRateBpm>
          </Trackpoint>
          <Trackpoint>
            <Time>2024-05-01T07:00:03Z</Time>
            <DistanceMeters>2</DistanceMeters>
          </Trackpoint>
        </Track>
        <Extensions>
          <LX xmlns="http://www.garmin.com/xmlschemas/ActivityExtension/v2">
            <AvgSpeed>1.1</AvgSpeed>
          </LX>
        </Extensions>
      </Lap>
      <Lap StartTime="2024-05-01T07:00:04Z">
        <TotalTimeSeconds>4</TotalTimeSeconds>
        <DistanceMeters>999</DistanceMeters>
        <MaximumSpeed>9.9</MaximumSpeed>
        <Intensity>Active</Intensity>
        <TriggerMethod>Manual</TriggerMethod>
        <Track>
          <Trackpoint>
            <Time>2024-05-01T07:00:04Z</Time>
            <DistanceMeters>3</DistanceMeters>
            <HeartRateBpm xsi:type="HeartRateInBeatsPerMinute_t"><Value>120</Value></HeartRateBpm>
          </Trackpoint>
          <Trackpoint>
            <Time>2024-05-01T07:00:08Z</Time>
            <DistanceMeters>4</DistanceMeters>
            <HeartRateBpm xsi:type="HeartRateInBeatsPerMinute_t"><Value>100</Value></HeartRateBpm>
          </Trackpoint>
        </Track>
        <Extensions>
          <LX xmlns="http://www.garmin.com/xmlschemas/ActivityExtension/v2">
            <AvgSpeed>1.1</AvgSpeed>
          </LX>
        </Extensions>
      </Lap>
    </Activity>
  </Activities>
</TrainingCenterDatabase>"#
    )
}

fn micoach_point(time: &str, distance: &str, cadence: u16, heart_rate: Option<u16>) -> String {
    let heart_rate = heart_rate
        .map(|bpm| {
            format!(
                r#"<HeartRateBpm xsi:type="HeartRateInBeatsPerMinute_t"><Value>{bpm}</Value></HeartRateBpm>"#
            )
        })
        .unwrap_or_default();
    format!(
        r#"<Trackpoint>
            <Time>{time}</Time>
            <Position><LatitudeDegrees>49.87</LatitudeDegrees><LongitudeDegrees>8.65</LongitudeDegrees></Position>
            <DistanceMeters>{distance}</DistanceMeters>
            {heart_rate}
            <Extensions>
              <TPX xmlns="http://www.garmin.com/xmlschemas/ActivityExtension/v2"><RunCadence>{cadence}</RunCadence></TPX>
            </Extensions>
          </Trackpoint>"#
    )
}

/// Structural recording in local time: stationary start, then running.
pub fn micoach_tcx() -> String {
    let points = [
        micoach_point("2024-05-01T09:00:00Z", "0", 0, None),
        micoach_point("2024-05-01T09:00:02Z", "5", 0, Some(77)),
        micoach_point("2024-05-01T09:00:04Z", "10", 80, None),
        micoach_point("2024-05-01T09:00:07Z", "30", 85, None),
    ]
    .join("\n");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<TrainingCenterDatabase xmlns="http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Activities>
    <Activity Sport="Running">
      <Id>2024-05-01T09:00:00Z</Id>
      <Lap StartTime="2024-05-01T09:00:00Z">
        <TotalTimeSeconds>8</TotalTimeSeconds>
        <DistanceMeters>30</DistanceMeters>
        <Track>
          {points}
        </Track>
      </Lap>
    </Activity>
  </Activities>
</TrainingCenterDatabase>"#
    )
}
