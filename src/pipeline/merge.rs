use crate::error::{MergeError, ParseError};
use crate::pipeline::aggregate::LapAggregator;
use crate::pipeline::laps::LapIndex;
use crate::types::activity::{LapRecord, MergeStats, MergedLap, MergedPoint, PointKind, TrackPoint};
use crate::types::heart_rate::HeartRateSeries;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpliceRules {
    /// Drop structural points whose own second has no heart-rate value.
    pub require_heart_rate: bool,
}

/// Validates the structural recording: every point needs a distance and a cadence.
pub fn structural_points(points: Vec<TrackPoint>) -> Result<Vec<MergedPoint>, ParseError> {
    points
        .into_iter()
        .enumerate()
        .map(|(index, point)| {
            let distance_meters = point.distance_meters.ok_or(ParseError::MissingField {
                record: "Trackpoint",
                index,
                field: "DistanceMeters",
            })?;
            let cadence = point.cadence.ok_or(ParseError::MissingField {
                record: "Trackpoint",
                index,
                field: "RunCadence",
            })?;
            Ok(MergedPoint {
                time: point.time,
                distance_meters,
                cadence,
                heart_rate: point.heart_rate,
                position: point.position,
                kind: PointKind::Recorded { raw: point.raw },
            })
        })
        .collect()
}

/// State of one merge pass.
pub struct MergeSession {
    laps: LapIndex,
    heart_rate: HeartRateSeries,
    aggregator: LapAggregator,
    last_known_distance: f64,
    previous_cadence: Option<u16>,
    rules: SpliceRules,
    stats: MergeStats,
}

impl MergeSession {
    /// `heart_rate` must already be dense (one entry per second).
    pub fn new(
        laps: Vec<LapRecord>,
        heart_rate: HeartRateSeries,
        baseline_distance: f64,
        rules: SpliceRules,
    ) -> Result<Self, MergeError> {
        let stats = MergeStats {
            heart_rate_seconds: heart_rate.len(),
            ..MergeStats::default()
        };
        Ok(Self {
            laps: LapIndex::new(laps)?,
            heart_rate,
            aggregator: LapAggregator::new(baseline_distance),
            last_known_distance: baseline_distance,
            previous_cadence: None,
            rules,
            stats,
        })
    }

    /// Walks `points` against the pending heart-rate seconds. A pending second
    /// earlier than the next point either becomes a stationary filler (both this
    /// point and the previous one have zero cadence) or is dropped; otherwise the
    /// point itself is spliced in with the heart rate of its own second.
    pub fn run(mut self, points: Vec<MergedPoint>) -> Result<(Vec<MergedLap>, MergeStats), MergeError> {
        let mut points = points.into_iter().peekable();

        while let Some(next) = points.peek() {
            let point_time = next.time;
            let point_cadence = next.cadence;

            if self.rules.require_heart_rate && self.heart_rate.get(point_time).is_none() {
                self.laps
                    .advance_if_past(point_time, &mut self.aggregator, self.last_known_distance)?;
                self.aggregator.observe_cadence(point_cadence);
                self.previous_cadence = Some(point_cadence);
                self.stats.dropped_points += 1;
                tracing::trace!("Dropped point {} without heart rate", point_time);
                points.next();
                continue;
            }

            match self.heart_rate.first_time() {
                Some(second) if second < point_time => {
                    self.laps
                        .advance_if_past(second, &mut self.aggregator, self.last_known_distance)?;
                    let previous = self.previous_cadence.unwrap_or(point_cadence);
                    if let Some((second, bpm)) = self.heart_rate.pop_first() {
                        if point_cadence == 0 && previous == 0 {
                            self.laps
                                .current_target()
                                .push(MergedPoint::filler(second, bpm, self.last_known_distance));
                            self.stats.filler_points += 1;
                            tracing::trace!("Filled {} with {} bpm", second, bpm);
                        } else {
                            self.stats.dropped_seconds += 1;
                        }
                    }
                }
                _ => {
                    let Some(mut point) = points.next() else {
                        break;
                    };
                    self.laps
                        .advance_if_past(point.time, &mut self.aggregator, self.last_known_distance)?;
                    self.aggregator.observe_cadence(point.cadence);
                    if let Some(bpm) = self.heart_rate.remove(point.time) {
                        point.heart_rate = Some(bpm);
                    }
                    self.last_known_distance = point.distance_meters;
                    self.previous_cadence = Some(point.cadence);
                    tracing::trace!("Spliced {}", point.time);
                    self.laps.current_target().push(point);
                    self.stats.spliced_points += 1;
                }
            }
        }

        self.laps
            .close_current(&mut self.aggregator, self.last_known_distance)?;

        Ok((self.laps.into_laps(), self.stats))
    }
}

/// Runs one merge pass over `points` with an already densified heart-rate series.
pub fn merge(
    laps: Vec<LapRecord>,
    points: Vec<MergedPoint>,
    dense_heart_rate: HeartRateSeries,
    rules: SpliceRules,
) -> Result<(Vec<MergedLap>, MergeStats), MergeError> {
    let baseline = points.first().map(|p| p.distance_meters).unwrap_or(0.0);
    MergeSession::new(laps, dense_heart_rate, baseline, rules)?.run(points)
}
