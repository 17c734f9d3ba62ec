use crate::error::MergeError;
use crate::types::activity::{LapAggregates, MergedLap};

/// Running per-lap totals, folded into a lap's aggregate fields at close-out.
#[derive(Debug, Clone)]
pub struct LapAggregator {
    distance_at_last_close: f64,
    max_cadence: u16,
}

impl LapAggregator {
    /// `baseline_distance` is the distance recorded before the first lap opened.
    pub fn new(baseline_distance: f64) -> Self {
        Self {
            distance_at_last_close: baseline_distance,
            max_cadence: 0,
        }
    }

    pub fn observe_cadence(&mut self, cadence: u16) {
        self.max_cadence = self.max_cadence.max(cadence);
    }

    pub fn max_cadence(&self) -> u16 {
        self.max_cadence
    }

    /// Writes distance, maximum speed and average speed into `lap` and starts a
    /// fresh lap. Maximum speed carries the lap's peak cadence.
    pub fn close_out(
        &mut self,
        lap: &mut MergedLap,
        last_known_distance: f64,
    ) -> Result<LapAggregates, MergeError> {
        if lap.total_time_seconds.is_nan() || lap.total_time_seconds <= 0.0 {
            return Err(MergeError::DivisionByZero {
                lap_start: lap.start_time,
            });
        }

        let distance_meters = last_known_distance - self.distance_at_last_close;
        let aggregates = LapAggregates {
            distance_meters,
            maximum_speed: f64::from(self.max_cadence),
            average_speed: distance_meters / lap.total_time_seconds,
        };
        lap.aggregates = Some(aggregates);

        tracing::debug!(
            "Closed lap {}: {:.0} m, max cadence {}, avg speed {:.3} m/s, {} points",
            lap.start_time,
            aggregates.distance_meters,
            self.max_cadence,
            aggregates.average_speed,
            lap.points.len()
        );

        self.distance_at_last_close = last_known_distance;
        self.max_cadence = 0;
        Ok(aggregates)
    }
}
