use crate::error::MergeError;
use crate::pipeline::aggregate::LapAggregator;
use crate::types::activity::{LapRecord, MergedLap, MergedPoint, Timestamp};

/// Fixed lap boundaries with a cursor on the lap currently receiving points.
#[derive(Debug, Clone)]
pub struct LapIndex {
    laps: Vec<MergedLap>,
    cursor: usize,
}

impl LapIndex {
    pub fn new(records: Vec<LapRecord>) -> Result<Self, MergeError> {
        if records.is_empty() {
            return Err(MergeError::NoLaps);
        }
        if let Some(index) = records
            .windows(2)
            .position(|pair| pair[1].start_time < pair[0].start_time)
        {
            return Err(MergeError::UnorderedLaps { index: index + 1 });
        }

        Ok(Self {
            laps: records.into_iter().map(MergedLap::new).collect(),
            cursor: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.laps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.laps.is_empty()
    }

    pub fn current_position(&self) -> usize {
        self.cursor
    }

    /// Start of the lap after the cursor, `None` on the final lap.
    pub fn next_boundary(&self) -> Option<Timestamp> {
        self.laps.get(self.cursor + 1).map(|lap| lap.start_time)
    }

    pub fn current_lap(&self) -> &MergedLap {
        &self.laps[self.cursor]
    }

    pub fn current_target(&mut self) -> &mut Vec<MergedPoint> {
        &mut self.laps[self.cursor].points
    }

    /// Closes out and leaves every lap whose successor starts at or before `time`.
    /// Returns whether the cursor moved.
    pub fn advance_if_past(
        &mut self,
        time: Timestamp,
        aggregator: &mut LapAggregator,
        last_known_distance: f64,
    ) -> Result<bool, MergeError> {
        let mut advanced = false;
        while let Some(boundary) = self.next_boundary() {
            if time < boundary {
                break;
            }
            self.close_current(aggregator, last_known_distance)?;
            self.advance()?;
            advanced = true;
        }
        Ok(advanced)
    }

    pub fn close_current(
        &mut self,
        aggregator: &mut LapAggregator,
        last_known_distance: f64,
    ) -> Result<(), MergeError> {
        aggregator.close_out(&mut self.laps[self.cursor], last_known_distance)?;
        Ok(())
    }

    fn advance(&mut self) -> Result<(), MergeError> {
        if self.cursor + 1 >= self.laps.len() {
            return Err(MergeError::LapBoundaryExhaustion {
                laps: self.laps.len(),
            });
        }
        self.cursor += 1;
        Ok(())
    }

    pub fn into_laps(self) -> Vec<MergedLap> {
        self.laps
    }
}
