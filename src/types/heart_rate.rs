use std::collections::BTreeMap;

use crate::types::activity::{Timestamp, TrackPoint};

/// Heart-rate samples keyed by timestamp, iterated in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartRateSeries {
    samples: BTreeMap<Timestamp, u16>,
}

impl HeartRateSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the heart-rate readings of `points`. With `distance_only`, points
    /// without a reading are recorded as 0 instead of being left out.
    pub fn from_points(points: &[TrackPoint], distance_only: bool) -> Self {
        let mut series = Self::new();
        for point in points {
            match point.heart_rate {
                Some(bpm) => series.insert(point.time, bpm),
                None if distance_only => series.insert(point.time, 0),
                None => {}
            }
        }
        series
    }

    /// A later sample at an identical timestamp replaces the earlier one.
    pub fn insert(&mut self, time: Timestamp, bpm: u16) {
        self.samples.insert(time, bpm);
    }

    pub fn get(&self, time: Timestamp) -> Option<u16> {
        self.samples.get(&time).copied()
    }

    pub fn remove(&mut self, time: Timestamp) -> Option<u16> {
        self.samples.remove(&time)
    }

    pub fn first_time(&self) -> Option<Timestamp> {
        self.samples.keys().next().copied()
    }

    pub fn last_time(&self) -> Option<Timestamp> {
        self.samples.keys().next_back().copied()
    }

    pub fn pop_first(&mut self) -> Option<(Timestamp, u16)> {
        self.samples.pop_first()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, u16)> + '_ {
        self.samples.iter().map(|(time, bpm)| (*time, *bpm))
    }
}

impl FromIterator<(Timestamp, u16)> for HeartRateSeries {
    fn from_iter<I: IntoIterator<Item = (Timestamp, u16)>>(iter: I) -> Self {
        let mut series = Self::new();
        for (time, bpm) in iter {
            series.insert(time, bpm);
        }
        series
    }
}
