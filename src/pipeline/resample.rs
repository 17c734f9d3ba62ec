use chrono::Duration;

use crate::error::MergeError;
use crate::types::activity::Timestamp;
use crate::types::heart_rate::HeartRateSeries;

/// Resamples `samples` to one value per whole second over `[first, last)`.
///
/// Each gap between consecutive samples is filled by linear interpolation: the
/// earlier sample's value is emitted at its own second and the running value then
/// moves one step toward the later sample per second. The later sample itself
/// belongs to the next gap, so the final sample is never emitted. Fewer than two
/// samples yield an empty series.
pub fn densify(samples: &HeartRateSeries) -> Result<HeartRateSeries, MergeError> {
    let mut dense = HeartRateSeries::new();
    for (from, to) in samples.iter().zip(samples.iter().skip(1)) {
        interpolate_segment(from, to, &mut dense)?;
    }
    Ok(dense)
}

/// Writes the seconds `[from.0, to.0)` into `out`.
pub fn interpolate_segment(
    from: (Timestamp, u16),
    to: (Timestamp, u16),
    out: &mut HeartRateSeries,
) -> Result<(), MergeError> {
    let (start, from_bpm) = from;
    let (end, to_bpm) = to;

    let gap = (end - start).num_seconds();
    if gap <= 0 {
        return Err(MergeError::DegenerateInterval { at: start });
    }

    let step = (f64::from(to_bpm) - f64::from(from_bpm)) / gap as f64;
    let mut current = f64::from(from_bpm);
    for offset in 0..gap {
        out.insert(start + Duration::seconds(offset), round_bpm(current));
        current += step;
    }
    Ok(())
}

fn round_bpm(value: f64) -> u16 {
    value.round().clamp(0.0, f64::from(u16::MAX)) as u16
}
