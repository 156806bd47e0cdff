//! Progress module - training volume per day for the progress chart

pub mod trend;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::backend::{Backend, BackendError};

pub use trend::VolumeTrend;

/// Total volume (sum of weight x reps) lifted on one day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumePoint {
    pub date: NaiveDate,
    pub volume: f64,
}

impl VolumePoint {
    /// Short axis label, e.g. "Jan 05"
    pub fn label(&self) -> String {
        self.date.format("%b %d").to_string()
    }
}

/// Sum volumes that fall on the same day, oldest day first
pub fn aggregate_volume(entries: impl IntoIterator<Item = (NaiveDate, f64)>) -> Vec<VolumePoint> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (date, volume) in entries {
        *by_date.entry(date).or_insert(0.0) += volume;
    }
    by_date
        .into_iter()
        .map(|(date, volume)| VolumePoint { date, volume })
        .collect()
}

/// Volume per completion date across all of a user's workout logs
pub async fn volume_by_date(
    backend: &dyn Backend,
    user_id: &str,
) -> Result<Vec<VolumePoint>, BackendError> {
    let mut entries = Vec::new();
    for log in backend.list_workout_logs(user_id).await? {
        let Some(done) = log.completed_at else {
            continue;
        };
        let volume: f64 = backend
            .exercise_logs(&log.id)
            .await?
            .iter()
            .filter(|row| row.completed)
            .map(|row| row.weight * row.reps as f64)
            .sum();
        entries.push((done.date_naive(), volume));
    }
    debug!(user_id, logs = entries.len(), "Aggregated workout volume");
    Ok(aggregate_volume(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn test_aggregate_merges_same_day() {
        let points = aggregate_volume(vec![
            (day(3), 500.0),
            (day(1), 1000.0),
            (day(3), 250.0),
        ]);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], VolumePoint { date: day(1), volume: 1000.0 });
        assert_eq!(points[1].volume, 750.0);
        assert_eq!(points[1].label(), "Jan 03");
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate_volume(Vec::new()).is_empty());
    }
}
