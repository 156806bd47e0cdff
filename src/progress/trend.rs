//! Volume trend using linear regression (linfa)

use chrono::NaiveDate;
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

use super::VolumePoint;

/// Minimum data points required for training
const MIN_DATA_POINTS: usize = 3;

/// Linear fit of volume against days since the first logged day
#[derive(Debug, Clone)]
pub struct VolumeTrend {
    slope: f64,
    intercept: f64,
    r2_score: f64,
    data_points: usize,
    first_date: NaiveDate,
}

impl VolumeTrend {
    pub fn fit(points: &[VolumePoint]) -> Option<Self> {
        if points.len() < MIN_DATA_POINTS {
            return None;
        }
        let first_date = points.iter().map(|p| p.date).min()?;

        // X = days since first workout, Y = volume
        let x_data: Vec<f64> = points
            .iter()
            .map(|p| (p.date - first_date).num_days() as f64)
            .collect();
        let y_data: Vec<f64> = points.iter().map(|p| p.volume).collect();
        let n_samples = x_data.len();

        let records = Array2::from_shape_vec((n_samples, 1), x_data).ok()?;
        let targets = Array1::from_vec(y_data);
        let dataset = Dataset::new(records, targets);

        let model = LinearRegression::default().fit(&dataset).ok()?;
        let slope = model.params()[0];
        let intercept = model.intercept();

        let predictions = model.predict(&dataset);
        let r2_score = predictions.r2(&dataset).unwrap_or(0.0);

        Some(Self {
            slope,
            intercept,
            r2_score,
            data_points: n_samples,
            first_date,
        })
    }

    /// Volume change per day
    pub fn daily_change(&self) -> f64 {
        self.slope
    }

    pub fn r2_score(&self) -> f64 {
        self.r2_score
    }

    pub fn data_points(&self) -> usize {
        self.data_points
    }

    pub fn predict(&self, date: NaiveDate) -> f64 {
        let days = (date - self.first_date).num_days() as f64;
        self.slope * days + self.intercept
    }

    pub fn summary(&self) -> String {
        let direction = if self.slope >= 0.0 { "up" } else { "down" };
        format!(
            "Volume trending {} {:.1} lbs/day (R² {:.2}, {} sessions)",
            direction,
            self.slope.abs(),
            self.r2_score,
            self.data_points
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, volume: f64) -> VolumePoint {
        VolumePoint {
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            volume,
        }
    }

    #[test]
    fn test_not_enough_data() {
        let points = vec![point(1, 1000.0), point(3, 1100.0)];
        assert!(VolumeTrend::fit(&points).is_none(), "Should need at least 3 days");
    }

    #[test]
    fn test_linear_growth() {
        // +50 lbs of volume per day
        let points = vec![point(1, 1000.0), point(3, 1100.0), point(5, 1200.0), point(8, 1350.0)];
        let trend = VolumeTrend::fit(&points).unwrap();

        assert!((trend.daily_change() - 50.0).abs() < 1e-6, "Slope should be 50, got {}", trend.daily_change());
        assert!(trend.r2_score() > 0.99);
        assert_eq!(trend.data_points(), 4);
        let predicted = trend.predict(NaiveDate::from_ymd_opt(2026, 3, 11).unwrap());
        assert!((predicted - 1500.0).abs() < 1e-6);
        assert!(trend.summary().starts_with("Volume trending up 50.0"));
    }
}
