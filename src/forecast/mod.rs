// Forecast engine.
//
// The pipeline only sees the [`Forecaster`] trait; [`AdditiveForecaster`] is
// the production model and tests substitute their own implementations.

use crate::error::{DashboardError, Result};
use crate::types::{CountrySeries, ForecastResult};

pub mod additive;
pub mod linalg;

pub use additive::AdditiveForecaster;

/// Minimum number of distinct observation dates a fit needs.
pub const MIN_OBSERVATIONS: usize = 2;

pub trait Forecaster {
    /// Fit a fresh model to `series` and project `horizon_days` past its last
    /// date. The result covers every calendar day from the first observation
    /// to the end of the horizon, with `lower <= estimate <= upper`.
    fn fit_and_forecast(
        &self,
        series: &CountrySeries,
        horizon_days: u32,
        confidence_level: f64,
    ) -> Result<ForecastResult>;

    fn name(&self) -> &str;
}

/// Preconditions shared by every forecaster.
pub fn check_request(series: &CountrySeries, confidence_level: f64) -> Result<()> {
    // `CountrySeries` keeps one row per date, so its length is the number of distinct dates.
    if series.len() < MIN_OBSERVATIONS {
        return Err(DashboardError::InsufficientData {
            country: series.country().to_string(),
            found: series.len(),
        });
    }
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(DashboardError::Forecast(format!(
            "confidence level must be between 0 and 1, got {}",
            confidence_level
        )));
    }
    Ok(())
}
