use crate::error::{DashboardError, Result};
use crate::types::{CountrySeries, ForecastResult, Summary, TrendLabel};
use chrono::Duration;

/// Growth below this many percent over the horizon reads as "stabilizing".
///
/// Fixed policy constant, not user-configurable. It has no epidemiological
/// derivation and is kept as the dashboard has always used it.
pub const STABILIZING_THRESHOLD_PERCENT: f64 = 5.0;

pub fn trend_label(growth_percent: f64) -> TrendLabel {
    if growth_percent < STABILIZING_THRESHOLD_PERCENT {
        TrendLabel::Stabilizing
    } else {
        TrendLabel::Increasing
    }
}

/// Compare the last observation with the forecast at the end of the horizon.
pub fn summarize(series: &CountrySeries, forecast: &ForecastResult) -> Result<Summary> {
    let latest = series.last().ok_or_else(|| {
        DashboardError::Summary(format!("no observations for '{}'", series.country()))
    })?;
    if latest.value == 0 {
        return Err(DashboardError::Summary(format!(
            "latest actual case count for '{}' is zero, growth is undefined",
            series.country()
        )));
    }

    let horizon_days = forecast.horizon_days();
    let target = latest.date + Duration::days(i64::from(horizon_days));
    let latest_forecast = *forecast.at(target).ok_or_else(|| {
        DashboardError::Summary(format!("forecast does not cover {}", target))
    })?;

    let actual = latest.value as f64;
    let growth_percent = (latest_forecast.point_estimate - actual) / actual * 100.0;
    if !growth_percent.is_finite() {
        return Err(DashboardError::Summary("growth percentage is not finite".to_string()));
    }

    Ok(Summary {
        country: series.country().to_string(),
        latest_actual: latest.value,
        latest_actual_date: latest.date,
        latest_forecast,
        horizon_days,
        growth_percent,
        trend_label: trend_label(growth_percent),
    })
}
