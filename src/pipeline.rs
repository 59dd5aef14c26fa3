// The report pipeline: load -> fit -> forecast -> summarize.
//
// Callable without any console around it; the front end is just one caller.
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::forecast::Forecaster;
use crate::loader::SeriesRepository;
use crate::summary::summarize;
use crate::types::{CountrySeries, ForecastResult, Summary};

pub const DEFAULT_HORIZON_DAYS: u32 = 90;
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub country: String,
    pub horizon_days: u32,
    pub confidence_level: f64,
}

impl ReportRequest {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
        }
    }

    pub fn from_config(country: impl Into<String>, config: &DashboardConfig) -> Self {
        Self {
            country: country.into(),
            horizon_days: config.horizon_days,
            confidence_level: config.confidence_level,
        }
    }
}

/// Everything the presentation layer needs for one country. Built only when
/// every stage succeeded.
#[derive(Debug, Clone)]
pub struct DiagnosticReport<'a> {
    pub series: &'a CountrySeries,
    pub forecast: ForecastResult,
    pub summary: Summary,
}

pub fn generate_report<'a, F>(
    repo: &'a SeriesRepository,
    forecaster: &F,
    request: &ReportRequest,
) -> Result<DiagnosticReport<'a>>
where
    F: Forecaster + ?Sized,
{
    let _span = tracing::info_span!("report", country = %request.country).entered();

    let series = repo
        .series(&request.country)?
        .ok_or_else(|| DashboardError::InsufficientData {
            country: request.country.clone(),
            found: 0,
        })?;

    tracing::info!(
        model = forecaster.name(),
        observations = series.len(),
        horizon = request.horizon_days,
        "fitting forecast"
    );
    let forecast =
        forecaster.fit_and_forecast(series, request.horizon_days, request.confidence_level)?;
    let summary = summarize(series, &forecast)?;
    tracing::info!(
        growth_percent = summary.growth_percent,
        trend = %summary.trend_label,
        "report ready"
    );

    Ok(DiagnosticReport {
        series,
        forecast,
        summary,
    })
}
