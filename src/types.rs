use crate::util::format_number;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// One row of the WHO daily export as it sits on disk.
///
/// Only the date, country, and cumulative count are required; the remaining
/// columns are kept optional so older or trimmed exports still load.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Date_reported")]
    pub date_reported: Option<String>,
    #[serde(rename = "Country_code")]
    pub country_code: Option<String>,
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "WHO_region")]
    pub who_region: Option<String>,
    #[serde(rename = "New_cases")]
    pub new_cases: Option<String>,
    #[serde(rename = "Cumulative_cases")]
    pub cumulative_cases: Option<String>,
    #[serde(rename = "New_deaths")]
    pub new_deaths: Option<String>,
    #[serde(rename = "Cumulative_deaths")]
    pub cumulative_deaths: Option<String>,
}

/// A cleaned observation. `date` and `value` are the canonical names consumed
/// by the forecast engine (renamed from `Date_reported`/`Cumulative_cases`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationRow {
    pub date: NaiveDate,
    pub country: String,
    pub value: u64,
}

/// All observations of one country, strictly increasing by date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountrySeries {
    country: String,
    rows: Vec<ObservationRow>,
}

impl CountrySeries {
    /// Build a series from rows of a single country. Rows are sorted by date
    /// and a repeated date keeps the row that came last.
    pub fn new(country: impl Into<String>, mut rows: Vec<ObservationRow>) -> Self {
        // Stable sort keeps input order within a date, so the last wins below.
        rows.sort_by_key(|r| r.date);
        let mut deduped: Vec<ObservationRow> = Vec::with_capacity(rows.len());
        for row in rows {
            match deduped.last_mut() {
                Some(prev) if prev.date == row.date => *prev = row,
                _ => deduped.push(row),
            }
        }
        Self {
            country: country.into(),
            rows: deduped,
        }
    }

    /// Convenience constructor from `(date, value)` pairs.
    pub fn from_pairs(country: &str, pairs: &[(NaiveDate, u64)]) -> Self {
        let rows = pairs
            .iter()
            .map(|(date, value)| ObservationRow {
                date: *date,
                country: country.to_string(),
                value: *value,
            })
            .collect();
        Self::new(country, rows)
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn rows(&self) -> &[ObservationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&ObservationRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&ObservationRow> {
        self.rows.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.value as f64).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Fitted values over the history followed by the projected horizon, one
/// point per calendar day, ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
    history_end: NaiveDate,
    horizon_days: u32,
    confidence_level: f64,
}

impl ForecastResult {
    pub fn new(
        points: Vec<ForecastPoint>,
        history_end: NaiveDate,
        horizon_days: u32,
        confidence_level: f64,
    ) -> Self {
        Self {
            points,
            history_end,
            horizon_days,
            confidence_level,
        }
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&ForecastPoint> {
        self.points.last()
    }

    /// Point for a given date, if it lies inside the covered range.
    pub fn at(&self, date: NaiveDate) -> Option<&ForecastPoint> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| &self.points[i])
    }

    pub fn history_end(&self) -> NaiveDate {
        self.history_end
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Points strictly after the last observed date.
    pub fn future(&self) -> &[ForecastPoint] {
        let start = self.points.partition_point(|p| p.date <= self.history_end);
        &self.points[start..]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Stabilizing,
    Increasing,
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendLabel::Stabilizing => write!(f, "stabilizing"),
            TrendLabel::Increasing => write!(f, "increasing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub country: String,
    pub latest_actual: u64,
    pub latest_actual_date: NaiveDate,
    pub latest_forecast: ForecastPoint,
    pub horizon_days: u32,
    /// Full precision; round only when displaying.
    pub growth_percent: f64,
    pub trend_label: TrendLabel,
}

impl Summary {
    pub fn target_date(&self) -> NaiveDate {
        self.latest_forecast.date
    }

    /// Growth rounded to two decimals with thousands separators.
    pub fn growth_percent_display(&self) -> String {
        format_number(self.growth_percent, 2)
    }
}

/// Row of the exported forecast CSV.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ForecastCsvRow {
    #[serde(rename = "ds")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "yhat")]
    #[tabled(rename = "Forecast")]
    pub point_estimate: String,
    #[serde(rename = "yhat_lower")]
    #[tabled(rename = "Lower")]
    pub lower_bound: String,
    #[serde(rename = "yhat_upper")]
    #[tabled(rename = "Upper")]
    pub upper_bound: String,
}

/// Row of the "Live Analytics" metrics table.
#[derive(Debug, Tabled, Clone)]
pub struct MetricRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}
