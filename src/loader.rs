use crate::error::{DashboardError, Result};
use crate::types::{CountrySeries, ObservationRow, RawRow};
use crate::util::{parse_count_safe, parse_date_safe};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const REQUIRED_COLUMNS: [&str; 3] = ["Date_reported", "Country", "Cumulative_cases"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub duplicates: usize,
    pub countries: usize,
}

/// Every country's series, keyed and iterated by country name.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    series: BTreeMap<String, CountrySeries>,
    report: LoadReport,
}

impl Dataset {
    pub fn from_series(series: impl IntoIterator<Item = CountrySeries>) -> Self {
        let series: BTreeMap<String, CountrySeries> = series
            .into_iter()
            .map(|s| (s.country().to_string(), s))
            .collect();
        let loaded_rows = series.values().map(|s| s.len()).sum();
        let report = LoadReport {
            total_rows: loaded_rows,
            loaded_rows,
            countries: series.len(),
            ..LoadReport::default()
        };
        Self { series, report }
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Distinct country names, the choices offered by the selector.
    pub fn countries(&self) -> Vec<&str> {
        self.series.keys().map(String::as_str).collect()
    }

    pub fn series(&self, country: &str) -> Option<&CountrySeries> {
        self.series.get(country)
    }
}

pub fn load_series(path: &Path) -> Result<Dataset> {
    let source = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| DashboardError::data_load(&source, e))?;
    load_series_from_reader(file, &source)
}

/// Parse a WHO daily export from any reader. `source` names the resource in
/// error messages.
pub fn load_series_from_reader<R: Read>(reader: R, source: &str) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| DashboardError::data_load(source, e))?
        .clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::data_load(
            source,
            format!("missing required column(s): {}", missing.join(", ")),
        ));
    }

    let mut report = LoadReport::default();
    let mut by_country: BTreeMap<String, BTreeMap<NaiveDate, ObservationRow>> = BTreeMap::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("row {}: {}", report.total_rows, e);
                report.parse_errors += 1;
                continue;
            }
        };

        let Some(date) = parse_date_safe(row.date_reported.as_deref()) else {
            report.parse_errors += 1;
            continue;
        };
        let country = match row.country.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => {
                report.parse_errors += 1;
                continue;
            }
        };
        let Some(value) = parse_count_safe(row.cumulative_cases.as_deref()) else {
            report.parse_errors += 1;
            continue;
        };

        let rows = by_country.entry(country.clone()).or_default();
        let obs = ObservationRow { date, country, value };
        if rows.insert(date, obs).is_some() {
            report.duplicates += 1;
        }
    }

    let series: BTreeMap<String, CountrySeries> = by_country
        .into_iter()
        .map(|(country, rows)| {
            let s = CountrySeries::new(country.clone(), rows.into_values().collect());
            (country, s)
        })
        .collect();

    if series.is_empty() {
        return Err(DashboardError::data_load(source, "no usable rows"));
    }

    report.loaded_rows = series.values().map(|s| s.len()).sum();
    report.countries = series.len();
    tracing::info!(
        source,
        total = report.total_rows,
        loaded = report.loaded_rows,
        skipped = report.parse_errors,
        duplicates = report.duplicates,
        countries = report.countries,
        "dataset loaded"
    );
    Ok(Dataset { series, report })
}

/// Read-only access to the dataset, loaded from disk on first use and kept
/// for the lifetime of the repository.
#[derive(Debug)]
pub struct SeriesRepository {
    source: PathBuf,
    cache: OnceCell<Dataset>,
}

impl SeriesRepository {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            cache: OnceCell::new(),
        }
    }

    /// A repository that never touches the filesystem.
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            source: PathBuf::from("<memory>"),
            cache: OnceCell::with_value(dataset),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }

    /// The dataset, reading the source on the first call. A failed load is not
    /// cached, so the next call tries again.
    pub fn dataset(&self) -> Result<&Dataset> {
        self.cache.get_or_try_init(|| load_series(&self.source))
    }

    pub fn countries(&self) -> Result<Vec<&str>> {
        Ok(self.dataset()?.countries())
    }

    pub fn series(&self, country: &str) -> Result<Option<&CountrySeries>> {
        Ok(self.dataset()?.series(country))
    }
}
