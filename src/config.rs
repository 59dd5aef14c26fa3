// Dashboard configuration.
//
// Read from `spread_report.json` in the working directory when present. Every
// field has a default, so a partial file only overrides what it names.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = "spread_report.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Delimited dataset with the WHO daily columns.
    #[serde(default = "default_data_path")]
    pub data_path: String,

    /// Days projected past the last observation.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,

    /// Two-sided width of the uncertainty band.
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,

    /// Directory for exported CSV/JSON artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Rows shown in the console forecast preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    #[serde(default)]
    pub model: ModelSettings,
}

fn default_data_path() -> String {
    "WHO-COVID-19-global-daily-data.csv".to_string()
}
fn default_horizon_days() -> u32 {
    90
}
fn default_confidence_level() -> f64 {
    0.95
}
fn default_output_dir() -> String {
    ".".to_string()
}
fn default_preview_rows() -> usize {
    5
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            horizon_days: default_horizon_days(),
            confidence_level: default_confidence_level(),
            output_dir: default_output_dir(),
            preview_rows: default_preview_rows(),
            model: ModelSettings::default(),
        }
    }
}

impl DashboardConfig {
    /// Load `spread_report.json` from the working directory.
    pub fn load() -> Self {
        Self::load_or_default(Path::new(CONFIG_FILE))
    }

    /// Like [`load_from`](Self::load_from), but an absent, malformed or
    /// invalid file yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("no {} found, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "confidence_level must be strictly between 0 and 1, got {}",
                self.confidence_level
            )));
        }
        if self.horizon_days == 0 {
            return Err(ConfigError::Invalid("horizon_days must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Whether a seasonal component is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    /// Decided from the length of the history.
    #[default]
    Auto,
    On,
    Off,
}

/// Knobs of the additive forecasting model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub daily_seasonality: bool,
    pub weekly_seasonality: Toggle,
    pub yearly_seasonality: Toggle,
    pub n_changepoints: usize,
    /// Share of the history in which trend changepoints may be placed.
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub uncertainty_samples: usize,
    pub seed: u64,
    pub max_iterations: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            daily_seasonality: false,
            weekly_seasonality: Toggle::Auto,
            yearly_seasonality: Toggle::Auto,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            uncertainty_samples: 1000,
            seed: 0x5eed_c0de,
            max_iterations: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", body).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: DashboardConfig =
            serde_json::from_str(r#"{"horizon_days": 30, "model": {"yearly_seasonality": "off"}}"#)
                .unwrap();
        assert_eq!(cfg.horizon_days, 30);
        assert_eq!(cfg.confidence_level, 0.95);
        assert_eq!(cfg.model.yearly_seasonality, Toggle::Off);
        assert_eq!(cfg.model.n_changepoints, 25);
        assert!(!cfg.model.daily_seasonality);
    }

    #[test]
    fn defaults_match_the_report_trigger() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.horizon_days, 90);
        assert_eq!(cfg.confidence_level, 0.95);
        assert_eq!(cfg.data_path, "WHO-COVID-19-global-daily-data.csv");
    }

    #[test]
    fn file_overrides_are_read() {
        let file = config_file(r#"{"horizon_days": 14, "output_dir": "out"}"#);
        let cfg = DashboardConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.horizon_days, 14);
        assert_eq!(cfg.output_dir, "out");
        assert_eq!(cfg.preview_rows, 5);
        assert_eq!(DashboardConfig::load_or_default(file.path()), cfg);
    }

    #[test]
    fn malformed_file_is_a_parse_error_and_falls_back() {
        let file = config_file("{ horizon_days: ");
        assert!(matches!(DashboardConfig::load_from(file.path()), Err(ConfigError::Parse(_))));
        assert_eq!(DashboardConfig::load_or_default(file.path()), DashboardConfig::default());
    }

    #[test]
    fn missing_file_is_an_io_error_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert!(matches!(DashboardConfig::load_from(&path), Err(ConfigError::Io(_))));
        assert_eq!(DashboardConfig::load_or_default(&path), DashboardConfig::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for body in [
            r#"{"confidence_level": 1.5}"#,
            r#"{"confidence_level": 0.0}"#,
            r#"{"horizon_days": 0}"#,
        ] {
            let file = config_file(body);
            match DashboardConfig::load_from(file.path()) {
                Err(ConfigError::Invalid(_)) => {}
                other => panic!("{} should be invalid, got {:?}", body, other),
            }
            assert_eq!(DashboardConfig::load_or_default(file.path()), DashboardConfig::default());
        }
    }
}
