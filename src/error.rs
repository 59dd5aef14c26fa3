// Error taxonomy for the report pipeline.
//
// Every stage of a report run maps its failure onto one of these variants.
// The console front end catches them all at the top of the request and shows
// a single message; nothing is retried.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The dataset file is missing, unreadable, or lacks required columns.
    #[error("could not load dataset '{path}': {reason}")]
    DataLoad { path: String, reason: String },

    /// The selected country has fewer than two distinct observation dates.
    #[error("insufficient data for '{country}': need at least 2 observations, found {found}")]
    InsufficientData { country: String, found: usize },

    /// The curve fit or the prediction step failed.
    #[error("forecast failed: {0}")]
    Forecast(String),

    /// The summary could not be derived (e.g. growth against a zero baseline).
    #[error("summary unavailable: {0}")]
    Summary(String),

    /// A report artifact could not be written after a successful run.
    #[error("export failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    pub fn data_load(path: impl Into<String>, reason: impl ToString) -> Self {
        DashboardError::DataLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// The one-line message shown to the user, naming the likely cause.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::DataLoad { path, .. } => {
                format!("Error: {}. Please ensure '{}' is in your folder.", self, path)
            }
            DashboardError::InsufficientData { .. } => {
                format!("Error: {}. Please select a different country.", self)
            }
            _ => format!("Error: {}.", self),
        }
    }
}

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        DashboardError::Export(err.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Export(err.to_string())
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::Export(err.to_string())
    }
}
