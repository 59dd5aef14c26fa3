// Disease-spread forecasting dashboard.
//
// Loads the WHO daily COVID-19 export, fits an additive trend + seasonality
// model per country, and derives a short outlook from the projection.
pub mod chart;
pub mod config;
pub mod error;
pub mod forecast;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod summary;
pub mod types;
pub mod util;

pub use error::{DashboardError, Result};
