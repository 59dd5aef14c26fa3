// Additive trend + seasonality model.
//
// `y(t) = trend(t) + Σ seasonal(t) + ε`, where the trend is piecewise linear
// with changepoints spread over the early part of the history and each
// seasonality is a truncated Fourier series. Parameters are the MAP estimate
// under Gaussian priors, found by penalised least squares iterated against the
// noise variance. Uncertainty comes from simulating future trend changes and
// observation noise.

use super::linalg::{dot, normal_equations, solve_spd};
use super::{check_request, Forecaster};
use crate::config::{ModelSettings, Toggle};
use crate::error::{DashboardError, Result};
use crate::types::{CountrySeries, ForecastPoint, ForecastResult};
use crate::util::{average, days_between};
use chrono::{Datelike, Duration, NaiveDate};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{Laplace, Normal, Poisson};
use statrs::statistics::{Data, OrderStatistics};
use std::f64::consts::PI;

const SIGMA2_FLOOR: f64 = 1e-8;
const RIDGE: f64 = 1e-9;
const TOLERANCE: f64 = 1e-6;
const MIN_ROWS_PER_COLUMN: usize = 2;

#[derive(Debug, Clone, PartialEq)]
struct Seasonality {
    name: &'static str,
    period_days: f64,
    order: usize,
}

impl Seasonality {
    fn weekly() -> Self {
        Self { name: "weekly", period_days: 7.0, order: 3 }
    }

    fn yearly() -> Self {
        Self { name: "yearly", period_days: 365.25, order: 10 }
    }

    fn daily() -> Self {
        Self { name: "daily", period_days: 1.0, order: 4 }
    }
}

/// The production [`Forecaster`].
#[derive(Debug, Clone, Default)]
pub struct AdditiveForecaster {
    settings: ModelSettings,
}

impl AdditiveForecaster {
    pub fn new(settings: ModelSettings) -> Self {
        Self { settings }
    }
}

impl Forecaster for AdditiveForecaster {
    fn fit_and_forecast(
        &self,
        series: &CountrySeries,
        horizon_days: u32,
        confidence_level: f64,
    ) -> Result<ForecastResult> {
        check_request(series, confidence_level)?;
        let model = FittedModel::fit(series, &self.settings)?;
        model.predict(horizon_days, confidence_level, &self.settings)
    }

    fn name(&self) -> &str {
        "additive trend + seasonality"
    }
}

/// A model fitted to one country's history. Never shared across countries.
#[derive(Debug, Clone)]
pub struct FittedModel {
    start: NaiveDate,
    end: NaiveDate,
    span_days: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    beta: Vec<f64>,
    /// Noise standard deviation in scaled units.
    sigma: f64,
    iterations: usize,
}

impl FittedModel {
    pub fn fit(series: &CountrySeries, settings: &ModelSettings) -> Result<Self> {
        let dates = series.dates();
        let values = series.values();
        let (start, end) = match (dates.first(), dates.last()) {
            (Some(s), Some(e)) if s < e => (*s, *e),
            _ => {
                return Err(DashboardError::InsufficientData {
                    country: series.country().to_string(),
                    found: dates.len(),
                })
            }
        };
        let span_days = days_between(start, end) as f64;

        let abs_max = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let y_scale = if abs_max > 0.0 { abs_max } else { 1.0 };
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();
        let t: Vec<f64> = dates
            .iter()
            .map(|d| days_between(start, *d) as f64 / span_days)
            .collect();

        let changepoints = place_changepoints(&t, settings);
        let seasonalities = pick_seasonalities(&dates, span_days, settings);
        tracing::debug!(
            country = series.country(),
            changepoints = changepoints.len(),
            seasonalities = ?seasonalities.iter().map(|s| s.name).collect::<Vec<_>>(),
            "fitting additive model"
        );

        let rows: Vec<Vec<f64>> = dates
            .iter()
            .zip(&t)
            .map(|(d, &ti)| design_row(ti, *d, &changepoints, &seasonalities))
            .collect();
        let (xtx, xty) = normal_equations(&rows, &y);
        let p = xty.len();
        let n = y.len() as f64;
        let n_cp = changepoints.len();
        let tau_cp2 = settings.changepoint_prior_scale.powi(2);
        let tau_s2 = settings.seasonality_prior_scale.powi(2);
        if !(tau_cp2 > 0.0 && tau_s2 > 0.0) {
            return Err(DashboardError::Forecast(
                "prior scales must be positive".to_string(),
            ));
        }

        let mean_y = average(&y);
        let mut sigma2 = (y.iter().map(|v| (v - mean_y).powi(2)).sum::<f64>() / n).max(SIGMA2_FLOOR);

        for iteration in 1..=settings.max_iterations {
            let mut a = xtx.clone();
            let (lambda_cp, lambda_s) = (sigma2 / tau_cp2, sigma2 / tau_s2);
            for i in 0..p {
                let penalty = match i {
                    0 | 1 => 0.0,
                    i if i < 2 + n_cp => lambda_cp,
                    _ => lambda_s,
                };
                a[i * p + i] += penalty + RIDGE;
            }
            let beta = solve_spd(&a, &xty).ok_or_else(|| {
                DashboardError::Forecast("normal equations are not positive definite".to_string())
            })?;

            let rss: f64 = rows
                .iter()
                .zip(&y)
                .map(|(row, target)| (dot(row, &beta) - target).powi(2))
                .sum();
            let next = (rss / n).max(SIGMA2_FLOOR);
            if !next.is_finite() {
                return Err(DashboardError::Forecast("residual variance is not finite".to_string()));
            }
            let converged = (next - sigma2).abs() <= TOLERANCE * sigma2;
            sigma2 = next;
            if converged {
                tracing::debug!(iteration, sigma = sigma2.sqrt() * y_scale, "fit converged");
                return Ok(Self {
                    start,
                    end,
                    span_days,
                    y_scale,
                    changepoints,
                    seasonalities,
                    beta,
                    sigma: sigma2.sqrt(),
                    iterations: iteration,
                });
            }
        }

        Err(DashboardError::Forecast(format!(
            "fit did not converge after {} iterations",
            settings.max_iterations
        )))
    }

    pub fn changepoints(&self) -> &[f64] {
        &self.changepoints
    }

    pub fn seasonality_names(&self) -> Vec<&'static str> {
        self.seasonalities.iter().map(|s| s.name).collect()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Fitted values for every day of the history plus `horizon_days` ahead.
    pub fn predict(
        &self,
        horizon_days: u32,
        confidence_level: f64,
        settings: &ModelSettings,
    ) -> Result<ForecastResult> {
        let last = self.end + Duration::days(i64::from(horizon_days));
        let total = days_between(self.start, last) as usize + 1;
        let dates: Vec<NaiveDate> = self.start.iter_days().take(total).collect();
        let t: Vec<f64> = dates
            .iter()
            .map(|d| days_between(self.start, *d) as f64 / self.span_days)
            .collect();
        let yhat: Vec<f64> = dates
            .iter()
            .zip(&t)
            .map(|(d, &ti)| dot(&design_row(ti, *d, &self.changepoints, &self.seasonalities), &self.beta))
            .collect();

        let bounds = self.simulate_bounds(&t, &yhat, confidence_level, settings)?;

        let points = dates
            .iter()
            .zip(&yhat)
            .zip(bounds)
            .map(|((date, scaled), (lo, hi))| {
                // Cumulative counts cannot go below zero.
                let estimate = (scaled * self.y_scale).max(0.0);
                ForecastPoint {
                    date: *date,
                    point_estimate: estimate,
                    lower_bound: lo.max(0.0).min(estimate),
                    upper_bound: hi.max(estimate),
                }
            })
            .collect();

        Ok(ForecastResult::new(points, self.end, horizon_days, confidence_level))
    }

    /// Per-date `(lower, upper)` quantiles of simulated paths, in input units.
    fn simulate_bounds(
        &self,
        t: &[f64],
        yhat: &[f64],
        confidence_level: f64,
        settings: &ModelSettings,
    ) -> Result<Vec<(f64, f64)>> {
        let n_samples = settings.uncertainty_samples;
        if n_samples == 0 {
            return Ok(yhat.iter().map(|v| (v * self.y_scale, v * self.y_scale)).collect());
        }
        let stats_err = |e: statrs::StatsError| DashboardError::Forecast(e.to_string());

        let mut rng = StdRng::seed_from_u64(settings.seed);
        let noise = Normal::new(0.0, self.sigma).map_err(stats_err)?;

        let n_cp = self.changepoints.len();
        let deltas: Vec<f64> = self.beta[2..2 + n_cp].iter().map(|d| d.abs()).collect();
        let laplace = Laplace::new(0.0, average(&deltas) + 1e-8).map_err(stats_err)?;
        let t_max = t.last().copied().unwrap_or(1.0);
        // Future changepoints arrive at the same rate as in the history.
        let expected_changes = n_cp as f64 * (t_max - 1.0);
        let poisson = if expected_changes > 0.0 {
            Some(Poisson::new(expected_changes).map_err(stats_err)?)
        } else {
            None
        };

        let mut samples: Vec<Vec<f64>> = vec![Vec::with_capacity(n_samples); t.len()];
        for _ in 0..n_samples {
            let n_new = match &poisson {
                Some(p) => {
                    let draw: f64 = p.sample(&mut rng);
                    draw as usize
                }
                None => 0,
            };
            let new_changes: Vec<(f64, f64)> = (0..n_new)
                .map(|_| (rng.gen_range(1.0..t_max), laplace.sample(&mut rng)))
                .collect();

            for (i, &ti) in t.iter().enumerate() {
                let mut v = yhat[i];
                if ti > 1.0 {
                    for (c, delta) in &new_changes {
                        if ti > *c {
                            v += delta * (ti - c);
                        }
                    }
                }
                v += noise.sample(&mut rng);
                samples[i].push(v * self.y_scale);
            }
        }

        let lower_q = (1.0 - confidence_level) / 2.0;
        let upper_q = (1.0 + confidence_level) / 2.0;
        Ok(samples
            .into_iter()
            .map(|column| {
                let mut data = Data::new(column);
                (data.quantile(lower_q), data.quantile(upper_q))
            })
            .collect())
    }
}

/// Evenly spaced changepoints over the first `changepoint_range` of the
/// history, in scaled time. The first observation is never a changepoint.
fn place_changepoints(t: &[f64], settings: &ModelSettings) -> Vec<f64> {
    let range = settings.changepoint_range.clamp(0.0, 1.0);
    let hist_size = (t.len() as f64 * range).floor() as usize;
    let n_cp = settings.n_changepoints.min(hist_size.saturating_sub(1));
    if n_cp == 0 {
        return Vec::new();
    }
    let last_index = (hist_size - 1) as f64;
    (1..=n_cp)
        .map(|i| {
            let idx = (last_index * i as f64 / n_cp as f64).round() as usize;
            t[idx]
        })
        .collect()
}

fn pick_seasonalities(dates: &[NaiveDate], span_days: f64, settings: &ModelSettings) -> Vec<Seasonality> {
    let min_spacing = dates
        .windows(2)
        .map(|w| days_between(w[0], w[1]))
        .min()
        .unwrap_or(i64::MAX);
    let enabled = |toggle: Toggle, auto: bool| match toggle {
        Toggle::On => true,
        Toggle::Off => false,
        Toggle::Auto => auto,
    };

    // Auto mode also needs two observations per Fourier column.
    let supported = |s: &Seasonality| dates.len() >= MIN_ROWS_PER_COLUMN * 2 * s.order + 2;

    let mut out = Vec::new();
    let yearly = Seasonality::yearly();
    if enabled(settings.yearly_seasonality, span_days >= 730.0 && supported(&yearly)) {
        out.push(yearly);
    }
    let weekly = Seasonality::weekly();
    let weekly_fits = span_days >= 14.0 && min_spacing < 7 && supported(&weekly);
    if enabled(settings.weekly_seasonality, weekly_fits) {
        out.push(weekly);
    }
    if settings.daily_seasonality {
        out.push(Seasonality::daily());
    }
    out
}

fn design_row(t: f64, date: NaiveDate, changepoints: &[f64], seasonalities: &[Seasonality]) -> Vec<f64> {
    let width = 2 + changepoints.len() + seasonalities.iter().map(|s| 2 * s.order).sum::<usize>();
    let mut row = Vec::with_capacity(width);
    row.push(1.0);
    row.push(t);
    row.extend(changepoints.iter().map(|c| (t - c).max(0.0)));
    let day = f64::from(date.num_days_from_ce());
    for s in seasonalities {
        for k in 1..=s.order {
            let x = 2.0 * PI * k as f64 * day / s.period_days;
            row.push(x.sin());
            row.push(x.cos());
        }
    }
    row
}
