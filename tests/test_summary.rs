use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use rstest::rstest;
use spread_report::summary::{summarize, trend_label, STABILIZING_THRESHOLD_PERCENT};
use spread_report::types::{CountrySeries, ForecastPoint, ForecastResult, TrendLabel};
use spread_report::DashboardError;

fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap() + Duration::days(n)
}

/// History of three days and a straight-line projection ending at `final_estimate`.
fn fixture(last_actual: u64, final_estimate: f64, horizon: u32) -> (CountrySeries, ForecastResult) {
    let series = CountrySeries::from_pairs(
        "Norway",
        &[(day(0), last_actual / 2), (day(1), last_actual / 2), (day(2), last_actual)],
    );
    let total = 3 + horizon as i64;
    let points = (0..total)
        .map(|i| {
            let est = if i == total - 1 { final_estimate } else { last_actual as f64 };
            ForecastPoint {
                date: day(i),
                point_estimate: est,
                lower_bound: est * 0.9,
                upper_bound: est * 1.1,
            }
        })
        .collect();
    (series, ForecastResult::new(points, day(2), horizon, 0.95))
}

#[test]
fn test_growth_against_horizon_end() {
    let (series, forecast) = fixture(1_000, 1_250.0, 90);
    let summary = summarize(&series, &forecast).unwrap();

    assert_eq!(summary.latest_actual, 1_000);
    assert_eq!(summary.latest_actual_date, day(2));
    assert_eq!(summary.target_date(), day(92));
    assert_eq!(summary.horizon_days, 90);
    assert_relative_eq!(summary.growth_percent, 25.0, epsilon = 1e-9);
    assert_eq!(summary.trend_label, TrendLabel::Increasing);
}

#[test]
fn test_full_precision_kept_and_rounded_for_display() {
    let (series, forecast) = fixture(3, 3.1, 5);
    let summary = summarize(&series, &forecast).unwrap();
    assert_relative_eq!(summary.growth_percent, 10.0 / 3.0, epsilon = 1e-9);
    assert_eq!(summary.growth_percent_display(), "3.33");
    assert_eq!(summary.trend_label, TrendLabel::Stabilizing);
}

#[test]
fn test_large_growth_display_uses_separators() {
    let (series, forecast) = fixture(100, 1_334.567, 30);
    let summary = summarize(&series, &forecast).unwrap();
    assert_eq!(summary.growth_percent_display(), "1,234.57");
}

#[test]
fn test_summarize_is_idempotent() {
    let (series, forecast) = fixture(500, 480.0, 30);
    let before = (series.clone(), forecast.clone());
    let first = summarize(&series, &forecast).unwrap();
    let second = summarize(&series, &forecast).unwrap();
    assert_eq!(first, second);
    assert_eq!((series, forecast), before);
}

#[test]
fn test_zero_latest_actual_is_a_summary_error() {
    let (series, forecast) = fixture(0, 10.0, 90);
    match summarize(&series, &forecast) {
        Err(DashboardError::Summary(msg)) => assert!(msg.contains("zero")),
        other => panic!("expected Summary error, got {:?}", other),
    }
}

#[test]
fn test_forecast_not_reaching_target_is_a_summary_error() {
    let (series, forecast) = fixture(100, 110.0, 90);
    let short = ForecastResult::new(forecast.points()[..50].to_vec(), day(2), 90, 0.95);
    assert!(matches!(summarize(&series, &short), Err(DashboardError::Summary(_))));
}

#[rstest]
#[case(3.2, TrendLabel::Stabilizing)]
#[case(5.0, TrendLabel::Increasing)]
#[case(4.99, TrendLabel::Stabilizing)]
#[case(87.5, TrendLabel::Increasing)]
#[case(-1.0, TrendLabel::Stabilizing)]
fn test_trend_label_policy(#[case] growth: f64, #[case] expected: TrendLabel) {
    assert_eq!(trend_label(growth), expected);
}

#[test]
fn test_threshold_constant() {
    assert_eq!(STABILIZING_THRESHOLD_PERCENT, 5.0);
}
