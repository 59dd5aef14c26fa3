use crate::chart::build_figure;
use crate::error::Result;
use crate::pipeline::DiagnosticReport;
use crate::types::{ForecastCsvRow, ForecastPoint, MetricRow, Summary, TrendLabel};
use crate::util::{format_estimate, format_int, format_long_date, slug};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub const KEY_TERMS: &str = "\
- Actual Data: Historical confirmed cases reported by WHO.
- Forecast Trend: The predicted path of spread calculated by the model.
- Confidence Interval: The range (shaded area) where future cases are statistically likely to fall.
- Cumulative Cases: Total infections recorded from the start of the pandemic.";

pub const DATA_NOTE: &str = "Data Note: This summary is generated using Bayesian Curve Fitting. \
Actual results may vary based on public health interventions and vaccination rates.";

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn forecast_rows(points: &[ForecastPoint]) -> Vec<ForecastCsvRow> {
    points
        .iter()
        .map(|p| ForecastCsvRow {
            date: p.date.to_string(),
            point_estimate: format!("{:.2}", p.point_estimate),
            lower_bound: format!("{:.2}", p.lower_bound),
            upper_bound: format!("{:.2}", p.upper_bound),
        })
        .collect()
}

/// The three "Live Analytics" facts.
pub fn metric_rows(summary: &Summary) -> Vec<MetricRow> {
    let f = &summary.latest_forecast;
    vec![
        MetricRow {
            metric: "Actual Cases (Latest)".to_string(),
            value: format_int(summary.latest_actual),
        },
        MetricRow {
            metric: format!("Forecasted ({} Days)", summary.horizon_days),
            value: format_estimate(f.point_estimate),
        },
        MetricRow {
            metric: "Confidence Range".to_string(),
            value: format!(
                "{} - {}",
                format_estimate(f.lower_bound),
                format_estimate(f.upper_bound)
            ),
        },
    ]
}

pub fn badge_text(label: TrendLabel) -> &'static str {
    match label {
        TrendLabel::Stabilizing => {
            "Analysis: The infection curve appears to be stabilizing (flattening)."
        }
        TrendLabel::Increasing => {
            "Analysis: The model indicates a continuing upward trend in infection spread."
        }
    }
}

/// Narrative lines of the simplified summary, in display order.
pub fn narrative(summary: &Summary) -> Vec<String> {
    vec![
        format!(
            "Current Status: {} currently has {} total confirmed cases recorded in the WHO database.",
            summary.country,
            format_int(summary.latest_actual)
        ),
        format!(
            "Future Outlook: Our model predicts that by {}, the total count is likely to reach approximately {}.",
            format_long_date(summary.target_date()),
            format_estimate(summary.latest_forecast.point_estimate)
        ),
        format!(
            "Growth Velocity: The spread is projected to increase by {}% over the next {} days based on historical trends.",
            summary.growth_percent_display(),
            summary.horizon_days
        ),
        format!("[{}] {}", summary.trend_label, badge_text(summary.trend_label)),
    ]
}

pub fn print_report(report: &DiagnosticReport<'_>, preview_rows: usize) {
    println!("Live Analytics\n");
    preview_table_rows(&metric_rows(&report.summary), 3);

    println!("Pandemic Progression & Prediction: {}\n", report.summary.country);
    preview_table_rows(&forecast_rows(report.forecast.future()), preview_rows);

    println!("Simplified Summary of Analysis\n");
    for line in narrative(&report.summary) {
        println!("{}", line);
    }
    println!("\n{}\n", DATA_NOTE);
}

/// Paths of the artifacts written for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub forecast_csv: PathBuf,
    pub chart_json: PathBuf,
    pub summary_json: PathBuf,
}

pub fn export_report(report: &DiagnosticReport<'_>, output_dir: &Path) -> Result<ExportedFiles> {
    std::fs::create_dir_all(output_dir)?;
    let name = slug(&report.summary.country);
    let files = ExportedFiles {
        forecast_csv: output_dir.join(format!("forecast_{}.csv", name)),
        chart_json: output_dir.join(format!("chart_{}.json", name)),
        summary_json: output_dir.join(format!("summary_{}.json", name)),
    };
    write_csv(&files.forecast_csv, &forecast_rows(report.forecast.points()))?;
    write_json(&files.chart_json, &build_figure(report.series, &report.forecast))?;
    write_json(&files.summary_json, &report.summary)?;
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn summary(growth: f64, label: TrendLabel) -> Summary {
        let date = NaiveDate::from_ymd_opt(2023, 4, 7).unwrap();
        Summary {
            country: "Kenya".to_string(),
            latest_actual: 343_000,
            latest_actual_date: NaiveDate::from_ymd_opt(2023, 1, 7).unwrap(),
            latest_forecast: ForecastPoint {
                date,
                point_estimate: 350_123.9,
                lower_bound: 340_000.2,
                upper_bound: 360_500.7,
            },
            horizon_days: 90,
            growth_percent: growth,
            trend_label: label,
        }
    }

    #[test]
    fn narrative_mentions_counts_date_and_growth() {
        let lines = narrative(&summary(2.0763, TrendLabel::Stabilizing));
        assert!(lines[0].contains("Kenya currently has 343,000 total confirmed cases"));
        assert!(lines[1].contains("by 07 April 2023"));
        assert!(lines[1].contains("approximately 350,123"));
        assert!(lines[2].contains("increase by 2.08% over the next 90 days"));
        assert!(lines[3].contains("stabilizing (flattening)"));
    }

    #[test]
    fn metrics_show_forecast_and_range() {
        let rows = metric_rows(&summary(9.0, TrendLabel::Increasing));
        assert_eq!(rows[1].metric, "Forecasted (90 Days)");
        assert_eq!(rows[1].value, "350,123");
        assert_eq!(rows[2].value, "340,000 - 360,500");
    }

    #[test]
    fn narrative_growth_matches_summary_display() {
        let s = summary(1234.567, TrendLabel::Increasing);
        assert_eq!(s.growth_percent_display(), "1,234.57");
        let lines = narrative(&s);
        assert!(lines[2].contains("increase by 1,234.57% over"), "{}", lines[2]);
    }
}
