// Chart description for the report, serialised as Plotly figure JSON.
//
// Four traces, drawn in order: the invisible upper bound, the lower bound
// filled up to it (the shaded band), the forecast trend line, and the actual
// observations as markers.
use crate::types::{CountrySeries, ForecastResult};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub size: u32,
    pub color: &'static str,
    pub symbol: &'static str,
}

impl Trace {
    fn scatter(x: Vec<String>, y: Vec<f64>, mode: &'static str) -> Self {
        Self {
            kind: "scatter",
            x,
            y,
            mode,
            name: None,
            showlegend: None,
            fill: None,
            fillcolor: None,
            line: None,
            marker: None,
        }
    }
}

pub fn build_figure(series: &CountrySeries, forecast: &ForecastResult) -> Figure {
    let dates: Vec<String> = forecast.points().iter().map(|p| p.date.to_string()).collect();
    let pick = |f: fn(&crate::types::ForecastPoint) -> f64| -> Vec<f64> {
        forecast.points().iter().map(f).collect()
    };

    let mut upper = Trace::scatter(dates.clone(), pick(|p| p.upper_bound), "lines");
    upper.line = Some(Line { width: 0.0, color: None });
    upper.showlegend = Some(false);

    let mut band = Trace::scatter(dates.clone(), pick(|p| p.lower_bound), "lines");
    band.fill = Some("tonexty");
    band.fillcolor = Some("rgba(0,176,246,0.1)");
    band.line = Some(Line { width: 0.0, color: None });
    band.name = Some(format!(
        "{}% Confidence Interval",
        (forecast.confidence_level() * 100.0).round()
    ));

    let mut trend = Trace::scatter(dates, pick(|p| p.point_estimate), "lines");
    trend.name = Some("Forecasted Trend".to_string());
    trend.line = Some(Line { width: 2.0, color: Some("red") });

    let mut actual = Trace::scatter(
        series.rows().iter().map(|r| r.date.to_string()).collect(),
        series.values(),
        "markers",
    );
    actual.name = Some("Actual Reported Data".to_string());
    actual.marker = Some(Marker { size: 5, color: "black", symbol: "circle" });

    Figure {
        data: vec![upper, band, trend, actual],
        layout: Layout {
            title: format!("Pandemic Progression & Prediction: {}", series.country()),
            xaxis: Axis { title: "Date".to_string() },
            yaxis: Axis { title: "Cumulative Cases".to_string() },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ForecastPoint;
    use chrono::NaiveDate;

    #[test]
    fn figure_has_four_traces_in_draw_order() {
        let d1 = NaiveDate::from_ymd_opt(2020, 5, 1).unwrap();
        let d2 = d1.succ_opt().unwrap();
        let series = CountrySeries::from_pairs("Peru", &[(d1, 10), (d2, 20)]);
        let points = vec![
            ForecastPoint { date: d1, point_estimate: 10.0, lower_bound: 8.0, upper_bound: 12.0 },
            ForecastPoint { date: d2, point_estimate: 20.0, lower_bound: 18.0, upper_bound: 22.0 },
        ];
        let forecast = ForecastResult::new(points, d2, 0, 0.95);
        let fig = build_figure(&series, &forecast);

        assert_eq!(fig.data.len(), 4);
        assert_eq!(fig.data[0].y, vec![12.0, 22.0]);
        assert_eq!(fig.data[1].fill, Some("tonexty"));
        assert_eq!(fig.data[1].name.as_deref(), Some("95% Confidence Interval"));
        assert_eq!(fig.data[2].y, vec![10.0, 20.0]);
        assert_eq!(fig.data[3].mode, "markers");

        let json = serde_json::to_value(&fig).unwrap();
        assert_eq!(json["data"][0]["showlegend"], false);
        assert!(json["data"][2].get("marker").is_none());
    }
}
