// =============================================================================
// Chart specs - renderer-agnostic descriptions of the dashboard charts
// =============================================================================
//
// Pure functions from a normalized series to a serializable chart spec.  The
// front end maps these onto its plotting library; nothing here draws.
//
// Series are newest first, charts read left to right, so every builder emits
// its x values oldest first.

use serde::Serialize;

use crate::series::summary::{CLOSE, LONG_RATIO, SHORT_RATIO};
use crate::series::{PointTime, TimeSeriesRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Line(LineChart),
    Candlestick(CandlestickChart),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub traces: Vec<LineTrace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<AxisRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineTrace {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub x: Vec<PointTime>,
    pub y: Vec<Option<f64>>,
}

/// Fixed y-axis window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisRange {
    pub title: String,
    pub min: f64,
    pub max: f64,
    pub tick: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandlestickChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<PointTime>,
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub range_slider: bool,
}

fn chronological_times(record: &TimeSeriesRecord) -> Vec<PointTime> {
    let mut times = record.times();
    times.reverse();
    times
}

fn chronological_column(record: &TimeSeriesRecord, field: &str) -> Vec<Option<f64>> {
    let mut values = record.column(field);
    values.reverse();
    values
}

/// Line of closing values (`c`) over time.
pub fn closing_prices(record: &TimeSeriesRecord, title: &str) -> ChartSpec {
    ChartSpec::Line(LineChart {
        title: title.to_string(),
        x_label: "Date".to_string(),
        y_label: "Closing Price".to_string(),
        traces: vec![LineTrace {
            name: CLOSE.to_string(),
            color: None,
            x: chronological_times(record),
            y: chronological_column(record, CLOSE),
        }],
        y_axis: None,
    })
}

/// OHLC candlesticks, range slider off.
pub fn candlestick(record: &TimeSeriesRecord, title: &str) -> ChartSpec {
    ChartSpec::Candlestick(CandlestickChart {
        title: title.to_string(),
        x_label: "Date".to_string(),
        y_label: "Price".to_string(),
        x: chronological_times(record),
        open: chronological_column(record, "o"),
        high: chronological_column(record, "h"),
        low: chronological_column(record, "l"),
        close: chronological_column(record, CLOSE),
        range_slider: false,
    })
}

/// Long ratio (green) against short ratio (red) on a 0-100 % axis.
pub fn long_short_ratios(record: &TimeSeriesRecord, title: &str) -> ChartSpec {
    let x = chronological_times(record);
    ChartSpec::Line(LineChart {
        title: title.to_string(),
        x_label: "Date".to_string(),
        y_label: "Ratio (%)".to_string(),
        traces: vec![
            LineTrace {
                name: LONG_RATIO.to_string(),
                color: Some("green".to_string()),
                x: x.clone(),
                y: chronological_column(record, LONG_RATIO),
            },
            LineTrace {
                name: SHORT_RATIO.to_string(),
                color: Some("red".to_string()),
                x,
                y: chronological_column(record, SHORT_RATIO),
            },
        ],
        y_axis: Some(AxisRange {
            title: "Percentage".to_string(),
            min: 0.0,
            max: 100.0,
            tick: 10.0,
        }),
    })
}
