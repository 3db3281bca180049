// =============================================================================
// Record Normalizer - raw provider rows into a newest-first time series
// =============================================================================
//
// Every indicator endpoint returns `data` as an array of flat objects with one
// epoch timestamp field.  Normalization:
//
//   1. decodes the timestamp (seconds or milliseconds),
//   2. gives every point the same field set (union of keys, missing -> null),
//   3. sorts newest first on the decoded instant (stable, so equal instants
//      keep payload order),
//   4. truncates it to the UTC date for daily series.
//
// A provider column named `time` would collide with the decoded time on the
// wire, so it is carried as `time_raw`.
//
// No interpolation, gap filling or deduplication happens here.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use super::record::{Point, PointTime, TimeSeriesRecord};
use crate::types::{Granularity, TimeUnit};

/// Column set the price OHLC series is reduced to.
pub const PRICE_OHLC_COLUMNS: [&str; 6] = ["t", "o", "h", "l", "c", "v"];

/// Key the decoded time serializes under.
pub const TIME_KEY: &str = "time";
/// Where a provider column that clashes with [`TIME_KEY`] ends up.
pub const RAW_TIME_KEY: &str = "time_raw";

fn output_key(column: &str) -> &str {
    if column == TIME_KEY {
        RAW_TIME_KEY
    } else {
        column
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("record {index} has no '{field}' field")]
    MissingTimeField { index: usize, field: String },

    #[error("record {index} has a non-numeric '{field}' value: {value}")]
    BadTimestamp {
        index: usize,
        field: String,
        value: String,
    },

    #[error("record {index}: timestamp {value} is out of range")]
    OutOfRange { index: usize, value: i64 },
}

/// Normalize `raw` into a [`TimeSeriesRecord`] sorted newest first.
pub fn normalize(
    raw: &[Value],
    time_field: &str,
    unit: TimeUnit,
    granularity: Granularity,
) -> Result<TimeSeriesRecord, NormalizeError> {
    let mut columns: Vec<&str> = Vec::new();
    for (index, row) in raw.iter().enumerate() {
        let obj = row.as_object().ok_or(NormalizeError::NotAnObject { index })?;
        for key in obj.keys() {
            if key != time_field && !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut decoded_rows = Vec::with_capacity(raw.len());
    for (index, row) in raw.iter().enumerate() {
        let obj = row.as_object().ok_or(NormalizeError::NotAnObject { index })?;

        let stamp = obj
            .get(time_field)
            .filter(|v| !v.is_null())
            .ok_or_else(|| NormalizeError::MissingTimeField {
                index,
                field: time_field.to_string(),
            })?;
        let epoch = epoch_value(stamp).ok_or_else(|| NormalizeError::BadTimestamp {
            index,
            field: time_field.to_string(),
            value: stamp.to_string(),
        })?;
        let decoded = decode_epoch(epoch, unit)
            .ok_or(NormalizeError::OutOfRange { index, value: epoch })?;

        let mut fields = Map::with_capacity(columns.len());
        for col in &columns {
            fields.insert(
                output_key(col).to_string(),
                obj.get(*col).cloned().unwrap_or(Value::Null),
            );
        }

        decoded_rows.push((decoded, fields));
    }

    // Order on the full instant; truncation below may make daily points equal.
    decoded_rows.sort_by(|a, b| b.0.cmp(&a.0));

    let points = decoded_rows
        .into_iter()
        .map(|(decoded, fields)| {
            let time = match granularity {
                Granularity::Daily => PointTime::Date(decoded.date_naive()),
                Granularity::Event => PointTime::DateTime(decoded),
            };
            Point { time, fields }
        })
        .collect();

    Ok(TimeSeriesRecord {
        time_field: time_field.to_string(),
        granularity,
        points,
    })
}

/// Reduce every row to exactly `columns`, in that order.  Object rows are
/// matched by key: extra provider fields are dropped, absent ones become
/// `null`.  Array rows (`[t, o, h, l, c, v]`) are matched by position.
pub fn select_columns(raw: &[Value], columns: &[&str]) -> Result<Vec<Value>, NormalizeError> {
    raw.iter()
        .enumerate()
        .map(|(index, row)| {
            let selected: Map<String, Value> = match row {
                Value::Object(obj) => columns
                    .iter()
                    .map(|c| ((*c).to_string(), obj.get(*c).cloned().unwrap_or(Value::Null)))
                    .collect(),
                Value::Array(cells) => columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| ((*c).to_string(), cells.get(i).cloned().unwrap_or(Value::Null)))
                    .collect(),
                _ => return Err(NormalizeError::NotAnObject { index }),
            };
            Ok(Value::Object(selected))
        })
        .collect()
}

/// Decode an epoch value in `unit` into a UTC timestamp.
pub fn decode_epoch(value: i64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    match unit {
        TimeUnit::Seconds => DateTime::from_timestamp(value, 0),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    }
}

fn epoch_value(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}
