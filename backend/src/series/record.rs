use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::Granularity;

// ---------------------------------------------------------------------------
// PointTime
// ---------------------------------------------------------------------------

/// Decoded time of a single point.  Daily series carry a bare date, event
/// series the full UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PointTime {
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl PointTime {
    /// Epoch milliseconds; a date maps to its UTC midnight.
    pub fn timestamp_millis(&self) -> i64 {
        match self {
            Self::Date(d) => d.and_time(NaiveTime::MIN).and_utc().timestamp_millis(),
            Self::DateTime(dt) => dt.timestamp_millis(),
        }
    }
}

impl Ord for PointTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp_millis()
            .cmp(&other.timestamp_millis())
            .then_with(|| {
                let rank = |t: &PointTime| matches!(t, PointTime::DateTime(_)) as u8;
                rank(self).cmp(&rank(other))
            })
    }
}

impl PartialOrd for PointTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for PointTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// One row of a normalized series: its decoded time plus every other field
/// the provider sent, in payload order.  `fields` never holds a `time` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub time: PointTime,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Point {
    /// Read `name` as a float.  The provider is inconsistent about sending
    /// numbers as JSON numbers or numeric strings, so both are accepted.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.fields.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TimeSeriesRecord
// ---------------------------------------------------------------------------

/// A normalized series, newest point first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesRecord {
    /// Name of the provider field the time was decoded from (`t`, `createTime`).
    pub time_field: String,
    pub granularity: Granularity,
    pub points: Vec<Point>,
}

impl TimeSeriesRecord {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent point.
    pub fn latest(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn times(&self) -> Vec<PointTime> {
        self.points.iter().map(|p| p.time).collect()
    }

    /// Values of `name` across all points, newest first.
    pub fn column(&self, name: &str) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.number(name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(time: PointTime, fields: Value) -> Point {
        Point {
            time,
            fields: fields.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn date_orders_against_datetime_by_instant() {
        let d = PointTime::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let dt = PointTime::DateTime(DateTime::from_timestamp_millis(1_709_300_000_000).unwrap());
        assert!(d < dt);
        assert_eq!(d.timestamp_millis(), 1_709_251_200_000);
    }

    #[test]
    fn number_accepts_strings_and_numbers() {
        let p = point(
            PointTime::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            json!({ "c": "42.5", "v": 7, "x": null, "name": "BTC" }),
        );
        assert_eq!(p.number("c"), Some(42.5));
        assert_eq!(p.number("v"), Some(7.0));
        assert_eq!(p.number("x"), None);
        assert_eq!(p.number("name"), None);
    }

    #[test]
    fn latest_is_first_point() {
        let newer = PointTime::Date(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        let older = PointTime::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let record = TimeSeriesRecord {
            time_field: "t".into(),
            granularity: Granularity::Daily,
            points: vec![point(newer, json!({ "c": 2 })), point(older, json!({ "c": 1 }))],
        };
        assert_eq!(record.latest().unwrap().time, newer);
        assert_eq!(record.times(), vec![newer, older]);
        assert_eq!(record.column("c"), vec![Some(2.0), Some(1.0)]);
    }

    #[test]
    fn point_serialises_flat() {
        let p = point(
            PointTime::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            json!({ "c": 1.5 }),
        );
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v, json!({ "time": "2024-01-01", "c": 1.5 }));
    }
}
