// Latest-value readings used for the at-a-glance metric tiles.
//
// Every normalized series is newest first, so "latest" is always index 0.

use serde::Serialize;

use super::record::{PointTime, TimeSeriesRecord};

pub const LONG_RATIO: &str = "longRatio";
pub const SHORT_RATIO: &str = "shortRatio";
pub const CLOSE: &str = "c";

/// Long/short split at a single point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioReading {
    pub time: PointTime,
    pub long_ratio: f64,
    pub short_ratio: f64,
}

impl std::fmt::Display for RatioReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.long_ratio, self.short_ratio)
    }
}

/// Single numeric reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueReading {
    pub time: PointTime,
    pub value: f64,
}

/// Latest value of `field`, or `None` when the series is empty or the newest
/// point lacks a numeric value.
pub fn latest_value(record: &TimeSeriesRecord, field: &str) -> Option<ValueReading> {
    let p = record.latest()?;
    Some(ValueReading {
        time: p.time,
        value: p.number(field)?,
    })
}

/// Latest close of an OHLC series.
pub fn latest_close(record: &TimeSeriesRecord) -> Option<ValueReading> {
    latest_value(record, CLOSE)
}

/// Latest long/short split of a ratio series.
pub fn latest_ratio(record: &TimeSeriesRecord) -> Option<RatioReading> {
    let p = record.latest()?;
    Some(RatioReading {
        time: p.time,
        long_ratio: p.number(LONG_RATIO)?,
        short_ratio: p.number(SHORT_RATIO)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::normalize::normalize;
    use crate::types::{Granularity, TimeUnit};
    use serde_json::json;

    #[test]
    fn latest_ratio_reads_newest_point() {
        let raw = vec![
            json!({ "createTime": 1000, "longRatio": 48.0, "shortRatio": 52.0 }),
            json!({ "createTime": 3000, "longRatio": 61.2, "shortRatio": 38.8 }),
            json!({ "createTime": 2000, "longRatio": 50.0, "shortRatio": 50.0 }),
        ];
        let record = normalize(&raw, "createTime", TimeUnit::Milliseconds, Granularity::Event).unwrap();
        let r = latest_ratio(&record).unwrap();
        assert_eq!(r.long_ratio, 61.2);
        assert_eq!(r.short_ratio, 38.8);
        assert_eq!(r.time.timestamp_millis(), 3000);
        assert_eq!(r.to_string(), "61.2/38.8");
    }

    #[test]
    fn latest_close_reads_newest_day() {
        let raw = vec![
            json!({ "t": 86_400, "c": "10.5" }),
            json!({ "t": 2 * 86_400, "c": "11.0" }),
        ];
        let record = normalize(&raw, "t", TimeUnit::Seconds, Granularity::Daily).unwrap();
        assert_eq!(latest_close(&record).unwrap().value, 11.0);
    }

    #[test]
    fn empty_series_has_no_reading() {
        let record = normalize(&[], "t", TimeUnit::Seconds, Granularity::Daily).unwrap();
        assert!(latest_close(&record).is_none());
        assert!(latest_ratio(&record).is_none());
    }
}
