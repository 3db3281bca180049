// =============================================================================
// Dashboard Aggregator - all five metrics for one instrument
// =============================================================================
//
// The five fetches are independent, so they run concurrently.  The snapshot is
// only assembled once every one of them has succeeded; the first failure is
// returned as-is and no partial snapshot exists.
//
// Tiles always read index 0 of the newest-first series.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use crate::charts::{self, ChartSpec};
use crate::coinglass::{ApiResult, CoinGlassClient};
use crate::series::{latest_close, latest_ratio, RatioReading, TimeSeriesRecord, ValueReading};
use crate::types::{InstrumentRef, Interval};

/// What the caller picked: a coin, one of its instruments and the bar shape.
#[derive(Debug, Clone)]
pub struct DashboardRequest {
    pub coin: String,
    pub instrument: InstrumentRef,
    pub interval: Interval,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub coin: String,
    pub instrument: InstrumentRef,
    pub fetched_at: DateTime<Utc>,
    pub open_interest: TimeSeriesRecord,
    pub price: TimeSeriesRecord,
    pub top_account_ratio: TimeSeriesRecord,
    pub top_position_ratio: TimeSeriesRecord,
    pub account_ratio: TimeSeriesRecord,
    pub summary: DashboardSummary,
    pub tiles: Vec<MetricTile>,
    pub charts: DashboardCharts,
}

/// Latest reading of every series; `None` when a series came back empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub open_interest: Option<ValueReading>,
    pub price: Option<ValueReading>,
    pub top_account_ratio: Option<RatioReading>,
    pub top_position_ratio: Option<RatioReading>,
    pub account_ratio: Option<RatioReading>,
}

/// Pre-formatted label/value pair for an at-a-glance widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTile {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardCharts {
    pub price: ChartSpec,
    pub open_interest: ChartSpec,
    pub top_account_ratio: ChartSpec,
    pub top_position_ratio: ChartSpec,
    pub account_ratio: ChartSpec,
}

const NOT_AVAILABLE: &str = "n/a";

impl DashboardSummary {
    pub fn from_records(
        open_interest: &TimeSeriesRecord,
        price: &TimeSeriesRecord,
        top_account_ratio: &TimeSeriesRecord,
        top_position_ratio: &TimeSeriesRecord,
        account_ratio: &TimeSeriesRecord,
    ) -> Self {
        Self {
            open_interest: latest_close(open_interest),
            price: latest_close(price),
            top_account_ratio: latest_ratio(top_account_ratio),
            top_position_ratio: latest_ratio(top_position_ratio),
            account_ratio: latest_ratio(account_ratio),
        }
    }

    /// Widget rows, in display order.
    pub fn tiles(&self, coin: &str) -> Vec<MetricTile> {
        let ratio = |r: &Option<RatioReading>| {
            r.map(|r| r.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        vec![
            MetricTile {
                label: "Open Interest".to_string(),
                value: self
                    .open_interest
                    .map(|r| format!("{} {}", group_thousands(r.value), coin))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            },
            MetricTile {
                label: "Price".to_string(),
                value: self
                    .price
                    .map(|r| format!("${}", r.value))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            },
            MetricTile {
                label: "Top Accounts Ratio".to_string(),
                value: ratio(&self.top_account_ratio),
            },
            MetricTile {
                label: "Top Traders Position Ratios".to_string(),
                value: ratio(&self.top_position_ratio),
            },
            MetricTile {
                label: "All Accounts Ratio".to_string(),
                value: ratio(&self.account_ratio),
            },
        ]
    }
}

/// `1234567.5` -> `1,234,567.5`
pub fn group_thousands(value: f64) -> String {
    let raw = value.to_string();
    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Fetch every metric for `req.instrument` and assemble the snapshot.
#[instrument(skip(client), fields(instrument = %req.instrument), name = "dashboard::fetch")]
pub async fn fetch_dashboard(
    client: &CoinGlassClient,
    req: &DashboardRequest,
) -> ApiResult<DashboardSnapshot> {
    let exchange = req.instrument.exchange.as_str();
    let pair = req.instrument.instrument_id.as_str();

    let (open_interest, price, top_account_ratio, top_position_ratio, account_ratio) = tokio::try_join!(
        client.fetch_open_interest(exchange, pair),
        client.fetch_price_ohlc(exchange, pair, req.interval, req.limit),
        client.fetch_top_account_ratio(exchange, pair, req.interval, req.limit),
        client.fetch_top_position_ratio(exchange, pair, req.interval, req.limit),
        client.fetch_account_ratio(exchange, pair, req.interval, req.limit),
    )?;

    let coin = req.coin.trim().to_uppercase();
    let summary = DashboardSummary::from_records(
        &open_interest,
        &price,
        &top_account_ratio,
        &top_position_ratio,
        &account_ratio,
    );
    let tiles = summary.tiles(&coin);
    let charts = DashboardCharts {
        price: charts::candlestick(&price, "Price"),
        open_interest: charts::closing_prices(&open_interest, "Open Interest"),
        top_account_ratio: charts::long_short_ratios(&top_account_ratio, "Top Traders Accounts Ratio"),
        top_position_ratio: charts::long_short_ratios(&top_position_ratio, "Top Traders Position Ratio"),
        account_ratio: charts::long_short_ratios(&account_ratio, "Total Accounts"),
    };

    info!(
        coin = %coin,
        exchange,
        pair,
        price_points = price.len(),
        oi_points = open_interest.len(),
        "dashboard assembled"
    );

    Ok(DashboardSnapshot {
        coin,
        instrument: req.instrument.clone(),
        fetched_at: Utc::now(),
        open_interest,
        price,
        top_account_ratio,
        top_position_ratio,
        account_ratio,
        summary,
        tiles,
        charts,
    })
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::coinglass::{mock, ApiError, Metric};

    fn ratio_rows() -> Value {
        json!({ "code": "0", "data": [
            { "createTime": 1_700_000_000_000_i64, "longRatio": 40.0, "shortRatio": 60.0 },
            { "createTime": 1_700_086_400_000_i64, "longRatio": 52.5, "shortRatio": 47.5 }
        ]})
    }

    fn provider(fail_ratio: bool) -> Router {
        let reply = |body: Value| get(move || async move { Json(body) });
        let router = Router::new()
            .route(
                Metric::OpenInterest.path(),
                reply(json!({ "code": "0", "data": [
                    { "t": 1_704_067_200_000_i64, "o": 1, "h": 1, "l": 1, "c": 1000 },
                    { "t": 1_704_153_600_000_i64, "o": 1, "h": 1, "l": 1, "c": 1234567.5 }
                ]})),
            )
            .route(
                Metric::Price.path(),
                reply(json!({ "code": "0", "data": [
                    { "t": 1_704_067_200, "o": 42000, "h": 43000, "l": 41000, "c": 42500, "v": 1 },
                    { "t": 1_704_153_600, "o": 42500, "h": 44000, "l": 42000, "c": 43900.5, "v": 2 }
                ]})),
            )
            .route(Metric::TopPositionRatio.path(), reply(ratio_rows()))
            .route(Metric::AccountRatio.path(), reply(ratio_rows()));

        if fail_ratio {
            router.route(
                Metric::TopAccountRatio.path(),
                get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
            )
        } else {
            router.route(Metric::TopAccountRatio.path(), reply(ratio_rows()))
        }
    }

    fn request() -> DashboardRequest {
        DashboardRequest {
            coin: "btc".to_string(),
            instrument: InstrumentRef::new("Binance", "BTCUSDT"),
            interval: Interval::H24,
            limit: 50,
        }
    }

    #[tokio::test]
    async fn snapshot_reads_newest_point_of_every_series() {
        let base = mock::serve(provider(false)).await;
        let client = CoinGlassClient::new(&mock::config(&base)).unwrap();

        let snap = fetch_dashboard(&client, &request()).await.unwrap();

        assert_eq!(snap.coin, "BTC");
        assert_eq!(snap.summary.open_interest.unwrap().value, 1234567.5);
        assert_eq!(snap.summary.price.unwrap().value, 43900.5);
        let ratio = snap.summary.account_ratio.unwrap();
        assert_eq!((ratio.long_ratio, ratio.short_ratio), (52.5, 47.5));

        let values: Vec<&str> = snap.tiles.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(
            values,
            vec!["1,234,567.5 BTC", "$43900.5", "52.5/47.5", "52.5/47.5", "52.5/47.5"]
        );
        let ChartSpec::Line(chart) = &snap.charts.account_ratio else {
            panic!("expected a line chart");
        };
        assert_eq!(chart.title, "Total Accounts");
    }

    #[tokio::test]
    async fn one_failing_metric_fails_the_whole_snapshot() {
        let base = mock::serve(provider(true)).await;
        let client = CoinGlassClient::new(&mock::config(&base)).unwrap();

        let err = fetch_dashboard(&client, &request()).await.unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 429, .. }));
    }

    #[test]
    fn empty_series_render_as_not_available() {
        let empty = TimeSeriesRecord {
            time_field: "t".into(),
            granularity: crate::types::Granularity::Daily,
            points: Vec::new(),
        };
        let summary = DashboardSummary::from_records(&empty, &empty, &empty, &empty, &empty);
        assert!(summary.tiles("ETH").iter().all(|t| t.value == "n/a"));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1234567.25), "1,234,567.25");
        assert_eq!(group_thousands(-98765.5), "-98,765.5");
    }
}
