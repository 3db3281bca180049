// =============================================================================
// CoinGlass Endpoint Client - one method per indicator
// =============================================================================
//
//   metric               path                                   time field   unit  granularity
//   open interest OHLC   /indicator/open_interest_ohlc          t            ms    daily
//   price OHLC           /indicator/price_ohlc                  t            s     daily
//   top account ratio    /indicator/top_long_short_account_ratio createTime  ms    event
//   top position ratio   /indicator/top_long_short_position_ratio createTime ms    event
//   all accounts ratio   /indicator/long_short_accounts         createTime   ms    event
//
// Every method builds `{ex, pair, interval, limit}`, pulls `data` out of the
// envelope and hands the rows to the normalizer.  Open interest is always
// requested as 50 daily bars.
// =============================================================================

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::error::{ApiError, ApiResult};
use super::transport::Transport;
use crate::runtime_config::AppConfig;
use crate::series::{normalize, select_columns, TimeSeriesRecord, PRICE_OHLC_COLUMNS};
use crate::types::{Granularity, Interval, TimeUnit};

/// Row limit used when the caller does not choose one.
pub const DEFAULT_LIMIT: u32 = 50;

/// Interval the open-interest series is always fetched at.
pub const OPEN_INTEREST_INTERVAL: Interval = Interval::H24;

// =============================================================================
// Metric catalogue
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    OpenInterest,
    Price,
    TopAccountRatio,
    TopPositionRatio,
    AccountRatio,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Self::OpenInterest,
        Self::Price,
        Self::TopAccountRatio,
        Self::TopPositionRatio,
        Self::AccountRatio,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::OpenInterest => "/public/v2/indicator/open_interest_ohlc",
            Self::Price => "/public/v2/indicator/price_ohlc",
            Self::TopAccountRatio => "/public/v2/indicator/top_long_short_account_ratio",
            Self::TopPositionRatio => "/public/v2/indicator/top_long_short_position_ratio",
            Self::AccountRatio => "/public/v2/indicator/long_short_accounts",
        }
    }

    pub fn time_field(&self) -> &'static str {
        match self {
            Self::OpenInterest | Self::Price => "t",
            _ => "createTime",
        }
    }

    pub fn time_unit(&self) -> TimeUnit {
        match self {
            Self::Price => TimeUnit::Seconds,
            _ => TimeUnit::Milliseconds,
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Self::OpenInterest | Self::Price => Granularity::Daily,
            _ => Granularity::Event,
        }
    }

    /// Short snake_case name, as used in URLs and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenInterest => "open_interest",
            Self::Price => "price",
            Self::TopAccountRatio => "top_account_ratio",
            Self::TopPositionRatio => "top_position_ratio",
            Self::AccountRatio => "account_ratio",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown metric '{s}'"))
    }
}

// =============================================================================
// Client
// =============================================================================

/// Typed access to the CoinGlass indicator and instrument endpoints.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct CoinGlassClient {
    transport: Transport,
}

impl CoinGlassClient {
    pub fn new(config: &AppConfig) -> ApiResult<Self> {
        let transport = Transport::new(config)?;
        info!(base_url = %transport.base_url(), "CoinGlass client ready");
        Ok(Self { transport })
    }

    pub(crate) fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Daily open-interest OHLC, 50 bars at `h24`.
    pub async fn fetch_open_interest(
        &self,
        exchange: &str,
        pair: &str,
    ) -> ApiResult<TimeSeriesRecord> {
        self.fetch_metric(
            Metric::OpenInterest,
            exchange,
            pair,
            OPEN_INTEREST_INTERVAL,
            DEFAULT_LIMIT,
        )
        .await
    }

    /// Daily price OHLC reduced to `t, o, h, l, c, v`.
    pub async fn fetch_price_ohlc(
        &self,
        exchange: &str,
        pair: &str,
        interval: Interval,
        limit: u32,
    ) -> ApiResult<TimeSeriesRecord> {
        self.fetch_metric(Metric::Price, exchange, pair, interval, limit)
            .await
    }

    /// Long/short ratio of the top accounts by count.
    pub async fn fetch_top_account_ratio(
        &self,
        exchange: &str,
        pair: &str,
        interval: Interval,
        limit: u32,
    ) -> ApiResult<TimeSeriesRecord> {
        self.fetch_metric(Metric::TopAccountRatio, exchange, pair, interval, limit)
            .await
    }

    /// Long/short ratio of the top accounts by position size.
    pub async fn fetch_top_position_ratio(
        &self,
        exchange: &str,
        pair: &str,
        interval: Interval,
        limit: u32,
    ) -> ApiResult<TimeSeriesRecord> {
        self.fetch_metric(Metric::TopPositionRatio, exchange, pair, interval, limit)
            .await
    }

    /// Long/short ratio across all accounts.
    pub async fn fetch_account_ratio(
        &self,
        exchange: &str,
        pair: &str,
        interval: Interval,
        limit: u32,
    ) -> ApiResult<TimeSeriesRecord> {
        self.fetch_metric(Metric::AccountRatio, exchange, pair, interval, limit)
            .await
    }

    /// Fetch and normalize any indicator.  `interval` and `limit` are
    /// ignored for [`Metric::OpenInterest`], which is always daily.
    #[instrument(skip(self), name = "coinglass::fetch_metric")]
    pub async fn fetch_metric(
        &self,
        metric: Metric,
        exchange: &str,
        pair: &str,
        interval: Interval,
        limit: u32,
    ) -> ApiResult<TimeSeriesRecord> {
        let (interval, limit) = match metric {
            Metric::OpenInterest => (OPEN_INTEREST_INTERVAL, DEFAULT_LIMIT),
            _ => (interval, limit),
        };

        match self.fetch_rows(metric, exchange, pair, interval, limit).await {
            Ok(record) if record.is_empty() => {
                warn!(metric = %metric, exchange, pair, "provider returned an empty series");
                Ok(record)
            }
            Ok(record) => {
                debug!(
                    metric = %metric,
                    exchange,
                    pair,
                    count = record.len(),
                    "metric fetched"
                );
                Ok(record)
            }
            Err(e) => {
                error!(metric = %metric, exchange, pair, error = %e, "metric fetch failed");
                Err(e)
            }
        }
    }

    async fn fetch_rows(
        &self,
        metric: Metric,
        exchange: &str,
        pair: &str,
        interval: Interval,
        limit: u32,
    ) -> ApiResult<TimeSeriesRecord> {
        let path = metric.path();
        let params = [
            ("ex", exchange.to_string()),
            ("pair", pair.to_string()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];

        let body = self.transport.request(path, &params).await?;
        let rows = match extract_data(path, body)? {
            Value::Array(rows) => rows,
            other => {
                return Err(ApiError::Decode {
                    path: path.to_string(),
                    reason: format!("'data' is not an array: {}", json_kind(&other)),
                })
            }
        };

        let rows = match metric {
            Metric::Price => select_columns(&rows, &PRICE_OHLC_COLUMNS).map_err(|source| {
                ApiError::Normalize {
                    path: path.to_string(),
                    source,
                }
            })?,
            _ => rows,
        };

        normalize(
            &rows,
            metric.time_field(),
            metric.time_unit(),
            metric.granularity(),
        )
        .map_err(|source| ApiError::Normalize {
            path: path.to_string(),
            source,
        })
    }
}

// =============================================================================
// Envelope helpers
// =============================================================================

/// Pull `data` out of the provider envelope
/// (`{ "code": "0", "msg": "success", "success": true, "data": ... }`).
pub(crate) fn extract_data(path: &str, mut body: Value) -> ApiResult<Value> {
    if let Some(data) = body.get_mut("data").map(Value::take) {
        if !data.is_null() {
            return Ok(data);
        }
    }

    let code = body.get("code").map(|c| match c {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    let failed = body.get("success").and_then(Value::as_bool) == Some(false)
        || code.as_deref().is_some_and(|c| c != "0");

    if failed {
        return Err(ApiError::Provider {
            path: path.to_string(),
            code: code.unwrap_or_default(),
            message: body["msg"].as_str().unwrap_or_default().to_string(),
        });
    }

    Err(ApiError::Decode {
        path: path.to_string(),
        reason: "response has no 'data' field".to_string(),
    })
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
