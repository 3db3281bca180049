// =============================================================================
// Shared types used across the metrics service
// =============================================================================

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A tradable pair on a specific exchange, as discovered in the provider's
/// instrument catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentRef {
    pub exchange: String,
    pub instrument_id: String,
}

impl InstrumentRef {
    pub fn new(exchange: impl Into<String>, instrument_id: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            instrument_id: instrument_id.into(),
        }
    }
}

impl std::fmt::Display for InstrumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.instrument_id, self.exchange)
    }
}

/// Bar interval accepted by the indicator endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "m1")]
    M1,
    #[serde(rename = "m5")]
    M5,
    #[serde(rename = "m15")]
    M15,
    #[serde(rename = "m30")]
    M30,
    #[serde(rename = "h1")]
    H1,
    #[serde(rename = "h4")]
    H4,
    #[serde(rename = "h8")]
    H8,
    #[serde(rename = "h12")]
    H12,
    #[serde(rename = "h24")]
    H24,
    #[serde(rename = "w1")]
    W1,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M1 => "m1",
            Self::M5 => "m5",
            Self::M15 => "m15",
            Self::M30 => "m30",
            Self::H1 => "h1",
            Self::H4 => "h4",
            Self::H8 => "h8",
            Self::H12 => "h12",
            Self::H24 => "h24",
            Self::W1 => "w1",
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::H24
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    /// Accepts the provider spelling (`h24`) as well as the conventional
    /// one (`24h`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let canonical = match lower.as_str() {
            "1m" => "m1",
            "5m" => "m5",
            "15m" => "m15",
            "30m" => "m30",
            "1h" => "h1",
            "4h" => "h4",
            "8h" => "h8",
            "12h" => "h12",
            "24h" | "1d" => "h24",
            "1w" => "w1",
            other => other,
        };
        [
            Self::M1,
            Self::M5,
            Self::M15,
            Self::M30,
            Self::H1,
            Self::H4,
            Self::H8,
            Self::H12,
            Self::H24,
            Self::W1,
        ]
        .into_iter()
        .find(|iv| iv.as_str() == canonical)
        .ok_or_else(|| format!("unknown interval '{s}'"))
    }
}

/// Unit of a numeric epoch timestamp in a raw provider record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

/// Time resolution of a normalized series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Truncated to the UTC calendar date.
    Daily,
    /// Full timestamp as reported by the provider.
    Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_parses_both_spellings() {
        assert_eq!("h24".parse::<Interval>().unwrap(), Interval::H24);
        assert_eq!("24h".parse::<Interval>().unwrap(), Interval::H24);
        assert_eq!("4H".parse::<Interval>().unwrap(), Interval::H4);
        assert!("h3".parse::<Interval>().is_err());
    }

    #[test]
    fn interval_serialises_provider_spelling() {
        assert_eq!(serde_json::to_string(&Interval::M15).unwrap(), "\"m15\"");
        assert_eq!(Interval::default().to_string(), "h24");
    }

    #[test]
    fn instrument_ref_uses_camel_case() {
        let r = InstrumentRef::new("Binance", "BTCUSDT");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["exchange"], "Binance");
        assert_eq!(json["instrumentId"], "BTCUSDT");
        assert_eq!(r.to_string(), "BTCUSDT@Binance");
    }
}
