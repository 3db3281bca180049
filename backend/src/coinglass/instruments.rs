// =============================================================================
// Instrument Resolver - which (exchange, pair) combinations trade a coin
// =============================================================================
//
// The catalog endpoint answers with `data` mapping exchange name to a list of
// instrument descriptors.  The `symbol` query is only a hint, so matches are
// re-checked here: a descriptor is kept when the coin equals its base or
// quote asset, ignoring case.  Payload order is preserved.
//
// An unknown coin is not an error: it resolves to an empty list.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use super::client::{extract_data, CoinGlassClient};
use super::error::{ApiError, ApiResult};
use crate::types::InstrumentRef;

pub const INSTRUMENT_PATH: &str = "/public/v2/instrument";

/// One catalog entry.  Only the fields the resolver needs are decoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentDescriptor {
    pub instrument_id: String,
    pub base_asset: String,
    pub quote_asset: String,
}

impl InstrumentDescriptor {
    fn trades(&self, coin_upper: &str) -> bool {
        self.base_asset.to_uppercase() == coin_upper
            || self.quote_asset.to_uppercase() == coin_upper
    }
}

/// Exchange name and its instruments, in payload order.
pub type Catalog = Vec<(String, Vec<InstrumentDescriptor>)>;

/// Decode the catalog `data` object.
pub fn parse_catalog(data: Value) -> Result<Catalog, String> {
    let Value::Object(by_exchange) = data else {
        return Err("catalog 'data' is not an object".to_string());
    };

    by_exchange
        .into_iter()
        .map(|(exchange, instruments)| {
            let parsed: Vec<InstrumentDescriptor> = serde_json::from_value(instruments)
                .map_err(|e| format!("bad instrument list for {exchange}: {e}"))?;
            Ok((exchange, parsed))
        })
        .collect()
}

/// Every instrument in `catalog` that has `coin` as base or quote asset.
pub fn filter_catalog(catalog: &Catalog, coin: &str) -> Vec<InstrumentRef> {
    let coin_upper = coin.trim().to_uppercase();
    let coin_upper = coin_upper.as_str();
    catalog
        .iter()
        .flat_map(|(exchange, instruments)| {
            instruments
                .iter()
                .filter(move |d| d.trades(coin_upper))
                .map(move |d| InstrumentRef::new(exchange.clone(), d.instrument_id.clone()))
        })
        .collect()
}

/// Distinct exchanges in first-seen order.
pub fn exchanges(instruments: &[InstrumentRef]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for r in instruments {
        if !out.contains(&r.exchange.as_str()) {
            out.push(&r.exchange);
        }
    }
    out
}

/// Instrument ids listed on `exchange`.
pub fn pairs_on<'a>(instruments: &'a [InstrumentRef], exchange: &str) -> Vec<&'a str> {
    instruments
        .iter()
        .filter(|r| r.exchange == exchange)
        .map(|r| r.instrument_id.as_str())
        .collect()
}

impl CoinGlassClient {
    /// Discover the (exchange, instrument) pairs trading `coin`.
    ///
    /// A blank symbol resolves to an empty list without a request.
    #[instrument(skip(self), name = "coinglass::resolve_instruments")]
    pub async fn resolve_instruments(&self, coin: &str) -> ApiResult<Vec<InstrumentRef>> {
        let coin = coin.trim().to_uppercase();
        if coin.is_empty() {
            debug!("blank coin symbol, nothing to resolve");
            return Ok(Vec::new());
        }

        let result: ApiResult<Catalog> = async {
            let body = self
                .transport()
                .request(INSTRUMENT_PATH, &[("symbol", coin.clone())])
                .await?;
            let data = extract_data(INSTRUMENT_PATH, body)?;
            parse_catalog(data).map_err(|reason| ApiError::Decode {
                path: INSTRUMENT_PATH.to_string(),
                reason,
            })
        }
        .await;

        match result {
            Ok(catalog) => {
                let found = filter_catalog(&catalog, &coin);
                info!(coin = %coin, count = found.len(), "instruments resolved");
                Ok(found)
            }
            Err(e) => {
                error!(coin = %coin, error = %e, "instrument lookup failed");
                Err(e)
            }
        }
    }
}
