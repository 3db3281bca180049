// =============================================================================
// Application State - what the REST handlers share
// =============================================================================
//
// Read-only after startup: the configured client and the dashboard defaults.
// Every request performs a fresh fetch, so there is nothing to lock.
// =============================================================================

use crate::coinglass::{ApiResult, CoinGlassClient};
use crate::runtime_config::AppConfig;
use crate::types::Interval;

/// Shared across handlers via `Arc<AppState>`.
#[derive(Debug)]
pub struct AppState {
    pub client: CoinGlassClient,
    pub default_interval: Interval,
    pub default_limit: u32,
}

impl AppState {
    pub fn new(config: &AppConfig) -> ApiResult<Self> {
        Ok(Self {
            client: CoinGlassClient::new(config)?,
            default_interval: config.default_interval,
            default_limit: config.default_limit,
        })
    }
}
