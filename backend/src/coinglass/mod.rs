// =============================================================================
// CoinGlass API
// =============================================================================
//
// Layers, leaf first:
//
//   transport    keyed GET, HTTP failures surfaced as ApiError::Http
//   client       one method per indicator, `data` extraction, normalization
//   instruments  coin symbol -> (exchange, instrument) pairs

pub mod client;
pub mod error;
pub mod instruments;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{CoinGlassClient, Metric};
pub use error::{ApiError, ApiResult};
