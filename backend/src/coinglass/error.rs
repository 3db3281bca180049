//! Error taxonomy for calls against the CoinGlass API.

use thiserror::Error;

use crate::series::NormalizeError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response.  `details` holds the decoded error body when the
    /// provider sent parseable JSON.
    #[error("HTTP error occurred: {status} {reason}")]
    Http {
        status: u16,
        reason: String,
        details: Option<serde_json::Value>,
    },

    /// The request never produced a response (DNS, TLS, connection reset) or
    /// its body could not be read as JSON.
    #[error("request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// 2xx response whose envelope reports a failure instead of `data`.
    #[error("provider rejected {path}: code={code} msg={message}")]
    Provider {
        path: String,
        code: String,
        message: String,
    },

    #[error("malformed response from {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("malformed record from {path}: {source}")]
    Normalize {
        path: String,
        #[source]
        source: NormalizeError,
    },

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Upstream HTTP status, when the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Request { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
