// =============================================================================
// CoinGlass HTTP Transport - keyed GET requests against the public v2 API
// =============================================================================
//
// SECURITY: the API key only ever travels as a default header marked
// sensitive; it is never logged, formatted or placed in the query string.
//
// One attempt per call.  No retry, no backoff and no timeout beyond reqwest's
// defaults: every failure is handed straight back to the caller.
// =============================================================================

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::error::{ApiError, ApiResult};
use crate::runtime_config::AppConfig;

/// Thin GET-only transport bound to one base URL and one API key.
#[derive(Clone)]
pub struct Transport {
    base_url: String,
    client: reqwest::Client,
}

impl Transport {
    /// Build a transport from the startup configuration.
    pub fn new(config: &AppConfig) -> ApiResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let name = HeaderName::from_bytes(config.api_key_header.as_bytes()).map_err(|e| {
            ApiError::Config(format!(
                "invalid API key header name '{}': {e}",
                config.api_key_header
            ))
        })?;
        let mut value = HeaderValue::from_str(config.api_key.expose()).map_err(|_| {
            ApiError::Config("API key contains characters not allowed in a header".to_string())
        })?;
        value.set_sensitive(true);
        default_headers.insert(name, value);

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "CoinGlass transport initialised");

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base_url}{path}` with `params` as the query string and return the
    /// parsed JSON body unchanged.
    ///
    /// A non-2xx status becomes [`ApiError::Http`].  The error body is decoded
    /// on a best-effort basis for diagnostics only; when it is not JSON the
    /// error simply carries no details.
    #[instrument(skip(self, params), name = "coinglass::request")]
    pub async fn request(&self, path: &str, params: &[(&str, String)]) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|source| {
                warn!(path, error = %source, "request failed before a response arrived");
                ApiError::Request {
                    path: path.to_string(),
                    source,
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let code = status.as_u16();
            let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
            warn!(path, status = code, "HTTP error occurred: {} {}", code, reason);

            let details = match resp.json::<Value>().await {
                Ok(body) => {
                    warn!(path, details = %body, "error details");
                    Some(body)
                }
                Err(_) => {
                    warn!(path, "no detailed error message available from API");
                    None
                }
            };

            return Err(ApiError::Http {
                status: code,
                reason,
                details,
            });
        }

        let bytes = resp.bytes().await.map_err(|source| {
            warn!(path, error = %source, "failed to read response body");
            ApiError::Request {
                path: path.to_string(),
                source,
            }
        })?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(path, error = %e, "response body is not JSON");
            ApiError::Decode {
                path: path.to_string(),
                reason: format!("malformed JSON body: {e}"),
            }
        })?;

        debug!(path, "response received");
        Ok(body)
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::json;

    use super::*;
    use crate::coinglass::mock;

    async fn echo(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        Json(json!({
            "code": "0",
            "data": {
                "key": header("coinglasssecret"),
                "accept": header("accept"),
                "query": q,
            }
        }))
    }

    #[tokio::test]
    async fn sends_key_header_and_query() {
        let base = mock::serve(Router::new().route("/public/v2/echo", get(echo))).await;
        let transport = Transport::new(&mock::config(&base)).unwrap();

        let body = transport
            .request(
                "/public/v2/echo",
                &[("ex", "Binance".to_string()), ("limit", "50".to_string())],
            )
            .await
            .unwrap();

        assert_eq!(body["data"]["key"], "test-key");
        assert_eq!(body["data"]["accept"], "application/json");
        assert_eq!(body["data"]["query"]["ex"], "Binance");
        assert_eq!(body["data"]["query"]["limit"], "50");
        // body is returned unchanged
        assert_eq!(body["code"], "0");
    }

    #[tokio::test]
    async fn rate_limited_response_carries_status_and_details() {
        let router = Router::new().route(
            "/limited",
            get(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "code": "50001", "msg": "Too Many Requests" })),
                )
            }),
        );
        let base = mock::serve(router).await;
        let transport = Transport::new(&mock::config(&base)).unwrap();

        let err = transport.request("/limited", &[]).await.unwrap_err();
        assert_eq!(err.status(), Some(429));
        match err {
            ApiError::Http {
                status,
                reason,
                details,
            } => {
                assert_eq!(status, 429);
                assert_eq!(reason, "Too Many Requests");
                assert_eq!(details.unwrap()["code"], "50001");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_still_reports_status() {
        let router = Router::new().route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>") }),
        );
        let base = mock::serve(router).await;
        let transport = Transport::new(&mock::config(&base)).unwrap();

        let err = transport.request("/broken", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Http {
                status: 500,
                details: None,
                ..
            }
        ));
        assert_eq!(err.to_string(), "HTTP error occurred: 500 Internal Server Error");
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_error() {
        let router = Router::new().route("/garbled", get(|| async { "not json {" }));
        let base = mock::serve(router).await;
        let transport = Transport::new(&mock::config(&base)).unwrap();

        let err = transport.request("/garbled", &[]).await.unwrap_err();
        match err {
            ApiError::Decode { path, reason } => {
                assert_eq!(path, "/garbled");
                assert!(reason.starts_with("malformed JSON body"));
            }
            other => panic!("expected Decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        // Nothing listens on the discard port of localhost in the test env.
        let transport = Transport::new(&mock::config("http://127.0.0.1:9")).unwrap();
        let err = transport.request("/anything", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Request { .. }));
    }

    #[test]
    fn invalid_header_name_is_a_config_error() {
        let mut cfg = mock::config("http://localhost");
        cfg.api_key_header = "bad header".to_string();
        assert!(matches!(Transport::new(&cfg), Err(ApiError::Config(_))));
    }

    #[test]
    fn debug_redacts_key_and_trims_base() {
        let transport = Transport::new(&mock::config("http://localhost:1234/")).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:1234");
        let dbg = format!("{transport:?}");
        assert!(!dbg.contains("test-key"));
    }
}
