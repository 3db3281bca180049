//! In-process stand-in for the provider, used by tests.

use axum::Router;

use crate::runtime_config::{ApiKey, AppConfig};

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock provider");
    let addr = listener.local_addr().expect("mock provider address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("mock provider failed");
    });
    format!("http://{addr}")
}

/// Config pointing at `base_url` with a fixed test key.
pub fn config(base_url: &str) -> AppConfig {
    AppConfig {
        api_key: ApiKey::new("test-key"),
        base_url: base_url.to_string(),
        ..AppConfig::default()
    }
}
