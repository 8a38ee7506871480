//! HTTP client for the companion's local `GetUserStatus` endpoint.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::parser::parse_user_status;
use super::types::QuotaSnapshot;
use crate::discovery::EndpointCredential;
use crate::error::FetchError;

/// RPC path of the quota query
pub const GET_USER_STATUS_PATH: &str =
    "/exa.language_server_pb.LanguageServerService/GetUserStatus";

/// Header carrying the companion's CSRF token
pub const CSRF_HEADER: &str = "X-Codeium-Csrf-Token";

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One request/response exchange producing a quota snapshot.
///
/// Implementations must not retry; the controller owns the retry policy.
pub trait QuotaSource: Send + Sync {
    /// Fetch a fresh snapshot from the given endpoint
    fn fetch(
        &self,
        endpoint: &EndpointCredential,
    ) -> impl Future<Output = Result<QuotaSnapshot, FetchError>> + Send;
}

/// URL scheme used to reach the companion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    /// TLS with the companion's self-signed certificate (the real server)
    #[default]
    Https,
    /// Plain HTTP (local test servers)
    Http,
}

impl Scheme {
    /// Scheme prefix used in URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

/// Build the JSON metadata body the companion expects on every RPC
pub(crate) fn request_metadata() -> serde_json::Value {
    serde_json::json!({
        "metadata": {
            "ideName": "antigravity",
            "extensionName": "antigravity",
            "locale": "en"
        }
    })
}

/// Build a reqwest client that accepts the companion's self-signed certificate.
///
/// Only ever used against `127.0.0.1`.
pub(crate) fn localhost_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .timeout(timeout)
        .no_proxy()
        .build()
        .unwrap_or_else(|e| {
            warn!(
                "Failed to build localhost HTTP client ({}); self-signed certificates will be rejected",
                e
            );
            reqwest::Client::default()
        })
}

/// Quota client speaking JSON over the companion's Connect RPC endpoint
#[derive(Debug, Clone)]
pub struct HttpQuotaClient {
    http: reqwest::Client,
    scheme: Scheme,
}

impl HttpQuotaClient {
    /// Create a client with the default request timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            http: localhost_client(timeout),
            scheme: Scheme::Https,
        }
    }

    /// Override the URL scheme
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    fn url(&self, endpoint: &EndpointCredential) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme.as_str(),
            endpoint.host(),
            endpoint.port(),
            GET_USER_STATUS_PATH
        )
    }
}

impl Default for HttpQuotaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QuotaSource for HttpQuotaClient {
    async fn fetch(&self, endpoint: &EndpointCredential) -> Result<QuotaSnapshot, FetchError> {
        let url = self.url(endpoint);
        debug!("Quota fetch: POST {}", url);

        let response = self
            .http
            .post(&url)
            .header("Connect-Protocol-Version", "1")
            .header(CSRF_HEADER, endpoint.csrf_token())
            .json(&request_metadata())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let snapshot = parse_user_status(&body, chrono::Utc::now())?;
        debug!("Quota fetch: parsed {} pools", snapshot.pools.len());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};

    async fn serve(router: Router) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        port
    }

    async fn user_status(headers: HeaderMap) -> Result<Json<serde_json::Value>, StatusCode> {
        if headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok()) != Some("secret") {
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(Json(serde_json::json!({
            "userStatus": { "cascadeModelConfigData": { "clientModelConfigs": [
                { "label": "Gemini 3 Pro (High)",
                  "quotaInfo": { "remainingFraction": 0.5 } }
            ] } }
        })))
    }

    fn client() -> HttpQuotaClient {
        HttpQuotaClient::with_timeout(Duration::from_secs(2)).with_scheme(Scheme::Http)
    }

    #[tokio::test]
    async fn test_fetch_parses_snapshot() {
        let port = serve(Router::new().route(GET_USER_STATUS_PATH, post(user_status))).await;
        let endpoint = EndpointCredential::new("127.0.0.1", port, "secret").unwrap();

        let snapshot = client().fetch(&endpoint).await.unwrap();
        assert_eq!(snapshot.pools.len(), 1);
        assert_eq!(snapshot.pools[0].id, "gemini3");
        assert_eq!(snapshot.pools[0].remaining_pct, 50.0);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let port = serve(Router::new().route(GET_USER_STATUS_PATH, post(user_status))).await;
        let endpoint = EndpointCredential::new("127.0.0.1", port, "wrong").unwrap();

        let err = client().fetch(&endpoint).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(403)));
    }

    #[tokio::test]
    async fn test_fetch_undecodable_body() {
        let port = serve(Router::new().route(
            GET_USER_STATUS_PATH,
            post(|| async { "definitely not json" }),
        ))
        .await;
        let endpoint = EndpointCredential::new("127.0.0.1", port, "secret").unwrap();

        let err = client().fetch(&endpoint).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = EndpointCredential::new("127.0.0.1", port, "secret").unwrap();

        let err = client().fetch(&endpoint).await.unwrap_err();
        assert!(matches!(err, FetchError::Request(_) | FetchError::Timeout));
    }
}
