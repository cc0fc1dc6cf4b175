//! Authenticated HTTP client for the BugBacon REST API.
//!
//! Every MCP request translates into at most one call through [`ApiClient`].
//! The client owns the two pieces of process-wide configuration (base URL and
//! API key), enforces a hard per-request timeout and classifies each failure
//! into exactly one [`ApiError`] variant. It never retries and never caches.

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::error::Error as _;
use std::time::Duration;

use crate::config::Config;
use crate::utils::ValidationError;

/// Hard wall-clock bound on a single outbound call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One typed failure per outbound call (or local validation failure).
///
/// The `Display` text of each variant doubles as the human-readable label the
/// tool dispatcher puts in front of error content, so messages stay free of
/// configuration values.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Caller-supplied input failed a local contract
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Connection-level failure before any response was obtained
    #[error("Network error: {0}")]
    Network(String),

    /// The call exceeded the fixed timeout and was aborted
    #[error("Request timed out")]
    Timeout,

    /// A response arrived with a non-success status code
    #[error("API error (HTTP {status} {reason})")]
    Http { status: u16, reason: String },

    /// Protocol-level contract violations and everything else
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Other(format!("Failed to parse API response: {}", err))
        } else {
            // reqwest's Display includes the full URL; keep only the
            // connection-level cause so the base URL never leaks.
            let cause = err
                .source()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "connection failed".to_string());
            ApiError::Network(cause)
        }
    }
}

/// HTTP client bound to one BugBacon API endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    /// Create a client with the fixed default timeout.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    /// Create a client with an explicit timeout. Production code uses
    /// [`ApiClient::new`]; tests shrink the bound to keep runs fast.
    pub fn with_timeout(config: &Config, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    /// `GET <base><endpoint>`
    pub async fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, endpoint, None).await
    }

    /// `POST <base><endpoint>` with a JSON body
    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    /// `PATCH <base><endpoint>` with a JSON body
    pub async fn patch(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::PATCH, endpoint, Some(body)).await
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        tracing::debug!(%method, endpoint, "calling BugBacon API");

        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self
            .client
            .request(method, &url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                reason: reason_text(status),
            });
        }

        response.json::<Value>().await.map_err(ApiError::from_reqwest)
    }
}

fn reason_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Unknown Status")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_for(base: &str, key: Option<&str>) -> Config {
        Config {
            api_base_url: base.to_string(),
            api_key: key.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_get_attaches_bearer_and_parses_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/issues")
            .match_header("authorization", "Bearer test-key")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_body(r#"[{"id": "1"}]"#)
            .create_async()
            .await;

        let client = ApiClient::new(&config_for(&server.url(), Some("test-key"))).unwrap();
        let value = client.get("/issues").await.unwrap();

        mock.assert_async().await;
        assert_eq!(value, json!([{"id": "1"}]));
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rewards")
            .match_header("authorization", mockito::Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = ApiClient::new(&config_for(&server.url(), None)).unwrap();
        client.get("/rewards").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/issues")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(json!({"title": "t"})))
            .with_status(201)
            .with_body(r#"{"id": "9"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&config_for(&server.url(), None)).unwrap();
        let value = client.post("/issues", &json!({"title": "t"})).await.unwrap();

        mock.assert_async().await;
        assert_eq!(value["id"], "9");
    }

    #[tokio::test]
    async fn test_http_error_carries_status_and_reason() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/issues/404")
            .with_status(404)
            .create_async()
            .await;

        let client = ApiClient::new(&config_for(&server.url(), None)).unwrap();
        let err = client.get("/issues/404").await.unwrap_err();

        match err {
            ApiError::Http { status, ref reason } => {
                assert_eq!(status, 404);
                assert_eq!(reason, "Not Found");
            }
            other => panic!("expected Http error, got {:?}", other),
        }
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind to grab a free port, then drop the listener so the connection
        // is refused.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(&config_for(&format!("http://{}", addr), None)).unwrap();
        let err = client.get("/issues").await.unwrap_err();

        assert!(matches!(err, ApiError::Network(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_unresponsive_server_is_timeout_not_network() {
        // Accept the connection but never respond, so only the wall-clock
        // bound can end the call.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let _socket = listener.accept().await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
        });

        let config = config_for(&format!("http://{}", addr), None);
        let client = ApiClient::with_timeout(&config, Duration::from_millis(200)).unwrap();
        let err = client.get("/issues").await.unwrap_err();

        assert!(matches!(err, ApiError::Timeout), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_network_error_text_omits_base_url() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(&config_for(&format!("http://{}", addr), None)).unwrap();
        let err = client.get("/issues").await.unwrap_err();

        assert!(!err.to_string().contains(&addr.to_string()));
    }
}
