//! HTTP Client
//!
//! Thin async wrapper over reqwest: one POST per call, timeouts from config,
//! non-2xx statuses surfaced with their body.

use crate::config::RouterConfig;
use crate::error::{RelayError, Result};
use crate::provider::{OutboundRequest, ProviderId};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// HTTP client shared by all adapters
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Inner reqwest client
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Create a client with the router's configured timeouts
    pub fn from_config(config: &RouterConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    /// POST a JSON body and return the response text on 2xx
    pub async fn send(&self, provider: ProviderId, request: &OutboundRequest) -> Result<String> {
        let mut builder = self
            .client
            .post(&request.url)
            .headers(request.headers.clone())
            .json(&request.body);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!(provider = %provider, status = status.as_u16(), "Provider responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::ProviderHttp {
                provider,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::from_config(&RouterConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_non_success_carries_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let client = HttpClient::from_config(&RouterConfig::default()).unwrap();
        let request = OutboundRequest {
            url: format!("{}/chat", server.url()),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: serde_json::json!({"hello": "world"}),
        };

        let err = client.send(ProviderId::OpenAi, &request).await.unwrap_err();
        match err {
            RelayError::ProviderHttp {
                provider,
                status,
                body,
            } => {
                assert_eq!(provider, ProviderId::OpenAi);
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sends_json_and_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/gen")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "abc".into()))
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(serde_json::json!({"a": 1})))
            .with_status(200)
            .with_body("{\"ok\":true}")
            .create_async()
            .await;

        let client = HttpClient::from_config(&RouterConfig::default()).unwrap();
        let request = OutboundRequest {
            url: format!("{}/gen", server.url()),
            query: vec![("key", "abc".to_string())],
            headers: HeaderMap::new(),
            body: serde_json::json!({"a": 1}),
        };

        let body = client.send(ProviderId::Gemini, &request).await.unwrap();
        assert_eq!(body, "{\"ok\":true}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_error() {
        let client = HttpClient::new(Duration::from_secs(2), Duration::from_secs(1)).unwrap();
        let request = OutboundRequest {
            url: "http://127.0.0.1:9/unreachable".to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: serde_json::json!({}),
        };

        let err = client.send(ProviderId::Claude, &request).await.unwrap_err();
        assert!(matches!(err, RelayError::Request(_) | RelayError::Timeout(_)));
    }
}
