//! HTTP client abstraction for the translation API.
//!
//! The translator talks to the network only through [`HttpClient`], so tests
//! can inject canned responses and transport failures.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP layer: no status line was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request exceeded the {0:?} timeout")]
    Timeout(Duration),

    #[error("{0}")]
    Connection(String),
}

/// Trait for HTTP communication with the translation API.
///
/// # Example
///
/// ```ignore
/// use clixaw::http_client::{HttpClient, ReqwestHttpClient};
///
/// let client = ReqwestHttpClient::new(Duration::from_secs(10))?;
/// let response = client
///     .get(&url, &[("q", "list files")], &[("X-Provider", "openai")])
///     .await?;
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the status and body text.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to send the request to
    /// * `query` - Query-string pairs, percent-encoded by the client
    /// * `headers` - Key-value pairs of headers to include
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only when no HTTP response was received.
    /// Non-2xx statuses are returned as an ordinary [`HttpResponse`].
    async fn get(
        &self,
        url: &Url,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError>;
}

/// HTTP client implementation using reqwest.
///
/// The timeout covers the whole request, from connect to the last body byte.
pub struct ReqwestHttpClient {
    client: Client,
    timeout: Duration,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("clixaw/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    fn map_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Connection(error.to_string())
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(
        &self,
        url: &Url,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.get(url.clone()).query(query);

        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        let response = request.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        debug!("GET {} -> {}", url, status);

        let body = response.text().await.map_err(|e| self.map_error(e))?;
        Ok(HttpResponse { status, body })
    }
}
