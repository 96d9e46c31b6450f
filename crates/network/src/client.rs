//! HTTP transport backed by reqwest

use crate::endpoint::{Endpoint, ServerAddress};
use crate::error::{NetworkError, NetworkResult};
use crate::transport::Transport;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client as ReqwestClient;
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout; `None` waits until the request is cancelled
    pub timeout: Option<Duration>,
    /// User agent string
    pub user_agent: String,
    /// Maximum redirects to follow
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: format!("RaceIntoSpace/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// HTTP client speaking the race protocol (GET + JSON)
#[derive(Clone)]
pub struct Client {
    inner: ReqwestClient,
    config: ClientConfig,
}

impl Client {
    /// Creates a new client with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let mut builder = ReqwestClient::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder.build().map_err(NetworkError::Http)?;

        Ok(Self { inner, config })
    }

    /// Returns the configuration the client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs a GET request and returns the body text
    pub async fn get_text(&self, address: &ServerAddress, endpoint: &Endpoint) -> NetworkResult<String> {
        let url = endpoint.url(address)?;
        log::debug!("GET {}", url);

        let response = self.inner.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

impl Transport for Client {
    fn fetch<'a>(
        &'a self,
        address: &'a ServerAddress,
        endpoint: &'a Endpoint,
    ) -> BoxFuture<'a, NetworkResult<String>> {
        self.get_text(address, endpoint).boxed()
    }
}
