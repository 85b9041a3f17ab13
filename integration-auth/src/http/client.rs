//! Outbound HTTP clients shared by provider adapters.
//!
//! Two clients come out of one configuration: a plain client for the
//! authorization-code exchange, which is never retried because codes are single
//! use, and a client with retry middleware for resource listing.

use std::time::Duration;

use reqwest_middleware::ClientBuilder;
use reqwest_retry::RetryTransientMiddleware;

use super::RetryAfterPolicy;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum number of retries for listing calls.
    pub max_retries: u32,
    /// First retry delay; doubles on each further attempt.
    pub base_delay: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            user_agent: format!("integration-broker/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client with retry middleware.
pub type AuthenticatedClient = reqwest_middleware::ClientWithMiddleware;

/// Builder for the outbound HTTP clients.
#[derive(Debug, Clone, Default)]
pub struct AuthenticatedClientBuilder {
    config: HttpClientConfig,
}

impl AuthenticatedClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: HttpClientConfig) -> Self {
        Self { config }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.config.base_delay = base_delay;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Build a client without retry middleware, used for token exchange.
    pub fn build_plain(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent.clone())
            .build()
    }

    /// Build the listing client with transient-failure retries.
    pub fn build(&self) -> Result<AuthenticatedClient, reqwest::Error> {
        let client = self.build_plain()?;

        let retry_policy = RetryAfterPolicy::new(self.config.max_retries)
            .with_base_delay(self.config.base_delay);
        let client_with_middleware = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(client_with_middleware)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let builder = AuthenticatedClientBuilder::new();
        assert_eq!(builder.config().timeout, Duration::from_secs(10));
        assert_eq!(builder.config().max_retries, 2);
        assert!(builder.config().user_agent.starts_with("integration-broker/"));
    }

    #[test]
    fn test_builder_overrides() {
        let builder = AuthenticatedClientBuilder::new()
            .with_timeout(Duration::from_secs(60))
            .with_max_retries(5)
            .with_base_delay(Duration::from_millis(10));
        assert_eq!(builder.config().timeout, Duration::from_secs(60));
        assert_eq!(builder.config().max_retries, 5);
        assert_eq!(builder.config().base_delay, Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_build_clients() {
        let builder = AuthenticatedClientBuilder::new();
        assert!(builder.build_plain().is_ok());
        assert!(builder.build().is_ok());
    }

    #[tokio::test]
    async fn test_listing_client_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = AuthenticatedClientBuilder::new()
            .with_max_retries(2)
            .with_base_delay(Duration::from_millis(1))
            .build()
            .unwrap();
        let response = client
            .get(format!("{}/flaky", server.url()))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 503);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_plain_client_does_not_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let client = AuthenticatedClientBuilder::new().build_plain().unwrap();
        let response = client
            .post(format!("{}/token", server.url()))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 503);
        mock.assert_async().await;
    }
}
