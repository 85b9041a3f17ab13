//! Authorization code to token exchange.
//!
//! Providers differ only in how the client authenticates and how the body is
//! encoded; the request/response handling is shared.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::error::{Error, ErrorKind, OAuthErrorKind};

/// OAuth client id and secret of this application at a provider.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl ClientCredentials {
    pub fn new(client_id: String, client_secret: SecretString) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }
}

/// How the client authenticates at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAuth {
    /// HTTP Basic authentication with `client_id:client_secret`.
    Basic,
    /// `client_secret` sent as a body parameter.
    RequestBody,
}

/// Body encoding of the token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenEncoding {
    Form,
    Json,
}

fn exchange_error(source: Box<dyn std::error::Error + Send + Sync>) -> Error {
    Error {
        source: Some(source),
        error_kind: ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed),
    }
}

/// A token request against one provider's token endpoint.
pub struct TokenRequest<'a> {
    pub provider: &'a str,
    pub token_url: &'a str,
    pub client: &'a ClientCredentials,
    pub auth: ClientAuth,
    pub encoding: TokenEncoding,
    pub params: Vec<(&'static str, String)>,
}

impl TokenRequest<'_> {
    /// Send the request and parse a successful response into `T`.
    ///
    /// Transport failures (including timeouts), non-2xx responses and unparseable
    /// bodies all fail with `OAuthErrorKind::TokenExchangeFailed`. The request is
    /// never retried: an authorization code is single-use at the provider.
    pub async fn send<T: DeserializeOwned>(self, http: &reqwest::Client) -> Result<T, Error> {
        let mut params = self.params;
        if self.auth == ClientAuth::RequestBody {
            params.push((
                "client_secret",
                self.client.client_secret.expose_secret().clone(),
            ));
        }

        let mut request = http.post(self.token_url);
        request = match self.encoding {
            TokenEncoding::Form => request.form(&params),
            TokenEncoding::Json => {
                let body: serde_json::Map<String, serde_json::Value> = params
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), serde_json::Value::String(value)))
                    .collect();
                request.json(&body)
            }
        };
        if self.auth == ClientAuth::Basic {
            request = request.basic_auth(
                &self.client.client_id,
                Some(self.client.client_secret.expose_secret()),
            );
        }

        let response = request.send().await.map_err(|e| {
            warn!("Failed to reach {} token endpoint: {:?}", self.provider, e);
            exchange_error(Box::new(e))
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                "Failed to exchange {} code for token: status={}",
                self.provider, status
            );
            return Err(exchange_error(
                "Failed to exchange code for token.".to_string().into(),
            ));
        }

        let tokens = response.json::<T>().await.map_err(|e| {
            warn!("Failed to parse {} token response: {:?}", self.provider, e);
            exchange_error(Box::new(e))
        })?;
        info!("Successfully exchanged {} OAuth code for tokens", self.provider);
        Ok(tokens)
    }
}
