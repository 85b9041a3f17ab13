//! Pre-configured provider settings.

use std::time::Duration;

use crate::oauth::ClientCredentials;

/// Default TTL for states, verifiers and credentials.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(600);

pub const AIRTABLE_DEFAULT_SCOPE: &str = "data.records:read data.records:write data.recordComments:read data.recordComments:write schema.bases:read schema.bases:write";

pub const HUBSPOT_DEFAULT_SCOPE: &str = "crm.objects.contacts.read oauth";

/// Endpoints of one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUrls {
    pub auth_url: String,
    pub token_url: String,
    /// Base URL of the resource API used for listing.
    pub api_base_url: String,
}

impl ProviderUrls {
    pub fn airtable() -> Self {
        Self {
            auth_url: "https://airtable.com/oauth2/v1/authorize".to_string(),
            token_url: "https://airtable.com/oauth2/v1/token".to_string(),
            api_base_url: "https://api.airtable.com".to_string(),
        }
    }

    pub fn hubspot() -> Self {
        Self {
            auth_url: "https://app.hubspot.com/oauth/authorize".to_string(),
            token_url: "https://api.hubapi.com/oauth/v1/token".to_string(),
            api_base_url: "https://api.hubapi.com".to_string(),
        }
    }

    pub fn notion() -> Self {
        Self {
            auth_url: "https://api.notion.com/v1/oauth/authorize".to_string(),
            token_url: "https://api.notion.com/v1/oauth/token".to_string(),
            api_base_url: "https://api.notion.com".to_string(),
        }
    }

    /// Point every endpoint at one base URL, for local stubs.
    pub fn local(base_url: &str) -> Self {
        Self {
            auth_url: format!("{base_url}/authorize"),
            token_url: format!("{base_url}/token"),
            api_base_url: base_url.to_string(),
        }
    }
}

/// OAuth client registration and lifetimes for one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client: ClientCredentials,
    pub redirect_uri: String,
    /// Sent as the `scope` parameter when present.
    pub scope: Option<String>,
    /// TTL of the state and, for PKCE, the code verifier.
    pub state_ttl: Duration,
    pub credentials_ttl: Duration,
    pub urls: ProviderUrls,
}

impl ProviderConfig {
    /// Configuration with default lifetimes and no scope.
    pub fn new(client: ClientCredentials, redirect_uri: &str, urls: ProviderUrls) -> Self {
        Self {
            client,
            redirect_uri: redirect_uri.to_string(),
            scope: None,
            state_ttl: DEFAULT_EXPIRY,
            credentials_ttl: DEFAULT_EXPIRY,
            urls,
        }
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string()).filter(|s| !s.is_empty());
        self
    }

    pub fn with_state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = ttl;
        self
    }

    pub fn with_credentials_ttl(mut self, ttl: Duration) -> Self {
        self.credentials_ttl = ttl;
        self
    }
}
