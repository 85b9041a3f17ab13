//! Concrete provider adapters.
//!
//! Each adapter binds a strategy, its provider's authorization URL and token
//! exchange, and the mapping of the provider's resources into
//! [`IntegrationItem`](crate::item::IntegrationItem)s.

pub mod airtable;
pub mod config;
pub mod hubspot;
pub mod notion;

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;
use tracing::error;

pub use config::{ProviderConfig, ProviderUrls};

use super::{Provider, ProviderKind};
use crate::error::{credential_error, items_error, CredentialErrorKind, Error, ItemsErrorKind};
use crate::http::AuthenticatedClientBuilder;
use crate::store::KeyValueStore;

/// Build the adapter for `kind`.
pub fn build(
    kind: ProviderKind,
    config: ProviderConfig,
    store: Arc<dyn KeyValueStore>,
    http: &AuthenticatedClientBuilder,
) -> Result<Arc<dyn Provider>, Error> {
    let adapter: Arc<dyn Provider> = match kind {
        ProviderKind::Airtable => Arc::new(airtable::Provider::new(config, store, http)?),
        ProviderKind::Hubspot => Arc::new(hubspot::Provider::new(config, store, http)?),
        ProviderKind::Notion => Arc::new(notion::Provider::new(config, store, http)?),
    };
    Ok(adapter)
}

/// Base authorization URL: the endpoint followed by the given query pairs, escaped.
pub(crate) fn authorization_url(endpoint: &str, params: &[(&str, &str)]) -> String {
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{endpoint}?{query}")
}

/// Credentials as the JSON handed back to the caller.
pub(crate) fn credentials_json<T: Serialize>(credentials: &T) -> Result<serde_json::Value, Error> {
    serde_json::to_value(credentials).map_err(|e| {
        credential_error(
            CredentialErrorKind::Invalid,
            &format!("Failed to serialize credentials: {e}"),
        )
    })
}

/// Log the cause and fail the listing with a generic message.
pub(crate) fn fetch_failed(label: &str, cause: impl Display) -> Error {
    error!("Error getting {} items: {}", label, cause);
    items_error(
        ItemsErrorKind::FetchFailed,
        &format!("Failed to retrieve {label} items"),
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::query_param;
    use super::*;

    #[test]
    fn test_authorization_url_escapes_values() {
        let url = authorization_url(
            "https://example.com/authorize",
            &[
                ("client_id", "abc"),
                ("redirect_uri", "http://localhost:8000/cb"),
                ("scope", "a b"),
            ],
        );
        assert_eq!(
            url,
            "https://example.com/authorize?client_id=abc&redirect_uri=http%3A%2F%2Flocalhost%3A8000%2Fcb&scope=a%20b"
        );
        assert_eq!(
            query_param(&url, "redirect_uri").as_deref(),
            Some("http://localhost:8000/cb")
        );
    }

    #[test]
    fn test_fetch_failed_detail() {
        let err = fetch_failed("Notion", "boom");
        assert_eq!(err.detail(), "Failed to retrieve Notion items");
    }
}
