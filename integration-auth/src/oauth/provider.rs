//! OAuth provider adapter trait and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CallbackParams;
use crate::error::Error;
use crate::item::IntegrationItem;

/// Known integration providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Airtable,
    Hubspot,
    Notion,
}

impl ProviderKind {
    /// Get the provider identifier string, used for routing and store keys.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Airtable => "airtable",
            ProviderKind::Hubspot => "hubspot",
            ProviderKind::Notion => "notion",
        }
    }

    pub fn all() -> [ProviderKind; 3] {
        [
            ProviderKind::Airtable,
            ProviderKind::Hubspot,
            ProviderKind::Notion,
        ]
    }
}

/// Terminal response of a successful OAuth callback: a page that closes the
/// authorization popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseWindow;

impl CloseWindow {
    pub const HTML: &'static str = "<html>\n    <script>\n        window.close();\n    </script>\n</html>\n";

    pub fn html(&self) -> &'static str {
        Self::HTML
    }
}

/// Trait for integration provider adapters.
///
/// Every adapter exposes the same four operations to the request layer, which
/// resolves adapters by name and never branches on the concrete provider:
/// - Authorization URL generation (state, and PKCE challenge where used)
/// - Callback validation, token exchange and credential persistence
/// - One-shot credential handoff
/// - Listing the provider's resources as normalized items
#[async_trait]
pub trait Provider: Send + Sync {
    /// Lower-case provider name this adapter serves.
    fn name(&self) -> &str;

    /// Start an authorization for the tuple.
    ///
    /// # Returns
    ///
    /// The full provider authorization URL to open in the user's browser.
    async fn authorize(&self, user_id: &str, org_id: &str) -> Result<String, Error>;

    /// Handle the provider redirect.
    ///
    /// Validates and consumes the state, exchanges the code for credentials and
    /// stores them with a TTL. Nothing is stored when the exchange fails.
    async fn oauth_callback(&self, params: &CallbackParams) -> Result<CloseWindow, Error>;

    /// Fetch and delete the stored credentials for the tuple.
    ///
    /// A second call for the same tuple fails with `CredentialErrorKind::NotFound`.
    async fn get_credentials(&self, user_id: &str, org_id: &str)
        -> Result<serde_json::Value, Error>;

    /// List the provider's resources.
    ///
    /// # Arguments
    ///
    /// * `credentials` - The exact JSON string returned by `get_credentials`
    async fn list_items(&self, credentials: &str) -> Result<Vec<IntegrationItem>, Error>;
}
