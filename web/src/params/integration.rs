//! Parameters for integration endpoints.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Form fields identifying whose authorization or credentials are meant.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserOrgParams {
    pub user_id: String,
    pub org_id: String,
}

/// Form field carrying the credentials previously returned for the provider.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoadParams {
    /// The exact JSON string returned by the credentials endpoint
    pub credentials: String,
}

/// Query parameters of the provider redirect.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    /// Authorization code issued by the provider
    pub code: Option<String>,
    /// State issued by the authorize endpoint
    pub state: Option<String>,
    /// Set by the provider when the user denied access
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl From<CallbackQuery> for integration_auth::oauth::CallbackParams {
    fn from(query: CallbackQuery) -> Self {
        Self {
            code: query.code,
            state: query.state,
            error: query.error,
            error_description: query.error_description,
        }
    }
}
