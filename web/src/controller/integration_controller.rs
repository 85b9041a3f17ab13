//! Controller for third-party integrations.
//!
//! Every handler resolves the adapter registered for the `provider` path segment
//! and delegates to it; nothing here is provider specific.

use crate::params::integration::{CallbackQuery, LoadParams, UserOrgParams};
use crate::{AppState, Error};

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use axum::{Form, Json};
use log::*;

/// POST start an authorization
///
/// Returns the provider authorization URL to open in a popup.
#[utoipa::path(
    post,
    path = "/integrations/{provider}/authorize",
    params(
        ("provider" = String, Path, description = "Provider name, e.g. airtable, hubspot or notion"),
    ),
    request_body(content = UserOrgParams, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Provider authorization URL", body = String),
        (status = 404, description = "Unknown provider"),
        (status = 500, description = "Store unavailable"),
    )
)]
pub async fn authorize(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    Form(params): Form<UserOrgParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("Authorize {provider} for org {} user {}", params.org_id, params.user_id);
    let adapter = app_state.registry().get(&provider)?;
    let url = adapter.authorize(&params.user_id, &params.org_id).await?;
    Ok(Json(url))
}

/// GET provider redirect target
///
/// Validates the state, exchanges the code and answers with a page that closes the popup.
#[utoipa::path(
    get,
    path = "/integrations/{provider}/oauth2callback",
    params(
        ("provider" = String, Path, description = "Provider name"),
        CallbackQuery,
    ),
    responses(
        (status = 200, description = "Page closing the authorization window", body = String, content_type = "text/html"),
        (status = 400, description = "Denied, missing, malformed, expired or mismatched state"),
        (status = 404, description = "Unknown provider"),
        (status = 502, description = "Token exchange with the provider failed"),
    )
)]
pub async fn oauth_callback(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, Error> {
    let adapter = app_state.registry().get(&provider)?;
    let close_window = adapter.oauth_callback(&query.into()).await?;
    Ok(Html(close_window.html()))
}

/// POST hand over credentials
///
/// Returns the stored credentials once; they are deleted on read.
#[utoipa::path(
    post,
    path = "/integrations/{provider}/credentials",
    params(
        ("provider" = String, Path, description = "Provider name"),
    ),
    request_body(content = UserOrgParams, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Provider credentials JSON"),
        (status = 400, description = "No credentials found"),
        (status = 404, description = "Unknown provider"),
    )
)]
pub async fn credentials(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    Form(params): Form<UserOrgParams>,
) -> Result<impl IntoResponse, Error> {
    let adapter = app_state.registry().get(&provider)?;
    let credentials = adapter
        .get_credentials(&params.user_id, &params.org_id)
        .await?;
    Ok(Json(credentials))
}

/// POST list provider resources
///
/// Lists the provider's resources as normalized integration items.
#[utoipa::path(
    post,
    path = "/integrations/{provider}/load",
    params(
        ("provider" = String, Path, description = "Provider name"),
    ),
    request_body(content = LoadParams, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Normalized integration items"),
        (status = 400, description = "Credentials do not parse"),
        (status = 401, description = "Provider rejected the access token"),
        (status = 404, description = "Unknown provider"),
        (status = 502, description = "Listing at the provider failed"),
    )
)]
pub async fn load(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    Form(params): Form<LoadParams>,
) -> Result<impl IntoResponse, Error> {
    let adapter = app_state.registry().get(&provider)?;
    let items = adapter.list_items(&params.credentials).await?;
    info!("Loaded {} {provider} items", items.len());
    Ok(Json(items))
}
