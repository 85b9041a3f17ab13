use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use integration_auth::error::{
    Error as IntegrationError, ErrorKind, ItemsErrorKind, OAuthErrorKind, RegistryErrorKind,
};

extern crate log;
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(IntegrationError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match &self.0.error_kind {
            ErrorKind::OAuth(OAuthErrorKind::TokenExchangeFailed) => StatusCode::BAD_GATEWAY,
            ErrorKind::OAuth(_) => StatusCode::BAD_REQUEST,
            ErrorKind::Credential(_) => StatusCode::BAD_REQUEST,
            ErrorKind::Registry(RegistryErrorKind::ProviderNotFound) => StatusCode::NOT_FOUND,
            ErrorKind::Registry(RegistryErrorKind::InvalidName) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ErrorKind::Items(ItemsErrorKind::Unauthorized) => StatusCode::UNAUTHORIZED,
            ErrorKind::Items(ItemsErrorKind::FetchFailed) => StatusCode::BAD_GATEWAY,
            ErrorKind::Store(_) | ErrorKind::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self.0.detail());
            "Internal Server Error".to_string()
        } else {
            debug!("Request rejected with {status}: {}", self.0.detail());
            self.0.detail()
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<IntegrationError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use integration_auth::error::{
        credential_error, oauth_error, registry_error, store_error, CredentialErrorKind,
        StoreErrorKind,
    };

    async fn render(err: IntegrationError) -> (StatusCode, serde_json::Value) {
        let response = Error::from(err).into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_validation_errors_are_bad_request() {
        let (status, body) = render(oauth_error(
            OAuthErrorKind::StateMismatch,
            "State mismatch",
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "State mismatch"}));
    }

    #[tokio::test]
    async fn test_missing_credentials_are_bad_request() {
        let (status, body) = render(credential_error(
            CredentialErrorKind::NotFound,
            "No credentials found.",
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "No credentials found.");
    }

    #[tokio::test]
    async fn test_unknown_provider_is_not_found() {
        let (status, body) = render(registry_error(
            RegistryErrorKind::ProviderNotFound,
            "Provider 'dropbox' not found",
        ))
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Provider 'dropbox' not found");
    }

    #[tokio::test]
    async fn test_token_exchange_failure_is_bad_gateway() {
        let (status, _) = render(oauth_error(
            OAuthErrorKind::TokenExchangeFailed,
            "Failed to exchange code for token.",
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_store_failure_hides_detail() {
        let (status, body) = render(store_error(
            StoreErrorKind::Unavailable,
            "connection refused",
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal Server Error");
    }
}
