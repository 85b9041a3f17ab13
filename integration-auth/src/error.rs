//! Error types for the `integration-auth` crate.
//!
//! A root Error struct holds an error kind tree and an optional source for chaining.
//! Every kind is request-scoped; the request layer maps kinds to HTTP status codes.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for integration-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in integration-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    OAuth(OAuthErrorKind),
    Credential(CredentialErrorKind),
    Registry(RegistryErrorKind),
    Store(StoreErrorKind),
    Items(ItemsErrorKind),
    Http(HttpErrorKind),
}

/// Errors from the authorization and callback flows.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    /// The provider redirected back with an `error` parameter.
    AuthorizationDenied,
    MissingAuthorizationCode,
    MissingState,
    /// The `state` parameter is not base64url-encoded OAuth state JSON.
    InvalidState,
    /// No state is stored for the decoded (provider, org, user) tuple.
    StateExpired,
    /// The decoded state token differs from the one the server issued.
    StateMismatch,
    /// PKCE only: the code verifier is gone from the store.
    VerifierExpired,
    TokenExchangeFailed,
}

/// Errors from the single-read credential handoff.
#[derive(Debug, PartialEq)]
pub enum CredentialErrorKind {
    /// Absent, expired, or already consumed.
    NotFound,
    /// Does not parse into the provider's credential shape.
    Invalid,
}

/// Errors from adapter registration and lookup.
#[derive(Debug, PartialEq)]
pub enum RegistryErrorKind {
    ProviderNotFound,
    InvalidName,
}

/// Errors from the key-value store.
#[derive(Debug, PartialEq)]
pub enum StoreErrorKind {
    Unavailable,
    /// A stored value could not be decoded.
    Corrupt,
}

/// Errors from listing a provider's resources.
#[derive(Debug, PartialEq)]
pub enum ItemsErrorKind {
    FetchFailed,
    /// The provider rejected the access token.
    Unauthorized,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
}

impl Error {
    /// Human-readable detail suitable for returning to the caller.
    pub fn detail(&self) -> String {
        match &self.source {
            Some(source) => source.to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind),
            ErrorKind::Credential(kind) => write!(f, "Credential error: {:?}", kind),
            ErrorKind::Registry(kind) => write!(f, "Registry error: {:?}", kind),
            ErrorKind::Store(kind) => write!(f, "Store error: {:?}", kind),
            ErrorKind::Items(kind) => write!(f, "Items error: {:?}", kind),
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(err: reqwest_middleware::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Http(HttpErrorKind::Network),
        }
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create credential errors.
pub fn credential_error(kind: CredentialErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Credential(kind),
    }
}

/// Helper function to create registry errors.
pub fn registry_error(kind: RegistryErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Registry(kind),
    }
}

/// Helper function to create store errors.
pub fn store_error(kind: StoreErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Store(kind),
    }
}

/// Helper function to create item listing errors.
pub fn items_error(kind: ItemsErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Items(kind),
    }
}
