//! CSRF state issuance and validation for OAuth flows.
//!
//! The state record is round-tripped to the client as base64url-encoded JSON inside
//! the authorization redirect and stored server-side under
//! `{provider}_state:{org_id}:{user_id}`. A callback is accepted only when the
//! decoded token equals the stored one, after which the stored state is deleted.

use std::sync::Arc;
use std::time::Duration;

use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::random_token;
use crate::error::{oauth_error, store_error, Error, ErrorKind, OAuthErrorKind, StoreErrorKind};
use crate::store::{KeyKind, KeyValueStore, StoreKey};

/// Accepts state with or without `=` padding on the way back in.
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// State data issued at authorize-time and echoed back by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    /// Random anti-CSRF token.
    pub state: String,
    pub user_id: String,
    pub org_id: String,
}

impl OAuthState {
    /// Create a state record with a fresh random token.
    pub fn generate(user_id: &str, org_id: &str) -> Self {
        Self {
            state: random_token(),
            user_id: user_id.to_string(),
            org_id: org_id.to_string(),
        }
    }

    /// Serialize as JSON, the form kept in the store.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Store(StoreErrorKind::Corrupt),
        })
    }

    /// Encode as base64url JSON for the `state` query parameter.
    pub fn encode(&self) -> Result<String, Error> {
        Ok(URL_SAFE_NO_PAD.encode(self.to_json()?))
    }

    /// Decode a client-supplied `state` parameter.
    pub fn decode(encoded: &str) -> Result<Self, Error> {
        let bytes = LENIENT_URL_SAFE.decode(encoded.trim()).map_err(|e| {
            oauth_error(
                OAuthErrorKind::InvalidState,
                &format!("Invalid state parameter: {}", e),
            )
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            oauth_error(
                OAuthErrorKind::InvalidState,
                &format!("Invalid state parameter: {}", e),
            )
        })
    }
}

/// A freshly issued state and its URL-embeddable encoding.
#[derive(Debug, Clone)]
pub struct IssuedState {
    pub state: OAuthState,
    pub encoded: String,
}

/// Manager for OAuth state parameters backed by the key-value store.
///
/// Issuing a state for a (provider, org, user) tuple overwrites any earlier state
/// for the same tuple, which invalidates an authorization still in flight.
#[derive(Clone)]
pub struct StateManager {
    provider: String,
    store: Arc<dyn KeyValueStore>,
}

impl StateManager {
    pub fn new(provider: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            provider: provider.to_string(),
            store,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Generate and persist a new state for the tuple.
    ///
    /// # Arguments
    ///
    /// * `user_id` - User starting the authorization
    /// * `org_id` - Organization of the user
    /// * `ttl` - How long the callback may take to arrive
    pub async fn issue(
        &self,
        user_id: &str,
        org_id: &str,
        ttl: Duration,
    ) -> Result<IssuedState, Error> {
        let state = OAuthState::generate(user_id, org_id);
        let encoded = state.encode()?;
        let key = StoreKey::new(&self.provider, KeyKind::State, org_id, user_id).to_string();

        self.store.set(&key, &state.to_json()?, Some(ttl)).await?;
        debug!(
            "Issued {} OAuth state for org {} user {}",
            self.provider, org_id, user_id
        );

        Ok(IssuedState { state, encoded })
    }

    /// Validate a client-supplied state and consume the stored one.
    ///
    /// The tuple is taken from the decoded state itself. The stored state is deleted
    /// only after the tokens match, so a forged or stale state cannot evict the
    /// legitimate one.
    pub async fn consume(&self, encoded: &str) -> Result<OAuthState, Error> {
        let received = OAuthState::decode(encoded)?;
        let key = StoreKey::new(
            &self.provider,
            KeyKind::State,
            &received.org_id,
            &received.user_id,
        )
        .to_string();

        let saved_json = self.store.get(&key).await?.ok_or_else(|| {
            oauth_error(OAuthErrorKind::StateExpired, "State not found or expired")
        })?;
        let saved: OAuthState = serde_json::from_str(&saved_json).map_err(|e| {
            warn!("Stored {} OAuth state is unreadable: {}", self.provider, e);
            store_error(StoreErrorKind::Corrupt, "Stored state is unreadable")
        })?;

        if saved.state != received.state {
            warn!(
                "{} OAuth state mismatch for org {} user {}",
                self.provider, received.org_id, received.user_id
            );
            return Err(oauth_error(OAuthErrorKind::StateMismatch, "State mismatch"));
        }

        self.store.delete(&key).await?;
        Ok(received)
    }
}
