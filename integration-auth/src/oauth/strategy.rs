//! Authorization strategies: standard OAuth 2.0 and PKCE.
//!
//! Both strategies share the state issuance and anti-CSRF validation in
//! [`StateManager`]; PKCE layers verifier bookkeeping on top by delegating to the
//! standard strategy rather than duplicating it.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use super::pkce::{PkceChallenge, PkceVerifier};
use super::state::{OAuthState, StateManager};
use crate::error::{oauth_error, Error, OAuthErrorKind};
use crate::store::{KeyKind, KeyValueStore, StoreKey};

/// Query parameters delivered to the OAuth callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Result of starting an authorization.
#[derive(Debug, Clone)]
pub struct Authorization {
    pub state: OAuthState,
    /// Base64url JSON of `state`, embedded in the redirect URL.
    pub encoded_state: String,
    /// Present for PKCE only.
    pub code_challenge: Option<PkceChallenge>,
}

/// A callback whose state has been validated and consumed.
#[derive(Debug, Clone)]
pub struct VerifiedCallback {
    pub code: String,
    pub user_id: String,
    pub org_id: String,
    /// Present for PKCE only.
    pub code_verifier: Option<PkceVerifier>,
}

/// Treats empty query values the same as missing ones.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Standard OAuth 2.0 authorization code flow.
#[derive(Clone)]
pub struct StandardStrategy {
    states: StateManager,
}

impl StandardStrategy {
    pub fn new(provider: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            states: StateManager::new(provider, store),
        }
    }

    /// Issue and persist a state for the tuple.
    pub async fn authorize(
        &self,
        user_id: &str,
        org_id: &str,
        expiry: Duration,
    ) -> Result<Authorization, Error> {
        let issued = self.states.issue(user_id, org_id, expiry).await?;
        Ok(Authorization {
            state: issued.state,
            encoded_state: issued.encoded,
            code_challenge: None,
        })
    }

    /// Verify a callback and consume its state.
    ///
    /// Checks run in order: provider error, missing code, missing state, then state
    /// decoding and validation. A provider error returns before touching the store.
    pub async fn callback(&self, params: &CallbackParams) -> Result<VerifiedCallback, Error> {
        if let Some(error) = non_empty(&params.error) {
            let description = non_empty(&params.error_description).unwrap_or(error);
            debug!(
                "{} authorization denied by provider: {}",
                self.states.provider(),
                error
            );
            return Err(oauth_error(OAuthErrorKind::AuthorizationDenied, description));
        }

        let code = non_empty(&params.code).ok_or_else(|| {
            oauth_error(
                OAuthErrorKind::MissingAuthorizationCode,
                "Authorization code not provided",
            )
        })?;

        let encoded_state = non_empty(&params.state).ok_or_else(|| {
            oauth_error(OAuthErrorKind::MissingState, "State parameter not provided")
        })?;

        let state = self.states.consume(encoded_state).await?;

        Ok(VerifiedCallback {
            code: code.to_string(),
            user_id: state.user_id,
            org_id: state.org_id,
            code_verifier: None,
        })
    }
}

/// Result of starting a PKCE authorization.
#[derive(Debug, Clone)]
pub struct PkceAuthorization {
    pub state: OAuthState,
    pub encoded_state: String,
    pub code_challenge: PkceChallenge,
}

impl From<PkceAuthorization> for Authorization {
    fn from(authorization: PkceAuthorization) -> Self {
        Authorization {
            state: authorization.state,
            encoded_state: authorization.encoded_state,
            code_challenge: Some(authorization.code_challenge),
        }
    }
}

/// A PKCE callback whose state and verifier have both been consumed.
#[derive(Debug, Clone)]
pub struct PkceCallback {
    pub code: String,
    pub user_id: String,
    pub org_id: String,
    pub code_verifier: PkceVerifier,
}

impl From<PkceCallback> for VerifiedCallback {
    fn from(callback: PkceCallback) -> Self {
        VerifiedCallback {
            code: callback.code,
            user_id: callback.user_id,
            org_id: callback.org_id,
            code_verifier: Some(callback.code_verifier),
        }
    }
}

/// Authorization code flow with PKCE (`S256`).
///
/// The verifier is stored under `{provider}_verifier:{org_id}:{user_id}` with the
/// same TTL as the state and deleted on first successful callback.
#[derive(Clone)]
pub struct PkceStrategy {
    standard: StandardStrategy,
}

impl PkceStrategy {
    pub fn new(provider: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            standard: StandardStrategy::new(provider, store),
        }
    }

    fn verifier_key(&self, org_id: &str, user_id: &str) -> String {
        StoreKey::new(
            self.standard.states.provider(),
            KeyKind::Verifier,
            org_id,
            user_id,
        )
        .to_string()
    }

    /// Persist a fresh verifier, then issue the state.
    ///
    /// A state is never left behind without its verifier: if issuing the state
    /// fails, the verifier just written is removed again.
    pub async fn authorize(
        &self,
        user_id: &str,
        org_id: &str,
        expiry: Duration,
    ) -> Result<PkceAuthorization, Error> {
        let verifier = PkceVerifier::generate();
        let code_challenge = verifier.challenge();

        let store = self.standard.states.store();
        let key = self.verifier_key(org_id, user_id);
        store.set(&key, verifier.as_str(), Some(expiry)).await?;

        let authorization = match self.standard.authorize(user_id, org_id, expiry).await {
            Ok(authorization) => authorization,
            Err(e) => {
                if let Err(cleanup) = store.delete(&key).await {
                    warn!(
                        "Failed to remove {} code verifier after state error: {}",
                        self.standard.states.provider(),
                        cleanup
                    );
                }
                return Err(e);
            }
        };

        Ok(PkceAuthorization {
            state: authorization.state,
            encoded_state: authorization.encoded_state,
            code_challenge,
        })
    }

    /// Verify the state first, then consume the verifier.
    pub async fn callback(&self, params: &CallbackParams) -> Result<PkceCallback, Error> {
        let verified = self.standard.callback(params).await?;

        let store = self.standard.states.store();
        let key = self.verifier_key(&verified.org_id, &verified.user_id);
        let verifier = store.get(&key).await?.ok_or_else(|| {
            warn!(
                "{} code verifier missing for org {} user {}",
                self.standard.states.provider(),
                verified.org_id,
                verified.user_id
            );
            oauth_error(
                OAuthErrorKind::VerifierExpired,
                "Code verifier not found or expired",
            )
        })?;
        store.delete(&key).await?;

        Ok(PkceCallback {
            code: verified.code,
            user_id: verified.user_id,
            org_id: verified.org_id,
            code_verifier: PkceVerifier::from_string(verifier),
        })
    }
}

/// One of the two authorization protocols an adapter can use.
#[derive(Clone)]
pub enum Strategy {
    Standard(StandardStrategy),
    Pkce(PkceStrategy),
}

impl Strategy {
    pub fn standard(provider: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Strategy::Standard(StandardStrategy::new(provider, store))
    }

    pub fn pkce(provider: &str, store: Arc<dyn KeyValueStore>) -> Self {
        Strategy::Pkce(PkceStrategy::new(provider, store))
    }

    pub fn uses_pkce(&self) -> bool {
        matches!(self, Strategy::Pkce(_))
    }

    /// Start an authorization for the tuple.
    ///
    /// # Arguments
    ///
    /// * `user_id` - User starting the authorization
    /// * `org_id` - Organization of the user
    /// * `expiry` - TTL for the state (and verifier, for PKCE)
    pub async fn authorize(
        &self,
        user_id: &str,
        org_id: &str,
        expiry: Duration,
    ) -> Result<Authorization, Error> {
        match self {
            Strategy::Standard(strategy) => strategy.authorize(user_id, org_id, expiry).await,
            Strategy::Pkce(strategy) => strategy
                .authorize(user_id, org_id, expiry)
                .await
                .map(Authorization::from),
        }
    }

    /// Validate a callback, consuming the state (and verifier, for PKCE).
    pub async fn callback(&self, params: &CallbackParams) -> Result<VerifiedCallback, Error> {
        match self {
            Strategy::Standard(strategy) => strategy.callback(params).await,
            Strategy::Pkce(strategy) => strategy.callback(params).await.map(VerifiedCallback::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, StoreErrorKind};
    use crate::store::test_support::FailingStore;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use sha2::{Digest, Sha256};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(600);

    fn params(code: &str, state: &str) -> CallbackParams {
        CallbackParams {
            code: Some(code.to_string()),
            state: Some(state.to_string()),
            ..Default::default()
        }
    }

    fn assert_oauth_kind(result: Result<VerifiedCallback, Error>, expected: OAuthErrorKind) {
        match result {
            Err(err) => assert_eq!(err.error_kind, ErrorKind::OAuth(expected)),
            Ok(verified) => panic!("expected {:?}, got {:?}", expected, verified),
        }
    }

    /// Store that counts writes so tests can assert a path is read-only.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for CountingStore {
        async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), Error> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value, ttl).await
        }

        async fn get(&self, key: &str) -> Result<Option<String>, Error> {
            self.inner.get(key).await
        }

        async fn delete(&self, key: &str) -> Result<(), Error> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn test_standard_authorize_then_callback() {
        let store = MemoryStore::new();
        let strategy = Strategy::standard("hubspot", Arc::new(store.clone()));

        let auth = strategy.authorize("u1", "o1", TTL).await.unwrap();
        assert!(auth.code_challenge.is_none());

        let verified = strategy
            .callback(&params("code-123", &auth.encoded_state))
            .await
            .unwrap();
        assert_eq!(verified.code, "code-123");
        assert_eq!(verified.user_id, "u1");
        assert_eq!(verified.org_id, "o1");
        assert!(verified.code_verifier.is_none());
        assert_eq!(store.get("hubspot_state:o1:u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_replayed_callback_fails_with_state_expired() {
        let strategy = Strategy::standard("notion", Arc::new(MemoryStore::new()));
        let auth = strategy.authorize("u1", "o1", TTL).await.unwrap();
        let callback = params("code", &auth.encoded_state);

        strategy.callback(&callback).await.unwrap();
        assert_oauth_kind(
            strategy.callback(&callback).await,
            OAuthErrorKind::StateExpired,
        );
    }

    #[tokio::test]
    async fn test_provider_error_is_denied_without_store_writes() {
        let store = Arc::new(CountingStore::default());
        let strategy = Strategy::pkce("airtable", store.clone());
        let callback = CallbackParams {
            error: Some("access_denied".to_string()),
            error_description: Some("The user denied access".to_string()),
            ..Default::default()
        };

        let err = strategy.callback(&callback).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::AuthorizationDenied)
        );
        assert_eq!(err.detail(), "The user denied access");
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_error_without_description_uses_error_code() {
        let strategy = Strategy::standard("hubspot", Arc::new(MemoryStore::new()));
        let callback = CallbackParams {
            error: Some("access_denied".to_string()),
            ..Default::default()
        };
        let err = strategy.callback(&callback).await.unwrap_err();
        assert_eq!(err.detail(), "access_denied");
    }

    #[tokio::test]
    async fn test_missing_code() {
        let strategy = Strategy::standard("hubspot", Arc::new(MemoryStore::new()));
        let callback = CallbackParams {
            state: Some("abc".to_string()),
            ..Default::default()
        };
        assert_oauth_kind(
            strategy.callback(&callback).await,
            OAuthErrorKind::MissingAuthorizationCode,
        );
    }

    #[tokio::test]
    async fn test_empty_code_counts_as_missing() {
        let strategy = Strategy::standard("hubspot", Arc::new(MemoryStore::new()));
        assert_oauth_kind(
            strategy.callback(&params("", "abc")).await,
            OAuthErrorKind::MissingAuthorizationCode,
        );
    }

    #[tokio::test]
    async fn test_missing_state() {
        let strategy = Strategy::standard("hubspot", Arc::new(MemoryStore::new()));
        let callback = CallbackParams {
            code: Some("code".to_string()),
            ..Default::default()
        };
        assert_oauth_kind(
            strategy.callback(&callback).await,
            OAuthErrorKind::MissingState,
        );
    }

    #[tokio::test]
    async fn test_malformed_state() {
        let strategy = Strategy::standard("hubspot", Arc::new(MemoryStore::new()));
        assert_oauth_kind(
            strategy.callback(&params("code", "%%%")).await,
            OAuthErrorKind::InvalidState,
        );
    }

    #[tokio::test]
    async fn test_mismatched_state_leaves_stored_state_for_original_request() {
        let store = MemoryStore::new();
        let strategy = Strategy::standard("hubspot", Arc::new(store.clone()));
        let auth = strategy.authorize("u1", "o1", TTL).await.unwrap();

        let forged = OAuthState {
            state: "attacker".to_string(),
            ..auth.state.clone()
        }
        .encode()
        .unwrap();
        assert_oauth_kind(
            strategy.callback(&params("code", &forged)).await,
            OAuthErrorKind::StateMismatch,
        );
        assert!(store.get("hubspot_state:o1:u1").await.unwrap().is_some());

        assert!(strategy
            .callback(&params("code", &auth.encoded_state))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_pkce_authorize_persists_verifier_with_state() {
        let store = MemoryStore::new();
        let strategy = Strategy::pkce("airtable", Arc::new(store.clone()));
        assert!(strategy.uses_pkce());

        let auth = strategy.authorize("u1", "o1", TTL).await.unwrap();
        assert!(auth.code_challenge.is_some());
        assert!(store.get("airtable_state:o1:u1").await.unwrap().is_some());
        assert!(store.get("airtable_verifier:o1:u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_pkce_verifier_hashes_to_issued_challenge() {
        let store = MemoryStore::new();
        let strategy = Strategy::pkce("airtable", Arc::new(store.clone()));
        let auth = strategy.authorize("u1", "o1", TTL).await.unwrap();

        let verified = strategy
            .callback(&params("code", &auth.encoded_state))
            .await
            .unwrap();
        let verifier = verified.code_verifier.unwrap();
        let challenge = auth.code_challenge.unwrap();

        let challenge_bytes = URL_SAFE_NO_PAD.decode(challenge.as_str()).unwrap();
        assert_eq!(
            Sha256::digest(verifier.as_str().as_bytes()).to_vec(),
            challenge_bytes
        );
        assert_eq!(store.get("airtable_verifier:o1:u1").await.unwrap(), None);
        assert_eq!(store.get("airtable_state:o1:u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pkce_missing_verifier() {
        let store = MemoryStore::new();
        let strategy = Strategy::pkce("airtable", Arc::new(store.clone()));
        let auth = strategy.authorize("u1", "o1", TTL).await.unwrap();
        store.delete("airtable_verifier:o1:u1").await.unwrap();

        assert_oauth_kind(
            strategy.callback(&params("code", &auth.encoded_state)).await,
            OAuthErrorKind::VerifierExpired,
        );
        // State was consumed before the verifier lookup
        assert_eq!(store.get("airtable_state:o1:u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pkce_replay_fails_on_state_before_verifier() {
        let strategy = Strategy::pkce("airtable", Arc::new(MemoryStore::new()));
        let auth = strategy.authorize("u1", "o1", TTL).await.unwrap();
        let callback = params("code", &auth.encoded_state);

        strategy.callback(&callback).await.unwrap();
        assert_oauth_kind(
            strategy.callback(&callback).await,
            OAuthErrorKind::StateExpired,
        );
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_authorize() {
        for strategy in [
            Strategy::standard("hubspot", Arc::new(FailingStore::unavailable())),
            Strategy::pkce("airtable", Arc::new(FailingStore::unavailable())),
        ] {
            let err = strategy.authorize("u1", "o1", TTL).await.unwrap_err();
            assert_eq!(err.error_kind, ErrorKind::Store(StoreErrorKind::Unavailable));
        }
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_callback() {
        let encoded = OAuthState::generate("u1", "o1").encode().unwrap();
        for strategy in [
            Strategy::standard("hubspot", Arc::new(FailingStore::unavailable())),
            Strategy::pkce("airtable", Arc::new(FailingStore::unavailable())),
        ] {
            let err = strategy
                .callback(&params("code", &encoded))
                .await
                .unwrap_err();
            assert_eq!(err.error_kind, ErrorKind::Store(StoreErrorKind::Unavailable));
        }
    }

    #[tokio::test]
    async fn test_pkce_verifier_lookup_failure_is_a_store_error() {
        let store = Arc::new(FailingStore::failing_on(|key| {
            key.starts_with("airtable_verifier:")
        }));
        let strategy = PkceStrategy::new("airtable", store.clone());
        let state = StandardStrategy::new("airtable", store.clone())
            .authorize("u1", "o1", TTL)
            .await
            .unwrap();

        let err = strategy
            .callback(&params("code", &state.encoded_state))
            .await
            .unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Store(StoreErrorKind::Unavailable));
    }

    #[tokio::test]
    async fn test_pkce_state_failure_leaves_no_verifier_behind() {
        let store = Arc::new(FailingStore::failing_on(|key| {
            key.starts_with("airtable_state:")
        }));
        let strategy = PkceStrategy::new("airtable", store.clone());

        let err = strategy.authorize("u1", "o1", TTL).await.unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Store(StoreErrorKind::Unavailable));
        assert_eq!(
            store.inner.get("airtable_verifier:o1:u1").await.unwrap(),
            None
        );
        assert!(store.inner.is_empty());
    }

    #[tokio::test]
    async fn test_pkce_verifier_failure_issues_no_state() {
        let store = Arc::new(FailingStore::failing_on(|key| {
            key.starts_with("airtable_verifier:")
        }));
        let strategy = PkceStrategy::new("airtable", store.clone());

        let err = strategy.authorize("u1", "o1", TTL).await.unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Store(StoreErrorKind::Unavailable));
        assert!(store.inner.is_empty());
    }
}
