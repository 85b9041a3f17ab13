//! Key-value store contract for ephemeral OAuth state.
//!
//! State tokens, PKCE verifiers and credentials live only in the store, under keys
//! namespaced by provider, organization and user. The store is expected to provide
//! atomic single-key `set`/`get`/`delete` and TTL expiry; nothing here relies on
//! cross-key transactions.

mod memory;

pub use memory::MemoryStore;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;

/// Trait for the TTL-capable key-value store holding all ephemeral state.
///
/// Implementations report an unreachable backend as an error instead of
/// answering `None`, so callers never mistake an outage for an expired key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Arguments
    ///
    /// * `key` - Namespaced key, see [`StoreKey`]
    /// * `value` - Serialized value
    /// * `ttl` - When set, the key reads as absent once this much time has passed
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), Error>;

    /// Retrieve the value under `key`.
    ///
    /// # Returns
    ///
    /// `Some(value)` if present and unexpired, `None` otherwise.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Delete `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), Error>;
}

/// What a store key holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    State,
    Verifier,
    Credentials,
}

impl KeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::State => "state",
            KeyKind::Verifier => "verifier",
            KeyKind::Credentials => "credentials",
        }
    }
}

/// A store key of the form `{provider}_{kind}:{org_id}:{user_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKey<'a> {
    pub provider: &'a str,
    pub kind: KeyKind,
    pub org_id: &'a str,
    pub user_id: &'a str,
}

impl<'a> StoreKey<'a> {
    pub fn new(provider: &'a str, kind: KeyKind, org_id: &'a str, user_id: &'a str) -> Self {
        Self {
            provider,
            kind,
            org_id,
            user_id,
        }
    }
}

impl fmt::Display for StoreKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}_{}:{}:{}",
            self.provider,
            self.kind.as_str(),
            self.org_id,
            self.user_id
        )
    }
}
