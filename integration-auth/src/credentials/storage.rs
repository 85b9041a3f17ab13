//! Single-read credential handoff through the key-value store.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::error::{credential_error, store_error, CredentialErrorKind, Error, StoreErrorKind};
use crate::store::{KeyKind, KeyValueStore, StoreKey};

/// Stores credentials under `{provider}_credentials:{org_id}:{user_id}` and
/// hands them out once: a successful [`CredentialStore::take`] deletes the key.
#[derive(Clone)]
pub struct CredentialStore {
    provider: String,
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl CredentialStore {
    pub fn new(provider: &str, store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self {
            provider: provider.to_string(),
            store,
            ttl,
        }
    }

    fn key(&self, org_id: &str, user_id: &str) -> String {
        StoreKey::new(&self.provider, KeyKind::Credentials, org_id, user_id).to_string()
    }

    /// Persist freshly exchanged credentials with the configured TTL.
    pub async fn put<T: Serialize>(
        &self,
        user_id: &str,
        org_id: &str,
        credentials: &T,
    ) -> Result<(), Error> {
        let value = serde_json::to_string(credentials).map_err(|e| {
            store_error(
                StoreErrorKind::Corrupt,
                &format!("Failed to serialize credentials: {e}"),
            )
        })?;
        self.store
            .set(&self.key(org_id, user_id), &value, Some(self.ttl))
            .await?;
        info!(
            "Stored {} credentials for org {} user {}",
            self.provider, org_id, user_id
        );
        Ok(())
    }

    /// Fetch, parse and delete the credentials for the tuple.
    ///
    /// Fails with `CredentialErrorKind::NotFound` when absent, expired or already
    /// taken. A value that does not parse is left in place and reported as
    /// `CredentialErrorKind::Invalid`.
    pub async fn take<T: DeserializeOwned>(&self, user_id: &str, org_id: &str) -> Result<T, Error> {
        let key = self.key(org_id, user_id);
        let value = self.store.get(&key).await?.ok_or_else(|| {
            debug!(
                "No {} credentials for org {} user {}",
                self.provider, org_id, user_id
            );
            credential_error(CredentialErrorKind::NotFound, "No credentials found.")
        })?;

        let credentials = super::parse(&value)?;
        self.store.delete(&key).await?;
        Ok(credentials)
    }
}
