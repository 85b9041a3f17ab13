//! Name-keyed registry of provider adapters.
//!
//! Built once by the composition root and shared read-only afterwards, so lookups
//! need no locking. Adding a provider only requires registering its adapter here.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::Provider;
use crate::error::{registry_error, Error, RegistryErrorKind};

#[derive(Clone, Default)]
pub struct Registry {
    adapters: HashMap<String, Arc<dyn Provider>>,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` under the lower-cased `name`.
    ///
    /// Re-registering a name replaces the previous adapter. Names must be non-empty
    /// and consist of ASCII letters, digits, `-` or `_`, so that a typo surfaces at
    /// startup rather than as a 404 at request time.
    pub fn register(&mut self, name: &str, adapter: Arc<dyn Provider>) -> Result<(), Error> {
        let key = normalize(name);
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(registry_error(
                RegistryErrorKind::InvalidName,
                &format!("Invalid provider name '{}'", name),
            ));
        }

        if self.adapters.insert(key.clone(), adapter).is_some() {
            info!("Replaced adapter registered for '{}'", key);
        } else {
            info!("Registered adapter for '{}'", key);
        }
        Ok(())
    }

    /// Look up the adapter for `name`, case-insensitively.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>, Error> {
        self.adapters
            .get(&normalize(name))
            .cloned()
            .ok_or_else(|| {
                registry_error(
                    RegistryErrorKind::ProviderNotFound,
                    &format!("Provider '{}' not found", name),
                )
            })
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.adapters.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
