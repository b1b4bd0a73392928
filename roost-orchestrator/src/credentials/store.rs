//! In-memory credential store
//!
//! Values are keyed by `(user_id, integration)`. The store is process-local
//! state seeded at startup or through the management surface; nothing here
//! touches the database, and values never appear in logs or run records.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::registry::{env_for_credentials, required_keys};

type Key = (String, String);

#[derive(Default)]
pub struct CredentialStore {
    values: Mutex<HashMap<Key, HashMap<String, String>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the full credential set for one user/integration pair,
    /// replacing whatever was there.
    pub fn set(&self, user_id: &str, integration: &str, values: HashMap<String, String>) {
        self.lock()
            .insert((user_id.to_string(), integration.to_string()), values);
    }

    pub fn get(&self, user_id: &str, integration: &str) -> Option<HashMap<String, String>> {
        self.lock()
            .get(&(user_id.to_string(), integration.to_string()))
            .cloned()
    }

    pub fn delete(&self, user_id: &str, integration: &str) -> bool {
        self.lock()
            .remove(&(user_id.to_string(), integration.to_string()))
            .is_some()
    }

    /// Whether every required credential key for an integration is present
    /// and non-empty. Integrations with no required keys are always
    /// satisfied.
    pub fn has_credentials(&self, user_id: &str, integration: &str) -> bool {
        let required = required_keys(integration);
        if required.is_empty() {
            return true;
        }

        let values = self.lock();
        let Some(stored) = values.get(&(user_id.to_string(), integration.to_string())) else {
            return false;
        };

        required
            .iter()
            .all(|key| stored.get(*key).is_some_and(|value| !value.is_empty()))
    }

    /// Environment variables for one user/integration pair.
    pub fn resolve(&self, user_id: &str, integration: &str) -> HashMap<String, String> {
        match self.get(user_id, integration) {
            Some(values) => env_for_credentials(integration, &values),
            None => HashMap::new(),
        }
    }

    /// Merged environment across a set of integrations.
    pub fn resolve_all<I, S>(&self, user_id: &str, integrations: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut env = HashMap::new();
        for integration in integrations {
            env.extend(self.resolve(user_id, integration.as_ref()));
        }
        env
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, HashMap<String, String>>> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
