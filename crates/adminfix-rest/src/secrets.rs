//! Credential lookup: explicit values first, then the OS keyring

use crate::{auth::ApiKey, Error, Result};
use adminfix_core::models::Config;
use std::collections::HashMap;
use std::sync::Mutex;

pub const KEYRING_SERVICE: &str = "adminfix";

pub trait SecretStore {
    fn get(&self, name: &str) -> Result<Option<String>>;
    fn set(&self, name: &str, value: &str) -> Result<()>;
    /// Removing a missing entry is not an error
    fn delete(&self, name: &str) -> Result<()>;
}

/// Secrets kept in the platform keyring under one service name
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let entry = keyring::Entry::new(&self.service, name)?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        let entry = keyring::Entry::new(&self.service, name)?;
        entry.set_password(value)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let entry = keyring::Entry::new(&self.service, name)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, for tests and one-off runs
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.entries().get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.entries().insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.entries().remove(name);
        Ok(())
    }
}

/// Values given on the command line or through the environment
#[derive(Default, Clone)]
pub struct ExplicitCredentials {
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Everything needed to sign in as the admin
pub struct Credentials {
    pub api_key: ApiKey,
    pub email: String,
    password: String,
}

impl Credentials {
    pub fn resolve(
        explicit: ExplicitCredentials,
        store: &dyn SecretStore,
        config: &Config,
    ) -> Result<Self> {
        let api_key = Self::resolve_api_key(explicit.api_key, store, config)?;

        let email = non_empty(explicit.email)
            .or_else(|| config.admin.email.clone())
            .ok_or_else(|| {
                Error::MissingCredential(
                    "admin email (set ADMINFIX_ADMIN_EMAIL or `adminfix config init`)".to_string(),
                )
            })?;

        let password = match non_empty(explicit.password) {
            Some(password) => password,
            None => store
                .get(&config.admin.password_keychain)?
                .ok_or_else(|| {
                    Error::MissingCredential(
                        "admin password (set ADMINFIX_ADMIN_PASSWORD or run `adminfix credentials set`)"
                            .to_string(),
                    )
                })?,
        };

        Ok(Self {
            api_key,
            email,
            password,
        })
    }

    /// Only the project key, for calls that do not sign in
    pub fn resolve_api_key(
        explicit: Option<String>,
        store: &dyn SecretStore,
        config: &Config,
    ) -> Result<ApiKey> {
        let key = match non_empty(explicit) {
            Some(key) => key,
            None => store
                .get(&config.project.api_key_keychain)?
                .ok_or_else(|| {
                    Error::MissingCredential(
                        "API key (set ADMINFIX_API_KEY or run `adminfix credentials set`)"
                            .to_string(),
                    )
                })?,
        };
        ApiKey::new(key)
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
