//! Application configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    pub project: ProjectConfig,
    pub admin: AdminConfig,
    pub http: HttpConfig,
    pub log_level: String,
}

/// The hosted project the tool talks to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    pub url: Option<String>,
    /// Keyring entry holding the project API key
    pub api_key_keychain: String,
}

/// The admin account whose client row is repaired
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminConfig {
    pub email: Option<String>,
    pub full_name: String,
    /// Keyring entry holding the admin password
    pub password_keychain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.project.validate()?;
        self.admin.validate()?;
        self.http.validate()?;

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(Error::Validation(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.log_level,
                valid_log_levels.join(", ")
            )));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            project: ProjectConfig::default(),
            admin: AdminConfig::default(),
            http: HttpConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ProjectConfig {
    /// Validate project configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url) = self.url {
            if url.trim().is_empty() {
                return Err(Error::Validation("Project URL cannot be empty".to_string()));
            }

            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Validation(format!(
                    "Project URL '{}' must start with http:// or https://",
                    url
                )));
            }
        }

        if self.api_key_keychain.trim().is_empty() {
            return Err(Error::Validation(
                "API key keychain entry cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key_keychain: "api-key".to_string(),
        }
    }
}

impl AdminConfig {
    /// Validate admin account configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(ref email) = self.email {
            if !email.contains('@') {
                return Err(Error::Validation(format!("Invalid admin email '{}'", email)));
            }
        }

        if self.full_name.trim().is_empty() {
            return Err(Error::Validation(
                "Admin full name cannot be empty".to_string(),
            ));
        }

        if self.password_keychain.trim().is_empty() {
            return Err(Error::Validation(
                "Password keychain entry cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: None,
            full_name: "Admin".to_string(),
            password_keychain: "admin-password".to_string(),
        }
    }
}

impl HttpConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::Validation(
                "HTTP timeout must be greater than 0".to_string(),
            ));
        }

        const MAX_TIMEOUT: u64 = 300; // 5 minutes
        if self.timeout_secs > MAX_TIMEOUT {
            return Err(Error::Validation(format!(
                "HTTP timeout too long (max {} seconds)",
                MAX_TIMEOUT
            )));
        }

        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}
