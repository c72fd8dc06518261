//! Project API key and bearer credentials

use crate::{Error, Result};

/// Project API key sent in the `apikey` header.
///
/// Hosted projects issue these as JWTs whose `role` claim tells an anonymous
/// key from a service key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

pub const SERVICE_ROLE: &str = "service_role";

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(Error::InvalidApiKey("API key cannot be empty".to_string()));
        }
        Ok(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header when no user session is used
    pub fn to_bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// The `role` claim of the key, read without verifying the signature
    pub fn role(&self) -> Result<String> {
        use base64::Engine;

        let payload = self
            .0
            .split('.')
            .nth(1)
            .ok_or_else(|| Error::InvalidApiKey("not a JWT".to_string()))?;

        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| Error::InvalidApiKey(format!("bad payload encoding: {}", e)))?;

        let claims: serde_json::Value = serde_json::from_slice(&bytes)?;
        claims
            .get("role")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidApiKey("no role claim".to_string()))
    }

    pub fn is_service_key(&self) -> bool {
        matches!(self.role().as_deref(), Ok(SERVICE_ROLE))
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
