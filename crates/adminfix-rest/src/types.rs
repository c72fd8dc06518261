//! Auth and REST API types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of a password grant sign-in
#[derive(Clone, Serialize)]
pub struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// A user of the hosted auth service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Token response of a successful sign-in
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Row filter on the `clients` table
#[derive(Debug, Clone, PartialEq)]
pub enum ClientFilter {
    Id(Uuid),
    AuthUserId(Uuid),
    Email(String),
}

impl ClientFilter {
    /// Column and `eq.` operand for a query string
    pub fn to_query(&self) -> (&'static str, String) {
        match self {
            ClientFilter::Id(id) => ("id", format!("eq.{}", id)),
            ClientFilter::AuthUserId(id) => ("auth_user_id", format!("eq.{}", id)),
            ClientFilter::Email(email) => ("email", format!("eq.{}", email)),
        }
    }
}

/// Raw outcome of an RPC call, kept for operator output
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    pub status: u16,
    pub body: String,
}

impl RpcResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}
