//! `clients` table data model

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A row of the `clients` table.
///
/// Columns the tool does not care about (phone, address, ...) are ignored on
/// deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub auth_user_id: Uuid,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub full_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Client role. Unknown values are kept verbatim so a misclassified row can
/// still be read and reported; a NULL role reads as an empty `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Role {
    Admin,
    Student,
    Workforce,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
            Role::Workforce => "workforce",
            Role::Other(s) => s,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Role::Admin,
            "student" => Role::Student,
            "workforce" => Role::Workforce,
            _ => Role::Other(value),
        }
    }
}

impl From<Option<String>> for Role {
    fn from(value: Option<String>) -> Self {
        value.map(Role::from).unwrap_or(Role::Other(String::new()))
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insert payload for a new client row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewClient {
    pub auth_user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl NewClient {
    /// Build the admin row for an auth user
    pub fn admin(auth_user_id: Uuid, email: String, full_name: String) -> Result<Self> {
        let client = Self {
            auth_user_id,
            email,
            full_name,
            role: Role::Admin,
        };
        client.validate()?;
        Ok(client)
    }

    /// Validate the insert payload
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;

        if self.full_name.trim().is_empty() {
            return Err(Error::Validation("Full name cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// Update payload used to promote an existing row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientPatch {
    pub role: Role,
    pub full_name: String,
}

impl ClientPatch {
    pub fn promote(full_name: String) -> Result<Self> {
        if full_name.trim().is_empty() {
            return Err(Error::Validation("Full name cannot be empty".to_string()));
        }
        Ok(Self {
            role: Role::Admin,
            full_name,
        })
    }
}

fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(Error::Validation("Email cannot be empty".to_string()));
    }

    if !email.contains('@') {
        return Err(Error::Validation(format!("Invalid email '{}'", email)));
    }

    Ok(())
}

/// State of the admin row for one auth user
#[derive(Debug, Clone, PartialEq)]
pub enum AdminStatus {
    Missing,
    WrongRole { record: ClientRecord },
    Duplicate { records: Vec<ClientRecord> },
    Healthy { record: ClientRecord },
}

impl AdminStatus {
    /// Classify the rows returned for a single auth user
    pub fn classify(mut records: Vec<ClientRecord>) -> Self {
        match records.len() {
            0 => AdminStatus::Missing,
            1 => {
                let record = records.remove(0);
                if record.role.is_admin() {
                    AdminStatus::Healthy { record }
                } else {
                    AdminStatus::WrongRole { record }
                }
            }
            _ => AdminStatus::Duplicate { records },
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, AdminStatus::Healthy { .. })
    }
}

impl fmt::Display for AdminStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminStatus::Missing => write!(f, "client record missing"),
            AdminStatus::WrongRole { record } => {
                write!(f, "client record has role '{}'", record.role)
            }
            AdminStatus::Duplicate { records } => {
                write!(f, "{} client records for one auth user", records.len())
            }
            AdminStatus::Healthy { .. } => write!(f, "role is admin"),
        }
    }
}

/// What a repair run should do for a given status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairAction {
    Create,
    /// `None` when the row carries no primary key; the update then filters
    /// on `auth_user_id` instead.
    Promote { id: Option<Uuid> },
    Reinsert,
    Nothing,
}

impl RepairAction {
    pub fn plan(status: &AdminStatus) -> Self {
        match status {
            AdminStatus::Missing => RepairAction::Create,
            AdminStatus::WrongRole { record } => RepairAction::Promote { id: record.id },
            AdminStatus::Duplicate { .. } => RepairAction::Reinsert,
            AdminStatus::Healthy { .. } => RepairAction::Nothing,
        }
    }
}

impl fmt::Display for RepairAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairAction::Create => write!(f, "create admin client record"),
            RepairAction::Promote { .. } => write!(f, "update role to admin"),
            RepairAction::Reinsert => write!(f, "delete and reinsert admin client record"),
            RepairAction::Nothing => write!(f, "nothing to do"),
        }
    }
}
