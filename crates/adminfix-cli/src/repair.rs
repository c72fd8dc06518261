//! Bringing the admin client row back to `role = admin`

use crate::{inspect::inspect, Error, Result};
use adminfix_core::models::{
    AdminStatus, ClientPatch, ClientRecord, NewClient, RepairAction, Role,
};
use adminfix_rest::{AuthUser, ClientFilter, RestClient};
use std::fmt;

#[derive(Debug, Clone)]
pub struct RepairOptions {
    /// Email stored on a created row when the auth user has none
    pub email: String,
    pub full_name: String,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    Created { record: ClientRecord },
    Promoted { previous: Role, record: ClientRecord },
    AlreadyAdmin { record: ClientRecord },
    Planned { status: AdminStatus, action: RepairAction },
}

impl fmt::Display for RepairOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairOutcome::Created { .. } => write!(f, "Client record created"),
            RepairOutcome::Promoted { previous, .. } => {
                write!(f, "Role updated from '{}' to admin", previous)
            }
            RepairOutcome::AlreadyAdmin { .. } => write!(f, "Role is already admin"),
            RepairOutcome::Planned { status, action } => {
                write!(f, "Dry run: {}; would {}", status, action)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReinsertOutcome {
    /// Rows visible before the delete
    pub existing: usize,
    /// Rows the server reported deleted; `None` when it returned no body
    pub removed: Option<usize>,
    pub record: ClientRecord,
}

/// Check the admin row and create or update it as needed.
///
/// Duplicate rows are not touched; they need [`reinsert`].
pub async fn repair(
    client: &RestClient,
    user: &AuthUser,
    options: &RepairOptions,
) -> Result<RepairOutcome> {
    let status = inspect(client, user.id).await?;
    let action = RepairAction::plan(&status);

    if options.dry_run {
        return Ok(RepairOutcome::Planned { status, action });
    }

    match status {
        AdminStatus::Healthy { record } => Ok(RepairOutcome::AlreadyAdmin { record }),
        AdminStatus::Missing => {
            tracing::info!("Client record not found, creating...");
            let record = create(client, user, options).await?;
            Ok(RepairOutcome::Created { record })
        }
        AdminStatus::WrongRole { record } => {
            tracing::info!("Updating role '{}' to admin...", record.role);
            let filter = match record.id {
                Some(id) => ClientFilter::Id(id),
                None => ClientFilter::AuthUserId(user.id),
            };
            let patch = ClientPatch::promote(options.full_name.clone())?;
            let mut updated = client.update_clients(&filter, &patch).await?;
            if updated.is_empty() {
                return Err(Error::NotConverged(
                    "update matched no rows; row-level security may hide the record".to_string(),
                ));
            }
            let written = updated.remove(0);
            ensure_admin(&written, user)?;
            Ok(RepairOutcome::Promoted {
                previous: record.role,
                record: written,
            })
        }
        AdminStatus::Duplicate { records } => Err(Error::Ambiguous(records.len())),
    }
}

/// Delete every row of the admin user and insert a fresh admin row.
///
/// Afterwards the user must have exactly one row, with role admin.
pub async fn reinsert(
    client: &RestClient,
    user: &AuthUser,
    options: &RepairOptions,
) -> Result<ReinsertOutcome> {
    let new_client = new_admin(user, options)?;
    let filter = ClientFilter::AuthUserId(user.id);

    let existing = client.count_clients(&filter).await?;
    let removed = client.delete_clients(&filter).await?;
    tracing::info!(
        "Deleted {:?} of {} client records for {}",
        removed,
        existing,
        user.id
    );
    if let Some(removed) = removed {
        if removed < existing {
            return Err(Error::NotConverged(format!(
                "deleted {} of {} client records; row-level security may hide them",
                removed, existing
            )));
        }
    }

    let record = client.insert_client(&new_client).await?;
    ensure_admin(&record, user)?;

    match inspect(client, user.id).await? {
        AdminStatus::Healthy { .. } => Ok(ReinsertOutcome {
            existing,
            removed,
            record,
        }),
        status => Err(Error::NotConverged(format!("after reinsert: {}", status))),
    }
}

async fn create(
    client: &RestClient,
    user: &AuthUser,
    options: &RepairOptions,
) -> Result<ClientRecord> {
    let new_client = new_admin(user, options)?;
    let record = client.insert_client(&new_client).await?;
    ensure_admin(&record, user)?;
    Ok(record)
}

fn new_admin(user: &AuthUser, options: &RepairOptions) -> Result<NewClient> {
    let email = user
        .email
        .clone()
        .filter(|email| !email.is_empty())
        .unwrap_or_else(|| options.email.clone());
    Ok(NewClient::admin(user.id, email, options.full_name.clone())?)
}

/// The written row must belong to the user and carry the admin role
fn ensure_admin(record: &ClientRecord, user: &AuthUser) -> Result<()> {
    if record.auth_user_id != user.id {
        return Err(Error::NotConverged(format!(
            "written record belongs to {}, expected {}",
            record.auth_user_id, user.id
        )));
    }
    if !record.role.is_admin() {
        return Err(Error::NotConverged(format!(
            "written record has role '{}'",
            record.role
        )));
    }
    Ok(())
}
