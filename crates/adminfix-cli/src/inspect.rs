//! Read-only checks of the `clients` table

use crate::Result;
use adminfix_core::models::AdminStatus;
use adminfix_rest::{ClientFilter, RestClient};
use serde_json::Value;
use uuid::Uuid;

pub const PROBE_COLUMNS: &str = "auth_user_id,email,role";
pub const PROBE_LIMIT: usize = 5;

/// Classify the client rows belonging to an auth user
pub async fn inspect(client: &RestClient, auth_user_id: Uuid) -> Result<AdminStatus> {
    let records = client
        .select_clients(&ClientFilter::AuthUserId(auth_user_id))
        .await?;
    let status = AdminStatus::classify(records);
    tracing::info!("Admin status for {}: {}", auth_user_id, status);
    Ok(status)
}

/// Read a few rows to check the table and its columns are reachable
pub async fn schema_probe(client: &RestClient) -> Result<Vec<Value>> {
    let rows = client.probe_clients(PROBE_COLUMNS, PROBE_LIMIT).await?;
    tracing::debug!("Schema probe returned {} rows", rows.len());
    Ok(rows)
}
