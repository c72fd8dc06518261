//! Applying a SQL script through the `exec_sql` RPC

use crate::Result;
use adminfix_core::sql::split_statements;
use adminfix_rest::RestClient;
use std::path::Path;

/// Result of one statement
#[derive(Debug, Clone, PartialEq)]
pub struct StatementOutcome {
    pub statement: String,
    /// `None` when the request never got an answer
    pub status: Option<u16>,
    pub body: String,
}

impl StatementOutcome {
    pub fn is_success(&self) -> bool {
        self.status == Some(200)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlSummary {
    pub outcomes: Vec<StatementOutcome>,
}

impl SqlSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &StatementOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded() == self.total()
    }
}

pub fn load_statements(path: &Path) -> Result<Vec<String>> {
    let script = std::fs::read_to_string(path)?;
    Ok(split_statements(&script))
}

/// Run every statement in order. A failed statement does not stop the run.
///
/// `on_outcome` is called after each statement with its 1-based index.
pub async fn apply_sql<F>(
    client: &RestClient,
    statements: &[String],
    mut on_outcome: F,
) -> SqlSummary
where
    F: FnMut(usize, &StatementOutcome),
{
    if !client.api_key().is_service_key() {
        tracing::warn!("API key is not a service key; exec_sql is likely to be rejected");
    }

    let mut summary = SqlSummary::default();
    for (i, statement) in statements.iter().enumerate() {
        let outcome = match client.exec_sql(statement).await {
            Ok(response) => StatementOutcome {
                statement: statement.clone(),
                status: Some(response.status),
                body: response.body,
            },
            Err(e) => {
                tracing::error!("Statement {} failed to send: {}", i + 1, e);
                StatementOutcome {
                    statement: statement.clone(),
                    status: None,
                    body: e.to_string(),
                }
            }
        };
        on_outcome(i + 1, &outcome);
        summary.outcomes.push(outcome);
    }

    tracing::info!(
        "Applied SQL: {}/{} statements succeeded",
        summary.succeeded(),
        summary.total()
    );
    summary
}
