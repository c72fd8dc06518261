//! HTTP client for the hosted auth and REST endpoints

use crate::{
    auth::ApiKey,
    types::{AuthUser, ClientFilter, PasswordGrant, RpcResponse, Session},
    Error, Result,
};
use adminfix_core::models::{ClientPatch, ClientRecord, NewClient};
use reqwest::{header::AUTHORIZATION, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

const CLIENTS_PATH: &str = "/rest/v1/clients";
const EXEC_SQL_PATH: &str = "/rest/v1/rpc/exec_sql";

pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    access_token: Option<String>,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, api_key: ApiKey, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            access_token: None,
        })
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Use the session's bearer token for subsequent calls
    pub fn set_session(&mut self, session: &Session) {
        self.access_token = Some(session.access_token.clone());
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorization(&self) -> String {
        match self.access_token {
            Some(ref token) => format!("Bearer {}", token),
            None => self.api_key.to_bearer(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("apikey", self.api_key.expose())
            .header(AUTHORIZATION, self.authorization())
    }

    // Auth

    /// Password grant sign-in.
    ///
    /// The token response is never logged; only its status and the redacted
    /// session are.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .http
            .post(self.url("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", self.api_key.expose())
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("sign in status: {}", status.as_u16());
        if status != StatusCode::OK {
            tracing::debug!("sign in response: {}", body);
            return Err(Error::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let session: Session = serde_json::from_str(&body)?;
        tracing::debug!("sign in session: {:?}", session);
        Ok(session)
    }

    /// The user owning the current session
    pub async fn current_user(&self) -> Result<AuthUser> {
        let response = self.request(Method::GET, "/auth/v1/user").send().await?;
        let body = expect_status(response, "user info", &[StatusCode::OK]).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn sign_out(&self) -> Result<()> {
        let response = self.request(Method::POST, "/auth/v1/logout").send().await?;
        let (status, body) = read_body(response, "sign out").await?;
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    // Clients table

    /// All rows matching `filter`
    pub async fn select_clients(&self, filter: &ClientFilter) -> Result<Vec<ClientRecord>> {
        let (column, operand) = filter.to_query();
        let response = self
            .request(Method::GET, CLIENTS_PATH)
            .query(&[("select", "*"), (column, operand.as_str())])
            .send()
            .await?;

        let body = expect_status(response, "select clients", &[StatusCode::OK]).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Number of rows matching `filter` visible to the caller
    pub async fn count_clients(&self, filter: &ClientFilter) -> Result<usize> {
        let (column, operand) = filter.to_query();
        let response = self
            .request(Method::GET, CLIENTS_PATH)
            .query(&[("select", "id"), (column, operand.as_str())])
            .send()
            .await?;

        let body = expect_status(response, "count clients", &[StatusCode::OK]).await?;
        let rows: Vec<Value> = serde_json::from_str(&body)?;
        Ok(rows.len())
    }

    /// Raw rows with only `columns`, used to check the table is reachable
    pub async fn probe_clients(&self, columns: &str, limit: usize) -> Result<Vec<Value>> {
        let limit = limit.to_string();
        let response = self
            .request(Method::GET, CLIENTS_PATH)
            .query(&[("select", columns), ("limit", limit.as_str())])
            .send()
            .await?;

        let body = expect_status(response, "probe clients", &[StatusCode::OK]).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn insert_client(&self, client: &NewClient) -> Result<ClientRecord> {
        client.validate()?;

        let response = self
            .request(Method::POST, CLIENTS_PATH)
            .header("Prefer", "return=representation")
            .json(client)
            .send()
            .await?;

        let body = expect_status(response, "create client", &[StatusCode::CREATED]).await?;
        let mut rows: Vec<ClientRecord> = serde_json::from_str(&body)?;
        if rows.is_empty() {
            return Err(Error::UnexpectedResponse(
                "insert returned no rows".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    /// Patch matching rows and return them as written
    pub async fn update_clients(
        &self,
        filter: &ClientFilter,
        patch: &ClientPatch,
    ) -> Result<Vec<ClientRecord>> {
        let (column, operand) = filter.to_query();
        let response = self
            .request(Method::PATCH, CLIENTS_PATH)
            .query(&[(column, operand.as_str())])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;

        let body = expect_status(response, "update client", &[StatusCode::OK]).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Delete matching rows. Returns how many were removed, or `None` when
    /// the server answers without a body.
    pub async fn delete_clients(&self, filter: &ClientFilter) -> Result<Option<usize>> {
        let (column, operand) = filter.to_query();
        let response = self
            .request(Method::DELETE, CLIENTS_PATH)
            .query(&[(column, operand.as_str())])
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let body = expect_status(
            response,
            "delete clients",
            &[StatusCode::OK, StatusCode::NO_CONTENT],
        )
        .await?;

        if body.trim().is_empty() {
            return Ok(None);
        }
        let rows: Vec<Value> = serde_json::from_str(&body)?;
        Ok(Some(rows.len()))
    }

    // RPC

    /// Run one SQL statement through the `exec_sql` function.
    ///
    /// Any HTTP status is returned to the caller; only transport failures are
    /// errors.
    pub async fn exec_sql(&self, sql: &str) -> Result<RpcResponse> {
        let response = self
            .request(Method::POST, EXEC_SQL_PATH)
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "sql": sql }))
            .send()
            .await?;

        let (status, body) = read_body(response, "exec_sql").await?;
        Ok(RpcResponse {
            status: status.as_u16(),
            body,
        })
    }
}

async fn read_body(response: Response, what: &str) -> Result<(StatusCode, String)> {
    let status = response.status();
    let body = response.text().await?;
    tracing::debug!("{} status: {}", what, status.as_u16());
    tracing::debug!("{} response: {}", what, body);
    Ok((status, body))
}

async fn expect_status(response: Response, what: &str, expected: &[StatusCode]) -> Result<String> {
    let (status, body) = read_body(response, what).await?;
    if !expected.contains(&status) {
        tracing::warn!("{} failed with status {}", what, status.as_u16());
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}
