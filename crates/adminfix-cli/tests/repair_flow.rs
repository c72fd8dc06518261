use adminfix_cli::{
    apply_sql, reinsert, repair, AdminSession, Error, RepairOptions, RepairOutcome,
};
use adminfix_core::models::{AdminStatus, Config, RepairAction, Role};
use adminfix_rest::{ApiKey, Credentials, ExplicitCredentials, MemoryStore, RestClient};
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::{json, Value};
use std::time::Duration;

const USER_ID: &str = "5a236bf5-65e1-4a4c-bed4-df065c093e13";
const ROW_ID: &str = "0b8a2c38-96a4-4c1f-9d0e-2f6f3d6b7c11";
const EMAIL: &str = "admin@example.com";
const TOKEN: &str = "user-token";

fn credentials() -> Credentials {
    Credentials::resolve(
        ExplicitCredentials {
            api_key: Some("anon-key".to_string()),
            email: Some(EMAIL.to_string()),
            password: Some("correct horse".to_string()),
        },
        &MemoryStore::default(),
        &Config::default(),
    )
    .unwrap()
}

fn rest_client(server: &MockServer) -> RestClient {
    RestClient::new(
        server.base_url(),
        credentials().api_key,
        Duration::from_secs(5),
    )
    .unwrap()
}

fn options() -> RepairOptions {
    RepairOptions {
        email: EMAIL.to_string(),
        full_name: "Site Admin".to_string(),
        dry_run: false,
    }
}

fn row(role: &str) -> Value {
    json!({
        "id": ROW_ID,
        "auth_user_id": USER_ID,
        "email": EMAIL,
        "full_name": "Site Admin",
        "role": role,
        "created_at": "2025-01-02T03:04:05+00:00"
    })
}

/// Mocks for sign-in, user lookup and sign-out
async fn mock_auth(server: &MockServer) -> httpmock::Mock<'_> {
    let sign_in = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/v1/token")
                .query_param("grant_type", "password")
                .header("apikey", "anon-key")
                .json_body(json!({"email": EMAIL, "password": "correct horse"}));
            then.status(200).json_body(json!({
                "access_token": TOKEN,
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "refresh",
                "user": {"id": USER_ID, "email": EMAIL}
            }));
        })
        .await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/auth/v1/user")
                .header("authorization", format!("Bearer {}", TOKEN));
            then.status(200)
                .json_body(json!({"id": USER_ID, "email": EMAIL, "role": "authenticated"}));
        })
        .await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/v1/logout");
            then.status(204);
        })
        .await;

    sign_in
}

async fn mock_select(server: &MockServer, rows: Value) -> httpmock::Mock<'_> {
    server
        .mock_async(move |when, then| {
            when.method(GET)
                .path("/rest/v1/clients")
                .query_param("select", "*")
                .query_param("auth_user_id", format!("eq.{}", USER_ID))
                .header("authorization", format!("Bearer {}", TOKEN));
            then.status(200).json_body(rows);
        })
        .await
}

async fn mock_count(server: &MockServer, rows: usize) -> httpmock::Mock<'_> {
    let ids: Vec<Value> = (0..rows).map(|_| json!({"id": ROW_ID})).collect();
    server
        .mock_async(move |when, then| {
            when.method(GET)
                .path("/rest/v1/clients")
                .query_param("select", "id")
                .query_param("auth_user_id", format!("eq.{}", USER_ID));
            then.status(200).json_body(json!(ids));
        })
        .await
}

async fn mock_delete(server: &MockServer, status: u16, body: Option<Value>) -> httpmock::Mock<'_> {
    server
        .mock_async(move |when, then| {
            when.method(DELETE)
                .path("/rest/v1/clients")
                .query_param("auth_user_id", format!("eq.{}", USER_ID));
            let then = then.status(status);
            if let Some(body) = body {
                then.json_body(body);
            }
        })
        .await
}

async fn mock_insert(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/clients")
                .header("prefer", "return=representation")
                .json_body(json!({
                    "auth_user_id": USER_ID,
                    "email": EMAIL,
                    "full_name": "Site Admin",
                    "role": "admin"
                }));
            then.status(201).json_body(json!([row("admin")]));
        })
        .await
}

async fn mock_patch(server: &MockServer, response: Value) -> httpmock::Mock<'_> {
    server
        .mock_async(move |when, then| {
            when.method(PATCH)
                .path("/rest/v1/clients")
                .query_param("id", format!("eq.{}", ROW_ID))
                .json_body(json!({"role": "admin", "full_name": "Site Admin"}));
            then.status(200).json_body(response);
        })
        .await
}

async fn open_session(server: &MockServer) -> AdminSession {
    AdminSession::open(rest_client(server), &credentials())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_missing_record_is_created() {
    let server = MockServer::start_async().await;
    let sign_in = mock_auth(&server).await;
    let select = mock_select(&server, json!([])).await;
    let insert = mock_insert(&server).await;
    let patch = mock_patch(&server, json!([row("admin")])).await;

    let session = open_session(&server).await;
    assert_eq!(session.user.id.to_string(), USER_ID);

    let outcome = repair(&session.client, &session.user, &options())
        .await
        .unwrap();
    session.close().await;

    match outcome {
        RepairOutcome::Created { record } => assert_eq!(record.role, Role::Admin),
        other => panic!("unexpected outcome: {:?}", other),
    }
    sign_in.assert_async().await;
    select.assert_async().await;
    insert.assert_async().await;
    assert_eq!(patch.hits_async().await, 0);
}

#[tokio::test]
async fn test_wrong_role_is_promoted() {
    let server = MockServer::start_async().await;
    mock_auth(&server).await;
    mock_select(&server, json!([row("student")])).await;
    let insert = mock_insert(&server).await;
    let patch = mock_patch(&server, json!([row("admin")])).await;

    let session = open_session(&server).await;
    let outcome = repair(&session.client, &session.user, &options())
        .await
        .unwrap();

    match outcome {
        RepairOutcome::Promoted { previous, record } => {
            assert_eq!(previous, Role::Student);
            assert_eq!(record.role, Role::Admin);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    patch.assert_async().await;
    assert_eq!(insert.hits_async().await, 0);
}

#[tokio::test]
async fn test_healthy_record_is_left_alone() {
    let server = MockServer::start_async().await;
    mock_auth(&server).await;
    mock_select(&server, json!([row("admin")])).await;
    let insert = mock_insert(&server).await;
    let patch = mock_patch(&server, json!([row("admin")])).await;

    let session = open_session(&server).await;
    let outcome = repair(&session.client, &session.user, &options())
        .await
        .unwrap();

    assert!(matches!(outcome, RepairOutcome::AlreadyAdmin { .. }));
    assert_eq!(insert.hits_async().await, 0);
    assert_eq!(patch.hits_async().await, 0);
}

#[tokio::test]
async fn test_dry_run_does_not_write() {
    let server = MockServer::start_async().await;
    mock_auth(&server).await;
    mock_select(&server, json!([row("workforce")])).await;
    let patch = mock_patch(&server, json!([row("admin")])).await;

    let session = open_session(&server).await;
    let dry_run = RepairOptions {
        dry_run: true,
        ..options()
    };
    let outcome = repair(&session.client, &session.user, &dry_run)
        .await
        .unwrap();

    match outcome {
        RepairOutcome::Planned { status, action } => {
            assert!(matches!(status, AdminStatus::WrongRole { .. }));
            assert!(matches!(action, RepairAction::Promote { id: Some(_) }));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(patch.hits_async().await, 0);
}

#[tokio::test]
async fn test_update_hidden_by_row_level_security() {
    let server = MockServer::start_async().await;
    mock_auth(&server).await;
    mock_select(&server, json!([row("student")])).await;
    mock_patch(&server, json!([])).await;

    let session = open_session(&server).await;
    let err = repair(&session.client, &session.user, &options())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotConverged(_)));
}

#[tokio::test]
async fn test_duplicates_are_refused() {
    let server = MockServer::start_async().await;
    mock_auth(&server).await;
    mock_select(&server, json!([row("admin"), row("student")])).await;
    let insert = mock_insert(&server).await;

    let session = open_session(&server).await;
    let err = repair(&session.client, &session.user, &options())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Ambiguous(2)));
    assert_eq!(insert.hits_async().await, 0);
}

#[tokio::test]
async fn test_failed_sign_in_stops_before_table_calls() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/v1/token");
            then.status(400)
                .json_body(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"}));
        })
        .await;
    let select = mock_select(&server, json!([])).await;

    let result = AdminSession::open(rest_client(&server), &credentials()).await;
    let err = match result {
        Ok(_) => panic!("sign in should fail"),
        Err(e) => e,
    };

    match err {
        Error::Rest(ref rest) => assert_eq!(rest.status(), Some(400)),
        ref other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("Invalid login credentials"));
    assert_eq!(select.hits_async().await, 0);
}

#[tokio::test]
async fn test_wrong_role_without_id_is_promoted_by_auth_user() {
    let server = MockServer::start_async().await;
    mock_auth(&server).await;
    let mut without_id = row("student");
    without_id.as_object_mut().unwrap().remove("id");
    mock_select(&server, json!([without_id])).await;
    let by_id = mock_patch(&server, json!([row("admin")])).await;
    let by_user = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/rest/v1/clients")
                .query_param("auth_user_id", format!("eq.{}", USER_ID))
                .header("prefer", "return=representation")
                .json_body(json!({"role": "admin", "full_name": "Site Admin"}));
            then.status(200).json_body(json!([row("admin")]));
        })
        .await;

    let session = open_session(&server).await;
    let outcome = repair(&session.client, &session.user, &options())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        RepairOutcome::Promoted {
            previous: Role::Student,
            ..
        }
    ));
    by_user.assert_async().await;
    assert_eq!(by_id.hits_async().await, 0);
}

#[tokio::test]
async fn test_reinsert_deletes_then_inserts() {
    let server = MockServer::start_async().await;
    let sign_in = mock_auth(&server).await;
    mock_count(&server, 2).await;
    let delete = mock_delete(
        &server,
        200,
        Some(json!([row("student"), row("admin")])),
    )
    .await;
    let insert = mock_insert(&server).await;
    let select = mock_select(&server, json!([row("admin")])).await;

    let creds = credentials();
    let session = open_session(&server).await;
    let outcome = reinsert(&session.client, &session.user, &options())
        .await
        .unwrap();
    session.verify_login(&creds).await.unwrap();

    assert_eq!(outcome.existing, 2);
    assert_eq!(outcome.removed, Some(2));
    assert_eq!(outcome.record.role, Role::Admin);
    delete.assert_async().await;
    insert.assert_async().await;
    select.assert_async().await;
    assert_eq!(sign_in.hits_async().await, 2);
}

#[tokio::test]
async fn test_reinsert_stops_when_rows_survive_delete() {
    let server = MockServer::start_async().await;
    mock_auth(&server).await;
    mock_count(&server, 2).await;
    let delete = mock_delete(&server, 200, Some(json!([]))).await;
    let insert = mock_insert(&server).await;

    let session = open_session(&server).await;
    let err = reinsert(&session.client, &session.user, &options())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotConverged(_)));
    delete.assert_async().await;
    assert_eq!(insert.hits_async().await, 0);
}

#[tokio::test]
async fn test_reinsert_fails_when_duplicates_remain() {
    let server = MockServer::start_async().await;
    mock_auth(&server).await;
    mock_count(&server, 1).await;
    mock_delete(&server, 204, None).await;
    let insert = mock_insert(&server).await;
    mock_select(&server, json!([row("student"), row("admin")])).await;

    let session = open_session(&server).await;
    let err = reinsert(&session.client, &session.user, &options())
        .await
        .unwrap_err();

    match err {
        Error::NotConverged(message) => assert!(message.contains("2 client records")),
        other => panic!("unexpected error: {:?}", other),
    }
    insert.assert_async().await;
}

#[tokio::test]
async fn test_apply_sql_continues_after_failure() {
    let server = MockServer::start_async().await;
    let ok = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/rpc/exec_sql")
                .header("authorization", "Bearer anon-key")
                .json_body(json!({"sql": "DELETE FROM clients WHERE role = 'x';"}));
            then.status(200).body("null");
        })
        .await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/rpc/exec_sql")
                .json_body(json!({"sql": "ALTER TABLE clients DISABLE ROW LEVEL SECURITY;"}));
            then.status(401).body(r#"{"message":"permission denied"}"#);
        })
        .await;

    let client = RestClient::new(
        server.base_url(),
        ApiKey::new("anon-key").unwrap(),
        Duration::from_secs(5),
    )
    .unwrap();

    let statements = vec![
        "ALTER TABLE clients DISABLE ROW LEVEL SECURITY;".to_string(),
        "DELETE FROM clients WHERE role = 'x';".to_string(),
    ];
    let mut seen = Vec::new();
    let summary = apply_sql(&client, &statements, |i, outcome| {
        seen.push((i, outcome.status));
    })
    .await;

    assert_eq!(seen, vec![(1, Some(401)), (2, Some(200))]);
    assert_eq!(summary.total(), 2);
    assert_eq!(summary.succeeded(), 1);
    assert!(summary
        .failures()
        .all(|f| f.body.contains("permission denied")));
    ok.assert_async().await;
    rejected.assert_async().await;
}
