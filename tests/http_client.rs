//! `HttpAuthService` against an in-process mock of the auth service REST API.

use anyhow::{Context, Result};
use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use sessiongate::auth::{
    client::HttpAuthService,
    service::{AuthService, ServiceError},
};
use std::{collections::HashMap, time::Duration};
use tokio::net::TcpListener;
use url::Url;

const API_KEY: &str = "app-key-123";
const SESSION: &str = "tok-ada";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        == Some(API_KEY)
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers.get("session").and_then(|value| value.to_str().ok())
}

fn grant() -> Value {
    json!({
        "user": {"_id": "u-ada", "email": "ada@example.com"},
        "session": {"token": SESSION, "creationDtm": "2024-05-01T10:00:00Z"}
    })
}

async fn sign_in(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::FORBIDDEN, Json(json!({}))).into_response();
    }
    if body["email"] == "ada@example.com" && body["password"] == "secret" {
        Json(grant()).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "status": 401,
                "statusText": "Unauthorized",
                "items": [{"origin": "auth", "code": "invalid_credentials", "message": "Invalid email or password"}]
            })),
        )
            .into_response()
    }
}

async fn sign_up() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({}))
}

async fn auth_grant(Query(query): Query<HashMap<String, String>>) -> impl IntoResponse {
    match query.get("key").map(String::as_str) {
        Some("good") => Json(grant()).into_response(),
        Some("empty") => Json(json!({})).into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
    }
}

async fn sign_out(headers: HeaderMap) -> StatusCode {
    if session_header(&headers) == Some(SESSION) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::UNAUTHORIZED
    }
}

async fn sessions(headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) || session_header(&headers) != Some(SESSION) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([
        {"token": SESSION, "creationDtm": "2024-05-01T10:00:00Z", "isCurrent": true},
        {"token": "tok-laptop", "creationDtm": "2024-04-20T08:30:00Z", "userAgent": {"os": "linux"}}
    ]))
    .into_response()
}

async fn user(headers: HeaderMap) -> impl IntoResponse {
    match session_header(&headers) {
        Some(SESSION) => Json(grant()["user"].clone()).into_response(),
        Some(_) => StatusCode::UNAUTHORIZED.into_response(),
        None => (StatusCode::BAD_REQUEST, "missing session").into_response(),
    }
}

/// Serves the mock under a `/tenant` prefix and returns its base URL.
async fn spawn_mock() -> Result<Url> {
    let api = Router::new()
        .route("/_api/rest/v1/auth/signin-email", post(sign_in))
        .route("/_api/rest/v1/auth/signup-email", post(sign_up))
        .route("/_api/rest/v1/auth/grant", get(auth_grant))
        .route("/_api/rest/v1/auth/signout", post(sign_out))
        .route("/_api/rest/v1/auth/sessions", get(sessions))
        .route("/_api/rest/v1/auth/user", get(user));
    let app = Router::new().nest("/tenant", api);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind a local port")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(Url::parse(&format!("http://{addr}/tenant/"))?)
}

async fn client(timeout: Duration) -> Result<HttpAuthService> {
    let base = spawn_mock().await?;
    Ok(HttpAuthService::new(base, SecretString::from(API_KEY), timeout)?)
}

#[tokio::test]
async fn sign_in_sends_api_key_and_credentials() -> Result<()> {
    let service = client(Duration::from_secs(5)).await?;

    let grant = service
        .sign_in_with_email("ada@example.com", &SecretString::from("secret"))
        .await?;

    let user = grant.user.context("user missing")?;
    assert_eq!(user.id(), Some("u-ada"));
    assert_eq!(user.email(), Some("ada@example.com"));
    let session = grant.session.context("session missing")?;
    assert_eq!(session.token, SESSION);
    assert_eq!(session.creation_dtm.as_deref(), Some("2024-05-01T10:00:00Z"));
    Ok(())
}

#[tokio::test]
async fn rejection_keeps_service_error_payload() -> Result<()> {
    let service = client(Duration::from_secs(5)).await?;

    let result = service
        .sign_in_with_email("ada@example.com", &SecretString::from("wrong"))
        .await;

    let Err(ServiceError::Rejected(errors)) = result else {
        anyhow::bail!("expected a rejection, got {result:?}");
    };
    assert_eq!(errors.status, Some(401));
    assert_eq!(errors.status_text.as_deref(), Some("Unauthorized"));
    assert_eq!(errors.items.len(), 1);
    assert_eq!(
        errors.items[0].message.as_deref(),
        Some("Invalid email or password")
    );
    assert_eq!(errors.items[0].code.as_deref(), Some("invalid_credentials"));
    Ok(())
}

#[tokio::test]
async fn non_json_error_body_is_wrapped() -> Result<()> {
    let service = client(Duration::from_secs(5)).await?;

    let result = service.get_auth_grant("bogus").await;

    let Err(ServiceError::Rejected(errors)) = result else {
        anyhow::bail!("expected a rejection, got {result:?}");
    };
    assert_eq!(errors.status, Some(500));
    assert_eq!(
        errors.items.first().and_then(|item| item.message.as_deref()),
        Some("upstream exploded")
    );
    Ok(())
}

#[tokio::test]
async fn auth_grant_passes_token_as_key() -> Result<()> {
    let service = client(Duration::from_secs(5)).await?;

    let grant = service.get_auth_grant("good").await?;
    assert_eq!(
        grant.user.as_ref().and_then(|user| user.id()),
        Some("u-ada")
    );

    let empty = service.get_auth_grant("empty").await?;
    assert!(empty.user.is_none());
    assert!(empty.session.is_none());
    Ok(())
}

#[tokio::test]
async fn sessions_are_listed_with_session_header() -> Result<()> {
    let service = client(Duration::from_secs(5)).await?;

    let sessions = service.get_all_sessions(SESSION).await?;
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[1].token, "tok-laptop");
    // The current marker is computed locally, never trusted from the wire.
    assert!(sessions.iter().all(|session| !session.is_current));

    assert!(service.get_all_sessions("other").await.is_err());
    Ok(())
}

#[tokio::test]
async fn unknown_session_user_is_none() -> Result<()> {
    let service = client(Duration::from_secs(5)).await?;

    let user = service.get_user_by_session(SESSION).await?;
    assert_eq!(
        user.as_ref().and_then(|user| user.email()),
        Some("ada@example.com")
    );

    assert!(service.get_user_by_session("expired").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn sign_out_accepts_empty_success_body() -> Result<()> {
    let service = client(Duration::from_secs(5)).await?;

    service.sign_out(SESSION).await?;

    let result = service.sign_out("stale").await;
    assert!(matches!(result, Err(ServiceError::Rejected(_))));
    Ok(())
}

#[tokio::test]
async fn slow_service_times_out() -> Result<()> {
    let service = client(Duration::from_millis(200)).await?;

    let result = service
        .sign_up_with_email("grace@example.com", &SecretString::from("secret"))
        .await;

    assert!(
        matches!(result, Err(ServiceError::Timeout(_))),
        "expected a timeout, got {result:?}"
    );
    Ok(())
}
