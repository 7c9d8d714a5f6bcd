//! Sign-out: the only way a session ends from this front end.

use crate::{
    api::{
        cookies::{clear_session_cookie, extract_cookie, resolve_scope, SESSION_COOKIE_NAME},
        state::AppState,
    },
    auth::guard::SIGN_IN_PATH,
};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{error, info};

#[utoipa::path(
    post,
    path = "/api/auth/signOut",
    responses(
        (status = 303, description = "Session cleared, redirect to the sign-in page")
    ),
    tag = "auth"
)]
pub async fn sign_out(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    if let Some(token) = extract_cookie(&headers, SESSION_COOKIE_NAME) {
        // Local state is cleared even if the service call fails.
        if let Err(err) = state.service().sign_out(&token).await {
            error!("Failed to sign out at the auth service: {err}");
        }
    }

    let scope = resolve_scope(&headers);
    if !scope.is_new {
        let mut store = state.store_for(&scope.id);
        if let Err(err) = store.set(None) {
            error!("Failed to clear persisted user: {err}");
        }
    }

    info!("User signed out");

    let mut response = Redirect::to(SIGN_IN_PATH).into_response();
    match clear_session_cookie(state.config()) {
        Ok(cookie) => {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
    response
}
