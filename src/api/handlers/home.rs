//! Home page for signed-in users: profile plus every active session.

use crate::{
    api::{cookies::clear_session_cookie, guard::CurrentUser, state::AppState, views},
    auth::{guard::SIGN_IN_PATH, service::mark_current},
};
use axum::{
    extract::Extension,
    http::header::SET_COOKIE,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub async fn home(
    Extension(state): Extension<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    let Some(token) = current.session_token.as_deref() else {
        return Html(views::home_page(&current.user, &[])).into_response();
    };

    // The service is the source of truth for the profile. The stored copy only
    // covers for a service that cannot be reached.
    let user = match state.service().get_user_by_session(token).await {
        Ok(Some(user)) => user,
        Ok(None) => return revoked(&state, &current),
        Err(err) => {
            warn!("Failed to refresh user profile: {err}");
            current.user.clone()
        }
    };

    let sessions = match state.service().get_all_sessions(token).await {
        Ok(sessions) => mark_current(sessions, token),
        Err(err) => {
            warn!("Failed to list sessions: {err}");
            Vec::new()
        }
    };

    Html(views::home_page(&user, &sessions)).into_response()
}

/// The service no longer knows the session: forget the user and start over.
fn revoked(state: &AppState, current: &CurrentUser) -> Response {
    info!("Session is no longer valid, signing out locally");

    let mut store = state.store_for(&current.scope);
    if let Err(err) = store.set(None) {
        error!("Failed to clear persisted user: {err}");
    }

    let mut response = Redirect::to(SIGN_IN_PATH).into_response();
    match clear_session_cookie(state.config()) {
        Ok(cookie) => {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
    response
}
