//! Account creation page. When the service skips email verification and
//! returns a session right away, the new user is signed in immediately.

use super::{adopt_session, error_status, render_errors, with_cookies, Credentials};
use crate::{
    api::{state::AppState, views},
    auth::types::{AuthGrant, ServiceErrors},
};
use axum::{
    extract::{Extension, Form},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, info};

pub async fn form() -> Html<String> {
    Html(views::sign_up_page("", None, None))
}

pub async fn sign_up(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Form(credentials): Form<Credentials>,
) -> Response {
    let (email, password) = credentials.into_parts();
    let grant = match state.service().sign_up_with_email(&email, &password).await {
        Ok(grant) => grant,
        Err(err) => {
            debug!("Sign-up failed: {err}");
            let page = views::sign_up_page(&email, None, Some(&render_errors(&err.payload())));
            return (error_status(&err), Html(page)).into_response();
        }
    };

    let cookies = match grant {
        AuthGrant {
            user: Some(user),
            session: Some(session),
        } => match adopt_session(&state, &headers, user, &session) {
            Ok(cookies) => cookies,
            Err(err) => {
                error!("Failed to persist new user: {err}");
                let payload = ServiceErrors::from_message(
                    Some(StatusCode::INTERNAL_SERVER_ERROR.as_u16()),
                    "Account created, but the session could not be stored. Please sign in.",
                );
                let page = views::sign_up_page(&email, None, Some(&render_errors(&payload)));
                return (StatusCode::INTERNAL_SERVER_ERROR, Html(page)).into_response();
            }
        },
        _ => Vec::new(),
    };

    info!("User signed up");
    let message = format!("We sent a verification link to {email}");
    let page = views::sign_up_page("", Some(&message), None);
    with_cookies(Html(page).into_response(), cookies)
}
