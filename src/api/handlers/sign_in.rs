//! Email and password sign-in page.

use super::{adopt_session, error_status, render_errors, with_cookies, Credentials};
use crate::{
    api::{state::AppState, views},
    auth::{
        service::ServiceError,
        types::{AuthGrant, ServiceErrors},
    },
};
use axum::{
    extract::{Extension, Form},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, error, info};

pub async fn form() -> Html<String> {
    Html(views::sign_in_page("", None))
}

pub async fn sign_in(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Form(credentials): Form<Credentials>,
) -> Response {
    let (email, password) = credentials.into_parts();
    let grant = match state.service().sign_in_with_email(&email, &password).await {
        Ok(grant) => grant,
        Err(err) => {
            debug!("Sign-in failed: {err}");
            return failure(&email, error_status(&err), &err.payload());
        }
    };

    let AuthGrant {
        user: Some(user),
        session: Some(session),
    } = grant
    else {
        let err = ServiceError::Parse("Sign-in response did not include a session".to_string());
        error!("{err}");
        return failure(&email, StatusCode::BAD_GATEWAY, &err.payload());
    };

    match adopt_session(&state, &headers, user, &session) {
        Ok(cookies) => {
            info!("User signed in");
            with_cookies(Redirect::to("/").into_response(), cookies)
        }
        Err(err) => {
            error!("Failed to persist signed-in user: {err}");
            let payload = ServiceErrors::from_message(
                Some(StatusCode::INTERNAL_SERVER_ERROR.as_u16()),
                "Could not store the session, please try again",
            );
            failure(&email, StatusCode::INTERNAL_SERVER_ERROR, &payload)
        }
    }
}

fn failure(email: &str, status: StatusCode, errors: &ServiceErrors) -> Response {
    let page = views::sign_in_page(email, Some(&render_errors(errors)));
    (status, Html(page)).into_response()
}
