//! Middleware that applies the route guard to protected routes.
//!
//! Flow Overview: resolve the browser scope, hydrate its store, redeem a
//! `?token=` magic link if one is present, then either forward the request with
//! a [`CurrentUser`] extension, redirect to sign-in, or answer with a loading
//! page. Cookies minted along the way are appended to whatever response wins.

use super::{
    cookies::{extract_cookie, resolve_scope, scope_cookie, session_cookie, SESSION_COOKIE_NAME},
    state::AppState,
    views,
};
use crate::auth::{
    guard::{self, GuardDecision},
    types::AuthUser,
};
use axum::{
    extract::{Extension, Request},
    http::{header::SET_COOKIE, HeaderValue, Uri},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

/// The user a guarded request was allowed for.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: AuthUser,
    pub scope: String,
    /// Session token from the cookie, or the one just issued by a magic link.
    pub session_token: Option<String>,
}

pub async fn require_auth(
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let scope = resolve_scope(request.headers());
    let mut store = state.store_for(&scope.id);
    store.initialize();

    let token = magic_link_token(request.uri());
    let outcome = guard::run(state.service(), &mut store, token.as_deref()).await;

    let mut cookies: Vec<HeaderValue> = Vec::new();
    if scope.is_new {
        match scope_cookie(state.config(), &scope) {
            Ok(cookie) => cookies.push(cookie),
            Err(err) => error!("Failed to build scope cookie: {err}"),
        }
    }

    let issued_token = outcome.session.map(|session| session.token);
    if let Some(token) = &issued_token {
        match session_cookie(state.config(), token) {
            Ok(cookie) => cookies.push(cookie),
            Err(err) => error!("Failed to build session cookie: {err}"),
        }
    }

    let mut response = match outcome.decision {
        GuardDecision::Allow(user) => {
            let session_token =
                issued_token.or_else(|| extract_cookie(request.headers(), SESSION_COOKIE_NAME));
            request.extensions_mut().insert(CurrentUser {
                user,
                scope: scope.id,
                session_token,
            });
            next.run(request).await
        }
        GuardDecision::Redirect(path) => {
            debug!("No session for scope, redirecting to {path}");
            Redirect::to(path).into_response()
        }
        GuardDecision::Pending => Html(views::loading_page()).into_response(),
    };

    for cookie in cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }

    response
}

fn magic_link_token(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}
