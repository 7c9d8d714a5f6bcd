pub mod health;
pub mod home;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

// common functions for the handlers
use super::{
    cookies::{resolve_scope, scope_cookie, session_cookie},
    state::AppState,
};
use crate::auth::{
    service::ServiceError,
    storage::StorageError,
    types::{AuthUser, ServiceErrors, Session},
};
use axum::{
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::error;

/// Form body shared by sign-in and sign-up.
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    password: String,
}

impl Credentials {
    /// Moves the password out of the form so only the secret wrapper holds it.
    pub fn into_parts(self) -> (String, SecretString) {
        (self.email, SecretString::from(self.password))
    }
}

/// Pretty-printed error payload for display.
pub(crate) fn render_errors(errors: &ServiceErrors) -> String {
    serde_json::to_string_pretty(errors).unwrap_or_else(|err| {
        error!("Failed to serialize error payload: {err}");
        "Unexpected error".to_string()
    })
}

/// HTTP status for a page re-rendered after a failed service call.
pub(crate) fn error_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Rejected(errors) => {
            match errors
                .status
                .and_then(|status| StatusCode::from_u16(status).ok())
            {
                Some(status) if status.is_client_error() => status,
                // The browser did nothing wrong when the service itself failed.
                Some(status) if status.is_server_error() => StatusCode::BAD_GATEWAY,
                _ => StatusCode::BAD_REQUEST,
            }
        }
        ServiceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ServiceError::Network(_) | ServiceError::Parse(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Adopts a freshly signed-in user into the requesting browser's store and
/// returns the cookies that bind the browser to it.
pub(crate) fn adopt_session(
    state: &AppState,
    headers: &HeaderMap,
    user: AuthUser,
    session: &Session,
) -> Result<Vec<HeaderValue>, StorageError> {
    let scope = resolve_scope(headers);
    let mut store = state.store_for(&scope.id);
    store.set(Some(user))?;

    let mut cookies = Vec::with_capacity(2);
    if scope.is_new {
        match scope_cookie(state.config(), &scope) {
            Ok(cookie) => cookies.push(cookie),
            Err(err) => error!("Failed to build scope cookie: {err}"),
        }
    }
    match session_cookie(state.config(), &session.token) {
        Ok(cookie) => cookies.push(cookie),
        Err(err) => error!("Failed to build session cookie: {err}"),
    }

    Ok(cookies)
}

pub(crate) fn with_cookies(mut response: Response, cookies: Vec<HeaderValue>) -> Response {
    for cookie in cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_keeps_client_errors_from_service() {
        let err = ServiceError::Rejected(ServiceErrors::from_message(Some(401), "nope"));
        assert_eq!(error_status(&err), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn error_status_maps_service_side_failures_to_bad_gateway() {
        let err = ServiceError::Rejected(ServiceErrors::from_message(Some(500), "boom"));
        assert_eq!(error_status(&err), StatusCode::BAD_GATEWAY);
        let err = ServiceError::Rejected(ServiceErrors::from_message(Some(503), "busy"));
        assert_eq!(error_status(&err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn error_status_without_usable_status_is_bad_request() {
        let err = ServiceError::Rejected(ServiceErrors::default());
        assert_eq!(error_status(&err), StatusCode::BAD_REQUEST);
        let err = ServiceError::Rejected(ServiceErrors::from_message(Some(302), "moved"));
        assert_eq!(error_status(&err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn error_status_maps_transport_failures() {
        assert_eq!(
            error_status(&ServiceError::Timeout("slow".to_string())),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            error_status(&ServiceError::Network("down".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn render_errors_is_pretty_json() {
        let rendered = render_errors(&ServiceErrors::from_message(Some(401), "nope"));
        assert!(rendered.contains("\"status\": 401"));
        assert!(rendered.contains("\"message\": \"nope\""));
    }
}
