//! Cookie helpers for the session token and the browser storage scope.
//!
//! Both cookies are `HttpOnly; SameSite=Lax` and only marked `Secure` when the
//! front end is served over HTTPS.

use super::state::GatewayConfig;
use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use ulid::Ulid;

pub const SESSION_COOKIE_NAME: &str = "session_token";
pub const SCOPE_COOKIE_NAME: &str = "sessiongate_sid";

/// Storage scope of the requesting browser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserScope {
    pub id: String,
    /// True when the scope was minted for this request and still needs a cookie.
    pub is_new: bool,
}

/// Reads the scope cookie, minting a new ULID when it is missing or malformed.
#[must_use]
pub fn resolve_scope(headers: &HeaderMap) -> BrowserScope {
    match extract_cookie(headers, SCOPE_COOKIE_NAME)
        .and_then(|value| Ulid::from_string(&value).ok())
    {
        Some(scope) => BrowserScope {
            id: scope.to_string(),
            is_new: false,
        },
        None => BrowserScope {
            id: Ulid::new().to_string(),
            is_new: true,
        },
    }
}

#[must_use]
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == name && !val.trim().is_empty()).then(|| val.trim().to_string())
        })
}

/// Build a secure `HttpOnly` cookie for the session token.
///
/// # Errors
/// Returns an error if the token contains characters not allowed in headers.
pub fn session_cookie(
    config: &GatewayConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(config, SESSION_COOKIE_NAME, token, config.session_ttl_seconds())
}

/// Expire the session cookie.
///
/// # Errors
/// Returns an error if the header value cannot be built.
pub fn clear_session_cookie(config: &GatewayConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(config, SESSION_COOKIE_NAME, "", 0)
}

/// Cookie binding the browser to its storage scope.
///
/// # Errors
/// Returns an error if the header value cannot be built.
pub fn scope_cookie(
    config: &GatewayConfig,
    scope: &BrowserScope,
) -> Result<HeaderValue, InvalidHeaderValue> {
    cookie(
        config,
        SCOPE_COOKIE_NAME,
        &scope.id,
        config.session_ttl_seconds(),
    )
}

fn cookie(
    config: &GatewayConfig,
    name: &str,
    value: &str,
    max_age: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}
