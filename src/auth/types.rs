//! Payloads exchanged with the auth service. User records and session tokens
//! are credentials-adjacent, so they must never be logged in full.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Public profile of the signed-in user.
///
/// The service owns the schema, so the record is kept as an opaque JSON object
/// and only a couple of well-known attributes get accessors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthUser(Map<String, Value>);

impl AuthUser {
    #[must_use]
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get("_id").and_then(Value::as_str)
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }

    #[must_use]
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for AuthUser {
    fn from(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }
}

/// A session issued by the auth service.
///
/// `is_current` is never sent by the service; it is computed locally by
/// comparing the token with the browser's session cookie.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    #[serde(default)]
    pub creation_dtm: Option<String>,
    #[serde(default)]
    pub user_agent: Option<Value>,
    #[serde(default, skip_deserializing)]
    pub is_current: bool,
}

impl Session {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            creation_dtm: None,
            user_agent: None,
            is_current: false,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"***")
            .field("creation_dtm", &self.creation_dtm)
            .field("user_agent", &self.user_agent)
            .field("is_current", &self.is_current)
            .finish()
    }
}

/// Result of a sign-in, sign-up or magic-link exchange.
///
/// Sign-up may return neither field when the service requires email
/// verification first; an empty grant means "no user".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthGrant {
    #[serde(default)]
    pub user: Option<AuthUser>,
    #[serde(default)]
    pub session: Option<Session>,
}

/// Error payload reported by the auth service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceErrors {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub items: Vec<ErrorItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorItem {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

impl ServiceErrors {
    /// Builds a payload carrying a single message, used for local failures that
    /// still need to be shown in the same shape as service errors.
    #[must_use]
    pub fn from_message(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            status_text: None,
            items: vec![ErrorItem {
                origin: Some("client_error".to_string()),
                code: None,
                message: Some(message.into()),
                details: None,
            }],
        }
    }
}
