//! Call contract of the external auth service.
//!
//! Handlers and the route guard only see [`AuthService`], so the HTTP client
//! can be swapped for an in-process fake in tests.

use crate::auth::types::{AuthGrant, AuthUser, ServiceErrors, Session};
use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;

#[derive(Clone, Debug)]
pub enum ServiceError {
    /// The service answered and refused the request (bad credentials, expired token, ...).
    Rejected(ServiceErrors),
    Network(String),
    Timeout(String),
    Parse(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Rejected(errors) => {
                let status = errors
                    .status
                    .map_or_else(|| "unknown".to_string(), |status| status.to_string());
                let message = errors
                    .items
                    .iter()
                    .find_map(|item| item.message.as_deref())
                    .or(errors.status_text.as_deref())
                    .unwrap_or("no details");
                write!(formatter, "Rejected by auth service ({status}): {message}")
            }
            ServiceError::Network(message) => write!(formatter, "Network error: {message}"),
            ServiceError::Timeout(message) => write!(formatter, "Timeout: {message}"),
            ServiceError::Parse(message) => write!(formatter, "Response error: {message}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    /// Error payload to show the user, in the shape the service reports it.
    #[must_use]
    pub fn payload(&self) -> ServiceErrors {
        match self {
            ServiceError::Rejected(errors) => errors.clone(),
            ServiceError::Network(_) | ServiceError::Timeout(_) | ServiceError::Parse(_) => {
                ServiceErrors::from_message(None, self.to_string())
            }
        }
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Signs in with email and password.
    async fn sign_in_with_email(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthGrant, ServiceError>;

    /// Creates an account. The grant is empty when email verification is pending.
    async fn sign_up_with_email(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthGrant, ServiceError>;

    /// Redeems a magic-link token.
    async fn get_auth_grant(&self, token: &str) -> Result<AuthGrant, ServiceError>;

    /// Invalidates the session identified by `session_token`.
    async fn sign_out(&self, session_token: &str) -> Result<(), ServiceError>;

    /// Lists every session of the user owning `session_token`.
    async fn get_all_sessions(&self, session_token: &str) -> Result<Vec<Session>, ServiceError>;

    /// Looks the user up by session token; `None` when the session is unknown.
    async fn get_user_by_session(
        &self,
        session_token: &str,
    ) -> Result<Option<AuthUser>, ServiceError>;
}

/// Flags the session whose token matches the browser's session cookie.
#[must_use]
pub fn mark_current(sessions: Vec<Session>, current_token: &str) -> Vec<Session> {
    sessions
        .into_iter()
        .map(|mut session| {
            session.is_current = session.token == current_token;
            session
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::ErrorItem;

    #[test]
    fn mark_current_flags_only_matching_token() {
        let sessions = vec![Session::new("a"), Session::new("b"), Session::new("c")];
        let marked = mark_current(sessions, "b");

        let flags: Vec<bool> = marked.iter().map(|session| session.is_current).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn mark_current_without_match_flags_nothing() {
        let marked = mark_current(vec![Session::new("a")], "zzz");
        assert!(!marked[0].is_current);
    }

    #[test]
    fn rejected_payload_is_passed_through() {
        let errors = ServiceErrors {
            status: Some(401),
            status_text: Some("Unauthorized".to_string()),
            items: vec![ErrorItem {
                message: Some("Email or password is incorrect".to_string()),
                ..ErrorItem::default()
            }],
        };
        let err = ServiceError::Rejected(errors.clone());

        assert_eq!(err.payload(), errors);
        assert_eq!(
            err.to_string(),
            "Rejected by auth service (401): Email or password is incorrect"
        );
    }

    #[test]
    fn transport_errors_become_single_item_payloads() {
        let err = ServiceError::Timeout("request took too long".to_string());
        let payload = err.payload();

        assert_eq!(payload.status, None);
        assert_eq!(payload.items.len(), 1);
        assert_eq!(
            payload.items[0].message.as_deref(),
            Some("Timeout: request took too long")
        );
    }
}
