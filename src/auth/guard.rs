//! Route guard state machine.
//!
//! `Start` looks at the incoming magic-link token and the store. A token with
//! no signed-in user moves to `TokenExchange`, which calls the service exactly
//! once and adopts whatever user it returns. Everything ends in `Resolved`,
//! where the store state alone picks the decision. There is no retry: a failed
//! or empty exchange is the same as "no user".

use crate::auth::{
    service::AuthService,
    store::{AuthState, AuthStore},
    types::{AuthUser, Session},
};
use tracing::{debug, error, warn};

pub const SIGN_IN_PATH: &str = "/sign-in";

#[derive(Clone, Debug, PartialEq)]
pub enum GuardDecision {
    Allow(AuthUser),
    Redirect(&'static str),
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardPhase<'a> {
    TokenExchange(&'a str),
    Resolved,
}

#[derive(Debug)]
pub struct GuardOutcome {
    pub decision: GuardDecision,
    /// Session issued by a successful magic-link exchange; the caller owns the cookie.
    pub session: Option<Session>,
}

/// Leaves `Start`: exchange only when a token is present and nobody is signed in.
#[must_use]
pub fn start<'a>(store: &AuthStore, token: Option<&'a str>) -> GuardPhase<'a> {
    match token.map(str::trim).filter(|token| !token.is_empty()) {
        Some(token) if store.get().is_none() => GuardPhase::TokenExchange(token),
        _ => GuardPhase::Resolved,
    }
}

/// Decision for a resolved store.
#[must_use]
pub fn decide(state: &AuthState) -> GuardDecision {
    match state {
        AuthState::SignedIn(user) => GuardDecision::Allow(user.clone()),
        AuthState::SignedOut => GuardDecision::Redirect(SIGN_IN_PATH),
        AuthState::Unresolved => GuardDecision::Pending,
    }
}

/// Runs the guard for one page activation.
pub async fn run(
    service: &dyn AuthService,
    store: &mut AuthStore,
    token: Option<&str>,
) -> GuardOutcome {
    let session = match start(store, token) {
        GuardPhase::TokenExchange(token) => exchange_token(service, store, token).await,
        GuardPhase::Resolved => None,
    };

    GuardOutcome {
        decision: decide(store.state()),
        session,
    }
}

async fn exchange_token(
    service: &dyn AuthService,
    store: &mut AuthStore,
    token: &str,
) -> Option<Session> {
    let grant = match service.get_auth_grant(token).await {
        Ok(grant) => grant,
        Err(err) => {
            debug!("Magic-link exchange failed: {err}");
            return None;
        }
    };

    let Some(user) = grant.user else {
        debug!("Magic-link exchange returned no user");
        return None;
    };

    match store.set(Some(user)) {
        Ok(_) => grant.session,
        Err(err) => {
            error!("Failed to persist user from magic link: {err}");
            if grant.session.is_some() {
                warn!("Discarding session issued by magic link");
            }
            None
        }
    }
}
