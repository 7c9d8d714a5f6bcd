//! # Sessiongate
//!
//! `sessiongate` is a small web front end that signs users in against an
//! external backend-as-a-service. The service owns every durable concern
//! (password hashing, session issuance, magic-link generation); this crate only
//! keeps track of who is signed in and gates pages on it.
//!
//! ## Auth State
//!
//! Each browser gets a storage scope (a ULID carried in a cookie). The
//! [`auth::store::AuthStore`] for that scope is initialized from persistent
//! storage and mirrors every change back to it. The state is one of
//! `Unresolved`, `SignedOut` or `SignedIn(user)`.
//!
//! ## Route Guard
//!
//! Protected pages run behind [`api::guard::require_auth`]. A request carrying
//! a magic-link `token` is redeemed exactly once; afterwards the guard either
//! renders the page, redirects to `/sign-in`, or shows a loading page while the
//! state is still unresolved.
//!
//! ## Pages
//!
//! - `GET|POST /sign-in`: email and password sign-in.
//! - `GET|POST /sign-up`: account creation.
//! - `GET /`: profile and active sessions (guarded).
//! - `POST /api/auth/signOut`: signs out at the service and clears local state.

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
