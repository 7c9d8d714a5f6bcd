//! Shared server state and session cookie configuration.

use crate::auth::{service::AuthService, storage::UserStorage, store::AuthStore};
use std::sync::Arc;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    session_ttl_seconds: i64,
    cookie_secure: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            cookie_secure: false,
        }
    }
}

impl GatewayConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }
}

/// Dependencies shared by every request. Each request builds its own
/// [`AuthStore`] from these; nothing mutable is shared between requests
/// except the storage backend itself.
#[derive(Clone)]
pub struct AppState {
    service: Arc<dyn AuthService>,
    storage: Arc<dyn UserStorage>,
    config: GatewayConfig,
}

impl AppState {
    #[must_use]
    pub fn new(
        service: Arc<dyn AuthService>,
        storage: Arc<dyn UserStorage>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            service,
            storage,
            config,
        }
    }

    #[must_use]
    pub fn service(&self) -> &dyn AuthService {
        self.service.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Fresh, unresolved store for one browser scope.
    #[must_use]
    pub fn store_for(&self, scope: &str) -> AuthStore {
        AuthStore::new(self.storage.clone(), scope)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
