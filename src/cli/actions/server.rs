use crate::{
    api::{self, AppState, GatewayConfig},
    auth::{
        client::HttpAuthService,
        storage::{spawn_sweeper, FileStorage, MemoryStorage, UserStorage},
    },
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::{debug, info};
use url::Url;

/// How often expired user records are purged.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub service_url: Url,
    pub api_key: SecretString,
    pub request_timeout: Duration,
    pub storage_dir: Option<PathBuf>,
    pub session_ttl_seconds: i64,
    pub cookie_secure: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the HTTP client or storage cannot be prepared, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let service = HttpAuthService::new(args.service_url, args.api_key, args.request_timeout)
        .context("Failed to build auth service client")?;
    debug!("Auth service client: {service:?}");

    // Stored records live as long as the cookies that point at them.
    let record_ttl = Duration::from_secs(u64::try_from(args.session_ttl_seconds).unwrap_or(0));

    let storage: Arc<dyn UserStorage> = if let Some(dir) = args.storage_dir {
        let storage = FileStorage::new(&dir)
            .with_context(|| format!("Failed to prepare storage dir: {}", dir.display()))?
            .with_ttl(record_ttl);
        info!("Persisting user records under {}", storage.dir().display());
        Arc::new(storage)
    } else {
        info!("No storage dir configured, user records are kept in memory");
        Arc::new(MemoryStorage::new().with_ttl(record_ttl))
    };
    spawn_sweeper(storage.clone(), SWEEP_INTERVAL);

    let config = GatewayConfig::new()
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_cookie_secure(args.cookie_secure);

    let state = AppState::new(Arc::new(service), storage, config);

    api::new(args.port, state).await
}
