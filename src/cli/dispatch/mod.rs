//! Maps validated CLI matches to the action to run.

use crate::cli::{
    actions::{server::Args, Action},
    commands::{service, session, ARG_PORT},
};
use anyhow::Result;
use std::time::Duration;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let service_opts = service::Options::parse(matches)?;
    let session_opts = session::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        service_url: service_opts.url,
        api_key: service_opts.api_key,
        request_timeout: Duration::from_secs(service_opts.request_timeout_seconds),
        storage_dir: session_opts.storage_dir,
        session_ttl_seconds: session_opts.session_ttl_seconds,
        cookie_secure: session_opts.cookie_secure,
    }))
}
