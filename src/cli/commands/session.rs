//! Session cookie and local storage arguments.

use clap::{builder::BoolishValueParser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_STORAGE_DIR: &str = "storage-dir";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";

#[derive(Debug)]
pub struct Options {
    pub storage_dir: Option<PathBuf>,
    pub session_ttl_seconds: i64,
    pub cookie_secure: bool,
}

impl Options {
    /// Parse session arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the session TTL is not positive.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(604_800);
        if session_ttl_seconds <= 0 {
            anyhow::bail!("--{ARG_SESSION_TTL_SECONDS} must be greater than zero");
        }

        Ok(Self {
            storage_dir: matches
                .get_one::<String>(ARG_STORAGE_DIR)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
            session_ttl_seconds,
            cookie_secure: matches.get_flag(ARG_COOKIE_SECURE),
        })
    }
}

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_STORAGE_DIR)
                .long(ARG_STORAGE_DIR)
                .help("Directory for persisted user records (in-memory when unset)")
                .env("SESSIONGATE_STORAGE_DIR"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie TTL in seconds")
                .env("SESSIONGATE_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long(ARG_COOKIE_SECURE)
                .help("Mark cookies Secure (enable when served over HTTPS)")
                .env("SESSIONGATE_COOKIE_SECURE")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
}
