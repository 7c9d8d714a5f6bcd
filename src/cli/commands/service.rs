//! Auth service connection arguments.

use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

pub const ARG_SERVICE_URL: &str = "service-url";
pub const ARG_API_KEY: &str = "api-key";
pub const ARG_REQUEST_TIMEOUT_SECONDS: &str = "request-timeout-seconds";

#[derive(Debug)]
pub struct Options {
    pub url: Url,
    pub api_key: SecretString,
    pub request_timeout_seconds: u64,
}

impl Options {
    /// Parse auth service arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the URL or API key is missing or invalid.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let url = match matches.get_one::<String>(ARG_SERVICE_URL) {
            Some(value) if !value.trim().is_empty() => value.trim(),
            _ => anyhow::bail!("missing required argument: --{ARG_SERVICE_URL}"),
        };
        let url = Url::parse(url)
            .map_err(|err| anyhow::anyhow!("invalid --{ARG_SERVICE_URL} {url}: {err}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("--{ARG_SERVICE_URL} must be an http(s) URL");
        }

        let api_key = match matches.get_one::<String>(ARG_API_KEY) {
            Some(value) if !value.trim().is_empty() => SecretString::from(value.trim().to_string()),
            _ => anyhow::bail!("missing required argument: --{ARG_API_KEY}"),
        };

        let request_timeout_seconds = matches
            .get_one::<u64>(ARG_REQUEST_TIMEOUT_SECONDS)
            .copied()
            .unwrap_or(10);

        Ok(Self {
            url,
            api_key,
            request_timeout_seconds,
        })
    }
}

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SERVICE_URL)
                .long(ARG_SERVICE_URL)
                .help("Base URL of the auth service, example: https://app.tld")
                .env("SESSIONGATE_SERVICE_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_API_KEY)
                .long(ARG_API_KEY)
                .help("Client API key sent to the auth service")
                .env("SESSIONGATE_API_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT_SECONDS)
                .long(ARG_REQUEST_TIMEOUT_SECONDS)
                .help("Timeout for each auth service request in seconds")
                .env("SESSIONGATE_REQUEST_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
