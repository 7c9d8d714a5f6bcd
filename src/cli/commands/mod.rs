pub mod logging;
pub mod service;
pub mod session;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("sessiongate")
        .about("Session-gated web front end for a hosted auth service")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("SESSIONGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        );

    let command = service::with_args(command);
    let command = session::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const REQUIRED_ENV: [(&str, Option<&str>); 2] = [
        ("SESSIONGATE_SERVICE_URL", None),
        ("SESSIONGATE_API_KEY", None),
    ];

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "sessiongate");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Session-gated web front end for a hosted auth service".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_args() {
        temp_env::with_vars(REQUIRED_ENV, || {
            let matches = new().get_matches_from(vec![
                "sessiongate",
                "--port",
                "9090",
                "--service-url",
                "https://baas.example.com",
                "--api-key",
                "key-123",
                "--storage-dir",
                "/tmp/sessiongate",
                "--session-ttl-seconds",
                "3600",
                "--cookie-secure",
            ]);

            assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(9090));

            let service = service::Options::parse(&matches).unwrap();
            assert_eq!(service.url.as_str(), "https://baas.example.com/");
            assert_eq!(service.api_key.expose_secret(), "key-123");
            assert_eq!(service.request_timeout_seconds, 10);

            let session = session::Options::parse(&matches).unwrap();
            assert_eq!(
                session.storage_dir.as_deref(),
                Some(std::path::Path::new("/tmp/sessiongate"))
            );
            assert_eq!(session.session_ttl_seconds, 3600);
            assert!(session.cookie_secure);
        });
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("SESSIONGATE_PORT", None::<&str>),
                ("SESSIONGATE_STORAGE_DIR", None),
                ("SESSIONGATE_SESSION_TTL_SECONDS", None),
                ("SESSIONGATE_COOKIE_SECURE", None),
                ("SESSIONGATE_REQUEST_TIMEOUT_SECONDS", None),
            ],
            || {
                let matches = new().get_matches_from(vec![
                    "sessiongate",
                    "--service-url",
                    "http://localhost:3000",
                    "--api-key",
                    "key",
                ]);

                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(8080));
                let session = session::Options::parse(&matches).unwrap();
                assert!(session.storage_dir.is_none());
                assert_eq!(session.session_ttl_seconds, 604_800);
                assert!(!session.cookie_secure);
            },
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("SESSIONGATE_PORT", Some("443")),
                ("SESSIONGATE_SERVICE_URL", Some("https://baas.example.com/app")),
                ("SESSIONGATE_API_KEY", Some("env-key")),
                ("SESSIONGATE_COOKIE_SECURE", Some("true")),
                ("SESSIONGATE_REQUEST_TIMEOUT_SECONDS", Some("3")),
                ("SESSIONGATE_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["sessiongate"]);
                assert_eq!(matches.get_one::<u16>(ARG_PORT).copied(), Some(443));

                let service = service::Options::parse(&matches).unwrap();
                assert_eq!(service.url.as_str(), "https://baas.example.com/app");
                assert_eq!(service.api_key.expose_secret(), "env-key");
                assert_eq!(service.request_timeout_seconds, 3);

                let session = session::Options::parse(&matches).unwrap();
                assert!(session.cookie_secure);

                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    Some(2)
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_verbosity() {
        for index in 0..5 {
            temp_env::with_vars([("SESSIONGATE_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "sessiongate".to_string(),
                    "--service-url".to_string(),
                    "https://baas.example.com".to_string(),
                    "--api-key".to_string(),
                    "key".to_string(),
                ];

                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);
                assert_eq!(
                    matches.get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_missing_service_url() {
        temp_env::with_vars(REQUIRED_ENV, || {
            let result = new().try_get_matches_from(vec!["sessiongate", "--api-key", "key"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_rejects_non_http_service_url() {
        temp_env::with_vars(REQUIRED_ENV, || {
            let matches = new().get_matches_from(vec![
                "sessiongate",
                "--service-url",
                "ftp://baas.example.com",
                "--api-key",
                "key",
            ]);
            let err = service::Options::parse(&matches).unwrap_err();
            assert!(err.to_string().contains("http(s)"));
        });
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        temp_env::with_vars(REQUIRED_ENV, || {
            let matches = new().get_matches_from(vec![
                "sessiongate",
                "--service-url",
                "https://baas.example.com",
                "--api-key",
                "key",
                "--session-ttl-seconds",
                "0",
            ]);
            assert!(session::Options::parse(&matches).is_err());
        });
    }
}
