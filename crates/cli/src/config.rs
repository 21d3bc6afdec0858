//! Command-line configuration.
//!
//! Every flag can also be set through the environment variable shown in
//! `--help`. [`Cli::validate`] turns the raw flags into [`Settings`] and
//! rejects incomplete invocations before any network activity.

use std::path::PathBuf;
use std::time::Duration;

use checks::{RepositoryName, Scheme};
use clap::{ArgAction, Parser, ValueEnum};
use dispatch::{
    DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_QUEUE_CAPACITY,
};
use gerrit::{GerritSettings, LockStyle};
use reqwest::Url;
use thiserror::Error;

/// Raw command-line flags.
#[derive(Debug, Parser)]
#[command(
    name = "connector",
    version,
    about = "Bridges Gerrit pending checks and submissions to a pipeline webhook"
)]
pub struct Cli {
    /// URL of the Gerrit server.
    #[arg(long, env = "CONNECTOR_GERRIT")]
    pub gerrit: Option<String>,

    /// URL of the pipeline webhook (EventListener).
    #[arg(long, env = "CONNECTOR_EVENT_LISTENER")]
    pub event_listener: Option<String>,

    /// File containing `user:password` for Gerrit.
    #[arg(long, env = "CONNECTOR_AUTH_FILE")]
    pub auth_file: Option<PathBuf>,

    /// List the checkers owned by the scheme and exit.
    #[arg(long, env = "CONNECTOR_LIST")]
    pub list: bool,

    /// Register a checker for --repo / --prefix and exit.
    #[arg(long, env = "CONNECTOR_REGISTER")]
    pub register: bool,

    /// Update the existing checker for --repo / --prefix and exit.
    #[arg(long, env = "CONNECTOR_UPDATE")]
    pub update: bool,

    /// Repository (project) the checker applies to.
    #[arg(long, env = "CONNECTOR_REPO")]
    pub repo: Option<String>,

    /// Handler prefix; also the checker name shown in Gerrit.
    #[arg(long, env = "CONNECTOR_PREFIX")]
    pub prefix: Option<String>,

    /// Whether a failing check blocks submission.
    #[arg(long, env = "CONNECTOR_BLOCKING", default_value_t = true, action = ArgAction::Set)]
    pub blocking: bool,

    /// Checker scheme this connector owns.
    #[arg(long, env = "CONNECTOR_SCHEME", default_value = "jarvis")]
    pub scheme: String,

    /// Seconds between polls.
    #[arg(long, env = "CONNECTOR_POLL_INTERVAL_SECS", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,

    /// Capacity of each work queue.
    #[arg(long, env = "CONNECTOR_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Timeout for each HTTP request and port call, in seconds.
    #[arg(long, env = "CONNECTOR_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_CALL_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,

    /// How submissions are locked before the merge pipeline is triggered.
    #[arg(long, env = "CONNECTOR_LOCK_STYLE", value_enum, default_value_t = LockArg::Label)]
    pub lock_style: LockArg,

    /// Label voted on to lock a change.
    #[arg(long, env = "CONNECTOR_LOCK_LABEL", default_value = "Jarvis-Lock")]
    pub lock_label: String,

    /// Hashtag added to lock a change.
    #[arg(long, env = "CONNECTOR_LOCK_HASHTAG", default_value = "jarvis-merge")]
    pub lock_hashtag: String,

    /// Log output format.
    #[arg(long, env = "CONNECTOR_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP (gRPC) endpoint to export spans to.
    #[arg(long, env = "CONNECTOR_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LockArg {
    Label,
    Hashtag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Invalid or incomplete configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("must set --{0}")]
    Missing(&'static str),

    #[error("--{flag}: invalid URL {value:?}: {reason}")]
    InvalidUrl {
        flag: &'static str,
        value: String,
        reason: String,
    },

    #[error("--{flag} must not be empty")]
    Empty { flag: &'static str },

    #[error("--{flag} must be greater than zero")]
    Zero { flag: &'static str },

    #[error("--list cannot be combined with --register or --update")]
    ConflictingModes,
}

/// What the process does once connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Print owned checkers as JSON lines.
    List,
    /// Create or update one checker.
    Register {
        repository: RepositoryName,
        prefix: String,
        update: bool,
        blocking: bool,
    },
    /// Run the poll loop and workers until shut down.
    Serve { event_listener: Url },
}

/// Validated settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: Mode,
    pub gerrit: GerritSettings,
    pub auth_file: PathBuf,
    pub scheme: Scheme,
    pub poll_interval: Duration,
    pub queue_capacity: usize,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

impl Cli {
    pub fn validate(self) -> Result<Settings, ConfigError> {
        let gerrit = parse_url("gerrit", self.gerrit.as_deref())?;
        let auth_file = self.auth_file.ok_or(ConfigError::Missing("auth-file"))?;
        let scheme = Scheme::new(self.scheme).ok_or(ConfigError::Empty { flag: "scheme" })?;

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Zero {
                flag: "poll-interval-secs",
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Zero {
                flag: "queue-capacity",
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Zero {
                flag: "request-timeout-secs",
            });
        }

        if self.list && (self.register || self.update) {
            return Err(ConfigError::ConflictingModes);
        }

        let mode = if self.list {
            Mode::List
        } else if self.register || self.update {
            let repository = self
                .repo
                .and_then(RepositoryName::new)
                .ok_or(ConfigError::Missing("repo"))?;
            let prefix = self
                .prefix
                .filter(|p| !p.is_empty())
                .ok_or(ConfigError::Missing("prefix"))?;
            Mode::Register {
                repository,
                prefix,
                update: self.update,
                blocking: self.blocking,
            }
        } else {
            Mode::Serve {
                event_listener: parse_url("event-listener", self.event_listener.as_deref())?,
            }
        };

        let request_timeout = Duration::from_secs(self.request_timeout_secs);
        Ok(Settings {
            mode,
            gerrit: GerritSettings {
                base_url: gerrit,
                lock: match self.lock_style {
                    LockArg::Label => LockStyle::Label,
                    LockArg::Hashtag => LockStyle::Hashtag,
                },
                lock_label: self.lock_label,
                lock_hashtag: self.lock_hashtag,
                request_timeout,
            },
            auth_file,
            scheme,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            queue_capacity: self.queue_capacity,
            request_timeout,
            log_format: self.log_format,
            otlp_endpoint: self.otlp_endpoint.filter(|e| !e.is_empty()),
        })
    }
}

fn parse_url(flag: &'static str, value: Option<&str>) -> Result<Url, ConfigError> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(flag))?;
    Url::parse(value).map_err(|err| ConfigError::InvalidUrl {
        flag,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Settings, ConfigError> {
        let mut argv = vec!["connector"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().validate()
    }

    const BASE: [&str; 4] = [
        "--gerrit",
        "https://review.example.org",
        "--auth-file",
        "/etc/connector/auth",
    ];

    fn with_base<'a>(extra: &[&'a str]) -> Vec<&'a str> {
        BASE.iter().chain(extra).copied().collect()
    }

    #[test]
    fn serve_mode_with_defaults() {
        let settings = parse(&with_base(&["--event-listener", "http://el.example.org:8080"])).unwrap();

        assert_eq!(
            settings.mode,
            Mode::Serve {
                event_listener: Url::parse("http://el.example.org:8080").unwrap()
            }
        );
        assert_eq!(settings.scheme.as_str(), "jarvis");
        assert_eq!(settings.poll_interval, Duration::from_secs(10));
        assert_eq!(settings.queue_capacity, 5);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.gerrit.lock, LockStyle::Label);
        assert_eq!(settings.gerrit.lock_label, "Jarvis-Lock");
        assert_eq!(settings.gerrit.lock_hashtag, "jarvis-merge");
        assert_eq!(settings.log_format, LogFormat::Text);
        assert_eq!(settings.otlp_endpoint, None);
    }

    #[test]
    fn missing_gerrit_is_rejected() {
        let err = parse(&["--auth-file", "/etc/connector/auth", "--list"]).unwrap_err();

        assert!(matches!(err, ConfigError::Missing("gerrit")));
    }

    #[test]
    fn missing_auth_file_is_rejected() {
        let err = parse(&["--gerrit", "https://review.example.org", "--list"]).unwrap_err();

        assert!(matches!(err, ConfigError::Missing("auth-file")));
    }

    #[test]
    fn serve_requires_event_listener() {
        let err = parse(&BASE).unwrap_err();

        assert!(matches!(err, ConfigError::Missing("event-listener")));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let err = parse(&[
            "--gerrit",
            "not a url",
            "--auth-file",
            "/etc/connector/auth",
            "--list",
        ])
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidUrl { flag: "gerrit", .. }));
    }

    #[test]
    fn register_requires_repo_and_prefix() {
        let err = parse(&with_base(&["--register", "--prefix", "lint"])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("repo")));

        let err = parse(&with_base(&["--update", "--repo", "airship/treasuremap"])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("prefix")));
    }

    #[test]
    fn register_mode_is_blocking_by_default() {
        let settings = parse(&with_base(&[
            "--register",
            "--repo",
            "airship/treasuremap",
            "--prefix",
            "lint",
        ]))
        .unwrap();

        assert_eq!(
            settings.mode,
            Mode::Register {
                repository: RepositoryName::new("airship/treasuremap").unwrap(),
                prefix: "lint".to_string(),
                update: false,
                blocking: true,
            }
        );
    }

    #[test]
    fn blocking_can_be_disabled() {
        let settings = parse(&with_base(&[
            "--update",
            "--repo",
            "airship/treasuremap",
            "--prefix",
            "lint",
            "--blocking",
            "false",
        ]))
        .unwrap();

        assert!(matches!(
            settings.mode,
            Mode::Register {
                update: true,
                blocking: false,
                ..
            }
        ));
    }

    #[test]
    fn list_does_not_need_event_listener() {
        let settings = parse(&with_base(&["--list"])).unwrap();

        assert_eq!(settings.mode, Mode::List);
    }

    #[test]
    fn list_excludes_register_and_update() {
        let err = parse(&with_base(&["--list", "--register"])).unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingModes));

        let err = parse(&with_base(&["--list", "--update"])).unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingModes));
    }

    #[test]
    fn register_with_update_is_an_update() {
        let settings = parse(&with_base(&[
            "--register",
            "--update",
            "--repo",
            "airship/treasuremap",
            "--prefix",
            "lint",
        ]))
        .unwrap();

        assert!(matches!(settings.mode, Mode::Register { update: true, .. }));
    }

    #[test]
    fn zero_tuning_values_are_rejected() {
        let err = parse(&with_base(&["--list", "--queue-capacity", "0"])).unwrap_err();

        assert!(matches!(err, ConfigError::Zero { flag: "queue-capacity" }));
    }

    #[test]
    fn hashtag_lock_style_and_json_logs() {
        let settings = parse(&with_base(&[
            "--list",
            "--lock-style",
            "hashtag",
            "--log-format",
            "json",
        ]))
        .unwrap();

        assert_eq!(settings.gerrit.lock, LockStyle::Hashtag);
        assert_eq!(settings.log_format, LogFormat::Json);
    }
}
