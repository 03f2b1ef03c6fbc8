//! CLI error types with miette diagnostics.
//!
//! Maps `panly_api::Error` and `ConfigError` into user-facing errors with
//! help text and exit codes.

use miette::Diagnostic;
use thiserror::Error;

use panly_api::Error as ApiError;
use panly_config::ConfigError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach {url}")]
    #[diagnostic(
        code(panly::connection_failed),
        help(
            "Check the hostname and that the management interface allows API access.\n\
             Try: panly op --cmd-xml 'show system info' --insecure"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: ApiError,
    },

    #[error("{message}")]
    #[diagnostic(
        code(panly::tls_error),
        help("Use --insecure (-k) to accept a self-signed certificate, or set ca_cert in the profile.")
    )]
    Tls { message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(panly::auth_failed),
        help("Verify the API key, or the username and password used for keygen.")
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(panly::no_credentials),
        help(
            "Set api_key or api_username/api_password in the profile,\n\
             or pass --api-key / --api-username and --api-password."
        )
    )]
    NoCredentials { profile: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(panly::api_error))]
    Api {
        message: String,
        code: Option<String>,
    },

    #[error("{message}")]
    #[diagnostic(code(panly::protocol))]
    Protocol { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(panly::timeout),
        help("Raise --job-timeout or --timeout, or check the job with: panly wait <job-id>")
    )]
    Timeout { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(panly::validation))]
    Validation { message: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(panly::profile_not_found),
        help("Available profiles: {available}\nConfig file: {path}")
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error("No device configured")]
    #[diagnostic(
        code(panly::no_config),
        help(
            "Pass --hostname, or add a profile to {path}:\n\n\
             [profiles.default]\n\
             hostname = \"192.0.2.1\"\n\
             api_key_env = \"PANOS_API_KEY\""
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(panly::config))]
    Config(ConfigError),

    // ── IO ───────────────────────────────────────────────────────────

    #[error("{path}: {source}")]
    #[diagnostic(code(panly::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Tls { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } | Self::ProfileNotFound { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    pub fn io(path: impl std::fmt::Display, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_string(),
            source,
        }
    }

    /// Map a library error, with the endpoint URL for connection errors.
    pub fn from_api(err: ApiError, url: &str) -> Self {
        match err {
            ApiError::Transport(ref e) if e.is_timeout() => Self::Timeout {
                message: err.to_string(),
            },
            ApiError::Transport(_) => Self::ConnectionFailed {
                url: url.to_owned(),
                source: err,
            },
            ApiError::Tls(message) => Self::Tls {
                message: format!("TLS error: {message}"),
            },
            ApiError::JobTimeout { .. } => Self::Timeout {
                message: err.to_string(),
            },
            ApiError::InvalidParameter { .. } | ApiError::Configuration(_) | ApiError::InvalidUrl(_) => {
                Self::Validation {
                    message: err.to_string(),
                }
            }
            ApiError::Authentication { message } => Self::AuthFailed { message },
            ApiError::Api { message, code } if code.as_deref() == Some("403") => {
                Self::AuthFailed { message }
            }
            ApiError::Api { message, code } => Self::Api { message, code },
            ApiError::Http { .. }
            | ApiError::Classification { .. }
            | ApiError::XmlParse { .. }
            | ApiError::Protocol { .. } => Self::Protocol {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { .. } => Self::Validation {
                message: err.to_string(),
            },
            other => Self::Config(other),
        }
    }
}
