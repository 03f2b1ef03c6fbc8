//! Shared configuration for panly.
//!
//! TOML profiles (one per firewall or Panorama), credential resolution
//! (env + keyring + plaintext), and translation to
//! `panly_api::XapiConfig`. The CLI layers its flag overrides on top
//! through [`CredentialOverrides`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use panly_api::{AuthCredentials, TlsMode, XapiConfig};

/// Keyring service name; entries are `<profile>/api-key` and
/// `<profile>/password`.
pub const KEYRING_SERVICE: &str = "panly";

/// Environment variable consulted for the password before the keyring.
pub const PASSWORD_ENV: &str = "PANLY_API_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}': api_key or api_username and api_password required")]
    NoCredentials { profile: String },

    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Defaults {
    /// Skip certificate verification unless a profile says otherwise.
    #[serde(default)]
    pub insecure: bool,

    /// HTTP request timeout in seconds. Unset means no timeout.
    pub timeout: Option<u64>,
}

/// One firewall or Panorama.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    pub hostname: Option<String>,

    pub port: Option<u16>,

    /// Managed firewall serial, for requests proxied through Panorama.
    pub serial: Option<String>,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    pub api_username: Option<String>,

    /// Password (plaintext; prefer keyring or `PANLY_API_PASSWORD`).
    pub api_password: Option<String>,

    #[serde(default)]
    pub use_http: bool,

    #[serde(default)]
    pub use_get: bool,

    /// Path to a PEM CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override `defaults.insecure`.
    pub insecure: Option<bool>,

    /// Override `defaults.timeout`.
    pub timeout: Option<u64>,
}

impl Config {
    /// Pick a profile by name, falling back to `default_profile`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::UnknownProfile(name.into()))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "panly", "panly").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("panly");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file. A missing file yields the defaults.
///
/// `PANLY_`-prefixed variables override the file, with `__` separating
/// nested keys: `PANLY_DEFAULTS__TIMEOUT=10`,
/// `PANLY_PROFILES__LAB__HOSTNAME=192.0.2.1`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PANLY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Render a config as TOML with secrets masked.
pub fn render_config(config: &Config) -> Result<String, ConfigError> {
    let mut masked = config.clone();
    for profile in masked.profiles.values_mut() {
        for secret in [&mut profile.api_key, &mut profile.api_password] {
            if secret.is_some() {
                *secret = Some("*****".into());
            }
        }
    }
    Ok(toml::to_string_pretty(&masked)?)
}

// ── Credential resolution ───────────────────────────────────────────

/// Credentials given explicitly (command-line flags), which win over
/// anything a profile supplies.
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub api_key: Option<SecretString>,
    pub api_username: Option<String>,
    pub api_password: Option<SecretString>,
}

/// API key from the profile: env var named by `api_key_env`, then the
/// keyring, then plaintext.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key")) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    profile.api_key.clone().map(SecretString::from)
}

/// Password from `PANLY_API_PASSWORD`, then the keyring, then plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Some(SecretString::from(pw));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Some(SecretString::from(pw));
        }
    }

    profile.api_password.clone().map(SecretString::from)
}

/// Merge explicit credentials with the profile's.
///
/// When a username and password are both given explicitly without a
/// key, any key the profile carries is ignored so a fresh one is minted.
pub fn resolve_auth(
    profile: &Profile,
    profile_name: &str,
    overrides: &CredentialOverrides,
) -> Result<AuthCredentials, ConfigError> {
    let explicit_login = overrides.api_key.is_none()
        && overrides.api_username.is_some()
        && overrides.api_password.is_some();

    let api_key = if explicit_login {
        None
    } else {
        overrides
            .api_key
            .clone()
            .or_else(|| resolve_api_key(profile, profile_name))
    };
    let username = overrides
        .api_username
        .clone()
        .or_else(|| profile.api_username.clone());
    let password = overrides
        .api_password
        .clone()
        .or_else(|| resolve_password(profile, profile_name));

    AuthCredentials::from_parts(api_key, username, password).map_err(|_| {
        ConfigError::NoCredentials {
            profile: profile_name.into(),
        }
    })
}

/// Build an `XapiConfig` from a profile, the global defaults and any
/// explicit credentials.
pub fn profile_to_xapi_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    overrides: &CredentialOverrides,
) -> Result<XapiConfig, ConfigError> {
    let hostname = profile
        .hostname
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("hostname", "hostname argument required"))?;

    if profile.port == Some(0) {
        return Err(invalid("port", "must be between 1 and 65535"));
    }

    let timeout = match profile.timeout.or(defaults.timeout) {
        Some(0) => return Err(invalid("timeout", "must be greater than zero")),
        other => other.map(Duration::from_secs),
    };

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let auth = resolve_auth(profile, profile_name, overrides)?;

    let mut config = XapiConfig::new(hostname, auth);
    config.port = profile.port;
    config.serial.clone_from(&profile.serial);
    config.use_http = profile.use_http;
    config.use_get = profile.use_get;
    config.timeout = timeout;
    config.tls = tls;
    Ok(config)
}
