// ── Runtime connection configuration ──
//
// These types describe *how* to reach a firewall or Panorama. They carry
// credential data and connection tuning, but never touch disk: the
// config crate or the caller builds an `XapiConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::Error;
use crate::transport::{TlsMode, TransportConfig};

/// How to authenticate with the XML API.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// A pre-shared API key.
    ApiKey(SecretString),
    /// Username and password; a key is minted with `type=keygen` on
    /// first use.
    Password {
        username: String,
        password: SecretString,
    },
    /// A key plus the credentials it was minted from. The key is used;
    /// the credentials remain available to keygen and ad-hoc queries.
    Hybrid {
        api_key: SecretString,
        username: String,
        password: SecretString,
    },
}

impl AuthCredentials {
    /// Build from optional parts, preferring a key when one is given.
    pub fn from_parts(
        api_key: Option<SecretString>,
        username: Option<String>,
        password: Option<SecretString>,
    ) -> Result<Self, Error> {
        match (api_key, username, password) {
            (Some(api_key), Some(username), Some(password)) => Ok(Self::Hybrid {
                api_key,
                username,
                password,
            }),
            (Some(api_key), _, _) => Ok(Self::ApiKey(api_key)),
            (None, Some(username), Some(password)) => Ok(Self::Password { username, password }),
            _ => Err(Error::Configuration(
                "api_key or api_username and api_password arguments required".into(),
            )),
        }
    }

    pub fn api_key(&self) -> Option<&SecretString> {
        match self {
            Self::ApiKey(key) | Self::Hybrid { api_key: key, .. } => Some(key),
            Self::Password { .. } => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Password { username, .. } | Self::Hybrid { username, .. } => Some(username),
            Self::ApiKey(_) => None,
        }
    }

    pub fn password(&self) -> Option<&SecretString> {
        match self {
            Self::Password { password, .. } | Self::Hybrid { password, .. } => Some(password),
            Self::ApiKey(_) => None,
        }
    }
}

/// Configuration for one XML API endpoint. Immutable once the client
/// is built.
#[derive(Debug, Clone)]
pub struct XapiConfig {
    /// Hostname or address of the firewall / Panorama.
    pub hostname: String,
    pub port: Option<u16>,
    /// Serial number of a managed firewall, sent as `target=` so
    /// Panorama proxies the request.
    pub serial: Option<String>,
    pub use_http: bool,
    pub use_get: bool,
    /// Per-request HTTP timeout.
    pub timeout: Option<Duration>,
    pub tls: TlsMode,
    pub auth: AuthCredentials,
}

impl XapiConfig {
    pub fn new(hostname: impl Into<String>, auth: AuthCredentials) -> Self {
        Self {
            hostname: hostname.into(),
            port: None,
            serial: None,
            use_http: false,
            use_get: false,
            timeout: None,
            tls: TlsMode::System,
            auth,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.hostname.trim().is_empty() {
            return Err(Error::Configuration("hostname argument required".into()));
        }
        if self.port == Some(0) {
            return Err(Error::invalid("port", 0));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::invalid("timeout", 0));
        }
        Ok(())
    }

    /// `scheme://host[:port]/api/`
    pub fn api_url(&self) -> Result<Url, Error> {
        let scheme = if self.use_http { "http" } else { "https" };
        let host = self.hostname.trim();
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_owned()
        };
        let mut uri = format!("{scheme}://{host}");
        if let Some(port) = self.port {
            uri.push_str(&format!(":{port}"));
        }
        uri.push_str("/api/");
        Ok(Url::parse(&uri)?)
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
            use_get: self.use_get,
        }
    }

    /// Parse a port the way it arrives from a profile or flag.
    pub fn parse_port(raw: &str) -> Result<u16, Error> {
        match raw.trim().parse::<u16>() {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(Error::invalid("port", raw)),
        }
    }

    /// Parse a request timeout in whole seconds; must be positive.
    pub fn parse_timeout(raw: &str) -> Result<Duration, Error> {
        match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(Error::invalid("timeout", raw)),
        }
    }
}
