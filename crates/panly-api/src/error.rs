use thiserror::Error;

/// Top-level error type for the `panly-api` crate.
///
/// Every failure a facade operation can hit surfaces as one of these
/// variants: parameter validation, transport, response classification,
/// XML parsing, vendor-reported errors, and job polling timeouts. The
/// `Display` text is the human-readable diagnostic handed to callers.
#[derive(Debug, Error)]
pub enum Error {
    // ── Parameters ──────────────────────────────────────────────────
    /// A caller-supplied value was rejected before any network I/O.
    #[error("Invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    /// Client configuration is incomplete or inconsistent.
    #[error("{0}")]
    Configuration(String),

    // ── Authentication ──────────────────────────────────────────────
    /// An operation needed credentials the client does not hold.
    #[error("{message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status whose body could not be interpreted.
    #[error("HTTP Error {status}: {reason}")]
    Http { status: u16, reason: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error (unreadable or invalid CA certificate).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Response handling ───────────────────────────────────────────
    /// The response headers or body did not match any known shape.
    #[error("{message}")]
    Classification { message: String },

    /// The body claimed to be XML but did not parse.
    #[error("{message}")]
    XmlParse { message: String },

    /// Well-formed XML reporting a non-success status.
    ///
    /// `message` is the diagnostic extracted from the document; `code`
    /// is the root element's `code` attribute when present.
    #[error("{message}")]
    Api {
        message: String,
        code: Option<String>,
    },

    /// A structurally valid response lacked an element the protocol
    /// requires (e.g. a job status).
    #[error("{message}")]
    Protocol { message: String },

    // ── Jobs ────────────────────────────────────────────────────────
    /// The caller's polling budget elapsed before the job finished.
    #[error("timeout waiting for job {job_id} completion")]
    JobTimeout { job_id: String },
}

impl Error {
    pub(crate) fn invalid(name: &'static str, value: impl ToString) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
        }
    }

    /// Returns `true` for a polling timeout or a transport-level timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::JobTimeout { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` if the request never produced a usable HTTP exchange.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Tls(_) | Self::Http { .. })
    }

    /// Returns `true` if the error was raised before any network call.
    pub fn is_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. } | Self::Configuration(_))
    }

    /// The vendor status code (`code` attribute), if the server sent one.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
