// Transport layer for the XML API.
//
// A `Transport` performs exactly one HTTP exchange: it never inspects the
// body and never retries. `HttpTransport` is the reqwest implementation;
// tests substitute their own.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;
use url::form_urlencoded;

use crate::error::Error;

const USER_AGENT: &str = concat!("panly/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed management interfaces).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout. `None` leaves reqwest's default (no timeout).
    pub timeout: Option<Duration>,
    /// Send parameters as a GET query string instead of a POST form body.
    pub use_get: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: None,
            use_get: false,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── Request / response ───────────────────────────────────────────────

/// A file sent as the multipart `file` part of a `type=import` request.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content: Vec<u8>,
}

/// One XML API request: ordered parameters plus an optional API key
/// and upload. Built fresh per call.
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    params: Vec<(String, String)>,
    key: Option<SecretString>,
    upload: Option<FileUpload>,
}

impl ApiRequest {
    /// Start a request for the given `type=` value.
    pub fn new(api_type: &str) -> Self {
        let mut request = Self::default();
        request.push("type", api_type);
        request
    }

    /// A request with no parameters at all (ad-hoc queries).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append or replace a parameter, keeping first-insertion order.
    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self.params.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.params.push((name.to_owned(), value));
        }
    }

    /// Append a parameter only when a value is present.
    pub fn push_opt(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push(name, value);
        }
    }

    /// Attach the API key, replacing any `key` parameter already
    /// present. It is serialized last and verbatim: keys returned by
    /// keygen are already URL-safe.
    pub fn with_key(mut self, key: SecretString) -> Self {
        self.params.retain(|(n, _)| n != "key");
        self.key = Some(key);
        self
    }

    pub fn with_upload(mut self, upload: FileUpload) -> Self {
        self.upload = Some(upload);
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    pub fn upload(&self) -> Option<&FileUpload> {
        self.upload.as_ref()
    }

    /// The `application/x-www-form-urlencoded` encoding of the parameters.
    pub fn encode(&self) -> String {
        let mut data = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish();
        if let Some(key) = &self.key {
            if !data.is_empty() {
                data.push('&');
            }
            data.push_str("key=");
            data.push_str(key.expose_secret());
        }
        data
    }

    /// Encoding with secrets masked, for logs.
    pub fn redacted(&self) -> String {
        let mut data = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.params {
            if name == "password" || name == "key" {
                data.append_pair(name, "*****");
            } else {
                data.append_pair(name, value);
            }
        }
        let mut data = data.finish();
        if self.key.is_some() {
            if !data.is_empty() {
                data.push('&');
            }
            data.push_str("key=*****");
        }
        data
    }
}

/// The raw result of one HTTP exchange.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub reason: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    /// Whether the HTTP status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ── Transport trait ──────────────────────────────────────────────────

/// Sends one request and returns status, headers and body untouched.
///
/// Non-2xx statuses are returned as `Ok`: the XML API reports most
/// errors in an XML body regardless of the HTTP status.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        url: &Url,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<RawResponse, Error>> + Send;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    use_get: bool,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: config.build_client()?,
            use_get: config.use_get,
        })
    }

}

impl Transport for HttpTransport {
    async fn send(&self, url: &Url, request: &ApiRequest) -> Result<RawResponse, Error> {
        let data = request.encode();

        let builder = if let Some(upload) = request.upload() {
            // Multipart: parameters ride in the query string.
            let mut url = url.clone();
            url.set_query(Some(&data));
            debug!("POST {} (multipart upload {})", url.path(), upload.filename);
            let part = reqwest::multipart::Part::bytes(upload.content.clone())
                .file_name(upload.filename.clone());
            let form = reqwest::multipart::Form::new().part("file", part);
            self.http.post(url).multipart(form)
        } else if self.use_get {
            let mut url = url.clone();
            url.set_query(Some(&data));
            debug!("GET {}?{}", url.path(), request.redacted());
            self.http.get(url)
        } else {
            debug!("POST {} data: {}", url, request.redacted());
            self.http
                .post(url.clone())
                .header(
                    reqwest::header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(data)
        };

        let resp = builder.send().await?;

        let status = resp.status();
        let headers = resp.headers().clone();
        trace!(status = status.as_u16(), ?headers, "HTTP response headers");
        let body = resp.bytes().await?;

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(String::from),
            headers,
            body,
        })
    }
}
