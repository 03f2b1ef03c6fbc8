// XML API client
//
// Owns the connection config, the cached API key and the last-response
// slot. Every operation funnels through `execute`, which sends one
// request and runs the body through the classifier and interpreter.
// Operation families live in sibling files as inherent methods.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};
use url::Url;

use crate::classify::{self, Classified, ClassifyError};
use crate::config::XapiConfig;
use crate::error::Error;
use crate::interpret::{self, Status};
use crate::response::Response;
use crate::transport::{ApiRequest, HttpTransport, RawResponse, Transport};

/// Client for the PAN-OS XML API.
///
/// One operation at a time: every call takes `&mut self`, clears the
/// previous [`Response`] and leaves the new one inspectable through
/// [`last_response`](Self::last_response), even after an error.
pub struct XapiClient<T: Transport = HttpTransport> {
    transport: T,
    config: XapiConfig,
    url: Url,
    api_key: Option<SecretString>,
    pub(crate) response: Response,
}

impl XapiClient<HttpTransport> {
    /// Validate the config and build a reqwest-backed client.
    pub fn new(config: XapiConfig) -> Result<Self, Error> {
        config.validate()?;
        let transport = HttpTransport::new(&config.transport_config())?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> XapiClient<T> {
    /// Build a client over any transport (tests, proxies, recorders).
    pub fn with_transport(config: XapiConfig, transport: T) -> Result<Self, Error> {
        config.validate()?;
        let url = config.api_url()?;
        let api_key = config.auth.api_key().cloned();
        debug!(url = %url, "XML API client ready");
        Ok(Self {
            transport,
            config,
            url,
            api_key,
            response: Response::default(),
        })
    }

    pub fn config(&self) -> &XapiConfig {
        &self.config
    }

    /// `scheme://host[:port]/api/`
    pub fn api_url(&self) -> &Url {
        &self.url
    }

    /// The key in use, whether configured or generated.
    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    pub fn last_response(&self) -> &Response {
        &self.response
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Return the API key, minting one with keygen on first use.
    pub async fn ensure_authenticated(&mut self) -> Result<SecretString, Error> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        let key = self.keygen().await?;
        debug!("api key generated from username/password");
        Ok(key)
    }

    /// `type=keygen`: exchange username/password for an API key and
    /// cache it on the client.
    pub async fn keygen(&mut self) -> Result<SecretString, Error> {
        let credentials = self
            .config
            .auth
            .username()
            .zip(self.config.auth.password())
            .map(|(user, password)| (user.to_owned(), password.clone()));
        let Some((username, password)) = credentials else {
            self.response = Response::default();
            return Err(Error::Authentication {
                message: "api_username and api_password arguments required".into(),
            });
        };

        let mut request = ApiRequest::new("keygen");
        request.push("user", username);
        request.push("password", password.expose_secret());
        request.push_opt("target", self.config.serial.as_deref());

        self.execute(&request).await?;

        let result = self.response.result().ok_or_else(|| Error::Protocol {
            message: "keygen(): result element not found".into(),
        })?;
        let key = result.find_text("key").ok_or_else(|| Error::Protocol {
            message: "keygen(): key element not found".into(),
        })?;

        let key = SecretString::from(key.to_owned());
        self.api_key = Some(key.clone());
        Ok(key)
    }

    /// A request of the given type carrying the key and, when
    /// configured, the managed-device `target`.
    pub(crate) async fn authed_request(&mut self, api_type: &str) -> Result<ApiRequest, Error> {
        let key = self.ensure_authenticated().await?;
        let mut request = ApiRequest::new(api_type);
        request.push_opt("target", self.config.serial.as_deref());
        Ok(request.with_key(key))
    }

    /// Send an arbitrary `a=b&c=d` query string.
    ///
    /// With `modify_qs`, the xpath, key, username, password and target
    /// known to the client are added to (or replace) the given pairs.
    pub async fn ad_hoc(
        &mut self,
        qs: Option<&str>,
        xpath: Option<&str>,
        modify_qs: bool,
    ) -> Result<(), Error> {
        let mut request = ApiRequest::empty();
        if let Some(qs) = qs {
            for pair in qs.split('&') {
                let (name, value) = pair
                    .split_once('=')
                    .ok_or_else(|| Error::invalid("ad_hoc query", qs))?;
                request.push(name, value);
            }
        }

        let key = self.ensure_authenticated().await?;

        if modify_qs {
            request.push_opt("xpath", xpath);
            if let Some(user) = self.config.auth.username() {
                request.push("user", user);
            }
            if let Some(password) = self.config.auth.password() {
                request.push("password", password.expose_secret());
            }
            request.push_opt("target", self.config.serial.as_deref());
            request = request.with_key(key);
        }

        self.execute(&request).await
    }

    // ── Request pipeline ─────────────────────────────────────────────

    /// Send one request and interpret the reply into `self.response`.
    ///
    /// Fails on transport errors, unclassifiable bodies, XML parse
    /// errors, and XML documents whose status is not `success`.
    pub(crate) async fn execute(&mut self, request: &ApiRequest) -> Result<(), Error> {
        self.response = Response::default();

        debug!(api_type = request.param("type").unwrap_or("-"), "XML API request");

        match self.transport.send(&self.url, request).await {
            Ok(raw) => self.absorb(raw),
            Err(err) => {
                self.response.status_detail = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn absorb(&mut self, raw: RawResponse) -> Result<(), Error> {
        let http_ok = raw.is_success();
        let RawResponse {
            status,
            reason,
            headers,
            body,
        } = raw;
        let http_error = || Error::Http {
            status,
            reason: reason.clone().unwrap_or_default(),
        };

        self.response.http_status = Some(status);
        self.response.reason.clone_from(&reason);
        trace!(status, ?headers, "classifying response");

        let classified = classify::classify(&headers, body);
        self.response.headers = headers;

        let classified = match classified {
            Ok(classified) => classified,
            Err(ClassifyError(message)) => {
                self.response.status_detail = Some(message.clone());
                return Err(if http_ok {
                    Error::Classification { message }
                } else {
                    http_error()
                });
            }
        };

        match classified {
            Classified::Attachment(attachment) => {
                self.response.attachment = Some(attachment);
                self.response.status = Some(Status::Success);
                if http_ok { Ok(()) } else { Err(http_error()) }
            }
            Classified::Text(text) => {
                self.response.status_detail = Some(text.clone());
                self.response.text = Some(text);
                self.response.status = Some(Status::Success);
                if http_ok { Ok(()) } else { Err(http_error()) }
            }
            Classified::Xml(body) => match self.absorb_xml(&body) {
                Ok(()) if !http_ok => Err(http_error()),
                Err(Error::Classification { .. } | Error::XmlParse { .. }) if !http_ok => {
                    Err(http_error())
                }
                other => other,
            },
        }
    }

    fn absorb_xml(&mut self, body: &[u8]) -> Result<(), Error> {
        let root = match interpret::parse_document(body) {
            Ok((document, root)) => {
                trace!(document = %document, "xml document");
                self.response.xml_document = Some(document);
                root
            }
            Err((document, message)) => {
                self.response.xml_document = document;
                self.response.status_detail = Some(message.clone());
                return Err(Error::XmlParse { message });
            }
        };

        let verdict = interpret::interpret(&root);
        self.response.root = Some(root);

        let verdict = match verdict {
            Ok(verdict) => verdict,
            Err(message) => {
                self.response.status_detail = Some(message.clone());
                return Err(Error::Classification { message });
            }
        };

        self.response.status = Some(verdict.status.clone());
        self.response.status_code.clone_from(&verdict.code);
        self.response.status_detail.clone_from(&verdict.message);

        if verdict.is_success() {
            return Ok(());
        }

        let message = verdict.message.unwrap_or_else(|| match &verdict.code {
            Some(code) => format!("request failed: status=\"{}\" code=\"{code}\"", verdict.status),
            None => format!("request failed: status=\"{}\"", verdict.status),
        });
        debug!(status = %verdict.status, code = ?verdict.code, "XML API reported an error");
        Err(Error::Api {
            message,
            code: verdict.code,
        })
    }
}
