// Response classification
//
// Maps `content-type` / `content-disposition` headers onto the closed set
// of body kinds the XML API produces. Pure: no I/O, no client state.

use std::collections::BTreeSet;

use bytes::Bytes;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};

/// The body kinds the client knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `application/octet-stream`, or `text/plain` sent with a
    /// `content-disposition` header (a server quirk on some exports).
    Attachment,
    /// `application/xml`, with or without a charset.
    Xml,
    /// `text/plain; charset=utf-8`.
    Text,
}

/// A file delivered as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Filename from `content-disposition`, when it is a plain token.
    pub filename: Option<String>,
    pub content: Bytes,
    /// Export category the attachment was requested under, if any.
    pub category: Option<String>,
}

/// A classified body. XML stays raw here; the interpreter parses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Xml(Bytes),
    Text(String),
    Attachment(Attachment),
}

/// Classification failure text, surfaced verbatim to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyError(pub String);

impl std::fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split a header into lower-cased, trimmed `;`-separated tokens.
fn header_tokens(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<(String, BTreeSet<String>)> {
    let raw = headers.get(name)?;
    let raw = String::from_utf8_lossy(raw.as_bytes()).into_owned();
    let tokens = raw
        .split(';')
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>();
    if tokens.is_empty() {
        return None;
    }
    Some((raw, tokens))
}

/// Decide which handler a response goes to. First match wins.
pub fn content_kind(headers: &HeaderMap) -> Result<ContentKind, ClassifyError> {
    let Some((raw, content_type)) = header_tokens(headers, CONTENT_TYPE) else {
        return Err(ClassifyError("no content-type response header".into()));
    };

    if content_type.contains("application/octet-stream")
        || (content_type.contains("text/plain") && headers.contains_key(CONTENT_DISPOSITION))
    {
        return Ok(ContentKind::Attachment);
    }
    if content_type.contains("application/xml") {
        return Ok(ContentKind::Xml);
    }
    if content_type.contains("text/plain") && content_type.contains("charset=utf-8") {
        return Ok(ContentKind::Text);
    }

    Err(ClassifyError(format!("no handler for content-type: {raw}")))
}

/// Classify a response body by its headers.
pub fn classify(headers: &HeaderMap, body: Bytes) -> Result<Classified, ClassifyError> {
    match content_kind(headers)? {
        ContentKind::Attachment => attachment(headers, body).map(Classified::Attachment),
        ContentKind::Xml => Ok(Classified::Xml(body)),
        ContentKind::Text => String::from_utf8(body.to_vec())
            .map(Classified::Text)
            .map_err(|e| ClassifyError(format!("text/plain body is not UTF-8: {e}"))),
    }
}

fn attachment(headers: &HeaderMap, body: Bytes) -> Result<Attachment, ClassifyError> {
    let Some((raw, disposition)) = header_tokens(headers, CONTENT_DISPOSITION) else {
        return Err(ClassifyError("no content-disposition response header".into()));
    };

    if !disposition.contains("attachment") {
        return Err(ClassifyError(format!(
            "no handler for content-disposition: {raw}"
        )));
    }

    // Re-split the raw header so the filename keeps its case.
    let filename = raw.split(';').map(str::trim).find_map(filename_token);

    Ok(Attachment {
        filename,
        content: body,
        category: None,
    })
}

/// `filename=<token>` where the token is alphanumerics, `.`, `-`, `_`.
fn filename_token(param: &str) -> Option<String> {
    let (name, value) = param.split_once('=')?;
    if !name.trim().eq_ignore_ascii_case("filename") {
        return None;
    }
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    valid.then(|| value.to_owned())
}
