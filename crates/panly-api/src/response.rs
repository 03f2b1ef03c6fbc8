// Last-response state held by the client.
//
// Cleared at the start of every call and filled in as the exchange
// progresses, so whatever was learned before a failure stays inspectable.

use reqwest::header::HeaderMap;

use crate::classify::Attachment;
use crate::interpret::{self, Status};
use crate::xml::Element;

/// Everything known about the most recent exchange.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub(crate) http_status: Option<u16>,
    pub(crate) reason: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) xml_document: Option<String>,
    pub(crate) root: Option<Element>,
    pub(crate) text: Option<String>,
    pub(crate) attachment: Option<Attachment>,
    pub(crate) status: Option<Status>,
    pub(crate) status_code: Option<String>,
    pub(crate) status_detail: Option<String>,
}

impl Response {
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// `success` / `error` from the root element (forced to success for
    /// attachments and plain text).
    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.status.as_ref().is_some_and(Status::is_success)
    }

    /// The root element's `code` attribute.
    pub fn status_code(&self) -> Option<&str> {
        self.status_code.as_deref()
    }

    /// The best diagnostic text gathered for this exchange.
    pub fn status_detail(&self) -> Option<&str> {
        self.status_detail.as_deref()
    }

    /// Decoded XML body, kept even when it failed to parse.
    pub fn xml_document(&self) -> Option<&str> {
        self.xml_document.as_deref()
    }

    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// `result` (or `report/result`) under the root.
    pub fn result(&self) -> Option<&Element> {
        self.root.as_ref().and_then(interpret::result_element)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    /// Job id from `result/job`, if the server queued one.
    pub fn job_id(&self) -> Option<&str> {
        self.root.as_ref()?.find_text("result/job")
    }

    /// The whole document re-serialized, or the raw text when it did
    /// not parse.
    pub fn xml_root(&self) -> Option<String> {
        match &self.root {
            Some(root) => Some(root.to_xml_string()),
            None => self.xml_document.clone(),
        }
    }

    /// The children of the result element, serialized back to back.
    pub fn xml_result(&self) -> Option<String> {
        let result = self.result()?;
        let xml: String = result.children().iter().map(Element::to_xml_string).collect();
        if xml.is_empty() { None } else { Some(xml) }
    }
}
