// File transfer endpoints
//
// `type=export` downloads (configs, certificates, packet captures,
// tech-support bundles) and `type=import` multipart uploads.

use tracing::debug;

use crate::error::Error;
use crate::transport::{FileUpload, Transport};
use crate::xapi::client::XapiClient;

/// Parameters for `type=export`.
#[derive(Debug, Clone, Default)]
pub struct ExportQuery {
    /// e.g. `configuration`, `certificate`, `filter-pcap`.
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Category-specific pairs, e.g. `certificate-name` and `format`.
    pub extra: Vec<(String, String)>,
}

/// Parameters for `type=import`.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub category: String,
    /// Name sent in the multipart `file` part.
    pub filename: String,
    pub content: Vec<u8>,
    pub extra: Vec<(String, String)>,
}

impl<T: Transport> XapiClient<T> {
    /// Export a file. Binary exports land in
    /// `last_response().attachment()` tagged with the requested
    /// category; XML exports (e.g. `configuration`) land in the document.
    pub async fn export(&mut self, query: &ExportQuery) -> Result<(), Error> {
        let mut request = self.authed_request("export").await?;
        request.push_opt("category", query.category.as_deref());
        request.push_opt("from", query.from.as_deref());
        request.push_opt("to", query.to.as_deref());
        for (name, value) in &query.extra {
            request.push(name, value.as_str());
        }

        self.execute(&request).await?;

        if let Some(attachment) = self.response.attachment.as_mut() {
            attachment.category.clone_from(&query.category);
            debug!(
                filename = ?attachment.filename,
                bytes = attachment.content.len(),
                "export attachment received"
            );
        }
        Ok(())
    }

    /// Upload a file with `type=import`.
    pub async fn import(&mut self, import: ImportRequest) -> Result<(), Error> {
        if import.filename.trim().is_empty() {
            return Err(Error::invalid("filename", &import.filename));
        }

        let mut request = self.authed_request("import").await?;
        request.push("category", import.category.as_str());
        for (name, value) in &import.extra {
            request.push(name, value.as_str());
        }
        debug!(
            category = %import.category,
            filename = %import.filename,
            bytes = import.content.len(),
            "importing file"
        );
        let request = request.with_upload(FileUpload {
            filename: import.filename,
            content: import.content,
        });

        self.execute(&request).await
    }
}
