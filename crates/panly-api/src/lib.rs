// panly-api: Async Rust client for the PAN-OS XML API (firewall + Panorama)

pub mod classify;
pub mod config;
pub mod error;
pub mod interpret;
pub mod poll;
pub mod response;
pub mod transport;
pub mod xapi;
pub mod xml;

pub use classify::{Attachment, Classified, ContentKind};
pub use config::{AuthCredentials, XapiConfig};
pub use error::Error;
pub use interpret::{Interpretation, Status};
pub use poll::{Check, Completion, JobPoll, PollSettings, PollState};
pub use response::Response;
pub use transport::{ApiRequest, FileUpload, HttpTransport, RawResponse, TlsMode, Transport, TransportConfig};
pub use xapi::{
    CommitRequest, ConfigAction, ExportQuery, ImportRequest, JobCheck, LogQuery, ReportQuery,
    XapiClient, cmd_xml,
};
pub use xml::Element;
