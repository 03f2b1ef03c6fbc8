// XML API facade
//
// `XapiClient` and its operations, split by request family:
// config actions, operational commands, long-running jobs and file
// transfer. Each file adds inherent methods to the client.

mod client;
mod configure;
mod files;
mod jobs;
mod op;

pub use client::XapiClient;
pub use configure::ConfigAction;
pub use files::{ExportQuery, ImportRequest};
pub use jobs::{CommitRequest, JobCheck, LogQuery, ReportQuery};
pub use op::cmd_xml;
