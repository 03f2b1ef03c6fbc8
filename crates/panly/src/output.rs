//! Response rendering.

use panly_api::Response;

use crate::cli::OutputMode;

/// What to write to stdout for a finished request.
pub fn render(response: &Response, mode: OutputMode) -> Option<String> {
    if let Some(text) = response.text() {
        return (mode != OutputMode::None).then(|| text.to_owned());
    }
    match mode {
        OutputMode::Result => response.xml_result(),
        OutputMode::Root => response.xml_root(),
        OutputMode::Detail => response.status_detail().map(String::from),
        OutputMode::None => None,
    }
}

/// `show: success [code: 19]`, plus the detail on its own line when the
/// detail is not already being printed.
pub fn status_line(command: &str, response: &Response, mode: OutputMode) -> String {
    let mut line = format!(
        "{command}: {}",
        response.status().map_or("unknown", |s| s.as_str())
    );
    if let Some(code) = response.status_code() {
        line.push_str(&format!(" [code: {code}]"));
    }
    if mode != OutputMode::Detail && response.text().is_none() {
        if let Some(detail) = response.status_detail() {
            line.push_str(": ");
            line.push_str(detail);
        }
    }
    line
}
