// XML result interpretation
//
// Turns a parsed response root into a status, an optional vendor code and
// an optional diagnostic message. The message formats are undocumented;
// `MESSAGE_RULES` lists the shapes seen in the wild, most specific first.

use tracing::trace;

use crate::xml::Element;

/// Value of the root element's `status` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    /// Any other value the server sent (e.g. `unauth`).
    Other(String),
}

impl Status {
    pub fn parse(value: &str) -> Self {
        match value {
            "success" => Self::Success,
            "error" => Self::Error,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the interpreter learned from a response root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub status: Status,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl Interpretation {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Decode and parse a response body.
pub fn parse_document(body: &[u8]) -> Result<(String, Element), (Option<String>, String)> {
    let document = std::str::from_utf8(body)
        .map_err(|e| (None, format!("XML document is not UTF-8: {e}")))?
        .to_owned();
    match Element::parse(&document) {
        Ok(root) => Ok((document, root)),
        Err(e) => Err((Some(document), format!("XML parse error: {e}"))),
    }
}

/// Read status, code and message from a parsed root.
///
/// A missing `status` attribute means success; a root with no
/// attributes at all is rejected.
pub fn interpret(root: &Element) -> Result<Interpretation, String> {
    if root.attributes().is_empty() {
        return Err("no response element status attribute".into());
    }

    let status = root.attr("status").map_or(Status::Success, Status::parse);
    let code = root.attr("code").map(String::from);
    let message = response_message(root);

    Ok(Interpretation {
        status,
        code,
        message,
    })
}

/// The primary result element: `result`, or `report/result` for
/// report documents.
pub fn result_element(root: &Element) -> Option<&Element> {
    root.find("result").or_else(|| root.find("report/result"))
}

// ── Message extraction ───────────────────────────────────────────────

/// How a matched set of elements becomes message text.
#[derive(Debug, Clone, Copy)]
enum Extract {
    /// `key: value` pairs of every attribute, one line per element.
    AttributePairs,
    /// Each element's text, or its nested fallback element's text.
    Lines { fallback: Option<&'static str> },
    /// Text of the first match only.
    First,
    /// One summary line per nested `response` (multi-config).
    Responses,
}

#[derive(Debug, Clone, Copy)]
struct MessageRule {
    path: &'static str,
    extract: Extract,
}

/// Tried in order; the first rule producing text wins.
const MESSAGE_RULES: &[MessageRule] = &[
    // type=user-id register/unregister
    MessageRule {
        path: "msg/line/uid-response/payload/*/entry",
        extract: Extract::AttributePairs,
    },
    // <line><line>xxx</line></line> on some error paths
    MessageRule {
        path: "msg/line",
        extract: Extract::Lines {
            fallback: Some("line"),
        },
    },
    MessageRule {
        path: "result/msg/line",
        extract: Extract::Lines { fallback: None },
    },
    MessageRule {
        path: "result/msg",
        extract: Extract::First,
    },
    MessageRule {
        path: "msg",
        extract: Extract::First,
    },
    // 'show jobs id N' and 'show jobs all'
    MessageRule {
        path: "result/job/details/line",
        extract: Extract::Lines {
            fallback: Some("newjob/newmsg"),
        },
    },
    // type=multi-config
    MessageRule {
        path: "response",
        extract: Extract::Responses,
    },
];

/// Extract the first non-empty diagnostic message from a response root.
pub fn response_message(root: &Element) -> Option<String> {
    MESSAGE_RULES.iter().find_map(|rule| {
        let matches = root.find_all(rule.path);
        if matches.is_empty() {
            return None;
        }
        let message = apply(rule.extract, &matches);
        if message.is_some() {
            trace!(path = rule.path, "response message matched");
        }
        message
    })
}

fn apply(extract: Extract, elements: &[&Element]) -> Option<String> {
    let lines: Vec<String> = match extract {
        Extract::AttributePairs => elements
            .iter()
            .map(|e| {
                e.attributes()
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|line| !line.is_empty())
            .collect(),
        Extract::Lines { fallback } => elements
            .iter()
            .filter_map(|e| {
                e.trimmed_text()
                    .or_else(|| fallback.and_then(|path| e.find_text(path)))
                    .map(String::from)
            })
            .collect(),
        Extract::First => elements
            .first()
            .and_then(|e| e.trimmed_text())
            .map(String::from)
            .into_iter()
            .collect(),
        Extract::Responses => elements.iter().map(|e| response_summary(e)).collect(),
    };

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// `status="error" code="12" id="x" <message>` for one nested response.
fn response_summary(response: &Element) -> String {
    let mut line = ["status", "code", "id"]
        .iter()
        .filter_map(|name| response.attr(name).map(|v| format!("{name}=\"{v}\"")))
        .collect::<Vec<_>>()
        .join(" ");

    let lines: Vec<&str> = response
        .find_all("msg/line")
        .into_iter()
        .filter_map(Element::text)
        .collect();
    let text = if lines.is_empty() {
        response.find("msg").and_then(Element::text).map(String::from)
    } else {
        Some(lines.join(" "))
    };

    if let Some(text) = text {
        line.push(' ');
        line.push_str(&text);
    }
    line.trim_end().to_owned()
}
