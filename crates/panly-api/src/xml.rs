// Owned XML element tree
//
// A small ElementTree-style model over `quick-xml` events: each element
// keeps its ordered attributes, the text before its first child, its
// children, and the text that follows it inside the parent. Response
// documents are short-lived and small, so an owned tree is simpler to
// hold on the client than a borrowed one.

use std::fmt::Write as _;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

/// One parsed XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    tail: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a complete document and return its root element.
    pub fn parse(document: &str) -> Result<Self, String> {
        let mut reader = Reader::from_str(document);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| format!("{e} (position {})", reader.error_position()))?;
            match event {
                Event::Start(start) => {
                    if root.is_some() {
                        return Err(junk_after_root(&reader));
                    }
                    stack.push(Self::from_start(&start)?);
                }
                Event::Empty(start) => {
                    if root.is_some() {
                        return Err(junk_after_root(&reader));
                    }
                    let element = Self::from_start(&start)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    // quick-xml has already checked the end name.
                    let Some(element) = stack.pop() else {
                        return Err(format!(
                            "unexpected end tag (position {})",
                            reader.buffer_position()
                        ));
                    };
                    attach(&mut stack, &mut root, element);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| e.to_string())?;
                    push_text(&mut stack, &text, root.is_some())?;
                }
                Event::CData(cdata) => {
                    let raw = cdata.into_inner();
                    let text = std::str::from_utf8(&raw).map_err(|e| e.to_string())?;
                    push_text(&mut stack, text, root.is_some())?;
                }
                Event::Eof => break,
                Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(format!("unclosed element <{}>", open.name));
        }
        root.ok_or_else(|| "no element found".to_owned())
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = Self::new(name);
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            element.attributes.push((key, value.into_owned()));
        }
        Ok(element)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text before the first child element, exactly as parsed.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text with surrounding whitespace removed; `None` when blank.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    // ── Builders ─────────────────────────────────────────────────────

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    // ── Path queries ─────────────────────────────────────────────────

    /// All descendants matching a relative path such as `./result/job`
    /// or `msg/line/uid-response/payload/*/entry`, in document order.
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let mut current: Vec<&Element> = vec![self];
        for step in path_steps(path) {
            current = current
                .into_iter()
                .flat_map(|e| e.children.iter())
                .filter(|c| step == "*" || c.name == step)
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// First descendant matching `path`.
    pub fn find(&self, path: &str) -> Option<&Element> {
        let mut steps = path_steps(path).peekable();
        if steps.peek().is_none() {
            return Some(self);
        }
        self.find_steps(&steps.collect::<Vec<_>>())
    }

    fn find_steps(&self, steps: &[&str]) -> Option<&Element> {
        let (step, rest) = steps.split_first()?;
        self.children
            .iter()
            .filter(|c| *step == "*" || c.name == *step)
            .find_map(|c| if rest.is_empty() { Some(c) } else { c.find_steps(rest) })
    }

    /// Trimmed text of the first element matching `path`.
    pub fn find_text(&self, path: &str) -> Option<&str> {
        self.find(path).and_then(Element::trimmed_text)
    }

    // ── Serialization ────────────────────────────────────────────────

    /// Serialize this element (and its subtree) back to XML. The tail
    /// is not included.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            let _ = write!(out, " {key}=\"{}\"", escape(value.as_str()));
        }
        if self.text.is_none() && self.children.is_empty() {
            out.push_str(" />");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape(text.as_str()));
        }
        for child in &self.children {
            child.write_into(out);
            if let Some(tail) = &child.tail {
                out.push_str(&escape(tail.as_str()));
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn path_steps(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

/// Character data goes to the open element's text if it has no children
/// yet, otherwise to the tail of its last child.
fn push_text(stack: &mut [Element], text: &str, after_root: bool) -> Result<(), String> {
    let Some(parent) = stack.last_mut() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(if after_root {
            "junk after document element".to_owned()
        } else {
            "text outside of document element".to_owned()
        });
    };
    let slot = match parent.children.last_mut() {
        Some(last) => &mut last.tail,
        None => &mut parent.text,
    };
    slot.get_or_insert_with(String::new).push_str(text);
    Ok(())
}

fn junk_after_root(reader: &Reader<&[u8]>) -> String {
    format!(
        "junk after document element (position {})",
        reader.buffer_position()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const JOBS: &str = r#"<response status="success"><result>
        <job><id>4</id><status>ACT</status><details><line>one</line><line><newjob><newmsg>two</newmsg></newjob></line></details></job>
        <job><id>5</id><status>FIN</status></job>
    </result></response>"#;

    #[test]
    fn parses_attributes_in_document_order() {
        let root = Element::parse(r#"<entry name="u1" ip="192.0.2.1" z="1"/>"#).unwrap();
        let keys: Vec<&str> = root.attributes().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["name", "ip", "z"]);
        assert_eq!(root.attr("ip"), Some("192.0.2.1"));
    }

    #[test]
    fn find_follows_relative_paths() {
        let root = Element::parse(JOBS).unwrap();
        assert_eq!(root.find_text("./result/job/status"), Some("ACT"));
        assert_eq!(root.find_all("result/job").len(), 2);
        assert_eq!(root.find_all("result/job/details/line").len(), 2);
        assert!(root.find("result/nope").is_none());
        assert_eq!(root.find(".").map(Element::name), Some("response"));
    }

    #[test]
    fn wildcard_matches_any_child() {
        let root = Element::parse(
            "<r><msg><line><uid-response><payload>\
             <login><entry user='a'/></login><logout><entry user='b'/></logout>\
             </payload></uid-response></line></msg></r>",
        )
        .unwrap();
        let entries = root.find_all("msg/line/uid-response/payload/*/entry");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].attr("user"), Some("b"));
    }

    #[test]
    fn text_before_children_and_tail_after() {
        let root = Element::parse("<a>head<b>inner</b>tail</a>").unwrap();
        assert_eq!(root.text(), Some("head"));
        assert_eq!(root.children()[0].text(), Some("inner"));
        assert_eq!(root.to_xml_string(), "<a>head<b>inner</b>tail</a>");
    }

    #[test]
    fn cdata_and_entities_are_decoded() {
        let root = Element::parse("<m><![CDATA[a < b]]> &amp; c</m>").unwrap();
        assert_eq!(root.text(), Some("a < b & c"));
        assert_eq!(root.to_xml_string(), "<m>a &lt; b &amp; c</m>");
    }

    #[test]
    fn serializes_empty_elements_self_closed() {
        let root = Element::parse(r#"<?xml version="1.0"?><r code="19"><x/></r>"#).unwrap();
        assert_eq!(root.to_xml_string(), r#"<r code="19"><x /></r>"#);
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(Element::parse("<a><b></a>").is_err());
        assert!(Element::parse("<a>").unwrap_err().contains("unclosed"));
        assert!(Element::parse("").unwrap_err().contains("no element"));
        assert!(Element::parse("<a/><b/>").unwrap_err().contains("junk"));
        assert!(Element::parse("plain text").is_err());
    }

    #[test]
    fn builder_round_trips_through_parser() {
        let built = Element::new("multi-config").with_child(
            Element::new("set")
                .with_attr("id", "101")
                .with_child(Element::new("ip-netmask").with_text("192.0.2.1/32")),
        );
        let parsed = Element::parse(&built.to_xml_string()).unwrap();
        assert_eq!(parsed, built);
    }
}
