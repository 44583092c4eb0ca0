//! Wire-format normalization.
//!
//! The storage endpoint answers in JSON or XML depending on transport,
//! so the body is classified by content, never by a content-type
//! header. The result is a tagged variant; downstream code pattern
//! matches on it and never inspects the original wire format.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::safe::expect_safe_object;

/// One parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body led with `[` or `{`
    Json(Value),
    /// Body led with an `<?xml` declaration, converted to an
    /// equivalent nested value
    Xml(Value),
    /// Anything else, untouched
    Text(String),
}

/// Transport success paired with the parsed body. Callers branch on
/// `ok` and the shape of `payload` only.
#[derive(Debug)]
pub struct Normalized {
    pub ok: bool,
    pub payload: Payload,
}

impl Payload {
    /// Content-sniff and parse a response body. Structured results are
    /// safe-object validated before they are returned.
    pub fn classify(body: &str) -> Result<Payload> {
        let lead = body.trim_start();
        if lead.starts_with('[') || lead.starts_with('{') {
            let value: Value = serde_json::from_str(lead)?;
            expect_safe_object(&value)?;
            Ok(Payload::Json(value))
        } else if lead
            .get(..5)
            .is_some_and(|p| p.eq_ignore_ascii_case("<?xml"))
        {
            let value = xml_to_value(lead)?;
            expect_safe_object(&value)?;
            Ok(Payload::Xml(value))
        } else {
            Ok(Payload::Text(body.to_string()))
        }
    }

    /// Structured view, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) | Payload::Xml(value) => Some(value),
            Payload::Text(_) => None,
        }
    }
}

struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> Value {
        if self.children.is_empty() {
            Value::String(self.text)
        } else {
            Value::Object(self.children)
        }
    }
}

/// Repeated sibling elements collapse into an array; a lone element
/// stays an object. This deliberately preserves the wire ambiguity the
/// listing engine normalizes (single- vs multi-entry `Contents`).
fn insert_child(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(name, value);
        }
    }
}

/// Convert an XML document into a nested value, element text as
/// strings, attributes ignored.
pub fn xml_to_value(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    // Virtual root frame collects the document element
    let mut stack: Vec<Frame> = vec![Frame::new(String::new())];

    loop {
        match reader.read_event().map_err(quick_xml::Error::from)? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                stack.push(Frame::new(name));
            }
            Event::Empty(empty) => {
                let name = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                if let Some(parent) = stack.last_mut() {
                    insert_child(&mut parent.children, name, Value::String(String::new()));
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(quick_xml::Error::from)?;
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(trimmed);
                    }
                }
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    let frame = stack.pop().expect("stack holds at least the root");
                    let name = frame.name.clone();
                    let value = frame.into_value();
                    if let Some(parent) = stack.last_mut() {
                        insert_child(&mut parent.children, name, value);
                    }
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions
            _ => {}
        }
    }

    let root = stack.pop().expect("stack holds at least the root");
    Ok(Value::Object(root.children))
}
