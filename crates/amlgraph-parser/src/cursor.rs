//! Pull-based event cursor over an XML byte stream.
//!
//! [`EventCursor`] turns the raw `quick-xml` reader into a lazy, finite
//! sequence of [`XmlEvent`]s. The sequence cannot be restarted: once the
//! cursor yields an error or reaches the end of the document it is exhausted.

use std::{borrow::Cow, io::BufRead};

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    node::Node,
};

/// A single step through the document.
#[derive(Debug)]
pub(crate) enum XmlEvent {
    /// An element started. The node carries its attributes but no children.
    Enter(Node),
    /// Unescaped character data that is not pure whitespace.
    Text(String),
    /// The most recently entered, still open element ended.
    Exit,
}

/// Cursor over the start/text/end events of an XML document.
pub(crate) struct EventCursor<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
    pending_exit: bool,
    finished: bool,
}

impl<R: BufRead> EventCursor<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            depth: 0,
            pending_exit: false,
            finished: false,
        }
    }

    /// Current byte position in the source.
    pub fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }
}

impl<R: BufRead> Iterator for EventCursor<R> {
    type Item = Result<XmlEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.pending_exit {
            self.pending_exit = false;
            self.depth -= 1;
            return Some(Ok(XmlEvent::Exit));
        }

        loop {
            self.buf.clear();
            let offset = self.reader.buffer_position() as u64;
            let step = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(start)) => element(&start, offset).map(|node| {
                    self.depth += 1;
                    Some(XmlEvent::Enter(node))
                }),
                Ok(Event::Empty(start)) => element(&start, offset).map(|node| {
                    self.depth += 1;
                    self.pending_exit = true;
                    Some(XmlEvent::Enter(node))
                }),
                Ok(Event::End(_)) => {
                    self.depth -= 1;
                    Ok(Some(XmlEvent::Exit))
                }
                Ok(Event::Text(text)) => text
                    .unescape()
                    .map_err(|err| invalid_text(&err, offset))
                    .map(text_event),
                Ok(Event::CData(data)) => String::from_utf8(data.into_inner().into_owned())
                    .map_err(|err| invalid_text(&err, offset))
                    .map(|text| text_event(Cow::Owned(text))),
                Ok(Event::Eof) => {
                    self.finished = true;
                    if self.depth > 0 {
                        return Some(Err(Diagnostic::error(format!(
                            "document ended with {} unclosed element(s)",
                            self.depth
                        ))
                        .with_code(ErrorCode::E003)
                        .with_offset(offset)));
                    }
                    return None;
                }
                Ok(_) => Ok(None),
                Err(err) => Err(Diagnostic::error(format!("malformed XML: {err}"))
                    .with_code(ErrorCode::E001)
                    .with_offset(self.reader.buffer_position() as u64)),
            };

            match step {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => continue,
                Err(diagnostic) => {
                    self.finished = true;
                    return Some(Err(diagnostic));
                }
            }
        }
    }
}

/// Builds a childless node from a start tag.
fn element(start: &BytesStart<'_>, offset: u64) -> Result<Node> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|err| invalid_text(&err, offset))?
        .to_string();

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| {
            Diagnostic::error(format!("malformed attribute in `{name}`: {err}"))
                .with_code(ErrorCode::E001)
                .with_offset(offset)
        })?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|err| invalid_text(&err, offset))?
            .to_string();
        let value = attribute
            .unescape_value()
            .map_err(|err| invalid_text(&err, offset))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Node::new(name, attributes, offset))
}

/// Whitespace-only runs are layout, not content.
fn text_event(text: Cow<'_, str>) -> Option<XmlEvent> {
    if text.trim().is_empty() {
        None
    } else {
        Some(XmlEvent::Text(text.into_owned()))
    }
}

fn invalid_text(err: &dyn std::fmt::Display, offset: u64) -> Diagnostic {
    Diagnostic::error(format!("invalid text: {err}"))
        .with_code(ErrorCode::E002)
        .with_offset(offset)
}

/// Builds a complete node tree from a small document.
#[cfg(test)]
pub(crate) fn tree(source: &str) -> Node {
    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;
    for event in EventCursor::new(source.as_bytes()) {
        match event.expect("test document is well formed") {
            XmlEvent::Enter(node) => stack.push(node),
            XmlEvent::Text(text) => stack.last_mut().unwrap().push_text(&text),
            XmlEvent::Exit => {
                let node = stack.pop().unwrap();
                match stack.last_mut() {
                    Some(parent) => parent.push_child(node),
                    None => root = Some(node),
                }
            }
        }
    }
    root.expect("test document has a root element")
}
