//! Streaming XML → [`Document`] parser.
//!
//! Tokens are pulled one at a time from a `quick-xml` reader over a buffered byte
//! stream, so the input is never held as text in full. Encodings declared in the XML
//! prolog, such as ISO-8859-2, are transcoded to UTF-8 for names, text and
//! attribute values. UTF-16 input is not supported: the reader rejects it with a
//! decoding error, so such files are reported as failed.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::dom::{Document, Node};
use crate::error::{ParseError, ParseResult};

/// Parse the file at `path`
pub fn parse_file(path: &Path) -> ParseResult<Document> {
    let file = File::open(path)?;
    parse_reader(BufReader::new(file))
}

/// Parse an in-memory document
pub fn parse_str(xml: &str) -> ParseResult<Document> {
    parse_reader(xml.as_bytes())
}

/// Parse any buffered byte stream positioned at the start of a document
pub fn parse_reader<R: BufRead>(input: R) -> ParseResult<Document> {
    let mut reader = Reader::from_reader(input);
    // Whitespace-only runs are kept: they overwrite earlier text like any other run.
    reader.trim_text(false);

    let mut builder = TreeBuilder::default();
    let mut buf = Vec::new();

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|source| ParseError::Xml {
                position: reader.buffer_position(),
                source,
            })?;

        match event {
            Event::Start(e) => {
                let node = start_node(&reader, &e, position)?;
                builder.open(node);
            }
            Event::Empty(e) => {
                let node = start_node(&reader, &e, position)?;
                builder.open(node);
                builder.close(position)?;
            }
            Event::End(_) => builder.close(position)?,
            Event::Text(e) => {
                let text = e.unescape().map_err(|source| ParseError::Xml { position, source })?;
                builder.text(&text);
            }
            Event::CData(e) => {
                let text = decode(&reader, &e, position)?;
                builder.text(&text);
            }
            Event::Decl(e) => {
                let content = decode(&reader, &e, position)?;
                builder.processing_instruction(format!("<?{}?>", content));
            }
            Event::PI(e) => {
                let content = decode(&reader, &e, position)?;
                builder.processing_instruction(format!("<?{}?>", content));
            }
            Event::DocType(e) => {
                let content = decode(&reader, &e, position)?;
                builder.directive(format!("<!DOCTYPE {}>", content.trim()));
            }
            Event::Comment(_) => {}
            Event::Eof => break,
        }
        buf.clear();
    }

    builder.finish(reader.buffer_position())
}

fn decode<R>(reader: &Reader<R>, bytes: &[u8], position: usize) -> ParseResult<String> {
    reader
        .decoder()
        .decode(bytes)
        .map(|text| text.into_owned())
        .map_err(|source| ParseError::Xml { position, source })
}

/// Build a [`Node`] from a start (or empty) tag, copying every attribute in order.
fn start_node<R>(reader: &Reader<R>, start: &BytesStart, position: usize) -> ParseResult<Node> {
    let mut node = Node::new(decode(reader, start.local_name().as_ref(), position)?);

    // Duplicate attribute names are kept as-is, so the reader must not reject them.
    for attr in start.attributes().with_checks(false) {
        let attr = attr.map_err(|e| ParseError::Xml {
            position,
            source: e.into(),
        })?;

        let raw_key = attr.key.as_ref();
        let key = if raw_key == b"xmlns" || raw_key.starts_with(b"xmlns:") {
            decode(reader, raw_key, position)?
        } else {
            decode(reader, attr.key.local_name().as_ref(), position)?
        };
        let value = attr
            .decode_and_unescape_value(reader)
            .map_err(|source| ParseError::Xml { position, source })?
            .into_owned();

        node.attributes.push((key, value));
    }

    Ok(node)
}

/// Assembles the element tree from open/close/text callbacks.
///
/// Open elements live on a stack; closing one moves it into its parent, so every
/// node has exactly one owner.
#[derive(Debug, Default)]
struct TreeBuilder {
    stack: Vec<Node>,
    document: Document,
    root_closed: bool,
}

impl TreeBuilder {
    fn open(&mut self, node: Node) {
        self.stack.push(node);
    }

    fn close(&mut self, position: usize) -> ParseResult<()> {
        let node = self.stack.pop().ok_or_else(|| ParseError::Structural {
            position,
            details: "end tag with no open element".to_string(),
        })?;

        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            // Only the first top-level element becomes the root; later siblings are dropped.
            None if !self.root_closed => {
                self.document.root = Some(node);
                self.root_closed = true;
            }
            None => {}
        }
        Ok(())
    }

    fn text(&mut self, raw: &str) {
        if let Some(current) = self.stack.last_mut() {
            let trimmed = raw.trim();
            current.text = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
    }

    fn processing_instruction(&mut self, pi: String) {
        self.document.processing_instructions.push(pi);
    }

    fn directive(&mut self, directive: String) {
        self.document.directives.push(directive);
    }

    fn finish(self, position: usize) -> ParseResult<Document> {
        if let Some(open) = self.stack.last() {
            return Err(ParseError::Structural {
                position,
                details: format!(
                    "input ended with {} unclosed element(s), innermost <{}>",
                    self.stack.len(),
                    open.name
                ),
            });
        }
        Ok(self.document)
    }
}
