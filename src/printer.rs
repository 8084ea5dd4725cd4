//! Schema sketch rendering.
//!
//! The aggregate tree is rendered top-down in a single pass as annotated pseudo-XML:
//!
//! ```text
//! <root _count="4">
//!   <a _count="5" id="3" />
//!   <b _count="2" _optional="true" />
//! </root>
//! ```

use std::io::{self, Write};

use crate::elements::{Elements, is_optional};

const INDENT: &str = "  ";

/// Write one level of the tree, recursing into children.
///
/// `parent_count` is the occurrence count of the enclosing element; for the top level
/// it is the number of documents merged.
pub fn print<W: Write>(
    out: &mut W,
    elements: &Elements,
    depth: usize,
    parent_count: usize,
) -> io::Result<()> {
    let indent = INDENT.repeat(depth);

    for (name, stat) in elements.entries() {
        let count = stat.count();
        write!(out, "\n{}<{} _count=\"{}\"", indent, name, count)?;

        if is_optional(count, parent_count) {
            write!(out, " _optional=\"true\"")?;
        }

        for (attribute, occurrences) in stat.attributes().get() {
            write!(out, " {}=\"{}\"", attribute, occurrences)?;
        }

        if stat.children().is_empty() {
            write!(out, " />")?;
        } else {
            write!(out, ">")?;
            print(out, stat.children(), depth + 1, count)?;
            write!(out, "\n{}</{}>", indent, name)?;
        }
    }

    Ok(())
}

/// Write the whole schema sketch followed by a final newline
pub fn write_schema<W: Write>(out: &mut W, elements: &Elements, documents: usize) -> io::Result<()> {
    print(out, elements, 0, documents)?;
    writeln!(out)
}

/// Render the schema sketch into a string
pub fn render_schema(elements: &Elements, documents: usize) -> io::Result<String> {
    let mut buffer = Vec::new();
    write_schema(&mut buffer, elements, documents)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Render the aggregate tree as pretty-printed JSON
pub fn render_json(elements: &Elements, documents: usize) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&elements.snapshot(documents))
}
