//! Tolerant HTML reader and writer for generated markup.
//!
//! Generated artifacts arrive mid-stream and are frequently cut off inside a
//! tag or a script, so the reader never fails: it recovers the way a browser
//! does for the common cases and drops only what it cannot place.
//!
//! - `<!-- -->` comments and `<!DOCTYPE>` / `<![CDATA[` declarations
//! - void elements (`<img>`, `<br>`, ...) and `/>` self-closing syntax
//! - raw-text elements (`<script>`, `<style>`, `<textarea>`, `<title>`) whose
//!   bodies are taken verbatim up to the matching end tag
//! - quoted, unquoted, and bare boolean attributes (first occurrence wins)
//! - stray or mismatched end tags (ignored unless an open element matches)
//! - a tag left unterminated at the end of input (dropped)
//!
//! Text and attribute values are kept as written, so serializing a parsed
//! tree reproduces the input up to attribute quoting.

#[cfg(test)]
#[path = "html_test.rs"]
mod html_test;

use crate::dom::{Attribute, Document, Element, NodeData};

/// Elements whose content is text up to the matching end tag.
const RAW_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "textarea", "title"];

/// Wrappers dropped when parsing into an element. A `<head>` is dropped with
/// its content, so a saved whole document re-renders as just its body.
const DOCUMENT_WRAPPERS: [&str; 3] = ["html", "head", "body"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ParseMode {
    /// Whole document; wrappers and doctype are kept.
    Document,
    /// Element content; wrappers and doctype are dropped, the content of
    /// `<html>` and `<body>` kept, and `<head>` dropped entirely.
    Fragment,
}

/// Parse `markup` and append the resulting nodes under `parent`.
pub(crate) fn parse_into(doc: &mut Document, parent: usize, markup: &str, mode: ParseMode) {
    let mut parser = Parser { doc, input: markup, pos: 0, stack: vec![parent], mode, after_wrapper: false };
    parser.run();
}

/// Escape plain text for use as element content.
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    value.replace('"', "&quot;")
}

// =============================================================================
// READER
// =============================================================================

struct Parser<'d, 'i> {
    doc: &'d mut Document,
    input: &'i str,
    pos: usize,
    /// Open elements; `stack[0]` is the insertion root and is never popped.
    stack: Vec<usize>,
    mode: ParseMode,
    /// A fragment-mode wrapper tag was the last thing consumed.
    after_wrapper: bool,
}

impl Parser<'_, '_> {
    fn run(&mut self) {
        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];
            if rest.starts_with("<!--") {
                self.comment();
            } else if rest.starts_with("</") {
                if !self.end_tag() {
                    self.text_run(1);
                }
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.declaration();
            } else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
                if !self.start_tag() {
                    // Unterminated tag at end of input.
                    self.pos = self.input.len();
                }
            } else {
                self.text_run(usize::from(rest.starts_with('<')));
            }
        }
    }

    fn current(&self) -> usize {
        self.stack.last().copied().unwrap_or(0)
    }

    fn append(&mut self, data: NodeData) -> usize {
        self.after_wrapper = false;
        let parent = self.current();
        self.doc.push_child(parent, data)
    }

    /// Text up to the next `<`, after skipping `skip` bytes that are known text.
    fn text_run(&mut self, skip: usize) {
        let input = self.input;
        let from = self.pos + skip;
        let end = input[from..].find('<').map_or(input.len(), |i| from + i);
        let text = &input[self.pos..end];
        let wrapper_gap = self.mode == ParseMode::Fragment
            && text.trim().is_empty()
            && (self.after_wrapper || starts_with_wrapper_tag(&input[end..]));
        if !text.is_empty() && !wrapper_gap {
            self.append(NodeData::Text(text.to_owned()));
        }
        self.pos = end;
    }

    fn comment(&mut self) {
        let input = self.input;
        let body_start = self.pos + 4;
        let (body, next) = match input[body_start..].find("-->") {
            Some(i) => (&input[body_start..body_start + i], body_start + i + 3),
            None => (&input[body_start..], input.len()),
        };
        self.append(NodeData::Comment(body.to_owned()));
        self.pos = next;
    }

    fn declaration(&mut self) {
        let input = self.input;
        let body_start = self.pos + 2;
        let (body, next) = match input[body_start..].find('>') {
            Some(i) => (&input[body_start..body_start + i], body_start + i + 1),
            None => (&input[body_start..], input.len()),
        };
        self.pos = next;
        let is_doctype = body
            .get(..7)
            .is_some_and(|head| head.eq_ignore_ascii_case("doctype"));
        if is_doctype {
            if self.mode == ParseMode::Document {
                self.append(NodeData::Doctype(body.to_owned()));
            }
        } else {
            self.append(NodeData::Comment(body.to_owned()));
        }
    }

    /// Returns `false` when `</` is not followed by a tag name.
    fn end_tag(&mut self) -> bool {
        let input = self.input;
        let name_start = self.pos + 2;
        let name_end = scan_name(input, name_start);
        if name_end == name_start {
            return false;
        }
        let name = &input[name_start..name_end];
        self.pos = input[name_end..]
            .find('>')
            .map_or(input.len(), |i| name_end + i + 1);

        if self.mode == ParseMode::Fragment && is_wrapper(name) {
            self.after_wrapper = true;
            return true;
        }
        let open = self
            .stack
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .find(|(_, index)| self.doc.data_at(**index).is_some_and(|d| is_element(d, name)))
            .map(|(depth, _)| depth);
        if let Some(depth) = open {
            self.stack.truncate(depth);
        }
        true
    }

    /// Returns `false` when the tag runs off the end of input.
    fn start_tag(&mut self) -> bool {
        let input = self.input;
        let name_start = self.pos + 1;
        let name_end = scan_name(input, name_start);
        let name = &input[name_start..name_end];
        let Some((attrs, self_closing, after)) = scan_attributes(input, name_end) else {
            return false;
        };
        self.pos = after;

        if self.mode == ParseMode::Fragment && is_wrapper(name) {
            if name.eq_ignore_ascii_case("head") && !self_closing {
                self.skip_past_end_tag(name);
            }
            self.after_wrapper = true;
            return true;
        }

        let mut element = Element::new(name);
        element.attrs = attrs;
        let is_void = element.is_void();
        let index = self.append(NodeData::Element(element));

        if is_void || self_closing {
            return true;
        }
        if RAW_TEXT_ELEMENTS.iter().any(|t| t.eq_ignore_ascii_case(name)) {
            self.raw_text(index, name);
        } else {
            self.stack.push(index);
        }
        true
    }

    /// Move past the end tag of `name`, or to the end of input without one.
    fn skip_past_end_tag(&mut self, name: &str) {
        let input = self.input;
        let closing = format!("</{name}");
        self.pos = match find_ascii_ci(&input[self.pos..], &closing) {
            Some(i) => {
                let after_name = self.pos + i + closing.len();
                input[after_name..].find('>').map_or(input.len(), |j| after_name + j + 1)
            }
            None => input.len(),
        };
    }

    fn raw_text(&mut self, element: usize, name: &str) {
        let input = self.input;
        let closing = format!("</{name}");
        let rest = &input[self.pos..];
        let (body, next) = match find_ascii_ci(rest, &closing) {
            Some(i) => {
                let after_name = self.pos + i + closing.len();
                let next = input[after_name..]
                    .find('>')
                    .map_or(input.len(), |j| after_name + j + 1);
                (&rest[..i], next)
            }
            None => (rest, input.len()),
        };
        if !body.is_empty() {
            self.doc.push_child(element, NodeData::Text(body.to_owned()));
        }
        self.pos = next;
    }
}

fn is_wrapper(name: &str) -> bool {
    DOCUMENT_WRAPPERS.iter().any(|w| w.eq_ignore_ascii_case(name))
}

/// Whether `rest` opens with a start or end tag of a document wrapper.
fn starts_with_wrapper_tag(rest: &str) -> bool {
    let name_start = if rest.starts_with("</") {
        2
    } else if rest.starts_with('<') {
        1
    } else {
        return false;
    };
    is_wrapper(&rest[name_start..scan_name(rest, name_start)])
}

fn is_element(data: &NodeData, name: &str) -> bool {
    matches!(data, NodeData::Element(el) if el.is(name))
}

fn scan_name(input: &str, from: usize) -> usize {
    input[from..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | ':' | '_' | '.')))
        .map_or(input.len(), |i| from + i)
}

fn skip_whitespace(input: &str, from: usize) -> usize {
    input[from..]
        .find(|c: char| !c.is_ascii_whitespace())
        .map_or(input.len(), |i| from + i)
}

/// Scan attributes from `from` through the closing `>`.
///
/// Returns the attributes, whether the tag was self-closing, and the offset
/// just past `>`; `None` if the input ends first.
fn scan_attributes(input: &str, from: usize) -> Option<(Vec<Attribute>, bool, usize)> {
    let bytes = input.as_bytes();
    let mut attrs: Vec<Attribute> = Vec::new();
    let mut cursor = from;
    loop {
        cursor = skip_whitespace(input, cursor);
        match *bytes.get(cursor)? {
            b'>' => return Some((attrs, false, cursor + 1)),
            b'/' if bytes.get(cursor + 1) == Some(&b'>') => return Some((attrs, true, cursor + 2)),
            b'/' | b'=' => {
                cursor += 1;
                continue;
            }
            _ => {}
        }

        let name_end = input[cursor..]
            .find(|c: char| c.is_ascii_whitespace() || matches!(c, '=' | '>' | '/'))
            .map_or(input.len(), |i| cursor + i);
        let name = &input[cursor..name_end];
        cursor = skip_whitespace(input, name_end);

        let value = if bytes.get(cursor) == Some(&b'=') {
            cursor = skip_whitespace(input, cursor + 1);
            let quote = *bytes.get(cursor)?;
            if quote == b'"' || quote == b'\'' {
                let close = input[cursor + 1..].find(char::from(quote))? + cursor + 1;
                let value = &input[cursor + 1..close];
                cursor = close + 1;
                Some(value.to_owned())
            } else {
                let end = input[cursor..]
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .map_or(input.len(), |i| cursor + i);
                let value = &input[cursor..end];
                cursor = end;
                Some(value.to_owned())
            }
        } else {
            None
        };

        if !attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name)) {
            attrs.push(Attribute { name: name.to_owned(), value });
        }
    }
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || hay.len() < needle.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

// =============================================================================
// WRITER
// =============================================================================

pub(crate) fn serialize_children(doc: &Document, index: usize, out: &mut String) {
    for child in doc.children_at(index) {
        serialize_node(doc, *child, out);
    }
}

pub(crate) fn serialize_node(doc: &Document, index: usize, out: &mut String) {
    let Some(data) = doc.data_at(index) else {
        return;
    };
    match data {
        NodeData::Document => serialize_children(doc, index, out),
        NodeData::Doctype(raw) => {
            out.push_str("<!");
            out.push_str(raw);
            out.push('>');
        }
        NodeData::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for attr in &el.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                if let Some(value) = &attr.value {
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
            }
            out.push('>');
            if el.is_void() {
                return;
            }
            serialize_children(doc, index, out);
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
        NodeData::Text(text) => out.push_str(text),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}
