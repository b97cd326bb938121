//! Tolerant HTML parsing into a small element tree.
//!
//! Built on the `quick-xml` event reader with end-name checking turned off,
//! so unclosed `<p>` and `<li>` tags, void elements (`<br>`, `<img>`) and
//! unquoted attributes are accepted the way a browser would accept them.
//! `<script>` and `<style>` content is kept as raw text.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text, not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Opening one of these closes an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav",
    "ol", "p", "pre", "section", "table", "ul",
];

/// Implicit closing never reaches past these.
const SCOPE_BOUNDARIES: &[&str] = &[
    "#document", "html", "body", "table", "td", "th", "caption", "button", "template",
];

/// The HTML could not be tokenized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed HTML at byte {position}: {message}")]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with lower-cased tag and attribute names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Value of the named attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Class names from the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First element with the given tag, depth-first, including `self`.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        if self.tag == tag {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find(tag))
    }

    /// Every element with the given tag, in document order.
    pub fn find_all<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        if self.tag == tag {
            out.push(self);
        }
        for child in self.child_elements() {
            child.find_all(tag, out);
        }
    }

    /// Concatenated raw text of all descendants.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            match child {
                Node::Text(t) => text.push_str(t),
                Node::Element(e) => text.push_str(&e.text_content()),
            }
        }
        text
    }
}

/// Parse an HTML document. The returned root has the tag `#document`.
pub fn parse(html: &str) -> Result<Element, ParseError> {
    let mut reader = event_reader(html);
    // Offset of the current reader's input within `html`.
    let mut base = 0;
    let mut stack: Vec<Element> = vec![Element::new("#document")];

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let mut element = start_element(e);
                close_implied(&mut stack, &element.tag);
                if RAW_TEXT_ELEMENTS.contains(&element.tag.as_str()) {
                    let start = base + reader.buffer_position();
                    let (text, resume) = raw_text(html, start, &element.tag);
                    if !text.is_empty() {
                        element.children.push(Node::Text(text.to_string()));
                    }
                    append(&mut stack, Node::Element(element));
                    base = resume;
                    reader = event_reader(&html[resume..]);
                } else if is_void(&element.tag) {
                    append(&mut stack, Node::Element(element));
                } else {
                    stack.push(element);
                }
            }
            Ok(Event::Empty(ref e)) => {
                let element = start_element(e);
                close_implied(&mut stack, &element.tag);
                append(&mut stack, Node::Element(element));
            }
            Ok(Event::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                close(&mut stack, &tag);
            }
            Ok(Event::Text(ref e)) => {
                let raw = String::from_utf8_lossy(e);
                append(&mut stack, Node::Text(decode_entities(&raw)));
            }
            Ok(Event::CData(ref e)) => {
                let raw = String::from_utf8_lossy(e);
                append(&mut stack, Node::Text(raw.into_owned()));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError {
                    position: base + reader.buffer_position(),
                    message: e.to_string(),
                });
            }
            // Comments, doctype, declarations and processing instructions
            _ => {}
        }
    }

    while stack.len() > 1 {
        pop_into_parent(&mut stack);
    }

    Ok(stack.pop().unwrap_or_default())
}

fn event_reader(html: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(html);
    reader.check_end_names(false);
    reader.trim_text(false);
    reader
}

/// Raw content of a `<script>`/`<style>` starting at byte `start`, and the
/// offset just past its end tag. An unterminated element runs to the end.
fn raw_text<'a>(html: &'a str, start: usize, tag: &str) -> (&'a str, usize) {
    let rest = &html[start..];
    // ASCII lowercasing keeps byte offsets intact.
    let lowered = rest.to_ascii_lowercase();
    let Some(end) = lowered.find(&format!("</{}", tag)) else {
        return (rest, html.len());
    };
    let resume = lowered[end..]
        .find('>')
        .map_or(html.len(), |gt| start + end + gt + 1);
    (&rest[..end], resume)
}

fn start_element(e: &BytesStart<'_>) -> Element {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()).to_lowercase());
    for attr in e.html_attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_lowercase();
        let value = decode_entities(&String::from_utf8_lossy(&attr.value));
        element.attrs.push((key, value));
    }
    element
}

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn append(stack: &mut [Element], node: Node) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

fn pop_into_parent(stack: &mut Vec<Element>) {
    if let Some(element) = stack.pop() {
        append(stack, Node::Element(element));
    }
}

/// Close elements that `tag` ends by being opened: an open `<p>` before a
/// block, and an open list item before its next sibling.
fn close_implied(stack: &mut Vec<Element>, tag: &str) {
    if CLOSES_PARAGRAPH.contains(&tag) {
        close_open(stack, &["p"], SCOPE_BOUNDARIES);
    }
    match tag {
        "li" => close_open(stack, &["li"], &["ul", "ol", "menu", "body", "td", "th"]),
        "dt" | "dd" => close_open(stack, &["dt", "dd"], &["dl", "body", "td", "th"]),
        _ => {}
    }
}

/// Close the innermost open element named in `targets`, unless one of
/// `boundaries` is open inside it.
fn close_open(stack: &mut Vec<Element>, targets: &[&str], boundaries: &[&str]) {
    for pos in (1..stack.len()).rev() {
        let tag = stack[pos].tag.as_str();
        if targets.contains(&tag) {
            while stack.len() > pos {
                pop_into_parent(stack);
            }
            return;
        }
        if boundaries.contains(&tag) {
            return;
        }
    }
}

/// Close the innermost open element named `tag`, implicitly closing anything
/// opened inside it. Stray end tags are ignored.
fn close(stack: &mut Vec<Element>, tag: &str) {
    if is_void(tag) {
        return;
    }
    let Some(pos) = stack.iter().rposition(|e| e.tag == tag) else {
        log::debug!("Ignoring stray end tag </{}>", tag);
        return;
    };
    if pos == 0 {
        return;
    }
    while stack.len() > pos {
        pop_into_parent(stack);
    }
}

/// Decode XML, numeric and common HTML named entities. Anything that does
/// not decode (a bare `&`, an unknown entity) is kept as written.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = entity_len(tail).and_then(|len| {
            quick_xml::escape::unescape_with(&tail[..len], html_entity)
                .ok()
                .map(|text| (len, text))
        });
        match decoded {
            Some((len, text)) => {
                out.push_str(&text);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Length of the `&name;` reference at the start of `tail`, if it has one.
fn entity_len(tail: &str) -> Option<usize> {
    let semi = tail.find(';')?;
    let name = &tail[1..semi];
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#');
    valid.then_some(semi + 1)
}

fn html_entity(name: &str) -> Option<&'static str> {
    let value = match name {
        "nbsp" => "\u{00A0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "bull" => "\u{2022}",
        "middot" => "\u{00B7}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "laquo" => "\u{00AB}",
        "raquo" => "\u{00BB}",
        "copy" => "\u{00A9}",
        "reg" => "\u{00AE}",
        "trade" => "\u{2122}",
        "deg" => "\u{00B0}",
        "times" => "\u{00D7}",
        "divide" => "\u{00F7}",
        "plusmn" => "\u{00B1}",
        "larr" => "\u{2190}",
        "uarr" => "\u{2191}",
        "rarr" => "\u{2192}",
        "darr" => "\u{2193}",
        "harr" => "\u{2194}",
        "rArr" => "\u{21D2}",
        "check" => "\u{2713}",
        "euro" => "\u{20AC}",
        "pound" => "\u{00A3}",
        "yen" => "\u{00A5}",
        "cent" => "\u{00A2}",
        "sect" => "\u{00A7}",
        "para" => "\u{00B6}",
        "frac12" => "\u{00BD}",
        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        "ne" => "\u{2260}",
        "infin" => "\u{221E}",
        _ => return None,
    };
    Some(value)
}
