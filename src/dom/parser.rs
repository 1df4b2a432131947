//! Markup parser - builds a Document from a markup string
//!
//! Two modes:
//! - Lenient: never fails. Unclosed elements auto-close at end of input,
//!   unmatched end tags are ignored, HTML void elements take no children,
//!   and a `<` that opens no name is literal text. Used by the template
//!   compiler.
//! - Strict: XML-shaped well-formedness. Single root element, every tag
//!   matched and properly nested, no content after the root. Used by the
//!   namespace detector's XML attempt; errors carry a byte position.

use std::borrow::Cow;

use super::document::Document;
use super::node::NodeId;
use crate::core::scanner::{is_name_byte, is_whitespace, Scanner};

/// Parse mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Error-tolerant HTML-shaped parsing
    Lenient,
    /// XML-shaped well-formedness checking
    Strict,
}

/// Error type for strict mode validation failures
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

/// HTML elements that never take children
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Check if a tag name is an HTML void element
pub(crate) fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|v| v.eq_ignore_ascii_case(name))
}

/// Parse a markup string into a new Document
pub fn parse(input: &str, syntax: Syntax) -> Result<Document, ParseError> {
    let mut parser = Parser {
        scanner: Scanner::new(input.as_bytes()),
        doc: Document::new(),
        stack: Vec::with_capacity(8),
        names: Vec::with_capacity(8),
        strict: syntax == Syntax::Strict,
        seen_root: false,
    };
    parser.stack.push(parser.doc.root());
    parser.run()?;
    Ok(parser.doc)
}

struct Parser<'a> {
    scanner: Scanner<'a>,
    doc: Document,
    /// Open element chain; bottom is the document root
    stack: Vec<NodeId>,
    /// Tag names matching stack entries above the root
    names: Vec<String>,
    strict: bool,
    seen_root: bool,
}

impl<'a> Parser<'a> {
    fn run(&mut self) -> Result<(), ParseError> {
        while !self.scanner.is_eof() {
            let start = self.scanner.position();
            match self.scanner.find_byte(b'<') {
                Some(lt) => {
                    if lt > start {
                        self.emit_text(start, lt)?;
                        self.scanner.set_position(lt);
                    }
                    self.parse_markup()?;
                }
                None => {
                    let end = start + self.scanner.remaining().len();
                    self.emit_text(start, end)?;
                    self.scanner.set_position(end);
                }
            }
        }

        if self.strict {
            if self.stack.len() > 1 {
                let name = self.names.last().cloned().unwrap_or_default();
                return Err(ParseError::new(
                    format!("unclosed element <{}>", name),
                    self.scanner.position(),
                ));
            }
            if !self.seen_root {
                return Err(ParseError::new("no root element", self.scanner.position()));
            }
        }
        Ok(())
    }

    fn parent(&self) -> NodeId {
        *self.stack.last().expect("stack holds at least the root")
    }

    fn emit_text(&mut self, start: usize, end: usize) -> Result<(), ParseError> {
        let raw = std::str::from_utf8(self.scanner.slice(start, end)).unwrap_or("");
        if raw.is_empty() {
            return Ok(());
        }
        if self.strict && self.stack.len() == 1 && !raw.bytes().all(is_whitespace) {
            return Err(ParseError::new(
                "text content not allowed at document level",
                start,
            ));
        }
        let decoded = decode_entities(raw);
        let text = self.doc.create_text(&decoded);
        let parent = self.parent();
        self.doc.append_child(parent, text);
        Ok(())
    }

    /// Parse markup starting with '<'
    fn parse_markup(&mut self) -> Result<(), ParseError> {
        if self.scanner.starts_with(b"<!--") {
            return self.parse_comment();
        }
        if self.scanner.starts_with(b"</") {
            return self.parse_end_tag();
        }
        if self.scanner.starts_with(b"<!") || self.scanner.starts_with(b"<?") {
            return self.skip_declaration();
        }
        self.parse_start_tag()
    }

    /// Parse a comment <!--...-->
    fn parse_comment(&mut self) -> Result<(), ParseError> {
        let start = self.scanner.position();
        self.scanner.advance(4); // Skip '<!--'
        let content_start = self.scanner.position();

        loop {
            match self.scanner.find_byte(b'-') {
                Some(pos) => {
                    self.scanner.set_position(pos);
                    if self.scanner.starts_with(b"-->") {
                        let content = std::str::from_utf8(
                            self.scanner.slice(content_start, pos),
                        )
                        .unwrap_or("");
                        let comment = self.doc.create_comment(content);
                        let parent = self.parent();
                        self.doc.append_child(parent, comment);
                        self.scanner.advance(3);
                        return Ok(());
                    }
                    self.scanner.advance(1);
                }
                None => {
                    if self.strict {
                        return Err(ParseError::new("unterminated comment", start));
                    }
                    // Lenient: the rest of the input is comment content
                    let len = self.scanner.remaining().len();
                    let end = self.scanner.position() + len;
                    let content =
                        std::str::from_utf8(self.scanner.slice(content_start, end)).unwrap_or("");
                    let comment = self.doc.create_comment(content);
                    let parent = self.parent();
                    self.doc.append_child(parent, comment);
                    self.scanner.set_position(end);
                    return Ok(());
                }
            }
        }
    }

    /// Skip a <!...> or <?...?> construct without emitting a node
    fn skip_declaration(&mut self) -> Result<(), ParseError> {
        match self.scanner.find_byte(b'>') {
            Some(end) => self.scanner.set_position(end + 1),
            None => self.scanner.set_position(self.scanner.position() + self.scanner.remaining().len()),
        }
        Ok(())
    }

    /// Parse an end tag </name>
    fn parse_end_tag(&mut self) -> Result<(), ParseError> {
        let start = self.scanner.position();
        self.scanner.advance(2); // Skip '</'

        let name = match self.read_qname() {
            Some(name) => name.to_string(),
            None => {
                if self.strict {
                    return Err(ParseError::new("expected element name in end tag", start));
                }
                // Lenient: treat as bogus markup, skip to '>'
                return self.skip_declaration();
            }
        };

        match self.scanner.find_byte(b'>') {
            Some(end) => self.scanner.set_position(end + 1),
            None => {
                if self.strict {
                    return Err(ParseError::new("unclosed end tag", start));
                }
                self.scanner.set_position(self.scanner.position() + self.scanner.remaining().len());
            }
        }

        if self.strict {
            match self.names.last() {
                Some(open) if *open == name => {
                    self.stack.pop();
                    self.names.pop();
                    Ok(())
                }
                Some(open) => Err(ParseError::new(
                    format!("tag mismatch: <{}> closed with </{}>", open, name),
                    start,
                )),
                None => Err(ParseError::new(
                    format!("unexpected end tag </{}>", name),
                    start,
                )),
            }
        } else {
            // Find the nearest matching open element; ignore if none
            if let Some(depth) = self
                .names
                .iter()
                .rposition(|open| open.eq_ignore_ascii_case(&name))
            {
                self.stack.truncate(depth + 1);
                self.names.truncate(depth);
            }
            Ok(())
        }
    }

    /// Parse a start tag or empty element tag
    fn parse_start_tag(&mut self) -> Result<(), ParseError> {
        let start = self.scanner.position();
        self.scanner.advance(1); // Skip '<'

        let name = match self.read_qname() {
            Some(name) => name.to_string(),
            None => {
                if self.strict {
                    return Err(ParseError::new("expected element name", start));
                }
                // Lenient: a lone '<' is literal text
                let text = self.doc.create_text("<");
                let parent = self.parent();
                self.doc.append_child(parent, text);
                return Ok(());
            }
        };

        if self.strict && self.stack.len() == 1 {
            if self.seen_root {
                return Err(ParseError::new("content after root element", start));
            }
            self.seen_root = true;
        }

        let elem = self.doc.create_element(&name);
        let mut self_closing = false;

        // Attribute loop
        loop {
            self.scanner.skip_whitespace();
            match self.scanner.peek() {
                None => {
                    if self.strict {
                        return Err(ParseError::new("unclosed tag", start));
                    }
                    break;
                }
                Some(b'>') => {
                    self.scanner.advance(1);
                    break;
                }
                Some(b'/') => {
                    if self.scanner.peek_at(1) == Some(b'>') {
                        self.scanner.advance(2);
                        self_closing = true;
                        break;
                    }
                    if self.strict {
                        return Err(ParseError::new(
                            "expected '>' after '/'",
                            self.scanner.position(),
                        ));
                    }
                    self.scanner.advance(1);
                }
                Some(_) => self.parse_attribute(elem)?,
            }
        }

        let parent = self.parent();
        self.doc.append_child(parent, elem);

        let childless = self_closing || (!self.strict && is_void_element(&name));
        if !childless {
            self.stack.push(elem);
            self.names.push(name);
        }
        Ok(())
    }

    /// Parse one name=value attribute pair on `elem`
    fn parse_attribute(&mut self, elem: NodeId) -> Result<(), ParseError> {
        let attr_start = self.scanner.position();
        let name = match self.read_qname() {
            Some(name) => name.to_string(),
            None => {
                if self.strict {
                    return Err(ParseError::new("expected attribute name", attr_start));
                }
                // Lenient: skip one stray byte and retry
                self.scanner.advance(1);
                return Ok(());
            }
        };

        if self.strict && self.doc.attribute(elem, &name).is_some() {
            return Err(ParseError::new(
                format!("duplicate attribute: {}", name),
                attr_start,
            ));
        }

        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'=') {
            // Boolean attribute
            self.doc.set_attribute(elem, &name, "");
            return Ok(());
        }
        self.scanner.advance(1);
        self.scanner.skip_whitespace();

        let value = match self.scanner.peek() {
            Some(q @ (b'"' | b'\'')) => {
                self.scanner.advance(1);
                let value_start = self.scanner.position();
                match self.scanner.find_byte(q) {
                    Some(end) => {
                        let raw = std::str::from_utf8(self.scanner.slice(value_start, end))
                            .unwrap_or("");
                        self.scanner.set_position(end + 1);
                        decode_entities(raw).into_owned()
                    }
                    None => {
                        if self.strict {
                            return Err(ParseError::new(
                                "unterminated attribute value",
                                value_start,
                            ));
                        }
                        let end = value_start + self.scanner.remaining().len();
                        let raw = std::str::from_utf8(self.scanner.slice(value_start, end))
                            .unwrap_or("");
                        self.scanner.set_position(end);
                        decode_entities(raw).into_owned()
                    }
                }
            }
            _ => {
                // Unquoted value: up to whitespace, '>' or '/>'
                let value_start = self.scanner.position();
                while let Some(b) = self.scanner.peek() {
                    if is_whitespace(b) || b == b'>' {
                        break;
                    }
                    if b == b'/' && self.scanner.peek_at(1) == Some(b'>') {
                        break;
                    }
                    self.scanner.advance(1);
                }
                let raw = std::str::from_utf8(
                    self.scanner.slice(value_start, self.scanner.position()),
                )
                .unwrap_or("");
                decode_entities(raw).into_owned()
            }
        };

        self.doc.set_attribute(elem, &name, &value);
        Ok(())
    }

    /// Read a possibly-prefixed name such as `xlink:href`
    fn read_qname(&mut self) -> Option<&'a str> {
        let start = self.scanner.position();
        self.scanner.read_name()?;
        while self.scanner.peek() == Some(b':') && self.scanner.peek_at(1).is_some_and(is_name_byte)
        {
            self.scanner.advance(1);
            self.scanner.read_name();
        }
        std::str::from_utf8(self.scanner.slice(start, self.scanner.position())).ok()
    }
}

/// Decode the named and numeric character references understood by the
/// engine: amp, lt, gt, quot, apos, and `&#...;` forms. Anything else
/// passes through unchanged.
pub(crate) fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';') {
            Some(semi) if semi > 1 && semi <= 10 => {
                let entity = &tail[1..semi];
                let decoded = match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => decode_numeric(entity),
                };
                match decoded {
                    Some(ch) => {
                        out.push(ch);
                        rest = &tail[semi + 1..];
                    }
                    None => {
                        out.push('&');
                        rest = &tail[1..];
                    }
                }
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_numeric(entity: &str) -> Option<char> {
    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::node::NodeKind;

    #[test]
    fn test_parse_simple() {
        let doc = parse("<p class=\"a\">hi</p>", Syntax::Lenient).unwrap();
        let p = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.tag_name(p), Some("p"));
        assert_eq!(doc.attribute(p, "class"), Some("a"));
        let t = doc.first_child(p).unwrap();
        assert_eq!(doc.text(t), Some("hi"));
    }

    #[test]
    fn test_lenient_auto_close() {
        let doc = parse("<ul><li>a<li>b</ul>", Syntax::Lenient).unwrap();
        let ul = doc.first_child(doc.root()).unwrap();
        let items: Vec<_> = doc.children(ul).collect();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_lenient_void_elements() {
        let doc = parse("<div><br><span>x</span></div>", Syntax::Lenient).unwrap();
        let div = doc.first_child(doc.root()).unwrap();
        let kids: Vec<_> = doc.children(div).collect();
        assert_eq!(kids.len(), 2);
        assert_eq!(doc.tag_name(kids[0]), Some("br"));
        assert!(!doc.get(kids[0]).unwrap().has_children());
    }

    #[test]
    fn test_lenient_unmatched_close_ignored() {
        let doc = parse("<div>a</span>b</div>", Syntax::Lenient).unwrap();
        let div = doc.first_child(doc.root()).unwrap();
        let kids: Vec<_> = doc.children(div).collect();
        assert_eq!(kids.len(), 2);
    }

    #[test]
    fn test_lenient_lone_lt_is_text() {
        let doc = parse("a < b", Syntax::Lenient).unwrap();
        let kids: Vec<_> = doc.children(doc.root()).collect();
        let text: String = kids.iter().filter_map(|&k| doc.text(k)).collect();
        assert_eq!(text, "a < b");
    }

    #[test]
    fn test_comment() {
        let doc = parse("<div><!-- note --></div>", Syntax::Lenient).unwrap();
        let div = doc.first_child(doc.root()).unwrap();
        let c = doc.first_child(div).unwrap();
        assert_eq!(doc.kind(c), Some(NodeKind::Comment));
        assert_eq!(doc.text(c), Some(" note "));
    }

    #[test]
    fn test_entities_decoded() {
        let doc = parse("<p title=\"a &amp; b\">1 &lt; 2 &#65;</p>", Syntax::Lenient).unwrap();
        let p = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.attribute(p, "title"), Some("a & b"));
        let t = doc.first_child(p).unwrap();
        assert_eq!(doc.text(t), Some("1 < 2 A"));
    }

    #[test]
    fn test_strict_accepts_well_formed() {
        assert!(parse("<a href=\"x\">text</a>", Syntax::Strict).is_ok());
    }

    #[test]
    fn test_strict_rejects_mismatch() {
        let err = parse("<a><b></a></b>", Syntax::Strict).unwrap_err();
        assert!(err.message.contains("mismatch"));
    }

    #[test]
    fn test_strict_rejects_unclosed() {
        let err = parse("<a><b></b>", Syntax::Strict).unwrap_err();
        assert!(err.message.contains("unclosed"));
    }

    #[test]
    fn test_strict_rejects_multiple_roots() {
        assert!(parse("<a></a><b></b>", Syntax::Strict).is_err());
    }

    #[test]
    fn test_strict_rejects_root_text() {
        assert!(parse("hello <a></a>", Syntax::Strict).is_err());
    }

    #[test]
    fn test_qname_attribute() {
        let doc = parse("<use xlink:href=\"#icon\"/>", Syntax::Lenient).unwrap();
        let use_el = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.attribute(use_el, "xlink:href"), Some("#icon"));
    }

    #[test]
    fn test_unquoted_value() {
        let doc = parse("<p class=abc id=z>x</p>", Syntax::Lenient).unwrap();
        let p = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.attribute(p, "class"), Some("abc"));
        assert_eq!(doc.attribute(p, "id"), Some("z"));
    }
}
