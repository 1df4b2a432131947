//! Fragment-boundary markup annotation
//!
//! Walks the literal fragments of a template once, left to right,
//! tracking whether each fragment boundary (placeholder position) falls
//! in text, inside a tag, or inside a comment, and rewrites the markup
//! so every hole leaves a durable marker that survives parsing:
//! - an attribute marker (`data-dyn-parts`) on the enclosing element
//!   listing hole entries in placeholder order, `/`-separated, with an
//!   empty entry flagging a whole-element hole
//! - an injected empty marker element (`data-dyn-range`) standing in for
//!   a run of dynamic children
//!
//! Single pass over the markup; the only backward step is the bounded
//! walk over one attribute name when `=` is seen.

use super::namespace::Namespace;
use super::scanner::{is_name_byte, is_whitespace, Scanner};
use crate::Error;

/// Synthetic attribute listing an element's hole entries
pub const ATTR_MARKER: &str = "data-dyn-parts";
/// Marker attribute of the injected node-range placeholder element
pub const RANGE_MARKER: &str = "data-dyn-range";
/// Separator between hole entries inside the attribute marker; not a
/// legal attribute-name character, so entries never need escaping
pub const MARKER_DELIMITER: char = '/';

/// Scanner state at a fragment boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Text,
    InTag,
    InComment,
}

/// Rewrite the fragment sequence into one marker-annotated markup string
pub fn annotate(fragments: &[&str], ns: Namespace) -> Result<String, Error> {
    let mut annotator = Annotator {
        state: ScanState::Text,
        out: Vec::with_capacity(fragments.iter().map(|f| f.len()).sum::<usize>() + 64),
        queued: Vec::new(),
        pending_attr: None,
        quote: None,
        after_eq: false,
        unquoted: false,
        comment_start: 0,
        offset: 0,
        ns,
    };
    let last = fragments.len().saturating_sub(1);
    for (i, fragment) in fragments.iter().enumerate() {
        annotator.feed(fragment, i == last)?;
        annotator.offset += fragment.len();
    }
    // The buffer only ever receives whole input slices and ASCII
    // punctuation, so it stays valid UTF-8
    Ok(String::from_utf8(annotator.out).unwrap_or_default())
}

struct Annotator {
    state: ScanState,
    out: Vec<u8>,
    /// Hole entries queued for the current tag; "" flags a whole-element hole
    queued: Vec<String>,
    /// Name of the attribute whose value is currently open
    pending_attr: Option<String>,
    /// Quote byte of an open quoted attribute value
    quote: Option<u8>,
    /// An `=` was consumed and no value has started yet
    after_eq: bool,
    /// Inside an unquoted attribute value
    unquoted: bool,
    /// Global byte offset of the open comment, for error positions
    comment_start: usize,
    /// Global byte offset of the current fragment
    offset: usize,
    ns: Namespace,
}

impl Annotator {
    /// Scan one fragment, emitting rewritten markup; classify the hole
    /// at its end unless this is the final fragment
    fn feed(&mut self, fragment: &str, is_last: bool) -> Result<(), Error> {
        let mut scanner = Scanner::new(fragment.as_bytes());

        while !scanner.is_eof() {
            match self.state {
                ScanState::Text => self.scan_text(&mut scanner),
                ScanState::InTag => self.scan_tag(&mut scanner),
                ScanState::InComment => self.scan_comment(&mut scanner)?,
            }
        }

        if is_last {
            return Ok(());
        }
        match self.state {
            ScanState::Text => self.emit_range_marker(),
            ScanState::InTag => self.classify_tag_hole(),
            // reached when a zero-length fragment follows an open comment
            ScanState::InComment => {
                return Err(Error::UnterminatedComment {
                    position: self.comment_start,
                })
            }
        }
        Ok(())
    }

    /// Text mode: copy through to the next `<` and dispatch on it
    fn scan_text(&mut self, scanner: &mut Scanner<'_>) {
        match scanner.find_byte(b'<') {
            None => {
                self.emit_rest(scanner);
            }
            Some(lt) => {
                self.emit_to(scanner, lt);
                if scanner.starts_with(b"<!--") {
                    self.comment_start = self.offset + lt;
                    self.out.extend_from_slice(b"<!--");
                    scanner.advance(4);
                    self.state = ScanState::InComment;
                } else {
                    self.out.push(b'<');
                    scanner.advance(1);
                    if scanner.peek() == Some(b'/') {
                        self.out.push(b'/');
                        scanner.advance(1);
                    }
                    if let Some(name) = scanner.read_name() {
                        self.out.extend_from_slice(name);
                    }
                    self.state = ScanState::InTag;
                }
            }
        }
    }

    /// Comment mode: copy through to `-->`; a fragment boundary inside a
    /// comment has no durable marker encoding and is an error
    fn scan_comment(&mut self, scanner: &mut Scanner<'_>) -> Result<(), Error> {
        loop {
            match scanner.find_byte(b'-') {
                Some(pos) => {
                    scanner.set_position(pos);
                    if scanner.starts_with(b"-->") {
                        self.emit_to(scanner, pos + 3);
                        scanner.set_position(pos + 3);
                        self.state = ScanState::Text;
                        return Ok(());
                    }
                    self.emit_to(scanner, pos + 1);
                    scanner.set_position(pos + 1);
                }
                None => {
                    return Err(Error::UnterminatedComment {
                        position: self.comment_start,
                    });
                }
            }
        }
    }

    /// Tag mode: copy through attributes tracking quote and value state,
    /// injecting the queued marker attribute when `>` closes the tag
    fn scan_tag(&mut self, scanner: &mut Scanner<'_>) {
        while let Some(b) = scanner.peek() {
            if let Some(q) = self.quote {
                match scanner.find_byte(q) {
                    Some(end) => {
                        self.emit_to(scanner, end + 1);
                        scanner.set_position(end + 1);
                        self.quote = None;
                        self.pending_attr = None;
                    }
                    None => {
                        self.emit_rest(scanner);
                    }
                }
                continue;
            }

            match b {
                b'>' => {
                    self.flush_marker_attr();
                    self.out.push(b'>');
                    scanner.advance(1);
                    self.state = ScanState::Text;
                    return;
                }
                b'/' if scanner.peek_at(1) == Some(b'>') => {
                    self.flush_marker_attr();
                    self.out.extend_from_slice(b"/>");
                    scanner.advance(2);
                    self.state = ScanState::Text;
                    return;
                }
                b'"' | b'\'' => {
                    self.quote = Some(b);
                    self.after_eq = false;
                    self.out.push(b);
                    scanner.advance(1);
                }
                b'=' => {
                    self.pending_attr = Some(name_before_eq(&self.out));
                    self.after_eq = true;
                    self.unquoted = false;
                    self.out.push(b'=');
                    scanner.advance(1);
                }
                _ if is_whitespace(b) => {
                    if self.unquoted {
                        self.unquoted = false;
                        self.pending_attr = None;
                    }
                    self.out.push(b);
                    scanner.advance(1);
                }
                _ => {
                    if self.after_eq {
                        self.after_eq = false;
                        self.unquoted = true;
                    }
                    self.out.push(b);
                    scanner.advance(1);
                }
            }
        }
    }

    /// A fragment ended inside a tag: record the hole against the open
    /// attribute value if there is one, else as a whole-element hole
    fn classify_tag_hole(&mut self) {
        if self.quote.is_some() || self.unquoted {
            // Mid-value; the value stays open into the next fragment
            let name = self.pending_attr.clone().unwrap_or_default();
            self.queued.push(name);
        } else if self.after_eq {
            // `name=` with no value yet; close it so the joined markup
            // stays parseable, and bind the hole to that attribute
            let name = self.pending_attr.take().unwrap_or_default();
            self.queued.push(name);
            self.out.extend_from_slice(b"\"\"");
            self.after_eq = false;
        } else {
            self.queued.push(String::new());
        }
    }

    /// Append the node-range placeholder element for a text-position hole
    fn emit_range_marker(&mut self) {
        let tag: &[u8] = match self.ns {
            Namespace::Svg => b"g",
            Namespace::Html => b"span",
        };
        self.out.push(b'<');
        self.out.extend_from_slice(tag);
        self.out.push(b' ');
        self.out.extend_from_slice(RANGE_MARKER.as_bytes());
        self.out.extend_from_slice(b"></");
        self.out.extend_from_slice(tag);
        self.out.push(b'>');
    }

    /// Inject the attribute marker carrying the queued hole entries
    fn flush_marker_attr(&mut self) {
        if !self.queued.is_empty() {
            self.out.push(b' ');
            self.out.extend_from_slice(ATTR_MARKER.as_bytes());
            self.out.extend_from_slice(b"=\"");
            for (i, entry) in self.queued.iter().enumerate() {
                if i > 0 {
                    self.out.push(MARKER_DELIMITER as u8);
                }
                self.out.extend_from_slice(entry.as_bytes());
            }
            self.out.push(b'"');
            self.queued.clear();
        }
        self.pending_attr = None;
        self.after_eq = false;
        self.unquoted = false;
    }

    fn emit_to(&mut self, scanner: &mut Scanner<'_>, end: usize) {
        let start = scanner.position();
        self.out.extend_from_slice(scanner.slice(start, end));
        scanner.set_position(end);
    }

    fn emit_rest(&mut self, scanner: &mut Scanner<'_>) {
        let start = scanner.position();
        let end = start + scanner.remaining().len();
        self.emit_to(scanner, end);
    }
}

/// Walk backward over the attribute name that precedes an `=`
fn name_before_eq(out: &[u8]) -> String {
    let mut end = out.len();
    while end > 0 && is_whitespace(out[end - 1]) {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && is_name_byte(out[start - 1]) {
        start -= 1;
    }
    String::from_utf8_lossy(&out[start..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotate_html(fragments: &[&str]) -> String {
        annotate(fragments, Namespace::Html).unwrap()
    }

    #[test]
    fn test_no_holes_passthrough() {
        assert_eq!(annotate_html(&["<p>hi</p>"]), "<p>hi</p>");
    }

    #[test]
    fn test_node_range_hole() {
        assert_eq!(
            annotate_html(&["<ul>", "</ul>"]),
            "<ul><span data-dyn-range></span></ul>"
        );
    }

    #[test]
    fn test_node_range_hole_svg() {
        assert_eq!(
            annotate(&["<g>", "</g>"], Namespace::Svg).unwrap(),
            "<g><g data-dyn-range></g></g>"
        );
    }

    #[test]
    fn test_attribute_hole_quoted() {
        assert_eq!(
            annotate_html(&["<p class=\"", "\">x</p>"]),
            "<p class=\"\" data-dyn-parts=\"class\">x</p>"
        );
    }

    #[test]
    fn test_attribute_hole_mid_value() {
        assert_eq!(
            annotate_html(&["<p class=\"a ", " z\">x</p>"]),
            "<p class=\"a  z\" data-dyn-parts=\"class\">x</p>"
        );
    }

    #[test]
    fn test_attribute_hole_bare_equals() {
        assert_eq!(
            annotate_html(&["<p class=", ">x</p>"]),
            "<p class=\"\" data-dyn-parts=\"class\">x</p>"
        );
    }

    #[test]
    fn test_attribute_hole_unquoted_continues() {
        assert_eq!(
            annotate_html(&["<p class=ab", "c>x</p>"]),
            "<p class=abc data-dyn-parts=\"class\">x</p>"
        );
    }

    #[test]
    fn test_whole_element_hole() {
        assert_eq!(
            annotate_html(&["<p ", ">x</p>"]),
            "<p  data-dyn-parts=\"\">x</p>"
        );
    }

    #[test]
    fn test_element_hole_after_complete_value() {
        assert_eq!(
            annotate_html(&["<p id=\"y\" ", ">x</p>"]),
            "<p id=\"y\"  data-dyn-parts=\"\">x</p>"
        );
    }

    #[test]
    fn test_two_holes_one_tag() {
        assert_eq!(
            annotate_html(&["<p class=\"", "\" id=\"", "\">x</p>"]),
            "<p class=\"\" id=\"\" data-dyn-parts=\"class/id\">x</p>"
        );
    }

    #[test]
    fn test_two_holes_same_attribute() {
        assert_eq!(
            annotate_html(&["<p class=\"", " ", "\">x</p>"]),
            "<p class=\" \" data-dyn-parts=\"class/class\">x</p>"
        );
    }

    #[test]
    fn test_element_hole_then_attribute_hole() {
        assert_eq!(
            annotate_html(&["<p ", " class=\"", "\">x</p>"]),
            "<p  class=\"\" data-dyn-parts=\"/class\">x</p>"
        );
    }

    #[test]
    fn test_self_closing_marker_injection() {
        assert_eq!(
            annotate_html(&["<input value=\"", "\"/>"]),
            "<input value=\"\" data-dyn-parts=\"value\"/>"
        );
    }

    #[test]
    fn test_mixed_attr_and_range_holes() {
        assert_eq!(
            annotate_html(&["<p class=\"", "\">", "</p>"]),
            "<p class=\"\" data-dyn-parts=\"class\"><span data-dyn-range></span></p>"
        );
    }

    #[test]
    fn test_hole_inside_comment_fails() {
        let err = annotate(&["<!-- start", " -->"], Namespace::Html).unwrap_err();
        assert_eq!(err, Error::UnterminatedComment { position: 0 });
    }

    #[test]
    fn test_comment_passthrough() {
        assert_eq!(
            annotate_html(&["<p><!-- a - b --></p>"]),
            "<p><!-- a - b --></p>"
        );
    }

    #[test]
    fn test_quoted_gt_does_not_close_tag() {
        assert_eq!(
            annotate_html(&["<p title=\"a>b\" class=\"", "\">x</p>"]),
            "<p title=\"a>b\" class=\"\" data-dyn-parts=\"class\">x</p>"
        );
    }

    #[test]
    fn test_text_hole_after_text() {
        assert_eq!(
            annotate_html(&["<p>hi ", "</p>"]),
            "<p>hi <span data-dyn-range></span></p>"
        );
    }
}
