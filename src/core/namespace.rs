//! Namespace detection
//!
//! Decides whether a template's concatenated literal markup must be
//! parsed as SVG or as HTML. The decision is made once per compiled
//! template and is best-effort by design: the first element name settles
//! most cases, and the handful of tag names that exist in both
//! vocabularies are disambiguated by attempting a strict XML parse and
//! then checking for an embedded svg root.

use crate::core::scanner::Scanner;
use crate::dom::parser::{self, Syntax};
use crate::Error;

/// Markup vocabulary of a compiled template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Html,
    Svg,
}

/// Tag names that exist only in the SVG vocabulary
const SVG_ONLY_TAGS: &[&str] = &[
    "circle",
    "clipPath",
    "defs",
    "desc",
    "ellipse",
    "foreignObject",
    "g",
    "line",
    "linearGradient",
    "marker",
    "mask",
    "path",
    "pattern",
    "polygon",
    "polyline",
    "radialGradient",
    "rect",
    "stop",
    "symbol",
    "text",
    "textPath",
    "tspan",
    "use",
];

/// Tag names that exist in both vocabularies
const AMBIGUOUS_TAGS: &[&str] = &["a", "font", "script", "style", "svg", "title"];

impl Namespace {
    /// Detect the vocabulary of the given markup (placeholders elided)
    ///
    /// Errors with [`Error::MalformedMarkup`] when a `<` opens no
    /// element name.
    pub fn detect(markup: &str) -> Result<Namespace, Error> {
        let mut scanner = Scanner::new(markup.as_bytes());
        let Some(lt) = scanner.find_byte(b'<') else {
            return Ok(Namespace::Html);
        };
        scanner.set_position(lt + 1);
        let name = match scanner.read_name() {
            Some(bytes) => std::str::from_utf8(bytes).unwrap_or(""),
            None => return Err(Error::MalformedMarkup { position: lt }),
        };

        if SVG_ONLY_TAGS.contains(&name) {
            log::debug!("namespace: svg (first element <{}>)", name);
            return Ok(Namespace::Svg);
        }
        if !AMBIGUOUS_TAGS.contains(&name) {
            return Ok(Namespace::Html);
        }

        // The name exists in both vocabularies. If the markup is not
        // well-formed XML it was written for a forgiving HTML parse; if
        // it is, a nested svg root reveals HTML-with-embedded-SVG.
        if parser::parse(markup, Syntax::Strict).is_err() {
            log::debug!("namespace: html (<{}> ambiguous, not well-formed XML)", name);
            return Ok(Namespace::Html);
        }
        let doc = match parser::parse(markup, Syntax::Lenient) {
            Ok(doc) => doc,
            Err(_) => return Ok(Namespace::Html),
        };
        let has_svg_root = doc
            .descendants(doc.root())
            .any(|id| doc.tag_name(id) == Some("svg"));
        let ns = if has_svg_root {
            Namespace::Html
        } else {
            Namespace::Svg
        };
        log::debug!("namespace: {:?} (<{}> ambiguous, well-formed XML)", ns, name);
        Ok(ns)
    }
}
