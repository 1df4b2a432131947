//! weft - tagged-markup template engine
//!
//! Given an ordered sequence of literal markup fragments interleaved
//! with placeholder positions (the "text, hole, text, hole, ..., text"
//! shape of interpolated templates), weft:
//! - parses the combined markup exactly once into a reusable static tree
//! - locates every placeholder and classifies it as an attribute hole,
//!   a whole-element hole, or a node-range hole
//! - on every instantiation and update, materializes a live tree and
//!   reconciles dynamic node ranges against previously rendered content
//!   with minimal disruption
//!
//! ```
//! use weft::Template;
//! use weft::dom::Document;
//!
//! let template = Template::compile(&["<ul>", "</ul>"]).unwrap();
//! let mut doc = Document::new();
//! let instance = template.instantiate(&mut doc);
//!
//! let range = instance.parts()[0].as_node_range().unwrap();
//! range.replace_with(&mut doc, &["a".into(), "b".into()]).unwrap();
//! assert_eq!(doc.to_markup(instance.fragment()), "<ul>ab</ul>");
//! ```
//!
//! Everything is synchronous and single-threaded: scanning, compiling,
//! materializing and reconciling either complete or fail before
//! returning, and the only callback that escapes the engine is the
//! caller-supplied update function, invoked inline.

mod core;
pub mod dom;
mod template;

pub use crate::core::namespace::Namespace;
pub use template::{
    AttributePart, ElementPart, Instance, NodeRangePart, Part, PartList, PartType, RootSpan,
    Template, TemplateCache, UpdateFn, Value,
};

use dom::NodeId;

/// Engine error taxonomy
///
/// Every failure is deterministic and caused by a violated precondition:
/// there is no retry policy, and no partial rollback of tree mutations
/// applied before a later step failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The fragment sequence was empty
    #[error("empty fragment sequence")]
    EmptyTemplate,
    /// A `<` opened no element name
    #[error("malformed markup at byte {position}: expected element name")]
    MalformedMarkup { position: usize },
    /// A fragment boundary fell inside a comment, which has no durable
    /// marker encoding
    #[error("unterminated comment at byte {position}: placeholders inside comments are unsupported")]
    UnterminatedComment { position: usize },
    /// A boundary sentinel was removed or relocated from outside the
    /// engine; the range's position cannot be reconstructed
    #[error("boundary sentinel is no longer attached to its span")]
    DetachedBoundary,
    /// A node passed to replace_with cannot occupy a range position
    #[error("node {node} cannot be placed in a node range")]
    InvalidValue { node: NodeId },
}
