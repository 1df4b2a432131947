//! DOM module - arena-based host tree
//!
//! Implements the tree the engine materializes into:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for element and attribute names
//! - Mutation primitives (insert-before, detach, attribute and text
//!   updates) with an observable mutation counter
//! - A lenient and a strict markup parser

pub mod document;
pub mod node;
pub mod parser;
pub mod strings;

pub use document::Document;
pub use node::{Attr, Node, NodeId, NodeKind};
pub use parser::{ParseError, Syntax};
pub use strings::StringPool;
