//! Typed part handles
//!
//! A Part binds one placeholder of a materialized instance to a concrete
//! location in the host tree. The three variants form a closed union;
//! code consuming parts matches exhaustively on it.

use std::ops::Index;
use std::rc::Rc;

use super::reconcile;
use crate::dom::{Document, NodeId};
use crate::Error;

/// Discriminant of a part variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartType {
    Attribute,
    Element,
    NodeRange,
}

/// A typed handle bound to one placeholder
#[derive(Debug)]
pub enum Part {
    /// A dynamic attribute value on an element
    Attribute(AttributePart),
    /// A whole-element binding exposing the element itself
    Element(ElementPart),
    /// A dynamic run of children between two boundary sentinels
    NodeRange(NodeRangePart),
}

impl Part {
    /// The variant discriminant
    pub fn part_type(&self) -> PartType {
        match self {
            Part::Attribute(_) => PartType::Attribute,
            Part::Element(_) => PartType::Element,
            Part::NodeRange(_) => PartType::NodeRange,
        }
    }

    pub fn as_attribute(&self) -> Option<&AttributePart> {
        match self {
            Part::Attribute(part) => Some(part),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&ElementPart> {
        match self {
            Part::Element(part) => Some(part),
            _ => None,
        }
    }

    pub fn as_node_range(&self) -> Option<&NodeRangePart> {
        match self {
            Part::NodeRange(part) => Some(part),
            _ => None,
        }
    }
}

/// Binding to one attribute of one element
#[derive(Debug)]
pub struct AttributePart {
    pub(crate) element: NodeId,
    pub(crate) name: String,
}

impl AttributePart {
    /// The bound element
    pub fn element(&self) -> NodeId {
        self.element
    }

    /// The bound attribute name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current attribute value, or None when absent
    pub fn value<'d>(&self, doc: &'d Document) -> Option<&'d str> {
        doc.attribute(self.element, &self.name)
    }

    /// Set the attribute value; None removes the attribute
    pub fn set_value(&self, doc: &mut Document, value: Option<&str>) {
        match value {
            Some(value) => doc.set_attribute(self.element, &self.name, value),
            None => {
                doc.remove_attribute(self.element, &self.name);
            }
        }
    }
}

/// Binding to an element itself, for ref-style use
#[derive(Debug)]
pub struct ElementPart {
    pub(crate) element: NodeId,
}

impl ElementPart {
    /// The bound element
    pub fn element(&self) -> NodeId {
        self.element
    }
}

/// Binding to the span of children between two boundary sentinels
///
/// The sentinels belong to the engine: removing or relocating them from
/// outside breaks the part, and every later operation on it fails with
/// [`Error::DetachedBoundary`]. The span contents are recomputed from
/// the sentinels on every access, never cached.
#[derive(Debug)]
pub struct NodeRangePart {
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
}

impl NodeRangePart {
    /// The opening boundary sentinel
    pub fn start(&self) -> NodeId {
        self.start
    }

    /// The closing boundary sentinel
    pub fn end(&self) -> NodeId {
        self.end
    }

    /// Current nodes in the span, in order
    pub fn nodes(&self, doc: &Document) -> Result<Vec<NodeId>, Error> {
        reconcile::span_nodes(doc, self.start, self.end)
    }

    /// Replace the span contents with `values`, reusing and reordering
    /// existing content where possible
    pub fn replace_with(&self, doc: &mut Document, values: &[Value]) -> Result<(), Error> {
        reconcile::reconcile(doc, self.start, self.end, values)
    }
}

/// A value placed into a node range: a tree node or plain text
#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Node(NodeId),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

/// The ordered, placeholder-indexed part list of one instance
///
/// One entry per placeholder, in placeholder order; entries for repeated
/// names on one element share a single part. Length is fixed at
/// materialization time.
#[derive(Debug, Default)]
pub struct PartList {
    parts: Vec<Rc<Part>>,
}

impl PartList {
    pub(crate) fn new(parts: Vec<Rc<Part>>) -> Self {
        PartList { parts }
    }

    /// Number of placeholders
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Get the part bound to placeholder `index`
    pub fn get(&self, index: usize) -> Option<&Part> {
        self.parts.get(index).map(Rc::as_ref)
    }

    /// Iterate over parts in placeholder order
    pub fn iter(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter().map(Rc::as_ref)
    }

    /// Whether two placeholder indices share one underlying part
    pub fn shares_part(&self, a: usize, b: usize) -> bool {
        match (self.parts.get(a), self.parts.get(b)) {
            (Some(x), Some(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }
}

impl Index<usize> for PartList {
    type Output = Part;

    fn index(&self, index: usize) -> &Part {
        &self.parts[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_type() {
        let part = Part::Element(ElementPart { element: 3 });
        assert_eq!(part.part_type(), PartType::Element);
        assert!(part.as_element().is_some());
        assert!(part.as_attribute().is_none());
    }

    #[test]
    fn test_attribute_part_value_roundtrip() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        doc.set_attribute(p, "class", "x");
        let part = AttributePart {
            element: p,
            name: "class".to_string(),
        };
        assert_eq!(part.value(&doc), Some("x"));
        part.set_value(&mut doc, Some("y"));
        assert_eq!(part.value(&doc), Some("y"));
        part.set_value(&mut doc, None);
        assert_eq!(part.value(&doc), None);
    }

    #[test]
    fn test_part_list_sharing() {
        let shared = Rc::new(Part::Element(ElementPart { element: 1 }));
        let list = PartList::new(vec![Rc::clone(&shared), shared]);
        assert_eq!(list.len(), 2);
        assert!(list.shares_part(0, 1));
        assert!(!list.shares_part(0, 2));
    }
}
