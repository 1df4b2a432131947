//! Arena node records
//!
//! Nodes are plain records addressed by `NodeId`; the links between them
//! are ids, never references, so the whole tree lives in one `Vec` and
//! re-linking a node is a handful of integer writes.

/// Index of a node within its document's arena
pub type NodeId = u32;

/// Closed set of node kinds the engine materializes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The arena's root; exactly one per document
    Document,
    /// Detached container an instance materializes into
    Fragment,
    Element,
    Text,
    Comment,
    /// Non-rendering boundary bracketing a dynamic span
    Sentinel,
}

/// One attribute on an element; the name is pooled, the value owned
#[derive(Debug, Clone)]
pub struct Attr {
    pub name_id: u32,
    pub value: String,
}

/// A node record: kind, tree links, and per-kind payload
///
/// `name_id` is meaningful for elements, `text` for text and comment
/// nodes, `attrs` for elements; the rest carry empty defaults.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub name_id: u32,
    pub text: String,
    pub attrs: Vec<Attr>,
}

impl Node {
    fn bare(kind: NodeKind) -> Self {
        Node {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            text: String::new(),
            attrs: Vec::new(),
        }
    }

    pub fn document() -> Self {
        Node::bare(NodeKind::Document)
    }

    pub fn fragment() -> Self {
        Node::bare(NodeKind::Fragment)
    }

    pub fn element(name_id: u32) -> Self {
        Node {
            name_id,
            ..Node::bare(NodeKind::Element)
        }
    }

    pub fn text(content: String) -> Self {
        Node {
            text: content,
            ..Node::bare(NodeKind::Text)
        }
    }

    pub fn comment(content: String) -> Self {
        Node {
            text: content,
            ..Node::bare(NodeKind::Comment)
        }
    }

    pub fn sentinel() -> Self {
        Node::bare(NodeKind::Sentinel)
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    /// Whether children may be linked under this node
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Document | NodeKind::Fragment | NodeKind::Element
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_document_record() {
        let root = Node::document();
        assert_eq!(root.kind, NodeKind::Document);
        assert!(root.parent.is_none());
        assert!(!root.has_children());
        assert!(root.is_container());
    }

    #[test]
    fn test_element_carries_name_id() {
        let elem = Node::element(7);
        assert_eq!(elem.name_id, 7);
        assert!(elem.is_element());
        assert!(elem.is_container());
    }

    #[test]
    fn test_sentinel_takes_no_children() {
        let s = Node::sentinel();
        assert_eq!(s.kind, NodeKind::Sentinel);
        assert!(!s.is_container());
        assert!(!s.is_text());
    }
}
