//! Arena-based mutable document tree
//!
//! The host tree the template engine materializes into and reconciles
//! against:
//! - Arena allocation for nodes, NodeId (u32) indices for traversal
//! - String interning for element and attribute names
//! - One-operation re-parenting via insert_before
//! - A mutation counter observable by callers and tests
//!
//! Detached nodes stay allocated in the arena for the document's
//! lifetime; detaching only severs the links.

use super::node::{Attr, Node, NodeId, NodeKind};
use super::parser::is_void_element;
use super::strings::StringPool;

/// A mutable document tree
///
/// Node 0 is the document root and always exists. All mutation goes
/// through methods that bump the mutation counter, so callers can
/// measure exactly how much tree churn an operation caused.
#[derive(Debug)]
pub struct Document {
    /// Arena of nodes
    nodes: Vec<Node>,
    /// Interned element and attribute names
    strings: StringPool,
    /// Count of structural and content mutations applied so far
    mutations: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new document containing only the root node
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(Node::document());
        Document {
            nodes,
            strings: StringPool::new(),
            mutations: 0,
        }
    }

    /// The document root node id
    #[inline]
    pub fn root(&self) -> NodeId {
        0
    }

    /// Get a node by id
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }

    /// Check whether an id addresses a node in this arena
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        (id as usize) < self.nodes.len()
    }

    /// Get total number of nodes ever allocated
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Count of structural and content mutations applied so far
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    // ------------------------------------------------------------------
    // Node creation
    // ------------------------------------------------------------------

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    /// Create a detached element node
    pub fn create_element(&mut self, name: &str) -> NodeId {
        let name_id = self.strings.intern(name);
        self.push_node(Node::element(name_id))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push_node(Node::text(content.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push_node(Node::comment(content.to_string()))
    }

    /// Create a detached boundary sentinel node
    pub fn create_sentinel(&mut self) -> NodeId {
        self.push_node(Node::sentinel())
    }

    /// Create a detached fragment container node
    pub fn create_fragment(&mut self) -> NodeId {
        self.push_node(Node::fragment())
    }

    // ------------------------------------------------------------------
    // Node accessors
    // ------------------------------------------------------------------

    /// Kind of a node
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(|n| n.kind)
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// First child of a node
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child)
    }

    /// Last child of a node
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.last_child)
    }

    /// Next sibling of a node
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Previous sibling of a node
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Tag name of an element node
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get(id)?;
        if node.is_element() {
            Some(self.strings.get(node.name_id))
        } else {
            None
        }
    }

    /// Text content of a text or comment node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        let node = self.get(id)?;
        match node.kind {
            NodeKind::Text | NodeKind::Comment => Some(&node.text),
            _ => None,
        }
    }

    /// Set the text content of a text or comment node
    pub fn set_text(&mut self, id: NodeId, content: &str) {
        if let Some(node) = self.nodes.get_mut(id as usize) {
            if matches!(node.kind, NodeKind::Text | NodeKind::Comment) {
                node.text.clear();
                node.text.push_str(content);
                self.mutations += 1;
            }
        }
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Get an attribute value by name
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let node = self.get(id)?;
        node.attrs
            .iter()
            .find(|a| self.strings.get(a.name_id) == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing any existing value under the same name
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if !self.contains(id) || !self.node(id).is_element() {
            return;
        }
        let name_id = self.strings.intern(name);
        let node = self.node_mut(id);
        match node.attrs.iter_mut().find(|a| a.name_id == name_id) {
            Some(attr) => {
                attr.value.clear();
                attr.value.push_str(value);
            }
            None => node.attrs.push(Attr {
                name_id,
                value: value.to_string(),
            }),
        }
        self.mutations += 1;
    }

    /// Remove an attribute by name; returns true if it was present
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        let found = {
            let strings = &self.strings;
            self.nodes[id as usize]
                .attrs
                .iter()
                .position(|a| strings.get(a.name_id) == name)
        };
        match found {
            Some(pos) => {
                self.node_mut(id).attrs.remove(pos);
                self.mutations += 1;
                true
            }
            None => false,
        }
    }

    /// All attribute names and values of an element, in document order
    pub fn attributes(&self, id: NodeId) -> Vec<(&str, &str)> {
        match self.get(id) {
            Some(node) => node
                .attrs
                .iter()
                .map(|a| (self.strings.get(a.name_id), a.value.as_str()))
                .collect(),
            None => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Structure mutation
    // ------------------------------------------------------------------

    /// Sever a node's links to its parent and siblings without counting
    fn unlink(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = self.node(id);
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        let Some(parent) = parent else { return };

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }
        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Splice a detached node in before `reference` under `parent` without counting
    fn link_before(&mut self, parent: NodeId, id: NodeId, reference: Option<NodeId>) {
        debug_assert!(self.node(parent).is_container());
        debug_assert!(self.node(id).parent.is_none());
        debug_assert!(reference.is_none_or(|r| self.node(r).parent == Some(parent)));

        let prev = match reference {
            Some(r) => self.node(r).prev_sibling,
            None => self.node(parent).last_child,
        };

        match prev {
            Some(p) => self.node_mut(p).next_sibling = Some(id),
            None => self.node_mut(parent).first_child = Some(id),
        }
        match reference {
            Some(r) => self.node_mut(r).prev_sibling = Some(id),
            None => self.node_mut(parent).last_child = Some(id),
        }
        let node = self.node_mut(id);
        node.parent = Some(parent);
        node.prev_sibling = prev;
        node.next_sibling = reference;
    }

    /// Insert `id` under `parent`, immediately before `reference`
    ///
    /// A `reference` of None appends at the end. If `id` is currently
    /// attached anywhere in this document it is re-parented; the whole
    /// operation counts as one mutation.
    pub fn insert_before(&mut self, parent: NodeId, id: NodeId, reference: Option<NodeId>) {
        self.unlink(id);
        self.link_before(parent, id, reference);
        self.mutations += 1;
    }

    /// Append `id` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, id: NodeId) {
        self.insert_before(parent, id, None);
    }

    /// Detach a node from its parent; counts one mutation if attached
    ///
    /// The node and its subtree stay allocated and can be re-inserted.
    pub fn detach(&mut self, id: NodeId) {
        if self.parent(id).is_some() {
            self.unlink(id);
            self.mutations += 1;
        }
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// Iterate over all descendants of a node in preorder
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut stack = Vec::new();
        let mut child = self.last_child(id);
        while let Some(c) = child {
            stack.push(c);
            child = self.prev_sibling(c);
        }
        DescendantIter { doc: self, stack }
    }

    // ------------------------------------------------------------------
    // Cross-document import
    // ------------------------------------------------------------------

    /// Deep-clone a subtree from another document into this one
    ///
    /// Returns the id of the detached clone root. Names are re-interned
    /// into this document's pool. Does not count as a mutation: the
    /// clone is built detached.
    pub fn import_subtree(&mut self, source: &Document, id: NodeId) -> NodeId {
        let src = source.node(id);
        let clone = match src.kind {
            NodeKind::Document | NodeKind::Fragment => self.push_node(Node::fragment()),
            NodeKind::Element => {
                let name_id = self.strings.intern(source.strings.get(src.name_id));
                let elem = self.push_node(Node::element(name_id));
                for attr in &src.attrs {
                    let attr_name = self.strings.intern(source.strings.get(attr.name_id));
                    self.node_mut(elem).attrs.push(Attr {
                        name_id: attr_name,
                        value: attr.value.clone(),
                    });
                }
                elem
            }
            NodeKind::Text => self.push_node(Node::text(src.text.clone())),
            NodeKind::Comment => self.push_node(Node::comment(src.text.clone())),
            NodeKind::Sentinel => self.push_node(Node::sentinel()),
        };

        let mut child = src.first_child;
        while let Some(c) = child {
            let imported = self.import_subtree(source, c);
            self.link_before(clone, imported, None);
            child = source.node(c).next_sibling;
        }
        clone
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Serialize a subtree back to markup
    ///
    /// Document and fragment nodes render their children; sentinels
    /// render as nothing. Text and attribute values are minimally
    /// escaped; HTML void elements are written without a close tag.
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        match node.kind {
            NodeKind::Document | NodeKind::Fragment => {
                for child in self.children(id) {
                    self.write_markup(child, out);
                }
            }
            NodeKind::Element => {
                let name = self.strings.get(node.name_id);
                out.push('<');
                out.push_str(name);
                for attr in &node.attrs {
                    out.push(' ');
                    out.push_str(self.strings.get(attr.name_id));
                    out.push_str("=\"");
                    escape_into(&attr.value, true, out);
                    out.push('"');
                }
                out.push('>');
                if is_void_element(name) && !node.has_children() {
                    return;
                }
                for child in self.children(id) {
                    self.write_markup(child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            NodeKind::Text => escape_into(&node.text, false, out),
            NodeKind::Comment => {
                out.push_str("<!--");
                out.push_str(&node.text);
                out.push_str("-->");
            }
            NodeKind::Sentinel => {}
        }
    }
}

fn escape_into(value: &str, in_attribute: bool, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !in_attribute => out.push_str("&lt;"),
            '>' if !in_attribute => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// Iterator over child nodes
pub struct ChildIter<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

/// Iterator over descendant nodes in preorder
pub struct DescendantIter<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let mut child = self.doc.last_child(current);
        while let Some(c) = child {
            self.stack.push(c);
            child = self.doc.prev_sibling(c);
        }
        Some(current)
    }
}
