//! Instance materialization
//!
//! Deep-clones a compiled template into a caller's document, walks the
//! clone once to find every durable marker the annotator left behind,
//! and binds an ordered part list to the concrete cloned nodes. The
//! result is an Instance: the cloned content, its parts, an optional
//! update callback, and a live view of the contributed root nodes.

use std::collections::HashMap;
use std::rc::Rc;

use super::compiler::Template;
use super::part::{AttributePart, ElementPart, NodeRangePart, Part, PartList};
use crate::core::markup::{ATTR_MARKER, MARKER_DELIMITER, RANGE_MARKER};
use crate::dom::{Document, NodeId};

/// Update callback invoked on first render and on every
/// [`Instance::update`]; render data lives in the closure's captures
pub type UpdateFn = Box<dyn FnMut(&mut Document, &PartList)>;

/// One materialized, independently mutable realization of a template
///
/// The engine never destroys an instance; detaching or discarding its
/// content belongs to whoever holds it.
pub struct Instance {
    fragment: NodeId,
    parts: PartList,
    root: RootSpan,
    update: Option<UpdateFn>,
}

impl Instance {
    /// The fragment container holding the instance content until the
    /// caller moves it elsewhere
    pub fn fragment(&self) -> NodeId {
        self.fragment
    }

    /// The ordered part list, one entry per placeholder
    pub fn parts(&self) -> &PartList {
        &self.parts
    }

    /// The live view of the nodes this instance contributed
    pub fn root_span(&self) -> &RootSpan {
        &self.root
    }

    /// Re-invoke the bound update callback, if any
    pub fn update(&mut self, doc: &mut Document) {
        if let Some(callback) = &mut self.update {
            callback(doc, &self.parts);
        }
    }
}

/// The outer boundary of a materialized instance
///
/// Holds the first and last contributed node and recomputes the node
/// list by sibling walk on every access, so the view stays accurate
/// when the nodes are spliced, unchanged, into an ancestor's range.
#[derive(Debug, Clone)]
pub struct RootSpan {
    first: Option<NodeId>,
    last: Option<NodeId>,
}

impl RootSpan {
    /// The contributed nodes, in order
    ///
    /// The walk follows current sibling links; callers who split the
    /// span apart (removing or re-parenting individual root nodes) get
    /// the prefix that is still walkable.
    pub fn nodes(&self, doc: &Document) -> Vec<NodeId> {
        let (Some(first), Some(last)) = (self.first, self.last) else {
            return Vec::new();
        };
        let mut nodes = Vec::new();
        let mut cursor = Some(first);
        while let Some(node) = cursor {
            nodes.push(node);
            if node == last {
                break;
            }
            cursor = doc.next_sibling(node);
        }
        nodes
    }

    /// Number of contributed nodes
    pub fn len(&self, doc: &Document) -> usize {
        self.nodes(doc).len()
    }

    pub fn is_empty(&self, doc: &Document) -> bool {
        self.nodes(doc).is_empty()
    }
}

impl Template {
    /// Materialize an instance into `doc` without an update callback
    pub fn instantiate(&self, doc: &mut Document) -> Instance {
        self.materialize(doc, None)
    }

    /// Materialize an instance into `doc` and invoke `update` once
    ///
    /// First render equals first update: the callback runs synchronously
    /// before this returns, with the instance's parts bound and ready.
    pub fn instantiate_with(&self, doc: &mut Document, update: UpdateFn) -> Instance {
        self.materialize(doc, Some(update))
    }

    fn materialize(&self, doc: &mut Document, update: Option<UpdateFn>) -> Instance {
        let fragment = doc.create_fragment();
        let source = self.doc();
        for child in source.children(source.root()) {
            let imported = doc.import_subtree(source, child);
            doc.append_child(fragment, imported);
        }

        // Collect marked elements first: replacing range markers mutates
        // the tree being walked. Tree order equals placeholder order.
        let marked: Vec<NodeId> = doc
            .descendants(fragment)
            .filter(|&id| {
                doc.attribute(id, ATTR_MARKER).is_some()
                    || doc.attribute(id, RANGE_MARKER).is_some()
            })
            .collect();

        let mut parts: Vec<Rc<Part>> = Vec::with_capacity(self.part_count());
        for element in marked {
            if let Some(entries) = doc.attribute(element, ATTR_MARKER).map(str::to_string) {
                doc.remove_attribute(element, ATTR_MARKER);
                // Repeated names on one element share one part; the memo
                // keyed by name (empty = whole-element hole) guarantees it
                // while still pushing one entry per placeholder.
                let mut memo: HashMap<&str, Rc<Part>> = HashMap::new();
                for name in entries.split(MARKER_DELIMITER) {
                    let part = memo.entry(name).or_insert_with(|| {
                        if name.is_empty() {
                            Rc::new(Part::Element(ElementPart { element }))
                        } else {
                            Rc::new(Part::Attribute(AttributePart {
                                element,
                                name: name.to_string(),
                            }))
                        }
                    });
                    parts.push(Rc::clone(part));
                }
            } else {
                let parent = doc
                    .parent(element)
                    .expect("marker element is attached under the fragment");
                let start = doc.create_sentinel();
                let end = doc.create_sentinel();
                doc.insert_before(parent, start, Some(element));
                doc.insert_before(parent, end, Some(element));
                doc.detach(element);
                parts.push(Rc::new(Part::NodeRange(NodeRangePart { start, end })));
            }
        }

        debug_assert_eq!(parts.len(), self.part_count());
        log::trace!("materialized instance with {} parts", parts.len());

        let root = RootSpan {
            first: doc.first_child(fragment),
            last: doc.last_child(fragment),
        };
        let mut instance = Instance {
            fragment,
            parts: PartList::new(parts),
            root,
            update,
        };
        instance.update(doc);
        instance
    }
}
