//! Node-range reconciliation
//!
//! Updates the span of siblings between two boundary sentinels to match
//! a new logical value sequence with a bounded number of insert, move
//! and remove operations. This is a greedy single left-to-right pass,
//! not a minimal-edit-distance diff: it may move more nodes than an
//! optimal algorithm would, in exchange for linear-time behavior.
//!
//! Repeating a call with the same logical values performs zero
//! mutations.

use std::collections::HashSet;

use super::part::Value;
use crate::dom::{Document, NodeId, NodeKind};
use crate::Error;

/// Collect the span contents by walking from the start sentinel's next
/// sibling to the end sentinel
///
/// Fails with [`Error::DetachedBoundary`] when either sentinel has lost
/// its parent or they are no longer siblings of the same span.
pub(crate) fn span_nodes(
    doc: &Document,
    start: NodeId,
    end: NodeId,
) -> Result<Vec<NodeId>, Error> {
    let parent = doc.parent(start).ok_or(Error::DetachedBoundary)?;
    if doc.parent(end) != Some(parent) {
        return Err(Error::DetachedBoundary);
    }
    let mut nodes = Vec::new();
    let mut cursor = doc.next_sibling(start);
    loop {
        match cursor {
            Some(node) if node == end => return Ok(nodes),
            Some(node) => {
                nodes.push(node);
                cursor = doc.next_sibling(node);
            }
            None => return Err(Error::DetachedBoundary),
        }
    }
}

/// Replace the span between `start` and `end` with `values`
pub(crate) fn reconcile(
    doc: &mut Document,
    start: NodeId,
    end: NodeId,
    values: &[Value],
) -> Result<(), Error> {
    // Validate everything before the first mutation
    let current = span_nodes(doc, start, end)?;
    let parent = doc.parent(start).ok_or(Error::DetachedBoundary)?;

    let mut node_values: HashSet<NodeId> = HashSet::new();
    for value in values {
        if let Value::Node(id) = value {
            let placeable = matches!(
                doc.kind(*id),
                Some(NodeKind::Element | NodeKind::Text | NodeKind::Comment)
            );
            if !placeable || *id == start || *id == end {
                return Err(Error::InvalidValue { node: *id });
            }
            if !node_values.insert(*id) {
                // The same node cannot occupy two positions
                return Err(Error::InvalidValue { node: *id });
            }
        }
    }

    // Normalize: node values pass through; text values reuse a
    // content-equal current text node not claimed by identity elsewhere,
    // first match wins, each node at most once; otherwise a fresh text
    // node is created.
    let mut claimed: HashSet<NodeId> = HashSet::new();
    let mut normalized: Vec<NodeId> = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Node(id) => normalized.push(*id),
            Value::Text(text) => {
                let reusable = current.iter().copied().find(|&node| {
                    doc.kind(node) == Some(NodeKind::Text)
                        && !node_values.contains(&node)
                        && !claimed.contains(&node)
                        && doc.text(node) == Some(text.as_str())
                });
                match reusable {
                    Some(node) => {
                        claimed.insert(node);
                        normalized.push(node);
                    }
                    None => normalized.push(doc.create_text(text)),
                }
            }
        }
    }

    // Removal: drop current nodes absent from the new sequence
    let keep: HashSet<NodeId> = normalized.iter().copied().collect();
    let mut removed = 0usize;
    for &node in &current {
        if !keep.contains(&node) {
            doc.detach(node);
            removed += 1;
        }
    }

    // Reorder preserved nodes in one left-to-right pass
    let current_set: HashSet<NodeId> = current.iter().copied().collect();
    let mut cursor = doc.next_sibling(start).unwrap_or(end);
    let mut moved = 0usize;
    for &node in &normalized {
        if !current_set.contains(&node) {
            continue;
        }
        if node == cursor {
            cursor = doc.next_sibling(cursor).unwrap_or(end);
        } else {
            doc.insert_before(parent, node, Some(cursor));
            moved += 1;
        }
    }

    // Insertion: splice in everything not already at the walk cursor
    let mut cursor = doc.next_sibling(start).unwrap_or(end);
    let mut inserted = 0usize;
    for &node in &normalized {
        if node == cursor {
            cursor = doc.next_sibling(cursor).unwrap_or(end);
        } else {
            doc.insert_before(parent, node, Some(cursor));
            inserted += 1;
        }
    }

    log::trace!(
        "reconcile: {} values, {} removed, {} moved, {} inserted",
        values.len(),
        removed,
        moved,
        inserted
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a doc with a parent element and a sentinel-bounded span
    fn setup() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let host = doc.create_element("div");
        doc.append_child(doc.root(), host);
        let start = doc.create_sentinel();
        let end = doc.create_sentinel();
        doc.append_child(host, start);
        doc.append_child(host, end);
        (doc, host, start, end)
    }

    fn span_texts(doc: &Document, start: NodeId, end: NodeId) -> Vec<String> {
        span_nodes(doc, start, end)
            .unwrap()
            .into_iter()
            .map(|n| doc.text(n).unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_fill_empty_span() {
        let (mut doc, _, start, end) = setup();
        reconcile(&mut doc, start, end, &["a".into(), "b".into()]).unwrap();
        assert_eq!(span_texts(&doc, start, end), vec!["a", "b"]);
    }

    #[test]
    fn test_clear_span() {
        let (mut doc, _, start, end) = setup();
        reconcile(&mut doc, start, end, &["hello".into()]).unwrap();
        reconcile(&mut doc, start, end, &[]).unwrap();
        assert!(span_nodes(&doc, start, end).unwrap().is_empty());
        assert_eq!(doc.next_sibling(start), Some(end));
    }

    #[test]
    fn test_idempotent_call_mutates_nothing() {
        let (mut doc, _, start, end) = setup();
        let values: Vec<Value> = vec!["a".into(), "b".into(), "c".into()];
        reconcile(&mut doc, start, end, &values).unwrap();
        let before = doc.mutation_count();
        let nodes_before = doc.node_count();
        reconcile(&mut doc, start, end, &values).unwrap();
        assert_eq!(doc.mutation_count(), before);
        assert_eq!(doc.node_count(), nodes_before);
    }

    #[test]
    fn test_swap_reuses_text_nodes() {
        let (mut doc, _, start, end) = setup();
        reconcile(&mut doc, start, end, &["x".into(), "y".into()]).unwrap();
        let original = span_nodes(&doc, start, end).unwrap();
        let nodes_before = doc.node_count();

        reconcile(&mut doc, start, end, &["y".into(), "x".into()]).unwrap();
        assert_eq!(doc.node_count(), nodes_before);
        let after = span_nodes(&doc, start, end).unwrap();
        assert_eq!(after, vec![original[1], original[0]]);
    }

    #[test]
    fn test_rotation_moves_two_nodes() {
        let (mut doc, _, start, end) = setup();
        reconcile(&mut doc, start, end, &["a".into(), "b".into(), "c".into()]).unwrap();
        let before = doc.mutation_count();
        let nodes_before = doc.node_count();

        reconcile(&mut doc, start, end, &["b".into(), "c".into(), "a".into()]).unwrap();
        assert_eq!(span_texts(&doc, start, end), vec!["b", "c", "a"]);
        // Greedy pass relocates b and c in front of a; nothing is recreated
        assert_eq!(doc.mutation_count(), before + 2);
        assert_eq!(doc.node_count(), nodes_before);
    }

    #[test]
    fn test_node_value_passthrough() {
        let (mut doc, _, start, end) = setup();
        let em = doc.create_element("em");
        reconcile(&mut doc, start, end, &["a".into(), em.into()]).unwrap();
        let nodes = span_nodes(&doc, start, end).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(doc.tag_name(nodes[1]), Some("em"));
    }

    #[test]
    fn test_text_not_stolen_from_node_value() {
        let (mut doc, _, start, end) = setup();
        reconcile(&mut doc, start, end, &["a".into()]).unwrap();
        let existing = span_nodes(&doc, start, end).unwrap()[0];

        // The existing "a" node is claimed by identity, so the string
        // value must materialize a fresh text node
        reconcile(&mut doc, start, end, &["a".into(), existing.into()]).unwrap();
        let nodes = span_nodes(&doc, start, end).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1], existing);
        assert_ne!(nodes[0], existing);
        assert_eq!(doc.text(nodes[0]), Some("a"));
    }

    #[test]
    fn test_partial_overlap() {
        let (mut doc, _, start, end) = setup();
        reconcile(&mut doc, start, end, &["a".into(), "b".into()]).unwrap();
        reconcile(&mut doc, start, end, &["b".into(), "c".into()]).unwrap();
        assert_eq!(span_texts(&doc, start, end), vec!["b", "c"]);
    }

    #[test]
    fn test_detached_boundary_fails() {
        let (mut doc, _, start, end) = setup();
        doc.detach(start);
        let err = reconcile(&mut doc, start, end, &[]).unwrap_err();
        assert_eq!(err, Error::DetachedBoundary);
    }

    #[test]
    fn test_separated_boundaries_fail() {
        let (mut doc, _, start, end) = setup();
        let elsewhere = doc.create_element("p");
        doc.append_child(doc.root(), elsewhere);
        doc.append_child(elsewhere, end);
        let err = span_nodes(&doc, start, end).unwrap_err();
        assert_eq!(err, Error::DetachedBoundary);
    }

    #[test]
    fn test_invalid_value_rejected_before_mutation() {
        let (mut doc, _, start, end) = setup();
        reconcile(&mut doc, start, end, &["a".into()]).unwrap();
        let before = doc.mutation_count();
        let err = reconcile(
            &mut doc,
            start,
            end,
            &["b".into(), Value::Node(start)],
        )
        .unwrap_err();
        assert_eq!(err, Error::InvalidValue { node: start });
        assert_eq!(doc.mutation_count(), before);
        assert_eq!(span_texts(&doc, start, end), vec!["a"]);
    }

    #[test]
    fn test_duplicate_node_value_rejected() {
        let (mut doc, _, start, end) = setup();
        let em = doc.create_element("em");
        let err = reconcile(&mut doc, start, end, &[em.into(), em.into()]).unwrap_err();
        assert_eq!(err, Error::InvalidValue { node: em });
    }

    #[test]
    fn test_adopts_node_from_elsewhere() {
        let (mut doc, _, start, end) = setup();
        let aside = doc.create_element("aside");
        doc.append_child(doc.root(), aside);
        let moved = doc.create_element("em");
        doc.append_child(aside, moved);

        reconcile(&mut doc, start, end, &[moved.into()]).unwrap();
        assert_eq!(span_nodes(&doc, start, end).unwrap(), vec![moved]);
        assert_eq!(doc.first_child(aside), None);
    }
}
