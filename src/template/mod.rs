//! Template engine
//!
//! The pieces that turn a fragment sequence into live, updatable
//! content:
//! - Compiler: one-time parse into a cached static tree
//! - Instance: per-materialization clone with a bound part list
//! - Part: typed handles for attribute, element and node-range holes
//! - Reconcile: single-pass node-range update algorithm

pub mod compiler;
pub mod instance;
pub mod part;
pub mod reconcile;

pub use compiler::{Template, TemplateCache};
pub use instance::{Instance, RootSpan, UpdateFn};
pub use part::{AttributePart, ElementPart, NodeRangePart, Part, PartList, PartType, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    // End-to-end behavior over the public surface.

    #[test]
    fn test_attribute_and_empty_range_scenario() {
        let template = Template::compile(&["<p class=\"", "\">", "</p>"]).unwrap();
        let mut doc = Document::new();
        let instance = template.instantiate_with(
            &mut doc,
            Box::new(|doc, parts| {
                let class = parts[0].as_attribute().unwrap();
                class.set_value(doc, Some("a"));
                // The second placeholder stays an empty range
            }),
        );
        assert_eq!(instance.parts().len(), 2);
        assert_eq!(doc.to_markup(instance.fragment()), "<p class=\"a\"></p>");
        let range = instance.parts()[1].as_node_range().unwrap();
        assert!(range.nodes(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_list_rotation_relocates_not_recreates() {
        let template = Template::compile(&["<ul>", "</ul>"]).unwrap();
        let mut doc = Document::new();
        let instance = template.instantiate(&mut doc);
        let range = instance.parts()[0].as_node_range().unwrap();

        range
            .replace_with(&mut doc, &["a".into(), "b".into(), "c".into()])
            .unwrap();
        let before_mutations = doc.mutation_count();
        let before_nodes = doc.node_count();

        range
            .replace_with(&mut doc, &["b".into(), "c".into(), "a".into()])
            .unwrap();
        assert_eq!(doc.node_count(), before_nodes);
        assert_eq!(doc.mutation_count(), before_mutations + 2);

        let texts: Vec<_> = range
            .nodes(&doc)
            .unwrap()
            .into_iter()
            .map(|n| doc.text(n).unwrap().to_string())
            .collect();
        assert_eq!(texts, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_fill_then_clear_leaves_adjacent_sentinels() {
        let template = Template::compile(&["<div>", "</div>"]).unwrap();
        let mut doc = Document::new();
        let instance = template.instantiate(&mut doc);
        let range = instance.parts()[0].as_node_range().unwrap();

        range.replace_with(&mut doc, &["hello".into()]).unwrap();
        assert_eq!(range.nodes(&doc).unwrap().len(), 1);

        range.replace_with(&mut doc, &[]).unwrap();
        assert!(range.nodes(&doc).unwrap().is_empty());
        assert_eq!(doc.next_sibling(range.start()), Some(range.end()));
    }

    #[test]
    fn test_nested_instance_composition() {
        static ITEM: [&str; 2] = ["<li>", "</li>"];
        static LIST: [&str; 2] = ["<ul>", "</ul>"];
        let mut cache = TemplateCache::new();
        let list = cache.compile(&LIST).unwrap();
        let item = cache.compile(&ITEM).unwrap();
        let mut doc = Document::new();

        let list_instance = list.instantiate(&mut doc);
        let item_instance = item.instantiate_with(
            &mut doc,
            Box::new(|doc, parts| {
                let range = parts[0].as_node_range().unwrap();
                range.replace_with(doc, &["one".into()]).unwrap();
            }),
        );

        let range = list_instance.parts()[0].as_node_range().unwrap();
        let values: Vec<Value> = item_instance
            .root_span()
            .nodes(&doc)
            .into_iter()
            .map(Into::into)
            .collect();
        range.replace_with(&mut doc, &values).unwrap();

        assert_eq!(
            doc.to_markup(list_instance.fragment()),
            "<ul><li>one</li></ul>"
        );
    }

    #[test]
    fn test_compile_failure_is_permanent_not_partial() {
        let err = Template::compile(&["<!-- start", " -->"]).unwrap_err();
        assert!(matches!(err, crate::Error::UnterminatedComment { .. }));
    }
}
