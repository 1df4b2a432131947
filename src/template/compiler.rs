//! Template compilation and caching
//!
//! A fragment sequence is parsed exactly once: the namespace detector
//! picks the vocabulary, the annotator rewrites the fragments with
//! durable markers, and the lenient parser builds the static tree. The
//! tree is read-only afterwards and shared by every instance
//! materialized from it.

use std::num::NonZeroUsize;
use std::rc::Rc;

use lru::LruCache;

use crate::core::markup::annotate;
use crate::core::namespace::Namespace;
use crate::dom::parser::{self, Syntax};
use crate::dom::Document;
use crate::Error;

/// Default number of compiled templates a cache retains
const DEFAULT_CACHE_CAPACITY: usize = 64;

/// A compiled, reusable static template
///
/// Holds the marker-annotated static tree for one fragment sequence.
/// Compilation happens once; materializing instances never mutates the
/// stored tree.
#[derive(Debug)]
pub struct Template {
    doc: Document,
    ns: Namespace,
    parts: usize,
}

impl Template {
    /// Compile a fragment sequence into a static template
    ///
    /// The sequence has N+1 literal fragments for N placeholders; an
    /// empty sequence is an input contract violation.
    pub fn compile(fragments: &[&str]) -> Result<Template, Error> {
        if fragments.is_empty() {
            return Err(Error::EmptyTemplate);
        }

        let concatenated = fragments.concat();
        let ns = Namespace::detect(&concatenated)?;
        let annotated = annotate(fragments, ns)?;

        let doc = match ns {
            Namespace::Html => parse_lenient(&annotated)?,
            Namespace::Svg => {
                // Host parsers need a namespace-establishing root to
                // handle foreign-vocabulary markup; wrap, parse, then
                // promote the wrapper's children to the top level.
                let wrapped = format!("<svg>{}</svg>", annotated);
                let mut doc = parse_lenient(&wrapped)?;
                unwrap_svg_root(&mut doc);
                doc
            }
        };

        log::debug!(
            "compiled template: {:?}, {} fragments, {} parts",
            ns,
            fragments.len(),
            fragments.len() - 1
        );
        Ok(Template {
            doc,
            ns,
            parts: fragments.len() - 1,
        })
    }

    /// The vocabulary this template was parsed under
    pub fn namespace(&self) -> Namespace {
        self.ns
    }

    /// Number of placeholders in the fragment sequence
    pub fn part_count(&self) -> usize {
        self.parts
    }

    /// The annotated static tree
    pub(crate) fn doc(&self) -> &Document {
        &self.doc
    }
}

fn parse_lenient(markup: &str) -> Result<Document, Error> {
    parser::parse(markup, Syntax::Lenient)
        .map_err(|e| Error::MalformedMarkup { position: e.position })
}

/// Promote the children of the synthetic svg wrapper to the top level
/// and drop the wrapper
fn unwrap_svg_root(doc: &mut Document) {
    let root = doc.root();
    let Some(wrapper) = doc
        .children(root)
        .find(|&id| doc.tag_name(id) == Some("svg"))
    else {
        return;
    };
    while let Some(child) = doc.first_child(wrapper) {
        doc.insert_before(root, child, Some(wrapper));
    }
    doc.detach(wrapper);
}

/// Memo of compiled templates keyed by fragment-sequence identity
///
/// The intended usage pattern is one static fragment sequence declared
/// per template site and reused across many instantiations, so the key
/// is the sequence's pointer identity: an equal-but-distinct sequence
/// is a cache miss by design.
pub struct TemplateCache {
    cache: LruCache<usize, Rc<Template>>,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateCache {
    /// Create a cache with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Create a cache retaining up to `capacity` compiled templates
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        TemplateCache {
            cache: LruCache::new(capacity),
        }
    }

    /// Compile `fragments`, reusing the cached template when the same
    /// sequence object was compiled before
    pub fn compile(&mut self, fragments: &'static [&'static str]) -> Result<Rc<Template>, Error> {
        let key = fragments.as_ptr() as usize;
        if let Some(template) = self.cache.get(&key) {
            log::debug!("template cache hit for sequence @{:#x}", key);
            return Ok(Rc::clone(template));
        }
        log::debug!("template cache miss for sequence @{:#x}", key);
        let template = Rc::new(Template::compile(fragments)?);
        self.cache.put(key, Rc::clone(&template));
        Ok(template)
    }

    /// Number of templates currently cached
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
