//! Interned element and attribute names
//!
//! Tag and attribute names repeat across any real tree, so the document
//! stores each distinct name once and addresses it by a u32 id. All name
//! bytes live in one shared buffer; a content-hash index resolves
//! lookups, falling back to a byte compare on the rare collision.

use std::collections::HashMap;
use std::hash::{BuildHasher, RandomState};

/// Offset and length of one interned name inside the shared buffer
#[derive(Debug, Clone, Copy)]
struct Span {
    offset: u32,
    len: u32,
}

/// Deduplicating name pool
///
/// Id 0 is reserved for "no name"; interning the empty string always
/// yields it. Ids are only meaningful within the pool that issued them.
#[derive(Debug)]
pub struct StringPool {
    spans: Vec<Span>,
    buffer: Vec<u8>,
    /// Content hash -> ids sharing that hash
    index: HashMap<u64, Vec<u32>>,
    hasher: RandomState,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    pub fn new() -> Self {
        StringPool {
            spans: vec![Span { offset: 0, len: 0 }],
            buffer: Vec::with_capacity(1024),
            index: HashMap::new(),
            hasher: RandomState::new(),
        }
    }

    /// Intern a name, returning its id
    ///
    /// Equal content yields equal ids within one pool.
    pub fn intern(&mut self, name: &str) -> u32 {
        if name.is_empty() {
            return 0;
        }

        let hash = self.hasher.hash_one(name);
        if let Some(ids) = self.index.get(&hash) {
            if let Some(&id) = ids.iter().find(|&&id| self.get(id) == name) {
                return id;
            }
        }

        let span = Span {
            offset: self.buffer.len() as u32,
            len: name.len() as u32,
        };
        self.buffer.extend_from_slice(name.as_bytes());

        let id = self.spans.len() as u32;
        self.spans.push(span);
        self.index.entry(hash).or_default().push(id);
        id
    }

    /// Resolve an id back to its name; unknown ids resolve to ""
    pub fn get(&self, id: u32) -> &str {
        match self.spans.get(id as usize) {
            Some(&Span { offset, len }) => {
                let start = offset as usize;
                std::str::from_utf8(&self.buffer[start..start + len as usize]).unwrap_or("")
            }
            None => "",
        }
    }

    /// Number of entries, counting the reserved empty entry
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let mut pool = StringPool::new();
        let id = pool.intern("section");
        assert!(id > 0);
        assert_eq!(pool.get(id), "section");
    }

    #[test]
    fn test_equal_content_equal_id() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern("class"), pool.intern("class"));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_distinct_content_distinct_ids() {
        let mut pool = StringPool::new();
        assert_ne!(pool.intern("class"), pool.intern("id"));
    }

    #[test]
    fn test_empty_name_is_reserved_id() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern(""), 0);
        assert_eq!(pool.get(0), "");
        assert!(pool.is_empty());
    }

    #[test]
    fn test_unknown_id_resolves_empty() {
        let pool = StringPool::new();
        assert_eq!(pool.get(99), "");
    }
}
