//! Key→referencing-documents store.
//!
//! Set semantics over `(key, document)` pairs: a document either references
//! a key or it does not, no matter how many mentions its text contains.

use crate::types::{CompactString, OptionKey};
use indexmap::IndexMap;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct ReferenceLog {
    // BTreeSet keeps each key's documents in a stable order for free.
    references: IndexMap<OptionKey, BTreeSet<CompactString>>,
}

impl ReferenceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `document` references `key`. Returns `true` when the
    /// pair was not already present.
    pub fn record(&mut self, key: OptionKey, document: impl Into<CompactString>) -> bool {
        self.references
            .entry(key)
            .or_default()
            .insert(document.into())
    }

    /// Documents referencing `key`, in stable name order.
    pub fn documents_for(&self, key: &OptionKey) -> impl Iterator<Item = &str> {
        self.references
            .get(key)
            .into_iter()
            .flat_map(|docs| docs.iter().map(AsRef::as_ref))
    }

    /// Remove all pairs whose referencing document is `document`.
    pub fn purge_for_document(&mut self, document: &str) {
        for docs in self.references.values_mut() {
            docs.remove(document);
        }
        self.references.retain(|_, docs| !docs.is_empty());
    }

    /// Set-union per key.
    pub fn merge(&mut self, other: ReferenceLog) {
        for (key, docs) in other.references {
            self.references.entry(key).or_default().extend(docs);
        }
    }

    /// Number of distinct `(key, document)` pairs.
    pub fn len(&self) -> usize {
        self.references.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn clear(&mut self) {
        self.references.clear();
    }

    /// All `(key, documents)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&OptionKey, &BTreeSet<CompactString>)> {
        self.references.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OptionType;

    fn key(name: &str) -> OptionKey {
        OptionKey::for_reference(OptionType::Config, name, "any")
    }

    #[test]
    fn test_record_has_set_semantics() {
        let mut log = ReferenceLog::new();
        assert!(log.record(key("X"), "b"));
        assert!(!log.record(key("X"), "b"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_documents_for_is_sorted() {
        let mut log = ReferenceLog::new();
        log.record(key("X"), "zebra");
        log.record(key("X"), "alpha");
        log.record(key("X"), "midway");

        let docs: Vec<&str> = log.documents_for(&key("X")).collect();
        assert_eq!(docs, vec!["alpha", "midway", "zebra"]);
    }

    #[test]
    fn test_purge_removes_only_one_document() {
        let mut log = ReferenceLog::new();
        log.record(key("X"), "a");
        log.record(key("X"), "b");
        log.record(key("Y"), "b");

        log.purge_for_document("b");

        assert_eq!(log.documents_for(&key("X")).collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(log.documents_for(&key("Y")).count(), 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_merge_unions_per_key() {
        let mut left = ReferenceLog::new();
        left.record(key("X"), "a");

        let mut right = ReferenceLog::new();
        right.record(key("X"), "b");
        right.record(key("X"), "a");
        right.record(key("Y"), "c");

        left.merge(right);

        assert_eq!(
            left.documents_for(&key("X")).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(left.len(), 3);
    }
}
