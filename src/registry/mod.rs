//! Key→declaration store with the conflict/dedup policy.
//!
//! The registry is the single arbiter of identity: at most one live
//! declaration exists per key, the first registration wins, and identical
//! re-registration is absorbed silently so reprocessing and parallel
//! re-merge stay idempotent.

mod reference_log;

pub use reference_log::ReferenceLog;

use crate::declaration::OptionDecl;
use crate::types::{OptionKey, SourceLocation};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Outcome of registering one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictOutcome {
    /// No entry existed at the key.
    Inserted,
    /// An entry existed and was field-for-field identical.
    DuplicateIgnored,
    /// An entry existed with differing fields; it was retained and the new
    /// declaration dropped. Carries the retained entry's location so the
    /// caller can surface both sides.
    Conflict { existing: SourceLocation },
}

impl ConflictOutcome {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ConflictOutcome::Conflict { .. })
    }
}

/// One entry's outcome from a [`OptionRegistry::merge`] call, with enough
/// context to surface a conflict naming both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub key: OptionKey,
    /// Location of the entry that was being merged in.
    pub incoming: SourceLocation,
    pub outcome: ConflictOutcome,
}

/// Insertion-ordered key→declaration store.
#[derive(Debug, Clone, Default)]
pub struct OptionRegistry {
    options: IndexMap<OptionKey, OptionDecl>,
}

impl OptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `decl` under its identity key, first-registered wins.
    pub fn register(&mut self, decl: OptionDecl) -> ConflictOutcome {
        let key = decl.key();
        match self.options.get(&key) {
            None => {
                self.options.insert(key, decl);
                ConflictOutcome::Inserted
            }
            Some(existing) if *existing == decl => ConflictOutcome::DuplicateIgnored,
            Some(existing) => ConflictOutcome::Conflict {
                existing: existing.location.clone(),
            },
        }
    }

    pub fn lookup(&self, key: &OptionKey) -> Option<&OptionDecl> {
        self.options.get(key)
    }

    pub fn contains(&self, key: &OptionKey) -> bool {
        self.options.contains_key(key)
    }

    /// Remove every entry whose defining document is `document`.
    ///
    /// Entries for other documents are untouched even when they share an
    /// option name.
    pub fn purge_for_document(&mut self, document: &str) {
        self.options
            .retain(|_, decl| decl.location.document.as_ref() != document);
    }

    /// Apply [`register`](Self::register) for every entry of `other`, in
    /// stable document-then-declaration order, returning per-entry outcomes
    /// for diagnostics.
    ///
    /// The resulting key→declaration mapping is identical regardless of
    /// which partial registry is merged first; only the `existing` location
    /// reported in a conflict can differ with merge order.
    pub fn merge(&mut self, other: OptionRegistry) -> Vec<MergeOutcome> {
        let mut entries: Vec<OptionDecl> = other.options.into_values().collect();
        // Declaration order within a document is the partial's insertion
        // order; the stable sort keeps it while grouping by document.
        entries.sort_by(|a, b| a.location.document.cmp(&b.location.document));

        entries
            .into_iter()
            .map(|decl| {
                let key = decl.key();
                let incoming = decl.location.clone();
                let outcome = self.register(decl);
                MergeOutcome {
                    key,
                    incoming,
                    outcome,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn clear(&mut self) {
        self.options.clear();
    }

    /// All declarations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&OptionKey, &OptionDecl)> {
        self.options.iter()
    }

    /// Declarations whose defining document is `document`.
    pub fn options_for_document<'a>(
        &'a self,
        document: &'a str,
    ) -> impl Iterator<Item = &'a OptionDecl> {
        self.options
            .values()
            .filter(move |decl| decl.location.document.as_ref() == document)
    }
}
