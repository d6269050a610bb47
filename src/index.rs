//! Generated option indices.
//!
//! An index is a plain data structure: entry → definition link, entry →
//! ordered referencing-document links. Rendering it into any particular
//! markup (flat list when an entry has a single referencing document,
//! nested grouping otherwise) is a downstream concern.

use crate::registry::{OptionRegistry, ReferenceLog};
use crate::types::{CompactString, LinkTarget, OptionKey, OptionType};
use std::collections::{BTreeSet, HashMap};

/// A link to a document, carrying its display title when one is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    pub document: CompactString,
    pub title: Option<CompactString>,
}

impl DocumentLink {
    /// Sort key: title when present, document name otherwise, with the
    /// name as tiebreaker so output is reproducible across runs.
    fn order_key(&self) -> (&str, &str) {
        (
            self.title.as_deref().unwrap_or(self.document.as_ref()),
            self.document.as_ref(),
        )
    }
}

/// One option's row in a generated index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: OptionKey,
    pub name: CompactString,
    pub option_type: OptionType,
    /// Definition link.
    pub target: LinkTarget,
    /// Referencing documents in stable order. Always contains at least the
    /// defining document, so every declared option appears with one link.
    pub references: Vec<DocumentLink>,
}

impl IndexEntry {
    /// True when the renderer can lay the entry out as a single flat link.
    pub fn is_flat(&self) -> bool {
        self.references.len() == 1
    }
}

/// Builds deterministic, type-filtered listings over stabilized stores.
pub struct IndexBuilder<'a> {
    registry: &'a OptionRegistry,
    references: &'a ReferenceLog,
    titles: &'a HashMap<CompactString, CompactString>,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        registry: &'a OptionRegistry,
        references: &'a ReferenceLog,
        titles: &'a HashMap<CompactString, CompactString>,
    ) -> Self {
        Self {
            registry,
            references,
            titles,
        }
    }

    /// Produce the index for `requested_types` (`None` means every type).
    ///
    /// Entries sort case-sensitively by option name, then by key, so two
    /// same-named options of different types or scopes order stably. A type
    /// with no declarations simply contributes nothing.
    pub fn build(&self, requested_types: Option<&[OptionType]>) -> Vec<IndexEntry> {
        let wanted = |ty: OptionType| match requested_types {
            None => true,
            Some(types) => types.contains(&ty),
        };

        let mut entries: Vec<IndexEntry> = self
            .registry
            .iter()
            .filter(|(key, _)| wanted(key.option_type()))
            .map(|(key, decl)| {
                let mut documents: BTreeSet<&str> = self.references.documents_for(key).collect();
                documents.insert(decl.location.document.as_ref());

                let mut references: Vec<DocumentLink> = documents
                    .into_iter()
                    .map(|document| DocumentLink {
                        document: document.into(),
                        title: self.titles.get(document).cloned(),
                    })
                    .collect();
                references.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

                IndexEntry {
                    key: key.clone(),
                    name: decl.name.clone(),
                    option_type: decl.option_type,
                    target: decl.link_target(),
                    references,
                }
            })
            .collect();

        entries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.key.cmp(&b.key)));
        entries
    }
}
