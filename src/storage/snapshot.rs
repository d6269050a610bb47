//! Persisted index state across incremental runs.
//!
//! The host owns when and where snapshots are taken; the core only defines
//! the shape and the JSON save/load helpers. Deferred placeholders are not
//! stored: the reference log carries the same `(key, document)` pairs, so a
//! restored context can re-run resolution without them.

use crate::config::Settings;
use crate::indexing::context::BuildContext;
use crate::indexing::resolver::PendingReference;
use crate::declaration::OptionDecl;
use crate::registry::{OptionRegistry, ReferenceLog};
use crate::storage::{StorageError, StorageResult};
use crate::types::{CompactString, OptionKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// One key's referencing documents, stored as a record because JSON maps
/// cannot key on structured values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub key: OptionKey,
    pub documents: Vec<CompactString>,
}

/// Serializable image of a stabilized build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Declarations in registration order, so restoring replays them with
    /// identical first-wins outcomes.
    pub options: Vec<OptionDecl>,
    pub references: Vec<ReferenceRecord>,
    /// Document display titles, sorted by document name.
    pub titles: Vec<(CompactString, CompactString)>,
}

impl Snapshot {
    pub const FORMAT_VERSION: u32 = 1;

    /// Capture the persistable state of `context`.
    pub fn capture(context: &BuildContext) -> Self {
        let (registry, references, titles) = context.state();

        let options = registry.iter().map(|(_, decl)| decl.clone()).collect();
        let references = references
            .iter()
            .map(|(key, documents)| ReferenceRecord {
                key: key.clone(),
                documents: documents.iter().cloned().collect(),
            })
            .collect();

        let mut titles: Vec<(CompactString, CompactString)> = titles
            .iter()
            .map(|(doc, title)| (doc.clone(), title.clone()))
            .collect();
        titles.sort();

        Self {
            version: Self::FORMAT_VERSION,
            options,
            references,
            titles,
        }
    }

    /// Rebuild a context from this snapshot.
    ///
    /// Placeholders are reconstructed from the reference log, one per
    /// `(key, document)` pair, so resolution is immediately re-runnable.
    pub fn restore(self, settings: Arc<Settings>) -> StorageResult<BuildContext> {
        if self.version != Self::FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: self.version,
                expected: Self::FORMAT_VERSION,
            });
        }

        let mut registry = OptionRegistry::new();
        for decl in self.options {
            registry.register(decl);
        }

        let mut references = ReferenceLog::new();
        let mut pending = Vec::new();
        for record in self.references {
            for document in record.documents {
                references.record(record.key.clone(), document.clone());
                pending.push(PendingReference::new(record.key.clone(), document));
            }
        }

        let titles: HashMap<CompactString, CompactString> = self.titles.into_iter().collect();

        Ok(BuildContext::restore(
            settings, registry, references, pending, titles,
        ))
    }

    /// Write as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read back from JSON.
    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
