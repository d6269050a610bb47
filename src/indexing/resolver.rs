//! Deferred reference resolution.
//!
//! Forward references are legal: document A may reference an option that
//! document B declares, in any parse order. Reference events therefore
//! become [`PendingReference`] placeholders at parse time and are only
//! resolved once every document has been parsed and merged. Resolution over
//! a stable registry is deterministic and repeatable.

use crate::diagnostics::Diagnostic;
use crate::registry::OptionRegistry;
use crate::types::{CompactString, LinkTarget, OptionKey};
use serde::{Deserialize, Serialize};

/// A reference recorded before its target is guaranteed to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReference {
    pub key: OptionKey,
    /// The document whose text contains the mention.
    pub document: CompactString,
}

impl PendingReference {
    pub fn new(key: OptionKey, document: impl Into<CompactString>) -> Self {
        Self {
            key,
            document: document.into(),
        }
    }
}

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Resolved(LinkTarget),
    /// Render as plain text; `known_options` aids diagnosing near-misses.
    Unresolved { known_options: usize },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn link_target(&self) -> Option<&LinkTarget> {
        match self {
            Resolution::Resolved(target) => Some(target),
            Resolution::Unresolved { .. } => None,
        }
    }
}

/// A pending reference paired with its resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub reference: PendingReference,
    pub resolution: Resolution,
}

/// Statistics from one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

/// Resolves placeholders against a stabilized registry.
///
/// Duplicate matches are impossible by construction: the registry keeps a
/// single winner per key, so no tie-breaking happens here.
pub struct Resolver<'a> {
    registry: &'a OptionRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a OptionRegistry) -> Self {
        Self { registry }
    }

    /// Resolve a single key.
    pub fn resolve(&self, key: &OptionKey) -> Resolution {
        match self.registry.lookup(key) {
            Some(decl) => Resolution::Resolved(decl.link_target()),
            None => Resolution::Unresolved {
                known_options: self.registry.len(),
            },
        }
    }

    /// Resolve every placeholder, preserving input order.
    ///
    /// Unresolved references produce a diagnostic naming the missing key
    /// and the number of currently known options.
    pub fn resolve_all(
        &self,
        pending: &[PendingReference],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Vec<ResolvedReference>, ResolveStats) {
        let mut stats = ResolveStats::default();
        let mut resolved = Vec::with_capacity(pending.len());

        for reference in pending {
            stats.total += 1;
            let resolution = self.resolve(&reference.key);
            match &resolution {
                Resolution::Resolved(_) => stats.resolved += 1,
                Resolution::Unresolved { known_options } => {
                    stats.unresolved += 1;
                    let diag = Diagnostic::UnresolvedReference {
                        option_type: reference.key.option_type(),
                        name: reference.key.name().into(),
                        document: reference.document.clone(),
                        known_options: *known_options,
                    };
                    diag.emit();
                    diagnostics.push(diag);
                }
            }
            resolved.push(ResolvedReference {
                reference: reference.clone(),
                resolution,
            });
        }

        (resolved, stats)
    }
}
