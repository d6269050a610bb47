//! Incremental build context: the single owner of the option registry and
//! reference log.
//!
//! All writes flow through this type, giving one serialization point even
//! though parsing may run across many workers. The incremental protocol is
//! purge-then-redo: reprocessing a document purges its previous entries
//! before the fresh ones land, and parallel partials are purged the same
//! way as they merge, so staleness never survives a rebuild.

use crate::config::Settings;
use crate::declaration::OptionDecl;
use crate::diagnostics::Diagnostic;
use crate::events::{DeclarationEvent, ReferenceEvent};
use crate::index::{IndexBuilder, IndexEntry};
use crate::indexing::pipeline::DocumentPartial;
use crate::indexing::resolver::{
    PendingReference, Resolution, ResolveStats, ResolvedReference, Resolver,
};
use crate::registry::{ConflictOutcome, OptionRegistry, ReferenceLog};
use crate::types::{CompactString, OptionKey, OptionType};
use std::collections::HashMap;
use std::sync::Arc;

/// Statistics from merging a batch of worker partials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub partials_merged: usize,
    pub options_merged: usize,
    pub references_merged: usize,
    pub conflicts: usize,
}

/// Output of a full resolution pass over the deferred references.
#[derive(Debug, Clone)]
pub struct ResolveOutput {
    /// One entry per placeholder, in recording order.
    pub references: Vec<ResolvedReference>,
    pub stats: ResolveStats,
    pub diagnostics: Vec<Diagnostic>,
}

/// Coordinator for one incremental build.
///
/// Created once per build by the host and driven by three signals:
/// [`document_changed`](Self::document_changed) before a document is
/// reprocessed, [`workers_joined`](Self::workers_joined) when a parallel
/// batch completes, and [`reset`](Self::reset) for a full rebuild.
#[derive(Debug)]
pub struct BuildContext {
    registry: OptionRegistry,
    references: ReferenceLog,
    pending: Vec<PendingReference>,
    titles: HashMap<CompactString, CompactString>,
    diagnostics: Vec<Diagnostic>,
    settings: Arc<Settings>,
}

impl BuildContext {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            registry: OptionRegistry::new(),
            references: ReferenceLog::new(),
            pending: Vec::new(),
            titles: HashMap::new(),
            diagnostics: Vec::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }

    pub fn references(&self) -> &ReferenceLog {
        &self.references
    }

    /// Number of options currently known across the corpus.
    pub fn known_option_count(&self) -> usize {
        self.registry.len()
    }

    /// Deferred references recorded so far.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // =========================================================================
    // Event intake (per-document parse time)
    // =========================================================================

    /// Register a declaration and return the descriptive fragment the
    /// renderer embeds at the declaration site.
    ///
    /// A conflicting re-declaration keeps the first-registered entry and
    /// records a diagnostic naming both locations; the fragment is still
    /// produced so the document renders without the link machinery.
    pub fn declare(&mut self, event: DeclarationEvent) -> String {
        let mut diagnostics = Vec::new();
        let decl = event.into_decl(&mut diagnostics);
        let fragment = decl.description(
            &self.settings.project,
            self.settings.since_ignore_before.as_deref(),
            &mut diagnostics,
        );

        self.register_decl(decl, &mut diagnostics);
        self.absorb_diagnostics(diagnostics);
        fragment
    }

    /// Record a reference and hand back its deferred placeholder.
    ///
    /// No lookup happens here: the target may legally be declared by a
    /// document that has not been parsed yet.
    pub fn reference(&mut self, event: ReferenceEvent) -> PendingReference {
        let key = OptionKey::for_reference(event.option_type, event.name.as_str(), &event.document);
        self.references.record(key.clone(), event.document.as_str());

        let pending = PendingReference::new(key, event.document.as_str());
        self.pending.push(pending.clone());
        pending
    }

    /// Record the display title used when ordering a document's links in
    /// generated indices.
    pub fn set_document_title(&mut self, document: impl Into<CompactString>, title: impl Into<CompactString>) {
        self.titles.insert(document.into(), title.into());
    }

    pub fn document_title(&self, document: &str) -> Option<&str> {
        self.titles.get(document).map(AsRef::as_ref)
    }

    // =========================================================================
    // Incremental signals
    // =========================================================================

    /// Purge all state owned by `document` ahead of its reprocessing.
    ///
    /// Must run before the document's fresh declarations and references are
    /// re-registered; the title survives since it is keyed to the document
    /// itself, not its parse.
    pub fn document_changed(&mut self, document: &str) {
        self.registry.purge_for_document(document);
        self.references.purge_for_document(document);
        self.pending
            .retain(|pending| pending.document.as_ref() != document);
        tracing::debug!(target: "optlink", "purged state for changed document {document}");
    }

    /// Purge a document that no longer exists in the corpus.
    ///
    /// Deletion is never inferred from absence; the host calls this
    /// explicitly, including for documents removed while a parallel batch
    /// was in flight (after [`workers_joined`](Self::workers_joined)).
    pub fn document_removed(&mut self, document: &str) {
        self.document_changed(document);
        self.titles.remove(document);
    }

    /// Merge worker partials produced by a parallel batch.
    ///
    /// Each partial's document is purged immediately before its fresh state
    /// merges, so a batch doubles as the incremental rebuild of every
    /// document it covers. Merge order does not affect the resulting
    /// key→declaration mapping.
    pub fn workers_joined(
        &mut self,
        partials: impl IntoIterator<Item = DocumentPartial>,
    ) -> MergeStats {
        let mut stats = MergeStats::default();

        for partial in partials {
            stats.partials_merged += 1;
            self.document_changed(&partial.document);

            if let Some(title) = partial.title {
                self.titles.insert(partial.document.clone(), title);
            }

            stats.options_merged += partial.registry.len();
            for merged in self.registry.merge(partial.registry) {
                if let ConflictOutcome::Conflict { existing } = merged.outcome {
                    stats.conflicts += 1;
                    let diag = Diagnostic::DuplicateOption {
                        key: merged.key,
                        kept: existing,
                        rejected: merged.incoming,
                    };
                    diag.emit();
                    self.diagnostics.push(diag);
                }
            }

            stats.references_merged += partial.references.len();
            self.references.merge(partial.references);
            self.pending.extend(partial.pending);
            self.absorb_diagnostics(partial.diagnostics);
        }

        tracing::info!(
            target: "optlink",
            "merged {} partials: {} options, {} references, {} conflicts",
            stats.partials_merged,
            stats.options_merged,
            stats.references_merged,
            stats.conflicts,
        );
        stats
    }

    /// Clear all state for a full rebuild. Idempotent.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.references.clear();
        self.pending.clear();
        self.titles.clear();
        self.diagnostics.clear();
    }

    // =========================================================================
    // Post-barrier queries
    // =========================================================================

    /// Best-effort lookup of a single placeholder.
    ///
    /// Before the whole corpus has been parsed this may miss targets that a
    /// later document declares; after the barrier it is authoritative.
    pub fn resolve(&self, pending: &PendingReference) -> Resolution {
        Resolver::new(&self.registry).resolve(&pending.key)
    }

    /// Resolve every deferred reference against the stabilized registry.
    ///
    /// Only meaningful once all documents have been parsed and merged.
    /// Pure: calling it twice on the same state yields identical output,
    /// and the placeholders stay recorded for later passes.
    pub fn resolve_pending(&self) -> ResolveOutput {
        let mut diagnostics = Vec::new();
        let (references, stats) =
            Resolver::new(&self.registry).resolve_all(&self.pending, &mut diagnostics);
        ResolveOutput {
            references,
            stats,
            diagnostics,
        }
    }

    /// Materialize the type-filtered option index.
    ///
    /// `requested_types` of `None` means all known types.
    pub fn build_index(&self, requested_types: Option<&[OptionType]>) -> Vec<IndexEntry> {
        IndexBuilder::new(&self.registry, &self.references, &self.titles).build(requested_types)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Append externally collected diagnostics (e.g. from a resolution
    /// pass) to the build's record.
    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    fn register_decl(&mut self, decl: OptionDecl, diagnostics: &mut Vec<Diagnostic>) {
        let key = decl.key();
        let rejected = decl.location.clone();
        if let ConflictOutcome::Conflict { existing } = self.registry.register(decl) {
            diagnostics.push(Diagnostic::DuplicateOption {
                key,
                kept: existing,
                rejected,
            });
        }
    }

    fn absorb_diagnostics(&mut self, diagnostics: Vec<Diagnostic>) {
        for diag in &diagnostics {
            diag.emit();
        }
        self.diagnostics.extend(diagnostics);
    }

    // =========================================================================
    // Snapshot support (host-owned persistence)
    // =========================================================================

    pub(crate) fn state(
        &self,
    ) -> (
        &OptionRegistry,
        &ReferenceLog,
        &HashMap<CompactString, CompactString>,
    ) {
        (&self.registry, &self.references, &self.titles)
    }

    pub(crate) fn restore(
        settings: Arc<Settings>,
        registry: OptionRegistry,
        references: ReferenceLog,
        pending: Vec<PendingReference>,
        titles: HashMap<CompactString, CompactString>,
    ) -> Self {
        Self {
            registry,
            references,
            pending,
            titles,
            diagnostics: Vec::new(),
            settings,
        }
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(Arc::new(Settings::default()))
    }
}
