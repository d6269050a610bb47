//! Parallel document processing.
//!
//! ```text
//! FEED → PROCESS (N workers) → MERGE (single owner) → RESOLVE
//!   │         │                     │
//!   ▼         ▼                     ▼
//! [sources] [partials]        BuildContext
//! ```
//!
//! Workers share no mutable state: each consumes one document's event
//! stream and produces a document-local [`DocumentPartial`]. The merge is
//! the only synchronization point, performed by the coordinating owner
//! after every worker has finished; final resolution must not start before
//! that barrier closes, because forward references depend on the complete
//! corpus being registered first.

use crate::config::Settings;
use crate::declaration::OptionDecl;
use crate::diagnostics::Diagnostic;
use crate::events::DocumentEvent;
use crate::indexing::context::{BuildContext, MergeStats};
use crate::indexing::resolver::PendingReference;
use crate::registry::{ConflictOutcome, OptionRegistry, ReferenceLog};
use crate::types::{CompactString, OptionKey, SourceLocation};
use crossbeam_channel::bounded;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Pipeline failure: these are harness faults, not document problems.
/// Document-level issues always degrade to diagnostics instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("worker thread panicked")]
    WorkerPanicked,
    #[error("channel closed unexpectedly: {0}")]
    ChannelClosed(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// One document's already-parsed event stream, as handed in by the host.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub name: String,
    pub title: Option<String>,
    pub events: Vec<DocumentEvent>,
}

impl DocumentSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            events: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = DocumentEvent>) -> Self {
        self.events = events.into_iter().collect();
        self
    }
}

/// Descriptive fragment produced for one declaration site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationFragment {
    pub location: SourceLocation,
    pub text: String,
}

/// Document-local output of one worker: a partial registry and reference
/// log plus the deferred placeholders, ready to merge at the barrier.
#[derive(Debug, Default)]
pub struct DocumentPartial {
    pub document: CompactString,
    pub title: Option<CompactString>,
    pub registry: OptionRegistry,
    pub references: ReferenceLog,
    pub pending: Vec<PendingReference>,
    pub fragments: Vec<DeclarationFragment>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Process one document's events into a [`DocumentPartial`].
///
/// Runs worker-side with no access to global state; safe to call from any
/// thread. Conflicts detected here are same-document re-declarations; the
/// cross-document ones surface at merge time.
pub fn process_document(source: DocumentSource, settings: &Settings) -> DocumentPartial {
    let mut partial = DocumentPartial {
        document: source.name.as_str().into(),
        title: source.title.map(Into::into),
        ..DocumentPartial::default()
    };

    for event in source.events {
        match event {
            DocumentEvent::Declaration(event) => {
                let mut diagnostics = Vec::new();
                let decl = event.into_decl(&mut diagnostics);
                let text = decl.description(
                    &settings.project,
                    settings.since_ignore_before.as_deref(),
                    &mut diagnostics,
                );
                partial.fragments.push(DeclarationFragment {
                    location: decl.location.clone(),
                    text,
                });
                register_local(&mut partial, decl, &mut diagnostics);
                partial.diagnostics.extend(diagnostics);
            }
            DocumentEvent::Reference(event) => {
                let key = OptionKey::for_reference(
                    event.option_type,
                    event.name.as_str(),
                    &event.document,
                );
                partial
                    .references
                    .record(key.clone(), event.document.as_str());
                partial
                    .pending
                    .push(PendingReference::new(key, event.document.as_str()));
            }
        }
    }

    partial
}

fn register_local(
    partial: &mut DocumentPartial,
    decl: OptionDecl,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let key = decl.key();
    let rejected = decl.location.clone();
    if let ConflictOutcome::Conflict { existing } = partial.registry.register(decl) {
        diagnostics.push(Diagnostic::DuplicateOption {
            key,
            kept: existing,
            rejected,
        });
    }
}

/// Statistics from one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub documents_processed: usize,
    pub merge: MergeStats,
    pub elapsed: Duration,
}

/// Fragments produced by a batch, grouped per document in name order so the
/// host can pair them back with declaration sites.
#[derive(Debug, Default)]
pub struct BatchOutput {
    pub stats: BatchStats,
    pub fragments: Vec<(CompactString, Vec<DeclarationFragment>)>,
}

/// Fan-out/fan-in driver over independent documents.
pub struct ParallelBatch {
    settings: Arc<Settings>,
}

impl ParallelBatch {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Process `documents` across worker threads and merge the partials
    /// into `context` at the barrier.
    ///
    /// Resolution of deferred references is left to the caller via
    /// [`BuildContext::resolve_pending`] once this returns; returning is
    /// what closes the barrier.
    pub fn run(
        &self,
        documents: Vec<DocumentSource>,
        context: &mut BuildContext,
    ) -> PipelineResult<BatchOutput> {
        let start = Instant::now();
        let worker_count = self
            .settings
            .indexing
            .parallel_threads
            .clamp(1, documents.len().max(1));
        let capacity = self.settings.indexing.channel_capacity.max(1);

        let (source_tx, source_rx) = bounded::<DocumentSource>(capacity);
        let (partial_tx, partial_rx) = bounded::<DocumentPartial>(capacity);

        let worker_handles: Vec<_> = (0..worker_count)
            .map(|_| {
                let rx = source_rx.clone();
                let tx = partial_tx.clone();
                let settings = Arc::clone(&self.settings);
                thread::spawn(move || {
                    let mut processed = 0usize;
                    for source in rx {
                        let partial = process_document(source, &settings);
                        if tx.send(partial).is_err() {
                            break; // Receiver gone; nothing left to report to.
                        }
                        processed += 1;
                    }
                    processed
                })
            })
            .collect();
        drop(source_rx);
        drop(partial_tx);

        let feeder = thread::spawn(move || {
            for source in documents {
                if source_tx.send(source).is_err() {
                    break;
                }
            }
        });

        // Collect partials while workers run; the channel closing is the
        // completion signal for the whole batch.
        let mut partials: Vec<DocumentPartial> = partial_rx.iter().collect();

        feeder.join().map_err(|_| PipelineError::WorkerPanicked)?;
        let mut documents_processed = 0usize;
        for handle in worker_handles {
            documents_processed += handle.join().map_err(|_| PipelineError::WorkerPanicked)?;
        }

        // Deterministic handoff regardless of worker completion order.
        // Merge itself is order-independent; this keeps fragment output and
        // conflict reporting stable across runs too.
        partials.sort_by(|a, b| a.document.cmp(&b.document));

        let fragments = partials
            .iter_mut()
            .map(|partial| (partial.document.clone(), std::mem::take(&mut partial.fragments)))
            .collect();

        let merge = context.workers_joined(partials);

        let stats = BatchStats {
            documents_processed,
            merge,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            target: "optlink",
            "batch complete: {} documents, {} options, {} references in {:?}",
            stats.documents_processed,
            stats.merge.options_merged,
            stats.merge.references_merged,
            stats.elapsed,
        );

        Ok(BatchOutput { stats, fragments })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{DeclarationEvent, ReferenceEvent};
    use crate::types::OptionType;

    fn make_source(name: &str, events: Vec<DocumentEvent>) -> DocumentSource {
        DocumentSource::new(name).with_events(events)
    }

    #[test]
    fn test_process_document_is_local() {
        let settings = Settings::default();
        let source = make_source(
            "gtiff",
            vec![
                DeclarationEvent::new(OptionType::CreationOption, "COMPRESS", "gtiff", 12)
                    .with_choices(["NONE", "LZW"])
                    .into(),
                ReferenceEvent::new(OptionType::Config, "CPL_DEBUG", "gtiff").into(),
            ],
        );

        let partial = process_document(source, &settings);

        assert_eq!(partial.registry.len(), 1);
        assert_eq!(partial.pending.len(), 1);
        assert_eq!(partial.fragments.len(), 1);
        assert!(partial.fragments[0].text.contains("COMPRESS=[NONE/LZW]"));
    }

    #[test]
    fn test_same_document_conflict_detected_locally() {
        let settings = Settings::default();
        let source = make_source(
            "doc",
            vec![
                DeclarationEvent::new(OptionType::Config, "X", "doc", 1)
                    .with_default("1")
                    .into(),
                DeclarationEvent::new(OptionType::Config, "X", "doc", 9)
                    .with_default("2")
                    .into(),
            ],
        );

        let partial = process_document(source, &settings);

        assert_eq!(partial.registry.len(), 1);
        assert_eq!(partial.diagnostics.len(), 1);
        assert!(matches!(
            partial.diagnostics[0],
            Diagnostic::DuplicateOption { .. }
        ));
    }

    #[test]
    fn test_batch_matches_sequential_processing() {
        let settings = Arc::new(Settings::default());
        let sources = vec![
            make_source(
                "b",
                vec![ReferenceEvent::new(OptionType::Config, "X", "b").into()],
            ),
            make_source(
                "a",
                vec![
                    DeclarationEvent::new(OptionType::Config, "X", "a", 10)
                        .with_default("1")
                        .into(),
                ],
            ),
        ];

        // Parallel path.
        let mut parallel = BuildContext::new(Arc::clone(&settings));
        let output = ParallelBatch::new(Arc::clone(&settings))
            .run(sources.clone(), &mut parallel)
            .unwrap();
        assert_eq!(output.stats.documents_processed, 2);

        // Sequential path over the same events.
        let mut sequential = BuildContext::new(settings);
        for source in sources {
            for event in source.events {
                match event {
                    DocumentEvent::Declaration(event) => {
                        sequential.declare(event);
                    }
                    DocumentEvent::Reference(event) => {
                        sequential.reference(event);
                    }
                }
            }
        }

        assert_eq!(
            parallel.known_option_count(),
            sequential.known_option_count()
        );
        let resolve_parallel = parallel.resolve_pending();
        let resolve_sequential = sequential.resolve_pending();
        assert_eq!(resolve_parallel.stats, resolve_sequential.stats);
        assert_eq!(resolve_parallel.stats.resolved, 1);
    }

    #[test]
    fn test_fragments_grouped_by_document() {
        let settings = Arc::new(Settings::default());
        let sources = vec![
            make_source(
                "z",
                vec![
                    DeclarationEvent::new(OptionType::OpenOption, "B", "z", 2).into(),
                ],
            ),
            make_source(
                "a",
                vec![
                    DeclarationEvent::new(OptionType::OpenOption, "A", "a", 1).into(),
                ],
            ),
        ];

        let mut context = BuildContext::new(Arc::clone(&settings));
        let output = ParallelBatch::new(settings).run(sources, &mut context).unwrap();

        let docs: Vec<&str> = output
            .fragments
            .iter()
            .map(|(doc, _)| doc.as_ref())
            .collect();
        assert_eq!(docs, vec!["a", "z"]);
    }
}
