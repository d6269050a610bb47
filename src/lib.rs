//! Cross-document option indexing and reference resolution.
//!
//! Documents declare named options and reference options declared anywhere
//! in the corpus, possibly before their declaration has been seen. This
//! crate maintains the registry, resolves references against it once the
//! whole corpus has been parsed, and emits plain link/index data for a
//! renderer to lay out. Incremental rebuilds purge a document's state
//! before its reprocessing; parallel workers produce document-local
//! partials that merge at a single barrier.

pub mod config;
pub mod declaration;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod index;
pub mod indexing;
pub mod logging;
pub mod registry;
pub mod storage;
pub mod types;

pub use config::Settings;
pub use declaration::{OptionDecl, OptionMetadata, version_at_least};
pub use diagnostics::Diagnostic;
pub use error::{IndexError, IndexResult};
pub use events::{DeclarationEvent, DocumentEvent, ReferenceEvent};
pub use index::{DocumentLink, IndexBuilder, IndexEntry};
pub use indexing::{
    BatchOutput, BatchStats, BuildContext, DeclarationFragment, DocumentPartial, DocumentSource,
    MergeStats, ParallelBatch, PendingReference, Resolution, ResolveOutput, ResolveStats,
    ResolvedReference, Resolver, process_document,
};
pub use registry::{ConflictOutcome, MergeOutcome, OptionRegistry, ReferenceLog};
pub use storage::{Snapshot, StorageError};
pub use types::{CompactString, LinkTarget, OptionKey, OptionType, SourceLocation};
