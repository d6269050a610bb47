pub mod context;
pub mod pipeline;
pub mod resolver;

pub use context::{BuildContext, MergeStats, ResolveOutput};
pub use pipeline::{
    BatchOutput, BatchStats, DeclarationFragment, DocumentPartial, DocumentSource, ParallelBatch,
    PipelineError, PipelineResult, process_document,
};
pub use resolver::{PendingReference, Resolution, ResolveStats, ResolvedReference, Resolver};
