//! Crate-level error type.
//!
//! Registry and resolver failures never surface here: they degrade to
//! [`Diagnostic`](crate::diagnostics::Diagnostic) values by design. This
//! type covers the ambient surface the host does have to handle.

use crate::indexing::PipelineError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    General(String),
}

pub type IndexResult<T> = Result<T, IndexError>;
