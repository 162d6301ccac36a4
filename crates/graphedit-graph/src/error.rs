use graphedit_core::DocumentError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{pending} actions were queued before initialization (limit {limit})")]
    QueueOverflow { pending: usize, limit: usize },
    #[error(transparent)]
    Document(#[from] DocumentError),
}
