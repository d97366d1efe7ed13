use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Cell is already occupied: {0}")]
    OccupiedCell(String),

    #[error("Span overflows the day: block {block} + span {span} exceeds {max} blocks")]
    SpanOverflow { block: u8, span: u8, max: u8 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Partial failure: {0}")]
    PartialFailure(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GridError {
    /// True for failures detected locally before any persistence call.
    /// These are surfaced to the user immediately and never retried.
    pub fn is_local_validation(&self) -> bool {
        matches!(
            self,
            Self::OccupiedCell(_) | Self::SpanOverflow { .. } | Self::Validation(_)
        )
    }

    /// True for failures of the persistence collaborator that require a
    /// window reload to resynchronize local state.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Io(_))
    }
}
