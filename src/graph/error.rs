//! Errors raised by graph operations
//!
//! Vetoed mutations are not errors; they surface as
//! [`MutationOutcome::Vetoed`](super::MutationOutcome::Vetoed).

use super::id::{ElementKind, Identity};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("property '{0}' is part of the element identity and cannot be changed")]
    IdentityImmutable(String),

    #[error("{kind} {id} already exists")]
    DuplicateIdentifier { kind: ElementKind, id: String },

    #[error("{kind} {id} not found")]
    UnknownElement { kind: ElementKind, id: String },

    #[error("no {0} ids left to hand out")]
    IdsExhausted(String),

    #[error("configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphError {
    pub(crate) fn duplicate<I: Identity>(id: &I) -> Self {
        Self::DuplicateIdentifier {
            kind: I::kind(),
            id: id.to_string(),
        }
    }

    pub(crate) fn exhausted<I: Identity>() -> Self {
        Self::IdsExhausted(I::kind().to_string())
    }

    pub(crate) fn unknown<I: Identity>(id: &I) -> Self {
        Self::UnknownElement {
            kind: I::kind(),
            id: id.to_string(),
        }
    }
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
