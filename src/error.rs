//! Error types for the model graph

use thiserror::Error;

use crate::graph::{ElementId, ElementKind, RelationKind};

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Model graph errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Constraint violated on {relation}: {message}")]
    ConstraintViolation {
        relation: RelationKind,
        message: String,
    },

    #[error("{kind} cannot play role '{role}' of {relation}")]
    RoleMismatch {
        relation: RelationKind,
        role: &'static str,
        kind: ElementKind,
    },

    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("Cycle detected over {relation}: {}", format_path(.path))]
    CyclicGraph {
        relation: RelationKind,
        path: Vec<ElementId>,
    },

    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Shorthand for an `InvalidArgument` error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Shorthand for a `ConstraintViolation` error
    pub fn constraint(relation: RelationKind, message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            relation,
            message: message.into(),
        }
    }
}

fn format_path(path: &[ElementId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
