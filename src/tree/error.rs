use thiserror::Error;

use crate::database::DatabaseError;
use crate::tree::node::NodeId;
use crate::types::EntityKind;

/// Errors raised by tree validation, queries and mutations
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("{kind} {id} cannot be its own parent")]
    SelfParent { kind: EntityKind, id: NodeId },

    #[error("placing {kind} {id} under {parent_id} would create a circular reference")]
    CircularReference {
        kind: EntityKind,
        id: NodeId,
        parent_id: NodeId,
    },

    #[error("{kind} {parent_id} belongs to a different scope than {id}")]
    CrossScope {
        kind: EntityKind,
        id: NodeId,
        parent_id: NodeId,
    },

    #[error("position {position} is already taken by {kind} {occupied_by}")]
    PositionConflict {
        kind: EntityKind,
        position: i32,
        occupied_by: NodeId,
    },

    #[error("position must be at least 1, got {0}")]
    InvalidPosition(i32),

    #[error("no position is left after {0}")]
    PositionOverflow(i32),

    #[error("{kind} {id} still has {count} child node(s)")]
    HasChildren {
        kind: EntityKind,
        id: NodeId,
        count: usize,
    },

    #[error("{kind} {id} still has {count} attached item(s)")]
    HasAssociatedContent {
        kind: EntityKind,
        id: NodeId,
        count: u64,
    },

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: NodeId },

    #[error("cannot {action} {kind} {id}: {reason}")]
    InvalidTransition {
        kind: EntityKind,
        id: NodeId,
        action: &'static str,
        reason: String,
    },

    #[error("{kind} {id} is not valid: {message}")]
    Validation {
        kind: EntityKind,
        id: NodeId,
        field: &'static str,
        message: String,
    },

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

impl TreeError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            TreeError::SelfParent { .. } => "SELF_PARENT",
            TreeError::CircularReference { .. } => "CIRCULAR_REFERENCE",
            TreeError::CrossScope { .. } => "CROSS_SCOPE",
            TreeError::PositionConflict { .. } => "POSITION_CONFLICT",
            TreeError::InvalidPosition(_) => "INVALID_POSITION",
            TreeError::PositionOverflow(_) => "POSITION_OVERFLOW",
            TreeError::HasChildren { .. } => "HAS_CHILDREN",
            TreeError::HasAssociatedContent { .. } => "HAS_ASSOCIATED_CONTENT",
            TreeError::NotFound { .. } => "NOT_FOUND",
            TreeError::InvalidTransition { .. } => "INVALID_TRANSITION",
            TreeError::Validation { .. } => "VALIDATION_ERROR",
            TreeError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Request field the error is about, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            TreeError::SelfParent { .. }
            | TreeError::CircularReference { .. }
            | TreeError::CrossScope { .. } => Some("parent_id"),
            TreeError::PositionConflict { .. }
            | TreeError::InvalidPosition(_)
            | TreeError::PositionOverflow(_) => Some("position"),
            TreeError::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }
}

pub type TreeResult<T> = Result<T, TreeError>;
