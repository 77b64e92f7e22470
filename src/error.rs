//! Error types for cogspace.
//!
//! Each layer has its own thiserror enum; [`CogError`] wraps them so callers
//! that mix store, snapshot and inference calls can use one result type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::{SnapshotError, StorageError};

/// Validation errors raised when building rules or settings.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Rule '{rule}' has no premises")]
    NoPremises {
        rule: String,
    },

    #[error("Rule '{rule}' conclusion must name a concrete atom kind")]
    UnspecifiedConclusionKind {
        rule: String,
    },

    #[error("Rule '{rule}' weight {weight} is not finite")]
    NonFiniteWeight {
        rule: String,
        weight: f32,
    },

    #[error("Setting '{field}' is out of range: {reason}")]
    OutOfRange {
        field: String,
        reason: String,
    },
}

/// Top-level error type for cogspace.
#[derive(Debug, Error)]
pub enum CogError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl CogError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is a snapshot error.
    #[must_use]
    pub const fn is_snapshot(&self) -> bool {
        matches!(self, Self::Snapshot(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if the error reports a missing atom, directly or through
    /// a snapshot import.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Storage(StorageError::AtomNotFound(_))
                | Self::Snapshot(SnapshotError::Storage(StorageError::AtomNotFound(_)))
        )
    }

    /// Returns true if the store ran out of capacity.
    #[must_use]
    pub const fn is_resource_exhausted(&self) -> bool {
        matches!(
            self,
            Self::Storage(StorageError::ResourceExhausted { .. })
                | Self::Snapshot(SnapshotError::Storage(StorageError::ResourceExhausted { .. }))
        )
    }
}

/// Result type alias for cogspace operations.
pub type CogResult<T> = Result<T, CogError>;
