//! Unified error types for the domain layer
//!
//! Every state transition on the opposed test card returns `Result<_, DomainError>`
//! so the engine can reject a mutation before anything is written.

use thiserror::Error;

use crate::entities::Lane;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., roll total outside 1..=100)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The lane already banked a declaration
    #[error("{0} lane has already committed")]
    AlreadyCommitted(Lane),

    /// The lane has no banked declaration yet
    #[error("{0} lane has not committed a declaration")]
    NotCommitted(Lane),

    /// The card is frozen
    #[error("Opposed test is already resolved")]
    AlreadyResolved,

    /// Card written by an unsupported schema
    #[error("Unsupported schema version {found} (supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }
}
