//! Domain-specific error types following panic-free policy.

use thiserror::Error;

/// Errors that can occur when constructing domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Display name is not exactly the required byte length
    #[error("Invalid display name: {len} bytes (expected exactly {expected})")]
    InvalidDisplayName { len: usize, expected: usize },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
