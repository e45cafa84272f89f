//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`SmartHomeError`] via `#[from]` or an explicit `From` impl.

use crate::device::DeviceKind;

/// Top-level error returned by domain and application operations.
#[derive(Debug, thiserror::Error)]
pub enum SmartHomeError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The referenced item does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The external snapshot source was unreachable or malformed.
    #[error("failed to load home snapshot")]
    Load(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("identifier must not be empty")]
    EmptyId,

    #[error("duplicate device id: {0}")]
    DuplicateId(String),

    #[error("device {0} has no kind and no control field to infer it from")]
    MissingKind(String),

    #[error("device {id} of kind {kind} has no continuous control")]
    NoContinuousControl { id: String, kind: DeviceKind },

    #[error("series {series} has mismatched lengths ({expected} labels, {actual} samples)")]
    SeriesLengthMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Lookup failure for an item identified by `id`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
