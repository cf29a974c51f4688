//! Error types for Mosaic operations

use crate::source::SourceKind;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by upstream source collaborators.
///
/// Retries and circuit-breaking are the collaborator's own responsibility;
/// by the time one of these reaches the merge, the fetch has already been
/// given up on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Source {kind} unavailable: {reason}")]
    Unavailable { kind: SourceKind, reason: String },

    #[error("Source {kind} timed out after {timeout:?}")]
    Timeout { kind: SourceKind, timeout: Duration },

    #[error("Malformed payload from {kind}: {reason}")]
    MalformedPayload { kind: SourceKind, reason: String },
}

impl SourceError {
    /// The source that produced this error.
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceError::Unavailable { kind, .. } => *kind,
            SourceError::Timeout { kind, .. } => *kind,
            SourceError::MalformedPayload { kind, .. } => *kind,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Incompatible options: {option_a} and {option_b}")]
    IncompatibleOptions { option_a: String, option_b: String },
}

/// Master error type for all Mosaic operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Mosaic operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// TESTS
// =============================================================================
