//! Error types for intake operations
//!
//! Most classes here are recovered close to where they arise (schema and
//! preference errors fall back to derived defaults, validation errors are
//! controller no-ops); they are still modeled as values so the recovery is
//! explicit and testable.

use crate::enums::RecordState;
use crate::identity::{FieldName, FormName, RecordId};
use thiserror::Error;

/// Schema document errors. Always recovered by falling back to catch-all
/// column derivation; never surfaced to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema document is not valid JSON: {reason}")]
    InvalidJson { reason: String },

    #[error("Schema document has an unexpected shape: {reason}")]
    UnexpectedShape { reason: String },
}

/// Preference persistence errors. Recovered by discarding the stored payload
/// and re-deriving columns from the schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreferenceError {
    #[error("Malformed preference payload under {key}: {reason}")]
    MalformedPayload { key: String, reason: String },

    #[error("Stored preference under {key} matches no live column")]
    NoMatchingColumns { key: String },

    #[error("Preference store lock poisoned")]
    StorePoisoned,
}

/// Data-source errors while loading forms or submissions. Surfaced to the
/// user through the notification sink; the table returns to its pre-fetch
/// state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("Fetching submissions for {form} ({state}) failed: {reason}")]
    FetchFailed {
        form: FormName,
        state: RecordState,
        reason: String,
    },

    #[error("Submission payload could not be decoded: {reason}")]
    BadPayload { reason: String },
}

/// Bulk-action errors. Partial success is preserved: succeeded rows leave
/// the view, failed rows stay selected for retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Action {action} is not permitted for the current selection")]
    NotPermitted { action: String },

    #[error("Action failed for record {record_id}: {reason}")]
    RecordFailed { record_id: RecordId, reason: String },
}

/// Validation errors. These originate from internally consistent UI state;
/// the controllers treat them as silent no-ops.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown field: {field}")]
    UnknownField { field: FieldName },

    #[error("Detail position {position} out of bounds (total {total})")]
    PositionOutOfBounds { position: usize, total: usize },
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
}

/// Master error type for all intake operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Preference error: {0}")]
    Preference(#[from] PreferenceError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for intake operations.
pub type TableResult<T> = Result<T, TableError>;

// ============================================================================
// TESTS
// ============================================================================
