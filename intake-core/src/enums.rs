//! Enum types for intake entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Lifecycle tag of a submission. Each state has its own table, column set,
/// and persisted preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    Draft,
    Submitted,
}

/// Behavioral column metadata. Derived fresh from the schema on every table
/// build and merged with persisted structural preferences, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellFormat {
    /// Plain text value
    Text,
    /// Creation timestamp, rendered in the viewer's locale
    Timestamp,
    /// User reference, resolved to a display name
    UserName,
    /// Attached files of one attachment type
    AttachmentList,
    /// Structural row-index column
    RowIndex,
    /// Structural action-buttons column
    Actions,
}

impl CellFormat {
    /// Whether this format belongs to a structural (frozen) column.
    pub fn is_structural(&self) -> bool {
        matches!(self, CellFormat::RowIndex | CellFormat::Actions)
    }
}

/// Direction for a single-step column move in the settings working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Up,
    Down,
}

/// File formats a row selection can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Json,
}

// ============================================================================
// STRING CONVERSIONS
// ============================================================================

fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RecordState::Draft => "draft",
            RecordState::Submitted => "submitted",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for RecordState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "draft" => Ok(RecordState::Draft),
            "submitted" | "submission" => Ok(RecordState::Submitted),
            _ => Err(format!("Invalid RecordState: {}", s)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Invalid ExportFormat: {}", s)),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
