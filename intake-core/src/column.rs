//! Column model: live definitions and persisted structural preferences
//!
//! A `ColumnDefinition` is the live, per-build column carrying behavioral
//! metadata (`CellFormat`). What persists between sessions is only the
//! structural `ColumnPreference`; behavioral metadata is re-derived from the
//! schema on every table build and re-attached during the merge.

use crate::enums::{CellFormat, RecordState};
use crate::identity::{FieldName, FormName, UserId};
use serde::{Deserialize, Serialize};

/// One column of the submission table. Order is given by position in the
/// containing list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub field: FieldName,
    pub title: String,
    pub visible: bool,
    /// Structural columns (row index, identifier, actions) are pinned: no
    /// reordering, no visibility toggling, never persisted.
    pub frozen: bool,
    pub format: CellFormat,
}

impl ColumnDefinition {
    /// Create a regular, visible column.
    pub fn new(field: impl Into<FieldName>, title: impl Into<String>, format: CellFormat) -> Self {
        Self {
            field: field.into(),
            title: title.into(),
            visible: true,
            frozen: false,
            format,
        }
    }

    /// Create a frozen structural column.
    pub fn frozen(
        field: impl Into<FieldName>,
        title: impl Into<String>,
        format: CellFormat,
    ) -> Self {
        Self {
            field: field.into(),
            title: title.into(),
            visible: true,
            frozen: true,
            format,
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Structural column preference as persisted: field, title, visibility,
/// order-by-position. Nothing behavioral round-trips through storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPreference {
    pub field: FieldName,
    pub title: String,
    pub visible: bool,
}

impl From<&ColumnDefinition> for ColumnPreference {
    fn from(column: &ColumnDefinition) -> Self {
        Self {
            field: column.field.clone(),
            title: column.title.clone(),
            visible: column.visible,
        }
    }
}

/// Scope of one persisted preference set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreferenceKey {
    pub form: FormName,
    pub state: RecordState,
    pub user: UserId,
}

impl PreferenceKey {
    pub fn new(
        form: impl Into<FormName>,
        state: RecordState,
        user: impl Into<UserId>,
    ) -> Self {
        Self {
            form: form.into(),
            state,
            user: user.into(),
        }
    }

    /// Composite key for the host key/value persistence surface.
    pub fn storage_key(&self) -> String {
        format!("{}:{}:{}", self.form, self.state, self.user)
    }
}

// ============================================================================
// TESTS
// ============================================================================
