//! Column settings working set
//!
//! The settings UI edits an in-memory copy of the column list. Nothing
//! reaches the live table or the preference store until `commit`; reset
//! restores the schema-derived template without touching storage.

use intake_core::{ColumnDefinition, MoveDirection, PreferenceKey};
use intake_storage::{PreferenceResult, PreferenceStore};

/// Mutable working copy of one table's column configuration.
#[derive(Debug, Clone)]
pub struct ColumnSettingsController {
    working: Vec<ColumnDefinition>,
    /// Fresh schema derivation, kept as the reset template.
    defaults: Vec<ColumnDefinition>,
    /// Whether the form declared per-field visibility defaults; without
    /// them there is nothing meaningful to reset to.
    has_schema_defaults: bool,
}

impl ColumnSettingsController {
    /// Seed the working set. `initial` is the currently applied column list
    /// (store merge or fresh derivation); `defaults` is a fresh derivation.
    pub fn new(
        initial: Vec<ColumnDefinition>,
        defaults: Vec<ColumnDefinition>,
        has_schema_defaults: bool,
    ) -> Self {
        Self {
            working: initial,
            defaults,
            has_schema_defaults,
        }
    }

    /// The current working set.
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.working
    }

    /// Flip visibility of a non-frozen column. Unknown or frozen fields are
    /// a no-op.
    pub fn toggle_visibility(&mut self, field: &str) {
        if let Some(column) = self
            .working
            .iter_mut()
            .find(|c| c.field == field && !c.frozen)
        {
            column.visible = !column.visible;
        }
    }

    /// Swap a column with its immediate non-frozen neighbor. No-op at either
    /// boundary of the orderable range; frozen columns never participate.
    pub fn move_column(&mut self, field: &str, direction: MoveDirection) {
        let orderable: Vec<usize> = self
            .working
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.frozen)
            .map(|(i, _)| i)
            .collect();
        let Some(at) = orderable
            .iter()
            .position(|&i| self.working[i].field == field)
        else {
            return;
        };
        let neighbor = match direction {
            MoveDirection::Up if at > 0 => at - 1,
            MoveDirection::Down if at + 1 < orderable.len() => at + 1,
            _ => return,
        };
        self.working.swap(orderable[at], orderable[neighbor]);
    }

    /// Show or hide every non-frozen column at once. Frozen columns are
    /// always visible and unaffected.
    pub fn set_all_visibility(&mut self, visible: bool) {
        for column in self.working.iter_mut().filter(|c| !c.frozen) {
            column.visible = visible;
        }
    }

    /// Whether reset-to-schema-default is meaningful for this form.
    pub fn can_reset(&self) -> bool {
        self.has_schema_defaults
    }

    /// Replace the working set with the schema-derived template. Deep copy:
    /// later edits cannot alias the template. Does not touch storage and is
    /// a no-op for catch-all forms.
    pub fn reset_to_defaults(&mut self) {
        if self.has_schema_defaults {
            self.working = self.defaults.clone();
        }
    }

    /// Persist the working set and hand back the list to apply to the live
    /// table. Frozen columns are stripped by the store on write.
    pub fn commit<S: PreferenceStore + ?Sized>(
        &self,
        store: &S,
        key: &PreferenceKey,
    ) -> PreferenceResult<Vec<ColumnDefinition>> {
        store.save(key, &self.working)?;
        Ok(self.working.clone())
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
