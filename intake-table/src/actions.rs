//! Permission-gated bulk action aggregation
//!
//! Enablement is decided on the union of grant flags across the relevant
//! record set, never per record: the flags are unioned first, membership is
//! tested once. Whether every targeted record individually permits the
//! action is the host's server-side invariant (see `HostRequest::DeleteRecord`).

use intake_core::{GrantedActions, Record};

/// Enabled state of each permission-gated bulk action for the current
/// selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkActionState {
    /// Delete the selected records (selection non-empty)
    pub delete_selected: bool,
    /// Delete everything visible (selection empty)
    pub delete_all: bool,
    /// Edit the single selected record
    pub edit: bool,
    /// Edit permissions of the single selected record
    pub edit_permissions: bool,
}

impl BulkActionState {
    /// Evaluate the rule table over the current selection, or over all
    /// visible records when nothing is selected.
    pub fn evaluate(selection: &[&Record], visible: &[&Record]) -> Self {
        let union = |records: &[&Record]| {
            records
                .iter()
                .fold(GrantedActions::empty(), |acc, r| acc | r.grants)
        };

        let selection_union = union(selection);
        let visible_union = union(visible);

        Self {
            delete_selected: !selection.is_empty() && selection_union.allows_delete(),
            delete_all: selection.is_empty() && !visible.is_empty() && visible_union.allows_delete(),
            edit: selection.len() == 1 && selection_union.allows_update(),
            edit_permissions: selection.len() == 1 && selection_union.allows_manage(),
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.delete_selected || self.delete_all || self.edit || self.edit_permissions
    }

    /// The bulk-action affordance is hidden entirely when nothing is enabled.
    pub fn hidden(&self) -> bool {
        !self.any_enabled()
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
