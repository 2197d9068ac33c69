//! Intake Storage - Preference Store Trait and In-Memory Implementation
//!
//! Defines the persistence abstraction for per-user column preferences.
//! Only structural data (field, title, visibility, order-by-position) ever
//! reaches storage; behavioral column metadata is derived fresh on every
//! table build and re-attached by [`apply_preferences`].

use intake_core::{ColumnDefinition, ColumnPreference, PreferenceError, PreferenceKey};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Result type for preference-store operations.
pub type PreferenceResult<T> = Result<T, PreferenceError>;

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Persistence surface for column preferences, scoped by
/// (form, record-state, user).
///
/// `load` reports a miss as `Ok(None)` and a corrupt payload as an error;
/// callers recover from both by falling back to schema-derived columns.
pub trait PreferenceStore: Send + Sync {
    /// Load the stored structural preferences, if any.
    fn load(&self, key: &PreferenceKey) -> PreferenceResult<Option<Vec<ColumnPreference>>>;

    /// Persist the structural projection of `columns`. Frozen columns are
    /// stripped before writing.
    fn save(&self, key: &PreferenceKey, columns: &[ColumnDefinition]) -> PreferenceResult<()>;

    /// Delete the stored preferences for this scope.
    fn clear(&self, key: &PreferenceKey) -> PreferenceResult<()>;
}

/// Project the persistable subset of a live column list.
fn structural(columns: &[ColumnDefinition]) -> Vec<ColumnPreference> {
    columns
        .iter()
        .filter(|c| !c.frozen)
        .map(ColumnPreference::from)
        .collect()
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// In-memory preference store.
///
/// Payloads are held as raw JSON strings, matching what a host key/value
/// surface would hand back, so corrupt-payload recovery is exercised by the
/// same code path as production loads.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored preference sets.
    pub fn entry_count(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Insert a raw payload, bypassing serialization. Test hook for
    /// corrupt-data recovery paths.
    pub fn insert_raw(&self, key: &PreferenceKey, payload: impl Into<String>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.storage_key(), payload.into());
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, key: &PreferenceKey) -> PreferenceResult<Option<Vec<ColumnPreference>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| PreferenceError::StorePoisoned)?;
        let Some(payload) = entries.get(&key.storage_key()) else {
            return Ok(None);
        };
        match serde_json::from_str::<Vec<ColumnPreference>>(payload) {
            Ok(stored) => Ok(Some(stored)),
            Err(err) => {
                warn!(key = %key.storage_key(), error = %err, "discarding malformed column preference payload");
                Err(PreferenceError::MalformedPayload {
                    key: key.storage_key(),
                    reason: err.to_string(),
                })
            }
        }
    }

    fn save(&self, key: &PreferenceKey, columns: &[ColumnDefinition]) -> PreferenceResult<()> {
        let stored = structural(columns);
        let payload = serde_json::to_string(&stored).map_err(|err| {
            PreferenceError::MalformedPayload {
                key: key.storage_key(),
                reason: err.to_string(),
            }
        })?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| PreferenceError::StorePoisoned)?;
        entries.insert(key.storage_key(), payload);
        Ok(())
    }

    fn clear(&self, key: &PreferenceKey) -> PreferenceResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| PreferenceError::StorePoisoned)?;
        entries.remove(&key.storage_key());
        Ok(())
    }
}

// ============================================================================
// STRUCTURAL MERGE
// ============================================================================

/// Re-attach live column metadata to a stored structural preference.
///
/// Stored entries contribute order and visibility; the live derivation
/// contributes titles (freshly localized), formats, and the frozen columns in
/// their fixed positions. Live fields unknown to the stored set (added to the
/// form after the save) are appended in derivation order. Returns `None` when
/// no stored field matches any live column, in which case the caller keeps
/// the derived defaults.
pub fn apply_preferences(
    live: &[ColumnDefinition],
    stored: &[ColumnPreference],
) -> Option<Vec<ColumnDefinition>> {
    let lead: Vec<ColumnDefinition> = live.iter().take_while(|c| c.frozen).cloned().collect();
    let trail: Vec<ColumnDefinition> = live
        .iter()
        .skip(lead.len())
        .filter(|c| c.frozen)
        .cloned()
        .collect();
    let data: Vec<&ColumnDefinition> = live.iter().filter(|c| !c.frozen).collect();

    let mut ordered: Vec<ColumnDefinition> = Vec::with_capacity(data.len());
    for preference in stored {
        if let Some(column) = data.iter().find(|c| c.field == preference.field) {
            let mut merged = (*column).clone();
            merged.visible = preference.visible;
            ordered.push(merged);
        }
    }
    if ordered.is_empty() {
        return None;
    }

    for column in &data {
        if !ordered.iter().any(|c| c.field == column.field) {
            ordered.push((*column).clone());
        }
    }

    let mut result = lead;
    result.extend(ordered);
    result.extend(trail);
    Some(result)
}

/// Load-and-merge convenience: stored preferences applied over the live
/// derivation, falling back to the derivation on miss, corruption, or a
/// preference that matches nothing.
pub fn merged_columns(
    store: &dyn PreferenceStore,
    key: &PreferenceKey,
    live: &[ColumnDefinition],
) -> Vec<ColumnDefinition> {
    match store.load(key) {
        Ok(Some(stored)) => match apply_preferences(live, &stored) {
            Some(merged) => merged,
            None => {
                warn!(key = %key.storage_key(), "stored preference matches no live column, using derived defaults");
                live.to_vec()
            }
        },
        Ok(None) => live.to_vec(),
        // Corrupt payload: already logged by the store, recover with defaults.
        Err(_) => live.to_vec(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::{CellFormat, RecordState};

    fn live_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::frozen("__row", "#", CellFormat::RowIndex),
            ColumnDefinition::new("dateCreated", "Created", CellFormat::Timestamp),
            ColumnDefinition::new("name", "Name", CellFormat::Text),
            ColumnDefinition::new("email", "E-mail", CellFormat::Text),
            ColumnDefinition::frozen("identifier", "ID", CellFormat::Text),
            ColumnDefinition::frozen("__actions", "", CellFormat::Actions),
        ]
    }

    fn key() -> PreferenceKey {
        PreferenceKey::new("contact", RecordState::Submitted, "user-1")
    }

    #[test]
    fn test_load_miss_is_none() {
        let store = MemoryPreferenceStore::new();
        assert_eq!(store.load(&key()).unwrap(), None);
    }

    #[test]
    fn test_save_then_load_roundtrips_structural_data() {
        let store = MemoryPreferenceStore::new();
        store.save(&key(), &live_columns()).unwrap();

        let stored = store.load(&key()).unwrap().unwrap();
        let fields: Vec<&str> = stored.iter().map(|p| p.field.as_str()).collect();
        assert_eq!(fields, vec!["dateCreated", "name", "email"]);
    }

    #[test]
    fn test_save_strips_frozen_columns() {
        let store = MemoryPreferenceStore::new();
        store.save(&key(), &live_columns()).unwrap();

        let stored = store.load(&key()).unwrap().unwrap();
        assert!(stored.iter().all(|p| p.field != "__row"));
        assert!(stored.iter().all(|p| p.field != "identifier"));
        assert!(stored.iter().all(|p| p.field != "__actions"));
    }

    #[test]
    fn test_clear_removes_entry() {
        let store = MemoryPreferenceStore::new();
        store.save(&key(), &live_columns()).unwrap();
        assert_eq!(store.entry_count(), 1);

        store.clear(&key()).unwrap();
        assert_eq!(store.entry_count(), 0);
        assert_eq!(store.load(&key()).unwrap(), None);
    }

    #[test]
    fn test_clear_missing_entry_is_noop() {
        let store = MemoryPreferenceStore::new();
        assert!(store.clear(&key()).is_ok());
    }

    #[test]
    fn test_load_malformed_payload_is_error() {
        let store = MemoryPreferenceStore::new();
        store.insert_raw(&key(), "{definitely not an array");

        let result = store.load(&key());
        assert!(matches!(
            result,
            Err(PreferenceError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_scopes_do_not_collide() {
        let store = MemoryPreferenceStore::new();
        let draft_key = PreferenceKey::new("contact", RecordState::Draft, "user-1");
        store.save(&key(), &live_columns()).unwrap();

        assert_eq!(store.load(&draft_key).unwrap(), None);
    }

    #[test]
    fn test_apply_preferences_reorders_and_hides() {
        let stored = vec![
            ColumnPreference {
                field: "email".to_string(),
                title: "E-mail".to_string(),
                visible: false,
            },
            ColumnPreference {
                field: "name".to_string(),
                title: "Name".to_string(),
                visible: true,
            },
        ];

        let merged = apply_preferences(&live_columns(), &stored).unwrap();
        let fields: Vec<&str> = merged.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["__row", "email", "name", "dateCreated", "identifier", "__actions"]
        );
        assert!(!merged[1].visible);
        assert!(merged[2].visible);
        // Unmentioned live field keeps its derived visibility
        assert!(merged[3].visible);
    }

    #[test]
    fn test_apply_preferences_sources_title_and_format_live() {
        let stored = vec![ColumnPreference {
            field: "name".to_string(),
            title: "Stale Title".to_string(),
            visible: true,
        }];

        let merged = apply_preferences(&live_columns(), &stored).unwrap();
        let name = merged.iter().find(|c| c.field == "name").unwrap();
        // The freshly localized title wins over the persisted one
        assert_eq!(name.title, "Name");
        assert_eq!(name.format, CellFormat::Text);
    }

    #[test]
    fn test_apply_preferences_no_match_is_none() {
        let stored = vec![ColumnPreference {
            field: "removed_field".to_string(),
            title: "Gone".to_string(),
            visible: true,
        }];
        assert!(apply_preferences(&live_columns(), &stored).is_none());
    }

    #[test]
    fn test_apply_preferences_keeps_frozen_positions() {
        let stored = vec![ColumnPreference {
            field: "email".to_string(),
            title: "E-mail".to_string(),
            visible: true,
        }];

        let merged = apply_preferences(&live_columns(), &stored).unwrap();
        assert!(merged.first().unwrap().frozen);
        assert!(merged.last().unwrap().frozen);
        assert_eq!(merged.iter().filter(|c| c.frozen).count(), 3);
    }

    #[test]
    fn test_merged_columns_recovers_from_corrupt_payload() {
        let store = MemoryPreferenceStore::new();
        store.insert_raw(&key(), "[[[");

        let live = live_columns();
        let merged = merged_columns(&store, &key(), &live);
        assert_eq!(merged, live);
    }

    #[test]
    fn test_merged_columns_uses_stored_order() {
        let store = MemoryPreferenceStore::new();
        let mut reordered = live_columns();
        reordered.swap(2, 3); // name <-> email
        store.save(&key(), &reordered).unwrap();

        let merged = merged_columns(&store, &key(), &live_columns());
        let fields: Vec<&str> = merged.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["__row", "dateCreated", "email", "name", "identifier", "__actions"]
        );
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
