//! Intake Test Utilities
//!
//! Centralized test infrastructure for the intake workspace:
//! - Builders and fixtures for records and schemas
//! - Proptest generators for core types

// Re-export the in-memory store for convenience
pub use intake_storage::MemoryPreferenceStore;

// Re-export core types tests reach for constantly
pub use intake_core::{
    CellFormat, ColumnDefinition, ColumnPreference, FormSchema, GrantedActions, PreferenceKey,
    Record, RecordState,
};

use chrono::{TimeZone, Utc};
use intake_core::Timestamp;
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// FIXTURES
// ============================================================================

/// Deterministic timestamp for fixtures; tests that care about ordering add
/// offsets to it.
pub fn fixed_time() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Fluent builder for one submission record.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    pub fn new(id: impl Into<String>, state: RecordState) -> Self {
        Self {
            record: Record::new(id, fixed_time(), state),
        }
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.record.set_field(name, value);
        self
    }

    pub fn grants(mut self, grants: GrantedActions) -> Self {
        self.record.grants = grants;
        self
    }

    pub fn grant_tokens(mut self, tokens: &[&str]) -> Self {
        self.record.grants = GrantedActions::from_tokens(tokens);
        self
    }

    pub fn build(self) -> Record {
        self.record
    }
}

/// A schema document with localized titles, visibility defaults, a user
/// reference, and an attachment type.
pub fn sample_schema_value() -> Value {
    json!({
        "properties": {
            "name": {"name": {"en": "Name", "de": "Bezeichnung"}, "tableView": true},
            "email": {"name": {"en": "E-mail"}, "tableView": false},
            "owner": {"name": "Owner", "type": "user"}
        },
        "files": {"photo": {}},
        "submissionExport": {"downloadFolderName": "submissions", "subfolders": false}
    })
}

pub fn sample_schema() -> FormSchema {
    FormSchema::from_value(&sample_schema_value()).expect("sample schema parses")
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

/// Generate a random RecordState.
pub fn arb_record_state() -> impl Strategy<Value = RecordState> {
    prop_oneof![Just(RecordState::Draft), Just(RecordState::Submitted)]
}

/// Generate a random grant set from valid flag bits.
pub fn arb_grants() -> impl Strategy<Value = GrantedActions> {
    (0u8..16).prop_map(|bits| GrantedActions::from_bits(bits).expect("valid grant bits"))
}

/// Generate a plausible field name.
pub fn arb_field_name() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,11}"
}

/// Generate a record with the given id and random fields/grants.
pub fn arb_record(state: RecordState) -> impl Strategy<Value = Record> {
    (
        "[a-z0-9]{4,12}",
        prop::collection::btree_map(arb_field_name(), "[a-zA-Z0-9 ]{0,16}", 0..6),
        arb_grants(),
    )
        .prop_map(move |(id, fields, grants)| {
            let mut builder = RecordBuilder::new(id, state).grants(grants);
            for (name, value) in fields {
                builder = builder.field(&name, &value);
            }
            builder.build()
        })
}

// ============================================================================
// TESTS
// ============================================================================
