use intake_core::{
    FilterOperator, FilterQuery, FilterTarget, MoveDirection, RecordState, TableConfig,
};
use intake_storage::MemoryPreferenceStore;
use intake_table::{
    BulkActionState, ColumnResolver, ColumnSettingsController, FilterEngine, HostRequest,
    MapUserNames, MemoryAddress, MemoryFormRegistry, RawSubmission, RegisteredForm,
    TableCoordinator,
};
use intake_test_utils::{sample_schema, sample_schema_value, RecordBuilder};
use proptest::prelude::*;
use serde_json::json;

fn record(id: &str, state: RecordState, name: &str, grants: &[&str]) -> intake_core::Record {
    RecordBuilder::new(id, state)
        .field("name", name)
        .grant_tokens(grants)
        .build()
}

fn raw(id: &str, state: &str, name: &str, grants: &[&str]) -> RawSubmission {
    RawSubmission {
        id: id.to_string(),
        created: intake_test_utils::fixed_time(),
        state: state.to_string(),
        data: json!({ "name": name }),
        files: Vec::new(),
        grants: grants.iter().map(|g| g.to_string()).collect(),
    }
}

fn coordinator() -> TableCoordinator<MemoryPreferenceStore> {
    let mut registry = MemoryFormRegistry::new();
    registry.register(
        "contact",
        RegisteredForm {
            id: "form-1".to_string(),
            slug: "contact".to_string(),
            states: vec![RecordState::Draft, RecordState::Submitted],
            schema: Some(sample_schema_value()),
            ..RegisteredForm::default()
        },
    );
    TableCoordinator::new(
        TableConfig::default(),
        "viewer-1",
        MemoryPreferenceStore::new(),
        Box::new(registry),
        Box::new(MapUserNames::new()),
        Box::new(MemoryAddress::new("forms/contact")),
    )
    .expect("valid config")
}

// ============================================================================
// COLUMN DERIVATION
// ============================================================================

#[test]
fn schema_mode_column_count_matches_declaration() {
    let schema = sample_schema();
    let sample = RecordBuilder::new("rec-1", RecordState::Submitted)
        .field("dateCreated", "2024-06-01T12:00:00Z")
        .build();
    let columns = ColumnResolver::new("en").resolve(Some(&schema), Some(&sample));

    let frozen = columns.iter().filter(|c| c.frozen).count();
    let data = columns.len() - frozen;
    // dateCreated + |properties| + |files|
    assert_eq!(data, 1 + schema.properties.len() + schema.files.len());

    let declared: Vec<&str> = schema.properties.iter().map(|p| p.field.as_str()).collect();
    let derived: Vec<&str> = columns
        .iter()
        .filter(|c| !c.frozen && c.field != "dateCreated" && !schema.files.contains(&c.field))
        .map(|c| c.field.as_str())
        .collect();
    assert_eq!(derived, declared);
}

proptest! {
    /// Catch-all: every observed non-internal field becomes exactly one
    /// visible column, in first-seen order, and derivation is idempotent.
    #[test]
    fn catch_all_covers_observed_fields(
        fields in prop::collection::vec("[a-z]{1,8}", 1..8),
    ) {
        let mut builder = RecordBuilder::new("rec-1", RecordState::Draft);
        for field in &fields {
            builder = builder.field(field, "v");
        }
        let sample = builder.build();
        let resolver = ColumnResolver::new("en");

        let first = resolver.resolve(None, Some(&sample));
        let second = resolver.resolve(None, Some(&sample));
        prop_assert_eq!(&first, &second);

        let expected: Vec<&str> = sample.field_names().collect();
        let derived: Vec<&str> = first
            .iter()
            .filter(|c| !c.frozen)
            .map(|c| c.field.as_str())
            .collect();
        prop_assert_eq!(derived, expected);
        prop_assert!(first.iter().all(|c| c.visible));
    }
}

// ============================================================================
// SETTINGS WORKING SET
// ============================================================================

#[test]
fn reset_equals_fresh_derivation_without_aliasing() {
    let schema = sample_schema();
    let resolver = ColumnResolver::new("en");
    let fresh = resolver.resolve(Some(&schema), None);

    let mut settings =
        ColumnSettingsController::new(fresh.clone(), fresh.clone(), schema.has_declared_defaults());
    settings.toggle_visibility("name");
    settings.move_column("owner", MoveDirection::Up);
    settings.set_all_visibility(false);
    settings.reset_to_defaults();

    assert_eq!(settings.columns(), fresh.as_slice());

    // Mutating the reset result must not bleed into a later derivation
    settings.toggle_visibility("name");
    let again = resolver.resolve(Some(&schema), None);
    assert_eq!(again, fresh);
}

// ============================================================================
// FILTERING
// ============================================================================

#[test]
fn keywords_matches_all_tokens_any_order() {
    let engine = FilterEngine::compile(&FilterQuery::new(
        FilterTarget::Field("name".to_string()),
        FilterOperator::Keywords,
        "alpha beta",
    ))
    .expect("non-empty query");

    let hit = record("r1", RecordState::Draft, "beta alpha gamma", &[]);
    let miss = record("r2", RecordState::Draft, "alpha only", &[]);
    assert!(engine.matches(&hit));
    assert!(!engine.matches(&miss));
}

#[test]
fn all_fields_like_is_or_across_fields() {
    let engine = FilterEngine::compile(&FilterQuery::like_all("x")).expect("non-empty query");
    let hit = RecordBuilder::new("r1", RecordState::Draft)
        .field("a", "plain")
        .field("b", "boxed")
        .build();
    let miss = RecordBuilder::new("r2", RecordState::Draft)
        .field("a", "plain")
        .field("b", "nope")
        .build();
    assert!(engine.matches(&hit));
    assert!(!engine.matches(&miss));
}

// ============================================================================
// PERMISSION AGGREGATION
// ============================================================================

#[test]
fn union_enables_delete_for_mixed_selection() {
    let a = record("a", RecordState::Submitted, "a", &["delete"]);
    let b = record("b", RecordState::Submitted, "b", &["view"]);
    let selection = vec![&a, &b];
    let state = BulkActionState::evaluate(&selection, &selection);

    assert!(state.delete_selected);
    assert!(!state.edit);
    assert!(!state.edit_permissions);
}

#[test]
fn empty_table_reports_unavailable() {
    let state = BulkActionState::evaluate(&[], &[]);
    assert!(!state.delete_selected);
    assert!(!state.delete_all);
    assert!(!state.edit);
    assert!(!state.edit_permissions);
    assert!(state.hidden());
}

// ============================================================================
// DETAIL NAVIGATION
// ============================================================================

#[test]
fn cursor_clamps_at_both_edges() {
    let mut coordinator = coordinator();
    coordinator.select_form("contact");
    coordinator.ingest_submissions(
        "contact",
        RecordState::Submitted,
        1,
        Ok(vec![
            raw("rec-1", "submitted", "a", &["view"]),
            raw("rec-2", "submitted", "b", &["view"]),
        ]),
    );
    coordinator.set_record_state(RecordState::Submitted);

    coordinator.open_detail(1);
    assert!(!coordinator.has_detail_previous());
    coordinator.detail_previous();
    assert_eq!(coordinator.detail_cursor().unwrap().position, 1);

    coordinator.open_detail(2);
    assert!(!coordinator.has_detail_next());
    coordinator.detail_next();
    assert_eq!(coordinator.detail_cursor().unwrap().position, 2);
}

// ============================================================================
// END TO END
// ============================================================================

#[test]
fn end_to_end_bulk_delete_flow() {
    let mut coordinator = coordinator();
    coordinator.select_form("contact");

    // One draft with view only, two submitted with manage
    coordinator.ingest_submissions(
        "contact",
        RecordState::Draft,
        1,
        Ok(vec![raw("d-1", "draft", "draft row", &["view"])]),
    );
    coordinator.ingest_submissions(
        "contact",
        RecordState::Submitted,
        1,
        Ok(vec![
            raw("s-1", "submitted", "first", &["manage"]),
            raw("s-2", "submitted", "second", &["manage"]),
        ]),
    );

    coordinator.set_record_state(RecordState::Submitted);
    coordinator.toggle_selection("s-1");
    coordinator.toggle_selection("s-2");

    let actions = coordinator.bulk_actions();
    assert!(actions.delete_selected);
    // Two records selected: single-record actions stay disabled
    assert!(!actions.edit_permissions);
    assert!(!actions.edit);

    coordinator.request_delete_selected();
    let deletes: Vec<String> = coordinator
        .drain_requests()
        .into_iter()
        .filter_map(|r| match r {
            HostRequest::DeleteRecord { record_id } => Some(record_id),
            _ => None,
        })
        .collect();
    assert_eq!(deletes, vec!["s-1".to_string(), "s-2".to_string()]);

    coordinator.complete_deletes(&[("s-1".to_string(), Ok(())), ("s-2".to_string(), Ok(()))]);

    let submitted = coordinator.context(RecordState::Submitted).unwrap();
    assert_eq!(submitted.row_count(), 0);
    assert_eq!(submitted.visible_count(), 0);
    assert!(submitted.selection().is_empty());

    // The draft tab is untouched
    let draft = coordinator.context(RecordState::Draft).unwrap();
    assert_eq!(draft.row_count(), 1);

    // With nothing left visible, every bulk action is unavailable
    assert!(coordinator.bulk_actions().hidden());
}

proptest! {
    /// Selection toggling is involutive under the coordinator: toggling the
    /// same visible record twice restores the selection.
    #[test]
    fn selection_toggle_is_involutive(pick in 0usize..3) {
        let mut coordinator = coordinator();
        coordinator.select_form("contact");
        coordinator.ingest_submissions(
            "contact",
            RecordState::Submitted,
            1,
            Ok(vec![
                raw("rec-0", "submitted", "a", &["view"]),
                raw("rec-1", "submitted", "b", &["view"]),
                raw("rec-2", "submitted", "c", &["view"]),
            ]),
        );
        coordinator.set_record_state(RecordState::Submitted);

        let id = format!("rec-{}", pick);
        coordinator.toggle_selection(&id);
        coordinator.toggle_selection(&id);
        prop_assert!(coordinator.active_context().unwrap().selection().is_empty());
    }
}
