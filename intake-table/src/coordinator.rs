//! Submission table coordination
//!
//! One coordinator per table surface. It owns an explicit context per
//! (form, record-state) pair, reacts to form selection, language change,
//! data arrival, and bulk-action completion, and talks to the host through
//! a request outbox and a notification list. It performs no I/O itself:
//! fetches are requested, and their results handed back via
//! [`TableCoordinator::ingest_submissions`] tagged with the epoch they were
//! issued for, so a stale response can never overwrite newer data.

use crate::actions::BulkActionState;
use crate::filter::FilterEngine;
use crate::nav::{AddressSurface, DetailCursor, DetailNavigationController};
use crate::notifications::{Notification, NotificationAction, NotificationLevel};
use crate::resolver::ColumnResolver;
use crate::settings::ColumnSettingsController;
use crate::traits::{CachedUserNames, FormRegistry, UserNameResolver};
use intake_core::{
    flatten_value, user_reference_id, ActionError, Attachment, ColumnDefinition, DataError,
    ExportFormat, ExportSettings, FilterQuery, FormName, FormSchema, GrantedActions,
    PreferenceKey, Record, RecordId, RecordState, TableConfig, TableResult, Timestamp, UserId,
    FIELD_DATE_CREATED,
};
use intake_storage::{merged_columns, PreferenceStore};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

// ============================================================================
// HOST PAYLOADS AND REQUESTS
// ============================================================================

/// Raw submission payload as delivered by the host data source.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSubmission {
    pub id: RecordId,
    pub created: Timestamp,
    pub state: String,
    /// Field map; either inline JSON or a JSON-encoded string of it.
    pub data: Value,
    #[serde(default)]
    pub files: Vec<RawAttachment>,
    #[serde(default)]
    pub grants: Vec<String>,
}

/// Attached-file descriptor as delivered by the host.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAttachment {
    pub file_type: String,
    pub file_name: String,
}

/// Scope of an export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportScope {
    Selection(Vec<RecordId>),
    All,
}

/// Requests the engine emits for the host I/O layer to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    FetchSubmissions {
        form: FormName,
        state: RecordState,
        epoch: u64,
    },
    /// Enablement comes from the union of grants across the selection; the
    /// host must re-authorize each record server-side and report per-record
    /// outcomes back through `complete_deletes`.
    DeleteRecord { record_id: RecordId },
    OpenDetail { record_id: RecordId },
    Export {
        format: ExportFormat,
        scope: ExportScope,
        settings: Option<ExportSettings>,
    },
    Navigate { path: String },
}

// ============================================================================
// TABLE CONTEXT
// ============================================================================

/// State of one (form, record-state) table: rows, columns, filter,
/// selection, and pagination. Contexts are explicit objects handed to the
/// controllers; nothing is keyed through ambient globals.
#[derive(Debug, Clone)]
pub struct TableContext {
    pub form: FormName,
    pub state: RecordState,
    schema: Option<FormSchema>,
    columns: Vec<ColumnDefinition>,
    rows: Vec<Record>,
    /// Indices into `rows` for the filtered view, in row order.
    visible: Vec<usize>,
    filter: Option<FilterQuery>,
    selection: Vec<RecordId>,
    page: usize,
    page_size: usize,
    loading: bool,
}

impl TableContext {
    fn new(
        form: impl Into<FormName>,
        state: RecordState,
        schema: Option<FormSchema>,
        page_size: usize,
    ) -> Self {
        Self {
            form: form.into(),
            state,
            schema,
            columns: Vec::new(),
            rows: Vec::new(),
            visible: Vec::new(),
            filter: None,
            selection: Vec::new(),
            page: 0,
            page_size,
            loading: false,
        }
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn filter(&self) -> Option<&FilterQuery> {
        self.filter.as_ref()
    }

    pub fn selection(&self) -> &[RecordId] {
        &self.selection
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// All rows of the filtered view, across pages.
    pub fn visible_records(&self) -> Vec<&Record> {
        self.visible.iter().map(|&i| &self.rows[i]).collect()
    }

    /// The current page slice of the filtered view; what the user sees.
    pub fn page_records(&self) -> Vec<&Record> {
        self.visible
            .iter()
            .skip(self.page * self.page_size)
            .take(self.page_size)
            .map(|&i| &self.rows[i])
            .collect()
    }

    pub fn selected_records(&self) -> Vec<&Record> {
        self.rows
            .iter()
            .filter(|r| self.selection.contains(&r.record_id))
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Recompute the filtered view, prune the selection to it, and clamp the
    /// page. The underlying rows are never mutated by filtering.
    fn rebuild_view(&mut self) {
        self.visible = match self.filter.as_ref().and_then(FilterEngine::compile) {
            Some(engine) => engine.apply(&self.rows),
            None => (0..self.rows.len()).collect(),
        };
        let visible_ids: Vec<&str> = self
            .visible
            .iter()
            .map(|&i| self.rows[i].record_id.as_str())
            .collect();
        self.selection.retain(|id| visible_ids.contains(&id.as_str()));

        let last_page = if self.visible.is_empty() {
            0
        } else {
            (self.visible.len() - 1) / self.page_size
        };
        self.page = self.page.min(last_page);
    }

    fn remove_rows(&mut self, ids: &[RecordId]) {
        self.rows.retain(|r| !ids.contains(&r.record_id));
        self.selection.retain(|id| !ids.contains(id));
        self.rebuild_view();
    }
}

// ============================================================================
// COORDINATOR
// ============================================================================

/// Orchestrates the per-state table contexts of the active form.
pub struct TableCoordinator<S: PreferenceStore> {
    config: TableConfig,
    user: UserId,
    store: S,
    registry: Box<dyn FormRegistry>,
    names: CachedUserNames,
    address: Box<dyn AddressSurface>,
    active_form: Option<FormName>,
    active_state: Option<RecordState>,
    contexts: HashMap<RecordState, TableContext>,
    nav: DetailNavigationController,
    /// Fetch generation. Responses tagged with an older epoch are stale and
    /// discarded on arrival.
    epoch: u64,
    requests: Vec<HostRequest>,
    notifications: Vec<Notification>,
}

impl<S: PreferenceStore> TableCoordinator<S> {
    pub fn new(
        config: TableConfig,
        user: impl Into<UserId>,
        store: S,
        registry: Box<dyn FormRegistry>,
        resolver: Box<dyn UserNameResolver>,
        address: Box<dyn AddressSurface>,
    ) -> TableResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            user: user.into(),
            store,
            registry,
            names: CachedUserNames::new(resolver),
            address,
            active_form: None,
            active_state: None,
            contexts: HashMap::new(),
            nav: DetailNavigationController::new(),
            epoch: 0,
            requests: Vec::new(),
            notifications: Vec::new(),
        })
    }

    // ------------------------------------------------------------------
    // Form and language
    // ------------------------------------------------------------------

    /// Activate a form: build one context per allowed record-state and
    /// request a fetch for each. A form switch invalidates every in-flight
    /// fetch of the previous form via the epoch bump.
    pub fn select_form(&mut self, form: &str) {
        if self.registry.id_for(form).is_none() {
            self.notify(NotificationLevel::Error, format!("Unknown form: {}", form));
            return;
        }
        let states = self.registry.allowed_states(form);
        let schema = self
            .registry
            .raw_schema(form)
            .and_then(|raw| FormSchema::from_value(&raw));

        self.nav.close(self.address.as_mut());
        self.epoch += 1;
        self.active_form = Some(form.to_string());
        self.active_state = states.first().copied();
        self.contexts.clear();

        for state in states {
            let mut ctx =
                TableContext::new(form, state, schema.clone(), self.config.default_page_size);
            ctx.loading = true;
            self.contexts.insert(state, ctx);
            self.requests.push(HostRequest::FetchSubmissions {
                form: form.to_string(),
                state,
                epoch: self.epoch,
            });
        }
    }

    /// Switch the active record-state tab. No-op for states the form does
    /// not allow.
    pub fn set_record_state(&mut self, state: RecordState) {
        if self.contexts.contains_key(&state) {
            self.nav.close(self.address.as_mut());
            self.active_state = Some(state);
        }
    }

    /// Change the active language: column titles are localized, so every
    /// context re-derives its columns and re-applies stored preferences.
    pub fn set_language(&mut self, lang: &str) {
        if lang.trim().is_empty() || lang == self.config.language {
            return;
        }
        self.config.language = lang.to_string();
        for ctx in self.contexts.values_mut() {
            ctx.columns = derive_columns(&self.store, &self.user, &self.config.language, ctx);
        }
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    /// Localized display name of the active form, falling back to its
    /// machine name.
    pub fn form_title(&self) -> Option<String> {
        let form = self.active_form.as_deref()?;
        Some(
            self.registry
                .display_name(form, &self.config.language)
                .unwrap_or_else(|| form.to_string()),
        )
    }

    pub fn active_form(&self) -> Option<&str> {
        self.active_form.as_deref()
    }

    pub fn active_state(&self) -> Option<RecordState> {
        self.active_state
    }

    // ------------------------------------------------------------------
    // Data arrival
    // ------------------------------------------------------------------

    /// Hand a fetch result back to the engine. The response must carry the
    /// form, state, and epoch of the request that caused it; anything issued
    /// for a superseded selection is discarded.
    pub fn ingest_submissions(
        &mut self,
        form: &str,
        state: RecordState,
        epoch: u64,
        result: Result<Vec<RawSubmission>, DataError>,
    ) {
        if epoch != self.epoch || self.active_form.as_deref() != Some(form) {
            debug!(form, %state, epoch, "discarding stale submissions response");
            return;
        }
        let Some(ctx) = self.contexts.get_mut(&state) else {
            debug!(form, %state, "discarding response for unknown record state");
            return;
        };

        match result {
            Err(err) => {
                warn!(form, %state, error = %err, "submissions fetch failed");
                ctx.loading = false;
                self.notifications.push(
                    Notification::new(
                        NotificationLevel::Error,
                        "Something went wrong while loading submissions.",
                    )
                    .with_action(NotificationAction::Retry),
                );
            }
            Ok(raw) => {
                let schema = ctx.schema.clone();
                let records: Vec<Record> = raw
                    .into_iter()
                    .filter_map(|submission| {
                        normalize_submission(submission, state, schema.as_ref(), &mut self.names)
                    })
                    .collect();
                ctx.rows = records;
                ctx.loading = false;
                ctx.columns = derive_columns(&self.store, &self.user, &self.config.language, ctx);
                ctx.rebuild_view();
            }
        }
    }

    // ------------------------------------------------------------------
    // Filtering, paging, selection
    // ------------------------------------------------------------------

    /// Apply a search to the active context. An empty value clears the
    /// filter and restores the full view. The detail view closes because its
    /// positions are relative to the view being replaced.
    pub fn set_filter(&mut self, query: FilterQuery) {
        self.nav.close(self.address.as_mut());
        let Some(ctx) = self.active_context_mut() else {
            return;
        };
        ctx.filter = if query.is_empty() { None } else { Some(query) };
        ctx.rebuild_view();
    }

    pub fn clear_filter(&mut self) {
        self.nav.close(self.address.as_mut());
        if let Some(ctx) = self.active_context_mut() {
            ctx.filter = None;
            ctx.rebuild_view();
        }
    }

    /// Turn to a page of the filtered view, clamped to the last page.
    pub fn set_page(&mut self, page: usize) {
        self.nav.close(self.address.as_mut());
        if let Some(ctx) = self.active_context_mut() {
            ctx.page = page;
            ctx.rebuild_view();
        }
    }

    /// Toggle a record in or out of the selection. Only currently visible
    /// records are selectable.
    pub fn toggle_selection(&mut self, record_id: &str) {
        let Some(ctx) = self.active_context_mut() else {
            return;
        };
        let is_visible = ctx
            .visible
            .iter()
            .any(|&i| ctx.rows[i].record_id == record_id);
        if !is_visible {
            return;
        }
        if let Some(at) = ctx.selection.iter().position(|id| id == record_id) {
            ctx.selection.remove(at);
        } else {
            ctx.selection.push(record_id.to_string());
        }
    }

    pub fn clear_selection(&mut self) {
        if let Some(ctx) = self.active_context_mut() {
            ctx.selection.clear();
        }
    }

    // ------------------------------------------------------------------
    // Bulk actions
    // ------------------------------------------------------------------

    /// Enabled state of the bulk actions for the active context, derived
    /// from the current selection and the filtered view.
    pub fn bulk_actions(&self) -> BulkActionState {
        let Some(ctx) = self.active_context() else {
            return BulkActionState::default();
        };
        BulkActionState::evaluate(&ctx.selected_records(), &ctx.visible_records())
    }

    /// Request deletion of the selected records, one host request per
    /// record, in row order. No-op unless the aggregated grants allow it.
    pub fn request_delete_selected(&mut self) {
        if !self.bulk_actions().delete_selected {
            return;
        }
        let Some(ctx) = self.active_context() else {
            return;
        };
        let ids: Vec<RecordId> = ctx
            .selected_records()
            .iter()
            .map(|r| r.record_id.clone())
            .collect();
        self.requests
            .extend(ids.into_iter().map(|record_id| HostRequest::DeleteRecord { record_id }));
    }

    /// Request deletion of every record in the filtered view.
    pub fn request_delete_all(&mut self) {
        if !self.bulk_actions().delete_all {
            return;
        }
        let Some(ctx) = self.active_context() else {
            return;
        };
        let ids: Vec<RecordId> = ctx
            .visible_records()
            .iter()
            .map(|r| r.record_id.clone())
            .collect();
        self.requests
            .extend(ids.into_iter().map(|record_id| HostRequest::DeleteRecord { record_id }));
    }

    /// Fold per-record delete outcomes back into the view. Succeeded rows
    /// leave the table and the selection; failed rows stay selected for
    /// retry. One combined notification reports both counts.
    pub fn complete_deletes(&mut self, results: &[(RecordId, Result<(), ActionError>)]) {
        let succeeded: Vec<RecordId> = results
            .iter()
            .filter(|(_, outcome)| outcome.is_ok())
            .map(|(id, _)| id.clone())
            .collect();
        let failed = results.len() - succeeded.len();

        self.nav.close(self.address.as_mut());
        let Some(ctx) = self.active_context_mut() else {
            return;
        };
        ctx.remove_rows(&succeeded);

        let message = if failed == 0 {
            format!("{} submissions deleted", succeeded.len())
        } else {
            format!("{} submissions deleted, {} failed", succeeded.len(), failed)
        };
        let notification = if failed == 0 {
            Notification::new(NotificationLevel::Success, message)
        } else {
            Notification::new(NotificationLevel::Warning, message)
                .with_action(NotificationAction::Retry)
        };
        self.notifications.push(notification);
    }

    /// Navigate to the edit surface of the single selected record. No-op
    /// unless the Edit action is enabled for the selection.
    pub fn request_edit(&mut self) {
        if !self.bulk_actions().edit {
            return;
        }
        if let Some(path) = self.single_selection_path("edit") {
            self.requests.push(HostRequest::Navigate { path });
        }
    }

    /// Navigate to the permission-grant surface of the single selected
    /// record. Requires the `manage` grant on that record.
    pub fn request_edit_permissions(&mut self) {
        if !self.bulk_actions().edit_permissions {
            return;
        }
        if let Some(path) = self.single_selection_path("permissions") {
            self.requests.push(HostRequest::Navigate { path });
        }
    }

    fn single_selection_path(&self, surface: &str) -> Option<String> {
        let form = self.active_form.as_deref()?;
        let slug = self
            .registry
            .slug_for(form)
            .unwrap_or_else(|| form.to_string());
        let ctx = self.active_context()?;
        let record = ctx.selected_records().into_iter().next()?;
        Some(format!("forms/{}/{}/{}", slug, surface, record.record_id))
    }

    /// Request an export of the selection, or of the whole filtered view
    /// when nothing is selected. Schema export settings ride along.
    pub fn request_export(&mut self, format: ExportFormat) {
        let Some(ctx) = self.active_context() else {
            return;
        };
        let scope = if ctx.selection.is_empty() {
            ExportScope::All
        } else {
            ExportScope::Selection(
                ctx.selected_records()
                    .iter()
                    .map(|r| r.record_id.clone())
                    .collect(),
            )
        };
        let settings = ctx.schema.as_ref().and_then(|s| s.export.clone());
        self.requests.push(HostRequest::Export {
            format,
            scope,
            settings,
        });
    }

    // ------------------------------------------------------------------
    // Detail navigation
    // ------------------------------------------------------------------

    /// Open the detail view at a 1-based position within the current page
    /// of the filtered view.
    pub fn open_detail(&mut self, position: usize) {
        let Some(state) = self.active_state else {
            return;
        };
        let Some(ctx) = self.contexts.get(&state) else {
            return;
        };
        let view = ctx.page_records();
        if let Some(record) = self.nav.open(state, position, &view, self.address.as_mut()) {
            self.requests.push(HostRequest::OpenDetail {
                record_id: record.record_id.clone(),
            });
        }
    }

    pub fn detail_next(&mut self) {
        let Some(state) = self.active_state else {
            return;
        };
        let Some(ctx) = self.contexts.get(&state) else {
            return;
        };
        let view = ctx.page_records();
        if let Some(record) = self.nav.next(&view, self.address.as_mut()) {
            self.requests.push(HostRequest::OpenDetail {
                record_id: record.record_id.clone(),
            });
        }
    }

    pub fn detail_previous(&mut self) {
        let Some(state) = self.active_state else {
            return;
        };
        let Some(ctx) = self.contexts.get(&state) else {
            return;
        };
        let view = ctx.page_records();
        if let Some(record) = self.nav.previous(&view, self.address.as_mut()) {
            self.requests.push(HostRequest::OpenDetail {
                record_id: record.record_id.clone(),
            });
        }
    }

    pub fn close_detail(&mut self) {
        self.nav.close(self.address.as_mut());
    }

    pub fn detail_cursor(&self) -> Option<&DetailCursor> {
        self.nav.cursor()
    }

    pub fn has_detail_previous(&self) -> bool {
        self.nav.has_previous()
    }

    pub fn has_detail_next(&self) -> bool {
        self.nav.has_next()
    }

    // ------------------------------------------------------------------
    // Column settings
    // ------------------------------------------------------------------

    /// Begin editing column settings for the active context: a working copy
    /// seeded from the applied columns, with a fresh derivation as the reset
    /// template.
    pub fn settings(&self) -> Option<ColumnSettingsController> {
        let ctx = self.active_context()?;
        let resolver = ColumnResolver::new(self.config.language.clone());
        let defaults = resolver.resolve(ctx.schema.as_ref(), ctx.rows.first());
        let has_defaults = ctx
            .schema
            .as_ref()
            .is_some_and(FormSchema::has_declared_defaults);
        Some(ColumnSettingsController::new(
            ctx.columns.clone(),
            defaults,
            has_defaults,
        ))
    }

    /// Persist a committed settings working set and apply it to the live
    /// table. Until this is called the table keeps showing the previous
    /// configuration.
    pub fn apply_settings(&mut self, settings: &ColumnSettingsController) -> TableResult<()> {
        let Some(key) = self.active_key() else {
            return Ok(());
        };
        let applied = settings.commit(&self.store, &key)?;
        if let Some(ctx) = self.active_context_mut() {
            ctx.columns = applied;
        }
        Ok(())
    }

    /// Delete the persisted preference for the active context and return to
    /// schema-derived columns.
    pub fn reset_preferences(&mut self) -> TableResult<()> {
        let Some(key) = self.active_key() else {
            return Ok(());
        };
        self.store.clear(&key)?;
        let resolver = ColumnResolver::new(self.config.language.clone());
        if let Some(ctx) = self.contexts.get_mut(&key.state) {
            ctx.columns = resolver.resolve(ctx.schema.as_ref(), ctx.rows.first());
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Host plumbing
    // ------------------------------------------------------------------

    /// Take the pending host requests, in emission order.
    pub fn drain_requests(&mut self) -> Vec<HostRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }

    pub fn context(&self, state: RecordState) -> Option<&TableContext> {
        self.contexts.get(&state)
    }

    pub fn active_context(&self) -> Option<&TableContext> {
        self.active_state.and_then(|state| self.contexts.get(&state))
    }

    fn active_context_mut(&mut self) -> Option<&mut TableContext> {
        let state = self.active_state?;
        self.contexts.get_mut(&state)
    }

    fn active_key(&self) -> Option<PreferenceKey> {
        let form = self.active_form.clone()?;
        let state = self.active_state?;
        Some(PreferenceKey::new(form, state, self.user.clone()))
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

fn derive_columns<S: PreferenceStore>(
    store: &S,
    user: &str,
    lang: &str,
    ctx: &TableContext,
) -> Vec<ColumnDefinition> {
    let resolver = ColumnResolver::new(lang);
    let live = resolver.resolve(ctx.schema.as_ref(), ctx.rows.first());
    let key = PreferenceKey::new(ctx.form.clone(), ctx.state, user);
    merged_columns(store, &key, &live)
}

/// Normalize one raw submission into a display record: inject the synthetic
/// `dateCreated` field, flatten values, resolve user references, attach
/// files, and parse grant tokens. Submissions of a different record-state
/// than requested are dropped.
fn normalize_submission(
    raw: RawSubmission,
    expected_state: RecordState,
    schema: Option<&FormSchema>,
    names: &mut CachedUserNames,
) -> Option<Record> {
    let state: RecordState = raw.state.parse().ok()?;
    if state != expected_state {
        debug!(id = %raw.id, got = %state, expected = %expected_state, "dropping submission with mismatched state");
        return None;
    }

    let mut record = Record::new(raw.id, raw.created, state);
    record.grants = GrantedActions::from_tokens(&raw.grants);
    record.set_field(FIELD_DATE_CREATED, raw.created.to_rfc3339());

    let data = match raw.data {
        Value::String(encoded) => serde_json::from_str::<Value>(&encoded).unwrap_or(Value::Null),
        other => other,
    };
    if let Value::Object(fields) = data {
        for (name, value) in fields {
            let is_user_field = schema
                .map(|s| {
                    s.properties
                        .iter()
                        .any(|p| p.field == name && p.user_reference)
                })
                .unwrap_or(false);
            // Object-shaped user references resolve regardless of schema;
            // bare-string ids only when the schema marks the field.
            let display = if let Some(id) = user_reference_id(&value) {
                names.resolve(id)
            } else if is_user_field {
                match &value {
                    Value::String(id) => names.resolve(id),
                    other => flatten_value(other),
                }
            } else {
                flatten_value(&value)
            };
            record.set_field(name, display);
        }
    }

    record.attachments = raw
        .files
        .into_iter()
        .map(|f| Attachment {
            file_type: f.file_type,
            file_name: f.file_name,
        })
        .collect();

    Some(record)
}

// ============================================================================
// TESTS
// ============================================================================
