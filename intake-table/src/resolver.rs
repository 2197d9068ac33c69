//! Column derivation from form schemas and observed records
//!
//! A form with declared properties gets its columns in declaration order with
//! declared visibility defaults. A form without a usable schema runs in
//! catch-all mode: every observed record field becomes a visible column in
//! first-seen order. The two modes never mix for one form.

use intake_core::{
    CellFormat, ColumnDefinition, FormSchema, LangCode, Record, FIELD_DATE_CREATED,
};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Field name of the frozen row-index column.
pub const FIELD_ROW_INDEX: &str = "__row";
/// Field name of the frozen identifier column.
pub const FIELD_IDENTIFIER: &str = "identifier";
/// Legacy alias of the identifier field still seen in old payloads.
pub const FIELD_SUBMISSION_ID: &str = "submissionId";
/// Field name of the frozen action-buttons column.
pub const FIELD_ACTIONS: &str = "__actions";

static INTERNAL_FIELDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        FIELD_ROW_INDEX,
        FIELD_IDENTIFIER,
        FIELD_SUBMISSION_ID,
        FIELD_ACTIONS,
    ]
    .into_iter()
    .collect()
});

/// Whether a field is internal bookkeeping, excluded from data-column
/// derivation and from all-fields search.
pub fn is_internal_field(field: &str) -> bool {
    INTERNAL_FIELDS.contains(field)
}

/// Derives the ordered column list for one (form, record-state) table.
#[derive(Debug, Clone)]
pub struct ColumnResolver {
    lang: LangCode,
}

impl ColumnResolver {
    pub fn new(lang: impl Into<LangCode>) -> Self {
        Self { lang: lang.into() }
    }

    /// Derive columns from the schema, or from the sample record in
    /// catch-all mode. Repeated calls with the same inputs yield the same
    /// list.
    pub fn resolve(
        &self,
        schema: Option<&FormSchema>,
        sample: Option<&Record>,
    ) -> Vec<ColumnDefinition> {
        let mut columns = vec![ColumnDefinition::frozen(
            FIELD_ROW_INDEX,
            "#",
            CellFormat::RowIndex,
        )];
        let mut placed: HashSet<String> = HashSet::new();

        let raw_fields: Vec<&str> = sample.map(|r| r.field_names().collect()).unwrap_or_default();

        // dateCreated leads the data columns whenever the records carry it.
        if raw_fields.contains(&FIELD_DATE_CREATED) {
            let title = self.title_of(schema, FIELD_DATE_CREATED);
            columns.push(ColumnDefinition::new(
                FIELD_DATE_CREATED,
                title,
                CellFormat::Timestamp,
            ));
            placed.insert(FIELD_DATE_CREATED.to_string());
        }

        let catch_all = schema.map_or(true, |s| s.properties.is_empty());
        if catch_all {
            for field in raw_fields {
                if is_internal_field(field) || placed.contains(field) {
                    continue;
                }
                columns.push(ColumnDefinition::new(field, field, CellFormat::Text));
                placed.insert(field.to_string());
            }
        } else if let Some(schema) = schema {
            for property in &schema.properties {
                if is_internal_field(&property.field) || placed.contains(&property.field) {
                    continue;
                }
                let format = if property.user_reference {
                    CellFormat::UserName
                } else {
                    CellFormat::Text
                };
                columns.push(
                    ColumnDefinition::new(
                        property.field.clone(),
                        property.title(&self.lang),
                        format,
                    )
                    .with_visible(property.table_visible.unwrap_or(true)),
                );
                placed.insert(property.field.clone());
            }
        }

        if let Some(schema) = schema {
            for file_type in &schema.files {
                if placed.contains(file_type) {
                    continue;
                }
                columns.push(ColumnDefinition::new(
                    file_type.clone(),
                    file_type.clone(),
                    CellFormat::AttachmentList,
                ));
                placed.insert(file_type.clone());
            }
        }

        columns.push(ColumnDefinition::frozen(
            FIELD_IDENTIFIER,
            "ID",
            CellFormat::Text,
        ));
        columns.push(ColumnDefinition::frozen(FIELD_ACTIONS, "", CellFormat::Actions));
        columns
    }

    fn title_of(&self, schema: Option<&FormSchema>, field: &str) -> String {
        schema
            .and_then(|s| s.title_for(field, &self.lang))
            .unwrap_or(field)
            .to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================
