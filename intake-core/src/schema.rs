//! Form schema model and lenient parsing
//!
//! A form's schema document drives column derivation: declared properties in
//! declared order, attachment types, and export settings. Parsing never fails
//! loudly; anything malformed yields `None` and the caller derives columns in
//! catch-all mode from the records themselves.

use crate::identity::{FieldName, LangCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One declared form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    pub field: FieldName,
    /// Localized titles keyed by language code. May be empty; the field name
    /// is the fallback title.
    pub titles: HashMap<LangCode, String>,
    /// Declared default visibility in the table view. `None` means the form
    /// author expressed no preference (treated as visible).
    pub table_visible: Option<bool>,
    /// Whether values of this field are user references to resolve through
    /// the host user-name resolver.
    pub user_reference: bool,
}

/// Export settings declared by the form schema, forwarded verbatim with
/// export requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub download_folder: Option<String>,
    pub subfolders: bool,
}

/// Parsed form schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    /// Declared properties in declaration order.
    pub properties: Vec<SchemaProperty>,
    /// Declared attachment types in declaration order.
    pub files: Vec<String>,
    pub export: Option<ExportSettings>,
}

impl FormSchema {
    /// Parse a raw schema document. Malformed JSON or a non-object document
    /// yields `None`; column derivation then runs in catch-all mode.
    pub fn parse(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        Self::from_value(&value)
    }

    /// Parse an already-decoded schema document.
    pub fn from_value(value: &Value) -> Option<Self> {
        let document = value.as_object()?;

        let mut properties = Vec::new();
        if let Some(declared) = document.get("properties").and_then(Value::as_object) {
            for (field, definition) in declared {
                properties.push(parse_property(field, definition));
            }
        }

        let mut files = Vec::new();
        match document.get("files") {
            Some(Value::Object(declared)) => files.extend(declared.keys().cloned()),
            Some(Value::Array(declared)) => {
                files.extend(declared.iter().filter_map(Value::as_str).map(str::to_string));
            }
            _ => {}
        }

        let export = document
            .get("submissionExport")
            .and_then(Value::as_object)
            .map(|spec| ExportSettings {
                download_folder: spec
                    .get("downloadFolderName")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                subfolders: spec
                    .get("subfolders")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            });

        Some(Self {
            properties,
            files,
            export,
        })
    }

    /// Whether the form declares any per-field visibility defaults. When it
    /// does not, the settings UI has no schema default to reset to.
    pub fn has_declared_defaults(&self) -> bool {
        self.properties.iter().any(|p| p.table_visible.is_some())
    }

    /// Localized title for a declared field, if any.
    pub fn title_for(&self, field: &str, lang: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.field == field)
            .and_then(|p| p.titles.get(lang))
            .map(String::as_str)
    }
}

fn parse_property(field: &str, definition: &Value) -> SchemaProperty {
    let mut titles = HashMap::new();
    let mut table_visible = None;
    let mut user_reference = false;

    if let Some(definition) = definition.as_object() {
        match definition.get("name") {
            // Unlocalized form: a single string applied to every language
            Some(Value::String(title)) => {
                titles.insert("*".to_string(), title.clone());
            }
            Some(Value::Object(by_lang)) => {
                for (lang, title) in by_lang {
                    if let Some(title) = title.as_str() {
                        titles.insert(lang.clone(), title.to_string());
                    }
                }
            }
            _ => {}
        }
        table_visible = definition.get("tableView").and_then(Value::as_bool);
        user_reference = definition
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t == "user")
            || definition
                .get("userReference")
                .and_then(Value::as_bool)
                .unwrap_or(false);
    }

    SchemaProperty {
        field: field.to_string(),
        titles,
        table_visible,
        user_reference,
    }
}

impl SchemaProperty {
    /// Title for the given language: exact match, then the unlocalized
    /// fallback, then the field name itself.
    pub fn title(&self, lang: &str) -> &str {
        self.titles
            .get(lang)
            .or_else(|| self.titles.get("*"))
            .map(String::as_str)
            .unwrap_or(&self.field)
    }
}

// ============================================================================
// TESTS
// ============================================================================
