//! Submission records and field-value normalization

use crate::enums::RecordState;
use crate::grants::GrantedActions;
use crate::identity::{FieldName, RecordId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Synthetic field carrying the record's creation timestamp. Injected as the
/// first field during ingestion so it participates in column derivation.
pub const FIELD_DATE_CREATED: &str = "dateCreated";

/// One field of a submission, holding the already-normalized display value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: FieldName,
    pub value: String,
}

impl RecordField {
    pub fn new(name: impl Into<FieldName>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Descriptor of a file attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment type declared by the form schema (e.g. "photo")
    pub file_type: String,
    /// Host-provided file name
    pub file_name: String,
}

/// One submission row, normalized for table display.
///
/// Field order is ingestion order; catch-all column derivation depends on it.
/// Lookup is a linear scan, which is fine at table-row field counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub record_id: RecordId,
    pub created_at: Timestamp,
    pub state: RecordState,
    pub fields: Vec<RecordField>,
    pub attachments: Vec<Attachment>,
    pub grants: GrantedActions,
}

impl Record {
    pub fn new(record_id: impl Into<RecordId>, created_at: Timestamp, state: RecordState) -> Self {
        Self {
            record_id: record_id.into(),
            created_at,
            state,
            fields: Vec::new(),
            attachments: Vec::new(),
            grants: GrantedActions::empty(),
        }
    }

    /// Value of a field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Field names in ingestion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Set a field, overwriting an existing one of the same name so field
    /// names stay unique within the record.
    pub fn set_field(&mut self, name: impl Into<FieldName>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.fields.iter_mut().find(|f| f.name == name) {
            existing.value = value;
        } else {
            self.fields.push(RecordField::new(name, value));
        }
    }

    /// Attachments of one declared type.
    pub fn attachments_of<'a>(
        &'a self,
        file_type: &'a str,
    ) -> impl Iterator<Item = &'a Attachment> + 'a {
        self.attachments
            .iter()
            .filter(move |a| a.file_type == file_type)
    }
}

// ============================================================================
// VALUE NORMALIZATION
// ============================================================================

/// Flatten a raw JSON field value into the display string shown in a cell.
///
/// Arrays are comma-joined, scalars stringified, objects reduced to their
/// identifier member (or compact JSON when they have none). Null becomes the
/// empty string.
pub fn flatten_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(flatten_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => match user_reference_id(value) {
            Some(id) => id.to_string(),
            None => value.to_string(),
        },
    }
}

/// Extract the user identifier from a user-reference value, if the shape
/// carries one. The host encodes references as objects with a `userId` (or
/// legacy `id`) member.
pub fn user_reference_id(value: &Value) -> Option<&str> {
    let object = value.as_object()?;
    object
        .get("userId")
        .or_else(|| object.get("id"))
        .and_then(Value::as_str)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn sample_record() -> Record {
        let mut record = Record::new("rec-1", Utc::now(), RecordState::Submitted);
        record.set_field("name", "Ada");
        record.set_field("email", "ada@example.org");
        record
    }

    #[test]
    fn test_field_lookup() {
        let record = sample_record();
        assert_eq!(record.field("name"), Some("Ada"));
        assert_eq!(record.field("missing"), None);
    }

    #[test]
    fn test_set_field_overwrites_in_place() {
        let mut record = sample_record();
        record.set_field("name", "Grace");

        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.field("name"), Some("Grace"));
        // Overwriting must not move the field to the back
        assert_eq!(record.fields[0].name, "name");
    }

    #[test]
    fn test_field_names_preserve_order() {
        let record = sample_record();
        let names: Vec<&str> = record.field_names().collect();
        assert_eq!(names, vec!["name", "email"]);
    }

    #[test]
    fn test_flatten_scalars() {
        assert_eq!(flatten_value(&json!("plain")), "plain");
        assert_eq!(flatten_value(&json!(3.5)), "3.5");
        assert_eq!(flatten_value(&json!(true)), "true");
        assert_eq!(flatten_value(&Value::Null), "");
    }

    #[test]
    fn test_flatten_array_comma_joined() {
        assert_eq!(flatten_value(&json!(["a", "b", "c"])), "a, b, c");
        assert_eq!(flatten_value(&json!([1, ["x", "y"]])), "1, x, y");
    }

    #[test]
    fn test_flatten_user_reference_object() {
        assert_eq!(
            flatten_value(&json!({"userId": "u-7", "role": "editor"})),
            "u-7"
        );
        assert_eq!(flatten_value(&json!({"id": "u-8"})), "u-8");
    }

    #[test]
    fn test_flatten_plain_object_falls_back_to_json() {
        let flattened = flatten_value(&json!({"lat": 1, "lng": 2}));
        assert!(flattened.contains("lat"));
    }

    #[test]
    fn test_user_reference_id() {
        assert_eq!(user_reference_id(&json!({"userId": "u-1"})), Some("u-1"));
        assert_eq!(user_reference_id(&json!({"name": "x"})), None);
        assert_eq!(user_reference_id(&json!("u-1")), None);
    }

    #[test]
    fn test_attachments_of_filters_by_type() {
        let mut record = sample_record();
        record.attachments.push(Attachment {
            file_type: "photo".to_string(),
            file_name: "a.jpg".to_string(),
        });
        record.attachments.push(Attachment {
            file_type: "document".to_string(),
            file_name: "b.pdf".to_string(),
        });

        let photos: Vec<_> = record.attachments_of("photo").collect();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].file_name, "a.jpg");
    }
}
