//! Identity types for intake entities

use chrono::{DateTime, Utc};

/// Opaque submission identifier, assigned by the host data source.
/// The engine never inspects its contents.
pub type RecordId = String;

/// Form machine name, as registered with the host form registry.
pub type FormName = String;

/// Opaque user identifier. Display names are resolved through the host.
pub type UserId = String;

/// Field (column) machine name within a form.
pub type FieldName = String;

/// Language code for localized titles (e.g. "en", "de").
pub type LangCode = String;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
