//! Intake Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no table orchestration.

pub mod column;
pub mod config;
pub mod enums;
pub mod error;
pub mod filter;
pub mod grants;
pub mod identity;
pub mod record;
pub mod schema;

pub use column::{ColumnDefinition, ColumnPreference, PreferenceKey};
pub use config::TableConfig;
pub use enums::{CellFormat, ExportFormat, MoveDirection, RecordState};
pub use error::{
    ActionError, ConfigError, DataError, PreferenceError, SchemaError, TableError, TableResult,
    ValidationError,
};
pub use filter::{FilterOperator, FilterQuery, FilterTarget};
pub use grants::GrantedActions;
pub use identity::{FieldName, FormName, LangCode, RecordId, Timestamp, UserId};
pub use record::{
    flatten_value, user_reference_id, Attachment, Record, RecordField, FIELD_DATE_CREATED,
};
pub use schema::{ExportSettings, FormSchema, SchemaProperty};
