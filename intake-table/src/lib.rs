//! Intake Table - Submission Table State Engine
//!
//! Column derivation, preference-merged settings, filtering, permission
//! aggregation, and detail navigation for the submission tables of a forms
//! platform. Rendering, transport, and identity are host concerns behind the
//! traits in [`traits`] and [`nav`]; this crate is a synchronous state
//! machine driven by discrete events.

pub mod actions;
pub mod coordinator;
pub mod filter;
pub mod nav;
pub mod notifications;
pub mod resolver;
pub mod settings;
pub mod traits;

pub use actions::BulkActionState;
pub use coordinator::{
    ExportScope, HostRequest, RawAttachment, RawSubmission, TableContext, TableCoordinator,
};
pub use filter::FilterEngine;
pub use nav::{
    with_detail, without_detail, AddressSurface, DetailCursor, DetailNavigationController,
    MemoryAddress,
};
pub use notifications::{Notification, NotificationAction, NotificationLevel};
pub use resolver::{
    is_internal_field, ColumnResolver, FIELD_ACTIONS, FIELD_IDENTIFIER, FIELD_ROW_INDEX,
    FIELD_SUBMISSION_ID,
};
pub use settings::ColumnSettingsController;
pub use traits::{
    CachedUserNames, FormRegistry, MapUserNames, MemoryFormRegistry, RegisteredForm,
    UserNameResolver,
};
