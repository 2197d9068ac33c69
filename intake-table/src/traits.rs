//! Host collaborator traits
//!
//! The engine performs no I/O; these seams inject what the host environment
//! knows. The form registry is a static capability resolved at startup, not
//! a dynamically loaded per-form module.

use intake_core::{FormName, LangCode, RecordState, UserId};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// FORM REGISTRY
// ============================================================================

/// Static lookup of per-form facts: identifiers, slugs, display names,
/// allowed record-states, and the raw schema document.
pub trait FormRegistry {
    fn id_for(&self, form: &str) -> Option<String>;
    fn slug_for(&self, form: &str) -> Option<String>;
    fn display_name(&self, form: &str, lang: &str) -> Option<String>;
    fn allowed_states(&self, form: &str) -> Vec<RecordState>;
    /// Raw schema document; the engine parses it leniently and falls back
    /// to catch-all column derivation when it is malformed or absent.
    fn raw_schema(&self, form: &str) -> Option<Value>;
}

/// One registered form.
#[derive(Debug, Clone, Default)]
pub struct RegisteredForm {
    pub id: String,
    pub slug: String,
    pub display_names: HashMap<LangCode, String>,
    pub states: Vec<RecordState>,
    pub schema: Option<Value>,
}

/// In-memory registry for tests and statically configured hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryFormRegistry {
    forms: HashMap<FormName, RegisteredForm>,
}

impl MemoryFormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<FormName>, form: RegisteredForm) {
        self.forms.insert(name.into(), form);
    }
}

impl FormRegistry for MemoryFormRegistry {
    fn id_for(&self, form: &str) -> Option<String> {
        self.forms.get(form).map(|f| f.id.clone())
    }

    fn slug_for(&self, form: &str) -> Option<String> {
        self.forms.get(form).map(|f| f.slug.clone())
    }

    fn display_name(&self, form: &str, lang: &str) -> Option<String> {
        self.forms
            .get(form)
            .and_then(|f| f.display_names.get(lang).cloned())
    }

    fn allowed_states(&self, form: &str) -> Vec<RecordState> {
        self.forms.get(form).map(|f| f.states.clone()).unwrap_or_default()
    }

    fn raw_schema(&self, form: &str) -> Option<Value> {
        self.forms.get(form).and_then(|f| f.schema.clone())
    }
}

// ============================================================================
// USER NAME RESOLUTION
// ============================================================================

/// Resolves an opaque user identifier to a human display name.
pub trait UserNameResolver {
    fn display_name(&self, user_id: &str) -> Option<String>;
}

/// Map-backed resolver for tests and pre-resolved hosts.
#[derive(Debug, Clone, Default)]
pub struct MapUserNames {
    names: HashMap<UserId, String>,
}

impl MapUserNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user_id: impl Into<UserId>, name: impl Into<String>) {
        self.names.insert(user_id.into(), name.into());
    }
}

impl UserNameResolver for MapUserNames {
    fn display_name(&self, user_id: &str) -> Option<String> {
        self.names.get(user_id).cloned()
    }
}

/// Session-scoped cache over any resolver. Hits and misses are both cached;
/// the session is the cache lifetime.
pub struct CachedUserNames {
    inner: Box<dyn UserNameResolver>,
    cache: HashMap<UserId, Option<String>>,
}

impl CachedUserNames {
    pub fn new(inner: Box<dyn UserNameResolver>) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
        }
    }

    /// Display name for a user id, or the id itself when the host knows no
    /// name for it.
    pub fn resolve(&mut self, user_id: &str) -> String {
        self.cache
            .entry(user_id.to_string())
            .or_insert_with(|| self.inner.display_name(user_id))
            .clone()
            .unwrap_or_else(|| user_id.to_string())
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
