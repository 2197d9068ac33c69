//! Table behavior configuration

use crate::error::{ConfigError, TableResult};
use crate::identity::LangCode;
use serde::{Deserialize, Serialize};

/// Configuration for the submission table engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Rows per page in every table view.
    pub default_page_size: usize,
    /// Active language for localized column titles.
    pub language: LangCode,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            language: "en".to_string(),
        }
    }
}

impl TableConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> TableResult<()> {
        if self.default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_page_size".to_string(),
                value: self.default_page_size.to_string(),
                reason: "page size must be at least 1".to_string(),
            }
            .into());
        }

        if self.language.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "language".to_string(),
                value: self.language.clone(),
                reason: "language must not be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
