//! Filter expressions for the submission table search
//!
//! This module provides the expression types only; evaluation against rows
//! lives in the table engine.

use crate::identity::FieldName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Filter operator for field comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Case-insensitive substring
    Like,
    /// Exact string equality
    Eq,
    /// Exact string inequality
    Ne,
    /// Prefix match
    Starts,
    /// Suffix match
    Ends,
    /// Less than (numeric when both sides parse as numbers)
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Value compiled as a regular expression
    Regex,
    /// All whitespace-separated tokens present, any order, case-insensitive
    Keywords,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            FilterOperator::Like => "like",
            FilterOperator::Eq => "=",
            FilterOperator::Ne => "!=",
            FilterOperator::Starts => "starts",
            FilterOperator::Ends => "ends",
            FilterOperator::Lt => "<",
            FilterOperator::Le => "<=",
            FilterOperator::Gt => ">",
            FilterOperator::Ge => ">=",
            FilterOperator::Regex => "regex",
            FilterOperator::Keywords => "keywords",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(FilterOperator::Like),
            "=" | "eq" => Ok(FilterOperator::Eq),
            "!=" | "ne" => Ok(FilterOperator::Ne),
            "starts" => Ok(FilterOperator::Starts),
            "ends" => Ok(FilterOperator::Ends),
            "<" | "lt" => Ok(FilterOperator::Lt),
            "<=" | "le" => Ok(FilterOperator::Le),
            ">" | "gt" => Ok(FilterOperator::Gt),
            ">=" | "ge" => Ok(FilterOperator::Ge),
            "regex" => Ok(FilterOperator::Regex),
            "keywords" => Ok(FilterOperator::Keywords),
            _ => Err(format!("Invalid FilterOperator: {}", s)),
        }
    }
}

/// Search target: one concrete field, or every data field of the row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterTarget {
    All,
    Field(FieldName),
}

impl FilterTarget {
    /// Parse the host's target string; `"all"` is the any-field sentinel.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("all") {
            FilterTarget::All
        } else {
            FilterTarget::Field(s.trim().to_string())
        }
    }
}

/// A single search expression over the active record-state's row set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterQuery {
    pub target: FilterTarget,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterQuery {
    pub fn new(target: FilterTarget, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            target,
            operator,
            value: value.into(),
        }
    }

    /// Create a case-insensitive substring search over all fields.
    pub fn like_all(value: impl Into<String>) -> Self {
        Self::new(FilterTarget::All, FilterOperator::Like, value)
    }

    /// Create an equality filter on one field.
    pub fn eq(field: impl Into<FieldName>, value: impl Into<String>) -> Self {
        Self::new(
            FilterTarget::Field(field.into()),
            FilterOperator::Eq,
            value,
        )
    }

    /// An empty search value clears the filter and restores the full view.
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parse_symbolic_and_word_forms() {
        assert_eq!("=".parse::<FilterOperator>().unwrap(), FilterOperator::Eq);
        assert_eq!("eq".parse::<FilterOperator>().unwrap(), FilterOperator::Eq);
        assert_eq!("!=".parse::<FilterOperator>().unwrap(), FilterOperator::Ne);
        assert_eq!("<=".parse::<FilterOperator>().unwrap(), FilterOperator::Le);
        assert_eq!(
            "KEYWORDS".parse::<FilterOperator>().unwrap(),
            FilterOperator::Keywords
        );
        assert!("~".parse::<FilterOperator>().is_err());
    }

    #[test]
    fn test_operator_display_roundtrip() {
        for op in [
            FilterOperator::Like,
            FilterOperator::Eq,
            FilterOperator::Ne,
            FilterOperator::Starts,
            FilterOperator::Ends,
            FilterOperator::Lt,
            FilterOperator::Le,
            FilterOperator::Gt,
            FilterOperator::Ge,
            FilterOperator::Regex,
            FilterOperator::Keywords,
        ] {
            let parsed: FilterOperator = op.to_string().parse().unwrap();
            assert_eq!(parsed, op);
        }
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(FilterTarget::parse("all"), FilterTarget::All);
        assert_eq!(FilterTarget::parse("ALL "), FilterTarget::All);
        assert_eq!(
            FilterTarget::parse("email"),
            FilterTarget::Field("email".to_string())
        );
    }

    #[test]
    fn test_query_is_empty_on_blank_value() {
        assert!(FilterQuery::like_all("").is_empty());
        assert!(FilterQuery::like_all("   ").is_empty());
        assert!(!FilterQuery::like_all("x").is_empty());
    }
}
