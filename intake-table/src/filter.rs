//! Filter evaluation over the active row set
//!
//! Filtering never mutates the rows; it produces the index view the
//! presentation layer shows. Selection, permission aggregation, and the
//! detail cursor all operate on that same view.

use crate::resolver::is_internal_field;
use intake_core::{FilterOperator, FilterQuery, FilterTarget, Record};
use regex::Regex;
use std::cmp::Ordering;
use tracing::debug;

/// A compiled filter, ready to evaluate against records.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    query: FilterQuery,
    /// Compiled pattern for the regex operator. `None` after a failed
    /// compile; such a filter matches nothing.
    regex: Option<Regex>,
}

impl FilterEngine {
    /// Compile a query. An empty search value means "no filter" and yields
    /// `None`: the caller restores the full, unfiltered view.
    pub fn compile(query: &FilterQuery) -> Option<Self> {
        if query.is_empty() {
            return None;
        }
        let regex = if query.operator == FilterOperator::Regex {
            match Regex::new(&query.value) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    debug!(pattern = %query.value, error = %err, "invalid filter regex, matching nothing");
                    None
                }
            }
        } else {
            None
        };
        Some(Self {
            query: query.clone(),
            regex,
        })
    }

    /// Indices of the matching rows, in row order.
    pub fn apply(&self, rows: &[Record]) -> Vec<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, record)| self.matches(record))
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether one record matches. With target `All`, any data field may
    /// satisfy the operator (logical OR); frozen and action fields never
    /// participate.
    pub fn matches(&self, record: &Record) -> bool {
        match &self.query.target {
            FilterTarget::Field(field) => record
                .field(field)
                .is_some_and(|value| self.value_matches(value)),
            FilterTarget::All => record
                .fields
                .iter()
                .filter(|f| !is_internal_field(&f.name))
                .any(|f| self.value_matches(&f.value)),
        }
    }

    fn value_matches(&self, value: &str) -> bool {
        let needle = self.query.value.as_str();
        match self.query.operator {
            FilterOperator::Like => value.to_lowercase().contains(&needle.to_lowercase()),
            FilterOperator::Eq => value == needle,
            FilterOperator::Ne => value != needle,
            FilterOperator::Starts => value.starts_with(needle),
            FilterOperator::Ends => value.ends_with(needle),
            FilterOperator::Lt => compare(value, needle) == Ordering::Less,
            FilterOperator::Le => compare(value, needle) != Ordering::Greater,
            FilterOperator::Gt => compare(value, needle) == Ordering::Greater,
            FilterOperator::Ge => compare(value, needle) != Ordering::Less,
            FilterOperator::Regex => self.regex.as_ref().is_some_and(|r| r.is_match(value)),
            FilterOperator::Keywords => {
                let haystack = value.to_lowercase();
                needle
                    .split_whitespace()
                    .all(|token| haystack.contains(&token.to_lowercase()))
            }
        }
    }
}

/// Ordering comparison: numeric when both sides parse as numbers, else
/// lexicographic.
fn compare(left: &str, right: &str) -> Ordering {
    match (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.cmp(right),
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
