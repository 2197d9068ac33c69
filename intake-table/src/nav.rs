//! Detail navigation: a bounded cursor over the active view
//!
//! The cursor walks the rows the user currently sees (filtered, current
//! page), one logical "viewing detail" state: the address segment is
//! rewritten in place while stepping, so back-navigation returns to the
//! pre-detail address, not to every visited record.

use intake_core::{Record, RecordState};

/// Address segment prefix for an open detail view.
const DETAIL_SEGMENT: &str = "detail";

// ============================================================================
// ADDRESS SURFACE
// ============================================================================

/// Host surface exposing the current path and allowing the engine to rewrite
/// the trailing `detail/{id}` segment without a reload.
pub trait AddressSurface {
    fn current_path(&self) -> String;
    fn replace(&mut self, path: &str);
}

/// In-memory address surface for tests and headless hosts. Records every
/// rewrite so navigation behavior is observable.
#[derive(Debug, Clone, Default)]
pub struct MemoryAddress {
    path: String,
    pub history: Vec<String>,
}

impl MemoryAddress {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            history: Vec::new(),
        }
    }
}

impl AddressSurface for MemoryAddress {
    fn current_path(&self) -> String {
        self.path.clone()
    }

    fn replace(&mut self, path: &str) {
        self.path = path.to_string();
        self.history.push(self.path.clone());
    }
}

/// Append a `detail/{id}` segment, replacing any existing one.
pub fn with_detail(path: &str, record_id: &str) -> String {
    let base = without_detail(path);
    if base.is_empty() {
        format!("{}/{}", DETAIL_SEGMENT, record_id)
    } else {
        format!("{}/{}/{}", base, DETAIL_SEGMENT, record_id)
    }
}

/// Strip a trailing `detail/{id}` segment, if present.
pub fn without_detail(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    let segments: Vec<&str> = trimmed.split('/').collect();
    if segments.len() >= 2 && segments[segments.len() - 2] == DETAIL_SEGMENT {
        segments[..segments.len() - 2].join("/")
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// DETAIL CURSOR
// ============================================================================

/// Bounded position pointer over one record-state's current view.
/// Invariant while open: `1 <= position <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailCursor {
    pub state: RecordState,
    /// 1-based position within the active view
    pub position: usize,
    pub total: usize,
}

impl DetailCursor {
    pub fn has_previous(&self) -> bool {
        self.position > 1
    }

    pub fn has_next(&self) -> bool {
        self.position < self.total
    }
}

/// State machine driving sequential detail navigation. Performs no I/O;
/// address synchronization goes through the injected [`AddressSurface`].
#[derive(Debug, Clone, Default)]
pub struct DetailNavigationController {
    cursor: Option<DetailCursor>,
}

impl DetailNavigationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<&DetailCursor> {
        self.cursor.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.cursor.as_ref().is_some_and(DetailCursor::has_previous)
    }

    pub fn has_next(&self) -> bool {
        self.cursor.as_ref().is_some_and(DetailCursor::has_next)
    }

    /// Open the detail view at a 1-based position within `view`. Positions
    /// outside `1..=view.len()` are a silent no-op (caller bug by contract).
    /// Returns the record now shown, if any.
    pub fn open<'a>(
        &mut self,
        state: RecordState,
        position: usize,
        view: &[&'a Record],
        address: &mut dyn AddressSurface,
    ) -> Option<&'a Record> {
        if position == 0 || position > view.len() {
            return None;
        }
        let record = view[position - 1];
        self.cursor = Some(DetailCursor {
            state,
            position,
            total: view.len(),
        });
        address.replace(&with_detail(&address.current_path(), &record.record_id));
        Some(record)
    }

    /// Step to the next position. No-op at the last position.
    pub fn next<'a>(
        &mut self,
        view: &[&'a Record],
        address: &mut dyn AddressSurface,
    ) -> Option<&'a Record> {
        let cursor = self.cursor?;
        if !cursor.has_next() {
            return None;
        }
        self.open(cursor.state, cursor.position + 1, view, address)
    }

    /// Step to the previous position. No-op at position 1.
    pub fn previous<'a>(
        &mut self,
        view: &[&'a Record],
        address: &mut dyn AddressSurface,
    ) -> Option<&'a Record> {
        let cursor = self.cursor?;
        if !cursor.has_previous() {
            return None;
        }
        self.open(cursor.state, cursor.position - 1, view, address)
    }

    /// Close the detail view and restore the pre-detail address.
    pub fn close(&mut self, address: &mut dyn AddressSurface) {
        if self.cursor.take().is_some() {
            address.replace(&without_detail(&address.current_path()));
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn rows(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new(format!("rec-{}", i), Utc::now(), RecordState::Draft))
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: the cursor invariant 1 <= position <= total holds after
        /// any sequence of steps.
        #[test]
        fn prop_cursor_stays_in_bounds(
            len in 1usize..10,
            start in 1usize..10,
            steps in prop::collection::vec(any::<bool>(), 0..30),
        ) {
            let rows = rows(len);
            let view: Vec<&Record> = rows.iter().collect();
            let mut address = MemoryAddress::new("forms/f");
            let mut nav = DetailNavigationController::new();

            let opened = nav
                .open(RecordState::Draft, start, &view, &mut address)
                .is_some();
            prop_assert_eq!(opened, start <= len);

            for forward in steps {
                if forward {
                    nav.next(&view, &mut address);
                } else {
                    nav.previous(&view, &mut address);
                }
                if let Some(cursor) = nav.cursor() {
                    prop_assert!(cursor.position >= 1);
                    prop_assert!(cursor.position <= cursor.total);
                    prop_assert_eq!(cursor.total, len);
                }
            }
        }

        /// Property: without_detail(with_detail(p, id)) == without_detail(p)
        /// for slash-free ids.
        #[test]
        fn prop_detail_segment_roundtrip(
            base in "[a-z/]{0,16}",
            id in "[a-z0-9-]{1,8}",
        ) {
            let with = with_detail(&base, &id);
            prop_assert_eq!(without_detail(&with), without_detail(&base));
        }
    }
}
