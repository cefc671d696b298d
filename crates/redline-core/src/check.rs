//! The check: a flagged set of text spans surfaced to the user.

use std::sync::Mutex;

use crate::document::Document;
use crate::range::Range;
use crate::tags::Fragment;

/// How urgently a check asks for attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

/// Where to scroll when a check takes focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollHint {
    Auto,
    Top,
}

/// Transient presentation state, preserved across reconciliation because the
/// reconciler reuses the check object itself.
#[derive(Debug, Default)]
pub struct UiState {
    pub collapsed: bool,
}

/// A flagged span (or group of spans) requiring user attention.
///
/// Checks are shared as `Arc<Check>`: reconciliation compares by domain
/// equality ([`Check::matches`]) but preserves object identity, so UI state
/// and focus survive re-derivation.
#[derive(Debug)]
pub struct Check {
    /// Name of the owning definition.
    pub name: String,
    /// The flagged spans, anchored at the revision they were derived at.
    pub fragments: Vec<Fragment>,
    /// Stable external key, for checks derived from a keyed list.
    pub id: Option<String>,
    pub severity: Severity,
    pub ui: Mutex<UiState>,
}

impl Check {
    pub fn new(name: impl Into<String>, fragments: Vec<Fragment>, severity: Severity) -> Self {
        Self {
            name: name.into(),
            fragments,
            id: None,
            severity,
            ui: Mutex::new(UiState::default()),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The check's spans projected to the document's current revision.
    pub fn current_ranges(&self, doc: &Document) -> Vec<Range> {
        self.fragments.iter().map(|f| f.project(doc)).collect()
    }

    /// Domain equality: same definition, and the same external id when both
    /// carry one, otherwise overlapping-or-equal spans. Deliberately looser
    /// than identity so a check survives small edits near its boundary.
    pub fn matches(&self, other: &Check, doc: &Document) -> bool {
        if self.name != other.name {
            return false;
        }
        if let (Some(a), Some(b)) = (&self.id, &other.id) {
            return a == b;
        }
        let ours = self.current_ranges(doc);
        let theirs = other.current_ranges(doc);
        ours.iter()
            .any(|a| theirs.iter().any(|b| a.overlaps_or_equals(*b)))
    }

    pub fn is_collapsed(&self) -> bool {
        self.ui.lock().unwrap().collapsed
    }

    pub fn set_collapsed(&self, collapsed: bool) {
        self.ui.lock().unwrap().collapsed = collapsed;
    }
}
