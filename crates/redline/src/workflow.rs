//! The review workflow: walking the reconciled check list.
//!
//! A small state machine: browsing (one check current, by offset), acting
//! (a verdict in flight, navigation disabled), or closed. Actions are
//! serialized: `begin_action` flips to acting and the matching
//! `finish_action` is bound to a drop guard in the engine, so the acting
//! state cannot stick whether the action resolves, fails, or is dropped
//! mid-flight.
//!
//! Offset navigation is bounds-checked and panics on an out-of-range
//! request: that is a host-integration bug and should fail loudly rather
//! than clamp.

use std::sync::Arc;

use tracing::debug;

use redline_core::{Check, Document, TriggerContext};

/// Why the workflow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Every check was resolved or went away.
    Complete,
    /// The list emptied on the heels of a rejection.
    Rejected,
    /// The host closed the review without finishing.
    Dismissed,
}

/// Whether the presentation keeps a check focused at all times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPolicy {
    /// Focus may lapse when the current check disappears.
    Optional,
    /// Re-anchor to a neighboring offset when the current check disappears.
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Browsing,
    Acting,
    Closed(CloseReason),
}

pub struct ReviewWorkflow {
    trigger: TriggerContext,
    policy: FocusPolicy,
    state: WorkflowState,
    checks: Vec<Arc<Check>>,
    current: Option<usize>,
}

impl ReviewWorkflow {
    pub fn new(trigger: TriggerContext, policy: FocusPolicy) -> Self {
        Self {
            trigger,
            policy,
            state: WorkflowState::Browsing,
            checks: Vec::new(),
            current: None,
        }
    }

    pub fn trigger(&self) -> TriggerContext {
        self.trigger
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn is_acting(&self) -> bool {
        self.state == WorkflowState::Acting
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, WorkflowState::Closed(_))
    }

    pub fn checks(&self) -> &[Arc<Check>] {
        &self.checks
    }

    pub fn current_offset(&self) -> Option<usize> {
        self.current
    }

    pub fn current_check(&self) -> Option<&Arc<Check>> {
        self.current.and_then(|offset| self.checks.get(offset))
    }

    /// Take a reconciled list and recompute the current selection.
    ///
    /// An empty list closes the workflow; the reason records whether the
    /// last action was a rejection. Otherwise: keep the current check if it
    /// survived; follow an overlapping replacement if it was superseded by a
    /// nearby edit; focus the first new check when there is no current one;
    /// under [`FocusPolicy::Required`], re-anchor to a neighboring offset.
    pub fn show_checks(
        &mut self,
        checks: Vec<Arc<Check>>,
        new_checks: &[Arc<Check>],
        last_rejected: bool,
        doc: &Document,
    ) {
        if self.is_closed() {
            return;
        }
        if checks.is_empty() {
            self.checks = checks;
            self.current = None;
            let reason = if last_rejected {
                CloseReason::Rejected
            } else {
                CloseReason::Complete
            };
            debug!(?reason, "check list emptied, closing review");
            self.state = WorkflowState::Closed(reason);
            return;
        }

        let previous = self.current_check().cloned();
        let mut offset = None;

        if let Some(current) = &previous {
            offset = checks.iter().position(|c| Arc::ptr_eq(c, current));
            if offset.is_none() {
                // Superseded by an overlapping check from the same rule
                let current_ranges = current.current_ranges(doc);
                offset = checks.iter().position(|c| {
                    c.name == current.name
                        && c.current_ranges(doc)
                            .iter()
                            .any(|r| current_ranges.iter().any(|p| r.touches_range(*p)))
                });
            }
        }
        if offset.is_none() && !new_checks.is_empty() {
            offset = checks
                .iter()
                .position(|c| new_checks.iter().any(|n| Arc::ptr_eq(n, c)));
        }
        if offset.is_none() {
            offset = match self.policy {
                FocusPolicy::Required => Some(self.current.unwrap_or(0).min(checks.len() - 1)),
                FocusPolicy::Optional => None,
            };
        }

        self.checks = checks;
        self.current = offset;
    }

    /// Make the check at `offset` current. Panics on an out-of-range offset,
    /// while an action is in flight, or after the workflow closed.
    pub fn set_current_offset(&mut self, offset: usize) -> Arc<Check> {
        assert!(
            !self.is_acting(),
            "navigation while an action is in flight"
        );
        assert!(!self.is_closed(), "navigation after the review closed");
        assert!(
            offset < self.checks.len(),
            "check offset {offset} out of range ({} checks)",
            self.checks.len()
        );
        self.current = Some(offset);
        Arc::clone(&self.checks[offset])
    }

    pub fn next(&mut self) -> Arc<Check> {
        let target = self.current.map_or(0, |offset| offset + 1);
        self.set_current_offset(target)
    }

    pub fn previous(&mut self) -> Arc<Check> {
        let target = match self.current {
            Some(0) | None => panic!("no check before the first offset"),
            Some(offset) => offset - 1,
        };
        self.set_current_offset(target)
    }

    /// Flip to the acting state, returning the check being acted on.
    pub(crate) fn begin_action(&mut self) -> Arc<Check> {
        assert!(
            self.state == WorkflowState::Browsing,
            "an action is already in flight or the review closed"
        );
        let offset = self.current.expect("acting requires a current check");
        self.state = WorkflowState::Acting;
        Arc::clone(&self.checks[offset])
    }

    /// Restore browsing after an action settles (or is dropped).
    pub(crate) fn finish_action(&mut self) {
        if self.state == WorkflowState::Acting {
            self.state = WorkflowState::Browsing;
            if let Some(offset) = self.current {
                if offset >= self.checks.len() {
                    self.current = if self.checks.is_empty() {
                        None
                    } else {
                        Some(self.checks.len() - 1)
                    };
                }
            }
        }
    }

    /// Host-driven close. Any in-flight action still lands on the document.
    pub fn close(&mut self, reason: CloseReason) {
        if !self.is_closed() {
            self.state = WorkflowState::Closed(reason);
            self.current = None;
        }
    }
}
