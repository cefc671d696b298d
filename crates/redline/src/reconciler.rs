//! Check reconciliation: stable added/removed diffing between derivation
//! passes.
//!
//! Each trigger context owns its own list. On every recompute, candidates
//! equal (by domain equality) to an existing check are swapped out for the
//! existing object, so focus, expansion, and other UI state survive
//! re-derivation; `added` and `removed` are then computed by object
//! identity. An update is produced only when something actually changed.

use std::sync::Arc;

use tracing::{debug, warn};

use redline_core::{Check, Document, ScrollHint, TriggerContext};

use crate::session::Session;

/// The outcome of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ChecksUpdate {
    pub trigger: TriggerContext,
    pub checks: Vec<Arc<Check>>,
    pub added: Vec<Arc<Check>>,
    pub removed: Vec<Arc<Check>>,
}

#[derive(Default)]
pub struct Reconciler {
    change_checks: Vec<Arc<Check>>,
    presave_checks: Vec<Arc<Check>>,
    focused: Option<Arc<Check>>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checks(&self, trigger: TriggerContext) -> &[Arc<Check>] {
        match trigger {
            TriggerContext::DocumentChange => &self.change_checks,
            TriggerContext::BeforeSave => &self.presave_checks,
        }
    }

    fn checks_mut(&mut self, trigger: TriggerContext) -> &mut Vec<Arc<Check>> {
        match trigger {
            TriggerContext::DocumentChange => &mut self.change_checks,
            TriggerContext::BeforeSave => &mut self.presave_checks,
        }
    }

    /// Re-derive checks for `trigger` and diff against the previous list.
    /// Returns `None` when nothing changed.
    pub fn recompute(
        &mut self,
        trigger: TriggerContext,
        doc: &Document,
        session: &mut Session,
    ) -> Option<ChecksUpdate> {
        let candidates = session.derive(doc, trigger);
        let previous = self.checks(trigger).to_vec();

        // Reuse the existing object for every candidate it equals, so
        // re-derivation never thrashes focus or UI state on a keystroke.
        let mut next: Vec<Arc<Check>> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let reused = previous.iter().find(|prev| prev.matches(&candidate, doc));
            match reused {
                Some(prev) => {
                    if !next.iter().any(|c| Arc::ptr_eq(c, prev)) {
                        next.push(Arc::clone(prev));
                    }
                }
                None => next.push(candidate),
            }
        }

        let added: Vec<Arc<Check>> = next
            .iter()
            .filter(|c| !previous.iter().any(|p| Arc::ptr_eq(p, c)))
            .cloned()
            .collect();
        let removed: Vec<Arc<Check>> = previous
            .iter()
            .filter(|p| !next.iter().any(|c| Arc::ptr_eq(p, c)))
            .cloned()
            .collect();

        let changed = next.len() != previous.len() || !added.is_empty() || !removed.is_empty();
        *self.checks_mut(trigger) = next.clone();

        if let Some(focused) = &self.focused {
            if removed.iter().any(|r| Arc::ptr_eq(r, focused)) {
                self.focused = None;
            }
        }

        if changed {
            Some(ChecksUpdate {
                trigger,
                checks: next,
                added,
                removed,
            })
        } else {
            debug!(?trigger, "recompute produced no change");
            None
        }
    }

    /// Splice one check out of the live list, without waiting for the next
    /// recompute. Used when the user resolves a check directly.
    pub fn remove_check(
        &mut self,
        trigger: TriggerContext,
        check: &Arc<Check>,
    ) -> Option<ChecksUpdate> {
        let list = self.checks_mut(trigger);
        let position = list.iter().position(|c| Arc::ptr_eq(c, check))?;
        let removed = list.remove(position);
        let checks = list.clone();
        if self
            .focused
            .as_ref()
            .is_some_and(|f| Arc::ptr_eq(f, &removed))
        {
            self.focused = None;
        }
        Some(ChecksUpdate {
            trigger,
            checks,
            added: Vec::new(),
            removed: vec![removed],
        })
    }

    /// Record focus on `check` and describe the highlight the UI should
    /// perform. Returns `None` when the check is not in the live list.
    pub fn focus_check(
        &mut self,
        trigger: TriggerContext,
        check: &Arc<Check>,
        scroll: ScrollHint,
    ) -> Option<(Arc<Check>, usize, ScrollHint)> {
        let Some(index) = self
            .checks(trigger)
            .iter()
            .position(|c| Arc::ptr_eq(c, check))
        else {
            warn!(?trigger, "ignoring focus request for unknown check");
            return None;
        };
        self.focused = Some(Arc::clone(check));
        Some((Arc::clone(check), index, scroll))
    }

    pub fn focused(&self) -> Option<&Arc<Check>> {
        self.focused.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_core::document::{paragraph, text_items};
    use redline_core::{
        CheckDefinition, CiteNeededDefinition, SessionMode, Tag, UserProfile,
    };

    const CLAIM: &str =
        "An unsourced but substantial claim, well past the minimum length for a citation nag.";

    fn setup() -> (Document, Session, Reconciler) {
        let mut doc = Document::new();
        doc.insert(0, paragraph(CLAIM));
        let session = Session::new(
            vec![CheckDefinition::CiteNeeded(CiteNeededDefinition::default())],
            UserProfile::default(),
            SessionMode::Check,
        );
        (doc, session, Reconciler::new())
    }

    #[test]
    fn test_first_pass_reports_all_as_added() {
        let (doc, mut session, mut reconciler) = setup();
        let update = reconciler
            .recompute(TriggerContext::DocumentChange, &doc, &mut session)
            .expect("first pass must report a change");
        assert_eq!(update.checks.len(), 1);
        assert_eq!(update.added.len(), 1);
        assert!(update.removed.is_empty());
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let (doc, mut session, mut reconciler) = setup();
        reconciler
            .recompute(TriggerContext::DocumentChange, &doc, &mut session)
            .unwrap();
        assert!(
            reconciler
                .recompute(TriggerContext::DocumentChange, &doc, &mut session)
                .is_none()
        );
    }

    #[test]
    fn test_identity_survives_nearby_edit() {
        let (mut doc, mut session, mut reconciler) = setup();
        let first = reconciler
            .recompute(TriggerContext::DocumentChange, &doc, &mut session)
            .unwrap();
        let original = Arc::clone(&first.checks[0]);
        original.set_collapsed(true);

        // Extend the flagged paragraph: ranges move, identity must not
        doc.insert(doc.len() - 1, text_items(" and then some"));
        let second = reconciler.recompute(TriggerContext::DocumentChange, &doc, &mut session);
        let checks = reconciler.checks(TriggerContext::DocumentChange);
        assert_eq!(checks.len(), 1);
        assert!(Arc::ptr_eq(&checks[0], &original));
        assert!(checks[0].is_collapsed());
        // Identity reuse means no added/removed either
        assert!(second.is_none());
    }

    #[test]
    fn test_dismissal_produces_removal_on_recompute() {
        let (doc, mut session, mut reconciler) = setup();
        let update = reconciler
            .recompute(TriggerContext::DocumentChange, &doc, &mut session)
            .unwrap();
        session.tags_mut().tag(Tag::Dismissed, &update.checks[0]);
        let second = reconciler
            .recompute(TriggerContext::DocumentChange, &doc, &mut session)
            .expect("dismissal must produce a change");
        assert!(second.checks.is_empty());
        assert_eq!(second.removed.len(), 1);
    }

    #[test]
    fn test_trigger_contexts_are_independent() {
        let (doc, mut session, mut reconciler) = setup();
        reconciler
            .recompute(TriggerContext::DocumentChange, &doc, &mut session)
            .unwrap();
        assert!(reconciler.checks(TriggerContext::BeforeSave).is_empty());
        reconciler
            .recompute(TriggerContext::BeforeSave, &doc, &mut session)
            .unwrap();
        assert_eq!(reconciler.checks(TriggerContext::BeforeSave).len(), 1);
        // The two lists hold distinct objects for the same underlying span
        let change = &reconciler.checks(TriggerContext::DocumentChange)[0];
        let presave = &reconciler.checks(TriggerContext::BeforeSave)[0];
        assert!(!Arc::ptr_eq(change, presave));
    }

    #[test]
    fn test_explicit_removal_emits_update_and_clears_focus() {
        let (doc, mut session, mut reconciler) = setup();
        let update = reconciler
            .recompute(TriggerContext::DocumentChange, &doc, &mut session)
            .unwrap();
        let check = Arc::clone(&update.checks[0]);
        reconciler
            .focus_check(TriggerContext::DocumentChange, &check, ScrollHint::Auto)
            .unwrap();
        assert!(reconciler.focused().is_some());

        let removal = reconciler
            .remove_check(TriggerContext::DocumentChange, &check)
            .unwrap();
        assert_eq!(removal.removed.len(), 1);
        assert!(removal.checks.is_empty());
        assert!(reconciler.focused().is_none());
        // Removing again is a no-op
        assert!(
            reconciler
                .remove_check(TriggerContext::DocumentChange, &check)
                .is_none()
        );
    }
}
