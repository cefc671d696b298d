//! Integration tests for derivation + reconciliation.
//!
//! These cover the engine's core guarantees:
//! - Re-derivation is idempotent: an unchanged document produces no update
//! - Checks keep their identity across edits outside their ranges
//! - Dismissals survive undo + equivalent redo of the flagged edit

mod common;

use std::sync::Arc;

use redline::Reconciler;
use redline_core::document::{Document, paragraph, text_items};
use redline_core::{Range, Tag, TriggerContext};

use common::{LONG_CLAIM, cite_session, full_session};

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_recompute_twice_yields_no_second_update() {
    let mut doc = Document::new();
    doc.insert(0, paragraph(LONG_CLAIM));
    let mut session = full_session();
    let mut reconciler = Reconciler::new();

    let first = reconciler.recompute(TriggerContext::DocumentChange, &doc, &mut session);
    assert!(first.is_some());
    let second = reconciler.recompute(TriggerContext::DocumentChange, &doc, &mut session);
    assert!(second.is_none(), "unchanged state must not emit an update");
}

// ============================================================================
// Identity stability
// ============================================================================

#[test]
fn test_edit_outside_check_ranges_preserves_identity() {
    let mut doc = Document::new();
    doc.insert(0, paragraph(LONG_CLAIM));
    let claim_len = doc.len();
    // A second short paragraph after the claim
    doc.insert(claim_len, paragraph("stub"));

    let mut session = cite_session();
    let mut reconciler = Reconciler::new();
    let update = reconciler
        .recompute(TriggerContext::DocumentChange, &doc, &mut session)
        .unwrap();
    assert_eq!(update.checks.len(), 1);
    let original = Arc::clone(&update.checks[0]);

    // Edit strictly inside the second paragraph, far from the check
    doc.insert(claim_len + 3, text_items("by"));
    let after = reconciler.recompute(TriggerContext::DocumentChange, &doc, &mut session);
    assert!(after.is_none(), "identity reuse must suppress the update");
    assert!(Arc::ptr_eq(
        &reconciler.checks(TriggerContext::DocumentChange)[0],
        &original
    ));
}

// ============================================================================
// End-to-end dismissal, including undo + redo
// ============================================================================

const INSERTED: &str = "When the library reopened in 1994 it held forty thousand volumes, a number that doubled within the decade according to the council's own annual reports.";

#[test]
fn test_dismissal_survives_undo_and_equivalent_redo() {
    let mut doc = Document::new();
    let mut session = cite_session();
    let mut reconciler = Reconciler::new();

    // Insert a long paragraph: one check covering the inserted prose
    doc.insert(0, paragraph(INSERTED));
    let update = reconciler
        .recompute(TriggerContext::DocumentChange, &doc, &mut session)
        .unwrap();
    assert_eq!(update.checks.len(), 1);
    let flagged = update.checks[0].current_ranges(&doc);
    assert_eq!(
        flagged,
        vec![Range::new(1, 1 + INSERTED.chars().count())]
    );

    // Dismiss and re-run: no checks
    session.tags_mut().tag(Tag::Dismissed, &update.checks[0]);
    let update = reconciler
        .recompute(TriggerContext::DocumentChange, &doc, &mut session)
        .unwrap();
    assert!(update.checks.is_empty());

    // Undo the insertion, then redo an equivalent one at the same spot:
    // the new range falls within the dismissed fragment, so still nothing
    assert!(doc.undo());
    doc.insert(0, paragraph(INSERTED));
    let after_redo = reconciler.recompute(TriggerContext::DocumentChange, &doc, &mut session);
    assert!(after_redo.is_none());
    assert!(reconciler.checks(TriggerContext::DocumentChange).is_empty());
}

// ============================================================================
// Trigger context independence
// ============================================================================

#[test]
fn test_dismissal_is_shared_across_trigger_contexts() {
    let mut doc = Document::new();
    doc.insert(0, paragraph(LONG_CLAIM));
    let mut session = cite_session();
    let mut reconciler = Reconciler::new();

    let update = reconciler
        .recompute(TriggerContext::DocumentChange, &doc, &mut session)
        .unwrap();
    session.tags_mut().tag(Tag::Dismissed, &update.checks[0]);

    // The pre-save context shares the tag store: nothing to report there
    let presave = reconciler.recompute(TriggerContext::BeforeSave, &doc, &mut session);
    assert!(presave.is_none());
    assert!(reconciler.checks(TriggerContext::BeforeSave).is_empty());
}
