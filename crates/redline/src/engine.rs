//! The async shell around the reconciler and workflow.
//!
//! The engine owns the session, reconciler, workflow, and document behind a
//! single tokio lock, so derivation passes for a trigger context never
//! overlap. Document-change signals are debounced and coalesced on a
//! background task; the pre-save pass is awaited directly by the caller and
//! gates the save pipeline. Updates and focus changes go out on a broadcast
//! channel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use redline_core::{Check, Choice, Document, ScrollHint, TriggerContext};

use crate::event::EngineEvent;
use crate::reconciler::Reconciler;
use crate::session::Session;
use crate::workflow::{CloseReason, FocusPolicy, ReviewWorkflow, WorkflowState};

/// Quiet period before a document-change signal triggers a recompute.
const CHANGE_DEBOUNCE: Duration = Duration::from_millis(100);

/// How long a resolved check lingers after a constructive action, so the
/// user sees what happened before it disappears.
const CONSTRUCTIVE_GRACE: Duration = Duration::from_millis(500);

struct EngineInner {
    session: Session,
    reconciler: Reconciler,
    workflow: ReviewWorkflow,
    doc: Document,
}

/// Restores the workflow's browsing state when an action settles, on the
/// success path, the error path, and when the acting future is dropped.
struct ActionScope<'a> {
    inner: &'a mut EngineInner,
}

impl Drop for ActionScope<'_> {
    fn drop(&mut self) {
        self.inner.workflow.finish_action();
    }
}

#[derive(Clone)]
pub struct Engine {
    inner: Arc<tokio::sync::Mutex<EngineInner>>,
    events: broadcast::Sender<EngineEvent>,
    change_tx: mpsc::UnboundedSender<()>,
}

impl Engine {
    /// Build an engine and start its debounce task. Must be called within a
    /// tokio runtime. `workflow_trigger` selects which trigger context the
    /// review workflow walks.
    pub fn new(
        session: Session,
        doc: Document,
        workflow_trigger: TriggerContext,
        policy: FocusPolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(tokio::sync::Mutex::new(EngineInner {
            session,
            reconciler: Reconciler::new(),
            workflow: ReviewWorkflow::new(workflow_trigger, policy),
            doc,
        }));
        let engine = Self {
            inner,
            events,
            change_tx,
        };
        engine.spawn_debounce(change_rx);
        engine
    }

    /// The debounce loop: a burst of change signals collapses into one
    /// recompute after a quiet period. Signals arriving while a pass runs
    /// coalesce into the next one; passes never overlap.
    fn spawn_debounce(&self, mut change_rx: mpsc::UnboundedReceiver<()>) {
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        tokio::spawn(async move {
            while change_rx.recv().await.is_some() {
                loop {
                    match tokio::time::timeout(CHANGE_DEBOUNCE, change_rx.recv()).await {
                        Ok(Some(())) => continue,
                        Ok(None) => return,
                        Err(_) => break,
                    }
                }
                let mut guard = inner.lock().await;
                recompute(&mut guard, TriggerContext::DocumentChange, &events);
            }
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Signal that the document changed; a recompute follows the debounce.
    pub fn notify_document_change(&self) {
        let _ = self.change_tx.send(());
    }

    /// Mutate the document and signal the change in one step.
    pub async fn edit<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Document) -> R,
    {
        let result = {
            let mut guard = self.inner.lock().await;
            f(&mut guard.doc)
        };
        self.notify_document_change();
        result
    }

    /// Read the document without signalling anything.
    pub async fn with_document<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Document) -> R,
    {
        let guard = self.inner.lock().await;
        f(&guard.doc)
    }

    pub async fn checks(&self, trigger: TriggerContext) -> Vec<Arc<Check>> {
        self.inner.lock().await.reconciler.checks(trigger).to_vec()
    }

    pub async fn workflow_state(&self) -> WorkflowState {
        self.inner.lock().await.workflow.state()
    }

    pub async fn current_check(&self) -> Option<Arc<Check>> {
        self.inner.lock().await.workflow.current_check().cloned()
    }

    /// Run an immediate pass for `trigger`, bypassing the debounce. Hosts
    /// that do their own scheduling can drive everything through this.
    pub async fn recompute_now(&self, trigger: TriggerContext) {
        let mut guard = self.inner.lock().await;
        recompute(&mut guard, trigger, &self.events);
    }

    /// The blocking pre-save gate: evaluated exactly once per save attempt,
    /// complete before this returns. The caller decides whether the
    /// returned checks interrupt its save pipeline.
    pub async fn run_presave(&self) -> Vec<Arc<Check>> {
        let mut guard = self.inner.lock().await;
        recompute(&mut guard, TriggerContext::BeforeSave, &self.events);
        guard.reconciler.checks(TriggerContext::BeforeSave).to_vec()
    }

    /// Focus the check at `offset` in the workflow's list.
    pub async fn set_current_offset(&self, offset: usize) {
        let mut guard = self.inner.lock().await;
        let check = guard.workflow.set_current_offset(offset);
        self.emit_focus(&mut guard, &check);
    }

    pub async fn next(&self) {
        let mut guard = self.inner.lock().await;
        let check = guard.workflow.next();
        self.emit_focus(&mut guard, &check);
    }

    pub async fn previous(&self) {
        let mut guard = self.inner.lock().await;
        let check = guard.workflow.previous();
        self.emit_focus(&mut guard, &check);
    }

    fn emit_focus(&self, inner: &mut EngineInner, check: &Arc<Check>) {
        let trigger = inner.workflow.trigger();
        if let Some((check, index, scroll)) =
            inner
                .reconciler
                .focus_check(trigger, check, ScrollHint::Auto)
        {
            let _ = self.events.send(EngineEvent::FocusCheck {
                check,
                index,
                scroll,
            });
        }
    }

    /// Apply the user's verdict on the current check.
    ///
    /// Navigation is disabled for the duration; it re-enables when the
    /// definition's action settles, whether it resolved or failed. A failed
    /// action keeps the check so the user can retry. After a pre-save
    /// action the check is removed after a grace delay (longer when the
    /// action changed the document, zero for a plain rejection); after a
    /// document-change action the engine simply re-derives.
    pub async fn act(&self, choice: Choice) {
        let mut guard = self.inner.lock().await;

        let check = guard.workflow.begin_action();
        let scope = ActionScope { inner: &mut *guard };
        let trigger = scope.inner.workflow.trigger();

        let result = {
            let EngineInner { session, doc, .. } = &mut *scope.inner;
            let Some((definition, tags)) = session.definition_and_tags(&check.name) else {
                error!(check = %check.name, "no definition for check, dropping action");
                return;
            };
            definition.act(choice, &check, doc, tags).await
        };
        drop(scope);

        match result {
            Err(e) => {
                warn!(check = %check.name, "check action failed, keeping check: {e:#}");
            }
            Ok(outcome) => {
                debug!(check = %check.name, ?choice, ?outcome, "action applied");
                match trigger {
                    TriggerContext::BeforeSave => {
                        let grace = if choice.is_constructive() {
                            CONSTRUCTIVE_GRACE
                        } else {
                            Duration::ZERO
                        };
                        self.schedule_removal(check, choice, grace);
                    }
                    TriggerContext::DocumentChange => {
                        recompute(&mut guard, TriggerContext::DocumentChange, &self.events);
                    }
                }
            }
        }
    }

    /// Remove a resolved check after `grace`, so the reviewed span doesn't
    /// flicker away under the user mid-read.
    fn schedule_removal(&self, check: Arc<Check>, choice: Choice, grace: Duration) {
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        tokio::spawn(async move {
            if !grace.is_zero() {
                tokio::time::sleep(grace).await;
            }
            let mut guard = inner.lock().await;
            let inner = &mut *guard;
            let trigger = inner.workflow.trigger();
            let Some(update) = inner.reconciler.remove_check(trigger, &check) else {
                return;
            };
            let last_rejected = choice == Choice::Reject;
            inner
                .workflow
                .show_checks(update.checks.clone(), &update.added, last_rejected, &inner.doc);
            let _ = events.send(EngineEvent::ChecksUpdated {
                trigger: update.trigger,
                checks: update.checks,
                added: update.added,
                removed: update.removed,
            });
        });
    }

    /// End the review session: verdict state is forgotten and the workflow
    /// closes. An in-flight action still lands on the document.
    pub async fn deactivate(&self) {
        let mut guard = self.inner.lock().await;
        guard.session.deactivate();
        guard.workflow.close(CloseReason::Dismissed);
    }
}

fn recompute(inner: &mut EngineInner, trigger: TriggerContext, events: &broadcast::Sender<EngineEvent>) {
    let start = Instant::now();
    let EngineInner {
        session,
        reconciler,
        workflow,
        doc,
    } = inner;
    let Some(update) = reconciler.recompute(trigger, doc, session) else {
        return;
    };
    info!(
        ?trigger,
        total = update.checks.len(),
        added = update.added.len(),
        removed = update.removed.len(),
        elapsed = ?start.elapsed(),
        "checks reconciled"
    );
    if workflow.trigger() == trigger {
        workflow.show_checks(update.checks.clone(), &update.added, false, doc);
    }
    let _ = events.send(EngineEvent::ChecksUpdated {
        trigger: update.trigger,
        checks: update.checks,
        added: update.added,
        removed: update.removed,
    });
}
