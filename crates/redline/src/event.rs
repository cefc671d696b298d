//! Events broadcast to the host UI.

use std::sync::Arc;

use redline_core::{Check, ScrollHint, TriggerContext};

/// Everything the presentation layer needs to hear from the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The reconciled list for a trigger context changed.
    ChecksUpdated {
        trigger: TriggerContext,
        checks: Vec<Arc<Check>>,
        added: Vec<Arc<Check>>,
        removed: Vec<Arc<Check>>,
    },
    /// A check took focus and should be highlighted.
    FocusCheck {
        check: Arc<Check>,
        index: usize,
        scroll: ScrollHint,
    },
}
