//! The review session: the dependency-injected registry of definitions and
//! shared derivation state.
//!
//! A session is constructed when review starts and passed by reference to
//! everything that needs it; there is no process-wide registry. Deactivating
//! the session drops all dismissal state; verdicts live exactly as long as
//! one editing session.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use redline_core::{
    Check, CheckDefinition, DeriveContext, Document, RangeDiffExtractor, SessionMode, TagStore,
    TriggerContext, UserProfile,
};

pub struct Session {
    definitions: Vec<CheckDefinition>,
    tags: TagStore,
    extractor: RangeDiffExtractor,
    user: UserProfile,
    mode: SessionMode,
    /// Per-definition document-gate results, valid for one revision.
    coverage: HashMap<&'static str, (u64, bool)>,
}

impl Session {
    pub fn new(definitions: Vec<CheckDefinition>, user: UserProfile, mode: SessionMode) -> Self {
        info!(
            definitions = definitions.len(),
            ?mode,
            "review session activated"
        );
        Self {
            definitions,
            tags: TagStore::new(),
            extractor: RangeDiffExtractor::new(),
            user,
            mode,
            coverage: HashMap::new(),
        }
    }

    pub fn definitions(&self) -> &[CheckDefinition] {
        &self.definitions
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub fn tags(&self) -> &TagStore {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagStore {
        &mut self.tags
    }

    /// The named definition together with mutable tag access, borrowed
    /// disjointly so an action can consult one while updating the other.
    pub fn definition_and_tags(&mut self, name: &str) -> Option<(&CheckDefinition, &mut TagStore)> {
        let Session {
            definitions, tags, ..
        } = self;
        definitions
            .iter()
            .find(|d| d.name() == name)
            .map(|d| (d, &mut *tags))
    }

    /// Run every definition whose gates pass for `trigger`, concatenating
    /// their candidates.
    pub fn derive(&mut self, doc: &Document, trigger: TriggerContext) -> Vec<Arc<Check>> {
        let Session {
            definitions,
            tags,
            extractor,
            user,
            mode,
            coverage,
        } = self;

        let mut candidates = Vec::new();
        for definition in definitions.iter() {
            let config = definition.config();
            if !config.runs_on(trigger) || !config.matches(user, *mode) {
                continue;
            }
            let revision = doc.revision();
            let covers = match coverage.get(definition.name()) {
                Some((rev, ok)) if *rev == revision => *ok,
                _ => {
                    let ok = config.covers_document(doc);
                    coverage.insert(definition.name(), (revision, ok));
                    ok
                }
            };
            if !covers {
                debug!(definition = definition.name(), "document gated out");
                continue;
            }
            let ctx = DeriveContext {
                doc,
                extractor,
                tags,
                trigger,
                mode: *mode,
                user,
            };
            candidates.extend(definition.evaluate(&ctx));
        }
        candidates
    }

    /// End the session: all dismissal/acceptance state is forgotten.
    pub fn deactivate(&mut self) {
        self.tags.clear();
        self.coverage.clear();
        info!("review session deactivated");
    }
}
