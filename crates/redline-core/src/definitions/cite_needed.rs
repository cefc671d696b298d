//! Flags newly-written prose that carries no citation.

use std::sync::Arc;

use eyre::Result;
use tracing::debug;

use super::{ActOutcome, Choice, ChoiceSpec, DeriveContext, is_range_valid};
use crate::check::{Check, Severity};
use crate::config::{CheckConfig, TriggerContext};
use crate::document::{Document, Item, NodeKind};
use crate::extract::ExtractFlags;
use crate::tags::{Fragment, Tag, TagStore};

pub const NAME: &str = "cite-needed";

/// How many characters of new prose it takes before we ask for a citation.
const DEFAULT_MINIMUM_CHARACTERS: usize = 50;

#[derive(Debug, Clone)]
pub struct CiteNeededConfig {
    pub base: CheckConfig,
    pub minimum_characters: usize,
}

impl Default for CiteNeededConfig {
    fn default() -> Self {
        Self {
            base: CheckConfig::default(),
            minimum_characters: DEFAULT_MINIMUM_CHARACTERS,
        }
    }
}

#[derive(Debug, Default)]
pub struct CiteNeededDefinition {
    pub config: CiteNeededConfig,
}

impl CiteNeededDefinition {
    pub fn new(config: CiteNeededConfig) -> Self {
        Self { config }
    }

    pub(super) fn choices(&self) -> Vec<ChoiceSpec> {
        vec![
            ChoiceSpec {
                choice: Choice::Accept,
                label_key: "redline-cite-needed-add",
            },
            ChoiceSpec {
                choice: Choice::Reject,
                label_key: "redline-cite-needed-decline",
            },
            ChoiceSpec {
                choice: Choice::Dismiss,
                label_key: "redline-dismiss",
            },
        ]
    }

    pub(super) fn evaluate(&self, ctx: &DeriveContext<'_>) -> Vec<Arc<Check>> {
        // While typing, look only at pure insertions; at save time, widen to
        // every fully-rewritten node so pasted-and-tweaked prose is caught.
        let flags = match ctx.trigger {
            TriggerContext::DocumentChange => ExtractFlags {
                content_ranges_only: true,
                pure_insertions_only: true,
                ..Default::default()
            },
            TriggerContext::BeforeSave => ExtractFlags {
                content_ranges_only: true,
                covered_nodes_only: true,
                ..Default::default()
            },
        };

        let mut checks = Vec::new();
        for range in ctx.extractor.modified_ranges(ctx.doc, flags) {
            if ctx.doc.char_count(range) < self.config.minimum_characters {
                continue;
            }
            if ctx.doc.has_reference_in(range) {
                continue;
            }
            if !is_range_valid(range, ctx.doc, &self.config.base) {
                continue;
            }
            if ctx.tags.is_dismissed_range(NAME, range, ctx.doc) {
                debug!(%range, "skipping dismissed uncited range");
                continue;
            }
            checks.push(Arc::new(Check::new(
                NAME,
                vec![Fragment::new(range, ctx.doc.revision())],
                Severity::Warning,
            )));
        }
        checks
    }

    pub(super) async fn act(
        &self,
        choice: Choice,
        check: &Check,
        doc: &mut Document,
        tags: &mut TagStore,
    ) -> Result<ActOutcome> {
        match choice {
            Choice::Accept => {
                let ranges = check.current_ranges(doc);
                let Some(range) = ranges.first() else {
                    return Ok(ActOutcome::Unchanged);
                };
                let key = format!("auto-{}", doc.references().len() + 1);
                doc.insert(
                    range.end,
                    vec![
                        Item::Open(NodeKind::Reference { key: key.clone() }),
                        Item::Close(NodeKind::Reference { key }),
                    ],
                );
                Ok(ActOutcome::Changed)
            }
            Choice::Reject | Choice::Dismiss => {
                tags.tag(Tag::Dismissed, check);
                Ok(ActOutcome::Unchanged)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SessionMode, UserProfile};
    use crate::extract::RangeDiffExtractor;
    use crate::document::paragraph;
    use crate::range::Range;

    const LONG: &str = "This is a fairly long statement of fact that really ought to cite something.";

    fn derive(doc: &Document, tags: &TagStore, trigger: TriggerContext) -> Vec<Arc<Check>> {
        let extractor = RangeDiffExtractor::new();
        let user = UserProfile::default();
        let ctx = DeriveContext {
            doc,
            extractor: &extractor,
            tags,
            trigger,
            mode: SessionMode::Check,
            user: &user,
        };
        CiteNeededDefinition::default().evaluate(&ctx)
    }

    #[test]
    fn test_flags_long_uncited_insertion() {
        let mut doc = Document::new();
        doc.insert(0, paragraph(LONG));
        let tags = TagStore::new();
        let checks = derive(&doc, &tags, TriggerContext::DocumentChange);
        assert_eq!(checks.len(), 1);
        assert_eq!(
            checks[0].current_ranges(&doc),
            vec![Range::new(1, 1 + LONG.chars().count())]
        );
    }

    #[test]
    fn test_short_insertion_is_ignored() {
        let mut doc = Document::new();
        doc.insert(0, paragraph("too short to matter"));
        let tags = TagStore::new();
        assert!(derive(&doc, &tags, TriggerContext::DocumentChange).is_empty());
    }

    #[test]
    fn test_cited_insertion_is_ignored() {
        let mut doc = Document::new();
        let mut items = paragraph(LONG);
        let close = items.len() - 1;
        items.splice(close..close, crate::document::reference("r1", "src"));
        doc.insert(0, items);
        let tags = TagStore::new();
        assert!(derive(&doc, &tags, TriggerContext::DocumentChange).is_empty());
    }

    #[test]
    fn test_dismissed_range_stays_dismissed() {
        let mut doc = Document::new();
        doc.insert(0, paragraph(LONG));
        let mut tags = TagStore::new();
        let checks = derive(&doc, &tags, TriggerContext::DocumentChange);
        tags.tag(Tag::Dismissed, &checks[0]);
        assert!(derive(&doc, &tags, TriggerContext::DocumentChange).is_empty());
    }
}
