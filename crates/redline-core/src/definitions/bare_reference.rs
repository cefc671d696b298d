//! Flags references whose content is a bare URL.
//!
//! Unlike the range-based rules, these checks are keyed by the document's
//! reference list, so a verdict follows the reference no matter where later
//! edits move it.

use std::sync::Arc;

use eyre::Result;

use super::{ActOutcome, Choice, ChoiceSpec, DeriveContext};
use crate::check::{Check, Severity};
use crate::config::{CheckConfig, TriggerContext};
use crate::document::{Document, text_items};
use crate::tags::{Fragment, Tag, TagStore};

pub const NAME: &str = "bare-reference";

fn looks_like_bare_url(text: &str) -> bool {
    let text = text.trim();
    (text.starts_with("http://") || text.starts_with("https://"))
        && !text.contains(char::is_whitespace)
}

#[derive(Debug, Clone)]
pub struct BareReferenceConfig {
    pub base: CheckConfig,
}

impl Default for BareReferenceConfig {
    fn default() -> Self {
        // Reference cleanup is a save-time concern; there is nothing to
        // gain from nagging about a URL mid-paste.
        let mut base = CheckConfig::default();
        base.triggers = vec![TriggerContext::BeforeSave];
        Self { base }
    }
}

#[derive(Debug, Default)]
pub struct BareReferenceDefinition {
    pub config: BareReferenceConfig,
}

impl BareReferenceDefinition {
    pub fn new(config: BareReferenceConfig) -> Self {
        Self { config }
    }

    pub(super) fn choices(&self) -> Vec<ChoiceSpec> {
        vec![
            ChoiceSpec {
                choice: Choice::Accept,
                label_key: "redline-bare-reference-convert",
            },
            ChoiceSpec {
                choice: Choice::Reject,
                label_key: "redline-bare-reference-decline",
            },
            ChoiceSpec {
                choice: Choice::Dismiss,
                label_key: "redline-dismiss",
            },
        ]
    }

    pub(super) fn evaluate(&self, ctx: &DeriveContext<'_>) -> Vec<Arc<Check>> {
        let mut checks = Vec::new();
        for node in ctx.doc.references() {
            if !looks_like_bare_url(&node.text) {
                continue;
            }
            if ctx.tags.is_dismissed_id(NAME, &node.key) {
                continue;
            }
            if ctx.tags.is_tagged_id(NAME, Tag::Accepted, &node.key) {
                continue;
            }
            checks.push(Arc::new(
                Check::new(
                    NAME,
                    vec![Fragment::new(node.range, ctx.doc.revision())],
                    Severity::Warning,
                )
                .with_id(node.key.clone()),
            ));
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
                let Some(id) = &check.id else {
                    return Ok(ActOutcome::Unchanged);
                };
                let Some(node) = doc.references().into_iter().find(|n| &n.key == id) else {
                    // The reference was deleted under us; nothing to convert
                    return Ok(ActOutcome::Unchanged);
                };
                let formatted = format!("[{}]", node.text.trim());
                doc.replace(node.interior, text_items(&formatted));
                tags.tag(Tag::Accepted, check);
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
    use crate::document::{paragraph, reference};
    use crate::extract::RangeDiffExtractor;

    fn doc_with_refs() -> Document {
        let mut items = paragraph("body ");
        let close = items.len() - 1;
        let mut refs = reference("r1", "https://example.com/a");
        refs.extend(reference("r2", "Smith 2019, p. 4"));
        items.splice(close..close, refs);
        Document::from_items(items)
    }

    fn derive(doc: &Document, tags: &TagStore) -> Vec<Arc<Check>> {
        let extractor = RangeDiffExtractor::new();
        let user = UserProfile::default();
        let ctx = DeriveContext {
            doc,
            extractor: &extractor,
            tags,
            trigger: TriggerContext::BeforeSave,
            mode: SessionMode::Check,
            user: &user,
        };
        BareReferenceDefinition::default().evaluate(&ctx)
    }

    #[test]
    fn test_flags_only_bare_urls() {
        let doc = doc_with_refs();
        let tags = TagStore::new();
        let checks = derive(&doc, &tags);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].id.as_deref(), Some("r1"));
    }

    #[test]
    fn test_dismissal_is_keyed_by_id() {
        let doc = doc_with_refs();
        let mut tags = TagStore::new();
        let checks = derive(&doc, &tags);
        tags.tag(Tag::Dismissed, &checks[0]);
        assert!(derive(&doc, &tags).is_empty());
    }

    #[test]
    fn test_bare_url_detection() {
        assert!(looks_like_bare_url("https://example.com/page"));
        assert!(looks_like_bare_url("  http://a.b  "));
        assert!(!looks_like_bare_url("Smith 2019"));
        assert!(!looks_like_bare_url("see https://example.com"));
        assert!(!looks_like_bare_url(""));
    }
}
