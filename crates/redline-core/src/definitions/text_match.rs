//! Flags configured terms appearing in modified text.
//!
//! Occurrences are grouped per term: a term only surfaces once its
//! occurrence count in the modified ranges reaches the rule's minimum, and
//! the resulting check spans every occurrence.

use std::collections::BTreeMap;
use std::sync::Arc;

use eyre::Result;
use serde::Deserialize;

use super::{ActOutcome, Choice, ChoiceSpec, DeriveContext, is_range_valid};
use crate::check::{Check, Severity};
use crate::config::{CheckConfig, TriggerContext};
use crate::document::{Document, text_items};
use crate::extract::ExtractFlags;
use crate::range::Range;
use crate::tags::{Fragment, Tag, TagStore};

pub const NAME: &str = "text-match";

/// One term to look for.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermRule {
    pub term: String,
    /// Suggested substitution applied on accept.
    #[serde(default)]
    pub replacement: Option<String>,
    /// Occurrences needed before a check surfaces.
    #[serde(default = "default_minimum_occurrences")]
    pub minimum_occurrences: usize,
}

fn default_minimum_occurrences() -> usize {
    1
}

#[derive(Debug, Clone, Default)]
pub struct TextMatchConfig {
    pub base: CheckConfig,
    pub terms: Vec<TermRule>,
}

#[derive(Debug, Default)]
pub struct TextMatchDefinition {
    pub config: TextMatchConfig,
}

impl TextMatchDefinition {
    pub fn new(config: TextMatchConfig) -> Self {
        Self { config }
    }

    pub(super) fn choices(&self) -> Vec<ChoiceSpec> {
        vec![
            ChoiceSpec {
                choice: Choice::Accept,
                label_key: "redline-text-match-replace",
            },
            ChoiceSpec {
                choice: Choice::Dismiss,
                label_key: "redline-dismiss",
            },
        ]
    }

    pub(super) fn evaluate(&self, ctx: &DeriveContext<'_>) -> Vec<Arc<Check>> {
        let flags = ExtractFlags {
            content_ranges_only: true,
            pure_insertions_only: ctx.trigger == TriggerContext::DocumentChange,
            ..Default::default()
        };
        let ranges = ctx.extractor.modified_ranges(ctx.doc, flags);

        let mut hits: BTreeMap<&str, Vec<Range>> = BTreeMap::new();
        for range in &ranges {
            for rule in &self.config.terms {
                for hit in ctx.doc.find_text(*range, &rule.term) {
                    if !is_range_valid(hit, ctx.doc, &self.config.base) {
                        continue;
                    }
                    if ctx.tags.is_dismissed_range(NAME, hit, ctx.doc) {
                        continue;
                    }
                    hits.entry(rule.term.as_str()).or_default().push(hit);
                }
            }
        }

        let mut checks = Vec::new();
        for rule in &self.config.terms {
            let Some(occurrences) = hits.get(rule.term.as_str()) else {
                continue;
            };
            if occurrences.len() < rule.minimum_occurrences.max(1) {
                continue;
            }
            let fragments = occurrences
                .iter()
                .map(|r| Fragment::new(*r, ctx.doc.revision()))
                .collect();
            checks.push(Arc::new(Check::new(NAME, fragments, Severity::Notice)));
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
                // A check covers one term's occurrences; recover the rule
                // from the text of the first span.
                let mut ranges = check.current_ranges(doc);
                ranges.sort();
                let Some(first) = ranges.first() else {
                    return Ok(ActOutcome::Unchanged);
                };
                let matched = doc.text_of(*first);
                let Some(rule) = self.config.terms.iter().find(|r| r.term == matched) else {
                    return Ok(ActOutcome::Unchanged);
                };
                let Some(replacement) = &rule.replacement else {
                    return Ok(ActOutcome::Unchanged);
                };
                // Back to front so earlier spans stay addressable
                for range in ranges.iter().rev() {
                    doc.replace(*range, text_items(replacement));
                }
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
    use crate::document::paragraph;
    use crate::extract::RangeDiffExtractor;

    fn definition(terms: Vec<TermRule>) -> TextMatchDefinition {
        TextMatchDefinition::new(TextMatchConfig {
            base: CheckConfig::default(),
            terms,
        })
    }

    fn rule(term: &str, minimum: usize) -> TermRule {
        TermRule {
            term: term.to_string(),
            replacement: Some("fine".to_string()),
            minimum_occurrences: minimum,
        }
    }

    fn derive(def: &TextMatchDefinition, doc: &Document) -> Vec<Arc<Check>> {
        let extractor = RangeDiffExtractor::new();
        let tags = TagStore::new();
        let user = UserProfile::default();
        let ctx = DeriveContext {
            doc,
            extractor: &extractor,
            tags: &tags,
            trigger: TriggerContext::DocumentChange,
            mode: SessionMode::Check,
            user: &user,
        };
        def.evaluate(&ctx)
    }

    #[test]
    fn test_groups_occurrences_into_one_check() {
        let mut doc = Document::new();
        doc.insert(0, paragraph("very bad and very sad and very mad"));
        let def = definition(vec![rule("very", 1)]);
        let checks = derive(&def, &doc);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].fragments.len(), 3);
    }

    #[test]
    fn test_minimum_occurrences_gate() {
        let mut doc = Document::new();
        doc.insert(0, paragraph("just one very here"));
        let def = definition(vec![rule("very", 2)]);
        assert!(derive(&def, &doc).is_empty());

        let mut doc = Document::new();
        doc.insert(0, paragraph("very good, very bad"));
        let checks = derive(&def, &doc);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].fragments.len(), 2);
    }

    #[test]
    fn test_untouched_text_is_not_scanned() {
        // The term already sat in the document at load; no edits, no checks.
        let doc = Document::from_items(paragraph("very old prose"));
        let def = definition(vec![rule("very", 1)]);
        assert!(derive(&def, &doc).is_empty());
    }

    #[test]
    fn test_separate_terms_get_separate_checks() {
        let mut doc = Document::new();
        doc.insert(0, paragraph("clearly wrong and obviously fine"));
        let def = definition(vec![rule("clearly", 1), rule("obviously", 1)]);
        let checks = derive(&def, &doc);
        assert_eq!(checks.len(), 2);
    }
}
