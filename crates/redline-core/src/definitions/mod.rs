//! Check definitions: the closed set of rules that derive checks.
//!
//! Every rule is one variant of [`CheckDefinition`], dispatching a fixed
//! capability set: evaluate, act, title/footer message keys, and the choice
//! set the UI offers. Definitions receive everything they need through
//! [`DeriveContext`]; there is no global registry.

mod bare_reference;
mod cite_needed;
mod text_match;

pub use bare_reference::{BareReferenceConfig, BareReferenceDefinition};
pub use cite_needed::{CiteNeededConfig, CiteNeededDefinition};
pub use text_match::{TermRule, TextMatchConfig, TextMatchDefinition};

use std::sync::Arc;

use eyre::Result;

use crate::check::Check;
use crate::config::{CheckConfig, SessionMode, TriggerContext, UserProfile};
use crate::document::Document;
use crate::extract::RangeDiffExtractor;
use crate::quote::is_offset_quoted;
use crate::range::Range;
use crate::section::is_range_in_valid_section;
use crate::tags::TagStore;

/// A user's verdict on a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Accept,
    Reject,
    Dismiss,
}

impl Choice {
    /// Constructive choices change the document; the rest record a verdict.
    pub fn is_constructive(&self) -> bool {
        matches!(self, Choice::Accept)
    }
}

/// One entry of a definition's choice set, with its message key.
#[derive(Debug, Clone, Copy)]
pub struct ChoiceSpec {
    pub choice: Choice,
    pub label_key: &'static str,
}

/// What an action did to the document, so the caller knows whether to
/// re-derive immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActOutcome {
    Changed,
    Unchanged,
}

/// Everything a definition may consult while deriving candidates.
pub struct DeriveContext<'a> {
    pub doc: &'a Document,
    pub extractor: &'a RangeDiffExtractor,
    pub tags: &'a TagStore,
    pub trigger: TriggerContext,
    pub mode: SessionMode,
    pub user: &'a UserProfile,
}

/// Section and quotation gating shared by range-based definitions.
pub(crate) fn is_range_valid(range: Range, doc: &Document, config: &CheckConfig) -> bool {
    if !is_range_in_valid_section(range, doc, config) {
        return false;
    }
    if config.ignore_quoted_content
        && !range.is_empty()
        && is_offset_quoted(range.end - 1, doc)
    {
        return false;
    }
    true
}

/// The closed set of check rules.
#[derive(Debug)]
pub enum CheckDefinition {
    CiteNeeded(CiteNeededDefinition),
    TextMatch(TextMatchDefinition),
    BareReference(BareReferenceDefinition),
}

impl CheckDefinition {
    pub fn name(&self) -> &'static str {
        match self {
            CheckDefinition::CiteNeeded(_) => cite_needed::NAME,
            CheckDefinition::TextMatch(_) => text_match::NAME,
            CheckDefinition::BareReference(_) => bare_reference::NAME,
        }
    }

    pub fn config(&self) -> &CheckConfig {
        match self {
            CheckDefinition::CiteNeeded(d) => &d.config.base,
            CheckDefinition::TextMatch(d) => &d.config.base,
            CheckDefinition::BareReference(d) => &d.config.base,
        }
    }

    /// Message key for the check's title.
    pub fn title_key(&self) -> &'static str {
        match self {
            CheckDefinition::CiteNeeded(_) => "redline-cite-needed-title",
            CheckDefinition::TextMatch(_) => "redline-text-match-title",
            CheckDefinition::BareReference(_) => "redline-bare-reference-title",
        }
    }

    /// Message key for the check's footer, if the definition has one.
    pub fn footer_key(&self) -> Option<&'static str> {
        match self {
            CheckDefinition::CiteNeeded(_) => Some("redline-cite-needed-footer"),
            CheckDefinition::TextMatch(_) => None,
            CheckDefinition::BareReference(_) => Some("redline-bare-reference-footer"),
        }
    }

    /// The verdicts this definition offers, in display order.
    pub fn choices(&self) -> Vec<ChoiceSpec> {
        match self {
            CheckDefinition::CiteNeeded(d) => d.choices(),
            CheckDefinition::TextMatch(d) => d.choices(),
            CheckDefinition::BareReference(d) => d.choices(),
        }
    }

    /// Derive this definition's candidate checks for the current document.
    pub fn evaluate(&self, ctx: &DeriveContext<'_>) -> Vec<Arc<Check>> {
        match self {
            CheckDefinition::CiteNeeded(d) => d.evaluate(ctx),
            CheckDefinition::TextMatch(d) => d.evaluate(ctx),
            CheckDefinition::BareReference(d) => d.evaluate(ctx),
        }
    }

    /// Apply a user verdict: mutate the document or record a tag.
    pub async fn act(
        &self,
        choice: Choice,
        check: &Check,
        doc: &mut Document,
        tags: &mut TagStore,
    ) -> Result<ActOutcome> {
        match self {
            CheckDefinition::CiteNeeded(d) => d.act(choice, check, doc, tags).await,
            CheckDefinition::TextMatch(d) => d.act(choice, check, doc, tags).await,
            CheckDefinition::BareReference(d) => d.act(choice, check, doc, tags).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckConfig;
    use crate::document::{heading, paragraph};

    #[test]
    fn test_is_range_valid_combines_section_and_quote() {
        let mut items = paragraph("plain \"quoted run\" more");
        items.extend(heading(2, "Notes"));
        items.extend(paragraph("noted"));
        let doc = Document::from_items(items);
        let config = CheckConfig::default();

        // inside the quoted run of the lead paragraph
        assert!(!is_range_valid(Range::new(8, 12), &doc, &config));
        // plain prose before the quote
        assert!(is_range_valid(Range::new(1, 6), &doc, &config));

        let mut ignoring = CheckConfig::default();
        ignoring.ignore_sections = vec!["Notes".to_string()];
        let under_notes = doc.len() - 3;
        assert!(!is_range_valid(
            Range::new(under_notes, under_notes + 1),
            &doc,
            &ignoring
        ));
    }
}
