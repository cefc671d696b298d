//! Common test utilities.

#![allow(dead_code)]

use redline::{Engine, FocusPolicy, Session};
use redline_core::document::{Document, paragraph};
use redline_core::{
    BareReferenceDefinition, CheckDefinition, CiteNeededDefinition, SessionMode, TermRule,
    TextMatchConfig, TextMatchDefinition, TriggerContext, UserProfile,
};

/// A claim comfortably past the default minimum-characters threshold.
pub const LONG_CLAIM: &str =
    "The committee was founded in 1987 and has overseen every major revision of the standard since then.";

/// Honor RUST_LOG in test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A session with every definition at its defaults.
pub fn full_session() -> Session {
    init_tracing();
    Session::new(
        vec![
            CheckDefinition::CiteNeeded(CiteNeededDefinition::default()),
            CheckDefinition::TextMatch(TextMatchDefinition::new(TextMatchConfig {
                terms: vec![TermRule {
                    term: "very".to_string(),
                    replacement: Some("".to_string()),
                    minimum_occurrences: 1,
                }],
                ..Default::default()
            })),
            CheckDefinition::BareReference(BareReferenceDefinition::default()),
        ],
        UserProfile::default(),
        SessionMode::Check,
    )
}

/// A session running only the citation rule.
pub fn cite_session() -> Session {
    init_tracing();
    Session::new(
        vec![CheckDefinition::CiteNeeded(CiteNeededDefinition::default())],
        UserProfile::default(),
        SessionMode::Check,
    )
}

/// An engine reviewing the pre-save context, starting from an empty
/// document.
pub fn presave_engine(session: Session) -> Engine {
    Engine::new(
        session,
        Document::new(),
        TriggerContext::BeforeSave,
        FocusPolicy::Required,
    )
}

/// A document already holding one long uncited paragraph.
pub fn doc_with_claim() -> Document {
    let mut doc = Document::new();
    doc.insert(0, paragraph(LONG_CLAIM));
    doc
}
