//! redline-core - Building blocks for in-editor edit checks
//!
//! This crate provides the pure, synchronous pieces of the redline engine:
//!
//! - A minimal linear [`Document`] model with an append-only transaction
//!   history and a small mutation API
//! - [`Range`] / [`Fragment`] span arithmetic, including projection of old
//!   spans through later edits
//! - The [`RangeDiffExtractor`], which folds the edit history and recovers
//!   the ranges of newly-inserted content
//! - Applicability classifiers: section scoping
//!   ([`section::is_range_in_valid_section`]), quotation detection
//!   ([`quote::is_offset_quoted`]), and the [`CheckConfig`] gates
//! - The session-scoped [`TagStore`] for dismissed/accepted verdicts
//! - The closed set of [`CheckDefinition`] rules that derive [`Check`]s
//!
//! # Deriving checks
//!
//! ```
//! use redline_core::document::{Document, paragraph};
//! use redline_core::{
//!     CheckDefinition, CiteNeededDefinition, DeriveContext, RangeDiffExtractor, SessionMode,
//!     TagStore, TriggerContext, UserProfile,
//! };
//!
//! let mut doc = Document::new();
//! doc.insert(0, paragraph(
//!     "A bold new claim about the world, typed in wholesale and lacking any source.",
//! ));
//!
//! let definition = CheckDefinition::CiteNeeded(CiteNeededDefinition::default());
//! let extractor = RangeDiffExtractor::new();
//! let tags = TagStore::new();
//! let user = UserProfile::default();
//! let ctx = DeriveContext {
//!     doc: &doc,
//!     extractor: &extractor,
//!     tags: &tags,
//!     trigger: TriggerContext::DocumentChange,
//!     mode: SessionMode::Check,
//!     user: &user,
//! };
//! let checks = definition.evaluate(&ctx);
//! assert_eq!(checks.len(), 1);
//! ```
//!
//! Reconciliation and the review workflow live in the `redline` crate; this
//! crate never spawns tasks, takes locks across calls, or touches I/O.

pub mod check;
pub mod config;
pub mod definitions;
pub mod document;
pub mod extract;
pub mod history;
pub mod quote;
pub mod range;
pub mod section;
pub mod tags;

pub use check::{Check, ScrollHint, Severity, UiState};
pub use config::{
    AccountGate, CheckConfig, ConfigOverride, SectionFilter, SessionMode, TriggerContext,
    UserProfile,
};
pub use definitions::{
    ActOutcome, BareReferenceConfig, BareReferenceDefinition, CheckDefinition, Choice, ChoiceSpec,
    CiteNeededConfig, CiteNeededDefinition, DeriveContext, TermRule, TextMatchConfig,
    TextMatchDefinition,
};
pub use document::{Document, Heading, Item, NodeKind, ReferenceNode};
pub use extract::{ExtractFlags, RangeDiffExtractor};
pub use history::{Operation, Transaction};
pub use range::Range;
pub use tags::{Fragment, Tag, TagStore};
