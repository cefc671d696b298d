//! redline - an edit check engine for live documents
//!
//! This crate wires the `redline-core` building blocks into a running
//! engine:
//!
//! - [`Session`] is the dependency-injected registry built when review
//!   starts: definitions, dismissal tags, and shared derivation caches
//! - [`Reconciler`] keeps one check list per trigger context and diffs
//!   re-derivations against it with identity reuse
//! - [`ReviewWorkflow`] walks the reconciled list and serializes user
//!   actions
//! - [`Engine`] is the async shell: debounced document-change recomputes,
//!   the blocking pre-save gate, and the event broadcast the UI subscribes
//!   to
//!
//! # Driving the engine
//!
//! ```no_run
//! use redline::{Engine, FocusPolicy, Session};
//! use redline_core::document::{Document, paragraph};
//! use redline_core::{
//!     CheckDefinition, Choice, CiteNeededDefinition, SessionMode, TriggerContext, UserProfile,
//! };
//!
//! # async fn demo() {
//! let session = Session::new(
//!     vec![CheckDefinition::CiteNeeded(CiteNeededDefinition::default())],
//!     UserProfile::default(),
//!     SessionMode::Check,
//! );
//! let engine = Engine::new(
//!     session,
//!     Document::new(),
//!     TriggerContext::BeforeSave,
//!     FocusPolicy::Required,
//! );
//! let mut events = engine.subscribe();
//!
//! // the host edits the document...
//! engine.edit(|doc| doc.insert(0, paragraph("a long unsourced claim..."))).await;
//!
//! // ...and gates its save on the pre-save pass
//! let checks = engine.run_presave().await;
//! if !checks.is_empty() {
//!     engine.set_current_offset(0).await;
//!     engine.act(Choice::Accept).await;
//! }
//! # let _ = events.recv();
//! # }
//! ```

pub mod engine;
pub mod event;
pub mod reconciler;
pub mod session;
pub mod workflow;

pub use engine::Engine;
pub use event::EngineEvent;
pub use reconciler::{ChecksUpdate, Reconciler};
pub use session::Session;
pub use workflow::{CloseReason, FocusPolicy, ReviewWorkflow, WorkflowState};
