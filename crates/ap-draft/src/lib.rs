//! # ap-draft
//!
//! Data model and persistence for action plan drafts.
//!
//! A [`Draft`] is the editable, pre-commit proposal of remediation actions
//! produced for one assessment run. It holds an ordered list of
//! [`DraftAction`]s and the refinement conversation that shaped them.
//!
//! ## Key components
//!
//! - [`Draft`] / [`DraftStatus`]: the persisted record and its lifecycle
//!   (Generating → Active → Confirmed, or Superseded by a newer generation)
//! - [`DraftAction`] / [`ActionPatch`]: positional entries and partial updates
//! - [`ConversationEntry`]: one turn of the refinement conversation
//! - [`DraftStore`]: the persistence contract, with [`JsonDraftStore`] as the
//!   file-backed implementation

pub mod action;
pub mod conversation;
pub mod draft;
pub mod error;
pub mod store;

pub use action::{group_by_category, ActionOrigin, ActionPatch, DraftAction, Priority};
pub use conversation::{history_window, ConversationEntry, Role};
pub use draft::{Draft, DraftStatus};
pub use error::DraftError;
pub use store::{DraftStore, JsonDraftStore};

/// Identifier of an assessment run in the relational store.
pub type AssessmentRunId = i64;

/// Identifier of a project in the relational store.
pub type ProjectId = i64;

/// Identifier of a user in the relational store.
pub type UserId = i64;
