//! # ap-lifecycle
//!
//! The action plan draft lifecycle controller.
//!
//! A [`DraftController`] is bound to one (assessment run, project) pair and
//! is the only mutator of that draft's in-memory state. It turns a completed
//! assessment into a reviewable proposal, lets a reviewer refine it through
//! conversation and edit it by hand, autosaves it, and finally commits it as
//! tracked actions.
//!
//! ## Key components
//!
//! - [`ControllerPhase`]: NoDraft → Generating → Active ⇄ Refining
//!   → Confirming → Confirmed, with Active → Generating for regeneration
//! - [`DraftController`]: the orchestration of engine, draft store and
//!   action store calls
//! - [`AutosaveLease`]: the periodic save timer, owned explicitly
//! - [`DraftEvent`] / [`EventDispatcher`]: lifecycle notifications
//! - [`PlannerConfig`]: on-disk layout and `config.toml` settings

pub mod autosave;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod phase;
pub mod view;

pub use autosave::AutosaveLease;
pub use config::{ConfigError, PlannerConfig, Settings};
pub use controller::{DraftController, RefineOutcome, SaveOutcome};
pub use error::LifecycleError;
pub use events::{DraftEvent, EventDispatcher, LogSink, NotificationSink};
pub use phase::ControllerPhase;
pub use view::{quick_prompts, WorkspaceView};
