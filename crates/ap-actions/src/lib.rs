//! # ap-actions
//!
//! Persisted, trackable remediation actions.
//!
//! A [`ConfirmedAction`] is created one-to-one from a draft action when an
//! action plan is confirmed. Once created it is independent of the draft.
//!
//! - [`NewAction`]: the fields required to create an action
//! - [`ActionStore`]: persistence contract; [`JsonActionStore`] stores each
//!   action as a JSON file with sequential numeric ids

pub mod action;
pub mod error;
pub mod store;

pub use action::{ActionSource, ActionStatus, ConfirmedAction, NewAction};
pub use error::ActionStoreError;
pub use store::{ActionStore, JsonActionStore};
