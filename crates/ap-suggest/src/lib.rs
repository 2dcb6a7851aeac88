//! # ap-suggest
//!
//! The contract the draft lifecycle needs from the AI suggestion engine,
//! and a webhook client that speaks it over HTTP.
//!
//! The engine proposes an action list for an assessment run and revises it
//! in response to conversational refinement. How it produces suggestions is
//! its own business; only the request/response shapes are fixed here.

pub mod engine;
pub mod error;
pub mod webhook;

pub use engine::{
    GenerateRequest, GenerateResponse, RefineRequest, RefineResponse, SuggestionEngine,
    DEFAULT_REFINE_REPLY,
};
pub use error::EngineError;
pub use webhook::WebhookEngine;
