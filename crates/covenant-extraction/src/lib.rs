//! Covenant extraction engine.
//!
//! Converts free-text commodity trading contracts into typed LP clauses via
//! a two-stage pipeline: a fast model transcribes facts into a fixed schema,
//! then a stronger model formulates clauses strictly from those facts.
//! Model backends are pluggable and injected; every failure mode degrades
//! to a simpler strategy or a clauseless result, never an aborted ingestion.

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod facts;
pub mod mocks;
pub mod prompts;
pub mod recover;

pub use backend::{HttpModelBackend, ModelBackend, DEFAULT_TIMEOUT_SECS};
pub use config::{ModelRoles, DEFAULT_MAX_TOKENS, SINGLE_STAGE_CHAR_BUDGET, STAGE_ONE_CHAR_BUDGET};
pub use engine::ExtractionEngine;
pub use error::{ExtractionError, ModelError};
pub use facts::ContractFacts;
pub use mocks::{FailingModel, ScriptedModel};
