//! Covenant strict gate evaluator.
//!
//! Three sequential per-contract gates plus one portfolio master gate:
//!
//! 1. **Extraction** — template completeness and no missing required fields
//! 2. **Review** — legal approval
//! 3. **Activation** — SAP reconciliation ran clean, contract not superseded
//!
//! All evaluation is read-side and pure; the evaluator never mutates the
//! contract store.

pub mod evaluator;

pub use evaluator::{GateEvaluator, MIN_TEMPLATE_COMPLETENESS};
