//! Covenant constraint bridge.
//!
//! Maps approved, gate-passing contracts' clauses onto concrete overrides
//! of solver input variables: a side-effect-free preview, a separate
//! explicit apply, and the opaque solver service boundary.

pub mod bridge;
pub mod solver;

pub use bridge::{ConstraintBridge, ConstraintPreviewRow};
pub use solver::{
    solve_or_unavailable, SolveResult, SolveStatus, SolverError, SolverInputs, SolverService,
};
