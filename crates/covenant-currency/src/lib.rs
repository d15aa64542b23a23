//! Covenant currency tracker.
//!
//! Freshness stamps per data source and per contract, classified against a
//! staleness threshold. Read-side and advisory: a stale portfolio never
//! blocks a gate, it informs the operator's trust in one.

pub mod tracker;

pub use tracker::{CurrencyTracker, DEFAULT_STALENESS_HOURS};
