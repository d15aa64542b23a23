//! Solver service boundary.
//!
//! The LP solver is an external collaborator consumed as an opaque
//! `solve(inputs) -> result` service. An unreachable or failing solver is
//! downgraded to an explicit `Unavailable` status so callers can tell
//! "checked and failed" from "not yet checked".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Named solver input variables for one product group.
///
/// A `BTreeMap` keeps iteration (and therefore previews and logs)
/// deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SolverInputs {
    pub variables: BTreeMap<String, f64>,
}

impl SolverInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: f64) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }
}

/// Terminal status of a solve run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unavailable { reason: String },
}

/// Full solver output for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub profit: f64,
    pub tons: f64,
    pub roi: f64,
    pub route_tons: BTreeMap<String, f64>,
    pub route_profits: BTreeMap<String, f64>,
    pub margins: BTreeMap<String, f64>,
    pub shadow_prices: BTreeMap<String, f64>,
}

impl SolveResult {
    /// Empty result carrying an unavailability reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            status: SolveStatus::Unavailable {
                reason: reason.into(),
            },
            profit: 0.0,
            tons: 0.0,
            roi: 0.0,
            route_tons: BTreeMap::new(),
            route_profits: BTreeMap::new(),
            margins: BTreeMap::new(),
            shadow_prices: BTreeMap::new(),
        }
    }
}

/// Errors from the solver service.
#[derive(Error, Debug, Clone)]
pub enum SolverError {
    #[error("solver unreachable: {0}")]
    Unreachable(String),

    #[error("solve timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// The opaque optimization service.
#[async_trait]
pub trait SolverService: Send + Sync {
    async fn solve(
        &self,
        product_group: &str,
        inputs: &SolverInputs,
    ) -> Result<SolveResult, SolverError>;
}

/// Run a solve, downgrading service errors to an `Unavailable` result.
pub async fn solve_or_unavailable(
    solver: &dyn SolverService,
    product_group: &str,
    inputs: &SolverInputs,
) -> SolveResult {
    match solver.solve(product_group, inputs).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(product_group, error = %e, "solver unavailable");
            SolveResult::unavailable(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OfflineSolver;

    #[async_trait]
    impl SolverService for OfflineSolver {
        async fn solve(
            &self,
            _product_group: &str,
            _inputs: &SolverInputs,
        ) -> Result<SolveResult, SolverError> {
            Err(SolverError::Unreachable("connection refused".into()))
        }
    }

    struct FixedSolver(SolveResult);

    #[async_trait]
    impl SolverService for FixedSolver {
        async fn solve(
            &self,
            _product_group: &str,
            _inputs: &SolverInputs,
        ) -> Result<SolveResult, SolverError> {
            Ok(self.0.clone())
        }
    }

    fn optimal_result() -> SolveResult {
        SolveResult {
            status: SolveStatus::Optimal,
            profit: 1_250_000.0,
            tons: 48_000.0,
            roi: 0.18,
            route_tons: BTreeMap::from([("rotterdam".into(), 48_000.0)]),
            route_profits: BTreeMap::from([("rotterdam".into(), 1_250_000.0)]),
            margins: BTreeMap::new(),
            shadow_prices: BTreeMap::from([("annual_qty".into(), 26.0)]),
        }
    }

    #[tokio::test]
    async fn test_solver_failure_downgrades_to_unavailable() {
        let inputs = SolverInputs::new().with_variable("annual_qty", 5000.0);
        let result = solve_or_unavailable(&OfflineSolver, "thermal_coal", &inputs).await;

        match result.status {
            SolveStatus::Unavailable { reason } => {
                // "checked and failed" carries the reason forward
                assert!(reason.contains("unreachable"));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
        assert_eq!(result.profit, 0.0);
        assert!(result.route_tons.is_empty());
    }

    #[tokio::test]
    async fn test_successful_solve_passes_through() {
        let solver = FixedSolver(optimal_result());
        let result =
            solve_or_unavailable(&solver, "thermal_coal", &SolverInputs::new()).await;
        assert_eq!(result, optimal_result());
        assert_eq!(result.status, SolveStatus::Optimal);
    }

    #[tokio::test]
    async fn test_timeout_reason_preserved() {
        struct SlowSolver;

        #[async_trait]
        impl SolverService for SlowSolver {
            async fn solve(
                &self,
                _product_group: &str,
                _inputs: &SolverInputs,
            ) -> Result<SolveResult, SolverError> {
                Err(SolverError::Timeout { seconds: 30 })
            }
        }

        let result =
            solve_or_unavailable(&SlowSolver, "petcoke", &SolverInputs::new()).await;
        assert_eq!(
            result.status,
            SolveStatus::Unavailable {
                reason: "solve timed out after 30s".into()
            }
        );
    }
}
