//! Constraint bridge: maps approved clauses onto solver input overrides.
//!
//! Preview is a pure function: it never mutates the store or the inputs.
//! Applying overrides is a separate, explicit operation and is never
//! invoked implicitly during preview.
//!
//! Override ordering is a documented policy, not an accident of iteration:
//! contracts are evaluated in ascending approval order, so on conflicting
//! parameters the later-approved contract's override wins.

use serde::{Deserialize, Serialize};
use tracing::debug;

use covenant_gate::GateEvaluator;
use covenant_types::{Clause, ComparisonOp, Contract, ContractId};

use crate::solver::SolverInputs;

/// One row of the preview: what a solver input would become under a clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintPreviewRow {
    pub contract_id: ContractId,
    pub counterparty: String,
    pub clause_label: String,
    pub parameter: String,
    pub operator: ComparisonOp,
    pub current_value: f64,
    pub proposed_value: f64,
    pub would_change: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Maps contractual clauses to solver input overrides.
#[derive(Clone, Debug, Default)]
pub struct ConstraintBridge {
    gate_evaluator: GateEvaluator,
}

impl ConstraintBridge {
    pub fn new() -> Self {
        Self {
            gate_evaluator: GateEvaluator::new(),
        }
    }

    /// Preview the overrides all active, gate-passing contracts would
    /// apply to `inputs`.
    ///
    /// Idempotent and side-effect free: the same inputs and contracts
    /// always produce the same rows, and `inputs` is never mutated.
    /// Clauses without a parameter matching a solver input are skipped.
    pub fn preview_constraints(
        &self,
        inputs: &SolverInputs,
        contracts: &[Contract],
    ) -> Vec<ConstraintPreviewRow> {
        let mut working = inputs.clone();
        self.walk_overrides(&mut working, contracts)
    }

    /// Apply the overrides into `inputs`. The explicit counterpart of
    /// `preview_constraints`; returns the rows that were applied.
    pub fn apply_constraints(
        &self,
        inputs: &mut SolverInputs,
        contracts: &[Contract],
    ) -> Vec<ConstraintPreviewRow> {
        let rows = self.walk_overrides(inputs, contracts);
        debug!(applied = rows.len(), "constraint overrides applied");
        rows
    }

    /// Walk contracts in ascending approval order, folding each mappable
    /// clause into the working inputs. Later contracts see (and may
    /// overwrite) earlier contracts' overrides.
    fn walk_overrides(
        &self,
        working: &mut SolverInputs,
        contracts: &[Contract],
    ) -> Vec<ConstraintPreviewRow> {
        let mut ordered: Vec<&Contract> = contracts
            .iter()
            .filter(|c| c.is_active() && self.gate_evaluator.evaluate(c).all_pass())
            .collect();
        ordered.sort_by_key(|c| (c.approved_at, c.created_at));

        let mut rows = Vec::new();
        for contract in ordered {
            for clause in &contract.clauses {
                if let Some(row) = override_row(contract, clause, working) {
                    working
                        .variables
                        .insert(row.parameter.clone(), row.proposed_value);
                    rows.push(row);
                }
            }
        }
        rows
    }
}

/// Compute the override a single clause applies to the working inputs.
///
/// Operator semantics: `>=` and `<=` clamp, `==` overrides, `between`
/// clamps into the range.
fn override_row(
    contract: &Contract,
    clause: &Clause,
    working: &SolverInputs,
) -> Option<ConstraintPreviewRow> {
    let parameter = clause.terms.parameter.as_deref()?;
    let operator = clause.terms.operator?;
    let value = clause.terms.value?;
    // Only parameters that resolve to an actual solver input participate
    let current_value = working.get(parameter)?;

    let proposed_value = match operator {
        ComparisonOp::Gte => current_value.max(value),
        ComparisonOp::Lte => current_value.min(value),
        ComparisonOp::Eq => value,
        ComparisonOp::Between => {
            let upper = clause.terms.value_upper?;
            current_value.clamp(value, upper)
        }
    };

    Some(ConstraintPreviewRow {
        contract_id: contract.id,
        counterparty: contract.counterparty.clone(),
        clause_label: clause.clause_id.clone(),
        parameter: parameter.to_string(),
        operator,
        current_value,
        proposed_value,
        would_change: proposed_value != current_value,
        unit: clause.terms.unit.clone(),
    })
}
