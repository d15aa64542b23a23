//! Read-side report types: gate reports and currency reports
//!
//! Reports are value types rebuilt from the store's current snapshot on
//! every evaluation; they are never the source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::ContractId;

/// The three per-contract readiness gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Extraction,
    Review,
    Activation,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Extraction => "gate1_extraction",
            Self::Review => "gate2_review",
            Self::Activation => "gate3_activation",
        };
        write!(f, "{}", s)
    }
}

/// Pass/fail outcome of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Pass,
    Fail,
}

impl GateStatus {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// One reason a gate failed, with a stable code for UI and alerting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    pub gate: Gate,
    pub code: String,
    pub message: String,
}

impl Blocker {
    pub fn new(gate: Gate, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            gate,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Per-contract gate report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateReport {
    pub contract_id: ContractId,
    pub gate1_extraction: GateStatus,
    pub gate2_review: GateStatus,
    pub gate3_activation: GateStatus,
    pub blockers: Vec<Blocker>,
    pub evaluated_at: DateTime<Utc>,
}

impl GateReport {
    pub fn all_pass(&self) -> bool {
        self.gate1_extraction.is_pass()
            && self.gate2_review.is_pass()
            && self.gate3_activation.is_pass()
    }

    pub fn status_of(&self, gate: Gate) -> GateStatus {
        match gate {
            Gate::Extraction => self.gate1_extraction,
            Gate::Review => self.gate2_review,
            Gate::Activation => self.gate3_activation,
        }
    }
}

/// Portfolio-wide master gate over all active contracts in a product group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterGateReport {
    pub product_group: String,
    pub status: GateStatus,
    /// Union of all individual contract blockers.
    pub blockers: Vec<Blocker>,
    pub active_contracts: usize,
    pub total_contracts: usize,
    pub evaluated_at: DateTime<Utc>,
}

impl MasterGateReport {
    pub fn optimizer_may_run(&self) -> bool {
        self.status.is_pass()
    }
}

/// Freshness classification of one tracked item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyEntry {
    pub name: String,
    pub last_updated: DateTime<Utc>,
    pub current: bool,
}

/// Advisory freshness report over data sources and contract stamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyReport {
    pub product_group: String,
    pub sources: Vec<CurrencyEntry>,
    pub contracts: Vec<CurrencyEntry>,
    pub current_count: usize,
    pub stale_count: usize,
    pub all_current: bool,
    pub threshold_hours: i64,
    pub evaluated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_report_all_pass() {
        let report = GateReport {
            contract_id: ContractId::generate(),
            gate1_extraction: GateStatus::Pass,
            gate2_review: GateStatus::Pass,
            gate3_activation: GateStatus::Fail,
            blockers: vec![Blocker::new(
                Gate::Activation,
                "sap_not_validated",
                "SAP validation has not been run",
            )],
            evaluated_at: Utc::now(),
        };
        assert!(!report.all_pass());
        assert_eq!(report.status_of(Gate::Activation), GateStatus::Fail);
        assert_eq!(report.status_of(Gate::Extraction), GateStatus::Pass);
    }

    #[test]
    fn test_gate_display_names() {
        assert_eq!(Gate::Extraction.to_string(), "gate1_extraction");
        assert_eq!(Gate::Review.to_string(), "gate2_review");
        assert_eq!(Gate::Activation.to_string(), "gate3_activation");
    }
}
