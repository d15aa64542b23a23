//! Gate evaluator: pass/fail readiness checks over contract snapshots.
//!
//! The evaluator is a pure function of store state. It never mutates a
//! contract and holds no state of its own; reports are rebuilt from the
//! current snapshot on every call. Absence of evidence fails a gate: a
//! contract whose SAP validation never ran fails Gate 3, it does not pass
//! by default.

use chrono::Utc;
use tracing::debug;

use covenant_types::{
    Blocker, Contract, ContractStatus, Gate, GateReport, GateStatus, MasterGateReport,
};

/// Minimum fraction of required template fields that must be present for
/// Gate 1 to pass.
pub const MIN_TEMPLATE_COMPLETENESS: f64 = 0.8;

/// Evaluates the three per-contract gates and the portfolio master gate.
#[derive(Clone, Debug, Default)]
pub struct GateEvaluator;

impl GateEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Gate 1 (extraction quality): template completeness meets the
    /// threshold and no finding is `missing_required`.
    pub fn gate1_extraction(&self, contract: &Contract) -> (GateStatus, Vec<Blocker>) {
        let mut blockers = Vec::new();
        match &contract.template_validation {
            None => {
                blockers.push(Blocker::new(
                    Gate::Extraction,
                    "template_not_validated",
                    "template validation has not been run",
                ));
            }
            Some(summary) => {
                if summary.completeness < MIN_TEMPLATE_COMPLETENESS {
                    blockers.push(Blocker::new(
                        Gate::Extraction,
                        "low_template_completeness",
                        format!(
                            "template completeness {:.0}% below required {:.0}%",
                            summary.completeness * 100.0,
                            MIN_TEMPLATE_COMPLETENESS * 100.0
                        ),
                    ));
                }
                for finding in &summary.findings {
                    if finding.severity == covenant_types::FindingSeverity::MissingRequired {
                        blockers.push(Blocker::new(
                            Gate::Extraction,
                            format!("missing_required_field:{}", finding.code),
                            finding.message.clone(),
                        ));
                    }
                }
            }
        }
        (status_from(&blockers), blockers)
    }

    /// Gate 2 (legal review): the contract is approved.
    pub fn gate2_review(&self, contract: &Contract) -> (GateStatus, Vec<Blocker>) {
        let mut blockers = Vec::new();
        if contract.status != ContractStatus::Approved {
            blockers.push(Blocker::new(
                Gate::Review,
                "not_approved",
                format!("contract status is '{}', not 'approved'", contract.status),
            ));
        }
        (status_from(&blockers), blockers)
    }

    /// Gate 3 (operational activation): SAP validation has run, found no
    /// high-severity discrepancy, and the contract is not superseded.
    pub fn gate3_activation(&self, contract: &Contract) -> (GateStatus, Vec<Blocker>) {
        let mut blockers = Vec::new();
        if contract.status == ContractStatus::Superseded {
            blockers.push(Blocker::new(
                Gate::Activation,
                "superseded",
                "contract has been superseded by a newer version",
            ));
        }
        if !contract.sap_validated {
            blockers.push(Blocker::new(
                Gate::Activation,
                "sap_not_validated",
                "SAP validation has not been run",
            ));
        }
        for discrepancy in &contract.sap_discrepancies {
            if discrepancy.is_high() {
                blockers.push(Blocker::new(
                    Gate::Activation,
                    format!("sap_high_discrepancy:{}", discrepancy.field),
                    discrepancy.message.clone(),
                ));
            }
        }
        (status_from(&blockers), blockers)
    }

    /// Full per-contract gate report.
    pub fn evaluate(&self, contract: &Contract) -> GateReport {
        let (gate1, mut blockers) = self.gate1_extraction(contract);
        let (gate2, b2) = self.gate2_review(contract);
        let (gate3, b3) = self.gate3_activation(contract);
        blockers.extend(b2);
        blockers.extend(b3);

        debug!(
            contract_id = %contract.id,
            gate1 = ?gate1,
            gate2 = ?gate2,
            gate3 = ?gate3,
            "gate evaluation"
        );

        GateReport {
            contract_id: contract.id,
            gate1_extraction: gate1,
            gate2_review: gate2,
            gate3_activation: gate3,
            blockers,
            evaluated_at: Utc::now(),
        }
    }

    /// Portfolio master gate over one product group.
    ///
    /// Pass iff every active (approved, non-superseded) contract passes all
    /// three gates. Blockers are the union of the individual contracts'
    /// blockers, each already tagged with its originating gate.
    pub fn master_gate(&self, product_group: &str, contracts: &[Contract]) -> MasterGateReport {
        let total_contracts = contracts.len();
        let mut blockers = Vec::new();
        let mut active_contracts = 0;

        for contract in contracts.iter().filter(|c| c.is_active()) {
            active_contracts += 1;
            let report = self.evaluate(contract);
            if !report.all_pass() {
                blockers.extend(report.blockers);
            }
        }

        let status = status_from(&blockers);
        MasterGateReport {
            product_group: product_group.to_string(),
            status,
            blockers,
            active_contracts,
            total_contracts,
            evaluated_at: Utc::now(),
        }
    }
}

fn status_from(blockers: &[Blocker]) -> GateStatus {
    if blockers.is_empty() {
        GateStatus::Pass
    } else {
        GateStatus::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_types::{
        CounterpartyType, DiscrepancySeverity, FindingSeverity, SapDiscrepancy, ValidationSummary,
    };

    fn contract() -> Contract {
        Contract::new(
            "Glencore AG",
            CounterpartyType::Supplier,
            "thermal_coal",
            "supply_frame",
            "TradeCo EU",
        )
    }

    fn ready_contract() -> Contract {
        let mut c = contract();
        c.status = ContractStatus::Approved;
        c.template_validation = Some(ValidationSummary::new(0.95));
        c.sap_validated = true;
        c
    }

    #[test]
    fn test_gate1_requires_validation_run() {
        let evaluator = GateEvaluator::new();
        let (status, blockers) = evaluator.gate1_extraction(&contract());
        assert_eq!(status, GateStatus::Fail);
        assert_eq!(blockers[0].code, "template_not_validated");
    }

    #[test]
    fn test_gate1_completeness_threshold() {
        let evaluator = GateEvaluator::new();
        let mut c = contract();

        c.template_validation = Some(ValidationSummary::new(0.5));
        let (status, blockers) = evaluator.gate1_extraction(&c);
        assert_eq!(status, GateStatus::Fail);
        assert_eq!(blockers[0].code, "low_template_completeness");

        c.template_validation = Some(ValidationSummary::new(0.9));
        let (status, _) = evaluator.gate1_extraction(&c);
        assert_eq!(status, GateStatus::Pass);
    }

    #[test]
    fn test_gate1_missing_required_blocks() {
        let evaluator = GateEvaluator::new();
        let mut c = contract();
        c.template_validation = Some(ValidationSummary::new(0.95).with_finding(
            "incoterm",
            FindingSeverity::MissingRequired,
            "incoterm not found in extracted fields",
        ));
        let (status, blockers) = evaluator.gate1_extraction(&c);
        assert_eq!(status, GateStatus::Fail);
        assert_eq!(blockers[0].code, "missing_required_field:incoterm");
        assert_eq!(blockers[0].gate, Gate::Extraction);
    }

    #[test]
    fn test_gate1_warnings_do_not_block() {
        let evaluator = GateEvaluator::new();
        let mut c = contract();
        c.template_validation = Some(ValidationSummary::new(0.95).with_finding(
            "short_description",
            FindingSeverity::Warning,
            "clause description unusually short",
        ));
        let (status, _) = evaluator.gate1_extraction(&c);
        assert_eq!(status, GateStatus::Pass);
    }

    #[test]
    fn test_gate2_tracks_status() {
        let evaluator = GateEvaluator::new();
        let mut c = contract();
        assert_eq!(evaluator.gate2_review(&c).0, GateStatus::Fail);

        c.status = ContractStatus::Approved;
        assert_eq!(evaluator.gate2_review(&c).0, GateStatus::Pass);
    }

    #[test]
    fn test_gate3_absence_of_evidence_fails() {
        let evaluator = GateEvaluator::new();
        let c = contract();
        let (status, blockers) = evaluator.gate3_activation(&c);
        assert_eq!(status, GateStatus::Fail);
        assert!(blockers.iter().any(|b| b.code == "sap_not_validated"));
    }

    #[test]
    fn test_gate3_high_discrepancy_blocks() {
        let evaluator = GateEvaluator::new();
        let mut c = ready_contract();
        c.sap_discrepancies.push(SapDiscrepancy {
            field: "price".into(),
            severity: DiscrepancySeverity::High,
            contract_value: "450".into(),
            external_value: "412".into(),
            message: "base price differs from SAP condition record".into(),
        });
        let (status, blockers) = evaluator.gate3_activation(&c);
        assert_eq!(status, GateStatus::Fail);
        assert_eq!(blockers[0].code, "sap_high_discrepancy:price");

        // Low-severity discrepancies alone do not block
        c.sap_discrepancies[0].severity = DiscrepancySeverity::Other;
        let (status, _) = evaluator.gate3_activation(&c);
        assert_eq!(status, GateStatus::Pass);
    }

    #[test]
    fn test_full_report_ready_contract() {
        let evaluator = GateEvaluator::new();
        let report = evaluator.evaluate(&ready_contract());
        assert!(report.all_pass());
        assert!(report.blockers.is_empty());
    }

    #[test]
    fn test_master_gate_fails_on_missing_sap_run() {
        let evaluator = GateEvaluator::new();
        let mut unvalidated = ready_contract();
        unvalidated.sap_validated = false;
        let contracts = vec![ready_contract(), unvalidated];

        let master = evaluator.master_gate("thermal_coal", &contracts);
        assert_eq!(master.status, GateStatus::Fail);
        assert!(master
            .blockers
            .iter()
            .any(|b| b.code == "sap_not_validated"));
        assert_eq!(master.active_contracts, 2);
        assert_eq!(master.total_contracts, 2);
        assert!(!master.optimizer_may_run());
    }

    #[test]
    fn test_master_gate_passes_when_all_ready() {
        let evaluator = GateEvaluator::new();
        let contracts = vec![ready_contract(), ready_contract()];
        let master = evaluator.master_gate("thermal_coal", &contracts);
        assert_eq!(master.status, GateStatus::Pass);
        assert!(master.optimizer_may_run());
    }

    #[test]
    fn test_master_gate_ignores_inactive_contracts() {
        let evaluator = GateEvaluator::new();
        // Draft contract with no validation at all; it is not active so it
        // cannot block the portfolio
        let contracts = vec![ready_contract(), contract()];
        let master = evaluator.master_gate("thermal_coal", &contracts);
        assert_eq!(master.status, GateStatus::Pass);
        assert_eq!(master.active_contracts, 1);
        assert_eq!(master.total_contracts, 2);
    }
}
