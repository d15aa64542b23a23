//! The contract store: versioned repository and lifecycle owner.
//!
//! The store exclusively owns Contract and Clause lifecycles. Every
//! mutation is a compare-and-swap on the contract's version number: the
//! caller names the version it saw, a mismatch is a retryable conflict.
//! Within one transition the status change, version snapshot and audit
//! event are written atomically under the store lock, and `current_version`
//! is incremented alongside the snapshot. History is append-only.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::{info, warn};

use covenant_currency::CurrencyTracker;
use covenant_gate::GateEvaluator;
use covenant_types::{
    Clause, Contract, ContractNegotiation, ContractId, ContractStatus, NegotiationId,
    SapDiscrepancy, StepInput, ValidationSummary,
};

use crate::error::{StoreError, StoreResult};
use crate::history::{AuditEvent, VersionRecord};

struct ContractRecord {
    contract: Contract,
    history: Vec<VersionRecord>,
    audit: Vec<AuditEvent>,
}

/// In-memory versioned contract repository.
///
/// Persistence technology is a deployment concern; the store's contract is
/// that writes within one lifecycle transition are atomic and that
/// concurrent conflicting transitions on the same contract serialize, with
/// the second writer failing on the version check.
pub struct ContractStore {
    contracts: RwLock<HashMap<ContractId, ContractRecord>>,
    negotiations: RwLock<HashMap<NegotiationId, ContractNegotiation>>,
    gate_evaluator: GateEvaluator,
    currency: Option<Arc<CurrencyTracker>>,
}

impl ContractStore {
    pub fn new() -> Self {
        Self {
            contracts: RwLock::new(HashMap::new()),
            negotiations: RwLock::new(HashMap::new()),
            gate_evaluator: GateEvaluator::new(),
            currency: None,
        }
    }

    /// Attach a currency tracker. Approval and SAP validation then stamp
    /// `legal_reviewed_at` / `sap_validated_at` as part of the mutation.
    pub fn with_currency_tracker(mut self, tracker: Arc<CurrencyTracker>) -> Self {
        self.currency = Some(tracker);
        self
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn get(&self, id: ContractId) -> StoreResult<Contract> {
        let contracts = self.contracts.read().unwrap();
        contracts
            .get(&id)
            .map(|r| r.contract.clone())
            .ok_or(StoreError::NotFound(id))
    }

    pub fn list(&self, product_group: Option<&str>) -> Vec<Contract> {
        let contracts = self.contracts.read().unwrap();
        let mut out: Vec<Contract> = contracts
            .values()
            .map(|r| r.contract.clone())
            .filter(|c| product_group.map_or(true, |pg| c.product_group == pg))
            .collect();
        out.sort_by_key(|c| c.created_at);
        out
    }

    /// Active (approved, non-superseded) contracts in ascending approval
    /// order. This ordering is what gives the constraint bridge its
    /// last-writer-wins semantics.
    pub fn active_contracts(&self, product_group: &str) -> Vec<Contract> {
        let contracts = self.contracts.read().unwrap();
        let mut out: Vec<Contract> = contracts
            .values()
            .map(|r| r.contract.clone())
            .filter(|c| c.product_group == product_group && c.is_active())
            .collect();
        out.sort_by_key(|c| (c.approved_at, c.created_at));
        out
    }

    pub fn history(&self, id: ContractId) -> StoreResult<Vec<VersionRecord>> {
        let contracts = self.contracts.read().unwrap();
        contracts
            .get(&id)
            .map(|r| r.history.clone())
            .ok_or(StoreError::NotFound(id))
    }

    pub fn audit_trail(&self, id: ContractId) -> StoreResult<Vec<AuditEvent>> {
        let contracts = self.contracts.read().unwrap();
        contracts
            .get(&id)
            .map(|r| r.audit.clone())
            .ok_or(StoreError::NotFound(id))
    }

    // ── Lifecycle mutations ──────────────────────────────────────────

    /// Create a new contract at version 1, status `draft`.
    pub fn ingest(&self, mut contract: Contract) -> StoreResult<Contract> {
        validate_clauses(&contract.clauses)?;
        contract.status = ContractStatus::Draft;
        contract.current_version = 1;
        contract.updated_at = Utc::now();

        let record = ContractRecord {
            history: vec![VersionRecord::new(
                1,
                ContractStatus::Draft,
                contract.clauses.clone(),
                "ingested",
                "system",
            )],
            audit: vec![AuditEvent::new(
                "ingest",
                "system",
                serde_json::json!({ "clause_count": contract.clauses.len() }),
            )],
            contract: contract.clone(),
        };

        info!(contract_id = %contract.id, clauses = contract.clauses.len(), "contract ingested");
        self.contracts
            .write()
            .unwrap()
            .insert(contract.id, record);
        Ok(contract)
    }

    /// Replace a draft contract's clause set, producing a new version.
    pub fn replace_clauses(
        &self,
        id: ContractId,
        expected_version: u32,
        clauses: Vec<Clause>,
        author: &str,
        change_summary: &str,
    ) -> StoreResult<Contract> {
        validate_clauses(&clauses)?;
        self.mutate(id, expected_version, |contract| {
            if contract.status != ContractStatus::Draft {
                return Err(StoreError::InvalidTransition {
                    contract_id: contract.id,
                    from: contract.status,
                    to: contract.status,
                });
            }
            contract.clauses = clauses.clone();
            Ok(MutationOutcome {
                change_summary: change_summary.to_string(),
                author: author.to_string(),
                audit: AuditEvent::new(
                    "replace_clauses",
                    author,
                    serde_json::json!({ "clause_count": clauses.len() }),
                ),
            })
        })
    }

    /// Submit a draft for legal review. Fails with the gate-1 blockers if
    /// extraction quality is not good enough.
    pub fn submit_for_review(&self, id: ContractId, expected_version: u32) -> StoreResult<Contract> {
        let evaluator = self.gate_evaluator.clone();
        self.mutate(id, expected_version, |contract| {
            check_transition(contract, ContractStatus::PendingReview)?;
            let (status, blockers) = evaluator.gate1_extraction(contract);
            if !status.is_pass() {
                warn!(contract_id = %contract.id, blockers = blockers.len(), "submit blocked by gate 1");
                return Err(StoreError::GateBlocked {
                    contract_id: contract.id,
                    blockers,
                });
            }
            contract.status = ContractStatus::PendingReview;
            Ok(MutationOutcome {
                change_summary: "submitted for review".into(),
                author: "system".into(),
                audit: AuditEvent::new("submit_for_review", "system", serde_json::json!({})),
            })
        })
    }

    /// Legal approval. Stamps `approved_at`, which orders this contract's
    /// overrides in the constraint bridge.
    pub fn approve(
        &self,
        id: ContractId,
        expected_version: u32,
        reviewer: &str,
        notes: &str,
    ) -> StoreResult<Contract> {
        let contract = self.mutate(id, expected_version, |contract| {
            check_transition(contract, ContractStatus::Approved)?;
            contract.status = ContractStatus::Approved;
            contract.approved_at = Some(Utc::now());
            Ok(MutationOutcome {
                change_summary: format!("approved by {}", reviewer),
                author: reviewer.to_string(),
                audit: AuditEvent::new(
                    "approve",
                    reviewer,
                    serde_json::json!({ "notes": notes }),
                ),
            })
        })?;
        if let Some(tracker) = &self.currency {
            tracker.stamp_contract(contract.id, "legal_reviewed_at");
        }
        Ok(contract)
    }

    /// Legal rejection with a reason.
    pub fn reject(
        &self,
        id: ContractId,
        expected_version: u32,
        reviewer: &str,
        reason: &str,
    ) -> StoreResult<Contract> {
        self.mutate(id, expected_version, |contract| {
            check_transition(contract, ContractStatus::Rejected)?;
            contract.status = ContractStatus::Rejected;
            Ok(MutationOutcome {
                change_summary: format!("rejected by {}", reviewer),
                author: reviewer.to_string(),
                audit: AuditEvent::new(
                    "reject",
                    reviewer,
                    serde_json::json!({ "reason": reason }),
                ),
            })
        })
    }

    /// Send a rejected contract back to draft for rework.
    pub fn resubmit(&self, id: ContractId, expected_version: u32) -> StoreResult<Contract> {
        self.mutate(id, expected_version, |contract| {
            check_transition(contract, ContractStatus::Draft)?;
            contract.status = ContractStatus::Draft;
            Ok(MutationOutcome {
                change_summary: "resubmitted as draft".into(),
                author: "system".into(),
                audit: AuditEvent::new("resubmit", "system", serde_json::json!({})),
            })
        })
    }

    /// Downstream operational transition (e.g. supersede on renewal)
    /// without re-running legal review. Still bound by the state machine,
    /// and reaching `pending_review` still requires Gate 1: the
    /// operational path is not a way around the extraction-quality check.
    pub fn update_status(
        &self,
        id: ContractId,
        expected_version: u32,
        status: ContractStatus,
        metadata: serde_json::Value,
    ) -> StoreResult<Contract> {
        let evaluator = self.gate_evaluator.clone();
        self.mutate(id, expected_version, |contract| {
            check_transition(contract, status)?;
            if status == ContractStatus::PendingReview {
                let (gate, blockers) = evaluator.gate1_extraction(contract);
                if !gate.is_pass() {
                    warn!(contract_id = %contract.id, blockers = blockers.len(), "status update blocked by gate 1");
                    return Err(StoreError::GateBlocked {
                        contract_id: contract.id,
                        blockers,
                    });
                }
            }
            contract.status = status;
            Ok(MutationOutcome {
                change_summary: format!("status set to {}", status),
                author: "system".into(),
                audit: AuditEvent::new("update_status", "system", metadata.clone()),
            })
        })
    }

    /// Record the outcome of a SAP reconciliation run.
    pub fn record_sap_validation(
        &self,
        id: ContractId,
        expected_version: u32,
        sap_contract_id: Option<String>,
        validated: bool,
        open_position: Option<f64>,
        discrepancies: Vec<SapDiscrepancy>,
    ) -> StoreResult<Contract> {
        let contract = self.mutate(id, expected_version, |contract| {
            contract.sap_contract_id = sap_contract_id.clone();
            contract.sap_validated = validated;
            contract.open_position = open_position;
            contract.sap_discrepancies = discrepancies.clone();
            Ok(MutationOutcome {
                change_summary: "SAP validation recorded".into(),
                author: "system".into(),
                audit: AuditEvent::new(
                    "sap_validation",
                    "system",
                    serde_json::json!({
                        "validated": validated,
                        "discrepancy_count": discrepancies.len(),
                    }),
                ),
            })
        })?;
        if let Some(tracker) = &self.currency {
            tracker.stamp_contract(contract.id, "sap_validated_at");
        }
        Ok(contract)
    }

    /// Record a refreshed open position from the ERP system.
    pub fn record_open_position(
        &self,
        id: ContractId,
        expected_version: u32,
        open_position: f64,
    ) -> StoreResult<Contract> {
        self.mutate(id, expected_version, |contract| {
            contract.open_position = Some(open_position);
            Ok(MutationOutcome {
                change_summary: "open position refreshed".into(),
                author: "system".into(),
                audit: AuditEvent::new(
                    "position_refresh",
                    "system",
                    serde_json::json!({ "open_position": open_position }),
                ),
            })
        })
    }

    /// Record a template-validation pass over the extracted fields.
    pub fn record_template_validation(
        &self,
        id: ContractId,
        expected_version: u32,
        summary: ValidationSummary,
    ) -> StoreResult<Contract> {
        self.mutate(id, expected_version, |contract| {
            contract.template_validation = Some(summary.clone());
            Ok(MutationOutcome {
                change_summary: "template validation recorded".into(),
                author: "system".into(),
                audit: AuditEvent::new(
                    "template_validation",
                    "system",
                    serde_json::json!({ "completeness": summary.completeness }),
                ),
            })
        })
    }

    /// Record an LLM cross-check over the extracted fields.
    pub fn record_llm_validation(
        &self,
        id: ContractId,
        expected_version: u32,
        summary: ValidationSummary,
    ) -> StoreResult<Contract> {
        self.mutate(id, expected_version, |contract| {
            contract.llm_validation = Some(summary.clone());
            Ok(MutationOutcome {
                change_summary: "LLM validation recorded".into(),
                author: "system".into(),
                audit: AuditEvent::new(
                    "llm_validation",
                    "system",
                    serde_json::json!({ "completeness": summary.completeness }),
                ),
            })
        })
    }

    // ── Negotiations ─────────────────────────────────────────────────

    /// Open a new negotiation wizard session.
    pub fn create_negotiation(&self) -> ContractNegotiation {
        let negotiation = ContractNegotiation::new();
        self.negotiations
            .write()
            .unwrap()
            .insert(negotiation.id, negotiation.clone());
        negotiation
    }

    pub fn get_negotiation(&self, id: NegotiationId) -> StoreResult<ContractNegotiation> {
        self.negotiations
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NegotiationNotFound(id))
    }

    /// Apply one wizard step.
    pub fn advance_negotiation(
        &self,
        id: NegotiationId,
        input: StepInput,
    ) -> StoreResult<ContractNegotiation> {
        let mut negotiations = self.negotiations.write().unwrap();
        let current = negotiations
            .get(&id)
            .cloned()
            .ok_or(StoreError::NegotiationNotFound(id))?;
        let next = current.advance(input)?;
        negotiations.insert(id, next.clone());
        Ok(next)
    }

    /// Step the wizard back one step.
    pub fn back_negotiation(&self, id: NegotiationId) -> StoreResult<ContractNegotiation> {
        let mut negotiations = self.negotiations.write().unwrap();
        let current = negotiations
            .get(&id)
            .cloned()
            .ok_or(StoreError::NegotiationNotFound(id))?;
        let prev = current.back()?;
        negotiations.insert(id, prev.clone());
        Ok(prev)
    }

    /// Submit a completed negotiation, creating its one resulting contract.
    pub fn submit_negotiation(&self, id: NegotiationId) -> StoreResult<Contract> {
        let mut negotiations = self.negotiations.write().unwrap();
        let negotiation = negotiations
            .get_mut(&id)
            .ok_or(StoreError::NegotiationNotFound(id))?;
        if negotiation.contract_id.is_some() {
            return Err(covenant_types::NegotiationError::AlreadySubmitted.into());
        }

        let terms = &negotiation.terms;
        let counterparty = terms
            .counterparty
            .clone()
            .ok_or_else(|| StoreError::IncompleteNegotiation("counterparty missing".into()))?;
        let counterparty_type = terms
            .counterparty_type
            .ok_or_else(|| StoreError::IncompleteNegotiation("counterparty type missing".into()))?;
        let product_group = terms
            .product_group
            .clone()
            .ok_or_else(|| StoreError::IncompleteNegotiation("product group missing".into()))?;
        let template_type = terms
            .template_type
            .clone()
            .ok_or_else(|| StoreError::IncompleteNegotiation("template type missing".into()))?;
        let company_entity = terms
            .company_entity
            .clone()
            .ok_or_else(|| StoreError::IncompleteNegotiation("company entity missing".into()))?;

        let mut contract = Contract::new(
            counterparty,
            counterparty_type,
            product_group,
            template_type,
            company_entity,
        )
        .with_clauses(negotiation.chosen_clauses.clone())
        .with_negotiation(id);
        contract.incoterm = terms.incoterm.clone();
        contract.term_type = terms.term_type.clone();

        let contract = self.ingest(contract)?;
        negotiation.mark_submitted(contract.id);
        Ok(contract)
    }

    // ── Internal helpers ─────────────────────────────────────────────

    /// Run one atomic mutation under the store lock: version CAS, apply,
    /// bump version, snapshot, audit.
    fn mutate<F>(&self, id: ContractId, expected_version: u32, f: F) -> StoreResult<Contract>
    where
        F: FnOnce(&mut Contract) -> StoreResult<MutationOutcome>,
    {
        let mut contracts = self.contracts.write().unwrap();
        let record = contracts.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if record.contract.current_version != expected_version {
            return Err(StoreError::Conflict {
                contract_id: id,
                expected: expected_version,
                actual: record.contract.current_version,
            });
        }

        // Apply against a working copy so a failed mutation leaves the
        // stored record untouched.
        let mut working = record.contract.clone();
        let outcome = f(&mut working)?;

        working.current_version += 1;
        working.updated_at = Utc::now();
        record.history.push(VersionRecord::new(
            working.current_version,
            working.status,
            working.clauses.clone(),
            outcome.change_summary,
            outcome.author,
        ));
        record.audit.push(outcome.audit);
        record.contract = working.clone();

        info!(
            contract_id = %id,
            version = working.current_version,
            status = %working.status,
            "contract mutated"
        );
        Ok(working)
    }
}

impl Default for ContractStore {
    fn default() -> Self {
        Self::new()
    }
}

struct MutationOutcome {
    change_summary: String,
    author: String,
    audit: AuditEvent,
}

fn check_transition(contract: &Contract, to: ContractStatus) -> StoreResult<()> {
    if !contract.status.can_transition_to(to) {
        return Err(StoreError::InvalidTransition {
            contract_id: contract.id,
            from: contract.status,
            to,
        });
    }
    Ok(())
}

fn validate_clauses(clauses: &[Clause]) -> StoreResult<()> {
    for clause in clauses {
        clause
            .validate()
            .map_err(|source| StoreError::ClauseInvalid {
                clause_id: clause.clause_id.clone(),
                source,
            })?;
    }
    Ok(())
}
