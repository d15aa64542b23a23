//! Contract aggregate and lifecycle status
//!
//! The lifecycle state machine is encoded on `ContractStatus`:
//! `Draft -> PendingReview -> {Approved | Rejected}`, `Rejected -> Draft`
//! (resubmission) and `Approved -> Superseded` (replaced by a newer
//! version). Every other transition is invalid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clause::Clause;
use crate::ids::{ContractId, NegotiationId};

/// Lifecycle status of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Draft,
    PendingReview,
    Approved,
    Rejected,
    Superseded,
}

impl ContractStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: ContractStatus) -> bool {
        use ContractStatus::*;
        matches!(
            (self, next),
            (Draft, PendingReview)
                | (PendingReview, Approved)
                | (PendingReview, Rejected)
                | (Rejected, Draft)
                | (Approved, Superseded)
        )
    }

    /// Terminal until explicitly resubmitted or superseded.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Superseded)
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Superseded => "superseded",
        };
        write!(f, "{}", s)
    }
}

/// Which side of the trade the counterparty sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterpartyType {
    Customer,
    Supplier,
}

/// Severity of a discrepancy between contract terms and the ERP system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancySeverity {
    High,
    Other,
}

/// One field-level mismatch found during SAP reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SapDiscrepancy {
    pub field: String,
    pub severity: DiscrepancySeverity,
    pub contract_value: String,
    pub external_value: String,
    pub message: String,
}

impl SapDiscrepancy {
    pub fn is_high(&self) -> bool {
        self.severity == DiscrepancySeverity::High
    }
}

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    MissingRequired,
    Warning,
    Info,
}

/// One finding from template or LLM validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub code: String,
    pub severity: FindingSeverity,
    pub message: String,
}

/// Summary of a validation pass over a contract's extracted fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Fraction of required template fields present, in `[0, 1]`.
    pub completeness: f64,
    pub findings: Vec<ValidationFinding>,
    pub validated_at: DateTime<Utc>,
}

impl ValidationSummary {
    pub fn new(completeness: f64) -> Self {
        Self {
            completeness,
            findings: Vec::new(),
            validated_at: Utc::now(),
        }
    }

    pub fn with_finding(
        mut self,
        code: impl Into<String>,
        severity: FindingSeverity,
        message: impl Into<String>,
    ) -> Self {
        self.findings.push(ValidationFinding {
            code: code.into(),
            severity,
            message: message.into(),
        });
        self
    }

    pub fn has_missing_required(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.severity == FindingSeverity::MissingRequired)
    }
}

/// A commodity trading contract and its extracted clause set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub counterparty: String,
    pub counterparty_type: CounterpartyType,
    pub product_group: String,
    pub template_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoterm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_type: Option<String>,
    pub company_entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    pub clauses: Vec<Clause>,
    pub status: ContractStatus,
    /// Monotonic, incremented on each clause-set replacement.
    pub current_version: u32,
    /// Stamped on legal approval; orders overrides in the constraint
    /// bridge (later approvals win on conflicting parameters).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negotiation_id: Option<NegotiationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sap_contract_id: Option<String>,
    pub sap_validated: bool,
    pub sap_discrepancies: Vec<SapDiscrepancy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_validation: Option<ValidationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_validation: Option<ValidationSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn new(
        counterparty: impl Into<String>,
        counterparty_type: CounterpartyType,
        product_group: impl Into<String>,
        template_type: impl Into<String>,
        company_entity: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ContractId::generate(),
            counterparty: counterparty.into(),
            counterparty_type,
            product_group: product_group.into(),
            template_type: template_type.into(),
            incoterm: None,
            term_type: None,
            company_entity: company_entity.into(),
            source_file: None,
            clauses: Vec::new(),
            status: ContractStatus::Draft,
            current_version: 1,
            approved_at: None,
            negotiation_id: None,
            sap_contract_id: None,
            sap_validated: false,
            sap_discrepancies: Vec::new(),
            open_position: None,
            template_validation: None,
            llm_validation: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_clauses(mut self, clauses: Vec<Clause>) -> Self {
        self.clauses = clauses;
        self
    }

    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    pub fn with_incoterm(mut self, incoterm: impl Into<String>) -> Self {
        self.incoterm = Some(incoterm.into());
        self
    }

    pub fn with_negotiation(mut self, negotiation_id: NegotiationId) -> Self {
        self.negotiation_id = Some(negotiation_id);
        self
    }

    /// An active contract is approved and not superseded; only active
    /// contracts influence the optimizer.
    pub fn is_active(&self) -> bool {
        self.status == ContractStatus::Approved
    }

    pub fn has_high_discrepancy(&self) -> bool {
        self.sap_discrepancies.iter().any(|d| d.is_high())
    }
}
