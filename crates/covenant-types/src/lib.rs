//! Covenant core types.
//!
//! Shared value types for the contract-to-constraint pipeline: clause and
//! contract aggregates, the lifecycle state machine, the negotiation wizard
//! record, and the read-side gate/currency report types.
//!
//! Everything here is a plain value type; lifecycle ownership lives in
//! `covenant-store`, and gate/currency evaluation in `covenant-gate` and
//! `covenant-currency`.

pub mod clause;
pub mod contract;
pub mod ids;
pub mod negotiation;
pub mod report;

pub use clause::{
    Clause, ClauseCategory, ClauseKind, ClauseTerms, ClauseTermsError, ComparisonOp, Confidence,
};
pub use contract::{
    Contract, ContractStatus, CounterpartyType, DiscrepancySeverity, FindingSeverity,
    SapDiscrepancy, ValidationFinding, ValidationSummary,
};
pub use ids::{ClauseId, ContractId, NegotiationId};
pub use negotiation::{
    ContractNegotiation, DraftTerms, NegotiationError, NegotiationStep, StepInput,
};
pub use report::{
    Blocker, CurrencyEntry, CurrencyReport, Gate, GateReport, GateStatus, MasterGateReport,
};
