use covenant_types::{
    Blocker, ClauseTermsError, ContractId, ContractStatus, NegotiationError, NegotiationId,
};
use thiserror::Error;

/// Errors from contract store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("contract not found: {0}")]
    NotFound(ContractId),

    #[error("negotiation not found: {0}")]
    NegotiationNotFound(NegotiationId),

    #[error("invalid lifecycle transition for {contract_id}: {from} -> {to}")]
    InvalidTransition {
        contract_id: ContractId,
        from: ContractStatus,
        to: ContractStatus,
    },

    #[error("version conflict on {contract_id}: expected v{expected}, found v{actual}")]
    Conflict {
        contract_id: ContractId,
        expected: u32,
        actual: u32,
    },

    #[error("gate 1 not passed for {contract_id}: {} blocker(s)", blockers.len())]
    GateBlocked {
        contract_id: ContractId,
        blockers: Vec<Blocker>,
    },

    #[error("clause '{clause_id}' rejected: {source}")]
    ClauseInvalid {
        clause_id: String,
        source: ClauseTermsError,
    },

    #[error("negotiation incomplete: {0}")]
    IncompleteNegotiation(String),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
}

pub type StoreResult<T> = Result<T, StoreError>;
