//! SAP/ERP reconciliation service boundary.

use async_trait::async_trait;
use thiserror::Error;

use covenant_types::{Contract, SapDiscrepancy};

/// Outcome of reconciling a contract against the ERP system.
#[derive(Debug, Clone, PartialEq)]
pub struct SapValidationOutcome {
    pub sap_contract_id: Option<String>,
    pub validated: bool,
    pub open_position: Option<f64>,
    pub discrepancies: Vec<SapDiscrepancy>,
}

/// Errors from the SAP service.
#[derive(Error, Debug, Clone)]
pub enum SapError {
    #[error("SAP service unreachable: {0}")]
    Unreachable(String),

    #[error("SAP call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("no SAP contract linked")]
    NotLinked,
}

/// The external reconciliation service.
#[async_trait]
pub trait SapService: Send + Sync {
    /// Validate a contract's terms against the ERP record.
    async fn validate_contract(
        &self,
        contract: &Contract,
    ) -> Result<SapValidationOutcome, SapError>;

    /// Fetch the current open position for a linked SAP contract.
    async fn open_position(&self, sap_contract_id: &str) -> Result<f64, SapError>;
}

/// Fixed-outcome SAP stub for tests and offline development.
pub struct StaticSapService {
    outcome: SapValidationOutcome,
    position: f64,
}

impl StaticSapService {
    pub fn new(outcome: SapValidationOutcome) -> Self {
        let position = outcome.open_position.unwrap_or(0.0);
        Self { outcome, position }
    }

    pub fn clean(sap_contract_id: &str, open_position: f64) -> Self {
        Self::new(SapValidationOutcome {
            sap_contract_id: Some(sap_contract_id.to_string()),
            validated: true,
            open_position: Some(open_position),
            discrepancies: Vec::new(),
        })
    }
}

#[async_trait]
impl SapService for StaticSapService {
    async fn validate_contract(
        &self,
        _contract: &Contract,
    ) -> Result<SapValidationOutcome, SapError> {
        Ok(self.outcome.clone())
    }

    async fn open_position(&self, _sap_contract_id: &str) -> Result<f64, SapError> {
        Ok(self.position)
    }
}

/// Always-failing SAP stub.
pub struct FailingSapService;

#[async_trait]
impl SapService for FailingSapService {
    async fn validate_contract(
        &self,
        _contract: &Contract,
    ) -> Result<SapValidationOutcome, SapError> {
        Err(SapError::Unreachable("connection refused".into()))
    }

    async fn open_position(&self, _sap_contract_id: &str) -> Result<f64, SapError> {
        Err(SapError::Unreachable("connection refused".into()))
    }
}
