//! Pipeline orchestrator: fire-and-observe units of work.
//!
//! Each unit runs on its own task, independent of the initiating caller's
//! lifetime, and ends with exactly one terminal event. Store writes happen
//! only after the unit's external calls succeed, so a failed unit leaves
//! the store untouched. Nothing retries automatically; re-triggering is
//! safe because every run produces a new, explicitly versioned result.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use covenant_extraction::ExtractionEngine;
use covenant_store::ContractStore;
use covenant_types::{Contract, ContractId, CounterpartyType};

use crate::cancel::CancelToken;
use crate::events::{EventBus, PipelineEvent};
use crate::sap::{SapError, SapService};
use crate::template::validate_template;

/// Everything needed to ingest one contract document.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub file_name: String,
    pub raw_text: String,
    pub counterparty: String,
    pub counterparty_type: CounterpartyType,
    pub product_group: String,
    pub template_type: String,
    pub company_entity: String,
    pub incoterm: Option<String>,
}

/// Drives long-running pipeline operations asynchronously.
pub struct PipelineOrchestrator {
    store: Arc<ContractStore>,
    engine: Arc<ExtractionEngine>,
    sap: Arc<dyn SapService>,
    events: EventBus,
    cancel: CancelToken,
}

impl PipelineOrchestrator {
    pub fn new(
        store: Arc<ContractStore>,
        engine: Arc<ExtractionEngine>,
        sap: Arc<dyn SapService>,
    ) -> Self {
        Self {
            store,
            engine,
            sap,
            events: EventBus::new(),
            cancel: CancelToken::never(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The bus this orchestrator publishes lifecycle events on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Extract clauses from a contract document and ingest the result.
    ///
    /// The caller gets the join handle back immediately; completion is
    /// observed via the event bus.
    pub fn start_extraction(&self, request: ExtractionRequest) -> JoinHandle<()> {
        let store = self.store.clone();
        let engine = self.engine.clone();
        let events = self.events.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            events.publish(PipelineEvent::ExtractionStarted {
                file: request.file_name.clone(),
                counterparty: request.counterparty.clone(),
            });

            if cancel.is_cancelled() {
                events.publish(PipelineEvent::ExtractionFailed {
                    file: request.file_name,
                    reason: "cancelled".into(),
                });
                return;
            }

            match engine.extract(&request.raw_text).await {
                Ok(clauses) => {
                    let mut contract = Contract::new(
                        request.counterparty.clone(),
                        request.counterparty_type,
                        request.product_group,
                        request.template_type,
                        request.company_entity,
                    )
                    .with_clauses(clauses)
                    .with_source_file(request.file_name.clone());
                    contract.incoterm = request.incoterm;

                    match store.ingest(contract) {
                        Ok(contract) => {
                            info!(contract_id = %contract.id, "extraction ingested");
                            events.publish(PipelineEvent::ExtractionComplete {
                                contract_id: contract.id,
                                clause_count: contract.clauses.len(),
                                counterparty: request.counterparty,
                                version: contract.current_version,
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "extraction ingest failed");
                            events.publish(PipelineEvent::ExtractionFailed {
                                file: request.file_name,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "extraction failed");
                    events.publish(PipelineEvent::ExtractionFailed {
                        file: request.file_name,
                        reason: e.to_string(),
                    });
                }
            }
        })
    }

    /// Reconcile one contract against the ERP system.
    pub fn start_sap_validation(&self, contract_id: ContractId) -> JoinHandle<()> {
        let store = self.store.clone();
        let sap = self.sap.clone();
        let events = self.events.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            events.publish(PipelineEvent::SapValidationStarted { contract_id });

            let fail = |reason: String, events: &EventBus| {
                warn!(contract_id = %contract_id, reason = %reason, "SAP validation failed");
                events.publish(PipelineEvent::SapValidationFailed {
                    contract_id,
                    reason,
                });
            };

            if cancel.is_cancelled() {
                return fail("cancelled".into(), &events);
            }
            let contract = match store.get(contract_id) {
                Ok(c) => c,
                Err(e) => return fail(e.to_string(), &events),
            };
            let outcome = match sap.validate_contract(&contract).await {
                Ok(o) => o,
                Err(e) => return fail(e.to_string(), &events),
            };
            let discrepancy_count = outcome.discrepancies.len();
            match store.record_sap_validation(
                contract_id,
                contract.current_version,
                outcome.sap_contract_id,
                outcome.validated,
                outcome.open_position,
                outcome.discrepancies,
            ) {
                Ok(_) => {
                    events.publish(PipelineEvent::SapValidationComplete {
                        contract_id,
                        discrepancy_count,
                    });
                }
                Err(e) => fail(e.to_string(), &events),
            }
        })
    }

    /// Refresh the open position of a SAP-linked contract.
    pub fn start_position_refresh(&self, contract_id: ContractId) -> JoinHandle<()> {
        let store = self.store.clone();
        let sap = self.sap.clone();
        let events = self.events.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            events.publish(PipelineEvent::PositionRefreshStarted { contract_id });

            let fail = |reason: String, events: &EventBus| {
                warn!(contract_id = %contract_id, reason = %reason, "position refresh failed");
                events.publish(PipelineEvent::PositionRefreshFailed {
                    contract_id,
                    reason,
                });
            };

            if cancel.is_cancelled() {
                return fail("cancelled".into(), &events);
            }
            let contract = match store.get(contract_id) {
                Ok(c) => c,
                Err(e) => return fail(e.to_string(), &events),
            };
            let sap_id = match &contract.sap_contract_id {
                Some(id) => id.clone(),
                None => return fail(SapError::NotLinked.to_string(), &events),
            };
            let open_position = match sap.open_position(&sap_id).await {
                Ok(p) => p,
                Err(e) => return fail(e.to_string(), &events),
            };
            match store.record_open_position(contract_id, contract.current_version, open_position)
            {
                Ok(_) => {
                    events.publish(PipelineEvent::PositionRefreshComplete {
                        contract_id,
                        open_position,
                    });
                }
                Err(e) => fail(e.to_string(), &events),
            }
        })
    }

    /// Run template validation over a contract's extracted clause set.
    pub fn start_template_validation(&self, contract_id: ContractId) -> JoinHandle<()> {
        let store = self.store.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            events.publish(PipelineEvent::TemplateValidationStarted { contract_id });

            let fail = |reason: String, events: &EventBus| {
                events.publish(PipelineEvent::TemplateValidationFailed {
                    contract_id,
                    reason,
                });
            };

            let contract = match store.get(contract_id) {
                Ok(c) => c,
                Err(e) => return fail(e.to_string(), &events),
            };
            let summary = validate_template(&contract);
            let completeness = summary.completeness;
            let finding_count = summary.findings.len();
            match store.record_template_validation(contract_id, contract.current_version, summary)
            {
                Ok(_) => {
                    events.publish(PipelineEvent::TemplateValidationComplete {
                        contract_id,
                        completeness,
                        finding_count,
                    });
                }
                Err(e) => fail(e.to_string(), &events),
            }
        })
    }
}
