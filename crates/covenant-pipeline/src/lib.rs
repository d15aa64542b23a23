//! Covenant pipeline orchestrator.
//!
//! Drives the asynchronous units of work around the contract store:
//! document extraction, SAP reconciliation, open-position refresh and
//! template validation. Units are fire-and-observe tokio tasks reporting
//! over a broadcast event bus; each emits exactly one terminal event and
//! writes to the store only on success. Also exposes the portfolio
//! readiness snapshot combining gate verdicts with data-currency checks.

pub mod cancel;
pub mod events;
pub mod orchestrator;
pub mod readiness;
pub mod sap;
pub mod template;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use events::{EventBus, PipelineEvent};
pub use orchestrator::{ExtractionRequest, PipelineOrchestrator};
pub use readiness::{readiness_snapshot, ReadinessSnapshot};
pub use sap::{FailingSapService, SapError, SapService, SapValidationOutcome, StaticSapService};
pub use template::validate_template;
