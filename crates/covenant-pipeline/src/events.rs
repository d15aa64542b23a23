//! Pipeline event bus.
//!
//! Every asynchronous unit of work emits a "started" event and exactly one
//! terminal "complete" or "failed" event. Delivery is at-most-once and
//! best-effort over a broadcast channel; there is no durable queue.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use covenant_types::ContractId;

const CHANNEL_CAPACITY: usize = 256;

/// Lifecycle events published by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    ExtractionStarted {
        file: String,
        counterparty: String,
    },
    ExtractionComplete {
        contract_id: ContractId,
        clause_count: usize,
        counterparty: String,
        version: u32,
    },
    ExtractionFailed {
        file: String,
        reason: String,
    },
    SapValidationStarted {
        contract_id: ContractId,
    },
    SapValidationComplete {
        contract_id: ContractId,
        discrepancy_count: usize,
    },
    SapValidationFailed {
        contract_id: ContractId,
        reason: String,
    },
    PositionRefreshStarted {
        contract_id: ContractId,
    },
    PositionRefreshComplete {
        contract_id: ContractId,
        open_position: f64,
    },
    PositionRefreshFailed {
        contract_id: ContractId,
        reason: String,
    },
    TemplateValidationStarted {
        contract_id: ContractId,
    },
    TemplateValidationComplete {
        contract_id: ContractId,
        completeness: f64,
        finding_count: usize,
    },
    TemplateValidationFailed {
        contract_id: ContractId,
        reason: String,
    },
}

/// Broadcast bus for pipeline events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Lagging or absent
    /// subscribers are not an error.
    pub fn publish(&self, event: PipelineEvent) {
        trace!(?event, "pipeline event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let id = ContractId::generate();

        bus.publish(PipelineEvent::SapValidationStarted { contract_id: id });
        let event = rx.recv().await.unwrap();
        assert_eq!(event, PipelineEvent::SapValidationStarted { contract_id: id });
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(PipelineEvent::ExtractionStarted {
            file: "contract.txt".into(),
            counterparty: "Glencore AG".into(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
