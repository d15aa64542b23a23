//! Portfolio readiness snapshot for the operator dashboard.
//!
//! Combines the master gate verdict with the advisory currency report so a
//! "ready" portfolio can still be flagged as running on stale data. The
//! snapshot is rebuilt from store state on every call.

use serde::{Deserialize, Serialize};
use tracing::info;

use covenant_currency::CurrencyTracker;
use covenant_gate::GateEvaluator;
use covenant_store::ContractStore;
use covenant_types::{ContractId, CurrencyReport, GateReport, MasterGateReport};

/// Everything an operator needs before running the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessSnapshot {
    pub master: MasterGateReport,
    /// Per-contract detail for every contract in the product group, active
    /// or not.
    pub contracts: Vec<GateReport>,
    pub currency: CurrencyReport,
}

impl ReadinessSnapshot {
    /// Hard verdict. Currency is advisory and does not factor in.
    pub fn optimizer_may_run(&self) -> bool {
        self.master.optimizer_may_run()
    }
}

/// Evaluate all gates and freshness stamps for one product group.
pub fn readiness_snapshot(
    store: &ContractStore,
    tracker: &CurrencyTracker,
    product_group: &str,
) -> ReadinessSnapshot {
    let evaluator = GateEvaluator::new();
    let all = store.list(Some(product_group));

    let master = evaluator.master_gate(product_group, &all);
    let contracts: Vec<GateReport> = all.iter().map(|c| evaluator.evaluate(c)).collect();
    let ids: Vec<ContractId> = all.iter().map(|c| c.id).collect();
    let currency = tracker.currency_report(product_group, &ids);

    info!(
        product_group,
        status = ?master.status,
        active = master.active_contracts,
        stale = currency.stale_count,
        "readiness evaluated"
    );

    ReadinessSnapshot {
        master,
        contracts,
        currency,
    }
}
