//! Currency tracker: last-refresh stamps and staleness classification.
//!
//! Advisory only. Staleness never blocks a gate by itself; the report is
//! surfaced so operators can decide whether to trust a "ready" master
//! gate. Stamps are points in time; the report is rebuilt from them on
//! every call.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use covenant_types::{ContractId, CurrencyEntry, CurrencyReport};

/// Default staleness threshold.
pub const DEFAULT_STALENESS_HOURS: i64 = 24;

/// Records "last refreshed" timestamps per data source and per contract.
pub struct CurrencyTracker {
    threshold_hours: i64,
    sources: RwLock<HashMap<String, DateTime<Utc>>>,
    contracts: RwLock<HashMap<(ContractId, String), DateTime<Utc>>>,
}

impl CurrencyTracker {
    pub fn new() -> Self {
        Self::with_threshold_hours(DEFAULT_STALENESS_HOURS)
    }

    pub fn with_threshold_hours(threshold_hours: i64) -> Self {
        Self {
            threshold_hours,
            sources: RwLock::new(HashMap::new()),
            contracts: RwLock::new(HashMap::new()),
        }
    }

    /// Record a successful refresh of a named data source (e.g.
    /// "sap_positions", "freight_rates").
    pub fn stamp_source(&self, source: &str) {
        self.stamp_source_at(source, Utc::now());
    }

    pub fn stamp_source_at(&self, source: &str, at: DateTime<Utc>) {
        debug!(source, %at, "source stamped");
        self.sources
            .write()
            .unwrap()
            .insert(source.to_string(), at);
    }

    /// Record a point-in-time marker for a contract (e.g.
    /// "legal_reviewed_at", "sap_validated_at").
    pub fn stamp_contract(&self, contract_id: ContractId, event: &str) {
        self.stamp_contract_at(contract_id, event, Utc::now());
    }

    pub fn stamp_contract_at(&self, contract_id: ContractId, event: &str, at: DateTime<Utc>) {
        debug!(contract_id = %contract_id, event, %at, "contract stamped");
        self.contracts
            .write()
            .unwrap()
            .insert((contract_id, event.to_string()), at);
    }

    pub fn contract_stamp(&self, contract_id: ContractId, event: &str) -> Option<DateTime<Utc>> {
        self.contracts
            .read()
            .unwrap()
            .get(&(contract_id, event.to_string()))
            .copied()
    }

    /// Classify every tracked item as current or stale against the
    /// threshold. Contract stamps are restricted to the given ids so the
    /// report covers one product group's portfolio.
    pub fn currency_report(
        &self,
        product_group: &str,
        contract_ids: &[ContractId],
    ) -> CurrencyReport {
        let now = Utc::now();
        let threshold = Duration::hours(self.threshold_hours);

        let mut sources: Vec<CurrencyEntry> = self
            .sources
            .read()
            .unwrap()
            .iter()
            .map(|(name, &at)| entry(name.clone(), at, now, threshold))
            .collect();
        sources.sort_by(|a, b| a.name.cmp(&b.name));

        let mut contracts: Vec<CurrencyEntry> = self
            .contracts
            .read()
            .unwrap()
            .iter()
            .filter(|((id, _), _)| contract_ids.contains(id))
            .map(|((id, event), &at)| entry(format!("{}:{}", id, event), at, now, threshold))
            .collect();
        contracts.sort_by(|a, b| a.name.cmp(&b.name));

        let current_count = sources.iter().chain(&contracts).filter(|e| e.current).count();
        let total = sources.len() + contracts.len();
        let stale_count = total - current_count;

        CurrencyReport {
            product_group: product_group.to_string(),
            sources,
            contracts,
            current_count,
            stale_count,
            all_current: stale_count == 0,
            threshold_hours: self.threshold_hours,
            evaluated_at: now,
        }
    }
}

impl Default for CurrencyTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn entry(name: String, at: DateTime<Utc>, now: DateTime<Utc>, threshold: Duration) -> CurrencyEntry {
    CurrencyEntry {
        name,
        last_updated: at,
        current: now.signed_duration_since(at) <= threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_stamp_is_current() {
        let tracker = CurrencyTracker::new();
        tracker.stamp_source("sap_positions");
        let report = tracker.currency_report("thermal_coal", &[]);
        assert_eq!(report.sources.len(), 1);
        assert!(report.sources[0].current);
        assert!(report.all_current);
        assert_eq!(report.stale_count, 0);
    }

    #[test]
    fn test_old_stamp_is_stale() {
        let tracker = CurrencyTracker::new();
        tracker.stamp_source_at("freight_rates", Utc::now() - Duration::hours(30));
        let report = tracker.currency_report("thermal_coal", &[]);
        assert!(!report.sources[0].current);
        assert!(!report.all_current);
        assert_eq!(report.stale_count, 1);
        assert_eq!(report.current_count, 0);
    }

    #[test]
    fn test_threshold_override() {
        let tracker = CurrencyTracker::with_threshold_hours(48);
        tracker.stamp_source_at("freight_rates", Utc::now() - Duration::hours(30));
        let report = tracker.currency_report("thermal_coal", &[]);
        assert!(report.all_current);
        assert_eq!(report.threshold_hours, 48);
    }

    #[test]
    fn test_contract_stamps_filtered_by_portfolio() {
        let tracker = CurrencyTracker::new();
        let in_group = ContractId::generate();
        let other = ContractId::generate();
        tracker.stamp_contract(in_group, "legal_reviewed_at");
        tracker.stamp_contract(other, "legal_reviewed_at");

        let report = tracker.currency_report("thermal_coal", &[in_group]);
        assert_eq!(report.contracts.len(), 1);
        assert!(report.contracts[0].name.contains(&in_group.to_string()));
    }

    #[test]
    fn test_restamp_refreshes() {
        let tracker = CurrencyTracker::new();
        let id = ContractId::generate();
        tracker.stamp_contract_at(id, "sap_validated_at", Utc::now() - Duration::hours(72));
        assert!(!tracker
            .currency_report("pg", &[id])
            .contracts[0]
            .current);

        tracker.stamp_contract(id, "sap_validated_at");
        assert!(tracker.currency_report("pg", &[id]).contracts[0].current);
    }

    #[test]
    fn test_mixed_counts() {
        let tracker = CurrencyTracker::new();
        let id = ContractId::generate();
        tracker.stamp_source("sap_positions");
        tracker.stamp_source_at("freight_rates", Utc::now() - Duration::hours(48));
        tracker.stamp_contract(id, "legal_reviewed_at");

        let report = tracker.currency_report("pg", &[id]);
        assert_eq!(report.current_count, 2);
        assert_eq!(report.stale_count, 1);
        assert!(!report.all_current);
    }
}
