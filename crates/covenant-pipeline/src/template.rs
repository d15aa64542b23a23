//! Template validation: required-field coverage of an extracted clause set.
//!
//! The Gate 1 inputs. Completeness is the fraction of required checks the
//! contract satisfies; each miss becomes a `missing_required` finding with
//! a stable code.

use covenant_types::{ClauseCategory, Contract, FindingSeverity, ValidationSummary};

/// Clause categories every trading contract template must cover.
const REQUIRED_CATEGORIES: [(ClauseCategory, &str); 4] = [
    (ClauseCategory::Quantity, "quantity"),
    (ClauseCategory::Pricing, "pricing"),
    (ClauseCategory::DeliverySchedule, "delivery_schedule"),
    (ClauseCategory::Payment, "payment"),
];

/// Evaluate required-field coverage for a contract.
pub fn validate_template(contract: &Contract) -> ValidationSummary {
    let mut satisfied = 0usize;
    let mut summary = ValidationSummary::new(0.0);

    for (category, code) in REQUIRED_CATEGORIES {
        if contract.clauses.iter().any(|c| c.category == category) {
            satisfied += 1;
        } else {
            summary = summary.with_finding(
                code,
                FindingSeverity::MissingRequired,
                format!("no {} clause extracted", code),
            );
        }
    }

    // Incoterm is required contract metadata, not a clause
    if contract.incoterm.is_some() {
        satisfied += 1;
    } else {
        summary = summary.with_finding(
            "incoterm",
            FindingSeverity::MissingRequired,
            "incoterm missing from contract terms",
        );
    }

    let total = REQUIRED_CATEGORIES.len() + 1;
    summary.completeness = satisfied as f64 / total as f64;
    summary
}
