//! Clause: one extracted contractual obligation as a typed constraint
//!
//! Clauses are immutable once stored. Category, kind, confidence and
//! operator are closed enums with an explicit fallback variant instead of
//! permissive string coercion; unrecognized labels from a model response
//! map to `Condition`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::ClauseId;

/// Fixed set of clause categories recognized by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseCategory {
    Quantity,
    DeliverySchedule,
    Pricing,
    Payment,
    Logistics,
    QualitySpec,
    Penalty,
    TakeOrPay,
    Demurrage,
    ForceMajeure,
    Insurance,
    Legal,
    Operational,
    Condition,
}

impl ClauseCategory {
    /// Parse a category label from a model response.
    ///
    /// Matching is case-insensitive; anything unrecognized falls back to
    /// `Condition` rather than failing the clause.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "quantity" => Self::Quantity,
            "delivery_schedule" | "delivery" => Self::DeliverySchedule,
            "pricing" | "price" => Self::Pricing,
            "payment" => Self::Payment,
            "logistics" => Self::Logistics,
            "quality_spec" | "quality" => Self::QualitySpec,
            "penalty" => Self::Penalty,
            "take_or_pay" => Self::TakeOrPay,
            "demurrage" => Self::Demurrage,
            "force_majeure" => Self::ForceMajeure,
            "insurance" => Self::Insurance,
            "legal" => Self::Legal,
            "operational" => Self::Operational,
            _ => Self::Condition,
        }
    }

    /// The semantic kind this category maps to when the model does not
    /// supply one explicitly.
    pub fn default_kind(&self) -> ClauseKind {
        match self {
            Self::Quantity | Self::TakeOrPay => ClauseKind::Obligation,
            Self::DeliverySchedule | Self::Logistics => ClauseKind::Delivery,
            Self::Pricing => ClauseKind::PriceTerm,
            Self::Payment => ClauseKind::Payment,
            Self::QualitySpec | Self::Insurance => ClauseKind::Compliance,
            Self::Penalty | Self::Demurrage => ClauseKind::Penalty,
            Self::Legal | Self::ForceMajeure => ClauseKind::Legal,
            Self::Operational => ClauseKind::Operational,
            Self::Condition => ClauseKind::Condition,
        }
    }
}

/// Semantic type tag used for downstream grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Obligation,
    Delivery,
    PriceTerm,
    Payment,
    Compliance,
    Penalty,
    Legal,
    Operational,
    Condition,
}

impl ClauseKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "obligation" => Some(Self::Obligation),
            "delivery" => Some(Self::Delivery),
            "price_term" => Some(Self::PriceTerm),
            "payment" => Some(Self::Payment),
            "compliance" => Some(Self::Compliance),
            "penalty" => Some(Self::Penalty),
            "legal" => Some(Self::Legal),
            "operational" => Some(Self::Operational),
            "condition" => Some(Self::Condition),
            _ => None,
        }
    }
}

/// Extraction confidence reported by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    #[default]
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Tolerant parse; absent or unparsable labels default to `High`.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_ascii_lowercase()) {
            Some(l) if l == "medium" => Self::Medium,
            Some(l) if l == "low" => Self::Low,
            _ => Self::High,
        }
    }
}

/// Comparison operator for a numeric clause term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "between")]
    Between,
}

impl ComparisonOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim() {
            ">=" => Some(Self::Gte),
            "<=" => Some(Self::Lte),
            "==" | "=" => Some(Self::Eq),
            "between" => Some(Self::Between),
            _ => None,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Eq => "==",
            Self::Between => "between",
        };
        write!(f, "{}", s)
    }
}

/// Optional structured terms attached to a clause.
///
/// Only clauses with a resolvable `parameter` and an operator participate
/// in constraint mapping; the rest are informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClauseTerms {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<ComparisonOp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Upper bound, only meaningful for `between`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_upper: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalty_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalty_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_excerpt: Option<String>,
}

/// Structural violations of the clause term invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClauseTermsError {
    #[error("operator '{0}' present without a value")]
    MissingValue(ComparisonOp),

    #[error("value_upper present but operator is {0:?}, expected 'between'")]
    UpperWithoutBetween(Option<ComparisonOp>),

    #[error("'between' bounds out of order: {lower} > {upper}")]
    BoundsOutOfOrder { lower: f64, upper: f64 },

    #[error("'between' requires an upper bound")]
    MissingUpper,
}

impl ClauseTerms {
    /// Enforce the term invariants:
    /// `value` is required whenever an operator is present, `value_upper`
    /// only appears with `between`, and `between` bounds are ordered.
    pub fn validate(&self) -> Result<(), ClauseTermsError> {
        match (self.operator, self.value, self.value_upper) {
            (Some(op), None, _) => Err(ClauseTermsError::MissingValue(op)),
            (Some(ComparisonOp::Between), Some(_), None) => Err(ClauseTermsError::MissingUpper),
            (Some(ComparisonOp::Between), Some(lower), Some(upper)) if lower > upper => {
                Err(ClauseTermsError::BoundsOutOfOrder { lower, upper })
            }
            (op, _, Some(_)) if op != Some(ComparisonOp::Between) => {
                Err(ClauseTermsError::UpperWithoutBetween(op))
            }
            _ => Ok(()),
        }
    }
}

/// One extracted contractual obligation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub id: ClauseId,
    /// Human-facing label, e.g. "Q-1" or "MIN-QTY".
    pub clause_id: String,
    pub category: ClauseCategory,
    pub kind: ClauseKind,
    pub description: String,
    pub confidence: Confidence,
    pub terms: ClauseTerms,
    pub extracted_at: DateTime<Utc>,
}

impl Clause {
    pub fn new(
        clause_id: impl Into<String>,
        category: ClauseCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: ClauseId::generate(),
            clause_id: clause_id.into(),
            category,
            kind: category.default_kind(),
            description: description.into(),
            confidence: Confidence::High,
            terms: ClauseTerms::default(),
            extracted_at: Utc::now(),
        }
    }

    pub fn with_kind(mut self, kind: ClauseKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_terms(mut self, terms: ClauseTerms) -> Self {
        self.terms = terms;
        self
    }

    /// Whether this clause can be mapped onto a solver input.
    pub fn is_mappable(&self) -> bool {
        self.terms.parameter.is_some() && self.terms.operator.is_some()
    }

    pub fn validate(&self) -> Result<(), ClauseTermsError> {
        self.terms.validate()
    }
}
