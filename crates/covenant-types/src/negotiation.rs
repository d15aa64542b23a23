//! Contract negotiation: the pre-contract wizard as an explicit state machine
//!
//! The wizard is a finite-state record rather than step-indexed mutable
//! session state: `advance` and `back` are pure functions from
//! `(state, input)` to a new state, validated transition by transition.

use serde::{Deserialize, Serialize};

use crate::clause::Clause;
use crate::contract::CounterpartyType;
use crate::ids::{ContractId, NegotiationId};

/// Wizard steps, in order.
///
/// Five steps cover the whole flow: product-group and entity selection ride
/// with `Terms`, and the closing summary is part of `Confirm` rather than
/// steps of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStep {
    Counterparty,
    Terms,
    Clauses,
    OptimizerPreview,
    Confirm,
}

impl NegotiationStep {
    fn next(&self) -> Option<Self> {
        match self {
            Self::Counterparty => Some(Self::Terms),
            Self::Terms => Some(Self::Clauses),
            Self::Clauses => Some(Self::OptimizerPreview),
            Self::OptimizerPreview => Some(Self::Confirm),
            Self::Confirm => None,
        }
    }

    fn prev(&self) -> Option<Self> {
        match self {
            Self::Counterparty => None,
            Self::Terms => Some(Self::Counterparty),
            Self::Clauses => Some(Self::Terms),
            Self::OptimizerPreview => Some(Self::Clauses),
            Self::Confirm => Some(Self::OptimizerPreview),
        }
    }
}

/// Partially collected contract terms, filled in step by step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DraftTerms {
    pub counterparty: Option<String>,
    pub counterparty_type: Option<CounterpartyType>,
    pub product_group: Option<String>,
    pub template_type: Option<String>,
    pub incoterm: Option<String>,
    pub term_type: Option<String>,
    pub company_entity: Option<String>,
}

/// Input for one wizard step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepInput {
    Counterparty {
        name: String,
        counterparty_type: CounterpartyType,
    },
    Terms {
        product_group: String,
        template_type: String,
        company_entity: String,
        incoterm: Option<String>,
        term_type: Option<String>,
    },
    Clauses(Vec<Clause>),
    /// Snapshot of the optimizer state shown to the user at preview time.
    OptimizerSnapshot(serde_json::Value),
    Confirm,
}

/// Errors from wizard transitions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NegotiationError {
    #[error("input {input} not valid at step {step:?}")]
    WrongInputForStep { step: NegotiationStep, input: String },

    #[error("cannot go back from the first step")]
    AtFirstStep,

    #[error("negotiation already submitted")]
    AlreadySubmitted,

    #[error("counterparty name must not be empty")]
    EmptyCounterparty,
}

/// A draft-stage negotiation record owning the wizard state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractNegotiation {
    pub id: NegotiationId,
    pub step: NegotiationStep,
    pub terms: DraftTerms,
    pub chosen_clauses: Vec<Clause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimizer_snapshot: Option<serde_json::Value>,
    /// Set once the negotiation is submitted; exactly one contract results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<ContractId>,
}

impl ContractNegotiation {
    pub fn new() -> Self {
        Self {
            id: NegotiationId::generate(),
            step: NegotiationStep::Counterparty,
            terms: DraftTerms::default(),
            chosen_clauses: Vec::new(),
            optimizer_snapshot: None,
            contract_id: None,
        }
    }

    /// Apply the input for the current step and move to the next one.
    ///
    /// Pure: returns a new state, the original is untouched on error.
    pub fn advance(mut self, input: StepInput) -> Result<Self, NegotiationError> {
        if self.contract_id.is_some() {
            return Err(NegotiationError::AlreadySubmitted);
        }
        match (self.step, input) {
            (
                NegotiationStep::Counterparty,
                StepInput::Counterparty {
                    name,
                    counterparty_type,
                },
            ) => {
                if name.trim().is_empty() {
                    return Err(NegotiationError::EmptyCounterparty);
                }
                self.terms.counterparty = Some(name);
                self.terms.counterparty_type = Some(counterparty_type);
            }
            (
                NegotiationStep::Terms,
                StepInput::Terms {
                    product_group,
                    template_type,
                    company_entity,
                    incoterm,
                    term_type,
                },
            ) => {
                self.terms.product_group = Some(product_group);
                self.terms.template_type = Some(template_type);
                self.terms.company_entity = Some(company_entity);
                self.terms.incoterm = incoterm;
                self.terms.term_type = term_type;
            }
            (NegotiationStep::Clauses, StepInput::Clauses(clauses)) => {
                self.chosen_clauses = clauses;
            }
            (NegotiationStep::OptimizerPreview, StepInput::OptimizerSnapshot(snapshot)) => {
                self.optimizer_snapshot = Some(snapshot);
            }
            (NegotiationStep::Confirm, StepInput::Confirm) => {
                // Submission itself happens in the store; the wizard only
                // records that the final step was confirmed.
            }
            (step, input) => {
                return Err(NegotiationError::WrongInputForStep {
                    step,
                    input: input_label(&input).to_string(),
                });
            }
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self)
    }

    /// Step back without discarding collected fields.
    pub fn back(mut self) -> Result<Self, NegotiationError> {
        if self.contract_id.is_some() {
            return Err(NegotiationError::AlreadySubmitted);
        }
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                Ok(self)
            }
            None => Err(NegotiationError::AtFirstStep),
        }
    }

    /// Record the contract that resulted from this negotiation.
    pub fn mark_submitted(&mut self, contract_id: ContractId) {
        self.contract_id = Some(contract_id);
    }
}

impl Default for ContractNegotiation {
    fn default() -> Self {
        Self::new()
    }
}

fn input_label(input: &StepInput) -> &'static str {
    match input {
        StepInput::Counterparty { .. } => "counterparty",
        StepInput::Terms { .. } => "terms",
        StepInput::Clauses(_) => "clauses",
        StepInput::OptimizerSnapshot(_) => "optimizer_snapshot",
        StepInput::Confirm => "confirm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counterparty_input() -> StepInput {
        StepInput::Counterparty {
            name: "Trafigura".into(),
            counterparty_type: CounterpartyType::Supplier,
        }
    }

    #[test]
    fn test_advance_through_all_steps() {
        let neg = ContractNegotiation::new();
        assert_eq!(neg.step, NegotiationStep::Counterparty);

        let neg = neg.advance(counterparty_input()).unwrap();
        assert_eq!(neg.step, NegotiationStep::Terms);

        let neg = neg
            .advance(StepInput::Terms {
                product_group: "anthracite".into(),
                template_type: "supply_frame".into(),
                company_entity: "TradeCo EU".into(),
                incoterm: Some("CIF".into()),
                term_type: None,
            })
            .unwrap();
        assert_eq!(neg.step, NegotiationStep::Clauses);

        let neg = neg.advance(StepInput::Clauses(Vec::new())).unwrap();
        let neg = neg
            .advance(StepInput::OptimizerSnapshot(serde_json::json!({
                "profit": 1_250_000.0
            })))
            .unwrap();
        assert_eq!(neg.step, NegotiationStep::Confirm);

        let neg = neg.advance(StepInput::Confirm).unwrap();
        // Confirm is the last step; state stays there
        assert_eq!(neg.step, NegotiationStep::Confirm);
        assert_eq!(neg.terms.counterparty.as_deref(), Some("Trafigura"));
    }

    #[test]
    fn test_wrong_input_for_step() {
        let neg = ContractNegotiation::new();
        let err = neg.advance(StepInput::Confirm).unwrap_err();
        assert!(matches!(err, NegotiationError::WrongInputForStep { .. }));
    }

    #[test]
    fn test_back_preserves_fields() {
        let neg = ContractNegotiation::new()
            .advance(counterparty_input())
            .unwrap();
        let neg = neg.back().unwrap();
        assert_eq!(neg.step, NegotiationStep::Counterparty);
        // Collected fields survive going back
        assert_eq!(neg.terms.counterparty.as_deref(), Some("Trafigura"));
    }

    #[test]
    fn test_back_at_first_step() {
        let neg = ContractNegotiation::new();
        assert_eq!(neg.back().unwrap_err(), NegotiationError::AtFirstStep);
    }

    #[test]
    fn test_empty_counterparty_rejected() {
        let neg = ContractNegotiation::new();
        let err = neg
            .advance(StepInput::Counterparty {
                name: "  ".into(),
                counterparty_type: CounterpartyType::Customer,
            })
            .unwrap_err();
        assert_eq!(err, NegotiationError::EmptyCounterparty);
    }

    #[test]
    fn test_submitted_negotiation_is_frozen() {
        let mut neg = ContractNegotiation::new();
        neg.mark_submitted(ContractId::generate());
        assert_eq!(
            neg.clone().advance(counterparty_input()).unwrap_err(),
            NegotiationError::AlreadySubmitted
        );
        assert_eq!(neg.back().unwrap_err(), NegotiationError::AlreadySubmitted);
    }
}
