//! The two-stage extraction engine.
//!
//! Stage 1 transcribes the raw contract text into the fixed `ContractFacts`
//! schema with a fast model. Stage 2 hands that structured JSON (never the
//! raw text) to a stronger model that formulates LP clauses strictly from
//! present fields. The fallback ladder:
//!
//! 1. No extractor but a reasoner: single-stage direct extraction.
//! 2. Stage-1 failure (model error or unrecoverable JSON): single-stage
//!    with whichever model is available.
//! 3. No model at all, or terminal model failure: empty clause list.
//!    Ingestion degrades to a clauseless contract, it never aborts.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use covenant_types::{Clause, ClauseCategory, ClauseKind, ClauseTerms, ComparisonOp, Confidence};

use crate::backend::ModelBackend;
use crate::config::ModelRoles;
use crate::error::ExtractionError;
use crate::facts::ContractFacts;
use crate::prompts;
use crate::recover::recover_object;

/// Converts raw contract text into typed clauses.
pub struct ExtractionEngine {
    backend: Arc<dyn ModelBackend>,
    roles: ModelRoles,
}

impl ExtractionEngine {
    pub fn new(backend: Arc<dyn ModelBackend>, roles: ModelRoles) -> Self {
        Self { backend, roles }
    }

    /// Extract clauses from raw contract text.
    ///
    /// Model failures never abort ingestion; the worst outcome is an empty
    /// clause list pending manual entry.
    pub async fn extract(&self, raw_text: &str) -> Result<Vec<Clause>, ExtractionError> {
        if !self.roles.any_configured() {
            info!("no model configured, ingesting clauseless");
            return Ok(Vec::new());
        }

        if let Some(extractor) = self.roles.extractor.clone() {
            let prompt =
                prompts::stage_one_prompt(raw_text, self.roles.stage_one_char_budget);
            match self
                .backend
                .generate(&extractor, &prompt, self.roles.max_tokens)
                .await
            {
                Ok(response) => match parse_facts(&response) {
                    Some(facts) => return self.formulate(&facts).await,
                    None => {
                        warn!(model = %extractor, "stage-1 response unrecoverable, falling back to single-stage");
                    }
                },
                Err(e) => {
                    warn!(model = %extractor, error = %e, "stage-1 model call failed, falling back to single-stage");
                }
            }
        }

        self.single_stage(raw_text).await
    }

    /// Stage 2: formulate clauses from transcribed facts.
    async fn formulate(&self, facts: &ContractFacts) -> Result<Vec<Clause>, ExtractionError> {
        let model = match self.roles.formulation_model() {
            Some(m) => m.to_string(),
            None => return Ok(Vec::new()),
        };
        let facts_json = serde_json::to_string_pretty(facts)?;
        let prompt = prompts::stage_two_prompt(&facts_json);

        match self
            .backend
            .generate(&model, &prompt, self.roles.max_tokens)
            .await
        {
            Ok(response) => {
                let clauses = map_clauses(parse_drafts(&response), Some(facts));
                debug!(count = clauses.len(), "stage-2 formulation complete");
                Ok(clauses)
            }
            Err(e) => {
                warn!(model = %model, error = %e, "stage-2 model call failed, ingesting clauseless");
                Ok(Vec::new())
            }
        }
    }

    /// Single-stage direct extraction from truncated raw text.
    async fn single_stage(&self, raw_text: &str) -> Result<Vec<Clause>, ExtractionError> {
        let model = match self.roles.formulation_model() {
            Some(m) => m.to_string(),
            None => return Ok(Vec::new()),
        };
        let prompt =
            prompts::single_stage_prompt(raw_text, self.roles.single_stage_char_budget);

        match self
            .backend
            .generate(&model, &prompt, self.roles.max_tokens)
            .await
        {
            Ok(response) => {
                let clauses = map_clauses(parse_drafts(&response), None);
                debug!(count = clauses.len(), "single-stage extraction complete");
                Ok(clauses)
            }
            Err(e) => {
                warn!(model = %model, error = %e, "single-stage model call failed, ingesting clauseless");
                Ok(Vec::new())
            }
        }
    }
}

/// Parse a stage-1 response into `ContractFacts`.
///
/// Accepts either `{"contract_data": {...}}` or the bare facts object.
fn parse_facts(response: &str) -> Option<ContractFacts> {
    let object = recover_object(response)?;
    let inner = object.get("contract_data").cloned().unwrap_or(object);
    serde_json::from_value(inner).ok()
}

/// Raw clause shape as the model emits it. Everything optional; the mapping
/// step decides what survives.
#[derive(Debug, Clone, Deserialize)]
struct ClauseDraft {
    #[serde(default)]
    clause_id: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    parameter: Option<String>,
    #[serde(default)]
    operator: Option<String>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    value_upper: Option<Value>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    penalty_rate: Option<Value>,
    #[serde(default)]
    penalty_cap: Option<Value>,
    #[serde(default)]
    reporting_period: Option<String>,
    #[serde(default)]
    source_text: Option<String>,
}

fn parse_drafts(response: &str) -> Vec<ClauseDraft> {
    let Some(object) = recover_object(response) else {
        warn!("clause response carried no recoverable JSON object");
        return Vec::new();
    };
    match object.get("clauses") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => {
            warn!("clause response missing 'clauses' array");
            Vec::new()
        }
    }
}

/// Coerce a model-emitted numeric field; tolerates quoted numbers.
fn as_number(value: &Option<Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// Deterministic mapping from drafts to typed clauses.
///
/// When `facts` is given (two-stage path), clauses whose parameter is not
/// grounded in the stage-1 output are dropped: stage 2 may not invent
/// values the transcription never saw. Clauses with structurally invalid
/// terms (e.g. `between` bounds out of order) are rejected here, before
/// anything reaches the store.
fn map_clauses(drafts: Vec<ClauseDraft>, facts: Option<&ContractFacts>) -> Vec<Clause> {
    let mut clauses = Vec::with_capacity(drafts.len());
    for (index, draft) in drafts.into_iter().enumerate() {
        if let (Some(facts), Some(parameter)) = (facts, draft.parameter.as_deref()) {
            if !facts.contains_field(parameter) {
                warn!(parameter, "dropping ungrounded clause");
                continue;
            }
        }

        let category = ClauseCategory::from_label(draft.category.as_deref().unwrap_or(""));
        let kind = draft
            .kind
            .as_deref()
            .and_then(ClauseKind::from_label)
            .unwrap_or_else(|| category.default_kind());

        let terms = ClauseTerms {
            parameter: draft.parameter,
            operator: draft.operator.as_deref().and_then(ComparisonOp::from_symbol),
            value: as_number(&draft.value),
            value_upper: as_number(&draft.value_upper),
            unit: draft.unit,
            penalty_rate: as_number(&draft.penalty_rate),
            penalty_cap: as_number(&draft.penalty_cap),
            reporting_period: draft.reporting_period,
            source_excerpt: draft.source_text,
        };
        if let Err(e) = terms.validate() {
            warn!(error = %e, "dropping clause with invalid terms");
            continue;
        }

        let clause_id = draft
            .clause_id
            .unwrap_or_else(|| format!("C-{}", index + 1));
        let clause = Clause::new(clause_id, category, draft.description.unwrap_or_default())
            .with_kind(kind)
            .with_confidence(Confidence::from_label(draft.confidence.as_deref()))
            .with_terms(terms);
        clauses.push(clause);
    }
    clauses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{FailingModel, ScriptedModel};
    use covenant_types::ComparisonOp;

    fn roles_both() -> ModelRoles {
        ModelRoles::new()
            .with_extractor("fast-transcriber")
            .with_reasoner("strong-reasoner")
    }

    const STAGE_ONE_RESPONSE: &str = r#"```json
{"contract_data": {
  "quantities": {"annual_qty": 5000, "unit": "tons"},
  "pricing": {"base_price_usd_per_mt": 450}
}}
```"#;

    const STAGE_TWO_RESPONSE: &str = r#"{"clauses": [
  {"clause_id": "Q-1", "category": "quantity", "type": "obligation",
   "description": "Minimum annual quantity",
   "parameter": "annual_qty", "operator": ">=", "value": 5000, "unit": "tons"},
  {"clause_id": "P-1", "category": "pricing",
   "description": "Base price",
   "parameter": "base_price_usd_per_mt", "operator": "==", "value": 450,
   "unit": "USD/mt", "confidence": "medium"}
]}"#;

    #[tokio::test]
    async fn test_no_model_configured_is_clauseless() {
        let backend = Arc::new(ScriptedModel::new(vec![]));
        let engine = ExtractionEngine::new(backend.clone(), ModelRoles::new());
        let clauses = engine.extract("QUANTITY: 5000 tons").await.unwrap();
        assert!(clauses.is_empty());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_two_stage_happy_path() {
        let backend = Arc::new(ScriptedModel::new(vec![
            STAGE_ONE_RESPONSE,
            STAGE_TWO_RESPONSE,
        ]));
        let engine = ExtractionEngine::new(backend.clone(), roles_both());
        let clauses = engine
            .extract("Seller shall deliver a minimum of 5,000 tons annually at USD 450/mt.")
            .await
            .unwrap();

        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].clause_id, "Q-1");
        assert_eq!(clauses[0].category, ClauseCategory::Quantity);
        assert_eq!(clauses[0].terms.operator, Some(ComparisonOp::Gte));
        assert_eq!(clauses[0].terms.value, Some(5000.0));
        assert_eq!(clauses[1].confidence, Confidence::Medium);

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "fast-transcriber");
        assert_eq!(calls[1].0, "strong-reasoner");
        // Stage 2 sees structured facts, never the raw noisy text
        assert!(calls[1].1.contains("annual_qty"));
        assert!(!calls[1].1.contains("Seller shall deliver"));
    }

    #[tokio::test]
    async fn test_stage_two_drops_ungrounded_clauses() {
        let stage_one = r#"{"contract_data": {"pricing": {"base_price_usd_per_mt": 450}}}"#;
        let stage_two = r#"{"clauses": [
          {"clause_id": "P-1", "category": "pricing", "description": "Base price",
           "parameter": "base_price_usd_per_mt", "operator": "==", "value": 450},
          {"clause_id": "D-1", "category": "demurrage", "description": "Invented demurrage",
           "parameter": "demurrage_usd_per_day", "operator": "<=", "value": 15000}
        ]}"#;
        let backend = Arc::new(ScriptedModel::new(vec![stage_one, stage_two]));
        let engine = ExtractionEngine::new(backend, roles_both());

        let clauses = engine.extract("...").await.unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(
            clauses[0].terms.parameter.as_deref(),
            Some("base_price_usd_per_mt")
        );
    }

    #[tokio::test]
    async fn test_stage_one_garbage_falls_back_to_single_stage() {
        let backend = Arc::new(ScriptedModel::new(vec![
            "I could not process this document, sorry.",
            STAGE_TWO_RESPONSE,
        ]));
        let engine = ExtractionEngine::new(backend.clone(), roles_both());
        let clauses = engine.extract("raw contract text").await.unwrap();

        // Single-stage path has no grounding filter, both clauses survive
        assert_eq!(clauses.len(), 2);
        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        // Fallback call goes to the reasoner with the raw text
        assert_eq!(calls[1].0, "strong-reasoner");
        assert!(calls[1].1.contains("raw contract text"));
    }

    #[tokio::test]
    async fn test_reasoner_only_uses_single_stage() {
        let backend = Arc::new(ScriptedModel::new(vec![STAGE_TWO_RESPONSE]));
        let engine = ExtractionEngine::new(
            backend.clone(),
            ModelRoles::new().with_reasoner("strong-reasoner"),
        );
        let clauses = engine.extract("raw contract text").await.unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_clauseless() {
        let backend = Arc::new(FailingModel::unreachable());
        let engine = ExtractionEngine::new(backend, roles_both());
        let clauses = engine.extract("raw contract text").await.unwrap();
        assert!(clauses.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_clause_json_is_clauseless() {
        let backend = Arc::new(ScriptedModel::new(vec!["not json", "still not json"]));
        let engine = ExtractionEngine::new(backend, roles_both());
        let clauses = engine.extract("raw contract text").await.unwrap();
        assert!(clauses.is_empty());
    }

    #[tokio::test]
    async fn test_between_bounds_rejected_before_store() {
        let stage_two = r#"{"clauses": [
          {"clause_id": "QS-1", "category": "quality_spec", "description": "Ash content",
           "parameter": "ash_pct", "operator": "between", "value": 12.0, "value_upper": 8.0},
          {"clause_id": "QS-2", "category": "quality_spec", "description": "Moisture",
           "parameter": "moisture_pct", "operator": "between", "value": 6.0, "value_upper": 10.0}
        ]}"#;
        let backend = Arc::new(ScriptedModel::new(vec![stage_two]));
        let engine = ExtractionEngine::new(
            backend,
            ModelRoles::new().with_reasoner("strong-reasoner"),
        );
        let clauses = engine.extract("...").await.unwrap();
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].clause_id, "QS-2");
        assert!(clauses[0].terms.value.unwrap() <= clauses[0].terms.value_upper.unwrap());
    }

    #[tokio::test]
    async fn test_mapping_is_deterministic() {
        let run = |responses: Vec<&'static str>| async move {
            let backend = Arc::new(ScriptedModel::new(responses));
            let engine = ExtractionEngine::new(backend, roles_both());
            engine.extract("same input text").await.unwrap()
        };

        let first = run(vec![STAGE_ONE_RESPONSE, STAGE_TWO_RESPONSE]).await;
        let second = run(vec![STAGE_ONE_RESPONSE, STAGE_TWO_RESPONSE]).await;

        // Equal up to generated ids and timestamps
        let key = |cs: &[Clause]| {
            cs.iter()
                .map(|c| {
                    (
                        c.clause_id.clone(),
                        c.category,
                        c.kind,
                        c.confidence,
                        c.description.clone(),
                        c.terms.clone(),
                    )
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(key(&first), key(&second));
    }

    #[tokio::test]
    async fn test_quoted_numbers_coerced() {
        let stage_two = r#"{"clauses": [
          {"clause_id": "Q-1", "category": "quantity", "description": "Min qty",
           "parameter": "annual_qty", "operator": ">=", "value": "5,000"}
        ]}"#;
        let backend = Arc::new(ScriptedModel::new(vec![stage_two]));
        let engine = ExtractionEngine::new(
            backend,
            ModelRoles::new().with_reasoner("strong-reasoner"),
        );
        let clauses = engine.extract("...").await.unwrap();
        assert_eq!(clauses[0].terms.value, Some(5000.0));
    }

    #[tokio::test]
    async fn test_unknown_category_maps_to_condition() {
        let stage_two = r#"{"clauses": [
          {"clause_id": "X-1", "category": "weather_adjustment", "description": "Odd clause"}
        ]}"#;
        let backend = Arc::new(ScriptedModel::new(vec![stage_two]));
        let engine = ExtractionEngine::new(
            backend,
            ModelRoles::new().with_reasoner("strong-reasoner"),
        );
        let clauses = engine.extract("...").await.unwrap();
        assert_eq!(clauses[0].category, ClauseCategory::Condition);
        assert_eq!(clauses[0].kind, ClauseKind::Condition);
        assert_eq!(clauses[0].confidence, Confidence::High);
    }
}
