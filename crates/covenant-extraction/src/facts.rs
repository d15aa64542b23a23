//! Stage-1 structured schema: transcribed contract facts.
//!
//! Stage 1 transcribes, never interprets. Every section is `null` when the
//! source text carries nothing for it; stage 2 may only formulate clauses
//! from fields that are actually present here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed transcription schema for stage-1 output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContractFacts {
    #[serde(default)]
    pub parties: Option<Value>,
    #[serde(default)]
    pub quantities: Option<Value>,
    #[serde(default)]
    pub pricing: Option<Value>,
    #[serde(default)]
    pub delivery_schedule: Option<Value>,
    #[serde(default)]
    pub logistics: Option<Value>,
    #[serde(default)]
    pub payment: Option<Value>,
    #[serde(default)]
    pub quality: Option<Value>,
    #[serde(default)]
    pub penalties: Option<Value>,
    #[serde(default)]
    pub take_or_pay: Option<Value>,
    #[serde(default)]
    pub force_majeure: Option<Value>,
    #[serde(default)]
    pub insurance: Option<Value>,
    #[serde(default)]
    pub legal: Option<Value>,
    #[serde(default)]
    pub optionality: Option<Value>,
}

impl ContractFacts {
    fn sections(&self) -> [(&'static str, &Option<Value>); 13] {
        [
            ("parties", &self.parties),
            ("quantities", &self.quantities),
            ("pricing", &self.pricing),
            ("delivery_schedule", &self.delivery_schedule),
            ("logistics", &self.logistics),
            ("payment", &self.payment),
            ("quality", &self.quality),
            ("penalties", &self.penalties),
            ("take_or_pay", &self.take_or_pay),
            ("force_majeure", &self.force_majeure),
            ("insurance", &self.insurance),
            ("legal", &self.legal),
            ("optionality", &self.optionality),
        ]
    }

    /// Names of the sections the transcription actually filled in.
    pub fn present_sections(&self) -> Vec<&'static str> {
        self.sections()
            .into_iter()
            .filter(|(_, v)| matches!(v, Some(val) if !val.is_null()))
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.present_sections().is_empty()
    }

    /// Whether a named field appears anywhere in the non-null sections.
    ///
    /// Stage 2 is forbidden from referencing parameters that are not
    /// grounded in the transcription; this is the grounding check.
    pub fn contains_field(&self, field: &str) -> bool {
        self.sections()
            .into_iter()
            .filter_map(|(_, v)| v.as_ref())
            .any(|v| value_has_key(v, field))
    }
}

fn value_has_key(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| k == key || value_has_key(v, key)),
        Value::Array(items) => items.iter().any(|v| value_has_key(v, key)),
        _ => false,
    }
}
