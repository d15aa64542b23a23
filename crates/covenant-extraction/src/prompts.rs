//! Prompt builders for the two extraction stages.

pub const TRUNCATION_MARK: &str = "\n[TEXT TRUNCATED TO FIT BUDGET]";

/// Truncate `text` to `budget` characters, marking the cut in the output.
pub fn truncate_marked(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let cut: String = text.chars().take(budget).collect();
    format!("{}{}", cut, TRUNCATION_MARK)
}

/// Stage 1: transcription only. No interpretation, no constraints.
pub fn stage_one_prompt(raw_text: &str, budget: usize) -> String {
    format!(
        r#"You are transcribing facts from a commodity trading contract into a fixed schema.
Copy values exactly as written. Do NOT interpret, summarize, or formulate constraints.
Use null for any section the text does not cover.

Return a single JSON object:
{{"contract_data": {{
  "parties": ..., "quantities": ..., "pricing": ..., "delivery_schedule": ...,
  "logistics": ..., "payment": ..., "quality": ..., "penalties": ...,
  "take_or_pay": ..., "force_majeure": ..., "insurance": ..., "legal": ...,
  "optionality": ...
}}}}

CONTRACT TEXT:
{}"#,
        truncate_marked(raw_text, budget)
    )
}

/// Stage 2: formulate LP clauses strictly from the transcribed facts.
pub fn stage_two_prompt(facts_json: &str) -> String {
    format!(
        r#"You are formulating linear-programming constraint clauses for a trading optimizer.
Work ONLY from the structured contract data below. Every clause must reference a
field that is present and non-null in the data; NEVER invent values or parameters.

Return a single JSON object:
{{"clauses": [{{
  "clause_id": "Q-1", "category": "quantity", "type": "obligation",
  "description": "...", "confidence": "high|medium|low",
  "parameter": "field_name", "operator": ">=|<=|==|between",
  "value": 0, "value_upper": null, "unit": "...",
  "penalty_rate": null, "penalty_cap": null, "reporting_period": null,
  "source_text": "..."
}}]}}

Omit any field you cannot ground in the data.

CONTRACT DATA:
{}"#,
        facts_json
    )
}

/// Single-stage fallback: direct clause extraction from (truncated) raw text.
pub fn single_stage_prompt(raw_text: &str, budget: usize) -> String {
    format!(
        r#"Extract linear-programming constraint clauses from this commodity trading contract.
Only use values that appear in the text; never invent numbers.

Return a single JSON object:
{{"clauses": [{{
  "clause_id": "Q-1", "category": "quantity", "type": "obligation",
  "description": "...", "confidence": "high|medium|low",
  "parameter": "field_name", "operator": ">=|<=|==|between",
  "value": 0, "value_upper": null, "unit": "...",
  "penalty_rate": null, "penalty_cap": null, "reporting_period": null,
  "source_text": "..."
}}]}}

CONTRACT TEXT:
{}"#,
        truncate_marked(raw_text, budget)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_marked() {
        let short = truncate_marked("hello", 100);
        assert_eq!(short, "hello");
        assert!(!short.contains(TRUNCATION_MARK));

        let long = truncate_marked(&"x".repeat(200), 50);
        assert!(long.starts_with(&"x".repeat(50)));
        assert!(long.ends_with(TRUNCATION_MARK));
    }

    #[test]
    fn test_stage_prompts_embed_text() {
        let p1 = stage_one_prompt("QUANTITY: 5000 tons minimum", 1000);
        assert!(p1.contains("5000 tons"));
        assert!(p1.contains("contract_data"));

        let p2 = stage_two_prompt(r#"{"pricing": {"base": 450}}"#);
        assert!(p2.contains(r#""base": 450"#));
        assert!(p2.contains("NEVER invent"));
    }
}
