//! Extraction engine configuration.
//!
//! Model availability is an explicit, injected configuration object rather
//! than an ambient registry lookup. Either role may be absent; the engine
//! degrades stage by stage (see `engine`).

/// Character budget for stage-1 transcription prompts.
pub const STAGE_ONE_CHAR_BUDGET: usize = 24_000;

/// Character budget for single-stage fallback prompts.
pub const SINGLE_STAGE_CHAR_BUDGET: usize = 12_000;

/// Default completion token cap per model call.
pub const DEFAULT_MAX_TOKENS: u32 = 4_096;

/// Which models serve the two extraction roles.
#[derive(Debug, Clone)]
pub struct ModelRoles {
    /// Fast, cheap model for stage-1 structured transcription.
    pub extractor: Option<String>,
    /// Stronger reasoning model for stage-2 constraint formulation.
    pub reasoner: Option<String>,
    pub stage_one_char_budget: usize,
    pub single_stage_char_budget: usize,
    pub max_tokens: u32,
}

impl ModelRoles {
    pub fn new() -> Self {
        Self {
            extractor: None,
            reasoner: None,
            stage_one_char_budget: STAGE_ONE_CHAR_BUDGET,
            single_stage_char_budget: SINGLE_STAGE_CHAR_BUDGET,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_extractor(mut self, model_id: impl Into<String>) -> Self {
        self.extractor = Some(model_id.into());
        self
    }

    pub fn with_reasoner(mut self, model_id: impl Into<String>) -> Self {
        self.reasoner = Some(model_id.into());
        self
    }

    /// The model used for constraint formulation: the reasoner when
    /// configured, otherwise the extractor.
    pub fn formulation_model(&self) -> Option<&str> {
        self.reasoner.as_deref().or(self.extractor.as_deref())
    }

    pub fn any_configured(&self) -> bool {
        self.extractor.is_some() || self.reasoner.is_some()
    }
}

impl Default for ModelRoles {
    fn default() -> Self {
        Self::new()
    }
}
