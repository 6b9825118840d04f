//! Plan synthesis: one completion call turning a goal into a raw plan text

use std::sync::Arc;

use tracing::{debug, info};

use super::{Phase, PlannerError, PlannerSettings};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{PlannerPromptContext, PromptLoader};

const SYSTEM_PROMPT: &str = "You are a planner. You answer with a single JSON object and nothing else.";

/// Asks the completion service for a plan
pub struct PlanSynthesizer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    settings: PlannerSettings,
}

impl PlanSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, settings: PlannerSettings) -> Self {
        debug!(?settings, "PlanSynthesizer::new: called");
        Self { llm, prompts, settings }
    }

    /// Render the planner prompt for `goal` and return the raw completion text
    ///
    /// The text is returned verbatim; parsing is the plan model's job. Exactly
    /// one completion call is made and it is not retried.
    pub async fn synthesize(&self, goal: &str, functions: &str) -> Result<String, PlannerError> {
        debug!(goal_len = goal.len(), functions_len = functions.len(), "PlanSynthesizer::synthesize: called");
        let prompt = self
            .prompts
            .planner_prompt(&PlannerPromptContext {
                goal: goal.to_string(),
                functions: functions.to_string(),
            })
            .map_err(|e| PlannerError::Prompt {
                phase: Phase::Synthesis,
                message: e.to_string(),
            })?;

        let request = CompletionRequest::prompt(SYSTEM_PROMPT, prompt, self.settings.max_tokens)
            .with_temperature(self.settings.temperature);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|source| PlannerError::CompletionService {
                phase: Phase::Synthesis,
                step: None,
                source,
            })?;

        let raw = response.text_or_empty().to_string();
        info!(raw_len = raw.len(), stop_reason = ?response.stop_reason, "PlanSynthesizer::synthesize: completion received");
        debug!(%raw, "PlanSynthesizer::synthesize: raw plan");
        Ok(raw)
    }
}
