//! Context rewriting: fold the previous step's output into the goal

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{Phase, PlannerError, PlannerSettings};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{PromptLoader, RewritePromptContext};

const SYSTEM_PROMPT: &str = "You rewrite questions. You answer with the question only.";

/// Rewrites a goal so it is self-contained given what an earlier step found
pub struct ContextRewriter {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    settings: PlannerSettings,
}

impl ContextRewriter {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, settings: PlannerSettings) -> Self {
        debug!(?settings, "ContextRewriter::new: called");
        Self { llm, prompts, settings }
    }

    /// Return the goal updated with `previous_output`, trimmed
    ///
    /// An empty completion leaves the goal unchanged. `step` is the index of
    /// the step being prepared and is only used for error reporting.
    pub async fn rewrite(&self, goal: &str, previous_output: &str, step: usize) -> Result<String, PlannerError> {
        debug!(%step, goal_len = goal.len(), output_len = previous_output.len(), "ContextRewriter::rewrite: called");
        let prompt = self
            .prompts
            .rewrite_prompt(&RewritePromptContext {
                question: goal.to_string(),
                previous_output: previous_output.to_string(),
            })
            .map_err(|e| PlannerError::Prompt {
                phase: Phase::Invocation,
                message: e.to_string(),
            })?;

        let request = CompletionRequest::prompt(SYSTEM_PROMPT, prompt, self.settings.max_tokens)
            .with_temperature(self.settings.temperature);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|source| PlannerError::CompletionService {
                phase: Phase::Invocation,
                step: Some(step),
                source,
            })?;

        let rewritten = response.text_or_empty().trim();
        if rewritten.is_empty() {
            warn!(%step, "ContextRewriter::rewrite: empty completion, keeping goal");
            return Ok(goal.to_string());
        }

        info!(%step, %rewritten, "ContextRewriter::rewrite: goal updated");
        Ok(rewritten.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;

    fn rewriter(mock: Arc<MockLlmClient>) -> ContextRewriter {
        ContextRewriter::new(mock, Arc::new(PromptLoader::embedded_only()), PlannerSettings::default())
    }

    #[tokio::test]
    async fn test_rewrite_trims_completion() {
        let mock = Arc::new(MockLlmClient::with_texts(&["  What are the wifi incidents in Barcelona?\n"]));

        let out = rewriter(mock.clone())
            .rewrite("What are the wifi incidents in the capital of Catalonia?", "Barcelona", 1)
            .await
            .unwrap();

        assert_eq!(out, "What are the wifi incidents in Barcelona?");
        let prompts = mock.prompts();
        assert!(prompts[0].starts_with("I have the following question:"));
        assert!(prompts[0].contains("capital of Catalonia"));
        assert!(prompts[0].contains("Barcelona"));
    }

    #[tokio::test]
    async fn test_empty_completion_keeps_goal() {
        let mock = Arc::new(MockLlmClient::with_texts(&["   "]));
        let out = rewriter(mock).rewrite("original goal", "output", 1).await.unwrap();
        assert_eq!(out, "original goal");
    }

    #[tokio::test]
    async fn test_failure_carries_step() {
        let mock = Arc::new(MockLlmClient::with_texts(&[]));
        let err = rewriter(mock).rewrite("goal", "output", 2).await.unwrap_err();
        assert_eq!(err.step(), Some(2));
        assert!(matches!(err, PlannerError::CompletionService { .. }));
    }
}
