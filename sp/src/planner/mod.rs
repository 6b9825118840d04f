//! Planner core
//!
//! A request flows through four phases:
//! 1. Synthesis - the completion service turns the goal and the function
//!    manual into a raw plan text
//! 2. Parsing - the raw text becomes a validated `Plan`
//! 3. Resolution - every `skill.function` reference is looked up
//! 4. Invocation - steps run in order, each fed the previous output
//!
//! Failures in any phase abort the request with a `PlannerError`.

mod error;
mod executor;
mod extract;
mod overrides;
mod plan;
mod rewriter;
mod synthesizer;

use std::sync::Arc;

use tracing::{debug, info};

pub use error::{Phase, PlannerError};
pub use executor::{ExecutionReport, INPUT_KEY, PlanExecutor, StepRecord};
pub use overrides::{HEADERS_KEY, Overrides, QUESTION_KEY, REQUEST_BODY_KEY};
pub use plan::{Plan, Subtask};
pub use rewriter::ContextRewriter;
pub use synthesizer::PlanSynthesizer;

use crate::config::{Config, LlmConfig};
use crate::domain::RequestContext;
use crate::llm::LlmClient;
use crate::prompts::PromptLoader;
use crate::skills::SkillRegistry;

/// Completion parameters shared by synthesis and rewriting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerSettings {
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for PlannerSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Entry point: synthesize a plan for a goal and run it
pub struct Planner {
    registry: Arc<SkillRegistry>,
    synthesizer: PlanSynthesizer,
    executor: PlanExecutor,
}

impl Planner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        registry: Arc<SkillRegistry>,
        prompts: Arc<PromptLoader>,
        settings: PlannerSettings,
    ) -> Self {
        debug!(functions = registry.function_count(), "Planner::new: called");
        let synthesizer = PlanSynthesizer::new(Arc::clone(&llm), Arc::clone(&prompts), settings);
        let rewriter = ContextRewriter::new(llm, prompts, settings);
        let executor = PlanExecutor::new(Arc::clone(&registry), rewriter);
        Self {
            registry,
            synthesizer,
            executor,
        }
    }

    /// Build a planner from configuration with the given completion client
    pub fn from_config(config: &Config, llm: Arc<dyn LlmClient>, registry: Arc<SkillRegistry>) -> Self {
        debug!("Planner::from_config: called");
        let prompts = Arc::new(PromptLoader::new(config.prompts_dir.as_deref()));
        Self::new(llm, registry, prompts, PlannerSettings::from(&config.llm))
    }

    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    /// Synthesize and parse a plan without running it
    pub async fn plan(&self, goal: &str) -> Result<Plan, PlannerError> {
        debug!(goal_len = goal.len(), "Planner::plan: called");
        let manual = self.registry.describe();
        let raw = self.synthesizer.synthesize(goal, &manual).await?;
        let plan = Plan::parse(goal, &raw)?;
        info!(steps = plan.len(), "Planner::plan: plan parsed");
        Ok(plan)
    }

    /// Answer `goal`: plan, then execute with `request` bound as the
    /// `question` override
    pub async fn run(
        &self,
        goal: &str,
        request: &RequestContext,
        overrides: &Overrides,
    ) -> Result<String, PlannerError> {
        debug!(goal_len = goal.len(), "Planner::run: called");
        Ok(self.run_traced(goal, request, overrides).await?.output)
    }

    /// Same as `run`, also returning what every step did
    pub async fn run_traced(
        &self,
        goal: &str,
        request: &RequestContext,
        overrides: &Overrides,
    ) -> Result<ExecutionReport, PlannerError> {
        debug!(goal_len = goal.len(), "Planner::run_traced: called");
        let plan = self.plan(goal).await?;
        self.executor.execute_traced(plan, request, overrides).await
    }
}
