//! Plan execution
//!
//! Steps run strictly in order. Each step sees the invocation arguments left
//! by the previous one: `input` always holds the latest output as text. A
//! step whose arguments carry a `question` gets a goal rewritten from the
//! previous output before it runs. Any failure aborts the run.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::overrides::{QUESTION_KEY, bind_arguments};
use super::{ContextRewriter, Overrides, Plan, PlannerError};
use crate::domain::RequestContext;
use crate::skills::{Arguments, FunctionRef, SkillRegistry, output_text};

/// Key under which the latest output is passed to the next step
pub const INPUT_KEY: &str = "input";

/// What one executed step did
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub reference: FunctionRef,

    /// Goal after rewriting, when the rewriter ran for this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewritten_goal: Option<String>,

    /// Output as text
    pub output: String,
}

/// Result of a run with per-step detail
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub run_id: Uuid,

    /// Final answer text
    pub output: String,

    pub steps: Vec<StepRecord>,
}

/// Mutable state threaded through the steps of one run
struct ExecutionState {
    /// Request as seen by skills; its goal changes when the rewriter runs
    effective: RequestContext,
    /// Arguments passed to every invocation
    arguments: Arguments,
    /// Outputs in step order
    outputs: Vec<Value>,
}

/// Runs parsed plans against a skill registry
pub struct PlanExecutor {
    registry: Arc<SkillRegistry>,
    rewriter: ContextRewriter,
}

impl PlanExecutor {
    pub fn new(registry: Arc<SkillRegistry>, rewriter: ContextRewriter) -> Self {
        debug!(skills = registry.skills().len(), "PlanExecutor::new: called");
        Self { registry, rewriter }
    }

    /// Run `plan` and return the final answer text
    pub async fn execute(
        &self,
        plan: Plan,
        request: &RequestContext,
        overrides: &Overrides,
    ) -> Result<String, PlannerError> {
        debug!(steps = plan.len(), "PlanExecutor::execute: called");
        Ok(self.execute_traced(plan, request, overrides).await?.output)
    }

    /// Run `plan` and return the answer together with what every step did
    ///
    /// Every function reference is resolved before the first step runs, so a
    /// plan naming an unknown skill never has side effects.
    pub async fn execute_traced(
        &self,
        plan: Plan,
        request: &RequestContext,
        overrides: &Overrides,
    ) -> Result<ExecutionReport, PlannerError> {
        let run_id = Uuid::now_v7();
        info!(%run_id, steps = plan.len(), "PlanExecutor::execute_traced: called");

        let resolved = plan
            .subtasks
            .iter()
            .enumerate()
            .map(|(index, subtask)| {
                self.registry
                    .resolve(&subtask.function)
                    .map_err(|e| PlannerError::resolution(index, &subtask.function, e))
            })
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| warn!(%run_id, error = %e, "PlanExecutor::execute_traced: resolution failed"))?;

        let mut state = ExecutionState {
            effective: request.clone(),
            arguments: Arguments::new(),
            outputs: Vec::new(),
        };
        state.arguments.insert(INPUT_KEY.to_string(), plan.input.clone());

        let mut steps = Vec::with_capacity(resolved.len());
        for (index, (subtask, function)) in plan.subtasks.into_iter().zip(resolved).enumerate() {
            debug!(%run_id, %index, reference = %function.reference, "PlanExecutor::execute_traced: step");

            let override_values = overrides.values_for(&state.effective);
            let bound = bind_arguments(&function, subtask.args, &override_values);
            let asks_question = bound.args.contains_key(QUESTION_KEY);
            state.arguments.extend(bound.args);

            let mut rewritten_goal = None;
            let previous = state.outputs.last().filter(|_| asks_question).map(output_text);
            if let Some(previous) = previous {
                let goal = self.rewriter.rewrite(&request.question, &previous, index).await?;
                state.effective = state.effective.with_question(goal.clone());

                // Every request-derived override must see the rewritten goal
                let refreshed = overrides.values_for(&state.effective);
                for name in bound.overridden {
                    if let Some(value) = refreshed.get(&name) {
                        state.arguments.insert(name, value.clone());
                    }
                }
                rewritten_goal = Some(goal);
            }

            let output = function
                .function
                .invoke(&state.arguments)
                .await
                .map_err(|source| PlannerError::Skill {
                    step: index,
                    reference: function.reference.clone(),
                    source,
                })
                .inspect_err(|e| warn!(%run_id, error = %e, "PlanExecutor::execute_traced: step failed"))?;

            let text = output_text(&output);
            info!(
                %run_id,
                %index,
                reference = %function.reference,
                output_len = text.len(),
                "PlanExecutor::execute_traced: step completed"
            );
            state.arguments.insert(INPUT_KEY.to_string(), Value::String(text.clone()));
            state.outputs.push(output);

            steps.push(StepRecord {
                index,
                reference: function.reference,
                rewritten_goal,
                output: text,
            });
        }

        let output = match state.outputs.last() {
            Some(last) => output_text(last),
            None => {
                debug!(%run_id, "PlanExecutor::execute_traced: empty plan, returning input");
                output_text(&plan.input)
            }
        };

        info!(%run_id, output_len = output.len(), "PlanExecutor::execute_traced: run completed");
        Ok(ExecutionReport { run_id, output, steps })
    }
}
