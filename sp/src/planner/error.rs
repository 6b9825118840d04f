//! Planner error types
//!
//! Every failure aborts the whole request. The variants tell the caller which
//! phase failed and, for execution failures, which step and function.

use std::fmt;

use thiserror::Error;

use crate::llm::LlmError;
use crate::skills::{FunctionRef, RegistryError, SkillError};

/// Phase of a request in which a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Synthesis,
    Parsing,
    Resolution,
    Invocation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synthesis => write!(f, "synthesis"),
            Self::Parsing => write!(f, "parsing"),
            Self::Resolution => write!(f, "resolution"),
            Self::Invocation => write!(f, "invocation"),
        }
    }
}

/// Errors surfaced by the planner to its caller
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Completion service failed during {phase}: {source}")]
    CompletionService {
        phase: Phase,
        /// Step being prepared when the rewriter failed
        step: Option<usize>,
        #[source]
        source: LlmError,
    },

    #[error("Failed to render prompt during {phase}: {message}")]
    Prompt { phase: Phase, message: String },

    #[error("Could not parse plan: {reason}")]
    PlanParse {
        reason: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("Malformed plan: {0}")]
    PlanSchema(String),

    #[error("Step {step} ({reference}): unknown skill '{}'", .reference.skill)]
    UnknownSkill { step: usize, reference: FunctionRef },

    #[error("Step {step} ({reference}): unknown function '{}' in skill '{}'", .reference.function, .reference.skill)]
    UnknownFunction { step: usize, reference: FunctionRef },

    #[error("Step {step} ({reference}) failed: {source}")]
    Skill {
        step: usize,
        reference: FunctionRef,
        #[source]
        source: SkillError,
    },
}

impl PlannerError {
    /// Phase in which this error happened
    pub fn phase(&self) -> Phase {
        match self {
            Self::CompletionService { phase, .. } | Self::Prompt { phase, .. } => *phase,
            Self::PlanParse { .. } | Self::PlanSchema(_) => Phase::Parsing,
            Self::UnknownSkill { .. } | Self::UnknownFunction { .. } => Phase::Resolution,
            Self::Skill { .. } => Phase::Invocation,
        }
    }

    /// Step index for execution-time failures
    pub fn step(&self) -> Option<usize> {
        match self {
            Self::CompletionService { step, .. } => *step,
            Self::UnknownSkill { step, .. } | Self::UnknownFunction { step, .. } | Self::Skill { step, .. } => {
                Some(*step)
            }
            _ => None,
        }
    }

    /// Map a registry lookup failure for the given step
    pub(crate) fn resolution(step: usize, reference: &FunctionRef, err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownFunction { .. } => Self::UnknownFunction {
                step,
                reference: reference.clone(),
            },
            _ => Self::UnknownSkill {
                step,
                reference: reference.clone(),
            },
        }
    }
}
