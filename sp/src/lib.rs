//! SkillPlan - LLM-driven skill planner
//!
//! SkillPlan turns a natural-language question into an ordered plan of calls
//! against a set of backend skills (ticketing, invoicing, knowledge lookup,
//! city facts) and runs it. A language model picks and orders the calls, then
//! bridges data between steps by rewriting the pending question with what the
//! previous step found.
//!
//! # Core Concepts
//!
//! - **Skills**: named groups of functions, resolved as `skill.function`
//! - **Plans**: an initial input plus ordered subtasks, parsed from free text
//! - **Overrides**: caller values (request, headers) that beat the model's arguments
//! - **Sequential execution**: each step sees the previous output as `input`
//!
//! # Modules
//!
//! - [`planner`] - Plan synthesis, parsing, context rewriting and execution
//! - [`skills`] - Skill registry and built-in skills
//! - [`llm`] - Completion client trait and OpenAI implementation
//! - [`prompts`] - Prompt templates
//! - [`domain`] - Request context model
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod skills;

pub use config::Config;
pub use domain::{PluginConfig, RequestContext};
pub use planner::{ExecutionReport, Overrides, Plan, Planner, PlannerError};
pub use skills::SkillRegistry;
