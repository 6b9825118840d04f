//! Prompt template system
//!
//! The planner and the question rewriter each render one fixed `.pmt`
//! template. Templates use Handlebars syntax for variable substitution.
//!
//! Template loading chain:
//! 1. `{prompts-dir}/{name}.pmt` (configured override)
//! 2. `.skillplan/prompts/{name}.pmt` (project override)
//! 3. Embedded default compiled into the binary

pub mod embedded;
mod loader;

pub use loader::{PlannerPromptContext, PromptLoader, RewritePromptContext};
