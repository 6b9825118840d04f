//! Prompt Loader
//!
//! Loads prompt templates from override directories or falls back to the
//! embedded defaults, then renders them with Handlebars.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Template name for plan synthesis
pub const PLANNER_TEMPLATE: &str = "planner";

/// Template name for question rewriting
pub const QUESTION_UPDATE_TEMPLATE: &str = "question_update";

/// Variables of the planner template
#[derive(Debug, Clone, Serialize)]
pub struct PlannerPromptContext {
    /// The user's goal
    pub goal: String,
    /// Function manual rendered by the skill registry
    pub functions: String,
}

/// Variables of the question rewrite template
#[derive(Debug, Clone, Serialize)]
pub struct RewritePromptContext {
    pub question: String,
    pub previous_output: String,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine (HTML escaping disabled)
    hbs: Handlebars<'static>,
    /// Override directories, searched in order
    dirs: Vec<PathBuf>,
}

impl PromptLoader {
    /// Create a loader searching the configured directory, then `.skillplan/prompts`
    pub fn new(prompts_dir: Option<&Path>) -> Self {
        debug!(?prompts_dir, "PromptLoader::new: called");
        let candidates = prompts_dir
            .map(Path::to_path_buf)
            .into_iter()
            .chain(std::iter::once(PathBuf::from(".skillplan/prompts")));

        let dirs: Vec<PathBuf> = candidates
            .filter(|dir| {
                let exists = dir.is_dir();
                debug!(?dir, %exists, "PromptLoader::new: checking directory");
                exists
            })
            .collect();

        Self {
            hbs: Self::engine(),
            dirs,
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            dirs: Vec::new(),
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; JSON quotes must survive rendering
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks each override directory for `{name}.pmt`, then the embedded set.
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in &self.dirs {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: no override");
        }

        debug!("PromptLoader::load_template: trying embedded fallback");
        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Render the plan synthesis prompt
    pub fn planner_prompt(&self, context: &PlannerPromptContext) -> Result<String> {
        self.render(PLANNER_TEMPLATE, context)
    }

    /// Render the question rewrite prompt
    pub fn rewrite_prompt(&self, context: &RewritePromptContext) -> Result<String> {
        self.render(QUESTION_UPDATE_TEMPLATE, context)
    }
}
