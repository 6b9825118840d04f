//! Skill function trait definition

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::SkillError;

/// Argument mapping handed to a skill function
pub type Arguments = Map<String, Value>;

/// Shape a parameter expects, used in the function manual shown to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Plain text
    Text,
    /// Structured request context, injected by the caller
    Request,
    /// Transport headers, injected by the caller
    Headers,
    /// JSON object
    Object,
    Integer,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "string"),
            Self::Request => write!(f, "request"),
            Self::Headers => write!(f, "headers"),
            Self::Object => write!(f, "object"),
            Self::Integer => write!(f, "integer"),
        }
    }
}

/// A declared parameter of a skill function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

impl Parameter {
    pub fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind,
            required: true,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind,
            required: false,
        }
    }
}

/// A function a skill exposes to the planner
#[async_trait]
pub trait SkillFunction: Send + Sync {
    /// Function name (second half of `skill.function`)
    fn name(&self) -> &'static str;

    /// Human-readable description shown to the model
    fn description(&self) -> &'static str;

    /// Declared parameters
    fn parameters(&self) -> Vec<Parameter>;

    /// Invoke the function with the accumulated invocation arguments
    async fn invoke(&self, args: &Arguments) -> Result<Value, SkillError>;
}

/// A named group of functions, registered as a unit
pub struct Skill {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) functions: Vec<Arc<dyn SkillFunction>>,
}

impl Skill {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        debug!(%name, "Skill::new: called");
        Self {
            name,
            description: description.into(),
            functions: Vec::new(),
        }
    }

    /// Add a function to this skill
    pub fn with_function(mut self, function: impl SkillFunction + 'static) -> Self {
        debug!(skill = %self.name, function = %function.name(), "Skill::with_function: called");
        self.functions.push(Arc::new(function));
        self
    }

    /// Add an already shared function (lets tests keep a handle to it)
    pub fn with_shared_function(mut self, function: Arc<dyn SkillFunction>) -> Self {
        debug!(skill = %self.name, function = %function.name(), "Skill::with_shared_function: called");
        self.functions.push(function);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Render a skill output as text
///
/// Strings are returned verbatim, everything else as compact JSON.
pub fn output_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fetch a required argument
pub fn require<'a>(args: &'a Arguments, name: &str) -> Result<&'a Value, SkillError> {
    args.get(name).filter(|v| !v.is_null()).ok_or_else(|| SkillError::missing(name))
}

/// Read the `headers` argument as string pairs, empty when absent
pub fn headers_arg(args: &Arguments) -> Result<Vec<(String, String)>, SkillError> {
    match args.get("headers") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) => Ok(map.iter().map(|(k, v)| (k.clone(), output_text(v))).collect()),
        Some(other) => Err(SkillError::InvalidArgument(format!("headers must be a mapping, got {}", other))),
    }
}
