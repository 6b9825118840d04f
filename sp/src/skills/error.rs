//! Skill and registry error types

use thiserror::Error;

/// Errors raised while registering or resolving skills
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown skill: {skill}")]
    UnknownSkill { skill: String },

    #[error("Unknown function {function} in skill {skill}")]
    UnknownFunction { skill: String, function: String },

    #[error("Skill already registered: {skill}")]
    DuplicateSkill { skill: String },

    #[error("Function {function} registered twice in skill {skill}")]
    DuplicateFunction { skill: String, function: String },

    #[error("Invalid name '{name}': must be non-empty without '.' or whitespace")]
    InvalidName { name: String },

    #[error("Invalid function reference '{reference}': expected 'skill.function'")]
    InvalidReference { reference: String },
}

/// Errors raised by a skill invocation
#[derive(Debug, Error)]
pub enum SkillError {
    #[error("Missing argument: {name}")]
    MissingArgument { name: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream error {status} from {url}: {message}")]
    Upstream { url: String, status: u16, message: String },

    #[error("{0}")]
    Failed(String),
}

impl SkillError {
    /// Shorthand for a missing argument error
    pub fn missing(name: impl Into<String>) -> Self {
        SkillError::MissingArgument { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_function_message() {
        let err = RegistryError::UnknownFunction {
            skill: "rag".to_string(),
            function: "ask".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("rag"));
        assert!(msg.contains("ask"));
    }

    #[test]
    fn test_missing_argument_message() {
        let msg = SkillError::missing("filter").to_string();
        assert_eq!(msg, "Missing argument: filter");
    }
}
