//! SkillRegistry - maps `skill.function` references to invocable functions
//!
//! Registration happens once at startup and validates names and duplicates.
//! After that the registry is read-only, so it can be shared across
//! concurrent requests behind an `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::builtin::{CitiesSkill, InvoicesSkill, RagSkill, ServiceDeskSkill};
use super::reference::is_valid_name;
use super::{FunctionRef, Parameter, RegistryError, Skill, SkillFunction};
use crate::config::SkillsConfig;

struct RegisteredSkill {
    description: String,
    functions: BTreeMap<String, Arc<dyn SkillFunction>>,
}

/// Handle to a resolved registry entry
#[derive(Clone)]
pub struct ResolvedFunction {
    pub reference: FunctionRef,
    pub function: Arc<dyn SkillFunction>,
}

impl ResolvedFunction {
    /// Declared parameters of the resolved function
    pub fn parameters(&self) -> Vec<Parameter> {
        self.function.parameters()
    }
}

/// Summary of one registered skill, for listing
#[derive(Debug, Clone)]
pub struct SkillSummary {
    pub name: String,
    pub description: String,
    pub functions: Vec<(String, String)>,
}

/// Registry of skills available to the planner
#[derive(Default)]
pub struct SkillRegistry {
    skills: BTreeMap<String, RegisteredSkill>,
}

impl SkillRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        debug!("SkillRegistry::new: called");
        Self::default()
    }

    /// Registry with the built-in skills
    pub fn standard(config: &SkillsConfig) -> Result<Self, RegistryError> {
        debug!("SkillRegistry::standard: called");
        let mut registry = Self::new();
        registry.register(ServiceDeskSkill::build(config))?;
        registry.register(InvoicesSkill::build())?;
        registry.register(RagSkill::build(config))?;
        registry.register(CitiesSkill::build())?;
        Ok(registry)
    }

    /// Register a skill and all its functions
    pub fn register(&mut self, skill: Skill) -> Result<(), RegistryError> {
        debug!(skill = %skill.name, functions = skill.functions.len(), "SkillRegistry::register: called");
        if !is_valid_name(&skill.name) {
            return Err(RegistryError::InvalidName { name: skill.name });
        }
        if self.skills.contains_key(&skill.name) {
            debug!("SkillRegistry::register: duplicate skill");
            return Err(RegistryError::DuplicateSkill { skill: skill.name });
        }

        let mut functions = BTreeMap::new();
        for function in skill.functions {
            let name = function.name();
            if !is_valid_name(name) {
                return Err(RegistryError::InvalidName { name: name.to_string() });
            }
            if functions.insert(name.to_string(), function).is_some() {
                debug!(%name, "SkillRegistry::register: duplicate function");
                return Err(RegistryError::DuplicateFunction {
                    skill: skill.name,
                    function: name.to_string(),
                });
            }
        }

        self.skills.insert(
            skill.name,
            RegisteredSkill {
                description: skill.description,
                functions,
            },
        );
        Ok(())
    }

    /// Resolve a function reference
    pub fn resolve(&self, reference: &FunctionRef) -> Result<ResolvedFunction, RegistryError> {
        debug!(%reference, "SkillRegistry::resolve: called");
        let skill = self.skills.get(&reference.skill).ok_or_else(|| {
            debug!("SkillRegistry::resolve: unknown skill");
            RegistryError::UnknownSkill {
                skill: reference.skill.clone(),
            }
        })?;

        let function = skill.functions.get(&reference.function).ok_or_else(|| {
            debug!("SkillRegistry::resolve: unknown function");
            RegistryError::UnknownFunction {
                skill: reference.skill.clone(),
                function: reference.function.clone(),
            }
        })?;

        Ok(ResolvedFunction {
            reference: reference.clone(),
            function: Arc::clone(function),
        })
    }

    /// Check if a skill exists
    pub fn has_skill(&self, name: &str) -> bool {
        self.skills.contains_key(name)
    }

    /// Number of registered functions across all skills
    pub fn function_count(&self) -> usize {
        self.skills.values().map(|s| s.functions.len()).sum()
    }

    /// Registered skills in name order
    pub fn skills(&self) -> Vec<SkillSummary> {
        debug!("SkillRegistry::skills: called");
        self.skills
            .iter()
            .map(|(name, skill)| SkillSummary {
                name: name.clone(),
                description: skill.description.clone(),
                functions: skill
                    .functions
                    .values()
                    .map(|f| (f.name().to_string(), f.description().to_string()))
                    .collect(),
            })
            .collect()
    }

    /// Function manual embedded in the planner prompt
    ///
    /// One block per function: qualified name, description, then one line per
    /// parameter.
    pub fn describe(&self) -> String {
        debug!("SkillRegistry::describe: called");
        let mut out = String::new();
        for (skill_name, skill) in &self.skills {
            for (function_name, function) in &skill.functions {
                out.push_str(&format!("{}.{}\n", skill_name, function_name));
                out.push_str(&format!("description: {}\n", function.description()));
                out.push_str(&format!("skill: {}\n", skill.description));
                let params = function.parameters();
                if !params.is_empty() {
                    out.push_str("args:\n");
                    for p in params {
                        let optional = if p.required { "" } else { ", optional" };
                        out.push_str(&format!("- {} ({}{}): {}\n", p.name, p.kind, optional, p.description));
                    }
                }
                out.push('\n');
            }
        }
        out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::traits::mock::RecordingFunction;
    use serde_json::json;

    fn registry_with_rag() -> SkillRegistry {
        let mut registry = SkillRegistry::new();
        registry
            .register(
                Skill::new("rag", "Default knowledge lookup").with_function(RecordingFunction::new(
                    "ask_rag",
                    &["question", "headers"],
                    json!("answer"),
                )),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_standard_registry_has_builtin_skills() {
        let registry = SkillRegistry::standard(&SkillsConfig::default()).unwrap();

        assert!(registry.has_skill("servicedesk"));
        assert!(registry.has_skill("invoices"));
        assert!(registry.has_skill("rag"));
        assert!(registry.has_skill("cities_db"));
        assert!(registry.resolve(&"cities_db.get_cities".parse().unwrap()).is_ok());
    }

    #[test]
    fn test_resolve_returns_parameters() {
        let registry = registry_with_rag();
        let resolved = registry.resolve(&FunctionRef::new("rag", "ask_rag")).unwrap();

        let names: Vec<_> = resolved.parameters().iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["question", "headers"]);
        assert_eq!(resolved.reference.to_string(), "rag.ask_rag");
    }

    #[test]
    fn test_resolve_unknown_skill() {
        let registry = registry_with_rag();
        let err = registry.resolve(&FunctionRef::new("ghost", "doit")).err().unwrap();
        assert_eq!(
            err,
            RegistryError::UnknownSkill {
                skill: "ghost".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_unknown_function() {
        let registry = registry_with_rag();
        let err = registry.resolve(&FunctionRef::new("rag", "doit")).err().unwrap();
        assert!(matches!(err, RegistryError::UnknownFunction { .. }));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = registry_with_rag();
        let err = registry.register(Skill::new("rag", "again")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateSkill { .. }));

        let skill = Skill::new("echo", "twice")
            .with_function(RecordingFunction::new("say", &[], json!(1)))
            .with_function(RecordingFunction::new("say", &[], json!(2)));
        let err = registry.register(skill).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateFunction { .. }));
        assert!(!registry.has_skill("echo"));
    }

    #[test]
    fn test_register_rejects_invalid_names() {
        let mut registry = SkillRegistry::new();
        let err = registry.register(Skill::new("bad.name", "x")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidName { .. }));

        let skill = Skill::new("ok", "x").with_function(RecordingFunction::new("two words", &[], json!(1)));
        assert!(matches!(
            registry.register(skill).unwrap_err(),
            RegistryError::InvalidName { .. }
        ));
    }

    #[test]
    fn test_describe_lists_functions_and_args() {
        let registry = registry_with_rag();
        let manual = registry.describe();

        assert!(manual.starts_with("rag.ask_rag"));
        assert!(manual.contains("description: Records its arguments"));
        assert!(manual.contains("- question (string): test parameter"));
        assert!(manual.contains("- headers (string): test parameter"));
    }

    #[test]
    fn test_describe_block_layout() {
        let manual = registry_with_rag().describe();
        let lines: Vec<&str> = manual.lines().collect();
        assert_eq!(
            lines,
            vec![
                "rag.ask_rag",
                "description: Records its arguments",
                "skill: Default knowledge lookup",
                "args:",
                "- question (string): test parameter",
                "- headers (string): test parameter",
            ]
        );
    }

    #[test]
    fn test_skills_summary() {
        let registry = SkillRegistry::standard(&SkillsConfig::default()).unwrap();
        let names: Vec<_> = registry.skills().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["cities_db", "invoices", "rag", "servicedesk"]);
        assert!(registry.function_count() >= 6);
    }
}
