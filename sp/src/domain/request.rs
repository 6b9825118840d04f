//! Request context - the structured metadata accompanying a question

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Per-skill configuration block carried by a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Skill this block configures (e.g. "ServiceDesk")
    pub name: String,

    /// Endpoint the skill should call
    pub url: String,

    /// Free-form credentials and settings
    #[serde(default)]
    pub configuration: Map<String, Value>,
}

/// Structured request accompanying a goal
///
/// Skills that declare a `question` parameter receive this whole object, not
/// just the goal text, so they can reach the identifiers and plugin blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: i64,

    /// Message storing the question/answer pair
    pub message_id: i64,

    pub chat_id: i64,

    pub domain_id: i64,

    /// The goal text
    pub question: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<PluginConfig>>,
}

impl RequestContext {
    /// Create a context with zeroed identifiers
    pub fn new(question: impl Into<String>) -> Self {
        let question = question.into();
        debug!(question_len = question.len(), "RequestContext::new: called");
        Self {
            user_id: 0,
            message_id: 0,
            chat_id: 0,
            domain_id: 0,
            question,
            plugins: None,
        }
    }

    /// Same context with a different goal text
    pub fn with_question(&self, question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..self.clone()
        }
    }

    /// Attach a plugin configuration block
    pub fn with_plugin(mut self, plugin: PluginConfig) -> Self {
        debug!(plugin = %plugin.name, "RequestContext::with_plugin: called");
        self.plugins.get_or_insert_with(Vec::new).push(plugin);
        self
    }

    /// Find a plugin block by name (case-insensitive)
    pub fn plugin(&self, name: &str) -> Option<&PluginConfig> {
        debug!(%name, "RequestContext::plugin: called");
        self.plugins
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Interpret an argument value as a structured request
    ///
    /// Returns `None` for plain strings or any other shape.
    pub fn from_argument(value: &Value) -> Option<Self> {
        debug!("RequestContext::from_argument: called");
        if !value.is_object() {
            debug!("RequestContext::from_argument: not an object");
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> Value {
        json!({
            "user_id": 7,
            "message_id": 7,
            "chat_id": 4,
            "domain_id": 1,
            "question": "list the wifi incidents",
            "plugins": [{
                "name": "ServiceDesk",
                "url": "http://localhost:9001/query",
                "configuration": { "url": "https://desk.example.com/api/v3", "token": "secret" }
            }]
        })
    }

    #[test]
    fn test_deserialize_request() {
        let ctx: RequestContext = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(ctx.user_id, 7);
        assert_eq!(ctx.chat_id, 4);
        assert_eq!(ctx.question, "list the wifi incidents");
        assert_eq!(ctx.plugins.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_plugin_lookup_is_case_insensitive() {
        let ctx: RequestContext = serde_json::from_value(sample_json()).unwrap();
        let plugin = ctx.plugin("servicedesk").unwrap();
        assert_eq!(plugin.url, "http://localhost:9001/query");
        assert!(ctx.plugin("Invoices").is_none());
    }

    #[test]
    fn test_with_question_keeps_identifiers() {
        let ctx: RequestContext = serde_json::from_value(sample_json()).unwrap();
        let updated = ctx.with_question("list the wifi incidents in Barcelona");
        assert_eq!(updated.question, "list the wifi incidents in Barcelona");
        assert_eq!(updated.user_id, ctx.user_id);
        assert_eq!(updated.plugins, ctx.plugins);
        assert_eq!(ctx.question, "list the wifi incidents");
    }

    #[test]
    fn test_from_argument() {
        assert!(RequestContext::from_argument(&sample_json()).is_some());
        assert!(RequestContext::from_argument(&json!("list the wifi incidents")).is_none());
        assert!(RequestContext::from_argument(&json!({ "question": "missing ids" })).is_none());
    }

    #[test]
    fn test_with_plugin() {
        let ctx = RequestContext::new("hi").with_plugin(PluginConfig {
            name: "Rag".to_string(),
            url: "http://rag".to_string(),
            configuration: Map::new(),
        });
        assert!(ctx.plugin("rag").is_some());
    }
}
