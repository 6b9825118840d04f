//! rag skill - default knowledge lookup

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::SkillsConfig;
use crate::domain::RequestContext;
use crate::skills::http::HttpForwarder;
use crate::skills::traits::{headers_arg, require};
use crate::skills::{Arguments, ParamKind, Parameter, Skill, SkillError, SkillFunction};

/// Builder for the `rag` skill
pub struct RagSkill;

impl RagSkill {
    pub fn build(config: &SkillsConfig) -> Skill {
        debug!(url = %config.rag.url, "RagSkill::build: called");
        Skill::new(
            "rag",
            "Default plugin to call when no other plugin can be used. Any information not provided by other \
             functions is meant to be retrieved from here.",
        )
        .with_function(AskRag {
            url: config.rag.url.clone(),
            http: HttpForwarder::new(config.http_timeout_ms),
        })
    }
}

struct AskRag {
    url: String,
    http: HttpForwarder,
}

#[async_trait]
impl SkillFunction for AskRag {
    fn name(&self) -> &'static str {
        "ask_rag"
    }

    fn description(&self) -> &'static str {
        "Default plugin to call when no other plugin can be used. Any information not provided by other functions \
         is meant to be retrieved from here."
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::required("question", ParamKind::Request, "User question"),
            Parameter::optional("headers", ParamKind::Headers, "Headers to send to request"),
        ]
    }

    async fn invoke(&self, args: &Arguments) -> Result<Value, SkillError> {
        debug!("AskRag::invoke: called");
        let question = require(args, "question")?;
        let request = match question {
            Value::String(text) => {
                debug!("AskRag::invoke: plain text question");
                RequestContext::new(text.clone())
            }
            other => RequestContext::from_argument(other)
                .ok_or_else(|| SkillError::InvalidArgument("question must be text or a request".to_string()))?,
        };

        let headers = headers_arg(args)?;
        info!(url = %self.url, "Asking knowledge service");
        let body = self.http.post_json(&self.url, &request, &headers).await?;
        Ok(Value::String(body))
    }
}
