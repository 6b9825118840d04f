//! servicedesk skill - incident listing through the ServiceDesk ticketing service

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::SkillsConfig;
use crate::domain::RequestContext;
use crate::skills::http::HttpForwarder;
use crate::skills::traits::{headers_arg, require};
use crate::skills::{Arguments, ParamKind, Parameter, Skill, SkillError, SkillFunction};

/// Builder for the `servicedesk` skill
pub struct ServiceDeskSkill;

impl ServiceDeskSkill {
    pub fn build(config: &SkillsConfig) -> Skill {
        debug!("ServiceDeskSkill::build: called");
        Skill::new(
            "servicedesk",
            "Provide information about incidences through the ServiceDesk ticketing service",
        )
        .with_function(GetIncidences {
            plugin_name: config.service_desk.name.clone(),
            http: HttpForwarder::new(config.http_timeout_ms),
        })
    }
}

/// Forwards the request to the endpoint named in the request's plugin block
struct GetIncidences {
    plugin_name: String,
    http: HttpForwarder,
}

#[async_trait]
impl SkillFunction for GetIncidences {
    fn name(&self) -> &'static str {
        "get_incidences"
    }

    fn description(&self) -> &'static str {
        "Get and list incidences using the ticketing service ServiceDesk"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::required("question", ParamKind::Request, "List the incidences"),
            Parameter::optional("headers", ParamKind::Headers, "Headers to send to request"),
        ]
    }

    async fn invoke(&self, args: &Arguments) -> Result<Value, SkillError> {
        debug!("GetIncidences::invoke: called");
        let question = require(args, "question")?;
        let request = RequestContext::from_argument(question).ok_or_else(|| {
            debug!("GetIncidences::invoke: question is not a structured request");
            SkillError::InvalidArgument("No service desk plugin was specified".to_string())
        })?;

        let plugin = request.plugin(&self.plugin_name).ok_or_else(|| {
            debug!(plugin = %self.plugin_name, "GetIncidences::invoke: plugin block missing");
            SkillError::InvalidArgument(format!("Request carries no '{}' plugin block", self.plugin_name))
        })?;

        let headers = headers_arg(args)?;
        info!(url = %plugin.url, header_count = headers.len(), "Querying service desk");
        let body = self.http.post_json(&plugin.url, &request, &headers).await?;
        Ok(Value::String(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn function() -> GetIncidences {
        GetIncidences {
            plugin_name: "ServiceDesk".to_string(),
            http: HttpForwarder::new(1000),
        }
    }

    #[tokio::test]
    async fn test_plain_string_question_is_rejected() {
        let mut args = Arguments::new();
        args.insert("question".to_string(), json!("list the wifi incidents"));

        let err = function().invoke(&args).await.unwrap_err();
        assert!(err.to_string().contains("No service desk plugin was specified"));
    }

    #[tokio::test]
    async fn test_request_without_plugin_block_is_rejected() {
        let mut args = Arguments::new();
        let request = RequestContext::new("list the wifi incidents");
        args.insert("question".to_string(), serde_json::to_value(&request).unwrap());

        let err = function().invoke(&args).await.unwrap_err();
        assert!(matches!(err, SkillError::InvalidArgument(ref m) if m.contains("ServiceDesk")));
    }

    #[tokio::test]
    async fn test_missing_question() {
        let err = function().invoke(&Arguments::new()).await.unwrap_err();
        assert!(matches!(err, SkillError::MissingArgument { .. }));
    }

    #[test]
    fn test_declares_question_and_headers() {
        let skill = ServiceDeskSkill::build(&SkillsConfig::default());
        assert_eq!(skill.name(), "servicedesk");
        let names: Vec<_> = function().parameters().iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["question", "headers"]);
    }
}
