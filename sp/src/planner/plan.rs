//! Plan model: the ordered list of function calls synthesized for a goal

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::PlannerError;
use super::extract::{object_spans, repair};
use crate::skills::{Arguments, FunctionRef};

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subtask {
    /// Function to call
    pub function: FunctionRef,

    /// Arguments proposed by the model
    pub args: Arguments,
}

/// A parsed plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    /// Goal the plan was synthesized for
    pub goal: String,

    /// Initial input value declared by the model
    pub input: Value,

    /// Steps in execution order
    pub subtasks: Vec<Subtask>,
}

impl Plan {
    /// Parse a raw completion into a plan
    ///
    /// Only the first balanced `{...}` span is considered. It is decoded
    /// as-is, and if that fails, once more after undoing one layer of
    /// escaping. Anything after that span is ignored.
    pub fn parse(goal: &str, raw: &str) -> Result<Self, PlannerError> {
        debug!(raw_len = raw.len(), "Plan::parse: called");

        let Some(span) = object_spans(raw).next() else {
            warn!(raw_len = raw.len(), "Plan::parse: completion contains no JSON object");
            return Err(PlannerError::PlanParse {
                reason: "completion contains no JSON object".to_string(),
                source: None,
            });
        };

        let value = decode(span).map_err(|source| {
            warn!(error = %source, "Plan::parse: first JSON object did not decode");
            PlannerError::PlanParse {
                reason: "first JSON object in completion is not valid JSON".to_string(),
                source: Some(source),
            }
        })?;
        Self::from_value(goal, value)
    }

    /// Validate a decoded value against the plan shape
    pub fn from_value(goal: &str, value: Value) -> Result<Self, PlannerError> {
        debug!("Plan::from_value: called");
        let Value::Object(mut obj) = value else {
            return Err(PlannerError::PlanSchema("plan is not a JSON object".to_string()));
        };

        let input = obj
            .remove("input")
            .ok_or_else(|| PlannerError::PlanSchema("plan has no 'input' key".to_string()))?;

        let subtasks = match obj.remove("subtasks") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(PlannerError::PlanSchema(format!(
                    "'subtasks' must be an array, got {}",
                    kind_of(&other)
                )));
            }
            None => return Err(PlannerError::PlanSchema("plan has no 'subtasks' key".to_string())),
        };

        let subtasks = subtasks
            .into_iter()
            .enumerate()
            .map(|(index, item)| parse_subtask(index, item))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(steps = subtasks.len(), "Plan::from_value: plan validated");
        Ok(Self {
            goal: goal.to_string(),
            input,
            subtasks,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.subtasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.subtasks.len()
    }
}

fn decode(span: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(span).or_else(|direct| {
        debug!(error = %direct, "decode: direct decode failed, retrying after unescape");
        serde_json::from_str(&repair(span)).map_err(|_| direct)
    })
}

fn parse_subtask(index: usize, item: Value) -> Result<Subtask, PlannerError> {
    let Value::Object(mut obj) = item else {
        return Err(PlannerError::PlanSchema(format!(
            "subtask {} is not an object, got {}",
            index,
            kind_of(&item)
        )));
    };

    let function = match obj.remove("function") {
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(PlannerError::PlanSchema(format!(
                "subtask {} 'function' must be a string, got {}",
                index,
                kind_of(&other)
            )));
        }
        None => return Err(PlannerError::PlanSchema(format!("subtask {} has no 'function' key", index))),
    };

    let function: FunctionRef = function
        .parse()
        .map_err(|e| PlannerError::PlanSchema(format!("subtask {}: {}", index, e)))?;

    let args = match obj.remove("args") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(args)) => args,
        Some(other) => {
            return Err(PlannerError::PlanSchema(format!(
                "subtask {} 'args' must be an object, got {}",
                index,
                kind_of(&other)
            )));
        }
    };

    Ok(Subtask { function, args })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GOAL: &str = "Which is the most populated city?";

    #[test]
    fn test_parse_clean_plan() {
        let raw = r#"{"input": "Which is the most populated city?", "subtasks": [
            {"function": "rag.ask_rag", "args": {"question": "Which is the most populated city?"}}
        ]}"#;

        let plan = Plan::parse(GOAL, raw).unwrap();
        assert_eq!(plan.goal, GOAL);
        assert_eq!(plan.input, json!(GOAL));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.subtasks[0].function, FunctionRef::new("rag", "ask_rag"));
        assert_eq!(plan.subtasks[0].args["question"], json!(GOAL));
    }

    #[test]
    fn test_parse_plan_wrapped_in_commentary() {
        let raw = "I will first look the city up and then query incidents.\n```json\n\
            {\"input\": \"q\", \"subtasks\": [{\"function\": \"rag.ask_rag\", \"args\": {}}, \
            {\"function\": \"servicedesk.get_incidences\", \"args\": {\"question\": \"q\"}}]}\n```\n\
            Let me know if you need anything else {or not}.";

        let plan = Plan::parse("q", raw).unwrap();
        let functions: Vec<String> = plan.subtasks.iter().map(|s| s.function.to_string()).collect();
        assert_eq!(functions, vec!["rag.ask_rag", "servicedesk.get_incidences"]);
    }

    #[test]
    fn test_parse_fails_when_first_object_is_not_json() {
        let raw = r#"Format: {input, subtasks}. Plan: {"input": "q", "subtasks": []}"#;
        let err = Plan::parse("q", raw).unwrap_err();
        assert!(matches!(err, PlannerError::PlanParse { source: Some(_), .. }));
    }

    #[test]
    fn test_parse_double_escaped_plan() {
        let raw = r#"{\n  \"input\": \"Which city?\",\n  \"subtasks\": [\n    {\"function\": \"rag.ask_rag\", \"args\": {\"question\": \"Which city?\"}}\n  ]\n}"#;

        let plan = Plan::parse("Which city?", raw).unwrap();
        assert_eq!(plan.input, json!("Which city?"));
        assert_eq!(plan.subtasks[0].args["question"], json!("Which city?"));
    }

    #[test]
    fn test_parse_without_object_is_parse_error() {
        let err = Plan::parse("g", "I cannot help with that.").unwrap_err();
        assert!(matches!(err, PlannerError::PlanParse { source: None, .. }));

        let err = Plan::parse("g", "{ not json at all }").unwrap_err();
        assert!(matches!(err, PlannerError::PlanParse { source: Some(_), .. }));
    }

    #[test]
    fn test_missing_keys_are_schema_errors() {
        let err = Plan::parse("g", r#"{"subtasks": []}"#).unwrap_err();
        assert!(matches!(err, PlannerError::PlanSchema(ref m) if m.contains("'input'")));

        let err = Plan::parse("g", r#"{"input": "x"}"#).unwrap_err();
        assert!(matches!(err, PlannerError::PlanSchema(ref m) if m.contains("'subtasks'")));

        let err = Plan::parse("g", r#"{"input": "x", "subtasks": {"function": "a.b"}}"#).unwrap_err();
        assert!(matches!(err, PlannerError::PlanSchema(ref m) if m.contains("array")));
    }

    #[test]
    fn test_bad_subtasks_are_schema_errors() {
        for raw in [
            r#"{"input": "x", "subtasks": ["rag.ask_rag"]}"#,
            r#"{"input": "x", "subtasks": [{"args": {}}]}"#,
            r#"{"input": "x", "subtasks": [{"function": 3}]}"#,
            r#"{"input": "x", "subtasks": [{"function": "ask_rag"}]}"#,
            r#"{"input": "x", "subtasks": [{"function": "a.b.c"}]}"#,
            r#"{"input": "x", "subtasks": [{"function": "rag.ask_rag", "args": "q"}]}"#,
        ] {
            let err = Plan::parse("g", raw).unwrap_err();
            assert!(matches!(err, PlannerError::PlanSchema(_)), "{raw} gave {err:?}");
        }
    }

    #[test]
    fn test_missing_or_null_args_are_empty() {
        let raw = r#"{"input": null, "subtasks": [{"function": "a.b"}, {"function": "c.d", "args": null}]}"#;
        let plan = Plan::parse("g", raw).unwrap();
        assert!(plan.subtasks.iter().all(|s| s.args.is_empty()));
        assert_eq!(plan.input, Value::Null);
    }

    #[test]
    fn test_plan_serializes_with_dotted_references() {
        let plan = Plan::parse("g", r#"{"input": "x", "subtasks": [{"function": "rag.ask_rag"}]}"#).unwrap();
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["subtasks"][0]["function"], json!("rag.ask_rag"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn plan_value(input: &str) -> Value {
            json!({
                "input": input,
                "subtasks": [{"function": "rag.ask_rag", "args": {"question": input}}]
            })
        }

        proptest! {
            #[test]
            fn prop_object_found_inside_commentary(
                prefix in "[A-Za-z0-9 .,:!?\n]{0,40}",
                suffix in "[A-Za-z0-9 .,:!?\n]{0,40}",
                input in "[a-z{} \"\\\\]{0,20}",
            ) {
                let raw = format!("{}{}{}", prefix, plan_value(&input), suffix);
                let plan = Plan::parse("g", &raw).unwrap();
                prop_assert_eq!(plan.input, json!(input.clone()));
                prop_assert_eq!(&plan.subtasks[0].args["question"], &json!(input));
            }

            #[test]
            fn prop_double_escaped_object_is_repaired(input in "[A-Za-z0-9 ,.?]{0,20}") {
                let pretty = serde_json::to_string_pretty(&plan_value(&input)).unwrap();
                let escaped = pretty.replace('"', "\\\"").replace('\n', "\\n");
                prop_assert!(serde_json::from_str::<Value>(&escaped).is_err());

                let plan = Plan::parse("g", &escaped).unwrap();
                prop_assert_eq!(plan.input, json!(input));
            }
        }
    }
}
