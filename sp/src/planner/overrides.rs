//! Caller-supplied argument overrides
//!
//! Overrides carry values the model must never choose: transport headers and
//! the structured request. When a function declares a parameter whose name
//! matches an override key, the override replaces whatever the model proposed.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::RequestContext;
use crate::skills::{Arguments, ResolvedFunction};

/// Key under which transport headers are bound
pub const HEADERS_KEY: &str = "headers";

/// Key under which the structured request is bound
pub const QUESTION_KEY: &str = "question";

/// Key under which the serialized request is bound, when enabled
pub const REQUEST_BODY_KEY: &str = "request_body";

/// Override values supplied by the caller of a run
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    headers: BTreeMap<String, String>,
    extra: Map<String, Value>,
    request_body: bool,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one transport header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add several transport headers
    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add an arbitrary override value
    ///
    /// `headers` and `question` are reserved and always bound from the run.
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// Also bind the serialized request as a string under `request_body`
    pub fn with_request_body(mut self) -> Self {
        self.request_body = true;
        self
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Full override mapping for a step, given the request as it currently stands
    pub fn values_for(&self, request: &RequestContext) -> Map<String, Value> {
        debug!(extra = self.extra.len(), headers = self.headers.len(), "Overrides::values_for: called");
        let mut values = self.extra.clone();

        let headers: Map<String, Value> = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        values.insert(HEADERS_KEY.to_string(), Value::Object(headers));
        values.insert(QUESTION_KEY.to_string(), request_value(request));

        if self.request_body {
            let body = serde_json::to_string(request).unwrap_or_default();
            values.insert(REQUEST_BODY_KEY.to_string(), Value::String(body));
        }
        values
    }
}

/// The request as an argument value
pub(crate) fn request_value(request: &RequestContext) -> Value {
    serde_json::to_value(request).unwrap_or_default()
}

/// Arguments for one step after overrides were applied
#[derive(Debug, Clone, Default)]
pub(crate) struct BoundArguments {
    pub args: Arguments,
    /// Names whose value came from the overrides
    pub overridden: Vec<String>,
}

/// Start from the model's arguments and replace every declared parameter that
/// has an override
pub(crate) fn bind_arguments(
    function: &ResolvedFunction,
    proposed: Arguments,
    overrides: &Map<String, Value>,
) -> BoundArguments {
    debug!(reference = %function.reference, "bind_arguments: called");
    let mut bound = BoundArguments {
        args: proposed,
        overridden: Vec::new(),
    };

    for param in function.parameters() {
        let Some(value) = overrides.get(param.name) else {
            continue;
        };
        match bound.args.insert(param.name.to_string(), value.clone()) {
            Some(previous) => debug!(
                reference = %function.reference,
                param = param.name,
                %previous,
                replacement = %value,
                "bind_arguments: override replaced model value"
            ),
            None => debug!(
                reference = %function.reference,
                param = param.name,
                replacement = %value,
                "bind_arguments: override supplied missing value"
            ),
        }
        bound.overridden.push(param.name.to_string());
    }
    bound
}
