//! HTTP plumbing shared by the skills that forward requests to a service

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::SkillError;

/// Thin JSON-over-HTTP client for skill backends
#[derive(Clone)]
pub struct HttpForwarder {
    http: Client,
}

impl HttpForwarder {
    pub fn new(timeout_ms: u64) -> Self {
        debug!(%timeout_ms, "HttpForwarder::new: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent("SkillPlan/0.1")
            .build()
            .unwrap_or_default();
        Self { http }
    }

    /// POST a JSON body and return the response text
    ///
    /// Non-2xx statuses become `SkillError::Upstream`.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: &[(String, String)],
    ) -> Result<String, SkillError> {
        debug!(%url, header_count = headers.len(), "HttpForwarder::post_json: called");
        if !url.starts_with("http://") && !url.starts_with("https://") {
            debug!("HttpForwarder::post_json: invalid URL protocol");
            return Err(SkillError::InvalidArgument(format!(
                "URL must start with http:// or https://: {}",
                url
            )));
        }

        let mut request = self.http.post(url).json(body);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|source| {
            debug!(error = %source, "HttpForwarder::post_json: request failed");
            SkillError::Request {
                url: url.to_string(),
                source,
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| SkillError::Request {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            debug!(%status, "HttpForwarder::post_json: upstream error");
            return Err(SkillError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
                message: text,
            });
        }

        debug!(body_len = text.len(), "HttpForwarder::post_json: success");
        Ok(text)
    }
}
