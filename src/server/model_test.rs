//! Connectivity check for a configured model endpoint.
//!
//! Sends one short OpenAI-compatible chat completion and returns the reply
//! text, which is enough to prove the URL, key and model name line up.

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_MODEL_BASE_URL;
use crate::models::ModelConfig;

const PROBE_PROMPT: &str = "2+2=";

#[derive(Debug, Serialize)]
struct ProbeRequest<'a> {
    model: &'a str,
    messages: Vec<ProbeMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ProbeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProbeResponse {
    choices: Vec<ProbeChoice>,
}

#[derive(Debug, Deserialize)]
struct ProbeChoice {
    message: ProbeReply,
}

#[derive(Debug, Deserialize)]
struct ProbeReply {
    content: Option<String>,
}

/// Chat-completions URL for a model config.
fn completions_url(model: &ModelConfig) -> String {
    let base = model
        .base_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(DEFAULT_MODEL_BASE_URL);
    format!("{}/chat/completions", base.trim_end_matches('/'))
}

/// Send a probe request to the model and return its reply.
pub async fn test_model(client: &Client, model: &ModelConfig) -> Result<String> {
    if model.model.trim().is_empty() {
        anyhow::bail!("model name is required");
    }

    let url = completions_url(model);
    let body = ProbeRequest {
        model: &model.model,
        messages: vec![ProbeMessage {
            role: "user",
            content: PROBE_PROMPT,
        }],
        max_tokens: model.max_tokens,
        temperature: model.temperature,
    };

    debug!(model = %model.model, url = %url, "testing model endpoint");

    let mut request = client
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&body);
    if let Some(key) = model.api_key.as_deref().filter(|k| !k.is_empty()) {
        request = request.header("Authorization", format!("Bearer {key}"));
    }
    if let Some(version) = model.api_version.as_deref() {
        request = request.query(&[("api-version", version)]);
    }

    let resp = request.send().await?;
    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("model endpoint error ({}): {}", status, text);
    }

    let parsed: ProbeResponse = resp.json().await?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow::anyhow!("No choices in response"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_defaults_and_trims() {
        let mut model = ModelConfig::new("gpt-4");
        assert_eq!(
            completions_url(&model),
            "https://api.openai.com/v1/chat/completions"
        );

        model.base_url = Some("http://localhost:1234/v1/".into());
        assert_eq!(
            completions_url(&model),
            "http://localhost:1234/v1/chat/completions"
        );
    }
}
