//! Reqwest client for a non-streaming text-generation endpoint.

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::HintError};

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Clone)]
pub struct GenerateClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GenerateClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base_url = cfg
            .get("HINT_API_URL")
            .unwrap_or_else(|| "http://localhost:11434".into());
        let model = cfg.get("HINT_MODEL").unwrap_or_else(|| "llama3".into());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One blocking round trip; returns the raw `response` text.
    pub async fn generate(&self, prompt: &str) -> Result<String, HintError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest { model: &self.model, prompt, stream: false };

        log::debug!("POST {} (model {}, {} prompt bytes)", url, self.model, prompt.len());
        let resp = self.http.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HintError::Status { status, body });
        }

        let parsed: GenerateResponse = resp.json().await?;
        if parsed.response.trim().is_empty() {
            return Err(HintError::EmptyResponse);
        }
        Ok(parsed.response)
    }
}
