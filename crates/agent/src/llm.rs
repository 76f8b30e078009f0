use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use dockbook_core::config::LlmConfig;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String>;
}

/// Client for a generative-language HTTP API
/// (`{base_url}/models/{model}:generateContent`). Request and response
/// shapes follow the hosted API's candidates/content/parts layout.
pub struct HostedLlmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
    max_retries: u32,
}

impl HostedLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key =
            config.api_key.clone().ok_or_else(|| anyhow!("llm.api_key is not configured"))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("building llm http client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            max_retries: config.max_retries,
        })
    }

    async fn request_once(&self, question: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            self.api_key.expose_secret()
        );
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: question.to_string() }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("llm request failed")?
            .error_for_status()
            .context("llm returned an error status")?;

        let parsed: GenerateResponse =
            response.json().await.context("llm response was not valid json")?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| anyhow!("llm response contained no candidates"))
    }
}

#[async_trait]
impl LlmClient for HostedLlmClient {
    async fn answer(&self, question: &str) -> Result<String> {
        let mut last_error = None;
        for _attempt in 0..=self.max_retries {
            match self.request_once(question).await {
                Ok(text) => return Ok(text),
                Err(error) => last_error = Some(error),
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("llm retries exhausted")))
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Canned responder for tests; `answers: None` simulates a hard failure.
pub struct StaticLlmClient {
    pub answer: Option<String>,
}

#[async_trait]
impl LlmClient for StaticLlmClient {
    async fn answer(&self, _question: &str) -> Result<String> {
        self.answer.clone().ok_or_else(|| anyhow!("static llm client configured to fail"))
    }
}
