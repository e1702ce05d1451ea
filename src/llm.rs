//! External model client abstraction and implementations.
//!
//! Defines the [`ModelClient`] trait and two hosted backends:
//! - **[`GeminiClient`]** — Google Generative Language API `generateContent`.
//! - **[`OpenAiClient`]** — any OpenAI-compatible `/chat/completions` endpoint.
//!
//! Each call sends one prompt as a fresh, single-message request and returns
//! the reply text. There is no retry: any transport error or non-2xx status
//! is returned to the caller as-is.
//!
//! The API key is read from the configured environment variable on every
//! call, so a missing key only surfaces when the model is first used.
//!
//! # Provider Selection
//!
//! ```rust
//! # use doc_chat::config::ModelConfig;
//! # use doc_chat::llm::create_client;
//! let client = create_client(&ModelConfig::default()).unwrap();
//! assert_eq!(client.name(), "gemini");
//! ```

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ModelConfig;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Turns a prompt string into a reply string.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Provider identifier (e.g. `"gemini"`), used in logs.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Builds the client selected by `config.provider`.
pub fn create_client(config: &ModelConfig) -> Result<Arc<dyn ModelClient>> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiClient::new(config)?)),
        "openai" => Ok(Arc::new(OpenAiClient::new(config)?)),
        other => bail!("Unknown model provider: {}", other),
    }
}

fn build_http(config: &ModelConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

fn api_key(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| anyhow::anyhow!("{} environment variable not set", var))
}

// ============ Gemini ============

pub struct GeminiClient {
    http: reqwest::Client,
    model: String,
    api_key_env: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(config)?,
            model: config.model.clone(),
            api_key_env: config.api_key_env.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
        })
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let key = api_key(&self.api_key_env)?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .context("gemini request")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("Gemini API error {}: {}", status, text);
        }

        let v: Value = resp.json().await.context("gemini json")?;
        parse_gemini_response(&v)
    }
}

/// Extracts the reply text from a `generateContent` response.
///
/// Text parts of the first candidate are concatenated. A response with no
/// candidates (e.g. a blocked prompt) is an error.
pub fn parse_gemini_response(v: &Value) -> Result<String> {
    let candidate = match v
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
    {
        Some(c) => c,
        None => {
            if let Some(reason) = v
                .pointer("/promptFeedback/blockReason")
                .and_then(|r| r.as_str())
            {
                bail!("Gemini blocked the prompt: {}", reason);
            }
            bail!("Invalid Gemini response: no candidates");
        }
    };

    let parts = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let reason = candidate
                .get("finishReason")
                .and_then(|r| r.as_str())
                .unwrap_or("unknown");
            anyhow::anyhow!("Gemini returned no content (finish reason: {})", reason)
        })?;

    Ok(parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect())
}

// ============ OpenAI-compatible ============

pub struct OpenAiClient {
    http: reqwest::Client,
    model: String,
    api_key_env: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(config)?,
            model: config.model.clone(),
            api_key_env: config.api_key_env.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
        })
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let key = api_key(&self.api_key_env)?;
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp = self
            .http
            .post(url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, text);
        }

        let v: Value = resp.json().await.context("openai json")?;
        parse_openai_response(&v)
    }
}

pub fn parse_openai_response(v: &Value) -> Result<String> {
    v.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
}
