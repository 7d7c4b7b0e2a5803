//! Chat-completion client used for specification extraction

use crate::errors::{config_error, llm_error, Result};
use async_trait::async_trait;
use quiver_core_types::Sensitive;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// A text-in, text-out language model
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub api_key: Sensitive<String>,
    pub timeout_secs: u64,
}

impl LlmSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1000,
            temperature: 0.1,
            api_key: Sensitive::new(api_key.into()),
            timeout_secs: 120,
        }
    }

    /// # Errors
    ///
    /// `Configuration` when `DEEPSEEK_API_KEY` is unset or empty.
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(config_error(format!("{API_KEY_ENV} is not set"))),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Client for DeepSeek and other OpenAI-compatible chat APIs
pub struct OpenAiCompatibleClient {
    client: Client,
    settings: LlmSettings,
}

impl OpenAiCompatibleClient {
    /// # Errors
    ///
    /// `ExternalService` when the HTTP client cannot be built.
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| llm_error("openai-compatible", e.to_string()))?;
        Ok(Self { client, settings })
    }

    /// # Errors
    ///
    /// `Configuration` when the API key is missing.
    pub fn from_env() -> Result<Self> {
        Self::new(LlmSettings::from_env()?)
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = Request {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.settings.endpoint())
            .header(
                "Authorization",
                format!("Bearer {}", self.settings.api_key.expose()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| llm_error(self.name(), e.to_string()))?
            .error_for_status()
            .map_err(|e| llm_error(self.name(), e.to_string()))?
            .json::<Response>()
            .await
            .map_err(|e| llm_error(self.name(), format!("invalid response body: {e}")))?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = LlmSettings::new("sk-test");
        assert_eq!(settings.model, "deepseek-chat");
        assert_eq!(settings.max_tokens, 1000);
        assert_eq!(settings.endpoint(), "https://api.deepseek.com/chat/completions");
        assert_eq!(format!("{:?}", settings.api_key), "***REDACTED***");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let mut settings = LlmSettings::new("k");
        settings.base_url = "http://localhost:8080/v1/".to_string();
        assert_eq!(settings.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_response_without_content_is_empty() {
        let response: Response =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert!(response.choices[0].message.content.is_none());
    }
}
