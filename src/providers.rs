use crate::config::{Config, ProviderKind};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Why a completion call failed, coarse enough to tell the user what to do
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompletionError {
    /// Timeouts, refused connections, 5xx. Worth simply trying again.
    #[error("temporary provider failure: {0}")]
    Transient(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("rate limit or quota exceeded: {0}")]
    Quota(String),
    #[error("unexpected provider error: {0}")]
    Unknown(String),
}

impl CompletionError {
    /// Short tag used in logs
    pub fn code(&self) -> &'static str {
        match self {
            CompletionError::Transient(_) => "transient",
            CompletionError::Auth(_) => "auth",
            CompletionError::Quota(_) => "quota",
            CompletionError::Unknown(_) => "unknown",
        }
    }

    fn from_request(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            CompletionError::Transient(format!("request timed out after {:?}", timeout))
        } else if error.is_connect() {
            CompletionError::Transient(format!("failed to connect: {}", error))
        } else {
            CompletionError::Unknown(format!("request failed: {}", error))
        }
    }

    /// Map a non-success HTTP status (and its body) to a failure class
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = format!("HTTP {}: {}", status.as_u16(), body.trim());
        match status.as_u16() {
            401 | 403 => CompletionError::Auth(detail),
            429 => CompletionError::Quota(detail),
            500..=599 => CompletionError::Transient(detail),
            _ if body.contains("insufficient_quota") => CompletionError::Quota(detail),
            _ => CompletionError::Unknown(detail),
        }
    }
}

/// The remote completion call: fixed instructions plus one user prompt in, text out
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, CompletionError>;

    /// Provider name for logs and `heycli config`
    fn name(&self) -> &'static str;
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(15))
        .build()
        .unwrap_or_else(|_| Client::new())
}

fn chat_messages(system: &str, prompt: &str) -> Value {
    json!([
        {"role": "system", "content": system},
        {"role": "user", "content": prompt}
    ])
}

/// OpenAI chat-completions (or any endpoint speaking the same format)
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(base_url: String, api_key: String, model: String, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn parse_reply(json: &Value) -> Result<String, CompletionError> {
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CompletionError::Unknown("no choices[0].message.content in reply".to_string()))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, CompletionError> {
        let body = json!({
            "model": self.model,
            "messages": chat_messages(system, prompt),
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::from_request(e, self.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::from_request(e, self.timeout))?;

        if !status.is_success() {
            return Err(CompletionError::from_status(status, &text));
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| CompletionError::Unknown(format!("invalid JSON in reply: {}", e)))?;
        Self::parse_reply(&json)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Local models through Ollama's chat endpoint
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaProvider {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn parse_reply(json: &Value) -> Result<String, CompletionError> {
        json["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CompletionError::Unknown("no message.content in Ollama reply".to_string()))
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, CompletionError> {
        let body = json!({
            "model": self.model,
            "messages": chat_messages(system, prompt),
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::from_request(e, self.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::from_request(e, self.timeout))?;

        if !status.is_success() {
            // Ollama answers 404 for a model that was never pulled
            if status == StatusCode::NOT_FOUND {
                return Err(CompletionError::Unknown(format!(
                    "model '{}' not found, try: ollama pull {}",
                    self.model, self.model
                )));
            }
            return Err(CompletionError::from_status(status, &text));
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| CompletionError::Unknown(format!("invalid JSON in reply: {}", e)))?;
        Self::parse_reply(&json)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

/// Build the provider selected in the config. OpenAI needs an API key.
pub fn build_provider(config: &Config, api_key: Option<String>) -> Result<Box<dyn CompletionProvider>> {
    let timeout = Duration::from_millis(config.ai_timeout);
    match config.provider {
        ProviderKind::OpenAi => {
            let api_key = api_key.ok_or_else(|| {
                anyhow!("No API key found for provider: openai (set OPENAI_API_KEY or run 'heycli set-key')")
            })?;
            Ok(Box::new(OpenAiProvider::new(
                config.api_base_url.clone(),
                api_key,
                config.model.clone(),
                timeout,
            )))
        }
        ProviderKind::Ollama => Ok(Box::new(OllamaProvider::new(
            config.ollama_url.clone(),
            config.model.clone(),
            timeout,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            CompletionError::from_status(StatusCode::UNAUTHORIZED, "Unauthorized"),
            CompletionError::Auth(_)
        ));
        assert!(matches!(
            CompletionError::from_status(StatusCode::FORBIDDEN, ""),
            CompletionError::Auth(_)
        ));
        assert!(matches!(
            CompletionError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            CompletionError::Quota(_)
        ));
        assert!(matches!(
            CompletionError::from_status(StatusCode::BAD_GATEWAY, ""),
            CompletionError::Transient(_)
        ));
        assert!(matches!(
            CompletionError::from_status(StatusCode::BAD_REQUEST, "bad model"),
            CompletionError::Unknown(_)
        ));
    }

    #[test]
    fn test_insufficient_quota_body() {
        let body = r#"{"error":{"code":"insufficient_quota","message":"You exceeded your current quota"}}"#;
        assert!(matches!(
            CompletionError::from_status(StatusCode::PAYMENT_REQUIRED, body),
            CompletionError::Quota(_)
        ));
    }

    #[test]
    fn test_status_detail_keeps_code() {
        let err = CompletionError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(err.to_string().contains("HTTP 500: boom"));
        assert_eq!(err.code(), "transient");
    }

    #[test]
    fn test_parse_openai_reply() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "$ ls -la"}}]});
        assert_eq!(OpenAiProvider::parse_reply(&body).unwrap(), "$ ls -la");

        let empty = json!({"choices": []});
        assert!(matches!(
            OpenAiProvider::parse_reply(&empty),
            Err(CompletionError::Unknown(_))
        ));
    }

    #[test]
    fn test_parse_ollama_reply() {
        let body = json!({"message": {"role": "assistant", "content": "Use df -h"}, "done": true});
        assert_eq!(OllamaProvider::parse_reply(&body).unwrap(), "Use df -h");
        assert!(OllamaProvider::parse_reply(&json!({"done": true})).is_err());
    }

    #[test]
    fn test_chat_messages_shape() {
        let messages = chat_messages("be brief", "list files");
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "be brief");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "list files");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = OpenAiProvider::new(
            "https://api.openai.com/v1/".to_string(),
            "key".to_string(),
            "gpt-4".to_string(),
            Duration::from_secs(5),
        );
        assert_eq!(provider.base_url, "https://api.openai.com/v1");
        assert_eq!(provider.model(), "gpt-4");
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_build_provider_requires_key_for_openai() {
        let config = Config::default();
        assert_eq!(config.provider, ProviderKind::OpenAi);

        let err = build_provider(&config, None).err().unwrap();
        assert!(err.to_string().contains("No API key"));

        let provider = build_provider(&config, Some("sk-test".to_string())).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_build_provider_ollama_without_key() {
        let config = Config {
            provider: ProviderKind::Ollama,
            ..Config::default()
        };
        let provider = build_provider(&config, None).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transient() {
        let provider = OllamaProvider::new(
            "http://127.0.0.1:1".to_string(),
            "mistral".to_string(),
            Duration::from_secs(5),
        );

        let err = provider.complete("system", "hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::Transient(_)), "got {:?}", err);
    }
}
