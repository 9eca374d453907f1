//! HTTP Completion Client - 调用 OpenAI 兼容的文本补全服务
//!
//! 实现 TextCompletionPort trait
//!
//! 外部 API:
//! POST {base_url}/chat/completions
//! Request: {"model": "...", "messages": [{"role": "user", "content": "..."}], "temperature": 0.4}
//! Response: {"choices": [{"message": {"content": "..."}}]}

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{CompletionError, CompletionOptions, TextCompletionPort};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// 请求体 (JSON)
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP 补全客户端配置
#[derive(Debug, Clone)]
pub struct HttpCompletionClientConfig {
    /// 服务基础 URL（包含版本前缀，如 https://api.openai.com/v1）
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// 连接超时时间（秒），单次请求的超时由调用方通过 CompletionOptions 给出
    pub connect_timeout_secs: u64,
    /// 重试次数（仅网络错误与 429/5xx）
    pub max_retries: u32,
}

impl Default for HttpCompletionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            connect_timeout_secs: 10,
            max_retries: 0,
        }
    }
}

impl HttpCompletionClientConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// HTTP 补全客户端
pub struct HttpCompletionClient {
    client: Client,
    config: HttpCompletionClientConfig,
}

impl HttpCompletionClient {
    pub fn new(config: HttpCompletionClientConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| CompletionError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_once(
        &self,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
        };

        let mut request = self.client.post(self.completions_url()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout
            } else if e.is_connect() {
                CompletionError::NetworkError(format!("Cannot connect to completion service: {}", e))
            } else {
                CompletionError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &error_text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        extract_content(parsed)
    }
}

fn status_error(status: StatusCode, body: &str) -> CompletionError {
    CompletionError::ServiceError(format!("HTTP {}: {}", status, body))
}

fn is_retryable(err: &CompletionError) -> bool {
    match err {
        CompletionError::NetworkError(_) => true,
        CompletionError::ServiceError(msg) => msg.starts_with("HTTP 429") || msg.starts_with("HTTP 5"),
        _ => false,
    }
}

fn extract_content(response: ChatResponse) -> Result<String, CompletionError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::InvalidResponse("response has no choices".to_string()))
}

#[async_trait]
impl TextCompletionPort for HttpCompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        options: CompletionOptions,
    ) -> Result<String, CompletionError> {
        tracing::debug!(
            url = %self.completions_url(),
            model = %self.config.model,
            prompt_chars = prompt.chars().count(),
            temperature = options.temperature,
            "Sending completion request"
        );

        let mut attempt = 0;
        loop {
            match self.send_once(prompt, options).await {
                Ok(content) => {
                    tracing::debug!(
                        response_chars = content.chars().count(),
                        attempt,
                        "Completion finished"
                    );
                    return Ok(content);
                }
                Err(e) if attempt < self.config.max_retries && is_retryable(&e) => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "Completion failed, retrying");
                    tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut request = self.client.get(self.models_url()).timeout(Duration::from_secs(5));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpCompletionClientConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.max_retries, 0);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let config = HttpCompletionClientConfig::new("http://localhost:11434/v1/", "qwen");
        let client = HttpCompletionClient::new(config).unwrap();
        assert_eq!(client.completions_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_extract_content() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"本章讲述了习惯的力量"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(response).unwrap(), "本章讲述了习惯的力量");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_content(empty),
            Err(CompletionError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_health_check_fails_for_unreachable_service() {
        let config = HttpCompletionClientConfig::new("http://127.0.0.1:9/v1", "qwen");
        let client = HttpCompletionClient::new(config).unwrap();
        assert!(!client.health_check().await);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable(&CompletionError::NetworkError("reset".into())));
        assert!(is_retryable(&status_error(StatusCode::TOO_MANY_REQUESTS, "")));
        assert!(is_retryable(&status_error(StatusCode::BAD_GATEWAY, "")));
        assert!(!is_retryable(&status_error(StatusCode::UNAUTHORIZED, "")));
        assert!(!is_retryable(&CompletionError::Timeout));
    }
}
