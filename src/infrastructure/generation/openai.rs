use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, GenerationProvider};
use crate::infrastructure::http_client::HttpClientTrait;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Chat-completions backend used to narrate answers
#[derive(Debug)]
pub struct OpenAiGenerationProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl<C: HttpClientTrait> OpenAiGenerationProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, model, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            model: model.into(),
            temperature: 0.0,
            max_tokens: 256,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, prompt: &str) -> serde_json::Value {
        let messages = vec![OpenAiMessage {
            role: "user".to_string(),
            content: Some(prompt.to_string()),
        }];

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<String, DomainError> {
        let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("openai", format!("Failed to parse response: {}", e))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider("openai", "No choices in response"))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(DomainError::provider("openai", "Completion was filtered"));
        }

        choice
            .message
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| DomainError::provider("openai", "Empty completion"))
    }
}

#[async_trait]
impl<C: HttpClientTrait> GenerationProvider for OpenAiGenerationProvider<C> {
    async fn generate(&self, prompt: &str) -> Result<String, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(prompt);

        let response = self.client.post_json(&url, self.headers(), &body).await?;

        self.parse_response(response)
    }
}

// OpenAI API types

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::mock::MockHttpClient;

    const TEST_URL: &str = "https://api.openai.com/v1/chat/completions";

    fn completion(content: Option<&str>, finish_reason: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": finish_reason
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        })
    }

    #[tokio::test]
    async fn test_generate() {
        let client = MockHttpClient::new()
            .with_response(TEST_URL, completion(Some("  Bread contains gluten. "), "stop"));
        let provider = OpenAiGenerationProvider::new(client, "test-key", "gpt-4o-mini");

        let text = provider.generate("narrate").await.unwrap();

        assert_eq!(text, "Bread contains gluten.");
    }

    #[tokio::test]
    async fn test_request_body() {
        let client = MockHttpClient::new().with_response(TEST_URL, completion(Some("ok"), "stop"));
        let provider = OpenAiGenerationProvider::new(client, "test-key", "gpt-4o-mini")
            .with_temperature(0.2)
            .with_max_tokens(64);

        provider.generate("hello").await.unwrap();

        let body = &provider.client.requests()[0];
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["max_tokens"], 64);
    }

    #[tokio::test]
    async fn test_empty_completion_is_error() {
        let client = MockHttpClient::new().with_response(TEST_URL, completion(None, "stop"));
        let provider = OpenAiGenerationProvider::new(client, "test-key", "gpt-4o-mini");

        assert!(provider.generate("hello").await.is_err());
    }

    #[tokio::test]
    async fn test_filtered_completion_is_error() {
        let client = MockHttpClient::new()
            .with_response(TEST_URL, completion(Some("partial"), "content_filter"));
        let provider = OpenAiGenerationProvider::new(client, "test-key", "gpt-4o-mini");

        assert!(provider.generate("hello").await.is_err());
    }

    #[tokio::test]
    async fn test_no_choices_is_error() {
        let client = MockHttpClient::new()
            .with_response(TEST_URL, serde_json::json!({ "choices": [] }));
        let provider = OpenAiGenerationProvider::new(client, "test-key", "gpt-4o-mini");

        let err = provider.generate("hello").await.unwrap_err();
        assert!(err.to_string().contains("No choices"));
    }

    #[tokio::test]
    async fn test_http_error_propagates() {
        let client = MockHttpClient::new().with_error(TEST_URL, "HTTP 500");
        let provider = OpenAiGenerationProvider::new(client, "test-key", "gpt-4o-mini");

        assert!(matches!(
            provider.generate("hello").await,
            Err(DomainError::Provider { .. })
        ));
    }
}
