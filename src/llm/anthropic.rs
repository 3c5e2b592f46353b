use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::{GenerateRequest, GenerateResponse, LlmError, Provider};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    usage: Usage,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait::async_trait]
impl Provider for AnthropicProvider {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| LlmError::InvalidCredential(e.to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = MessagesRequest {
            model: &req.model,
            max_tokens: req.max_tokens,
            system: &req.system,
            messages: vec![Message {
                role: "user",
                content: &req.prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&error_body)
                .map(|env| env.error.message)
                .unwrap_or(error_body);
            return Err(LlmError::Api {
                provider: self.name().to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let resp: MessagesResponse = response.json().await?;

        // The first text block is the completion; tool or thinking blocks are skipped.
        let content = resp
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .find_map(|block| block.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyCompletion)?;

        Ok(GenerateResponse {
            content,
            model: resp.model,
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
            finish_reason: resp.stop_reason.unwrap_or_default(),
        })
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn request() -> GenerateRequest {
        GenerateRequest {
            model: "claude-haiku-4-5".to_string(),
            system: "You are a helpful assistant.".to_string(),
            prompt: "Write the report".to_string(),
            max_tokens: 1500,
        }
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "ak-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-haiku-4-5",
                "max_tokens": 1500,
                "system": "You are a helpful assistant.",
                "messages": [{"role": "user", "content": "Write the report"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "**Conclusion** Act now."}],
                "model": "claude-haiku-4-5",
                "usage": {"input_tokens": 40, "output_tokens": 12},
                "stop_reason": "end_turn"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AnthropicProvider::with_base_url("ak-test", &server.uri());
        let resp = provider.generate(&request()).await.unwrap();

        assert_eq!(resp.content, "**Conclusion** Act now.");
        assert_eq!(resp.input_tokens, 40);
        assert_eq!(resp.output_tokens, 12);
        assert_eq!(resp.finish_reason, "end_turn");
    }

    #[tokio::test]
    async fn test_generate_api_error_carries_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "type": "error",
                "error": {"type": "rate_limit_error", "message": "slow down"}
            })))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::with_base_url("ak-test", &server.uri());
        let err = provider.generate(&request()).await.unwrap_err();

        match err {
            LlmError::Api {
                status, message, ..
            } => {
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_without_text_block_is_empty_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [],
                "model": "claude-haiku-4-5",
                "usage": {"input_tokens": 40, "output_tokens": 0},
                "stop_reason": "max_tokens"
            })))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::with_base_url("ak-test", &server.uri());
        let err = provider.generate(&request()).await.unwrap_err();

        assert!(matches!(err, LlmError::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_invalid_key_header_is_rejected_before_sending() {
        let provider = AnthropicProvider::with_base_url("bad\nkey", "http://127.0.0.1:9");
        let err = provider.generate(&request()).await.unwrap_err();

        assert!(matches!(err, LlmError::InvalidCredential(_)));
    }
}
