use std::sync::Arc;
use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::{GenerateRequest, GenerateResponse, LlmError, Provider, ResponseCache};
use crate::telemetry::metrics::{
    GEN_AI_CACHE_HITS, GEN_AI_ERROR_COUNT, GEN_AI_OPERATION_DURATION, GEN_AI_TOKEN_USAGE,
};

/// Single-shot model invoker. One provider round trip per uncached request;
/// there is no retry and no fallback provider.
pub struct LlmClient {
    provider: Arc<dyn Provider>,
    cache: Option<ResponseCache>,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        if let Some(cache) = &self.cache
            && let Some(resp) = cache.get(req)
        {
            tracing::debug!(model = %req.model, "LLM response served from cache");
            GEN_AI_CACHE_HITS.add(
                1,
                &[KeyValue::new(
                    "gen_ai.provider.name",
                    self.provider_name().to_string(),
                )],
            );
            return Ok(resp);
        }

        let resp = self.generate_once(req).await?;

        if let Some(cache) = &self.cache {
            cache.insert(req.clone(), resp.clone());
        }

        Ok(resp)
    }

    async fn generate_once(&self, req: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let provider_name = self.provider_name().to_string();
        let start = Instant::now();

        let span = tracing::info_span!(
            "gen_ai.chat",
            otel.name = %format!("gen_ai.chat {}", req.model),
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = %provider_name,
            gen_ai.request.model = %req.model,
            gen_ai.request.max_tokens = req.max_tokens as i64,
            gen_ai.response.model = tracing::field::Empty,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
            gen_ai.response.finish_reasons = tracing::field::Empty,
            otel.status_code = tracing::field::Empty,
            error.type = tracing::field::Empty,
        );

        span.add_event(
            "gen_ai.user.message",
            vec![
                KeyValue::new("gen_ai.prompt", truncate(&req.prompt, 1000)),
                KeyValue::new("gen_ai.system_instructions", truncate(&req.system, 500)),
            ],
        );

        let result = self.provider.generate(req).instrument(span.clone()).await;
        let duration = start.elapsed().as_secs_f64();

        let provider_kv = KeyValue::new("gen_ai.provider.name", provider_name.clone());
        let model_kv = KeyValue::new("gen_ai.request.model", req.model.clone());

        match result {
            Ok(resp) => {
                span.record("gen_ai.response.model", resp.model.as_str());
                span.record("gen_ai.usage.input_tokens", resp.input_tokens as i64);
                span.record("gen_ai.usage.output_tokens", resp.output_tokens as i64);
                if !resp.finish_reason.is_empty() {
                    span.record(
                        "gen_ai.response.finish_reasons",
                        resp.finish_reason.as_str(),
                    );
                }
                span.add_event(
                    "gen_ai.assistant.message",
                    vec![KeyValue::new(
                        "gen_ai.completion",
                        truncate(&resp.content, 2000),
                    )],
                );

                let op_kv = KeyValue::new("gen_ai.operation.name", "chat");
                GEN_AI_TOKEN_USAGE.record(
                    f64::from(resp.input_tokens),
                    &[
                        KeyValue::new("gen_ai.token.type", "input"),
                        op_kv.clone(),
                        provider_kv.clone(),
                        model_kv.clone(),
                    ],
                );
                GEN_AI_TOKEN_USAGE.record(
                    f64::from(resp.output_tokens),
                    &[
                        KeyValue::new("gen_ai.token.type", "output"),
                        op_kv.clone(),
                        provider_kv.clone(),
                        model_kv.clone(),
                    ],
                );
                GEN_AI_OPERATION_DURATION.record(duration, &[op_kv, provider_kv, model_kv]);

                Ok(resp)
            }
            Err(err) => {
                span.record("otel.status_code", "ERROR");
                span.record("error.type", err.kind());

                GEN_AI_ERROR_COUNT.add(
                    1,
                    &[
                        provider_kv,
                        model_kv,
                        KeyValue::new("error.type", err.kind()),
                    ],
                );

                Err(err)
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s.char_indices()
            .take_while(|&(i, _)| i < max)
            .map(|(_, c)| c)
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Provider double that counts calls and replays a fixed outcome.
    pub(crate) struct StubProvider {
        pub calls: AtomicUsize,
        pub prompts: Mutex<Vec<String>>,
        outcome: Result<String, u16>,
    }

    impl StubProvider {
        pub(crate) fn replying(content: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
                outcome: Ok(content.to_string()),
            })
        }

        pub(crate) fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
                outcome: Err(status),
            })
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Provider for StubProvider {
        async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(req.prompt.clone());
            match &self.outcome {
                Ok(content) => Ok(GenerateResponse {
                    content: content.clone(),
                    model: req.model.clone(),
                    input_tokens: 100,
                    output_tokens: 50,
                    finish_reason: "stop".to_string(),
                }),
                Err(status) => Err(LlmError::Api {
                    provider: "stub".to_string(),
                    status: *status,
                    message: "stubbed failure".to_string(),
                }),
            }
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: "gpt-4.1-mini".to_string(),
            system: crate::llm::SYSTEM_MESSAGE.to_string(),
            prompt: prompt.to_string(),
            max_tokens: 1500,
        }
    }

    #[tokio::test]
    async fn test_generate_passes_through_provider() {
        let stub = StubProvider::replying("hello");
        let client = LlmClient::new(stub.clone());

        let resp = tokio_test::assert_ok!(client.generate(&request("p")).await);

        assert_eq!(resp.content, "hello");
        assert_eq!(stub.call_count(), 1);
        assert_eq!(client.provider_name(), "stub");
    }

    #[tokio::test]
    async fn test_generate_without_cache_calls_every_time() {
        let stub = StubProvider::replying("hello");
        let client = LlmClient::new(stub.clone());

        client.generate(&request("p")).await.unwrap();
        client.generate(&request("p")).await.unwrap();

        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let stub = StubProvider::replying("hello");
        let client = LlmClient::new(stub.clone())
            .with_cache(ResponseCache::new(100, Duration::from_secs(300)));

        client.generate(&request("p")).await.unwrap();
        let second = client.generate(&request("p")).await.unwrap();
        client.generate(&request("other")).await.unwrap();

        assert_eq!(second.content, "hello");
        assert_eq!(stub.call_count(), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let stub = StubProvider::failing(503);
        let client = LlmClient::new(stub.clone())
            .with_cache(ResponseCache::new(100, Duration::from_secs(300)));

        let err = tokio_test::assert_err!(client.generate(&request("p")).await);
        assert_eq!(err.kind(), "server_error");
        client.generate(&request("p")).await.unwrap_err();

        assert_eq!(stub.call_count(), 2);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hello");
        assert_eq!(truncate("hé世界!", 3), "hé");
    }
}
