use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;

use super::{GeneratedReport, ReportRequest, build_prompt};
use crate::config::Config;
use crate::error::AppResult;
use crate::llm::{
    GenerateRequest, LlmClient, LlmError, ResponseCache, SYSTEM_MESSAGE, provider_from_config,
};
use crate::telemetry::metrics::{REPORT_SECTIONS_POPULATED, REPORTS_GENERATED};

/// Switches and pass-through values the generator needs. Built from `Config`
/// by the caller; the generator never reads the environment itself.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub enabled: bool,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4.1-mini".to_string(),
            max_tokens: 1500,
        }
    }
}

pub struct ReportGenerator {
    llm: Option<Arc<LlmClient>>,
    settings: GeneratorSettings,
}

impl ReportGenerator {
    pub fn new(llm: Arc<LlmClient>, settings: GeneratorSettings) -> Self {
        Self {
            llm: Some(llm),
            settings,
        }
    }

    /// Wires the provider, cache and flags from configuration. With the LLM
    /// service switched off no provider is built and no credential is read.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        if !config.enable_llm_service {
            return Ok(Self::disabled());
        }

        let mut llm = LlmClient::new(provider_from_config(config)?);
        if config.cache_enabled {
            llm = llm.with_cache(ResponseCache::new(
                config.cache_capacity,
                Duration::from_secs(config.cache_ttl_secs),
            ));
        }

        Ok(Self::new(
            Arc::new(llm),
            GeneratorSettings {
                enabled: true,
                model: config.llm_model.clone(),
                max_tokens: config.llm_max_tokens,
            },
        ))
    }

    /// Generator with no model client at all; every report comes back empty.
    pub fn disabled() -> Self {
        Self {
            llm: None,
            settings: GeneratorSettings {
                enabled: false,
                ..GeneratorSettings::default()
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled && self.llm.is_some()
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Produces the report content. Never fails: a disabled service or any
    /// upstream error yields a report with all five sections empty.
    #[tracing::instrument(
        name = "report.generate",
        skip(self, request),
        fields(
            report.industry = %request.industry,
            report.outcome,
            report.sections_populated,
        )
    )]
    pub async fn generate(&self, request: &ReportRequest) -> GeneratedReport {
        let span = tracing::Span::current();

        let (report, outcome) = match self.try_generate(request).await {
            Ok(report) if report.is_empty() => {
                tracing::warn!(
                    model = %self.settings.model,
                    "Completion contained none of the expected section headings"
                );
                (report, "no_sections")
            }
            Ok(report) => {
                let missing = report.missing_sections();
                if !missing.is_empty() {
                    tracing::debug!(missing = ?missing, "Completion is missing some sections");
                }
                (report, "success")
            }
            Err(LlmError::Disabled) => {
                tracing::info!("LLM service is disabled, skipping report content generation");
                (GeneratedReport::empty(), "disabled")
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    error.type = err.kind(),
                    "Error generating report content"
                );
                (GeneratedReport::empty(), "error")
            }
        };

        let populated = report.populated_sections();
        span.record("report.outcome", outcome);
        span.record("report.sections_populated", populated);

        REPORTS_GENERATED.add(1, &[KeyValue::new("report.outcome", outcome)]);
        if outcome != "disabled" {
            REPORT_SECTIONS_POPULATED.record(populated as f64, &[]);
        }

        report
    }

    /// Same pipeline as `generate`, with the failure reason kept.
    pub async fn try_generate(&self, request: &ReportRequest) -> Result<GeneratedReport, LlmError> {
        let llm = match &self.llm {
            Some(llm) if self.settings.enabled => llm,
            _ => return Err(LlmError::Disabled),
        };

        let prompt = build_prompt(&request.industry, &request.answers);

        tracing::debug!(model = %self.settings.model, "Generating report content");
        let resp = llm
            .generate(&GenerateRequest {
                model: self.settings.model.clone(),
                system: SYSTEM_MESSAGE.to_string(),
                prompt,
                max_tokens: self.settings.max_tokens,
            })
            .await?;

        tracing::info!(
            model = %resp.model,
            input_tokens = resp.input_tokens,
            output_tokens = resp.output_tokens,
            "Report content generated successfully"
        );

        Ok(GeneratedReport::from_completion(&resp.content))
    }
}
