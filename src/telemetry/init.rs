use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource, logs::SdkLoggerProvider, metrics::SdkMeterProvider, trace::SdkTracerProvider,
};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// Used when `RUST_LOG` is unset. Provider round trips log at debug.
const DEFAULT_LOG_FILTER: &str = "info,ai_insights_report::llm=debug,sqlx=warn,tower_http=debug";

/// Owns the three OTLP pipelines. Call `shutdown` before exit so batched
/// spans, logs and metric points are flushed.
pub struct TelemetryGuard {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
    logger_provider: SdkLoggerProvider,
}

impl TelemetryGuard {
    pub fn shutdown(&self) {
        let results = [
            ("tracer", self.tracer_provider.shutdown()),
            ("meter", self.meter_provider.shutdown()),
            ("logger", self.logger_provider.shutdown()),
        ];
        for (provider, result) in results {
            if let Err(e) = result {
                eprintln!("Error shutting down {provider} provider: {e}");
            }
        }
    }
}

pub fn init_telemetry(config: &Config) -> anyhow::Result<TelemetryGuard> {
    let resource = report_service_resource(config);
    let endpoint = config.otel_exporter_endpoint.as_str();

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(
            opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .with_timeout(EXPORT_TIMEOUT)
                .build()?,
        )
        .with_resource(resource.clone())
        .build();
    global::set_tracer_provider(tracer_provider.clone());

    // Report and gen_ai instruments in `metrics` resolve through the global meter.
    let meter_provider = SdkMeterProvider::builder()
        .with_periodic_exporter(
            opentelemetry_otlp::MetricExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .with_timeout(EXPORT_TIMEOUT)
                .build()?,
        )
        .with_resource(resource.clone())
        .build();
    global::set_meter_provider(meter_provider.clone());

    let logger_provider = SdkLoggerProvider::builder()
        .with_batch_exporter(
            opentelemetry_otlp::LogExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .with_timeout(EXPORT_TIMEOUT)
                .build()?,
        )
        .with_resource(resource)
        .build();

    let fmt_layer = if config.is_production() {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().pretty().boxed()
    };

    tracing_subscriber::registry()
        .with(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with(OpenTelemetryLayer::new(global::tracer(
            config.otel_service_name.clone(),
        )))
        .with(OpenTelemetryTracingBridge::new(&logger_provider))
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(
        service = %config.otel_service_name,
        endpoint = %endpoint,
        environment = %config.environment,
        llm_provider = %config.llm_provider,
        "Telemetry initialized with OTLP trace, metric and log export"
    );

    Ok(TelemetryGuard {
        tracer_provider,
        meter_provider,
        logger_provider,
    })
}

/// Resource attached to every exported signal. The LLM provider and model are
/// included so dashboards can split report traffic per backend.
fn report_service_resource(config: &Config) -> Resource {
    Resource::builder()
        .with_service_name(config.otel_service_name.clone())
        .with_attributes([
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            KeyValue::new("deployment.environment", config.environment.clone()),
            KeyValue::new("gen_ai.provider.name", config.llm_provider.clone()),
            KeyValue::new("gen_ai.request.model", config.llm_model.clone()),
        ])
        .build()
}

/// Filter from a `RUST_LOG`-style directive, falling back to the default when
/// it is missing or does not parse.
fn log_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}
