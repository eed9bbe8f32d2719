use anyhow::Result;
use opentelemetry::{KeyValue, global, trace::TracerProvider as _};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    self as sdk,
    logs::{SdkLogger, SdkLoggerProvider},
    resource::Resource,
};
use tracing::{info, warn};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

/// Holds the OTLP providers for the process lifetime; dropping the guard
/// flushes pending spans and log records.
pub struct TelemetryGuard {
    tracer_provider: Option<sdk::trace::SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl TelemetryGuard {
    /// Install the global subscriber: JSON logs on stdout always, OTLP trace
    /// and log export only when an endpoint is configured.
    pub fn init(config: &AppConfig) -> Result<Self> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let (trace_layer, log_layer, guard) = match build_otlp(config)? {
            Some(export) => (
                Some(export.trace_layer),
                Some(export.log_layer),
                Self {
                    tracer_provider: Some(export.tracer_provider),
                    logger_provider: Some(export.logger_provider),
                },
            ),
            None => (
                None,
                None,
                Self {
                    tracer_provider: None,
                    logger_provider: None,
                },
            ),
        };

        tracing_subscriber::registry()
            .with(trace_layer)
            .with(log_layer)
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .try_init()?;

        if guard.tracer_provider.is_some() {
            info!("OTLP trace/log export enabled, json logs stay on stdout");
        }
        Ok(guard)
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take()
            && let Err(err) = provider.shutdown()
        {
            warn!(error = ?err, "tracer provider shutdown failed");
        }
        if let Some(provider) = self.logger_provider.take()
            && let Err(err) = provider.shutdown()
        {
            warn!(error = ?err, "logger provider shutdown failed");
        }
    }
}

struct OtlpExport {
    trace_layer: OpenTelemetryLayer<Registry, sdk::trace::Tracer>,
    log_layer: OpenTelemetryTracingBridge<SdkLoggerProvider, SdkLogger>,
    tracer_provider: sdk::trace::SdkTracerProvider,
    logger_provider: SdkLoggerProvider,
}

fn build_otlp(config: &AppConfig) -> Result<Option<OtlpExport>> {
    let Some(endpoint) = config
        .otel
        .endpoint
        .as_deref()
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
    else {
        return Ok(None);
    };
    let resource = service_resource(config);

    let span_exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;
    let tracer_provider = sdk::trace::SdkTracerProvider::builder()
        .with_resource(resource.clone())
        .with_batch_exporter(span_exporter)
        .build();
    let tracer = tracer_provider.tracer(config.otel.service_name.clone());
    global::set_tracer_provider(tracer_provider.clone());

    let log_exporter = LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;
    let logger_provider = SdkLoggerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(log_exporter)
        .build();
    let log_layer = OpenTelemetryTracingBridge::new(&logger_provider);

    Ok(Some(OtlpExport {
        trace_layer: tracing_opentelemetry::layer().with_tracer(tracer),
        log_layer,
        tracer_provider,
        logger_provider,
    }))
}

/// Resource attributes identifying this search service in exported telemetry.
fn service_resource(config: &AppConfig) -> Resource {
    Resource::builder()
        .with_service_name(config.otel.service_name.clone())
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .with_attribute(KeyValue::new(
            "deployment.environment.name",
            config.environment.clone(),
        ))
        .build()
}
