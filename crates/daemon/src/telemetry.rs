//! OpenTelemetry trace export
//!
//! Off unless the `telemetry` feature is built in and an OTLP endpoint is set.

use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

pub const DEFAULT_SERVICE_NAME: &str = "hsq-queued";

/// Boxed layer stacked into the subscriber
pub type TelemetryLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Build the OpenTelemetry layer if enabled
///
/// # Environment Variables
///
/// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
/// - `OTEL_SERVICE_NAME`: Service name (default: hsq-queued)
///
/// Errors are returned instead of aborting so the daemon can run without export.
pub fn layer<S>() -> anyhow::Result<Option<TelemetryLayer<S>>>
where
    S: Subscriber + for<'span> LookupSpan<'span> + 'static,
{
    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return Ok(None);
    };

    otlp_layer(&endpoint).map(Some)
}

#[cfg(not(feature = "telemetry"))]
fn otlp_layer<S>(endpoint: &str) -> anyhow::Result<TelemetryLayer<S>>
where
    S: Subscriber + for<'span> LookupSpan<'span> + 'static,
{
    anyhow::bail!(
        "OTEL_EXPORTER_OTLP_ENDPOINT={} set but feature 'telemetry' not enabled (rebuild with --features telemetry)",
        endpoint
    )
}

#[cfg(feature = "telemetry")]
fn otlp_layer<S>(endpoint: &str) -> anyhow::Result<TelemetryLayer<S>>
where
    S: Subscriber + for<'span> LookupSpan<'span> + 'static,
{
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::TracerProvider;
    use opentelemetry_sdk::Resource;

    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.clone(),
        )]))
        .build();
    let tracer = provider.tracer(service_name);
    opentelemetry::global::set_tracer_provider(provider);

    Ok(tracing_opentelemetry::layer().with_tracer(tracer).boxed())
}

/// Flush pending spans
pub fn shutdown() {
    #[cfg(feature = "telemetry")]
    opentelemetry::global::shutdown_tracer_provider();
}
