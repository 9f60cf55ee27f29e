use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "otel")]
use opentelemetry::trace::TracerProvider as _;
#[cfg(feature = "otel")]
use opentelemetry_sdk::trace::SdkTracerProvider;

/// Keeps exporters alive for the duration of the run; flushes them on [`TelemetryGuard::shutdown`].
#[derive(Default)]
pub struct TelemetryGuard {
    #[cfg(feature = "otel")]
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    pub fn shutdown(self) {
        #[cfg(feature = "otel")]
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to flush traces: {e}");
            }
        }
    }
}

fn env_filter() -> EnvFilter {
    // stdout carries the transcript; only warnings and errors reach stderr by default.
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn fmt_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails when the OTLP exporter cannot be built (only with the `otel` feature).
#[cfg(not(feature = "otel"))]
pub fn init() -> anyhow::Result<TelemetryGuard> {
    tracing_subscriber::registry()
        .with(fmt_layer())
        .with(env_filter())
        .init();

    Ok(TelemetryGuard::default())
}

/// Installs the global subscriber with an OTLP span exporter alongside the stderr output.
///
/// # Errors
///
/// Fails when the OTLP exporter cannot be built.
#[cfg(feature = "otel")]
pub fn init() -> anyhow::Result<TelemetryGuard> {
    use anyhow::Context;

    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .context("Failed to create OTLP exporter")?;
    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(otlp_exporter)
        .build();
    let tracer = provider.tracer("gitorgfork");

    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(telemetry)
        .with(fmt_layer())
        .with(env_filter())
        .init();

    Ok(TelemetryGuard {
        provider: Some(provider),
    })
}
