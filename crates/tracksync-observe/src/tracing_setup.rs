//! Logging for the `tsync` binary.
//!
//! ```no_run
//! tracksync_observe::tracing_setup::init_tracing(false, "warn").unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

/// Provider installed by `init_tracing`, kept for the flush in `shutdown_tracing`.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Level filter from `RUST_LOG`, or `default_filter` when it is unset or invalid.
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Provider exporting finished spans to stdout.
fn stdout_provider() -> SdkTracerProvider {
    SdkTracerProvider::builder()
        .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
        .build()
}

/// Install the process-wide subscriber.
///
/// Log lines go to stderr, leaving stdout to command output. Sync engine
/// spans (`tracker_save`, `tracker_retrieve`) are logged when they close so
/// remote round-trip latency shows up next to the sender id. With
/// `enable_otel` the same spans are also exported through OpenTelemetry.
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing(
    enable_otel: bool,
    default_filter: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    let otel_layer = enable_otel.then(|| {
        let provider = stdout_provider();
        let tracer = provider.tracer("tracksync");
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);
        tracing_opentelemetry::layer().with_tracer(tracer)
    });

    tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(log_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(())
}

/// Flush and close the span exporter, if `init_tracing` installed one.
pub fn shutdown_tracing() {
    let Some(provider) = TRACER_PROVIDER.get() else {
        return;
    };
    if let Err(e) = provider.shutdown() {
        eprintln!("Warning: span exporter shutdown failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_filter_falls_back_to_default() {
        let filter = env_filter("tracksync=debug");
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn stdout_provider_shuts_down_cleanly() {
        let provider = stdout_provider();
        let _tracer = provider.tracer("tracksync-test");
        assert!(provider.shutdown().is_ok());
    }

    #[test]
    fn shutdown_without_otel_is_noop() {
        shutdown_tracing();
    }
}
