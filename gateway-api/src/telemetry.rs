//! Tracing subscriber initialization, plus an optional OpenTelemetry
//! export path behind the `otel` feature. Core crates instrument with
//! `tracing` directly; this module is the one place that wires a
//! subscriber, so it only needs calling once from whatever binary
//! deploys the gateway.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a JSON-formatted subscriber honoring `RUST_LOG`, falling back
/// to a reasonable per-crate default when unset.
pub fn init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gateway_engine=debug,gateway_proxy=debug,info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
}

#[cfg(feature = "otel")]
pub mod otel {
    use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
    use opentelemetry_otlp::{SpanExporter, WithExportConfig};
    use opentelemetry_sdk::{
        propagation::TraceContextPropagator,
        trace::{RandomIdGenerator, Sampler, TracerProvider},
        Resource,
    };
    use tracing_opentelemetry::OpenTelemetryLayer;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    #[derive(Debug, Clone, thiserror::Error)]
    pub enum TelemetryError {
        #[error("failed to build OTLP exporter: {0}")]
        ExporterInit(String),
        #[error("failed to install tracing subscriber: {0}")]
        SubscriberInit(String),
    }

    #[derive(Debug, Clone)]
    pub struct TelemetryConfig {
        pub otlp_endpoint: Option<String>,
        pub service_name: String,
        pub service_version: String,
        pub environment: String,
        pub trace_sample_rate: f64,
    }

    impl Default for TelemetryConfig {
        fn default() -> Self {
            Self {
                otlp_endpoint: std::env::var("GATEWAY_OTLP_ENDPOINT").ok(),
                service_name: std::env::var("GATEWAY_SERVICE_NAME").unwrap_or_else(|_| "gateway".to_string()),
                service_version: std::env::var("GATEWAY_SERVICE_VERSION")
                    .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
                environment: std::env::var("GATEWAY_ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                trace_sample_rate: std::env::var("GATEWAY_TRACE_SAMPLE_RATE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1.0),
            }
        }
    }

    /// Installs a tracing subscriber whose spans are also exported via
    /// OTLP. Call once at startup, before the first `tracing` event.
    pub fn init_tracer(config: &TelemetryConfig) -> Result<(), TelemetryError> {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let resource = Resource::new(vec![
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", config.service_version.clone()),
            KeyValue::new("deployment.environment", config.environment.clone()),
        ]);

        let sampler = if config.trace_sample_rate >= 1.0 {
            Sampler::AlwaysOn
        } else if config.trace_sample_rate <= 0.0 {
            Sampler::AlwaysOff
        } else {
            Sampler::TraceIdRatioBased(config.trace_sample_rate)
        };

        let tracer_provider = if let Some(endpoint) = &config.otlp_endpoint {
            let exporter = SpanExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .build()
                .map_err(|e| TelemetryError::ExporterInit(e.to_string()))?;

            TracerProvider::builder()
                .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
                .with_sampler(sampler)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource)
                .build()
        } else {
            TracerProvider::builder()
                .with_sampler(sampler)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource)
                .build()
        };

        let tracer = tracer_provider.tracer("gateway-api");
        global::set_tracer_provider(tracer_provider);

        let otel_layer = OpenTelemetryLayer::new(tracer);
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gateway_engine=debug,gateway_proxy=debug,info"));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .with(otel_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

        tracing::info!(
            service_name = config.service_name,
            environment = config.environment,
            otlp_endpoint = ?config.otlp_endpoint,
            "telemetry initialized"
        );

        Ok(())
    }

    pub fn shutdown_tracer() {
        global::shutdown_tracer_provider();
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn config_defaults_to_always_on_sampling() {
            let config = TelemetryConfig { otlp_endpoint: None, ..Default::default() };
            assert_eq!(config.trace_sample_rate, 1.0);
        }
    }
}
