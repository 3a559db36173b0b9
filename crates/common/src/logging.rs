//! Logging and trace-export initialization shared by the stakelock binaries.

use std::env;

use opentelemetry::{trace::TracerProvider, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable naming an OTLP collector to export spans to.
pub const OTLP_URL_ENVVAR: &str = "STAKELOCK_OTLP_URL";

/// Environment variable with an extra label appended to the service name.
pub const SVC_LABEL_ENVVAR: &str = "STAKELOCK_SVC_LABEL";

/// Configuration for the logging subsystem.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Service name reported in logs and exported spans.
    service: String,

    /// OTLP endpoint for span export, if any.
    otlp_url: Option<String>,
}

impl LoggerConfig {
    /// Creates a config for the given service name, appending the label from
    /// the environment when one is set.
    pub fn for_service(base: &str) -> Self {
        let service = match env::var(SVC_LABEL_ENVVAR) {
            Ok(label) => format!("{base}%{label}"),
            Err(_) => base.to_owned(),
        };
        Self {
            service,
            otlp_url: None,
        }
    }

    /// Enables span export to the given OTLP endpoint.
    pub fn with_otlp_url(mut self, url: String) -> Self {
        self.otlp_url = Some(url);
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::for_service("(stakelock)")
    }
}

/// Initializes the logging subsystem. Call once, early in the binary.
pub fn init(config: LoggerConfig) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_filter(EnvFilter::from_default_env());

    match &config.otlp_url {
        Some(otlp_url) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(otlp_url)
                .build()
                .expect("must be able to initialize the span exporter");

            let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                .with_resource(
                    Resource::builder()
                        .with_attribute(KeyValue::new("service.name", config.service.clone()))
                        .build(),
                )
                .with_batch_exporter(exporter)
                .build();

            let otel_layer =
                tracing_opentelemetry::layer().with_tracer(provider.tracer("stakelock"));

            tracing_subscriber::registry()
                .with(fmt_layer)
                .with(otel_layer)
                .init();
        }
        None => tracing_subscriber::registry().with(fmt_layer).init(),
    }

    info!(service = %config.service, "logging started");
}

/// The OTLP endpoint from the standard envvar, if set.
pub fn otlp_url_from_env() -> Option<String> {
    env::var(OTLP_URL_ENVVAR).ok()
}
