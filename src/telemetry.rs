use anyhow::{Context, Result};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, Resource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static OTLP_TRACING: AtomicBool = AtomicBool::new(false);

/// Telemetry configuration structure
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    pub otlp_endpoint: Option<String>,
    pub enable_tracing: bool,
    pub export_timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: std::env::var("APP_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            enable_tracing: std::env::var("OTEL_TRACES_ENABLED")
                .map(|v| v.parse().unwrap_or(true))
                .unwrap_or(true),
            export_timeout: Duration::from_secs(30),
        }
    }
}

/// Telemetry handles for graceful shutdown
pub struct TelemetryHandles {
    _config: TelemetryConfig,
}

impl TelemetryHandles {
    /// Flush and shut down the global tracer provider
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down telemetry providers...");
        global::shutdown_tracer_provider();
        info!("Telemetry providers shutdown completed");
        Ok(())
    }
}

/// Initialize tracing output and, when an OTLP endpoint is configured, span export
pub async fn init_telemetry(config: Option<TelemetryConfig>) -> Result<TelemetryHandles> {
    let config = config.unwrap_or_default();

    setup_tracing_subscriber()?;

    info!(
        "Initializing telemetry for service: {} v{} in environment: {}",
        config.service_name, config.service_version, config.environment
    );

    if config.enable_tracing {
        let resource = create_resource(&config);
        init_tracing(&config, resource)?;
    }

    info!("Telemetry initialization completed successfully");
    Ok(TelemetryHandles { _config: config })
}

fn create_resource(config: &TelemetryConfig) -> Resource {
    Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", config.service_version.clone()),
        KeyValue::new("deployment.environment", config.environment.clone()),
    ])
}

fn init_tracing(config: &TelemetryConfig, resource: Resource) -> Result<()> {
    let Some(endpoint) = &config.otlp_endpoint else {
        info!("No OTLP endpoint configured, using console-only tracing");
        return Ok(());
    };

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_timeout(config.export_timeout),
        )
        .with_trace_config(
            opentelemetry_sdk::trace::config()
                .with_resource(resource)
                .with_sampler(opentelemetry_sdk::trace::Sampler::AlwaysOn),
        )
        .install_batch(runtime::Tokio)
        .context("Failed to initialize OTLP tracer")?;

    OTLP_TRACING.store(true, Ordering::Relaxed);
    info!(%endpoint, "Distributed tracing initialized with OTLP exporter");
    Ok(())
}

fn setup_tracing_subscriber() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into());

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}

/// Get a tracer instance for the current service
pub fn get_tracer(name: &'static str) -> global::BoxedTracer {
    global::tracer(name)
}

/// Get a meter whose instruments report through `tracing` events
pub fn get_meter(name: &str) -> Meter {
    Meter {
        name: name.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct Meter {
    name: String,
}

impl Meter {
    pub fn u64_counter(&self, name: &str) -> InstrumentBuilder<Counter> {
        InstrumentBuilder::new(Counter {
            name: name.to_string(),
            meter: self.name.clone(),
            description: String::new(),
        })
    }

    pub fn f64_histogram(&self, name: &str) -> InstrumentBuilder<Histogram> {
        InstrumentBuilder::new(Histogram {
            name: name.to_string(),
            meter: self.name.clone(),
            description: String::new(),
        })
    }
}

pub trait Instrument {
    fn set_description(&mut self, description: &str);
}

#[derive(Debug)]
pub struct InstrumentBuilder<I> {
    instrument: I,
}

impl<I: Instrument> InstrumentBuilder<I> {
    fn new(instrument: I) -> Self {
        Self { instrument }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.instrument.set_description(description);
        self
    }

    pub fn build(self) -> I {
        self.instrument
    }
}

#[derive(Debug, Clone)]
pub struct Counter {
    name: String,
    meter: String,
    description: String,
}

impl Instrument for Counter {
    fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }
}

impl Counter {
    pub fn add(&self, value: u64, attributes: &[KeyValue]) {
        tracing::debug!(
            meter = %self.meter,
            counter = %self.name,
            value,
            attributes = %format_attributes(attributes),
            "Counter incremented"
        );
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone)]
pub struct Histogram {
    name: String,
    meter: String,
    description: String,
}

impl Instrument for Histogram {
    fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }
}

impl Histogram {
    pub fn record(&self, value: f64, attributes: &[KeyValue]) {
        tracing::debug!(
            meter = %self.meter,
            histogram = %self.name,
            value,
            attributes = %format_attributes(attributes),
            "Histogram recorded"
        );
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

fn format_attributes(attributes: &[KeyValue]) -> String {
    attributes
        .iter()
        .map(|kv| format!("{}={}", kv.key, kv.value))
        .collect::<Vec<_>>()
        .join(",")
}

/// Health check for telemetry components
pub fn telemetry_health_check() -> HashMap<String, bool> {
    let mut health = HashMap::new();
    health.insert("tracing_subscriber".to_string(), true);
    health.insert("otlp_exporter".to_string(), OTLP_TRACING.load(Ordering::Relaxed));
    health
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_are_rendered_in_order() {
        let rendered = format_attributes(&[
            KeyValue::new("stage", "hr_review"),
            KeyValue::new("action", "approve"),
        ]);
        assert_eq!(rendered, "stage=hr_review,action=approve");
    }

    #[test]
    fn test_builder_keeps_description() {
        let counter = get_meter("test")
            .u64_counter("things_total")
            .with_description("Things counted")
            .build();
        assert_eq!(counter.description(), "Things counted");
    }
}
