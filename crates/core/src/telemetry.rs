// Telemetry Module
//
// Structured logging setup shared by every Registrar binary:
// - EnvFilter from RUST_LOG / LOG_LEVEL (default "info")
// - Human-readable or JSON output (LOG_FORMAT=json)

use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter, Layer,
    Registry,
};

// ============================================================================
// Telemetry Configuration
// ============================================================================

/// Configuration for logging
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name, attached to the startup log line
    pub service_name: String,
    /// Service version
    pub service_version: Option<String>,
    /// Log filter (e.g., "info", "debug", "registrar_control_plane=debug")
    pub log_filter: Option<String>,
    /// Emit one JSON object per event instead of human-readable lines
    pub json_output: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "registrar".to_string(),
            service_version: None,
            log_filter: None,
            json_output: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `SERVICE_NAME`: Service name (default: "registrar")
    /// - `RUST_LOG` or `LOG_LEVEL`: Log filter
    /// - `LOG_FORMAT`: "json" for JSON output, anything else for plain text
    pub fn from_env() -> Self {
        Self {
            service_name: std::env::var("SERVICE_NAME").unwrap_or_else(|_| "registrar".to_string()),
            service_version: None,
            log_filter: std::env::var("RUST_LOG")
                .ok()
                .or_else(|| std::env::var("LOG_LEVEL").ok()),
            json_output: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    /// Resolve the configured filter, falling back to "info" on absence or parse failure
    pub fn env_filter(&self) -> EnvFilter {
        self.log_filter
            .as_ref()
            .and_then(|f| EnvFilter::try_new(f).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Install the global tracing subscriber
///
/// Fails if a subscriber is already installed (e.g. called twice in one process).
///
/// # Example
///
/// ```ignore
/// use registrar_core::telemetry::{init_telemetry, TelemetryConfig};
///
/// let config = TelemetryConfig::from_env();
/// init_telemetry(&config).expect("logging already initialised");
/// ```
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TryInitError> {
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if config.json_output {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(config.env_filter())
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        version = config.service_version.as_deref().unwrap_or("unknown"),
        json = config.json_output,
        "Telemetry initialized"
    );

    Ok(())
}
