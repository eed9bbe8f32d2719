use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Result, anyhow};
use clap::Parser;

/// CLI / env configuration parsed at process startup.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "commons-search",
    about = "Dead-link-aware search API for licensed creative works",
    version,
    disable_help_subcommand = true
)]
struct CliConfig {
    /// Path to the JSON catalog of indexed works
    #[arg(long, env = "COMMONS_CATALOG_PATH")]
    catalog_path: PathBuf,

    /// Address to bind the HTTP server to (e.g., 0.0.0.0:8080)
    #[arg(long, env = "COMMONS_BIND_ADDR", default_value = "0.0.0.0:8080")]
    listen_addr: SocketAddr,

    /// Per-probe timeout for liveness checks, in seconds
    #[arg(long, env = "COMMONS_PROBE_TIMEOUT_SECS", default_value_t = 10)]
    probe_timeout_secs: u64,

    /// Maximum concurrent liveness probes per page construction
    #[arg(long, env = "COMMONS_PROBE_CONCURRENCY", default_value_t = 8)]
    probe_concurrency: usize,

    /// Liveness probe cache TTL in seconds (0 disables caching)
    #[arg(long, env = "COMMONS_PROBE_CACHE_TTL_SECS", default_value_t = 30)]
    probe_cache_ttl_secs: u64,

    /// Optional OTLP endpoint (grpc) for OpenTelemetry export
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otel_endpoint: Option<String>,

    /// Logical service name for telemetry (resource attribute)
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "commons-search")]
    otel_service_name: String,

    /// Deployment environment tag for telemetry (e.g., development, prod)
    #[arg(long, env = "COMMONS_ENV", default_value = "development")]
    environment: String,

    /// Default log filter when RUST_LOG is not provided
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Comma-separated list of allowed CORS origins
    #[arg(long, env = "COMMONS_CORS_ALLOWED_ORIGINS", value_delimiter = ',')]
    cors_allowed_origins: Vec<String>,
}

/// Fully validated configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog_path: PathBuf,
    pub listen_addr: SocketAddr,
    pub probe: ProbeSettings,
    pub otel: OtelConfig,
    pub log: LogConfig,
    pub environment: String,
    pub cors_allowed_origins: Vec<String>,
}

/// Liveness probing knobs.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub timeout: Duration,
    pub concurrency: usize,
    pub cache_ttl: Duration,
}

/// OpenTelemetry exporter configuration.
#[derive(Debug, Clone)]
pub struct OtelConfig {
    pub endpoint: Option<String>,
    pub service_name: String,
}

/// Structured logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
}

impl AppConfig {
    /// Parse CLI/env arguments and return a validated configuration.
    pub fn load() -> Result<Self> {
        let cli = CliConfig::parse();
        Self::try_from(cli)
    }
}

impl TryFrom<CliConfig> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(value: CliConfig) -> Result<Self> {
        ensure_file_exists(&value.catalog_path)?;
        if value.probe_concurrency == 0 {
            return Err(anyhow!("probe concurrency must be at least 1"));
        }

        Ok(Self {
            catalog_path: value.catalog_path,
            listen_addr: value.listen_addr,
            probe: ProbeSettings {
                timeout: Duration::from_secs(value.probe_timeout_secs),
                concurrency: value.probe_concurrency,
                cache_ttl: Duration::from_secs(value.probe_cache_ttl_secs),
            },
            otel: OtelConfig {
                endpoint: value.otel_endpoint,
                service_name: value.otel_service_name,
            },
            log: LogConfig {
                level: value.log_level,
            },
            environment: value.environment,
            cors_allowed_origins: value
                .cors_allowed_origins
                .into_iter()
                .filter(|origin| !origin.is_empty())
                .collect(),
        })
    }
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }
    Err(anyhow!(
        "catalog '{}' does not exist or is not a file",
        path.display()
    ))
}
