use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Default, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub documents: DocumentConfig,

    #[command(flatten)]
    pub cleanup: CleanupConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "HOMECLIP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "HOMECLIP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Port for the health probes
    #[arg(long, env = "HOMECLIP_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// How long to wait for background tasks during shutdown
    #[arg(long, env = "HOMECLIP_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080, mgmt_port: 9090, shutdown_timeout_secs: 10 }
    }
}

#[derive(Clone, Debug, Args)]
pub struct DocumentConfig {
    /// Max document content size in bytes (Default: 1MB)
    #[arg(long, env = "HOMECLIP_MAX_CONTENT_BYTES", default_value_t = 1_048_576)]
    pub max_content_bytes: usize,

    /// Max attachment size in bytes (Default: 50MB)
    #[arg(long, env = "HOMECLIP_MAX_FILE_BYTES", default_value_t = 52_428_800)]
    pub max_file_bytes: u64,

    /// Whether the file attachment routes are served
    #[arg(long, env = "HOMECLIP_ENABLE_FILE_UPLOADS", default_value_t = true, action = clap::ArgAction::Set)]
    pub enable_file_uploads: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self { max_content_bytes: 1_048_576, max_file_bytes: 52_428_800, enable_file_uploads: true }
    }
}

#[derive(Clone, Debug, Args)]
pub struct CleanupConfig {
    /// Whether the background sweeper runs
    #[arg(long = "cleanup-enabled", env = "HOMECLIP_CLEANUP_ENABLED", default_value_t = true, action = clap::ArgAction::Set)]
    pub enabled: bool,

    /// How often to sweep for expired documents
    #[arg(long = "cleanup-interval-secs", env = "HOMECLIP_CLEANUP_INTERVAL_SECS", default_value_t = 300)]
    pub interval_secs: u64,

    /// How long an expired document is kept before its files are reclaimed
    #[arg(long = "grace-period-secs", env = "HOMECLIP_GRACE_PERIOD_SECS", default_value_t = 3600)]
    pub grace_period_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self { enabled: true, interval_secs: 300, grace_period_secs: 3600 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Default, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "HOMECLIP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; traces and metrics are exported only when set
    #[arg(long, env = "HOMECLIP_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
