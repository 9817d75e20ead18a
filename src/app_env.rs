use chrono::Duration;
use thiserror::Error;

/// URL for accessing the PostgreSQL database (should contain a schema name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. Uses [tracing_subscriber::EnvFilter] directive syntax
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Secret used to sign session tokens
pub const JWT_SECRET: &str = "JWT_SECRET";
/// How long a session token stays valid, in minutes
pub const SESSION_TTL_MINUTES: &str = "SESSION_TTL_MINUTES";
/// Socket address the HTTP server listens on
pub const BIND_ADDRESS: &str = "BIND_ADDRESS";

/// OpenTelemetry span export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";

const DEFAULT_SESSION_TTL_MINUTES: i64 = 24 * 60;
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";


#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the {0} environment variable must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Settings the server reads at startup
#[derive(Debug)]
pub struct AppConfig {
    pub db_url: String,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    pub bind_address: String,
    /// Span and metric export URLs, present only when both are configured
    pub otel_export_urls: Option<(String, String)>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any source of variables. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| read(name).ok_or(ConfigError::Missing(name));

        let session_ttl = match read(SESSION_TTL_MINUTES) {
            None => Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .and_then(Duration::try_minutes)
                .ok_or(ConfigError::Invalid {
                    name: SESSION_TTL_MINUTES,
                    value: raw,
                })?,
        };

        let otel_export_urls = match (read(OTEL_SPAN_EXPORT_URL), read(OTEL_METRIC_EXPORT_URL)) {
            (Some(spans), Some(metrics)) => Some((spans, metrics)),
            _ => None,
        };

        Ok(AppConfig {
            db_url: required(DB_URL)?,
            jwt_secret: required(JWT_SECRET)?,
            session_ttl,
            bind_address: read(BIND_ADDRESS).unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_owned()),
            otel_export_urls,
        })
    }
}
