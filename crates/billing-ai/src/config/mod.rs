use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub dispatch: DispatchConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let dispatch = DispatchConfig::load()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            dispatch,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for the reminder dispatch run: scheduler auth, delivery timeouts,
/// retry budget, worker-pool width, and the run-level deadline.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub cron_secret: Option<String>,
    pub send_timeout: Duration,
    pub max_send_attempts: u32,
    pub retry_backoff: Duration,
    pub max_concurrency: usize,
    pub run_deadline: Duration,
}

impl DispatchConfig {
    fn load() -> Result<Self, ConfigError> {
        let cron_secret = env::var("CRON_SECRET").ok().filter(|s| !s.is_empty());

        let send_timeout_ms = parse_env_u64("DISPATCH_SEND_TIMEOUT_MS", 10_000)?;
        let max_send_attempts = parse_env_u64("DISPATCH_MAX_ATTEMPTS", 3)?.max(1) as u32;
        let retry_backoff_ms = parse_env_u64("DISPATCH_BACKOFF_MS", 200)?;
        let max_concurrency = parse_env_u64("DISPATCH_CONCURRENCY", 5)?.max(1) as usize;
        let run_deadline_secs = parse_env_u64("DISPATCH_RUN_DEADLINE_SECS", 300)?;

        Ok(Self {
            cron_secret,
            send_timeout: Duration::from_millis(send_timeout_ms),
            max_send_attempts,
            retry_backoff: Duration::from_millis(retry_backoff_ms),
            max_concurrency,
            run_deadline: Duration::from_secs(run_deadline_secs),
        })
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cron_secret: None,
            send_timeout: Duration::from_secs(10),
            max_send_attempts: 3,
            retry_backoff: Duration::from_millis(200),
            max_concurrency: 5,
            run_deadline: Duration::from_secs(300),
        }
    }
}

fn parse_env_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidDispatchValue { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDispatchValue { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDispatchValue { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidDispatchValue { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
