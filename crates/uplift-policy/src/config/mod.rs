use crate::scoring::{ScoringSettings, DEFAULT_MAX_INVALID_FRACTION};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

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
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scoring: ScoringConfig::from_env()?,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Default upload ceiling for `POST /score`.
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 64 * 1024 * 1024;

/// Default number of ranked contacts echoed back in an HTTP response.
pub const DEFAULT_RESPONSE_TOP_LIMIT: usize = 1000;

/// Model location, default economics and batch guard rails.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub model_dir: PathBuf,
    pub margin: f64,
    pub cost: f64,
    pub max_invalid_fraction: f64,
    pub allow_empty_best_n: bool,
    pub upload_max_bytes: usize,
    pub response_top_limit: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            margin: 0.30,
            cost: 0.05,
            max_invalid_fraction: DEFAULT_MAX_INVALID_FRACTION,
            allow_empty_best_n: false,
            upload_max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
            response_top_limit: DEFAULT_RESPONSE_TOP_LIMIT,
        }
    }
}

impl ScoringConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let model_dir = env::var("UPLIFT_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_dir);
        let margin = parse_var("UPLIFT_MARGIN", defaults.margin)?;
        let cost = parse_var("UPLIFT_COST", defaults.cost)?;
        if !margin.is_finite() {
            return Err(ConfigError::InvalidValue {
                variable: "UPLIFT_MARGIN",
                value: margin.to_string(),
            });
        }
        if !cost.is_finite() {
            return Err(ConfigError::InvalidValue {
                variable: "UPLIFT_COST",
                value: cost.to_string(),
            });
        }

        let max_invalid_fraction =
            parse_var("UPLIFT_MAX_INVALID_FRACTION", defaults.max_invalid_fraction)?;
        if !(0.0..=1.0).contains(&max_invalid_fraction) {
            return Err(ConfigError::InvalidValue {
                variable: "UPLIFT_MAX_INVALID_FRACTION",
                value: max_invalid_fraction.to_string(),
            });
        }

        let allow_empty_best_n =
            parse_var("UPLIFT_ALLOW_EMPTY_BEST_N", defaults.allow_empty_best_n)?;

        let upload_max_bytes = parse_var("UPLIFT_UPLOAD_MAX_BYTES", defaults.upload_max_bytes)?;
        if upload_max_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                variable: "UPLIFT_UPLOAD_MAX_BYTES",
                value: upload_max_bytes.to_string(),
            });
        }
        let response_top_limit =
            parse_var("UPLIFT_RESPONSE_TOP_LIMIT", defaults.response_top_limit)?;

        Ok(Self {
            model_dir,
            margin,
            cost,
            max_invalid_fraction,
            allow_empty_best_n,
            upload_max_bytes,
            response_top_limit,
        })
    }

    pub fn settings(&self) -> ScoringSettings {
        ScoringSettings {
            max_invalid_fraction: self.max_invalid_fraction,
            allow_empty_best_n: self.allow_empty_best_n,
        }
    }
}

fn parse_var<T: FromStr>(variable: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue {
                variable,
                value: raw,
            }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue {
        variable: &'static str,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { variable, value } => {
                write!(f, "{variable} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidValue { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
