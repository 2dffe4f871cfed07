use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use reqwest::Url;

/// Base URL used outside production when `PREDICTION_API_URL` is not set.
pub const LOCAL_PREDICTION_API_URL: &str = "http://localhost:8000";
/// Deployed prediction service, the production fallback.
pub const PRODUCTION_PREDICTION_API_URL: &str = "https://salary-predictor-production.up.railway.app";

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

    fn default_prediction_api_url(self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_PREDICTION_API_URL,
            Self::Development | Self::Test => LOCAL_PREDICTION_API_URL,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub prediction: PredictionConfig,
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

        let (base_url, source) = match env::var("PREDICTION_API_URL") {
            Ok(value) if !value.trim().is_empty() => (value, EndpointSource::Environment),
            _ => (
                environment.default_prediction_api_url().to_string(),
                EndpointSource::Default,
            ),
        };
        let log_requests = env::var("PREDICTION_LOG_REQUESTS")
            .map(|value| parse_flag(&value))
            .unwrap_or(false);

        let mut prediction = PredictionConfig {
            base_url: String::new(),
            source,
            log_requests,
        };
        prediction.set_base_url(&base_url)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            prediction,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
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

/// Where the prediction base URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    Environment,
    Default,
    CommandLine,
}

/// Upstream prediction service settings.
#[derive(Debug, Clone)]
pub struct PredictionConfig {
    /// Absolute http(s) URL without a trailing slash.
    pub base_url: String,
    pub source: EndpointSource,
    pub log_requests: bool,
}

impl PredictionConfig {
    /// Validates and stores a base URL.
    pub fn set_base_url(&mut self, raw: &str) -> Result<(), ConfigError> {
        let trimmed = raw.trim().trim_end_matches('/');
        let url = Url::parse(trimmed).map_err(|err| ConfigError::InvalidApiUrl {
            value: raw.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiUrl {
                value: raw.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        self.base_url = trimmed.to_string();
        Ok(())
    }

    pub fn override_base_url(&mut self, raw: &str) -> Result<(), ConfigError> {
        self.set_base_url(raw)?;
        self.source = EndpointSource::CommandLine;
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidApiUrl {
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidApiUrl { value, reason } => write!(
                f,
                "PREDICTION_API_URL '{}' must be an absolute http(s) URL ({})",
                value, reason
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidApiUrl { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("PREDICTION_API_URL");
        env::remove_var("PREDICTION_LOG_REQUESTS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.prediction.base_url, LOCAL_PREDICTION_API_URL);
        assert_eq!(config.prediction.source, EndpointSource::Default);
        assert!(!config.prediction.log_requests);
    }

    #[test]
    fn production_falls_back_to_deployed_endpoint() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.prediction.base_url, PRODUCTION_PREDICTION_API_URL);
        reset_env();
    }

    #[test]
    fn prediction_url_and_logging_come_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PREDICTION_API_URL", "https://models.internal:9000/");
        env::set_var("PREDICTION_LOG_REQUESTS", "true");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.prediction.base_url, "https://models.internal:9000");
        assert_eq!(config.prediction.source, EndpointSource::Environment);
        assert!(config.prediction.log_requests);
        reset_env();
    }

    #[test]
    fn rejects_non_http_prediction_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PREDICTION_API_URL", "ftp://models.internal");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
        env::set_var("PREDICTION_API_URL", "not a url");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
        reset_env();
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }
}
