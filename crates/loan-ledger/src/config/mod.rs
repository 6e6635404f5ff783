use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::portfolio::MAX_FORECAST_HORIZON;

const DEFAULT_FORECAST_HORIZON: usize = 3;
const DEFAULT_CURRENCY: &str = "Bs.";

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
    pub ledger: LedgerConfig,
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

        let forecast_horizon = match env::var("APP_FORECAST_HORIZON") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(value) if (1..=MAX_FORECAST_HORIZON).contains(&value) => value,
                _ => return Err(ConfigError::InvalidForecastHorizon { value: raw }),
            },
            Err(_) => DEFAULT_FORECAST_HORIZON,
        };

        let currency = env::var("APP_CURRENCY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            ledger: LedgerConfig {
                forecast_horizon,
                currency,
            },
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

/// Ledger defaults shared by the evaluator and the forecaster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Number of months projected when a caller does not ask for a horizon.
    pub forecast_horizon: usize,
    /// Currency label rendered in recommendation text.
    pub currency: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            forecast_horizon: DEFAULT_FORECAST_HORIZON,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidForecastHorizon { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidForecastHorizon { value } => write!(
                f,
                "APP_FORECAST_HORIZON must be between 1 and {} months (found '{}')",
                MAX_FORECAST_HORIZON, value
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidForecastHorizon { .. } => None,
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
        env::remove_var("APP_FORECAST_HORIZON");
        env::remove_var("APP_CURRENCY");
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
        assert_eq!(config.ledger, LedgerConfig::default());
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

    #[test]
    fn rejects_zero_forecast_horizon() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_FORECAST_HORIZON", "0");
        match AppConfig::load() {
            Err(ConfigError::InvalidForecastHorizon { value }) => assert_eq!(value, "0"),
            other => panic!("expected horizon error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_forecast_horizon_past_the_maximum() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_FORECAST_HORIZON", "121");
        match AppConfig::load() {
            Err(err @ ConfigError::InvalidForecastHorizon { .. }) => {
                assert!(err.to_string().contains("between 1 and 120"));
            }
            other => panic!("expected horizon error, got {other:?}"),
        }

        env::set_var("APP_FORECAST_HORIZON", "120");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.ledger.forecast_horizon, 120);
        reset_env();
    }

    #[test]
    fn reads_ledger_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_FORECAST_HORIZON", "6");
        env::set_var("APP_CURRENCY", "USD");
        env::set_var("APP_ENV", "prod");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.ledger.forecast_horizon, 6);
        assert_eq!(config.ledger.currency, "USD");
        reset_env();
    }
}
