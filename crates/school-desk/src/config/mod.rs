use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the client.
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

/// Top-level configuration for the client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let base_url = env::var("SCHOOL_DESK_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000/api".to_string());
        if base_url.trim().is_empty() {
            return Err(ConfigError::EmptyApiUrl);
        }

        let timeout_secs = env::var("SCHOOL_DESK_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidTimeout)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let state_dir = env::var("SCHOOL_DESK_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".school-desk"));

        let log_level = env::var("SCHOOL_DESK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            api: ApiConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            storage: StorageConfig { state_dir },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Settings for reaching the backend REST API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

/// Where session tokens and UI selections persist between runs.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub state_dir: PathBuf,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyApiUrl,
    InvalidTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyApiUrl => write!(f, "SCHOOL_DESK_API_URL must not be empty"),
            ConfigError::InvalidTimeout => {
                write!(f, "SCHOOL_DESK_TIMEOUT_SECS must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

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
        env::remove_var("SCHOOL_DESK_API_URL");
        env::remove_var("SCHOOL_DESK_TIMEOUT_SECS");
        env::remove_var("SCHOOL_DESK_STATE_DIR");
        env::remove_var("SCHOOL_DESK_LOG_LEVEL");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.api.base_url, "http://127.0.0.1:3000/api");
        assert_eq!(config.api.timeout, Duration::from_secs(30));
        assert_eq!(config.storage.state_dir, PathBuf::from(".school-desk"));
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCHOOL_DESK_TIMEOUT_SECS", "soon");
        let result = AppConfig::load();
        reset_env();
        assert!(matches!(result, Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn recognizes_production_aliases() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "PROD");
        let config = AppConfig::load().expect("config loads");
        reset_env();
        assert_eq!(config.environment, AppEnvironment::Production);
    }
}
