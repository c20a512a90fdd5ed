use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, AppEnvironment};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("'{value}' is not a valid log filter")]
    BadFilter {
        value: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

/// Installs the global subscriber. `RUST_LOG` wins when set; otherwise the
/// `SCHOOL_DESK_LOG_LEVEL` value carried by the config applies. ANSI colour
/// is limited to development builds.
pub fn init(config: &AppConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.telemetry.log_level).map_err(|source| {
            TelemetryError::BadFilter {
                value: config.telemetry.log_level.clone(),
                source,
            }
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(config.environment == AppEnvironment::Development)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, StorageConfig, TelemetryConfig};
    use std::path::PathBuf;
    use std::time::Duration;

    fn config(log_level: &str) -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            api: ApiConfig {
                base_url: "http://127.0.0.1:3000/api".to_string(),
                timeout: Duration::from_secs(5),
            },
            storage: StorageConfig {
                state_dir: PathBuf::from(".school-desk"),
            },
            telemetry: TelemetryConfig {
                log_level: log_level.to_string(),
            },
        }
    }

    #[test]
    fn rejects_an_unparseable_filter() {
        std::env::remove_var("RUST_LOG");
        let result = init(&config("info=too=many"));
        assert!(matches!(result, Err(TelemetryError::BadFilter { .. })));
    }

    #[test]
    fn second_initialisation_is_reported_not_ignored() {
        std::env::remove_var("RUST_LOG");
        let first = init(&config("info"));
        let second = init(&config("info"));
        assert!(first.is_ok() || matches!(first, Err(TelemetryError::Subscriber(_))));
        assert!(matches!(second, Err(TelemetryError::Subscriber(_))));
    }
}
