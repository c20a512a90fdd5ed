mod app;
mod auth;
mod cli;
mod tenants;
mod years;

use school_desk::config::AppConfig;
use school_desk::{telemetry, AppError};

pub async fn run() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config)?;
    cli::run(config).await
}
