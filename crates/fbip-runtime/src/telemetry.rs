//! Tracing subscriber setup

use fbip_core::{FbipError, FbipResult};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `config.level`. Fails if the level
/// does not parse or a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> FbipResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| FbipError::config("logging.level", e.to_string()))?,
    };

    let text = (!config.json).then(|| fmt::layer().with_target(true));
    let json = config.json.then(|| fmt::layer().json().with_target(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .try_init()
        .map_err(|e| FbipError::config("logging", e.to_string()))
}
