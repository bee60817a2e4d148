//! Tracing setup for binaries embedding the reconciliation core

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{ActuatorConfig, LogFormat};
use crate::error::{Error, Result};

/// Build the env filter: `RUST_LOG` wins, otherwise the configured level.
pub fn env_filter(config: &ActuatorConfig) -> Result<EnvFilter> {
    EnvFilter::builder()
        .with_default_directive(
            config
                .log_level
                .parse()
                .map_err(|e| Error::ConfigError(format!("invalid log level: {e}")))?,
        )
        .from_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| Error::ConfigError(format!("invalid log filter: {e}")))
}

/// Install the global subscriber with stdout logging in the configured format.
pub fn init_tracing(config: &ActuatorConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let res = match config.log_format {
        LogFormat::Plain => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };
    res.map_err(|e| Error::ConfigError(format!("tracing already initialized: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_rejects_bad_level() {
        let cfg = ActuatorConfig {
            log_level: "mytarget=verbose".to_string(),
            ..Default::default()
        };
        assert!(env_filter(&cfg).is_err());
    }

    #[test]
    fn test_env_filter_accepts_default() {
        assert!(env_filter(&ActuatorConfig::default()).is_ok());
    }
}
