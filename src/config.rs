//! Actuator configuration
//!
//! Settings that the embedding controller passes into the reconciliation
//! core. Loaded from TOML; every field has a default so an empty document
//! is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActuatorConfig {
    /// Extra DNS suffixes used to synthesize internal-DNS aliases from the
    /// first label of an instance's private DNS name
    pub internal_dns_suffixes: Vec<String>,
    pub log_format: LogFormat,
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            internal_dns_suffixes: Vec::new(),
            log_format: LogFormat::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ActuatorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::ConfigError(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }
}
