//! # Configuration Utilities
//!
//! Optional TOML configuration for the `stego` binary. Every field has a default, so an
//! empty file (or no file at all) is a valid configuration.

use anyhow::Result;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::StegoError;
use crate::stego::DEFAULT_LSB;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Example
/// ```ignore
/// let config: StegoConfig = load_config("stego.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StegoConfig {
    /// Payload bits per channel sample (1-8)
    pub lsb: u8,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`
    pub log_level: String,
}

impl Default for StegoConfig {
    fn default() -> Self {
        Self {
            lsb: DEFAULT_LSB,
            log_level: "info".to_string(),
        }
    }
}

impl StegoConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, StegoError> {
        self.log_level
            .parse()
            .map_err(|_| StegoError::Config(format!("unknown log level '{}'", self.log_level)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config: StegoConfig = toml::from_str("").unwrap();
        assert_eq!(config, StegoConfig::default());
        assert_eq!(config.lsb, 2);
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn test_load_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "lsb = 4\nlog_level = \"debug\"").unwrap();

        let config: StegoConfig = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.lsb, 4);
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
    }

    #[test]
    fn test_bad_log_level() {
        let config = StegoConfig {
            log_level: "loud".to_string(),
            ..StegoConfig::default()
        };
        assert!(matches!(config.level_filter(), Err(StegoError::Config(_))));
    }
}
