use anyhow::{Context, Result};
use serde::Deserialize;
use txwatch_connector::config::ConnectorConfig;
use txwatch_logger::LogConfig;

/// The top-level configuration for the txwatch daemon.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct DaemonConfig {
    #[serde(default)]
    pub connector: ConnectorConfig,
    #[serde(default)]
    pub daemon: DaemonSpecificConfig,
}

/// Contains settings that are unique to the daemon binary.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct DaemonSpecificConfig {
    #[serde(default)]
    pub watch: WatchConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Addresses subscribed at startup and how often their activity is reported.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WatchConfig {
    pub addresses: Vec<String>,
    pub report_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            report_interval_secs: 5,
        }
    }
}

/// Loads the daemon configuration from a specified TOML file.
///
/// Values from `TXWATCH__`-prefixed environment variables override the file.
pub fn load_config(path: &str) -> Result<DaemonConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(config::Environment::with_prefix("TXWATCH").separator("__"));

    let settings: DaemonConfig = builder
        .build()
        .context(format!("Failed to build configuration from '{}'", path))?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    Ok(settings)
}
