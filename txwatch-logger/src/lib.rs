//! Process-wide `tracing` setup shared by the txwatch binaries.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs::File, str::FromStr};
use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt,
    prelude::*,
    EnvFilter, Registry,
};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Plain,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    File,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default, rename_all = "kebab-case")]
pub struct LogConfig {
    /// Log level, e.g., "info", "debug", "trace". `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Path to the log file, required if output is "file".
    pub file_path: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plain,
            output: LogOutput::Stdout,
            file_path: None,
        }
    }
}

impl LogConfig {
    /// The configured level, falling back to `INFO` when it cannot be parsed.
    pub fn level(&self) -> Level {
        Level::from_str(&self.level).unwrap_or(Level::INFO)
    }
}

/// Installs the global subscriber. Fails if one is already installed or the
/// log file cannot be created.
pub fn init(config: &LogConfig) -> Result<()> {
    // `RUST_LOG`, when set, replaces the configured level entirely.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let level_filter = env_filter
        .is_none()
        .then(|| LevelFilter::from_level(config.level()));
    let subscriber = Registry::default().with(env_filter).with(level_filter);

    match config.output {
        LogOutput::File => {
            let file_path = config
                .file_path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("Log output is 'file' but 'file_path' is not specified"))?;
            let file_writer = File::create(file_path)
                .with_context(|| format!("Failed to create log file '{}'", file_path))?;

            match config.format {
                LogFormat::Json => subscriber
                    .with(fmt::layer().with_writer(file_writer).json())
                    .try_init()?,
                LogFormat::Plain => subscriber
                    .with(fmt::layer().with_writer(file_writer).with_ansi(false))
                    .try_init()?,
            }
        }
        LogOutput::Stdout => {
            match config.format {
                LogFormat::Json => subscriber
                    .with(fmt::layer().with_writer(std::io::stdout).json())
                    .try_init()?,
                LogFormat::Plain => subscriber
                    .with(fmt::layer().with_writer(std::io::stdout).pretty())
                    .try_init()?,
            }
        }
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_falls_back_to_info() {
        let config = LogConfig {
            level: "chatty".into(),
            ..Default::default()
        };
        assert_eq!(config.level(), Level::INFO);
        assert_eq!(
            LogConfig {
                level: "debug".into(),
                ..Default::default()
            }
            .level(),
            Level::DEBUG
        );
    }

    #[test]
    fn file_output_requires_a_path() {
        let config = LogConfig {
            output: LogOutput::File,
            ..Default::default()
        };
        let err = init(&config).unwrap_err();
        assert!(err.to_string().contains("file_path"));
    }

    #[test]
    fn json_file_logging_initializes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("txwatch.log");
        let config = LogConfig {
            format: LogFormat::Json,
            output: LogOutput::File,
            file_path: Some(path.to_string_lossy().into_owned()),
            ..Default::default()
        };

        init(&config).unwrap();
        tracing::info!(height = 1, "written to file");
        assert!(path.exists());
        // A second global subscriber is refused rather than panicking.
        assert!(init(&config).is_err());
    }
}
