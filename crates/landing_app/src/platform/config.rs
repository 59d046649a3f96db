use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use landing_engine::{CompletionSettings, EngineConfig, FragmentStreamSettings, StreamProtocol};
use landing_logging::{LogDestination, LogSettings};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub(crate) const CONFIG_ENV: &str = "LANDING_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "landing.ron";
const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) enum Protocol {
    #[default]
    Text,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub(crate) enum LogTarget {
    #[default]
    Terminal,
    File,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct LogConfig {
    pub target: LogTarget,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            target: LogTarget::Terminal,
            level: "info".to_string(),
            file: PathBuf::from("./landing.log"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub completion_url: String,
    /// Event stream of page fragments; `None` leaves it closed.
    pub fragment_stream_url: Option<String>,
    pub protocol: Protocol,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub export_dir: PathBuf,
    /// Initial value of the export name field.
    pub file_name: Option<String>,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            completion_url: DEFAULT_ENDPOINT.to_string(),
            fragment_stream_url: Some(DEFAULT_ENDPOINT.to_string()),
            protocol: Protocol::Text,
            connect_timeout_secs: 10,
            read_timeout_secs: 60,
            export_dir: PathBuf::from("./output"),
            file_name: None,
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads the file named by `LANDING_CONFIG`, or `./landing.ron`.
    pub(crate) fn load() -> anyhow::Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    /// A missing file yields the defaults; anything unreadable is an error.
    pub(crate) fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()));
            }
        };
        ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub(crate) fn log_settings(&self) -> anyhow::Result<LogSettings> {
        let level = LevelFilter::from_str(&self.log.level)
            .map_err(|_| anyhow!("unknown log level '{}'", self.log.level))?;
        let destination = match self.log.target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        };
        Ok(LogSettings {
            destination,
            level,
            file_path: self.log.file.clone(),
        })
    }

    pub(crate) fn engine_config(&self) -> EngineConfig {
        let connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        EngineConfig {
            completion: CompletionSettings {
                endpoint: self.completion_url.clone(),
                connect_timeout,
                read_timeout: Duration::from_secs(self.read_timeout_secs),
                protocol: match self.protocol {
                    Protocol::Text => StreamProtocol::Text,
                    Protocol::Data => StreamProtocol::Data,
                },
            },
            fragment_stream: self
                .fragment_stream_url
                .as_ref()
                .map(|url| FragmentStreamSettings {
                    url: url.clone(),
                    connect_timeout,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = AppConfig::load_from(&temp.path().join("landing.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.completion_url, "http://localhost:3000/api/chat");
        assert_eq!(config.export_dir, PathBuf::from("./output"));
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("landing.ron");
        fs::write(
            &path,
            r#"(
                completion_url: "http://127.0.0.1:9000/chat",
                fragment_stream_url: None,
                protocol: Data,
                log: (level: "debug"),
            )"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.completion_url, "http://127.0.0.1:9000/chat");
        assert_eq!(config.fragment_stream_url, None);
        assert_eq!(config.protocol, Protocol::Data);
        assert_eq!(config.read_timeout_secs, 60);
        assert_eq!(config.log.target, LogTarget::Terminal);

        let engine = config.engine_config();
        assert_eq!(engine.completion.protocol, StreamProtocol::Data);
        assert!(engine.fragment_stream.is_none());
        assert_eq!(config.log_settings().unwrap().level, LevelFilter::Debug);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("landing.ron");
        fs::write(&path, "(completion_url: 42)").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let config = AppConfig {
            log: LogConfig {
                level: "loud".into(),
                ..LogConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.log_settings().is_err());
    }
}
