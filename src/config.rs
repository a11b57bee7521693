use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::http::buffer::BufferLimits;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "wicket.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Value of the `Server` response header.
    pub server_name: String,
    /// Readiness events handled per poll.
    pub max_events: usize,
    pub buffer: BufferLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            server_name: "Wicket".to_string(),
            max_events: 500,
            buffer: BufferLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory whose files are served.
    pub root: PathBuf,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// No subscriber is installed when `false`.
    pub enabled: bool,
    /// Log to this file instead of stdout. It is truncated on startup.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: None,
        }
    }
}

impl Config {
    /// Loads the file named by `WICKET_CONFIG` (or `wicket.yaml`), falling
    /// back to defaults when it does not exist. `LISTEN` overrides the
    /// listen address.
    pub fn load() -> anyhow::Result<Self> {
        let path =
            std::env::var("WICKET_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut cfg = Self::load_file(Path::new(&path))?;

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    /// Reads a YAML config file. A missing file yields the defaults.
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_yaml(&contents)
                .with_context(|| format!("invalid config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => {
                Err(e).with_context(|| format!("failed to read config file {}", path.display()))
            }
        }
    }

    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }
}
