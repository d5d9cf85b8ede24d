use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskError};
use crate::store::repo;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Contents of `.tasklist/config.yaml`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Database file; relative paths are resolved against the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// `tracing_subscriber::EnvFilter` directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl FileConfig {
    /// What `tasklist init` writes.
    pub fn defaults() -> Self {
        Self {
            db_path: Some(PathBuf::from(repo::DIR_NAME).join(repo::DB_FILE)),
            host: Some(DEFAULT_HOST.to_string()),
            port: Some(DEFAULT_PORT),
            log_filter: None,
        }
    }

    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Some(Self::default()));
        }
        let parsed = serde_yaml::from_str(&raw).map_err(|e| {
            TaskError::Config(format!("{}: {e}", path.display()))
        })?;
        Ok(Some(parsed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_filter: Option<String>,
}

impl Config {
    /// Defaults only, rooted at `root`.
    pub fn with_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            db_path: repo::default_db_path(root),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_filter: None,
        }
    }

    /// Resolve from `.tasklist/config.yaml` and the process environment.
    ///
    /// First match wins: command-line flags (applied by the caller), then
    /// `TASKLIST_DB`/`TASKLIST_HOST`/`TASKLIST_PORT`/`TASKLIST_LOG`, then the
    /// file, then built-in defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let file = FileConfig::read(&repo::config_path(root))?;
        Self::from_sources(root, file, |key| std::env::var(key).ok())
    }

    pub fn from_sources(
        root: &Path,
        file: Option<FileConfig>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::with_root(root);

        if let Some(file) = file {
            if let Some(db_path) = file.db_path {
                config.db_path = root.join(db_path);
            }
            if let Some(host) = file.host {
                config.host = host;
            }
            if let Some(port) = file.port {
                config.port = port;
            }
            config.log_filter = file.log_filter;
        }

        if let Some(db_path) = env("TASKLIST_DB") {
            config.db_path = root.join(db_path);
        }
        if let Some(host) = env("TASKLIST_HOST") {
            config.host = host;
        }
        if let Some(port) = env("TASKLIST_PORT") {
            config.port = port.parse().map_err(|e| {
                TaskError::Config(format!("TASKLIST_PORT '{port}': {e}"))
            })?;
        }
        if let Some(filter) = env("TASKLIST_LOG") {
            config.log_filter = Some(filter);
        }

        if config.host.trim().is_empty() {
            return Err(TaskError::Config("host must not be empty".into()));
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
