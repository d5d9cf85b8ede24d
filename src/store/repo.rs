use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Config, FileConfig};
use crate::error::{Result, TaskError};
use crate::store::tasks::TaskStore;

/// Directory holding the database and optional config, under the root.
pub const DIR_NAME: &str = ".tasklist";
pub const DB_FILE: &str = "tasks.db";
pub const CONFIG_FILE: &str = "config.yaml";

pub fn data_dir(root: &Path) -> PathBuf {
    root.join(DIR_NAME)
}

pub fn default_db_path(root: &Path) -> PathBuf {
    data_dir(root).join(DB_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    data_dir(root).join(CONFIG_FILE)
}

/// Create `.tasklist/` with an empty database and a default config file.
pub fn init(root: &Path) -> Result<PathBuf> {
    let dir = data_dir(root);
    if dir.exists() {
        return Err(TaskError::AlreadyInitialized);
    }
    fs::create_dir_all(&dir)?;
    fs::write(
        config_path(root),
        serde_yaml::to_string(&FileConfig::defaults())?,
    )?;
    TaskStore::open(&default_db_path(root))?;
    Ok(dir)
}

/// Open the task database named by the resolved configuration.
pub fn open_store(config: &Config) -> Result<TaskStore> {
    if let Some(parent) = config.db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        return Err(TaskError::NotInitialized);
    }
    TaskStore::open(&config.db_path)
}

/// Walk up from current directory to find the `.tasklist` root.
pub fn find_repo_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(TaskError::Io)?;
    find_repo_root_from(&cwd)
}

pub fn find_repo_root_from(start: &Path) -> Result<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if data_dir(&dir).is_dir() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(TaskError::NotInitialized);
        }
    }
}
