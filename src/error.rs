use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("not a tasklist directory (run `tasklist init` first)")]
    NotInitialized,

    #[error("tasklist already initialized in this directory")]
    AlreadyInitialized,

    #[error("task {0} not found")]
    TaskNotFound(i64),

    #[error("a task named '{0}' already exists")]
    DuplicateName(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("storage failure: {0}")]
    Db(#[from] rusqlite::Error),
}

impl TaskError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::AlreadyInitialized => "already_initialized",
            Self::TaskNotFound(_) => "task_not_found",
            Self::DuplicateName(_) => "duplicate_name",
            Self::Validation(_) => "validation_error",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Yaml(_) => "yaml_error",
            Self::Template(_) => "template_error",
            Self::Db(_) => "storage_failure",
        }
    }

    /// Whether the caller can fix the request and retry (as opposed to a
    /// failure on our side).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound(_) | Self::DuplicateName(_) | Self::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
