#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Ignore rule error: {0}")]
    Ignore(#[from] ignore::Error),

    #[error("Resolver error: {0}")]
    Resolver(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("Task error: {0}")]
    Task(String),

    #[error("{0}")]
    General(String),
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            AppError::Task("task cancelled".to_string())
        } else {
            AppError::Task(format!("task failed: {err}"))
        }
    }
}
