use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid threshold '{0}': expected a percentage between 0 and 100")]
    InvalidThreshold(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CoverageError>;
