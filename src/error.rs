#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("file '{file}' not found in path '{directory}'.")]
    FileNotFound { file: String, directory: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, ExtractorError>;
