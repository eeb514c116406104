use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldSyncError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Security token not found: {0}")]
    MissingToken(String),

    #[error("Translation endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Malformed translation response: {0}")]
    Payload(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FieldSyncError>;
