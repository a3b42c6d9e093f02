use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid subject: {0}")]
    InvalidSubject(String),

    #[error("invalid result: {0}")]
    InvalidResult(String),

    #[error("malformed transcript context at line {line}: {reason}")]
    MalformedContext { line: usize, reason: String },

    #[error("invalid uuid: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
