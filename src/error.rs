use thiserror::Error;

pub type Result<T> = std::result::Result<T, QrisError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QrisError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: String, found: String },
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}
