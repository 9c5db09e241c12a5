//! Error types for zentrader-core

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("OS secret store unavailable: {0}")]
    VaultUnavailable(String),

    #[error("Keychain error: {0}")]
    KeychainError(String),

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Exchange rejected request: retCode={code}, retMsg={message}")]
    ExchangeError { code: i64, message: String },

    #[error("Exchange response missing result payload")]
    EmptyResponse,

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
