use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Backend capability not available: {0}")]
    NotAvailable(String),

    #[error("Backend operation failed: {0}")]
    OperationFailed(String),

    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
