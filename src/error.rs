//! Error types for the scout pipeline

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the scout pipeline
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    // External fetch errors
    #[error("Fetch failed: {endpoint} returned status {status}")]
    FetchStatus { endpoint: String, status: u16 },

    #[error("Fetch transport error: {0}")]
    FetchTransport(String),

    #[error("Malformed payload from {endpoint}: {detail}")]
    MalformedPayload { endpoint: String, detail: String },

    // Numeric field parse errors (usually degraded to NaN instead of raised)
    #[error("Could not parse numeric field: {0}")]
    Parse(String),

    // Persistence errors - fatal, the dataset must never be half-written
    #[error("Persistence failed: {0}")]
    Persistence(String),

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    // Swap routing errors
    #[error("Swap quote failed: {0}")]
    SwapQuote(String),

    #[error("Swap transaction send failed: {0}")]
    SwapSend(String),

    #[error("Insufficient balance: {available}SOL available, {required}SOL required")]
    InsufficientBalance { available: f64, required: f64 },

    // Position management errors
    #[error("Position not found: {0}")]
    PositionNotFound(String),

    // Classifier errors
    #[error("Model error: {0}")]
    Model(String),

    // Notification errors
    #[error("Notification failed: {0}")]
    Notify(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::FetchStatus { .. }
                | Error::FetchTransport(_)
                | Error::Rpc(_)
                | Error::SwapSend(_)
                | Error::Notify(_)
        )
    }

    /// Check if this error must terminate the process
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Persistence(_)
                | Error::Config(_)
                | Error::MissingEnvVar(_)
                | Error::InvalidKeypair(_)
        )
    }
}

// Conversion from reqwest transport errors
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::FetchTransport(e.to_string())
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from solana_client errors
impl From<solana_client::client_error::ClientError> for Error {
    fn from(e: solana_client::client_error::ClientError) -> Self {
        Error::Rpc(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
