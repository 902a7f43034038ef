use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrellisError>;

#[derive(Debug, Error)]
pub enum TrellisError {
    /// The request never completed (connect failure, timeout, broken body)
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a failure status
    #[error("Request rejected ({status}): {message}")]
    RemoteRejection { status: u16, message: String },

    /// A guard caught an operation that correct UI wiring never issues
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("List not found: {0}")]
    ListNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("No board is currently open")]
    NoActiveBoard,

    #[error("Progress must be between 0 and 100, got {0}")]
    InvalidProgress(u8),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Other(String),
}

impl TrellisError {
    /// Remote failures that send a reorder down the rollback path
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RemoteRejection { .. })
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}

impl From<figment::Error> for TrellisError {
    fn from(err: figment::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(feature = "http-gateway")]
impl From<reqwest::Error> for TrellisError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::RemoteRejection {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => Self::Network(err.to_string()),
        }
    }
}
