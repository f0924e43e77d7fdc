use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Exchange API error: {0}")]
    Exchange(String),

    /// The exchange rejected the order with a parseable error code.
    /// The bot classifies the code as blocking (arms cooldown) or retryable.
    #[error("Order rejected (code {code}): {message}")]
    OrderRejected { code: i64, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Rejection code, when the exchange reported one.
    pub fn rejection_code(&self) -> Option<i64> {
        match self {
            Error::OrderRejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
