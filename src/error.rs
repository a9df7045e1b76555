// src/error.rs
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, QueueError>;

#[derive(Error, Debug)]
pub enum QueueError {
    /// Level outside `1..=max_level`. Raised before the store is touched.
    #[error("invalid level {level}, must be 1-{max_level}")]
    InvalidLevel { level: i64, max_level: i64 },

    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Connection, timeout or script failure against the backing store.
    #[error("store error: {0}")]
    Store(#[from] redis::RedisError),

    /// The store answered with something we cannot decode.
    #[error("unexpected store reply: {0}")]
    UnexpectedReply(String),

    #[error("element not found: {0}")]
    NotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl QueueError {
    /// True for failures that came from the store round trip itself.
    pub fn is_store(&self) -> bool {
        matches!(self, QueueError::Store(_) | QueueError::UnexpectedReply(_))
    }
}
