//! Error types for sink operations

use crate::sink::NodeRef;

/// Errors raised by a graph sink
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// Another transaction committed since this one began
    #[error("transaction conflict: store moved from version {expected} to {actual}")]
    Conflict {
        /// Store version the transaction started from
        expected: u64,
        /// Store version found at commit
        actual: u64,
    },

    /// Relationship endpoint does not exist
    #[error("node not found: {0}")]
    NodeNotFound(NodeRef),

    /// Store cannot be reached
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// Store refused the write
    #[error("write rejected: {0}")]
    Rejected(String),
}

impl SinkError {
    /// Create unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
