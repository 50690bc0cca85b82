//! Error handling for the exchange
//!
//! This module provides the error types for every exchange and ledger operation.

use std::fmt;

/// Result type alias for exchange operations
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Why a block could not be linked onto the local chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictCause {
    /// The block index is not exactly one past the last block
    IndexMismatch { expected: u64, actual: u64 },
    /// The block does not point at the hash of the last block
    PrevHashMismatch { expected: String, actual: String },
    /// The stored hash does not match the block contents
    HashMismatch { index: u64 },
}

impl fmt::Display for ConflictCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictCause::IndexMismatch { expected, actual } => {
                write!(f, "invalid block index: expected {expected}, got {actual}")
            }
            ConflictCause::PrevHashMismatch { expected, actual } => {
                write!(
                    f,
                    "invalid previous hash: expected {expected}, got {actual}"
                )
            }
            ConflictCause::HashMismatch { index } => {
                write!(f, "block {index} does not match its own hash")
            }
        }
    }
}

impl std::error::Error for ConflictCause {}

/// Error types for exchange operations
#[derive(Debug, Clone)]
pub enum ExchangeError {
    /// A submitted block does not extend the local chain
    ChainConflict { miner: String, cause: ConflictCause },
    /// Transaction construction errors
    InvalidTransaction(String),
    /// Serialization errors while hashing
    Serialization(String),
    /// System clock errors
    Clock(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
    /// Peer miner state errors
    Network(String),
    /// The exchange task is no longer running
    ServiceStopped,
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeError::ChainConflict { miner, cause } => {
                write!(f, "{cause}, block received from {miner}")
            }
            ExchangeError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            ExchangeError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            ExchangeError::Clock(msg) => write!(f, "Clock error: {msg}"),
            ExchangeError::Config(msg) => write!(f, "Configuration error: {msg}"),
            ExchangeError::Io(msg) => write!(f, "I/O error: {msg}"),
            ExchangeError::Network(msg) => write!(f, "Network error: {msg}"),
            ExchangeError::ServiceStopped => write!(f, "Exchange service has stopped"),
        }
    }
}

impl std::error::Error for ExchangeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExchangeError::ChainConflict { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ExchangeError {
    fn from(err: std::io::Error) -> Self {
        ExchangeError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ExchangeError {
    fn from(err: toml::de::Error) -> Self {
        ExchangeError::Config(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for ExchangeError {
    fn from(err: bincode::error::EncodeError) -> Self {
        ExchangeError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_chain_conflict_names_the_miner() {
        let err = ExchangeError::ChainConflict {
            miner: "miner-1".to_string(),
            cause: ConflictCause::PrevHashMismatch {
                expected: "abc".to_string(),
                actual: "wrong".to_string(),
            },
        };

        let msg = err.to_string();
        assert!(msg.contains("miner-1"));
        assert!(msg.contains("wrong"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ExchangeError = io.into();
        assert!(matches!(err, ExchangeError::Io(_)));
    }
}
