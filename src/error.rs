//! Error types for hashwalk.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can terminate an ordering run.
///
/// Every variant is terminal for the invocation that produced it; nothing
/// in the engine retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Fewer hashed items than the strategy needs to start.
    #[error("not enough usable hashes: strategy needs {required}, found {found}")]
    NoUsableHashes { required: usize, found: usize },

    /// The cancellation flag was observed at a checkpoint.
    #[error("ordering cancelled")]
    Cancelled,

    /// Strategy selector did not match any known strategy.
    #[error("unknown strategy: {0:?}")]
    UnknownStrategy(String),

    /// Invalid request or configuration value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Stable, wire-friendly classification of an [`OrderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoUsableHashes,
    Cancelled,
    UnknownStrategy,
    InvalidParameter,
}

impl OrderError {
    /// Classification used for the `errorKind` field of a failed response.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NoUsableHashes { .. } => ErrorKind::NoUsableHashes,
            OrderError::Cancelled => ErrorKind::Cancelled,
            OrderError::UnknownStrategy(_) => ErrorKind::UnknownStrategy,
            OrderError::InvalidParameter(_) => ErrorKind::InvalidParameter,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrderError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = OrderError::NoUsableHashes {
            required: 2,
            found: 1,
        };
        assert_eq!(err.kind(), ErrorKind::NoUsableHashes);
        assert_eq!(OrderError::Cancelled.kind(), ErrorKind::Cancelled);
        assert!(OrderError::Cancelled.is_cancelled());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn display_includes_counts() {
        let err = OrderError::NoUsableHashes {
            required: 2,
            found: 0,
        };
        assert_eq!(
            err.to_string(),
            "not enough usable hashes: strategy needs 2, found 0"
        );
        assert_eq!(
            OrderError::UnknownStrategy("tsp".into()).to_string(),
            "unknown strategy: \"tsp\""
        );
    }
}
