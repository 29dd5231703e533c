//! Ordering errors.

use thiserror::Error;

/// Why a record failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("record is not an object")]
    NotAnObject,

    #[error("'group' key is missing")]
    MissingGroup,

    #[error("'group' key is not a string")]
    GroupNotString,
}

/// Errors raised while validating records or ordering specifications.
#[derive(Debug, Error)]
pub enum OrderingError {
    /// A record is not an object with a string `group` key.
    #[error("malformed custom config object - {reason}:\n{content}")]
    MalformedRecord {
        reason: MalformedReason,
        /// The offending record, pretty-printed.
        content: String,
    },

    /// The specification names exactly one group, which is not a chain.
    #[error("group order must name at least 2 groups, got {0}")]
    InvalidSpec(usize),
}

/// Result type for ordering operations.
pub type OrderingResult<T> = Result<T, OrderingError>;
