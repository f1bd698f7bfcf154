//! Error types

use thiserror::Error;

/// Errors raised while decoding or encoding token metadata account data.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DecodeError {
    /// The buffer holds no bytes at all
    #[error("account data is empty")]
    Empty,
    /// The leading key byte names a different account type
    #[error("unexpected account key {found}, expected {expected}")]
    UnexpectedKey {
        /// Key byte found in the buffer
        found: u8,
        /// Key byte the layout requires
        expected: u8,
    },
    /// The leading key byte is not a known master edition version
    #[error("unrecognized master edition version tag {0}")]
    UnrecognizedVersion(u8),
    /// The buffer ended early or a field held an invalid value
    #[error("malformed account data: {0}")]
    Malformed(String),
    /// A string field does not fit its on-chain capacity
    #[error("{field} is {len} bytes, capacity is {max}")]
    StringTooLong {
        /// Field name
        field: &'static str,
        /// Actual byte length
        len: usize,
        /// Declared capacity
        max: usize,
    },
    /// More creators than a metadata account has room for
    #[error("{count} creators, at most {max} fit")]
    TooManyCreators {
        /// Creators supplied
        count: usize,
        /// Creator capacity
        max: usize,
    },
}

impl From<std::io::Error> for DecodeError {
    fn from(e: std::io::Error) -> Self {
        DecodeError::Malformed(e.to_string())
    }
}

