//! # Core Error Types
//!
//! Parse failures for the string forms used in saved worlds and network
//! messages.

use thiserror::Error;

/// Errors produced when parsing core identifiers from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The name does not match any block type.
    #[error("unknown block type: {0:?}")]
    UnknownBlockType(String),

    /// A chunk key that is not of the form `"cx,cz"`.
    #[error("malformed chunk key: {0:?}")]
    MalformedChunkKey(String),
}

/// Result type for core parsing.
pub type ParseResult<T> = Result<T, ParseError>;
