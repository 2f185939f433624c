//! # World Error Types
//!
//! Errors that cross the world crate's boundary. Expected absences
//! (occupied coordinate, missing block, stale generation result) are plain
//! `bool`/`Option` returns and never show up here.

use std::path::PathBuf;

use thiserror::Error;

use loam_core::ParseError;

/// Failures reading or writing saved chunks.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Filesystem failure.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The saved world could not be decompressed.
    #[error("corrupt world file: {0}")]
    Compression(String),

    /// The saved world is not valid JSON of the expected shape.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failure injected by a test store.
    #[error("injected store failure: {0}")]
    Injected(&'static str),
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Reasons an inbound block update is dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// Not JSON, or not the expected message shape.
    #[error("malformed block update: {0}")]
    Malformed(String),

    /// An `add` without a block type.
    #[error("add message at ({x}, {y}, {z}) has no type")]
    MissingType {
        /// X coordinate.
        x: i32,
        /// Y coordinate.
        y: i32,
        /// Z coordinate.
        z: i32,
    },

    /// The block type name is not known.
    #[error(transparent)]
    UnknownType(#[from] ParseError),

    /// The coordinate lies below the floor or past the world limit.
    #[error("block update at ({x}, {y}, {z}) is outside the world")]
    OutOfWorld {
        /// X coordinate.
        x: i32,
        /// Y coordinate.
        y: i32,
        /// Z coordinate.
        z: i32,
    },
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

/// Invalid or unreadable configuration. Raised once at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The config is not valid TOML of the expected shape.
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Umbrella error for the engine facade.
#[derive(Error, Debug)]
pub enum WorldError {
    /// Persistence failure.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Relay failure.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generation worker threads could not be started.
    #[error("cannot start generation worker: {0}")]
    Worker(#[source] std::io::Error),
}

/// Result type for engine operations.
pub type WorldResult<T> = Result<T, WorldError>;
