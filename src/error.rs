//! Error types for geotrie.

use thiserror::Error;

/// Error type for geotrie operations.
///
/// Only the boundary (parsing, configuration, file I/O) produces errors.
/// The tree itself never fails on well-formed input.
#[derive(Error, Debug)]
pub enum Error {
    /// Prefix length outside `0..=32`
    #[error("invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    /// Invalid CIDR notation
    #[error("invalid CIDR pattern: {0}")]
    InvalidCidr(String),

    /// Invalid or non-IPv4 address
    #[error("invalid IP address: {0}")]
    InvalidIpAddress(String),

    /// Unparseable line in a source file
    #[error("invalid entry at line {line}: {content}")]
    InvalidLine { line: usize, content: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for geotrie operations.
pub type Result<T> = std::result::Result<T, Error>;
