use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Main application error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum ShapeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system traversal error: {path} - {reason}")]
    FileSystemTraversal { path: PathBuf, reason: String },

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },

    #[error("Run aborted after failure in {file}: {reason}")]
    Aborted { file: PathBuf, reason: String },
}

/// Errors raised while turning one XML byte stream into a [`crate::dom::Document`]
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("XML error at byte {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Structural error at byte {position}: {details}")]
    Structural { position: usize, details: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// True for nesting errors detected by the tree builder rather than the reader
    pub fn is_structural(&self) -> bool {
        matches!(self, ParseError::Structural { .. })
    }
}

impl From<ConfigError> for ShapeError {
    fn from(err: ConfigError) -> Self {
        ShapeError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ShapeError>;

/// Parser result type alias
pub type ParseResult<T> = std::result::Result<T, ParseError>;
