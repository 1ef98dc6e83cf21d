//! Error types for chronofilter.
//!
//! Date, duration and frame-rate text coming from the state store is never an
//! error: it parses to a value or to `None` and the update is skipped. The
//! variants here cover faults outside those user-facing grammars.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChronoFilterError>;

#[derive(Debug, Error)]
pub enum ChronoFilterError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid style document: {0}")]
    InvalidStyle(String),

    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "toml")]
    #[error("TOML error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[cfg(feature = "toml")]
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
