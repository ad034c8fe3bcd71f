//! Error taxonomy for the engine

use footprint_core::{Category, SubjectError};
use thiserror::Error;

/// A raw finding that could not be turned into evidence.
///
/// Never fatal to a run: batch normalization skips the record and reports it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("category {0} is disabled by configuration")]
    DisabledCategory(Category),

    #[error("{category} finding is missing mandatory field `{field}`")]
    MissingField {
        category: Category,
        field: &'static str,
    },

    #[error("{category} field `{field}` is invalid: {reason}")]
    InvalidField {
        category: Category,
        field: &'static str,
        reason: String,
    },
}

/// Errors loading configuration files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Errors that abort a run before any evidence is processed
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid subject: {0}")]
    Subject(#[from] SubjectError),
}
