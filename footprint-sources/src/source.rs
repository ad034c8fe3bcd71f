//! Common interface for finding sources

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use footprint_core::{RawFinding, Subject};

/// Errors from source lookups
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can report raw findings about a subject
#[async_trait]
pub trait FindingSource: Send + Sync {
    /// Source name, used for logging and failure reports
    fn name(&self) -> &str;

    /// Look up findings for a subject
    async fn lookup(&self, subject: &Subject) -> Result<Vec<RawFinding>, SourceError>;
}

/// Sources are shared between concurrent investigations
pub type SharedSource = Arc<dyn FindingSource>;
