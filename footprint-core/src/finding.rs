//! Raw findings
//!
//! The unvalidated shape sources hand to the engine. Category stays a
//! string here so unknown categories can be reported rather than lost
//! during deserialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A finding as reported by an upstream source.
///
/// The aliases accept the field names used by the legacy lookup services
/// (`type`, `content`, `confidence_score`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFinding {
    #[serde(alias = "type")]
    pub category: String,
    pub source: String,
    #[serde(default, alias = "content")]
    pub payload: Map<String, Value>,
    #[serde(default, alias = "confidence_score")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub observed_at: Option<String>,
}

impl RawFinding {
    pub fn new(category: &str, source: &str) -> Self {
        Self {
            category: category.to_string(),
            source: source.to_string(),
            payload: Map::new(),
            confidence: None,
            observed_at: None,
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn observed_at(mut self, observed_at: &str) -> Self {
        self.observed_at = Some(observed_at.to_string());
        self
    }
}
