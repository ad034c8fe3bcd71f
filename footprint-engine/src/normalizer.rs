//! Evidence Normalizer
//!
//! Turns raw, source-specific findings into evidence records.
//! - Resolves missing confidence/timestamps with documented defaults
//! - Writes key defaults into the payload so identity keys stay source-independent
//! - Rejects unknown categories and face matches without a similarity

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use footprint_core::{
    confidence_in_range, parse_timestamp, sanitize_confidence, Category, CategoryGroup, Evidence,
    RawFinding, Subject, SubjectKind,
};

use crate::{EngineConfig, NormalizationError};

/// A finding skipped during batch normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedFinding {
    /// Position in the input batch
    pub index: usize,
    pub category: String,
    pub source: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: NormalizationError,
}

fn serialize_display<S: Serializer>(error: &NormalizationError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Result of normalizing a batch
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub evidence: Vec<Evidence>,
    pub rejected: Vec<RejectedFinding>,
    /// Findings whose supplied confidence had to be clamped into [0, 1]
    pub clamped: usize,
}

/// Normalizer bound to one subject and one creation time
pub struct Normalizer<'a> {
    config: &'a EngineConfig,
    subject: &'a Subject,
    now: DateTime<Utc>,
}

impl<'a> Normalizer<'a> {
    pub fn new(config: &'a EngineConfig, subject: &'a Subject) -> Self {
        Self {
            config,
            subject,
            now: Utc::now(),
        }
    }

    /// Use a fixed evidence-creation time
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Normalize one finding; `sequence` keeps ids unique within the run
    pub fn normalize(&self, raw: &RawFinding, sequence: usize) -> Result<Evidence, NormalizationError> {
        let category: Category = raw
            .category
            .parse()
            .map_err(|_| NormalizationError::UnknownCategory(raw.category.clone()))?;

        if !self.config.category_enabled(category) {
            return Err(NormalizationError::DisabledCategory(category));
        }

        let mut payload = raw.payload.clone();
        let source = raw.source.trim();
        self.apply_payload_defaults(category, source, &mut payload);

        let similarity = if category == Category::FaceMatch {
            Some(face_similarity(&payload)?)
        } else {
            None
        };

        let confidence = match raw.confidence {
            Some(supplied) => {
                if !confidence_in_range(supplied) {
                    warn!(
                        "Clamping out-of-range confidence {} on {} finding from {}",
                        supplied, category, source
                    );
                }
                sanitize_confidence(supplied)
            }
            None => self.default_confidence(category, similarity),
        };

        let observed_at = match raw.observed_at.as_deref() {
            Some(value) => parse_timestamp(value).unwrap_or_else(|| {
                warn!(
                    "Unparseable observed_at {:?} on {} finding from {}, using creation time",
                    value, category, source
                );
                self.now
            }),
            None => self.now,
        };

        let evidence = Evidence::builder(category, source)
            .confidence(confidence)
            .observed_at(observed_at)
            .payload(payload)
            .subject(&self.subject.identifier)
            .sequence(sequence)
            .build();

        debug!("Normalized {} -> {}", evidence.id, evidence.identity_key);
        Ok(evidence)
    }

    /// Normalize every finding, collecting failures instead of aborting
    pub fn normalize_batch(&self, findings: &[RawFinding]) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();

        for (index, raw) in findings.iter().enumerate() {
            match self.normalize(raw, index) {
                Ok(evidence) => {
                    if raw.confidence.is_some_and(|c| !confidence_in_range(c)) {
                        batch.clamped += 1;
                    }
                    batch.evidence.push(evidence);
                }
                Err(error) => {
                    warn!("Skipping finding #{} from {}: {}", index, raw.source, error);
                    batch.rejected.push(RejectedFinding {
                        index,
                        category: raw.category.clone(),
                        source: raw.source.clone(),
                        error,
                    });
                }
            }
        }

        batch
    }

    fn default_confidence(&self, category: Category, similarity: Option<f64>) -> f64 {
        match category.group() {
            CategoryGroup::Breach => self.config.confidence.breach,
            CategoryGroup::Domain => self.config.confidence.domain,
            CategoryGroup::Presence => self.config.confidence.presence,
            CategoryGroup::Face => sanitize_confidence(similarity.unwrap_or_default()),
        }
    }

    fn apply_payload_defaults(&self, category: Category, source: &str, payload: &mut Map<String, Value>) {
        match category.group() {
            CategoryGroup::Breach => {
                let named = ["breach_name", "source_breach_name", "name"]
                    .iter()
                    .any(|key| has_text(payload, key));
                if !named && !source.is_empty() {
                    payload.insert("breach_name".to_string(), Value::from(source));
                }
            }
            CategoryGroup::Presence => {
                if !has_text(payload, "platform") && !source.is_empty() {
                    payload.insert("platform".to_string(), Value::from(source));
                }
            }
            CategoryGroup::Domain => {
                if !has_text(payload, "domain") && self.subject.kind == SubjectKind::Domain {
                    payload.insert("domain".to_string(), Value::from(self.subject.identifier.as_str()));
                }
            }
            CategoryGroup::Face => {}
        }
    }
}

fn has_text(payload: &Map<String, Value>, key: &str) -> bool {
    payload
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|value| !value.trim().is_empty())
}

fn face_similarity(payload: &Map<String, Value>) -> Result<f64, NormalizationError> {
    let value = payload
        .get("similarity")
        .or_else(|| payload.get("similarity_score"))
        .ok_or(NormalizationError::MissingField {
            category: Category::FaceMatch,
            field: "similarity",
        })?;

    let similarity = value.as_f64().ok_or_else(|| NormalizationError::InvalidField {
        category: Category::FaceMatch,
        field: "similarity",
        reason: format!("expected a number, got {}", value),
    })?;

    if !confidence_in_range(similarity) {
        warn!("Face similarity {} outside [0, 1], clamping", similarity);
    }
    Ok(sanitize_confidence(similarity))
}
