//! Normalized evidence about a subject
//!
//! Evidence is one provenance-tagged fact discovered by a source:
//! - Has a category and a bounded confidence
//! - Carries the raw, category-specific payload for explainability
//! - Carries an identity key used to collapse duplicate reports

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::{
    derive_identity_key, DEFAULT_BREACH_CONFIDENCE, DEFAULT_DOMAIN_CONFIDENCE,
    DEFAULT_PRESENCE_CONFIDENCE, MAX_CONFIDENCE, MIN_CONFIDENCE,
};

/// Kinds of evidence the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    EmailBreach,
    DataBreach,
    DomainRegistration,
    OnlinePresence,
    FaceMatch,
    SocialProfile,
}

/// Coarse grouping of categories used for defaults and counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryGroup {
    Breach,
    Domain,
    Presence,
    Face,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown evidence category: {0}")]
pub struct CategoryParseError(pub String);

impl Category {
    pub const ALL: [Category; 6] = [
        Category::EmailBreach,
        Category::DataBreach,
        Category::DomainRegistration,
        Category::OnlinePresence,
        Category::FaceMatch,
        Category::SocialProfile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::EmailBreach => "email_breach",
            Category::DataBreach => "data_breach",
            Category::DomainRegistration => "domain_registration",
            Category::OnlinePresence => "online_presence",
            Category::FaceMatch => "face_match",
            Category::SocialProfile => "social_profile",
        }
    }

    pub fn group(&self) -> CategoryGroup {
        match self {
            Category::EmailBreach | Category::DataBreach => CategoryGroup::Breach,
            Category::DomainRegistration => CategoryGroup::Domain,
            Category::OnlinePresence | Category::SocialProfile => CategoryGroup::Presence,
            Category::FaceMatch => CategoryGroup::Face,
        }
    }

    /// Confidence assumed when a source reports none.
    ///
    /// Face matches have no default: their confidence is the similarity score.
    pub fn default_confidence(&self) -> Option<f64> {
        match self.group() {
            CategoryGroup::Breach => Some(DEFAULT_BREACH_CONFIDENCE),
            CategoryGroup::Domain => Some(DEFAULT_DOMAIN_CONFIDENCE),
            CategoryGroup::Presence => Some(DEFAULT_PRESENCE_CONFIDENCE),
            CategoryGroup::Face => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email_breach" => Ok(Category::EmailBreach),
            "data_breach" => Ok(Category::DataBreach),
            "domain_registration" => Ok(Category::DomainRegistration),
            "online_presence" => Ok(Category::OnlinePresence),
            "face_match" | "face_recognition" => Ok(Category::FaceMatch),
            "social_profile" => Ok(Category::SocialProfile),
            _ => Err(CategoryParseError(s.to_string())),
        }
    }
}

/// Clamp a confidence into `[0, 1]`; non-finite values collapse to the minimum
pub fn sanitize_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        MIN_CONFIDENCE
    } else {
        confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}

/// Whether a confidence already satisfies the `[0, 1]` invariant
pub fn confidence_in_range(confidence: f64) -> bool {
    (MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&confidence)
}

/// Parse the date formats sources are known to emit.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` and bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// One normalized fact about a subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Identifier, unique within a scoring run
    pub id: String,

    /// Evidence category
    pub category: Category,

    /// Origin label (e.g. "LinkedIn", "whois")
    pub source: String,

    /// Confidence (0.0 - 1.0)
    pub confidence: f64,

    /// When the fact was true or discovered
    pub observed_at: DateTime<Utc>,

    /// Category-specific attributes, preserved verbatim
    pub payload: Map<String, Value>,

    /// Key used to detect duplicates of the same real-world fact
    pub identity_key: String,

    /// Every source label that reported this fact
    #[serde(default)]
    pub provenance: Vec<String>,

    /// Ids of duplicates collapsed into this record
    #[serde(default)]
    pub merged_ids: Vec<String>,
}

impl Evidence {
    /// Create a new evidence builder
    pub fn builder(category: Category, source: &str) -> EvidenceBuilder {
        EvidenceBuilder::new(category, source)
    }

    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    pub fn payload_bool(&self, key: &str) -> Option<bool> {
        self.payload.get(key).and_then(Value::as_bool)
    }

    pub fn payload_f64(&self, key: &str) -> Option<f64> {
        self.payload.get(key).and_then(Value::as_f64)
    }

    /// Face similarity, accepting the `similarity_score` spelling as well
    pub fn similarity(&self) -> Option<f64> {
        payload_similarity(&self.payload)
    }

    pub fn platform(&self) -> Option<&str> {
        self.payload_str("platform")
    }

    pub fn username(&self) -> Option<&str> {
        self.payload_str("username")
    }

    /// First profile/record URL carried by the payload
    pub fn url(&self) -> Option<&str> {
        payload_url(&self.payload)
    }

    /// Domain creation date, if present and parseable
    pub fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.payload_str("creation_date").and_then(parse_timestamp)
    }
}

pub(crate) fn payload_similarity(payload: &Map<String, Value>) -> Option<f64> {
    payload
        .get("similarity")
        .or_else(|| payload.get("similarity_score"))
        .and_then(Value::as_f64)
}

pub(crate) fn payload_url(payload: &Map<String, Value>) -> Option<&str> {
    ["profile_url", "record_url", "article_url", "url"]
        .iter()
        .filter_map(|key| payload.get(*key).and_then(Value::as_str))
        .find(|url| !url.trim().is_empty())
}

/// Builder for evidence
pub struct EvidenceBuilder {
    category: Category,
    source: String,
    confidence: Option<f64>,
    observed_at: Option<DateTime<Utc>>,
    payload: Map<String, Value>,
    subject: String,
    identity_key: Option<String>,
    sequence: usize,
}

impl EvidenceBuilder {
    pub fn new(category: Category, source: &str) -> Self {
        Self {
            category,
            source: source.to_string(),
            confidence: None,
            observed_at: None,
            payload: Map::new(),
            subject: String::new(),
            identity_key: None,
            sequence: 0,
        }
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(sanitize_confidence(confidence));
        self
    }

    pub fn observed_at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = Some(observed_at);
        self
    }

    pub fn payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// Subject identifier, folded into breach identity keys
    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    /// Override the derived identity key
    pub fn identity_key(mut self, key: &str) -> Self {
        self.identity_key = Some(key.to_string());
        self
    }

    /// Position within the run, used to keep ids unique
    pub fn sequence(mut self, sequence: usize) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn build(self) -> Evidence {
        let identity_key = self.identity_key.unwrap_or_else(|| {
            derive_identity_key(self.category, &self.payload, &self.source, &self.subject)
        });

        let confidence = self
            .confidence
            .or_else(|| self.category.default_confidence())
            .or_else(|| payload_similarity(&self.payload).map(sanitize_confidence))
            .unwrap_or(MIN_CONFIDENCE);

        let id = compute_evidence_id(self.sequence, self.category, &identity_key, &self.source);

        Evidence {
            id,
            category: self.category,
            provenance: vec![self.source.clone()],
            source: self.source,
            confidence,
            observed_at: self.observed_at.unwrap_or_else(Utc::now),
            payload: self.payload,
            identity_key,
            merged_ids: Vec::new(),
        }
    }
}

fn compute_evidence_id(sequence: usize, category: Category, identity_key: &str, source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(category.as_str().as_bytes());
    hasher.update(identity_key.as_bytes());
    hasher.update(source.as_bytes());
    format!("ev-{}", &format!("{:x}", hasher.finalize())[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_category_parse_and_alias() {
        assert_eq!("email_breach".parse::<Category>(), Ok(Category::EmailBreach));
        assert_eq!("Face_Recognition".parse::<Category>(), Ok(Category::FaceMatch));
        assert_eq!(
            "carrier_pigeon".parse::<Category>(),
            Err(CategoryParseError("carrier_pigeon".to_string()))
        );
    }

    #[test]
    fn test_default_confidence_by_category() {
        let breach = Evidence::builder(Category::DataBreach, "Equifax").build();
        let domain = Evidence::builder(Category::DomainRegistration, "whois")
            .field("domain", "example.com")
            .build();
        let presence = Evidence::builder(Category::SocialProfile, "Twitter").build();
        let face = Evidence::builder(Category::FaceMatch, "Facebook")
            .field("similarity", 0.87)
            .build();

        assert_eq!(breach.confidence, 0.7);
        assert_eq!(domain.confidence, 0.9);
        assert_eq!(presence.confidence, 0.6);
        assert_eq!(face.confidence, 0.87);
    }

    #[test]
    fn test_builder_clamps_confidence() {
        let high = Evidence::builder(Category::EmailBreach, "Adobe").confidence(1.7).build();
        let nan = Evidence::builder(Category::EmailBreach, "Adobe").confidence(f64::NAN).build();
        assert_eq!(high.confidence, 1.0);
        assert_eq!(nan.confidence, 0.0);
    }

    #[test]
    fn test_ids_unique_per_sequence() {
        let a = Evidence::builder(Category::EmailBreach, "Adobe").sequence(0).build();
        let b = Evidence::builder(Category::EmailBreach, "Adobe").sequence(1).build();
        let a_again = Evidence::builder(Category::EmailBreach, "Adobe").sequence(0).build();
        assert_ne!(a.id, b.id);
        assert_eq!(a.id, a_again.id);
        assert!(a.id.starts_with("ev-"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2020, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2020-03-15"), Some(expected));
        assert_eq!(parse_timestamp("2020-03-15T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2020-03-15T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("last tuesday"), None);
    }

    #[test]
    fn test_payload_accessors() {
        let evidence = Evidence::builder(Category::FaceMatch, "News")
            .field("similarity_score", 0.8)
            .field("article_url", "https://news.example.com/a/1")
            .field("verified", true)
            .build();

        assert_eq!(evidence.similarity(), Some(0.8));
        assert_eq!(evidence.url(), Some("https://news.example.com/a/1"));
        assert_eq!(evidence.payload_bool("verified"), Some(true));
        assert_eq!(evidence.provenance, vec!["News".to_string()]);
    }
}
