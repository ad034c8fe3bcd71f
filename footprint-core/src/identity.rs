//! Identity keys for duplicate detection
//!
//! Two pieces of evidence describe the same real-world fact when their
//! identity keys are equal. Keys are always prefixed with the category, so
//! a breach can never collide with a profile.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::evidence::{payload_similarity, payload_url};
use crate::Category;

/// Width of the similarity buckets used for face matches without a URL
pub const FACE_SIMILARITY_BUCKET: f64 = 0.01;

/// Derive the identity key for a payload of the given category.
///
/// `source` only participates for face matches that carry no URL, where the
/// key falls back to source + rounded similarity.
pub fn derive_identity_key(
    category: Category,
    payload: &Map<String, Value>,
    source: &str,
    subject: &str,
) -> String {
    let prefix = category.as_str();

    let key = match category {
        Category::EmailBreach | Category::DataBreach => breach_name(payload)
            .map(|name| format!("{}:{}:{}", prefix, name.trim().to_lowercase(), subject.trim().to_lowercase())),
        Category::DomainRegistration => text(payload, "domain")
            .map(normalize_domain)
            .filter(|domain| !domain.is_empty())
            .map(|domain| format!("{}:{}", prefix, domain)),
        Category::OnlinePresence | Category::SocialProfile => {
            let platform = text(payload, "platform").map(normalize_platform).unwrap_or_default();
            text(payload, "username")
                .map(normalize_username)
                .filter(|username| !username.is_empty())
                .or_else(|| payload_url(payload).map(normalize_url))
                .map(|handle| format!("{}:{}:{}", prefix, platform, handle))
        }
        Category::FaceMatch => {
            let label = text(payload, "platform")
                .or_else(|| text(payload, "record_type"))
                .map(normalize_platform)
                .unwrap_or_default();
            match payload_url(payload) {
                Some(url) => Some(format!("{}:{}:{}", prefix, label, normalize_url(url))),
                None => payload_similarity(payload).map(|similarity| {
                    format!(
                        "{}:{}:{}:~{}",
                        prefix,
                        label,
                        source.trim().to_lowercase(),
                        similarity_bucket(similarity)
                    )
                }),
            }
        }
    };

    key.unwrap_or_else(|| format!("{}:#{}", prefix, payload_fingerprint(payload)))
}

fn breach_name(payload: &Map<String, Value>) -> Option<&str> {
    ["breach_name", "source_breach_name", "name"]
        .iter()
        .find_map(|key| text(payload, key))
}

fn text<'a>(payload: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

/// Bucket index of a similarity score
pub fn similarity_bucket(similarity: f64) -> i64 {
    (similarity.clamp(0.0, 1.0) / FACE_SIMILARITY_BUCKET).round() as i64
}

/// Lowercase a domain and strip any scheme, path, query or fragment
pub fn normalize_domain(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    let without_scheme = strip_scheme(&lowered);
    without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('.')
        .to_string()
}

/// Lowercase a platform label and drop whitespace ("Stack Overflow" -> "stackoverflow")
pub fn normalize_platform(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Lowercase a handle and drop the decorations platforms put in front of it
pub fn normalize_username(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    lowered
        .strip_prefix('@')
        .or_else(|| lowered.strip_prefix("u/"))
        .unwrap_or(&lowered)
        .to_string()
}

/// Lowercase a URL, strip the scheme and any trailing slash
pub fn normalize_url(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    strip_scheme(&lowered).trim_end_matches('/').to_string()
}

fn strip_scheme(value: &str) -> &str {
    value
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(value)
}

/// Stable short hash of a payload (keys are serialized in sorted order)
pub fn payload_fingerprint(payload: &Map<String, Value>) -> String {
    let mut hasher = Sha256::new();
    let canonical = serde_json::to_string(payload).unwrap_or_default();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}
