//! Deduplicator / Merger
//!
//! Collapses evidence that refers to the same real-world fact:
//! - Groups by identity key, in first-seen order
//! - Keeps the highest-confidence member (then most recent, then first seen)
//! - Unions payloads, recording colliding values under `merged_alternatives`
//! - Unions provenance so every reporting source stays visible

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use footprint_core::{confidence_in_range, sanitize_confidence, Evidence, MERGED_ALTERNATIVES_FIELD};

/// Merge duplicate evidence.
///
/// Groups are emitted in the order their first member was seen; callers
/// should still rank the result rather than rely on this order.
pub fn merge(evidence: &[Evidence]) -> Vec<Evidence> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Evidence>> = HashMap::new();

    for item in evidence {
        let key = item.identity_key.as_str();
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(item);
    }

    let merged: Vec<Evidence> = order
        .into_iter()
        .filter_map(|key| groups.remove(key))
        .map(|members| merge_group(&members))
        .collect();

    debug!(
        "Merged {} evidence items into {} distinct facts",
        evidence.len(),
        merged.len()
    );
    merged
}

fn checked_confidence(item: &Evidence) -> f64 {
    if !confidence_in_range(item.confidence) {
        warn!(
            "Evidence {} has confidence {} outside [0, 1], clamping",
            item.id, item.confidence
        );
    }
    sanitize_confidence(item.confidence)
}

fn merge_group(members: &[&Evidence]) -> Evidence {
    let confidences: Vec<f64> = members.iter().map(|m| checked_confidence(m)).collect();

    let mut best = 0;
    for idx in 1..members.len() {
        let better_confidence = confidences[idx] > confidences[best];
        let more_recent = confidences[idx] == confidences[best]
            && members[idx].observed_at > members[best].observed_at;
        if better_confidence || more_recent {
            best = idx;
        }
    }

    let mut merged = members[best].clone();
    merged.confidence = confidences[best];
    if members.len() == 1 {
        return merged;
    }

    let mut alternatives = match merged.payload.remove(MERGED_ALTERNATIVES_FIELD) {
        Some(Value::Object(existing)) => existing,
        _ => Map::new(),
    };

    for (idx, member) in members.iter().enumerate() {
        if idx == best {
            continue;
        }

        for (key, value) in &member.payload {
            if key == MERGED_ALTERNATIVES_FIELD {
                fold_alternatives(&merged.payload, &mut alternatives, value);
                continue;
            }
            match merged.payload.get(key) {
                None => {
                    merged.payload.insert(key.clone(), value.clone());
                }
                Some(kept) if kept != value => record_alternative(&mut alternatives, key, value),
                Some(_) => {}
            }
        }

        for source in &member.provenance {
            if !merged.provenance.contains(source) {
                merged.provenance.push(source.clone());
            }
        }

        for id in std::iter::once(&member.id).chain(member.merged_ids.iter()) {
            if !merged.merged_ids.contains(id) {
                merged.merged_ids.push(id.clone());
            }
        }
    }

    if !alternatives.is_empty() {
        merged
            .payload
            .insert(MERGED_ALTERNATIVES_FIELD.to_string(), Value::Object(alternatives));
    }

    debug!(
        "Collapsed {} duplicates of {} into {}",
        members.len() - 1,
        merged.identity_key,
        merged.id
    );
    merged
}

fn record_alternative(alternatives: &mut Map<String, Value>, key: &str, value: &Value) {
    let entry = alternatives
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(values) = entry {
        if !values.contains(value) {
            values.push(value.clone());
        }
    }
}

/// Carry a member's own recorded alternatives into the merged record
fn fold_alternatives(payload: &Map<String, Value>, alternatives: &mut Map<String, Value>, value: &Value) {
    let Value::Object(recorded) = value else {
        return;
    };
    for (key, values) in recorded {
        let candidates = match values {
            Value::Array(values) => values.as_slice(),
            other => std::slice::from_ref(other),
        };
        for candidate in candidates {
            if payload.get(key) != Some(candidate) {
                record_alternative(alternatives, key, candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use footprint_core::Category;

    fn domain(source: &str, confidence: f64, seq: usize) -> Evidence {
        Evidence::builder(Category::DomainRegistration, source)
            .field("domain", "example.com")
            .confidence(confidence)
            .observed_at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .sequence(seq)
            .build()
    }

    #[test]
    fn test_keeps_highest_confidence() {
        let merged = merge(&[domain("whois", 0.91, 0), domain("registrar", 0.95, 1)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].confidence, 0.95);
        assert_eq!(merged[0].source, "registrar");
        assert_eq!(merged[0].provenance, vec!["registrar", "whois"]);
    }

    #[test]
    fn test_tie_broken_by_recency_then_first_seen() {
        let older = domain("a", 0.9, 0);
        let mut newer = domain("b", 0.9, 1);
        newer.observed_at = older.observed_at + Duration::days(3);
        let merged = merge(&[older.clone(), newer.clone()]);
        assert_eq!(merged[0].source, "b");

        let twin = domain("c", 0.9, 2);
        let merged = merge(&[older.clone(), twin]);
        assert_eq!(merged[0].source, "a");
        assert_eq!(merged[0].id, older.id);
    }

    #[test]
    fn test_payload_union_and_alternatives() {
        let kept = Evidence::builder(Category::EmailBreach, "hibp")
            .field("breach_name", "Adobe")
            .field("severity", "high")
            .confidence(0.95)
            .subject("alice@example.com")
            .sequence(0)
            .build();
        let other = Evidence::builder(Category::EmailBreach, "dehashed")
            .field("breach_name", "adobe")
            .field("severity", "medium")
            .field("records_affected", 153_000_000)
            .confidence(0.8)
            .subject("alice@example.com")
            .sequence(1)
            .build();

        let merged = merge(&[other.clone(), kept]);
        assert_eq!(merged.len(), 1);
        let record = &merged[0];
        assert_eq!(record.payload_str("severity"), Some("high"));
        assert_eq!(record.payload_f64("records_affected"), Some(153_000_000.0));
        assert_eq!(
            record.payload[MERGED_ALTERNATIVES_FIELD]["severity"],
            serde_json::json!(["medium"])
        );
        assert_eq!(
            record.payload[MERGED_ALTERNATIVES_FIELD]["breach_name"],
            serde_json::json!(["adobe"])
        );
        assert_eq!(record.merged_ids, vec![other.id]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let face = |sim: f64, seq: usize| {
            Evidence::builder(Category::FaceMatch, "Facebook")
                .field("platform", "Facebook")
                .field("similarity", sim)
                .sequence(seq)
                .build()
        };
        let input = vec![
            domain("whois", 0.91, 0),
            face(0.851, 1),
            domain("registrar", 0.95, 2),
            face(0.853, 3),
            face(0.92, 4),
        ];

        let once = merge(&input);
        let twice = merge(&once);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn test_out_of_range_confidence_clamped() {
        let mut item = domain("whois", 0.5, 0);
        item.confidence = 1.8;
        let merged = merge(&[item]);
        assert_eq!(merged[0].confidence, 1.0);
    }

    #[test]
    fn test_distinct_facts_untouched() {
        let a = domain("whois", 0.9, 0);
        let b = Evidence::builder(Category::DomainRegistration, "whois")
            .field("domain", "example.org")
            .sequence(1)
            .build();
        let merged = merge(&[a.clone(), b.clone()]);
        assert_eq!(merged, vec![a, b]);
    }
}
