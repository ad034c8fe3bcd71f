//! Result Ranker
//!
//! Orders evidence for presentation: highest confidence first, then most
//! recent, then original insertion order. Nothing is dropped.

use std::cmp::Ordering;

use footprint_core::Evidence;

/// Rank evidence; the sort is stable so exact ties keep insertion order
pub fn rank(mut evidence: Vec<Evidence>) -> Vec<Evidence> {
    evidence.sort_by(compare);
    evidence
}

fn compare(a: &Evidence, b: &Evidence) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.observed_at.cmp(&a.observed_at))
}
