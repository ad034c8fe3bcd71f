//! Footprint Core - Evidence model for digital footprint scoring
//!
//! This crate provides the foundational primitives:
//! - Raw findings as reported by upstream sources
//! - Evidence categories and normalized evidence records
//! - Identity keys used to detect duplicate findings
//! - Subject parsing (email, domain, username)
//! - Score and recommendation output types

pub mod evidence;
pub mod finding;
pub mod identity;
pub mod subject;
pub mod score;

pub use evidence::*;
pub use finding::*;
pub use identity::*;
pub use subject::*;
pub use score::*;

/// Default confidence for breach evidence when the source supplies none
pub const DEFAULT_BREACH_CONFIDENCE: f64 = 0.7;

/// Default confidence for domain registrations
pub const DEFAULT_DOMAIN_CONFIDENCE: f64 = 0.9;

/// Default confidence for online presence and social profiles
pub const DEFAULT_PRESENCE_CONFIDENCE: f64 = 0.6;

/// Minimum confidence
pub const MIN_CONFIDENCE: f64 = 0.0;

/// Maximum confidence
pub const MAX_CONFIDENCE: f64 = 1.0;

/// Payload field holding colliding values recorded during a merge
pub const MERGED_ALTERNATIVES_FIELD: &str = "merged_alternatives";
