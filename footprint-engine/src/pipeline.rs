//! Composed scoring pipeline
//!
//! Normalizer -> Merger -> Scoring Engine -> Recommendation Generator -> Ranker.
//! A run holds no state beyond its inputs; engines can be shared freely
//! across threads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use footprint_core::{Category, Evidence, RecommendationSet, ScoreResult, Subject};

use crate::{
    merge, rank, recommend, score_at, EngineConfig, EngineError, Normalizer, RawFinding,
    RejectedFinding,
};

/// Counts describing how a run treated its input
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub findings_received: usize,
    pub findings_rejected: usize,
    pub duplicates_merged: usize,
    /// Supplied confidences that had to be clamped into [0, 1]
    pub confidence_clamped: usize,
    /// Distinct facts per category, after merging
    pub by_category: BTreeMap<Category, usize>,
}

/// Output of one scoring run
#[derive(Debug, Clone, Serialize)]
pub struct FootprintReport {
    pub run_id: Uuid,
    pub subject: Subject,
    pub generated_at: DateTime<Utc>,
    /// Merged evidence in ranked order
    pub evidence: Vec<Evidence>,
    pub score: ScoreResult,
    pub recommendations: RecommendationSet,
    /// Findings skipped by the normalizer, with their errors
    pub rejected: Vec<RejectedFinding>,
    pub summary: ReportSummary,
}

impl FootprintReport {
    /// Ranked evidence at or above a confidence threshold
    pub fn above_confidence(&self, threshold: f64) -> impl Iterator<Item = &Evidence> {
        self.evidence.iter().filter(move |e| e.confidence >= threshold)
    }

    /// Drop evidence below a confidence threshold, keeping rank order.
    ///
    /// Scores are not recomputed; they still describe the full evidence set.
    pub fn retain_confident(mut self, threshold: f64) -> Self {
        self.evidence.retain(|e| e.confidence >= threshold);
        self
    }
}

/// The aggregation and scoring engine
#[derive(Debug, Clone)]
pub struct FootprintEngine {
    config: EngineConfig,
}

impl FootprintEngine {
    /// Create an engine, rejecting configurations a run cannot honor
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Score findings about a subject as of now
    pub fn score_subject(&self, subject: &Subject, findings: &[RawFinding]) -> FootprintReport {
        self.score_subject_at(subject, findings, Utc::now())
    }

    /// Score findings with a fixed reference time (evidence creation and domain age)
    pub fn score_subject_at(
        &self,
        subject: &Subject,
        findings: &[RawFinding],
        now: DateTime<Utc>,
    ) -> FootprintReport {
        info!("Scoring {} findings for {}", findings.len(), subject);

        let batch = Normalizer::new(&self.config, subject)
            .at(now)
            .normalize_batch(findings);
        let normalized_count = batch.evidence.len();

        let merged = merge(&batch.evidence);
        let score = score_at(&merged, &self.config, now);
        let recommendations = recommend(&score, &merged, &self.config);

        let mut by_category = BTreeMap::new();
        for item in &merged {
            *by_category.entry(item.category).or_insert(0) += 1;
        }

        let summary = ReportSummary {
            findings_received: findings.len(),
            findings_rejected: batch.rejected.len(),
            duplicates_merged: normalized_count - merged.len(),
            confidence_clamped: batch.clamped,
            by_category,
        };

        let evidence = rank(merged);

        info!(
            "Subject {}: risk {:.2} ({}), privacy {:.2}, exposure {}, {} facts, {} rejected",
            subject,
            score.risk_score,
            score.risk_level.as_str(),
            score.privacy_score,
            score.exposure_level.as_str(),
            evidence.len(),
            summary.findings_rejected
        );

        FootprintReport {
            run_id: Uuid::new_v4(),
            subject: subject.clone(),
            generated_at: now,
            evidence,
            score,
            recommendations,
            rejected: batch.rejected,
            summary,
        }
    }
}

/// Single entry point with the default configuration
pub fn score_subject(identifier: &str, findings: &[RawFinding]) -> Result<FootprintReport, EngineError> {
    let subject = Subject::parse(identifier)?;
    let engine = FootprintEngine::new(EngineConfig::default())?;
    Ok(engine.score_subject(&subject, findings))
}
