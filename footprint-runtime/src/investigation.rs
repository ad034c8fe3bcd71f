//! Investigation runner
//!
//! Collects findings from every registered source, then scores them off the
//! async executor:
//! - Source lookups run concurrently under the collector's limits
//! - Scoring is CPU-bound and runs on the blocking pool
//! - Source failures travel with the report instead of aborting it

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use footprint_core::Subject;
use footprint_engine::{FootprintEngine, FootprintReport};
use footprint_sources::{collect_findings, CollectorConfig, FindingSource, SharedSource, SourceFailure};

/// Result of investigating one subject
#[derive(Debug, Clone)]
pub struct InvestigationOutcome {
    pub report: FootprintReport,
    pub source_failures: Vec<SourceFailure>,
}

impl InvestigationOutcome {
    /// True when at least one source could not be consulted
    pub fn is_partial(&self) -> bool {
        !self.source_failures.is_empty()
    }
}

/// A scoring engine wired to its sources
#[derive(Clone)]
pub struct Investigation {
    engine: Arc<FootprintEngine>,
    sources: Vec<SharedSource>,
    collector: CollectorConfig,
    reference_time: Option<DateTime<Utc>>,
}

impl Investigation {
    pub fn new(engine: FootprintEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            sources: Vec::new(),
            collector: CollectorConfig::default(),
            reference_time: None,
        }
    }

    /// Register a source; findings are unioned in registration order
    pub fn with_source(mut self, source: impl FindingSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    pub fn with_shared_source(mut self, source: SharedSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_collector(mut self, collector: CollectorConfig) -> Self {
        self.collector = collector;
        self
    }

    /// Score as of a fixed time instead of now
    pub fn with_reference_time(mut self, at: DateTime<Utc>) -> Self {
        self.reference_time = Some(at);
        self
    }

    pub fn engine(&self) -> &FootprintEngine {
        &self.engine
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Investigate one subject
    pub async fn run(&self, subject: &Subject) -> Result<InvestigationOutcome, anyhow::Error> {
        let collection = collect_findings(&self.sources, subject, &self.collector).await;

        let engine = Arc::clone(&self.engine);
        let owned_subject = subject.clone();
        let at = self.reference_time.unwrap_or_else(Utc::now);
        let findings = collection.findings;

        let report = tokio::task::spawn_blocking(move || {
            engine.score_subject_at(&owned_subject, &findings, at)
        })
        .await?;

        info!(
            "Investigation {} for {} finished: risk {}, exposure {}",
            report.run_id,
            subject,
            report.score.risk_level.as_str(),
            report.score.exposure_level.as_str()
        );

        Ok(InvestigationOutcome {
            report,
            source_failures: collection.failures,
        })
    }
}
