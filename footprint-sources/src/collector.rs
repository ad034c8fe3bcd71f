//! Concurrent finding collection
//!
//! Queries every registered source for one subject, bounded by a
//! concurrency limit and a per-source timeout. A failing source is
//! reported, never fatal.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use footprint_core::{RawFinding, Subject};

use crate::{SharedSource, SourceError};

/// Collection limits
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Per-source lookup timeout
    pub timeout: Duration,
    /// Maximum concurrent lookups
    pub max_concurrent: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_concurrent: 4,
        }
    }
}

impl CollectorConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }
}

/// A source that produced nothing usable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// Findings gathered for one subject
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Union of all findings, in source-registration order
    pub findings: Vec<RawFinding>,
    pub failures: Vec<SourceFailure>,
}

/// Query all sources for a subject
pub async fn collect_findings(
    sources: &[SharedSource],
    subject: &Subject,
    config: &CollectorConfig,
) -> Collection {
    info!("Collecting findings for {} from {} sources", subject, sources.len());

    let timeout = config.timeout;
    let mut outcomes: Vec<(usize, String, Result<Vec<RawFinding>, SourceError>)> =
        stream::iter(sources.iter().cloned().enumerate())
            .map(|(index, source)| async move {
                let name = source.name().to_string();
                let outcome = match tokio::time::timeout(timeout, source.lookup(subject)).await {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::Timeout(timeout)),
                };
                (index, name, outcome)
            })
            .buffer_unordered(config.max_concurrent.max(1))
            .collect()
            .await;

    outcomes.sort_by_key(|(index, _, _)| *index);

    let mut collection = Collection::default();
    for (_, name, outcome) in outcomes {
        match outcome {
            Ok(findings) => {
                debug!("Source {} returned {} findings", name, findings.len());
                collection.findings.extend(findings);
            }
            Err(e) => {
                warn!("Source {} failed: {}", name, e);
                collection.failures.push(SourceFailure {
                    source: name,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Collected {} findings for {} ({} sources failed)",
        collection.findings.len(),
        subject,
        collection.failures.len()
    );
    collection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FindingSource, StaticSource};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct SlowSource {
        delay: Duration,
        findings: Vec<RawFinding>,
    }

    #[async_trait]
    impl FindingSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        async fn lookup(&self, _subject: &Subject) -> Result<Vec<RawFinding>, SourceError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.findings.clone())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl FindingSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        async fn lookup(&self, _subject: &Subject) -> Result<Vec<RawFinding>, SourceError> {
            Err(SourceError::Unavailable("rate limited".to_string()))
        }
    }

    fn subject() -> Subject {
        Subject::parse("alice@example.com").unwrap()
    }

    #[tokio::test]
    async fn test_registration_order_preserved() {
        let sources: Vec<SharedSource> = vec![
            Arc::new(SlowSource {
                delay: Duration::from_millis(50),
                findings: vec![RawFinding::new("email_breach", "first")],
            }),
            Arc::new(StaticSource::new("fast", vec![RawFinding::new("data_breach", "second")])),
        ];

        let collection = collect_findings(&sources, &subject(), &CollectorConfig::default()).await;
        let order: Vec<&str> = collection.findings.iter().map(|f| f.source.as_str()).collect();
        assert_eq!(order, vec!["first", "second"]);
        assert!(collection.failures.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let sources: Vec<SharedSource> = vec![
            Arc::new(BrokenSource),
            Arc::new(StaticSource::new("ok", vec![RawFinding::new("email_breach", "Adobe")])),
        ];

        let collection = collect_findings(&sources, &subject(), &CollectorConfig::default()).await;
        assert_eq!(collection.findings.len(), 1);
        assert_eq!(collection.failures.len(), 1);
        assert_eq!(collection.failures[0].source, "broken");
        assert!(collection.failures[0].error.contains("rate limited"));
    }

    #[tokio::test]
    async fn test_timeout_reported() {
        let sources: Vec<SharedSource> = vec![Arc::new(SlowSource {
            delay: Duration::from_secs(5),
            findings: vec![RawFinding::new("email_breach", "never")],
        })];
        let config = CollectorConfig::default().with_timeout(Duration::from_millis(20));

        let collection = collect_findings(&sources, &subject(), &config).await;
        assert!(collection.findings.is_empty());
        assert_eq!(collection.failures[0].source, "slow");
        assert_eq!(collection.failures[0].error, "Lookup timed out after 20ms");
    }

    #[tokio::test]
    async fn test_no_sources() {
        let collection = collect_findings(&[], &subject(), &CollectorConfig::default()).await;
        assert!(collection.findings.is_empty());
        assert!(collection.failures.is_empty());
    }
}
