//! Batch scoring of independent subjects

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use footprint_core::Subject;

use crate::{Investigation, InvestigationOutcome};

/// Investigate many subjects concurrently.
///
/// Results come back in input order regardless of completion order; one
/// failed subject does not affect the others.
pub async fn run_batch(
    investigation: &Investigation,
    subjects: &[Subject],
    max_concurrent: usize,
) -> Vec<Result<InvestigationOutcome, anyhow::Error>> {
    info!(
        "Scoring {} subjects with up to {} in flight",
        subjects.len(),
        max_concurrent.max(1)
    );

    let mut results: Vec<(usize, Result<InvestigationOutcome, anyhow::Error>)> =
        stream::iter(subjects.iter().enumerate())
            .map(|(index, subject)| async move {
                let result = investigation.run(subject).await;
                if let Err(e) = &result {
                    warn!("Subject {} failed: {}", subject, e);
                }
                (index, result)
            })
            .buffer_unordered(max_concurrent.max(1))
            .collect()
            .await;

    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use footprint_core::RawFinding;
    use footprint_engine::{EngineConfig, FootprintEngine};
    use footprint_sources::StaticSource;

    #[tokio::test]
    async fn test_results_in_input_order() {
        let investigation = Investigation::new(FootprintEngine::new(EngineConfig::default()).unwrap())
            .with_source(StaticSource::new(
                "shared",
                vec![RawFinding::new("email_breach", "hibp").field("breach_name", "Adobe")],
            ));

        let subjects: Vec<Subject> = ["alice@example.com", "bob@example.com", "carol", "example.org"]
            .iter()
            .map(|raw| Subject::parse(raw).unwrap())
            .collect();

        let results = run_batch(&investigation, &subjects, 3).await;
        assert_eq!(results.len(), 4);
        for (subject, result) in subjects.iter().zip(&results) {
            let outcome = result.as_ref().unwrap();
            assert_eq!(&outcome.report.subject, subject);
            assert_eq!(outcome.report.score.breach_count, 1);
        }

        let json = serde_json::to_value(&results[0].as_ref().unwrap().report).unwrap();
        assert_eq!(json["subject"]["identifier"], "alice@example.com");
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let investigation = Investigation::new(FootprintEngine::new(EngineConfig::default()).unwrap());
        assert!(run_batch(&investigation, &[], 0).await.is_empty());
    }
}
