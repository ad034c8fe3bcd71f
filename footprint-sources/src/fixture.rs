//! In-memory and file-backed sources
//!
//! Upstream lookup services are outside this crate; these sources replay
//! findings that were captured elsewhere.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use footprint_core::{RawFinding, Subject};

use crate::{FindingSource, SourceError};

/// Findings held in memory
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    findings: Vec<RawFinding>,
}

impl StaticSource {
    pub fn new(name: &str, findings: Vec<RawFinding>) -> Self {
        Self {
            name: name.to_string(),
            findings,
        }
    }

    pub fn with_finding(mut self, finding: RawFinding) -> Self {
        self.findings.push(finding);
        self
    }
}

#[async_trait]
impl FindingSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, _subject: &Subject) -> Result<Vec<RawFinding>, SourceError> {
        Ok(self.findings.clone())
    }
}

/// A captured investigation: the subject and what was found about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseFile {
    #[serde(default)]
    pub subject: Option<String>,
    pub findings: Vec<RawFinding>,
}

impl CaseFile {
    /// Parse either a bare array of findings or a `{subject, findings}` object.
    ///
    /// Objects must carry `findings` and nothing beyond `subject`, so a lone
    /// finding or a misspelled key is an error rather than an empty case.
    pub fn from_json(raw: &str) -> Result<Self, SourceError> {
        let case = match serde_json::from_str::<Value>(raw)? {
            Value::Array(items) => CaseFile {
                subject: None,
                findings: serde_json::from_value(Value::Array(items))?,
            },
            other => serde_json::from_value(other)?,
        };
        Ok(case)
    }

    pub async fn load(path: &Path) -> Result<Self, SourceError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_json(&raw)
    }

    /// Whether this file was captured for the given subject.
    ///
    /// Files without a subject match any subject.
    pub fn matches(&self, subject: &Subject) -> bool {
        match &self.subject {
            Some(recorded) => recorded.trim().eq_ignore_ascii_case(&subject.identifier),
            None => true,
        }
    }
}

/// Findings read from a JSON file on every lookup
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    name: String,
    path: PathBuf,
}

impl JsonFileSource {
    /// Source named after the file stem
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FindingSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, subject: &Subject) -> Result<Vec<RawFinding>, SourceError> {
        let case = CaseFile::load(&self.path).await?;

        if !case.matches(subject) {
            warn!(
                "{} was captured for {:?}, not {}; ignoring it",
                self.path.display(),
                case.subject,
                subject
            );
            return Ok(Vec::new());
        }

        debug!("{} supplied {} findings", self.name, case.findings.len());
        Ok(case.findings)
    }
}

/// Case files in a directory, one investigation per file.
///
/// A lookup returns the findings of every `*.json` case file recorded for
/// the subject. Files without a subject, and files that do not parse, are
/// skipped with a warning.
#[derive(Debug, Clone)]
pub struct CaseDirectorySource {
    name: String,
    dir: PathBuf,
}

impl CaseDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            name: "cases".to_string(),
            dir: dir.into(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Case file paths in name order
    pub async fn case_paths(&self) -> Result<Vec<PathBuf>, SourceError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Distinct subjects recorded in the directory, in file order
    pub async fn subjects(&self) -> Result<Vec<String>, SourceError> {
        let mut subjects: Vec<String> = Vec::new();
        for path in self.case_paths().await? {
            match CaseFile::load(&path).await {
                Ok(CaseFile {
                    subject: Some(subject),
                    ..
                }) => {
                    let subject = subject.trim().to_string();
                    if !subjects.iter().any(|s| s.eq_ignore_ascii_case(&subject)) {
                        subjects.push(subject);
                    }
                }
                Ok(_) => debug!("{} has no subject, skipping", path.display()),
                Err(e) => warn!("Skipping unreadable case file {}: {}", path.display(), e),
            }
        }
        Ok(subjects)
    }
}

#[async_trait]
impl FindingSource for CaseDirectorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, subject: &Subject) -> Result<Vec<RawFinding>, SourceError> {
        let mut findings = Vec::new();
        for path in self.case_paths().await? {
            let case = match CaseFile::load(&path).await {
                Ok(case) => case,
                Err(e) => {
                    warn!("Skipping unreadable case file {}: {}", path.display(), e);
                    continue;
                }
            };
            if case.subject.is_some() && case.matches(subject) {
                findings.extend(case.findings);
            }
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("footprint-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn subject() -> Subject {
        Subject::parse("alice@example.com").unwrap()
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticSource::new("fixture", Vec::new())
            .with_finding(RawFinding::new("email_breach", "Adobe"));
        let findings = source.lookup(&subject()).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(source.name(), "fixture");
    }

    #[test]
    fn test_case_file_shapes() {
        let list = CaseFile::from_json(r#"[{"type": "email_breach", "source": "Adobe"}]"#).unwrap();
        assert_eq!(list.subject, None);
        assert_eq!(list.findings.len(), 1);

        let case = CaseFile::from_json(
            r#"{"subject": "Alice@Example.com", "findings": [{"category": "data_breach", "source": "Equifax"}]}"#,
        )
        .unwrap();
        assert!(case.matches(&subject()));
        assert_eq!(case.findings[0].category, "data_breach");

        assert!(matches!(CaseFile::from_json("{not json"), Err(SourceError::Parse(_))));
    }

    #[tokio::test]
    async fn test_json_file_source() {
        let path = temp_file(r#"[{"category": "online_presence", "source": "GitHub", "payload": {"username": "alice"}}]"#);
        let source = JsonFileSource::new(&path);

        let findings = source.lookup(&subject()).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert!(source.name().starts_with("footprint-"));

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_json_file_source_other_subject() {
        let path = temp_file(r#"{"subject": "bob@example.com", "findings": [{"category": "data_breach", "source": "Equifax"}]}"#);
        let findings = JsonFileSource::new(&path).lookup(&subject()).await.unwrap();
        assert!(findings.is_empty());
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = JsonFileSource::new("/nonexistent/footprint/findings.json").with_name("missing");
        let err = source.lookup(&subject()).await.unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[tokio::test]
    async fn test_case_directory() {
        let dir = std::env::temp_dir().join(format!("footprint-cases-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("a.json"),
            r#"{"subject": "alice@example.com", "findings": [{"category": "email_breach", "source": "Adobe"}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("b.json"),
            r#"{"subject": "example.org", "findings": [{"category": "domain_registration", "source": "whois"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.join("c.json"), r#"[{"category": "data_breach", "source": "Equifax"}]"#).unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let source = CaseDirectorySource::new(&dir);
        assert_eq!(source.subjects().await.unwrap(), vec!["alice@example.com", "example.org"]);

        let findings = source.lookup(&subject()).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].source, "Adobe");

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_case_file_rejects_lost_input() {
        let lone_finding = CaseFile::from_json(
            r#"{"category": "email_breach", "source": "hibp", "payload": {"breach_name": "Adobe"}}"#,
        );
        assert!(matches!(lone_finding, Err(SourceError::Parse(_))));

        let misspelled = CaseFile::from_json(
            r#"{"subject": "alice@example.com", "finding": [{"category": "data_breach", "source": "Equifax"}]}"#,
        );
        assert!(matches!(misspelled, Err(SourceError::Parse(_))));

        assert!(matches!(CaseFile::from_json("{}"), Err(SourceError::Parse(_))));
        assert!(matches!(CaseFile::from_json("42"), Err(SourceError::Parse(_))));

        let no_subject = CaseFile::from_json(r#"{"findings": []}"#).unwrap();
        assert_eq!(no_subject.subject, None);
    }

    #[tokio::test]
    async fn test_case_directory_skips_corrupt_file() {
        let dir = std::env::temp_dir().join(format!("footprint-cases-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("a.json"),
            r#"{"subject": "alice@example.com", "findings": [
                {"category": "email_breach", "source": "hibp", "payload": {"breach_name": "Adobe"}},
                {"category": "data_breach", "source": "dehashed", "payload": {"breach_name": "Equifax"}}
            ]}"#,
        )
        .unwrap();
        std::fs::write(dir.join("z.json"), "{ truncated").unwrap();

        let source = CaseDirectorySource::new(&dir);
        assert_eq!(source.subjects().await.unwrap(), vec!["alice@example.com"]);

        let findings = source.lookup(&subject()).await.unwrap();
        assert_eq!(findings.len(), 2);

        std::fs::remove_dir_all(dir).unwrap();
    }
}
