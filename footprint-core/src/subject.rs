//! The person or asset under investigation

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize_domain;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
});

static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}$").unwrap()
});

/// What kind of identifier the caller supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Email,
    Domain,
    Username,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubjectError {
    #[error("subject identifier is empty")]
    Empty,
}

/// A parsed subject identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub identifier: String,
    pub kind: SubjectKind,
}

impl Subject {
    /// Classify and normalize a raw identifier.
    ///
    /// Emails and domains are lowercased; anything else is kept as a
    /// trimmed username/name.
    pub fn parse(raw: &str) -> Result<Self, SubjectError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SubjectError::Empty);
        }

        if EMAIL_REGEX.is_match(trimmed) {
            return Ok(Self {
                identifier: trimmed.to_lowercase(),
                kind: SubjectKind::Email,
            });
        }

        let domain = normalize_domain(trimmed);
        if DOMAIN_REGEX.is_match(&domain) {
            return Ok(Self {
                identifier: domain,
                kind: SubjectKind::Domain,
            });
        }

        Ok(Self {
            identifier: trimmed.to_string(),
            kind: SubjectKind::Username,
        })
    }

    /// Domain part of an email subject, or the domain itself
    pub fn domain(&self) -> Option<&str> {
        match self.kind {
            SubjectKind::Domain => Some(&self.identifier),
            SubjectKind::Email => self.identifier.split_once('@').map(|(_, domain)| domain),
            SubjectKind::Username => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}
