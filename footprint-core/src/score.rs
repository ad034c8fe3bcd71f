//! Scoring and recommendation outputs

use serde::{Deserialize, Serialize};

use crate::Category;

/// Categorical level derived from a score or from counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    /// Map a score onto a level; both thresholds are inclusive lower bounds
    pub fn from_score(score: f64, medium_at: f64, high_at: f64) -> Self {
        if score >= high_at {
            Level::High
        } else if score >= medium_at {
            Level::Medium
        } else {
            Level::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

/// One evidence item's effect on the risk score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub category: Category,
    pub description: String,
    /// Signed contribution actually applied (after caps)
    pub magnitude: f64,
}

/// Bounded risk and privacy scores for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Risk (0.0 - 1.0), higher is worse
    pub risk_score: f64,
    pub risk_level: Level,
    /// Privacy (0.0 - 1.0), higher is safer
    pub privacy_score: f64,
    /// Count-based exposure, independent of `privacy_score`
    pub exposure_level: Level,
    /// Non-zero risk contributions in processing order
    pub contributing_factors: Vec<ContributingFactor>,
    /// Breach evidence counted for exposure
    pub breach_count: usize,
    /// Presence evidence counted for exposure
    pub presence_count: usize,
}

/// Recommendation urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// An actionable recommendation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,
    pub priority: Priority,
}

/// Ordered recommendations, unique by text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationSet {
    items: Vec<Recommendation>,
}

impl RecommendationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unless a recommendation with the same text is already present.
    /// Returns whether it was added.
    pub fn push(&mut self, text: &str, priority: Priority) -> bool {
        if self.contains(text) {
            return false;
        }
        self.items.push(Recommendation {
            text: text.to_string(),
            priority,
        });
        true
    }

    pub fn contains(&self, text: &str) -> bool {
        self.items.iter().any(|r| r.text == text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Recommendations at or above a priority, keeping order
    pub fn at_least(&self, priority: Priority) -> Vec<&Recommendation> {
        self.items.iter().filter(|r| r.priority >= priority).collect()
    }
}

impl IntoIterator for RecommendationSet {
    type Item = Recommendation;
    type IntoIter = std::vec::IntoIter<Recommendation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
