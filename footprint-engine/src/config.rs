//! Engine configuration
//!
//! Every weight, cap and threshold used by scoring lives here. All fields
//! are defaulted, so a TOML file only needs to name what it overrides.

use std::path::Path;

use footprint_core::{
    Category, DEFAULT_BREACH_CONFIDENCE, DEFAULT_DOMAIN_CONFIDENCE, DEFAULT_PRESENCE_CONFIDENCE,
};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, EngineError};

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Categories accepted by the normalizer
    pub categories: Vec<Category>,
    /// Platforms counted as professional presence
    pub professional_platforms: Vec<String>,
    pub confidence: ConfidenceDefaults,
    pub risk: RiskWeights,
    pub privacy: PrivacyWeights,
    pub levels: LevelThresholds,
    pub advice: AdviceThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            professional_platforms: vec![
                "github".to_string(),
                "stackoverflow".to_string(),
                "linkedin".to_string(),
            ],
            confidence: ConfidenceDefaults::default(),
            risk: RiskWeights::default(),
            privacy: PrivacyWeights::default(),
            levels: LevelThresholds::default(),
            advice: AdviceThresholds::default(),
        }
    }
}

/// Confidence assumed when a source supplies none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceDefaults {
    pub breach: f64,
    pub domain: f64,
    pub presence: f64,
}

impl Default for ConfidenceDefaults {
    fn default() -> Self {
        Self {
            breach: DEFAULT_BREACH_CONFIDENCE,
            domain: DEFAULT_DOMAIN_CONFIDENCE,
            presence: DEFAULT_PRESENCE_CONFIDENCE,
        }
    }
}

/// Per-item risk contributions and per-category caps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub email_breach: f64,
    pub email_breach_cap: f64,
    pub data_breach: f64,
    pub data_breach_cap: f64,
    /// Added for domains younger than `young_domain_days`
    pub young_domain: f64,
    pub young_domain_days: i64,
    /// Added (usually negative) for domains older than `aged_domain_days`
    pub aged_domain: f64,
    pub aged_domain_days: i64,
    pub professional_presence: f64,
    pub professional_presence_cap: f64,
    pub insecure_site: f64,
    pub secure_site: f64,
    /// Multiplied by the face similarity
    pub face_match_factor: f64,
    pub face_match_cap: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            email_breach: 0.20,
            email_breach_cap: 0.6,
            data_breach: 0.30,
            data_breach_cap: 0.6,
            young_domain: 0.20,
            young_domain_days: 365,
            aged_domain: -0.10,
            aged_domain_days: 3650,
            professional_presence: 0.10,
            professional_presence_cap: 0.3,
            insecure_site: 0.20,
            secure_site: -0.10,
            face_match_factor: 0.15,
            face_match_cap: 0.3,
        }
    }
}

/// Amounts subtracted from a perfect privacy score, per item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyWeights {
    pub email_breach: f64,
    pub data_breach: f64,
    pub professional_presence: f64,
    pub website: f64,
}

impl Default for PrivacyWeights {
    fn default() -> Self {
        Self {
            email_breach: 0.15,
            data_breach: 0.25,
            professional_presence: 0.05,
            website: 0.10,
        }
    }
}

/// Level boundaries (inclusive lower bounds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelThresholds {
    pub risk_medium: f64,
    pub risk_high: f64,
    pub exposure_breach_medium: usize,
    pub exposure_breach_high: usize,
    pub exposure_presence_medium: usize,
    pub exposure_presence_high: usize,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            risk_medium: 0.4,
            risk_high: 0.7,
            exposure_breach_medium: 1,
            exposure_breach_high: 3,
            exposure_presence_medium: 2,
            exposure_presence_high: 5,
        }
    }
}

/// Score thresholds that trigger general advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceThresholds {
    /// VPN and credit monitoring when risk is strictly above this
    pub vpn_risk_above: f64,
    /// Footprint minimization when privacy is strictly below this
    pub minimize_privacy_below: f64,
}

impl Default for AdviceThresholds {
    fn default() -> Self {
        Self {
            vpn_risk_above: 0.5,
            minimize_privacy_below: 0.5,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load a TOML file from disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn with_categories(mut self, categories: &[Category]) -> Self {
        self.categories = categories.to_vec();
        self
    }

    pub fn category_enabled(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    /// Check the preconditions a run depends on
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.categories.is_empty() {
            return Err(EngineError::InvalidConfig(
                "category taxonomy is empty".to_string(),
            ));
        }

        let defaults = [
            ("confidence.breach", self.confidence.breach),
            ("confidence.domain", self.confidence.domain),
            ("confidence.presence", self.confidence.presence),
        ];
        for (name, value) in defaults {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        let r = &self.risk;
        let weights = [
            r.email_breach,
            r.email_breach_cap,
            r.data_breach,
            r.data_breach_cap,
            r.young_domain,
            r.aged_domain,
            r.professional_presence,
            r.professional_presence_cap,
            r.insecure_site,
            r.secure_site,
            r.face_match_factor,
            r.face_match_cap,
            self.privacy.email_breach,
            self.privacy.data_breach,
            self.privacy.professional_presence,
            self.privacy.website,
        ];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(EngineError::InvalidConfig(
                "weights must be finite numbers".to_string(),
            ));
        }
        if [r.email_breach_cap, r.data_breach_cap, r.professional_presence_cap, r.face_match_cap]
            .iter()
            .any(|cap| *cap < 0.0)
        {
            return Err(EngineError::InvalidConfig(
                "category caps must not be negative".to_string(),
            ));
        }
        if r.young_domain_days > r.aged_domain_days {
            return Err(EngineError::InvalidConfig(format!(
                "young_domain_days ({}) exceeds aged_domain_days ({})",
                r.young_domain_days, r.aged_domain_days
            )));
        }

        let l = &self.levels;
        if !(0.0..=1.0).contains(&l.risk_medium)
            || !(0.0..=1.0).contains(&l.risk_high)
            || l.risk_medium > l.risk_high
        {
            return Err(EngineError::InvalidConfig(format!(
                "risk thresholds must satisfy 0 <= medium ({}) <= high ({}) <= 1",
                l.risk_medium, l.risk_high
            )));
        }
        if l.exposure_breach_medium > l.exposure_breach_high
            || l.exposure_presence_medium > l.exposure_presence_high
        {
            return Err(EngineError::InvalidConfig(
                "exposure medium thresholds exceed high thresholds".to_string(),
            ));
        }

        Ok(())
    }
}
