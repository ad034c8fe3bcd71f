//! Scoring Engine
//!
//! Computes two independent, bounded signals from merged evidence:
//! - Risk (higher is worse): weighted contributions, capped per category group
//! - Privacy (higher is safer): per-item deductions from 1.0, uncapped
//!
//! Exposure level is derived from evidence counts, not from the privacy score.

use chrono::{DateTime, Utc};
use tracing::debug;

use footprint_core::{
    normalize_platform, sanitize_confidence, Category, CategoryGroup, ContributingFactor, Evidence,
    Level, ScoreResult,
};

use crate::EngineConfig;

/// Contributions smaller than this are treated as zero
const EPSILON: f64 = 1e-9;

/// How a presence item affects the scores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PresenceKind {
    /// Profile on a professional platform (GitHub, Stack Overflow, ...)
    Professional,
    /// A website; secure when it reports both SSL and security headers
    Site { secure: bool },
    Other,
}

pub(crate) fn classify_presence(evidence: &Evidence, professional_platforms: &[String]) -> PresenceKind {
    let platform = evidence.platform().map(normalize_platform).unwrap_or_default();

    if professional_platforms
        .iter()
        .any(|p| normalize_platform(p) == platform)
    {
        return PresenceKind::Professional;
    }

    let ssl = evidence.payload_bool("ssl_certificate");
    let headers = evidence.payload_bool("security_headers");
    let reports_security = evidence.payload.contains_key("ssl_certificate")
        || evidence.payload.contains_key("security_headers");

    if platform == "website" || reports_security {
        return PresenceKind::Site {
            secure: ssl == Some(true) && headers == Some(true),
        };
    }

    PresenceKind::Other
}

/// Groups whose risk contributions share a cap
#[derive(Debug, Clone, Copy)]
enum CapGroup {
    EmailBreach = 0,
    DataBreach = 1,
    ProfessionalPresence = 2,
    FaceMatch = 3,
}

#[derive(Default)]
struct RiskTally {
    total: f64,
    subtotals: [f64; 4],
    factors: Vec<ContributingFactor>,
}

impl RiskTally {
    fn add(&mut self, category: Category, amount: f64, description: String) {
        if amount.abs() < EPSILON {
            return;
        }
        self.total += amount;
        self.factors.push(ContributingFactor {
            category,
            description,
            magnitude: amount,
        });
    }

    fn add_capped(&mut self, group: CapGroup, cap: f64, category: Category, amount: f64, description: String) {
        let subtotal = &mut self.subtotals[group as usize];
        let applied = if amount > 0.0 {
            let remaining = (cap - *subtotal).max(0.0);
            if remaining < EPSILON {
                0.0
            } else {
                amount.min(remaining)
            }
        } else {
            amount
        };
        *subtotal += applied;
        self.add(category, applied, description);
    }
}

fn round_score(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn label<'a>(evidence: &'a Evidence, keys: &[&str]) -> &'a str {
    keys.iter()
        .find_map(|key| evidence.payload_str(key))
        .unwrap_or(evidence.source.as_str())
}

/// Score evidence against the current time
pub fn score(evidence: &[Evidence], config: &EngineConfig) -> ScoreResult {
    score_at(evidence, config, Utc::now())
}

/// Score evidence with an explicit reference time for domain ages
pub fn score_at(evidence: &[Evidence], config: &EngineConfig, now: DateTime<Utc>) -> ScoreResult {
    let weights = &config.risk;
    let deductions = &config.privacy;

    let mut risk = RiskTally::default();
    let mut privacy = 1.0;
    let mut breach_count = 0;
    let mut presence_count = 0;

    for item in evidence {
        match item.category {
            Category::EmailBreach => {
                breach_count += 1;
                privacy -= deductions.email_breach;
                risk.add_capped(
                    CapGroup::EmailBreach,
                    weights.email_breach_cap,
                    item.category,
                    weights.email_breach,
                    format!("Email found in breach '{}'", label(item, &["breach_name", "source_breach_name", "name"])),
                );
            }
            Category::DataBreach => {
                breach_count += 1;
                privacy -= deductions.data_breach;
                risk.add_capped(
                    CapGroup::DataBreach,
                    weights.data_breach_cap,
                    item.category,
                    weights.data_breach,
                    format!("Data exposed in breach '{}'", label(item, &["breach_name", "source_breach_name", "name"])),
                );
            }
            Category::DomainRegistration => {
                let domain = label(item, &["domain"]);
                match item.creation_date() {
                    Some(created) => {
                        let age_days = (now - created).num_days();
                        if age_days < weights.young_domain_days {
                            risk.add(
                                item.category,
                                weights.young_domain,
                                format!("Domain {} registered {} days ago", domain, age_days),
                            );
                        } else if age_days > weights.aged_domain_days {
                            risk.add(
                                item.category,
                                weights.aged_domain,
                                format!("Domain {} established {} days ago", domain, age_days),
                            );
                        }
                    }
                    None => debug!("Domain {} has no usable creation date", domain),
                }
            }
            Category::OnlinePresence | Category::SocialProfile => {
                presence_count += 1;
                let platform = label(item, &["platform"]);
                match classify_presence(item, &config.professional_platforms) {
                    PresenceKind::Professional => {
                        privacy -= deductions.professional_presence;
                        risk.add_capped(
                            CapGroup::ProfessionalPresence,
                            weights.professional_presence_cap,
                            item.category,
                            weights.professional_presence,
                            format!("Public professional profile on {}", platform),
                        );
                    }
                    PresenceKind::Site { secure } => {
                        privacy -= deductions.website;
                        let site = label(item, &["url", "domain"]);
                        if secure {
                            risk.add(item.category, weights.secure_site, format!("Website {} is served securely", site));
                        } else {
                            risk.add(
                                item.category,
                                weights.insecure_site,
                                format!("Website {} lacks SSL or security headers", site),
                            );
                        }
                    }
                    PresenceKind::Other => {}
                }
            }
            Category::FaceMatch => {
                let similarity = sanitize_confidence(item.similarity().unwrap_or(item.confidence));
                risk.add_capped(
                    CapGroup::FaceMatch,
                    weights.face_match_cap,
                    item.category,
                    similarity * weights.face_match_factor,
                    format!(
                        "Face matched on {} with similarity {:.2}",
                        label(item, &["platform", "record_type"]),
                        similarity
                    ),
                );
            }
        }
    }

    let levels = &config.levels;
    let risk_score = round_score(risk.total).clamp(0.0, 1.0);
    let privacy_score = round_score(privacy).clamp(0.0, 1.0);

    let exposure_level = if breach_count >= levels.exposure_breach_high
        || presence_count >= levels.exposure_presence_high
    {
        Level::High
    } else if breach_count >= levels.exposure_breach_medium
        || presence_count >= levels.exposure_presence_medium
    {
        Level::Medium
    } else {
        Level::Low
    };

    debug!(
        "Scored {} items: risk {:.4}, privacy {:.4}, {} factors",
        evidence.len(),
        risk_score,
        privacy_score,
        risk.factors.len()
    );

    ScoreResult {
        risk_score,
        risk_level: Level::from_score(risk_score, levels.risk_medium, levels.risk_high),
        privacy_score,
        exposure_level,
        contributing_factors: risk.factors,
        breach_count,
        presence_count,
    }
}

/// Evidence groups present in a set, used by recommendation rules
pub(crate) fn has_group(evidence: &[Evidence], group: CategoryGroup) -> bool {
    evidence.iter().any(|e| e.category.group() == group)
}
