//! Recommendation Generator
//!
//! Fixed, ordered rules over the score and the evidence present. Output
//! order is rule order, not priority order.

use footprint_core::{Category, CategoryGroup, Evidence, Priority, RecommendationSet, ScoreResult};

use crate::scoring::{classify_presence, has_group, PresenceKind};
use crate::EngineConfig;

pub const CHANGE_PASSWORDS: &str = "Change passwords immediately for accounts exposed in data breaches";
pub const ENABLE_TWO_FACTOR: &str = "Enable two-factor authentication on all accounts";
pub const USE_PASSWORD_MANAGER: &str = "Use a password manager to generate unique passwords";
pub const WHOIS_PRIVACY: &str = "Consider using WHOIS privacy protection for domain registration";
pub const SECURE_WEBSITES: &str = "Enable SSL certificates and security headers on your websites";
pub const REVIEW_SOCIAL_PRIVACY: &str = "Review and update privacy settings on social media accounts";
pub const SECURE_PUBLIC_PROFILES: &str =
    "Consider removing or securing personal information from public profiles";
pub const USE_VPN: &str = "Consider using a VPN for additional privacy";
pub const MONITOR_CREDIT: &str = "Regularly monitor credit reports for suspicious activity";
pub const MINIMIZE_FOOTPRINT: &str = "Review and minimize your online footprint";
pub const PRIVATE_SERVICES: &str = "Consider using privacy-focused email and search services";

/// Generate recommendations for a scored evidence set
pub fn recommend(score: &ScoreResult, evidence: &[Evidence], config: &EngineConfig) -> RecommendationSet {
    let mut set = RecommendationSet::new();

    if has_group(evidence, CategoryGroup::Breach) {
        set.push(CHANGE_PASSWORDS, Priority::High);
        set.push(ENABLE_TWO_FACTOR, Priority::High);
        set.push(USE_PASSWORD_MANAGER, Priority::Medium);
    }

    let unprotected_domain = evidence.iter().any(|e| {
        e.category == Category::DomainRegistration && e.payload_bool("whois_privacy") != Some(true)
    });
    if unprotected_domain {
        set.push(WHOIS_PRIVACY, Priority::Medium);
    }

    let insecure_site = evidence.iter().any(|e| {
        e.category.group() == CategoryGroup::Presence
            && classify_presence(e, &config.professional_platforms) == PresenceKind::Site { secure: false }
    });
    if insecure_site {
        set.push(SECURE_WEBSITES, Priority::Medium);
    }

    if has_group(evidence, CategoryGroup::Presence) {
        set.push(REVIEW_SOCIAL_PRIVACY, Priority::Low);
        set.push(SECURE_PUBLIC_PROFILES, Priority::Low);
    }

    if score.risk_score > config.advice.vpn_risk_above {
        set.push(USE_VPN, Priority::Medium);
        set.push(MONITOR_CREDIT, Priority::Medium);
    }

    if score.privacy_score < config.advice.minimize_privacy_below {
        set.push(MINIMIZE_FOOTPRINT, Priority::High);
        set.push(PRIVATE_SERVICES, Priority::Medium);
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::score_at;
    use chrono::{TimeZone, Utc};

    fn texts(set: &RecommendationSet) -> Vec<&str> {
        set.iter().map(|r| r.text.as_str()).collect()
    }

    fn run(evidence: &[Evidence]) -> RecommendationSet {
        let config = EngineConfig::default();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let score = score_at(evidence, &config, now);
        recommend(&score, evidence, &config)
    }

    #[test]
    fn test_empty_evidence_no_recommendations() {
        assert!(run(&[]).is_empty());
    }

    #[test]
    fn test_breach_rules() {
        let evidence = vec![Evidence::builder(Category::EmailBreach, "Adobe").build()];
        let set = run(&evidence);
        assert_eq!(
            texts(&set),
            vec![CHANGE_PASSWORDS, ENABLE_TWO_FACTOR, USE_PASSWORD_MANAGER]
        );
        assert_eq!(set.iter().next().unwrap().priority, Priority::High);
    }

    #[test]
    fn test_whois_privacy_rule() {
        let protected = Evidence::builder(Category::DomainRegistration, "whois")
            .field("domain", "example.com")
            .field("whois_privacy", true)
            .build();
        assert!(!run(&[protected]).contains(WHOIS_PRIVACY));

        let exposed = Evidence::builder(Category::DomainRegistration, "whois")
            .field("domain", "example.com")
            .field("whois_privacy", false)
            .build();
        assert!(run(&[exposed]).contains(WHOIS_PRIVACY));

        let silent = Evidence::builder(Category::DomainRegistration, "whois")
            .field("domain", "example.org")
            .build();
        assert!(run(&[silent]).contains(WHOIS_PRIVACY));
    }

    #[test]
    fn test_presence_rules() {
        let insecure = Evidence::builder(Category::OnlinePresence, "crawler")
            .field("platform", "website")
            .field("ssl_certificate", false)
            .build();
        let set = run(&[insecure]);
        assert_eq!(
            texts(&set),
            vec![SECURE_WEBSITES, REVIEW_SOCIAL_PRIVACY, SECURE_PUBLIC_PROFILES]
        );

        let profile = Evidence::builder(Category::SocialProfile, "Twitter")
            .field("platform", "Twitter")
            .field("username", "alice")
            .build();
        let set = run(&[profile]);
        assert!(!set.contains(SECURE_WEBSITES));
        assert!(set.contains(REVIEW_SOCIAL_PRIVACY));
    }

    #[test]
    fn test_score_threshold_rules_in_rule_order() {
        let evidence: Vec<Evidence> = (0..3)
            .map(|i| {
                Evidence::builder(Category::DataBreach, &format!("breach-{i}"))
                    .subject("alice@example.com")
                    .build()
            })
            .collect();
        let set = run(&evidence);

        // risk 0.6 (capped), privacy 0.25
        assert_eq!(
            texts(&set),
            vec![
                CHANGE_PASSWORDS,
                ENABLE_TWO_FACTOR,
                USE_PASSWORD_MANAGER,
                USE_VPN,
                MONITOR_CREDIT,
                MINIMIZE_FOOTPRINT,
                PRIVATE_SERVICES,
            ]
        );
    }

    #[test]
    fn test_risk_threshold_is_strict() {
        let config = EngineConfig::default();
        let mut score = score_at(&[], &config, Utc::now());
        score.risk_score = 0.5;
        assert!(!recommend(&score, &[], &config).contains(USE_VPN));
        score.risk_score = 0.5001;
        assert!(recommend(&score, &[], &config).contains(USE_VPN));
    }
}
