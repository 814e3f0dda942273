use agentguard::arbiter::{arbitrate, ProtectionLevel, Verdict};
use agentguard::types::{Decision, Evidence, PolicyDecision, RiskLevel};

fn decision(decision: Decision, risk_level: RiskLevel, tags: &[&str]) -> PolicyDecision {
    PolicyDecision {
        decision,
        risk_level,
        risk_tags: tags.iter().map(|t| t.to_string()).collect(),
        evidence: vec![Evidence::new("test", "test")],
        explanation: String::new(),
        effective_capabilities: None,
    }
}

#[test]
fn strict_denies_everything_but_allow() {
    let d = decision(Decision::Confirm, RiskLevel::Low, &[]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Strict, None), Verdict::Deny);

    let d = decision(Decision::Deny, RiskLevel::Medium, &[]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Strict, None), Verdict::Deny);

    let d = decision(Decision::Allow, RiskLevel::Low, &[]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Strict, None), Verdict::Allow);
}

#[test]
fn balanced_turns_confirm_into_ask() {
    let d = decision(Decision::Confirm, RiskLevel::High, &[]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Balanced, None), Verdict::Ask);

    let d = decision(Decision::Deny, RiskLevel::Low, &[]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Balanced, None), Verdict::Deny);

    let d = decision(Decision::Allow, RiskLevel::High, &[]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Balanced, None), Verdict::Allow);
}

#[test]
fn permissive_keeps_only_critical_denials() {
    let d = decision(Decision::Deny, RiskLevel::Critical, &[]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Permissive, None), Verdict::Deny);

    let d = decision(Decision::Deny, RiskLevel::High, &[]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Permissive, None), Verdict::Ask);

    let d = decision(Decision::Confirm, RiskLevel::High, &[]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Permissive, None), Verdict::Ask);

    let d = decision(Decision::Confirm, RiskLevel::Medium, &[]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Permissive, None), Verdict::Allow);

    let d = decision(Decision::Confirm, RiskLevel::Low, &[]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Permissive, None), Verdict::Allow);
}

#[test]
fn sensitive_path_stays_denied_under_strict_and_balanced() {
    let d = decision(Decision::Deny, RiskLevel::Critical, &["SENSITIVE_PATH"]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Strict, None), Verdict::Deny);
    assert_eq!(arbitrate(&d, ProtectionLevel::Balanced, None), Verdict::Deny);
}

#[test]
fn sensitive_path_under_permissive_asks_only_without_attribution() {
    let d = decision(Decision::Deny, RiskLevel::Critical, &["SENSITIVE_PATH"]);
    assert_eq!(arbitrate(&d, ProtectionLevel::Permissive, None), Verdict::Ask);
    assert_eq!(
        arbitrate(&d, ProtectionLevel::Permissive, Some("web-scraper")),
        Verdict::Deny
    );
}

/// deny < ask < allow; tightening the level must never loosen the verdict.
#[test]
fn levels_are_ordered_for_every_decision_shape() {
    fn rank(v: Verdict) -> u8 {
        match v {
            Verdict::Deny => 0,
            Verdict::Ask => 1,
            Verdict::Allow => 2,
        }
    }

    let levels = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::Critical];
    let decisions = [Decision::Allow, Decision::Deny, Decision::Confirm];
    let tag_sets: [&[&str]; 2] = [&[], &["SENSITIVE_PATH"]];
    let skills = [None, Some("scraper")];

    for level in levels {
        for dec in decisions {
            for tags in tag_sets {
                for skill in skills {
                    let d = decision(dec, level, tags);
                    let strict = rank(arbitrate(&d, ProtectionLevel::Strict, skill));
                    let balanced = rank(arbitrate(&d, ProtectionLevel::Balanced, skill));
                    let permissive = rank(arbitrate(&d, ProtectionLevel::Permissive, skill));
                    assert!(
                        strict <= balanced && balanced <= permissive,
                        "ordering violated for {dec:?}/{level:?}/{tags:?}/{skill:?}"
                    );
                }
            }
        }
    }
}
