use agentguard::capability::Capability;
use agentguard::detectors::network;
use agentguard::types::{Decision, RiskLevel};

fn caps_with_hosts(hosts: &[&str]) -> Capability {
    Capability {
        network_allowlist: hosts.iter().map(|s| s.to_string()).collect(),
        ..Capability::none()
    }
}

#[test]
fn invalid_url_blocks_at_high() {
    let analysis = network::analyze("GET", "not a url", None, &Capability::none());
    assert_eq!(analysis.risk_level, RiskLevel::High);
    assert!(analysis.should_block);
    assert!(analysis.risk_tags.contains(&"INVALID_URL".to_string()));
}

#[test]
fn webhook_domain_denies_at_high() {
    let analysis = network::analyze(
        "POST",
        "https://discord.com/api/webhooks/1/x",
        None,
        &Capability::none(),
    );
    assert_eq!(analysis.risk_level, RiskLevel::High);
    assert_eq!(analysis.forced_decision, Some(Decision::Deny));
    assert!(analysis.risk_tags.contains(&"WEBHOOK_EXFIL".to_string()));
}

#[test]
fn allowlisted_webhook_domain_passes() {
    let caps = caps_with_hosts(&["hooks.slack.com"]);
    let analysis = network::analyze("POST", "https://hooks.slack.com/services/T/B/x", None, &caps);
    assert_eq!(analysis.risk_level, RiskLevel::Low);
    assert!(!analysis.should_block);
}

#[test]
fn critical_secret_in_body_blocks_regardless_of_host() {
    let body = format!("payload=0x{}", "a".repeat(64));
    let caps = caps_with_hosts(&["example.com"]);
    let analysis = network::analyze("POST", "https://example.com/upload", Some(&body), &caps);
    assert_eq!(analysis.risk_level, RiskLevel::Critical);
    assert!(analysis.should_block);
    assert!(analysis.risk_tags.contains(&"CRITICAL_SECRET_EXFIL".to_string()));
}

#[test]
fn medium_secret_in_body_tags_without_blocking() {
    let analysis = network::analyze(
        "POST",
        "https://example.com/login",
        Some("jwt=eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0"),
        &Capability::none(),
    );
    assert!(analysis.risk_tags.contains(&"POTENTIAL_SECRET_EXFIL".to_string()));
    assert_eq!(analysis.risk_level, RiskLevel::Medium);
    assert!(!analysis.should_block);
}

#[test]
fn high_risk_tld_lifts_to_medium_on_get() {
    let analysis = network::analyze("GET", "https://cdn.evil.xyz/lib.js", None, &Capability::none());
    assert!(analysis.risk_tags.contains(&"HIGH_RISK_TLD".to_string()));
    assert_eq!(analysis.risk_level, RiskLevel::Medium);
}

#[test]
fn high_risk_tld_lifts_to_high_on_post() {
    let analysis = network::analyze("POST", "https://drop.evil.xyz/x", None, &Capability::none());
    assert_eq!(analysis.risk_level, RiskLevel::High);
}

#[test]
fn off_allowlist_post_is_high_untrusted_domain() {
    let caps = caps_with_hosts(&["api.github.com"]);
    let analysis = network::analyze("POST", "https://other.example.com/x", None, &caps);
    assert!(analysis.risk_tags.contains(&"UNTRUSTED_DOMAIN".to_string()));
    assert_eq!(analysis.risk_level, RiskLevel::High);
}

#[test]
fn off_allowlist_get_tags_without_lifting() {
    let caps = caps_with_hosts(&["api.github.com"]);
    let analysis = network::analyze("GET", "https://other.example.com/x", None, &caps);
    assert!(analysis.risk_tags.contains(&"UNTRUSTED_DOMAIN".to_string()));
    assert_eq!(analysis.risk_level, RiskLevel::Low);
}

#[test]
fn allowlisted_clean_request_is_low() {
    let caps = caps_with_hosts(&["api.github.com"]);
    let analysis = network::analyze("GET", "https://api.github.com/repos", None, &caps);
    assert_eq!(analysis.risk_level, RiskLevel::Low);
    assert!(analysis.risk_tags.is_empty());
    assert!(!analysis.should_block);
}

#[test]
fn empty_allowlist_means_no_untrusted_tag() {
    let analysis = network::analyze("GET", "https://anything.example.com/", None, &Capability::none());
    assert!(!analysis.risk_tags.contains(&"UNTRUSTED_DOMAIN".to_string()));
    assert_eq!(analysis.risk_level, RiskLevel::Low);
}
