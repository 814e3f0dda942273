use agentguard::capability::Capability;
use agentguard::detectors::web3;
use agentguard::types::{Decision, RiskLevel};

fn defi_caps() -> Capability {
    Capability::defi()
}

#[test]
fn tx_on_allowed_chain_is_clean() {
    let analysis = web3::analyze_tx("1", &defi_caps());
    assert_eq!(analysis.risk_level, RiskLevel::Low);
    assert!(analysis.forced_decision.is_none());
}

#[test]
fn tx_on_unlisted_chain_denies() {
    let analysis = web3::analyze_tx("999", &defi_caps());
    assert_eq!(analysis.risk_level, RiskLevel::High);
    assert_eq!(analysis.forced_decision, Some(Decision::Deny));
    assert!(analysis.risk_tags.contains(&"CHAIN_NOT_ALLOWED".to_string()));
}

#[test]
fn tx_without_web3_capability_denies() {
    let analysis = web3::analyze_tx("1", &Capability::none());
    assert_eq!(analysis.forced_decision, Some(Decision::Deny));
}

#[test]
fn permit_typed_data_confirms_at_medium() {
    let typed = r#"{"types":{"Permit":[{"name":"owner","type":"address"}]}}"#;
    let analysis = web3::analyze_sign("1", None, Some(typed), &defi_caps());
    assert_eq!(analysis.risk_level, RiskLevel::Medium);
    assert_eq!(analysis.forced_decision, Some(Decision::Confirm));
    assert!(analysis.risk_tags.contains(&"PERMIT_SIGNATURE".to_string()));
}

#[test]
fn unlimited_value_confirms_at_high() {
    let typed = r#"{"value":"0xffffffffffffffffffffffffffffffff"}"#;
    let analysis = web3::analyze_sign("1", None, Some(typed), &defi_caps());
    assert_eq!(analysis.risk_level, RiskLevel::High);
    assert_eq!(analysis.forced_decision, Some(Decision::Confirm));
    assert!(analysis.risk_tags.contains(&"UNLIMITED_VALUE".to_string()));
}

#[test]
fn long_decimal_counts_as_unlimited() {
    let typed = format!(r#"{{"amount":"{}"}}"#, "9".repeat(32));
    let analysis = web3::analyze_sign("1", None, Some(&typed), &defi_caps());
    assert!(analysis.risk_tags.contains(&"UNLIMITED_VALUE".to_string()));
}

#[test]
fn secret_in_message_denies_at_critical() {
    let message = format!("please sign 0x{}", "c".repeat(64));
    let analysis = web3::analyze_sign("1", Some(&message), None, &defi_caps());
    assert_eq!(analysis.risk_level, RiskLevel::Critical);
    assert_eq!(analysis.forced_decision, Some(Decision::Deny));
    assert!(analysis.risk_tags.contains(&"SECRET_IN_SIGNATURE".to_string()));
}

#[test]
fn sign_on_unlisted_chain_denies_before_content_checks() {
    let analysis = web3::analyze_sign("999", None, Some("Permit"), &defi_caps());
    assert_eq!(analysis.risk_tags, vec!["CHAIN_NOT_ALLOWED"]);
}

#[test]
fn benign_message_is_clean() {
    let analysis = web3::analyze_sign("1", Some("login nonce 1234"), None, &defi_caps());
    assert_eq!(analysis.risk_level, RiskLevel::Low);
    assert!(analysis.risk_tags.is_empty());
}
