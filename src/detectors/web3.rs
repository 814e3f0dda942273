//! Blockchain transaction and signature analysis.
//!
//! This detector covers only what can be decided without external data:
//! chain-allowlist membership and signature content. Address reputation,
//! phishing origins, and simulation run through the
//! [threat-intel path](crate::intel) in the engine.

use regex::Regex;
use std::sync::LazyLock;

use crate::capability::Capability;
use crate::detectors::Analysis;
use crate::patterns::secrets;
use crate::types::{Decision, Evidence, RiskLevel};

// Unlimited amounts show up either as an all-f hex word or as a raw decimal
// in the 2^96+ range (30+ digits).
static RE_UNLIMITED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"0x[fF]{8,}|\b\d{30,}\b").unwrap());

fn chain_allowed(capabilities: &Capability, chain_id: &str) -> bool {
    capabilities
        .web3
        .as_ref()
        .map(|w| w.chains_allowlist.iter().any(|c| c == chain_id))
        .unwrap_or(false)
}

fn deny_chain(analysis: &mut Analysis, chain_id: &str) {
    analysis.lift(RiskLevel::High);
    analysis.tag(
        "CHAIN_NOT_ALLOWED",
        Evidence::new(
            "CHAIN_NOT_ALLOWED",
            format!("chain {chain_id} is not in the chains allowlist"),
        )
        .with_field("chain_id"),
    );
    analysis.block(format!("Chain {chain_id} is not allowed"));
    analysis.forced_decision = Some(Decision::Deny);
}

/// Analyses a transaction request (chain allowlist only — reputation and
/// simulation are the engine's job).
pub fn analyze_tx(chain_id: &str, capabilities: &Capability) -> Analysis {
    let mut analysis = Analysis::clean();
    if !chain_allowed(capabilities, chain_id) {
        deny_chain(&mut analysis, chain_id);
    }
    analysis
}

/// Analyses a signature request: chain allowlist plus typed-data and message
/// content checks.
pub fn analyze_sign(
    chain_id: &str,
    message: Option<&str>,
    typed_data: Option<&str>,
    capabilities: &Capability,
) -> Analysis {
    let mut analysis = Analysis::clean();

    if !chain_allowed(capabilities, chain_id) {
        deny_chain(&mut analysis, chain_id);
        return analysis;
    }

    if let Some(typed) = typed_data {
        if typed.to_lowercase().contains("permit") {
            analysis.lift(RiskLevel::Medium);
            analysis.tag(
                "PERMIT_SIGNATURE",
                Evidence::new(
                    "PERMIT_SIGNATURE",
                    "typed data contains a Permit — gasless approval over tokens",
                )
                .with_field("typed_data"),
            );
            analysis.forced_decision = Some(Decision::Confirm);
        }

        if let Some(m) = RE_UNLIMITED_VALUE.find(typed) {
            analysis.lift(RiskLevel::High);
            analysis.tag(
                "UNLIMITED_VALUE",
                Evidence::new("UNLIMITED_VALUE", "typed data carries an unlimited amount")
                    .with_field("typed_data")
                    .with_match(m.as_str()),
            );
            analysis.forced_decision = Some(Decision::Confirm);
        }
    }

    if let Some(message) = message {
        if let Some(hit) = secrets::highest_priority_hit(message) {
            if hit.pattern.priority >= 90 {
                analysis.lift(RiskLevel::Critical);
                analysis.tag(
                    "SECRET_IN_SIGNATURE",
                    Evidence::new("SECRET_IN_SIGNATURE", hit.pattern.description)
                        .with_field("message")
                        .with_match(hit.matched),
                );
                analysis.block("Signature message contains a secret");
                analysis.forced_decision = Some(Decision::Deny);
            }
        }
    }

    analysis
}
