//! Secret-store access analysis.

use crate::capability::Capability;
use crate::detectors::Analysis;
use crate::types::{Decision, Evidence, RiskLevel};

/// Analyses access to a named secret against the secrets allowlist.
pub fn analyze(secret_name: &str, access_type: &str, capabilities: &Capability) -> Analysis {
    let mut analysis = Analysis::clean();

    let allowed = capabilities
        .secrets_allowlist
        .iter()
        .any(|entry| entry == secret_name);

    if !allowed {
        analysis.lift(RiskLevel::High);
        analysis.tag(
            "SECRET_NOT_ALLOWED",
            Evidence::new(
                "SECRET_NOT_ALLOWED",
                format!("{access_type} access to secret outside the allowlist"),
            )
            .with_field("secret_name")
            .with_match(secret_name),
        );
        analysis.block(format!("Secret {secret_name} is not in the allowlist"));
        analysis.forced_decision = Some(Decision::Deny);
    }

    analysis
}
