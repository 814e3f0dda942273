//! Outbound network request analysis.
//!
//! Checks, in order: URL validity, webhook/exfil domains, secrets in the
//! request body, high-risk TLDs, and the network allowlist. The body scan
//! uses the shared secret catalog — the highest-priority match wins, and a
//! critical-priority secret blocks regardless of destination.

use crate::capability::{host_allowed, Capability};
use crate::detectors::Analysis;
use crate::patterns::{paths, secrets};
use crate::types::{Evidence, RiskLevel};

/// Analyses a proposed HTTP request.
pub fn analyze(
    method: &str,
    raw_url: &str,
    body_preview: Option<&str>,
    capabilities: &Capability,
) -> Analysis {
    let mut analysis = Analysis::clean();
    let method = method.to_uppercase();
    let is_write_method = method == "POST" || method == "PUT";

    let host = match url::Url::parse(raw_url) {
        Ok(parsed) => match parsed.host_str() {
            Some(h) => h.to_lowercase(),
            None => {
                analysis.lift(RiskLevel::High);
                analysis.tag(
                    "INVALID_URL",
                    Evidence::new("INVALID_URL", "URL has no host")
                        .with_field("url")
                        .with_match(raw_url),
                );
                analysis.block("Request URL could not be parsed");
                return analysis;
            }
        },
        Err(e) => {
            analysis.lift(RiskLevel::High);
            analysis.tag(
                "INVALID_URL",
                Evidence::new("INVALID_URL", format!("URL failed to parse: {e}"))
                    .with_field("url")
                    .with_match(raw_url),
            );
            analysis.block("Request URL could not be parsed");
            return analysis;
        }
    };

    let allowlisted = host_allowed(&capabilities.network_allowlist, &host);

    if paths::is_webhook_domain(&host) && !allowlisted {
        analysis.lift(RiskLevel::High);
        analysis.tag(
            "WEBHOOK_EXFIL",
            Evidence::new("WEBHOOK_EXFIL", format!("known exfiltration domain ({host})"))
                .with_field("url")
                .with_match(raw_url),
        );
        analysis.block(format!("Request targets exfiltration domain {host}"));
        // Exfil drop-boxes are an outright deny, not a confirmation prompt.
        analysis.forced_decision = Some(crate::types::Decision::Deny);
    }

    if let Some(body) = body_preview {
        if let Some(hit) = secrets::highest_priority_hit(body) {
            let level = hit.pattern.risk_level();
            if hit.pattern.priority >= 90 {
                analysis.lift(RiskLevel::Critical);
                analysis.tag(
                    "CRITICAL_SECRET_EXFIL",
                    Evidence::new("CRITICAL_SECRET_EXFIL", hit.pattern.description)
                        .with_field("body_preview")
                        .with_match(hit.matched),
                );
                analysis.block("Request body contains a critical secret");
            } else if hit.pattern.priority >= 50 {
                analysis.lift(level);
                analysis.tag(
                    "POTENTIAL_SECRET_EXFIL",
                    Evidence::new("POTENTIAL_SECRET_EXFIL", hit.pattern.description)
                        .with_field("body_preview")
                        .with_match(hit.matched),
                );
            }
        }
    }

    if paths::has_high_risk_tld(&host) && !allowlisted {
        analysis.lift(if is_write_method {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        });
        analysis.tag(
            "HIGH_RISK_TLD",
            Evidence::new("HIGH_RISK_TLD", format!("high-abuse TLD ({host})")).with_field("url"),
        );
    }

    if !allowlisted && !capabilities.network_allowlist.is_empty() {
        if is_write_method {
            analysis.lift(RiskLevel::High);
        }
        analysis.tag(
            "UNTRUSTED_DOMAIN",
            Evidence::new(
                "UNTRUSTED_DOMAIN",
                format!("{host} is not in the network allowlist"),
            )
            .with_field("url"),
        );
    }

    analysis
}
