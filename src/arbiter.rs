//! Protection-level arbitration.
//!
//! Maps an engine [`PolicyDecision`] plus the user-configured protection
//! level onto the hook output alphabet `allow | deny | ask`. The mapping is a
//! fixed table with one carve-out: sensitive-path writes stay denied under
//! strict and balanced, and under permissive they downgrade to ask only when
//! no initiating skill is attributed to the write.

use std::fmt;

use crate::types::{Decision, PolicyDecision, RiskLevel};

/// User-chosen enforcement posture.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionLevel {
    /// Anything the engine is unsure about is denied.
    Strict,
    /// Engine confirmations become questions; denials stand.
    Balanced,
    /// Only critical denials stand; everything else degrades to a question
    /// or an allow.
    Permissive,
}

impl Default for ProtectionLevel {
    fn default() -> Self {
        ProtectionLevel::Balanced
    }
}

impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtectionLevel::Strict => write!(f, "strict"),
            ProtectionLevel::Balanced => write!(f, "balanced"),
            ProtectionLevel::Permissive => write!(f, "permissive"),
        }
    }
}

/// What the hook transport ultimately does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny,
    Ask,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Allow => write!(f, "allow"),
            Verdict::Deny => write!(f, "deny"),
            Verdict::Ask => write!(f, "ask"),
        }
    }
}

/// Applies the protection level to an engine decision.
///
/// `initiating_skill` feeds the sensitive-path carve-out: an attributed write
/// to a protected path is never softened below deny.
pub fn arbitrate(
    decision: &PolicyDecision,
    level: ProtectionLevel,
    initiating_skill: Option<&str>,
) -> Verdict {
    if decision.risk_tags.iter().any(|t| t == "SENSITIVE_PATH") {
        return match level {
            ProtectionLevel::Strict | ProtectionLevel::Balanced => Verdict::Deny,
            ProtectionLevel::Permissive => {
                if initiating_skill.is_none() {
                    Verdict::Ask
                } else {
                    Verdict::Deny
                }
            }
        };
    }

    match (level, decision.decision) {
        (ProtectionLevel::Strict, Decision::Deny | Decision::Confirm) => Verdict::Deny,
        (ProtectionLevel::Strict, Decision::Allow) => Verdict::Allow,

        (ProtectionLevel::Balanced, Decision::Deny) => Verdict::Deny,
        (ProtectionLevel::Balanced, Decision::Confirm) => Verdict::Ask,
        (ProtectionLevel::Balanced, Decision::Allow) => Verdict::Allow,

        (ProtectionLevel::Permissive, Decision::Deny) => {
            if decision.risk_level == RiskLevel::Critical {
                Verdict::Deny
            } else {
                Verdict::Ask
            }
        }
        (ProtectionLevel::Permissive, Decision::Confirm) => {
            if decision.risk_level >= RiskLevel::High {
                Verdict::Ask
            } else {
                Verdict::Allow
            }
        }
        (ProtectionLevel::Permissive, Decision::Allow) => Verdict::Allow,
    }
}
