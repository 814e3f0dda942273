//! Core data types shared across the policy engine.
//!
//! This module contains the vocabulary every other component speaks:
//!
//! - [`RiskLevel`] and [`Decision`] — the classification alphabet.
//! - [`SkillIdentity`] — who is acting.
//! - [`ActionEnvelope`] / [`Action`] — what is being attempted.
//! - [`PolicyDecision`] and [`Evidence`] — what the engine concluded and why.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// Risk classification for an action or finding.
///
/// Variants are ordered from least to most severe and implement [`Ord`], so
/// risk roll-ups can be computed with `max`.
///
/// Serializes to lowercase strings (`"low"`, `"medium"`, `"high"`, `"critical"`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// No meaningful risk identified.
    Low,
    /// Worth auditing but not blocking on its own.
    Medium,
    /// Likely harmful; requires confirmation or capability backing.
    High,
    /// Known-bad pattern; blocks unconditionally.
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Engine-level outcome for a single evaluated action.
///
/// `Confirm` is not user-facing by itself — the
/// [`arbiter`](crate::arbiter) translates it to `ask` or `deny` depending on
/// the configured protection level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
    Confirm,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => write!(f, "allow"),
            Decision::Deny => write!(f, "deny"),
            Decision::Confirm => write!(f, "confirm"),
        }
    }
}

/// Identity of a skill/plugin version.
///
/// Two identities with the same `source` and `version_ref` but different
/// `artifact_hash` values are distinct — the registry keys records on all
/// three components (see [`registry::record_key`](crate::registry::record_key)).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SkillIdentity {
    /// Human-facing skill identifier (e.g., `"web-scraper"`).
    pub id: String,
    /// Where the skill came from (marketplace slug, git URL, local path).
    pub source: String,
    /// Version string or git ref the artifact was resolved from.
    pub version_ref: String,
    /// Content hash of the installed artifact tree.
    pub artifact_hash: String,
}

/// Execution environment the action is happening in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnv {
    Prod,
    Dev,
    Test,
}

/// The acting skill plus an optional pre-resolved registry key.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Actor {
    pub skill: SkillIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_key: Option<String>,
}

/// Session-level context accompanying an action.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ActionContext {
    pub session_id: String,
    /// `false` when no human can answer a confirmation prompt; the engine
    /// upgrades `confirm` to `deny` for Web3 actions in that case.
    pub user_present: bool,
    pub env: RuntimeEnv,
    pub time: DateTime<Utc>,
    /// Skill id inferred to have initiated this tool call, when attributable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiating_skill: Option<String>,
}

/// A proposed runtime action, tagged by type.
///
/// On the wire this serializes as `{"type": "...", "data": {...}}` — the shape
/// platform hook adapters produce.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Action {
    NetworkRequest {
        method: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<HashMap<String, String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body_preview: Option<String>,
    },
    ExecCommand {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        env: Option<HashMap<String, String>>,
    },
    ReadFile {
        path: String,
    },
    WriteFile {
        path: String,
    },
    SecretAccess {
        secret_name: String,
        access_type: String,
    },
    Web3Tx {
        chain_id: String,
        from: String,
        to: String,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
        /// Dapp origin URL, when the transaction was requested by a page.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<String>,
    },
    Web3Sign {
        chain_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        typed_data: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        origin: Option<String>,
    },
}

impl Action {
    /// Short machine name for the action type (matches the wire tag).
    pub fn kind(&self) -> &'static str {
        match self {
            Action::NetworkRequest { .. } => "network_request",
            Action::ExecCommand { .. } => "exec_command",
            Action::ReadFile { .. } => "read_file",
            Action::WriteFile { .. } => "write_file",
            Action::SecretAccess { .. } => "secret_access",
            Action::Web3Tx { .. } => "web3_tx",
            Action::Web3Sign { .. } => "web3_sign",
        }
    }
}

/// The structured request submitted to the action scanner.
///
/// Envelopes are single-use: the engine keeps no state derived from them.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ActionEnvelope {
    pub actor: Actor,
    pub action: Action,
    pub context: ActionContext,
}

/// A single piece of supporting evidence attached to a decision.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Evidence {
    /// Evidence category (usually the risk tag that produced it).
    #[serde(rename = "type")]
    pub kind: String,
    /// Input field the evidence refers to (e.g., `"body_preview"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The offending text, truncated for display.
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
    pub description: String,
}

impl Evidence {
    pub fn new(kind: &str, description: impl Into<String>) -> Self {
        Evidence {
            kind: kind.to_string(),
            field: None,
            matched: None,
            description: description.into(),
        }
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn with_match(mut self, matched: impl Into<String>) -> Self {
        self.matched = Some(truncate_display(&matched.into(), 80));
        self
    }
}

/// Final output of the action scanner for one envelope.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PolicyDecision {
    pub decision: Decision,
    pub risk_level: RiskLevel,
    /// Distinct machine-readable tags naming the findings that drove the
    /// decision, in triggering order.
    pub risk_tags: Vec<String>,
    pub evidence: Vec<Evidence>,
    /// Human-readable driver, with risk tags in square brackets.
    pub explanation: String,
    /// Capabilities in effect during evaluation (present on deny/confirm for
    /// diagnosis; omitted on plain allows).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_capabilities: Option<crate::capability::Capability>,
}

/// Truncates `s` to at most `max` characters on a char boundary, appending an
/// ellipsis when anything was cut.
pub fn truncate_display(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}
