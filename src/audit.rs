//! Evaluation audit trail.
//!
//! Every hook evaluation appends one JSON line to `audit.jsonl` in the state
//! home. Writes are strictly best-effort: a full disk or missing directory is
//! logged and swallowed — audit I/O must never block or fail an evaluation.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use crate::types::{truncate_display, PolicyDecision, RiskLevel};

const INPUT_SUMMARY_MAX: usize = 200;

/// One audit line.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub tool_name: String,
    /// Stringified tool input, truncated to 200 characters.
    pub tool_input_summary: String,
    pub decision: String,
    pub risk_level: RiskLevel,
    pub risk_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiating_skill: Option<String>,
}

impl AuditEntry {
    /// Builds an entry from an evaluation outcome.
    pub fn from_decision(
        tool_name: &str,
        tool_input: &serde_json::Value,
        decision: &PolicyDecision,
        initiating_skill: Option<&str>,
    ) -> Self {
        AuditEntry {
            timestamp: Utc::now(),
            tool_name: tool_name.to_string(),
            tool_input_summary: truncate_display(&tool_input.to_string(), INPUT_SUMMARY_MAX),
            decision: decision.decision.to_string(),
            risk_level: decision.risk_level,
            risk_tags: decision.risk_tags.clone(),
            initiating_skill: initiating_skill.map(str::to_string),
        }
    }
}

/// Append-only JSONL audit log.
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AuditLog { path: path.into() }
    }

    /// Appends one entry. Failures are logged at warn and otherwise ignored.
    pub async fn record(&self, entry: &AuditEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "audit entry failed to serialize");
                return;
            }
        };

        if let Err(e) = self.append(&line).await {
            tracing::warn!(path = %self.path.display(), error = %e, "audit write failed");
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{line}\n").as_bytes()).await?;
        Ok(())
    }
}
