//! Hook adapter contract and transport semantics.
//!
//! Platform transports (stdin JSON hooks, plugin event buses) live outside
//! the core. What the core fixes is the contract they implement
//! ([`HookAdapter`]) and the exit semantics they must honour
//! ([`hook_outcome`]):
//!
//! | Verdict | Exit | Output |
//! |---------|------|--------|
//! | allow   | 0    | nothing |
//! | deny    | 2    | human-readable reason on stderr |
//! | ask     | 0    | one-line `{event, permissionDecision, permissionDecisionReason}` on stdout |
//!
//! A [`DefaultAdapter`] maps common agent tool names onto action types so the
//! bundled `hook` command works without platform glue. The module also hosts
//! the process-wide [`ScanCache`] used for plugin auto-scanning.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::{Mutex, Semaphore};

use crate::arbiter::Verdict;
use crate::error::ScanError;
use crate::scan;
use crate::types::{
    Action, ActionContext, ActionEnvelope, Actor, RiskLevel, RuntimeEnv, SkillIdentity,
};

/// Hook lifecycle phase. Post-event evaluations only produce audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookEvent {
    Pre,
    Post,
}

/// Parsed platform hook payload.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct HookInput {
    #[serde(alias = "toolName")]
    pub tool_name: String,
    #[serde(alias = "toolInput", default)]
    pub tool_input: serde_json::Value,
    #[serde(alias = "eventType", default = "default_event")]
    pub event_type: HookEvent,
    #[serde(alias = "sessionId", default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

fn default_event() -> HookEvent {
    HookEvent::Pre
}

/// What a platform adapter must supply.
pub trait HookAdapter {
    /// Parses the raw transport payload into a [`HookInput`].
    fn parse_input(&self, raw: &str) -> Result<HookInput, serde_json::Error>;

    /// Maps a platform tool name onto an action type tag, or `None` when the
    /// tool is not policy-relevant.
    fn map_tool_to_action_type(&self, tool_name: &str) -> Option<&'static str>;

    /// Builds the action envelope for an input, or `None` when the tool does
    /// not map to an action.
    fn build_envelope(
        &self,
        input: &HookInput,
        initiating_skill: Option<String>,
    ) -> Option<ActionEnvelope>;

    /// Attributes the tool call to a skill, when the payload carries enough
    /// to tell.
    fn infer_initiating_skill(&self, input: &HookInput) -> Option<String>;
}

/// Adapter for the common agent tool vocabulary (`Bash`, `WebFetch`, `Read`,
/// `Write`, …).
#[derive(Debug, Default)]
pub struct DefaultAdapter;

impl DefaultAdapter {
    fn string_field(input: &serde_json::Value, keys: &[&str]) -> Option<String> {
        keys.iter()
            .find_map(|k| input.get(*k).and_then(|v| v.as_str()))
            .map(str::to_string)
    }
}

impl HookAdapter for DefaultAdapter {
    fn parse_input(&self, raw: &str) -> Result<HookInput, serde_json::Error> {
        serde_json::from_str(raw)
    }

    fn map_tool_to_action_type(&self, tool_name: &str) -> Option<&'static str> {
        match tool_name {
            "Bash" | "bash" | "shell" | "exec" | "run_command" => Some("exec_command"),
            "WebFetch" | "fetch" | "http_request" | "curl" => Some("network_request"),
            "Read" | "read_file" | "view" => Some("read_file"),
            "Write" | "Edit" | "write_file" | "edit_file" => Some("write_file"),
            _ => None,
        }
    }

    fn build_envelope(
        &self,
        input: &HookInput,
        initiating_skill: Option<String>,
    ) -> Option<ActionEnvelope> {
        let action = match self.map_tool_to_action_type(&input.tool_name)? {
            "exec_command" => Action::ExecCommand {
                command: Self::string_field(&input.tool_input, &["command", "cmd"])?,
                args: None,
                cwd: input.cwd.as_ref().map(|p| p.display().to_string()),
                env: None,
            },
            "network_request" => Action::NetworkRequest {
                method: Self::string_field(&input.tool_input, &["method"])
                    .unwrap_or_else(|| "GET".to_string()),
                url: Self::string_field(&input.tool_input, &["url"])?,
                headers: None,
                body_preview: Self::string_field(&input.tool_input, &["body", "body_preview"]),
            },
            "read_file" => Action::ReadFile {
                path: Self::string_field(&input.tool_input, &["path", "file_path"])?,
            },
            "write_file" => Action::WriteFile {
                path: Self::string_field(&input.tool_input, &["path", "file_path"])?,
            },
            _ => return None,
        };

        let skill_id = initiating_skill.clone().unwrap_or_else(|| "session".to_string());
        Some(ActionEnvelope {
            actor: Actor {
                skill: SkillIdentity {
                    id: skill_id,
                    source: "runtime".to_string(),
                    version_ref: "0".to_string(),
                    artifact_hash: String::new(),
                },
                record_key: None,
            },
            action,
            context: ActionContext {
                session_id: input.session_id.clone().unwrap_or_default(),
                user_present: true,
                env: RuntimeEnv::Prod,
                time: Utc::now(),
                initiating_skill,
            },
        })
    }

    fn infer_initiating_skill(&self, input: &HookInput) -> Option<String> {
        Self::string_field(&input.tool_input, &["initiating_skill", "skill_id", "skill"])
    }
}

/// The structured single-line reply for an `ask` verdict.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct AskReply {
    pub event: String,
    #[serde(rename = "permissionDecision")]
    pub permission_decision: String,
    #[serde(rename = "permissionDecisionReason")]
    pub permission_decision_reason: String,
}

/// What the transport should do for a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOutcome {
    pub exit_code: i32,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

/// Translates a verdict into transport exit semantics.
pub fn hook_outcome(verdict: Verdict, explanation: &str) -> HookOutcome {
    match verdict {
        Verdict::Allow => HookOutcome {
            exit_code: 0,
            stdout: None,
            stderr: None,
        },
        Verdict::Deny => HookOutcome {
            exit_code: 2,
            stdout: None,
            stderr: Some(explanation.to_string()),
        },
        Verdict::Ask => {
            let reply = AskReply {
                event: "pre".to_string(),
                permission_decision: "ask".to_string(),
                permission_decision_reason: explanation.to_string(),
            };
            HookOutcome {
                exit_code: 0,
                // Single line: transports parse stdout line-wise.
                stdout: Some(serde_json::to_string(&reply).unwrap_or_default()),
                stderr: None,
            }
        }
    }
}

/// Condensed result of a plugin quick-scan, kept for the process lifetime.
#[derive(Debug, Clone)]
pub struct CachedScan {
    pub risk_level: RiskLevel,
    pub risk_tags: Vec<String>,
    pub files_scanned: usize,
}

/// Process-wide plugin scan cache and tool→plugin map.
///
/// Held explicitly by the embedding adapter rather than as module state, so
/// tests can build isolated instances. Entries are append-only for the
/// process lifetime; concurrent quick-scans are bounded by a semaphore.
pub struct ScanCache {
    entries: Mutex<HashMap<PathBuf, CachedScan>>,
    tool_map: Mutex<HashMap<String, String>>,
    permits: Semaphore,
}

impl ScanCache {
    /// At most this many plugin scans run at once.
    pub const MAX_CONCURRENT_SCANS: usize = 3;

    pub fn new() -> Self {
        ScanCache {
            entries: Mutex::new(HashMap::new()),
            tool_map: Mutex::new(HashMap::new()),
            permits: Semaphore::new(Self::MAX_CONCURRENT_SCANS),
        }
    }

    /// Quick-scans a plugin directory, caching the condensed result.
    pub async fn scan_plugin(&self, dir: &Path) -> Result<CachedScan, ScanError> {
        if let Some(cached) = self.entries.lock().await.get(dir) {
            return Ok(cached.clone());
        }

        let _permit = self.permits.acquire().await.expect("semaphore closed");

        // Re-check after waiting: another task may have scanned this plugin
        // while we held no permit.
        if let Some(cached) = self.entries.lock().await.get(dir) {
            return Ok(cached.clone());
        }

        let dir_owned = dir.to_path_buf();
        let report = tokio::task::spawn_blocking(move || scan::quick_scan(&dir_owned))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "plugin scan task failed");
                ScanError::Cancelled
            })??;

        let cached = CachedScan {
            risk_level: report.risk_level,
            risk_tags: report.risk_tags,
            files_scanned: report.files_scanned,
        };
        self.entries
            .lock()
            .await
            .insert(dir.to_path_buf(), cached.clone());
        Ok(cached)
    }

    /// Records a tool→plugin attribution. First write wins; the maps are
    /// append-only.
    pub async fn map_tool(&self, tool_name: &str, plugin_id: &str) {
        self.tool_map
            .lock()
            .await
            .entry(tool_name.to_string())
            .or_insert_with(|| plugin_id.to_string());
    }

    /// Resolves a tool name to the plugin that registered it.
    pub async fn plugin_for_tool(&self, tool_name: &str) -> Option<String> {
        self.tool_map.lock().await.get(tool_name).cloned()
    }
}

impl Default for ScanCache {
    fn default() -> Self {
        Self::new()
    }
}
