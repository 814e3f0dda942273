//! Shell command analysis.
//!
//! Classification order matters and is part of the contract:
//!
//! 1. Fork bombs and dangerous substrings block at critical, unconditionally.
//! 2. Commands on the safe-prefix allowlist (with no shell metacharacters and
//!    no sensitive substring) pass at low — even when the capability record
//!    denies exec. `git status` never needs a prompt.
//! 3. Everything else accumulates audit tags, then the exec capability is
//!    applied.

use std::collections::HashMap;

use crate::capability::{Capability, ExecPolicy};
use crate::detectors::Analysis;
use crate::patterns::commands;
use crate::types::{Evidence, RiskLevel};

/// Analyses a proposed command execution.
pub fn analyze(
    command: &str,
    args: Option<&[String]>,
    env: Option<&HashMap<String, String>>,
    capabilities: &Capability,
) -> Analysis {
    let full = match args {
        Some(args) if !args.is_empty() => format!("{command} {}", args.join(" ")),
        _ => command.to_string(),
    };
    let full_lower = full.to_lowercase();

    let mut analysis = Analysis::clean();

    if let Some(pattern) = commands::find_dangerous(&full_lower) {
        analysis.lift(RiskLevel::Critical);
        analysis.tag(
            "DANGEROUS_COMMAND",
            Evidence::new("DANGEROUS_COMMAND", format!("destructive pattern: {pattern}"))
                .with_field("command")
                .with_match(&full),
        );
        analysis.block(format!("Dangerous command pattern ({pattern})"));
        return analysis;
    }

    let sensitive = commands::find_sensitive(&full_lower);

    if !commands::has_shell_metachar(&full)
        && sensitive.is_none()
        && commands::starts_with_safe_prefix(&full_lower)
    {
        return analysis;
    }

    if let Some(entry) = sensitive {
        analysis.lift(RiskLevel::High);
        analysis.tag(
            "SENSITIVE_DATA_ACCESS",
            Evidence::new(
                "SENSITIVE_DATA_ACCESS",
                format!("command reads sensitive data ({entry})"),
            )
            .with_field("command")
            .with_match(&full),
        );
    }

    if let Some(cmd) = commands::find_system_command(&full_lower) {
        analysis.lift(RiskLevel::Medium);
        analysis.tag(
            "SYSTEM_COMMAND",
            Evidence::new("SYSTEM_COMMAND", format!("system administration command ({cmd})"))
                .with_field("command"),
        );
    }

    if let Some(cmd) = commands::find_network_command(&full_lower) {
        analysis.lift(RiskLevel::Medium);
        analysis.tag(
            "NETWORK_COMMAND",
            Evidence::new("NETWORK_COMMAND", format!("network command ({cmd})"))
                .with_field("command"),
        );
    }

    if let Some(pattern) = commands::find_shell_injection(&full) {
        analysis.lift(RiskLevel::Medium);
        analysis.tag(
            "SHELL_INJECTION_RISK",
            Evidence::new(
                "SHELL_INJECTION_RISK",
                format!("shell chaining or substitution ({pattern})"),
            )
            .with_field("command")
            .with_match(&full),
        );
    }

    if let Some(env) = env {
        for key in env.keys() {
            if commands::is_sensitive_env_key(key) {
                // Audit-only: flags the variable without lifting the level.
                analysis.tag(
                    "SENSITIVE_ENV_VAR",
                    Evidence::new(
                        "SENSITIVE_ENV_VAR",
                        format!("credential-bearing environment variable ({key})"),
                    )
                    .with_field("env"),
                );
            }
        }
    }

    if capabilities.exec == ExecPolicy::Deny && !analysis.should_block {
        analysis.block("Command execution not allowed");
    }

    analysis
}
