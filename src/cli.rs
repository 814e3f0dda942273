//! Command-line interface definition.
//!
//! Uses [clap] derive macros to parse arguments. This module is only used by
//! the binary crate (`src/main.rs`).

use agentguard::arbiter::ProtectionLevel;
use agentguard::output::OutputFormat;
use agentguard::registry::TrustLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Security policy engine for AI coding agents.
#[derive(Parser)]
#[command(
    name = "agentguard",
    version,
    about = "Security policy engine for AI coding agents"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Statically scan a directory for risky code patterns.
    Scan {
        /// Directory to scan.
        path: PathBuf,

        /// Output format (pretty or json).
        #[arg(long, short, default_value = "pretty", value_enum)]
        format: OutputFormat,

        /// Write output to a file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Skip the base64 re-scan and content snippets (hot-path mode).
        #[arg(long)]
        quick: bool,
    },

    /// Evaluate one action envelope from stdin and exit with hook semantics.
    ///
    /// allow => exit 0 silent; deny => exit 2, reason on stderr;
    /// ask => exit 0, one-line JSON reply on stdout.
    Hook {
        /// Override the configured protection level for this evaluation.
        #[arg(long, value_enum)]
        level: Option<ProtectionLevel>,
    },

    /// Manage the skill trust registry.
    #[command(subcommand)]
    Registry(RegistryCommands),

    /// List every static-scan rule with its severity and description.
    ListRules,

    /// Show the full description of a specific rule.
    Explain {
        /// Rule ID to look up (e.g., `"SHELL_EXEC"`, `"MNEMONIC_PATTERN"`).
        rule_id: String,
    },
}

/// Registry subcommands.
#[derive(Subcommand)]
pub enum RegistryCommands {
    /// Attest a skill directory into the registry.
    Attest {
        /// Path to the skill directory (hashed for the record key).
        path: PathBuf,

        /// Skill identifier.
        #[arg(long)]
        id: String,

        /// Skill source (marketplace slug, git URL, local path).
        #[arg(long)]
        source: String,

        /// Version string or git ref.
        #[arg(long, default_value = "0.0.0")]
        version: String,

        /// Trust level to grant.
        #[arg(long, value_enum, default_value = "restricted")]
        level: TrustLevelArg,

        /// Capability preset (none, read_only, trading_bot, defi).
        #[arg(long, default_value = "none")]
        preset: String,

        /// Apply even when it raises trust or re-activates a revoked record.
        #[arg(long)]
        force: bool,
    },

    /// Revoke matching records.
    Revoke {
        /// Match by source.
        #[arg(long)]
        source: Option<String>,

        /// Match by version ref.
        #[arg(long)]
        version: Option<String>,

        /// Match by record key.
        #[arg(long)]
        record_key: Option<String>,

        /// Reason recorded on the revoked records.
        #[arg(long, default_value = "revoked via CLI")]
        reason: String,
    },

    /// List registry records.
    List {
        /// Only records at this trust level.
        #[arg(long, value_enum)]
        level: Option<TrustLevelArg>,

        /// Include expired records.
        #[arg(long)]
        include_expired: bool,
    },
}

/// Clap-friendly mirror of [`TrustLevel`].
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum TrustLevelArg {
    Untrusted,
    Restricted,
    Trusted,
}

impl From<TrustLevelArg> for TrustLevel {
    fn from(arg: TrustLevelArg) -> Self {
        match arg {
            TrustLevelArg::Untrusted => TrustLevel::Untrusted,
            TrustLevelArg::Restricted => TrustLevel::Restricted,
            TrustLevelArg::Trusted => TrustLevel::Trusted,
        }
    }
}
