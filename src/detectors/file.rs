//! Filesystem access analysis.
//!
//! Sensitive-path writes never reach this detector — the engine
//! short-circuits them before dispatch. What remains is the capability
//! allowlist check.

use crate::capability::{path_allowed, Capability};
use crate::detectors::Analysis;
use crate::types::{Decision, Evidence, RiskLevel};

/// Direction of a filesystem access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    Read,
    Write,
}

/// Analyses a file read or write against the filesystem allowlist.
pub fn analyze(path: &str, op: FileOp, capabilities: &Capability) -> Analysis {
    let mut analysis = Analysis::clean();

    if !path_allowed(&capabilities.filesystem_allowlist, path) {
        analysis.lift(RiskLevel::Medium);
        analysis.tag(
            "PATH_NOT_ALLOWED",
            Evidence::new(
                "PATH_NOT_ALLOWED",
                format!(
                    "{} of a path outside the filesystem allowlist",
                    match op {
                        FileOp::Read => "read",
                        FileOp::Write => "write",
                    }
                ),
            )
            .with_field("path")
            .with_match(path),
        );
        analysis.block("Path is not in the filesystem allowlist");
        analysis.forced_decision = Some(Decision::Deny);
    }

    analysis
}
