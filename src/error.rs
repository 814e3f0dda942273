//! Error taxonomy.
//!
//! The engine itself never raises — every evaluation path terminates in a
//! [`PolicyDecision`](crate::types::PolicyDecision). Errors exist only at the
//! edges: registry mutations (so callers can retry) and static-scan input
//! validation. Content-level scan errors are absorbed into the report's
//! `skipped_files` counter.

use std::path::PathBuf;

/// Errors raised by [`TrustRegistry`](crate::registry::TrustRegistry) operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An attest would raise trust on a known record, or re-activate a revoked
    /// key, without `force`.
    #[error("confirmation required: {0}")]
    NeedsConfirmation(String),

    /// A revoke call with every match field empty would revoke everything.
    #[error("invalid match: at least one of source, version_ref, record_key is required")]
    InvalidMatch,

    /// The on-disk document has an unknown schema version; the registry is
    /// read-only until migrated.
    #[error("registry version {0} is not supported; registry opened read-only")]
    ReadOnly(u32),

    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors raised by the static scanner for invalid inputs.
///
/// Per-file read/decode failures are not errors — they skip the file.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scan path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("scan path is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The scan's cancel token fired; partial results are discarded.
    #[error("scan cancelled")]
    Cancelled,
}

/// Errors raised when loading the engine configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
