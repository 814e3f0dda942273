//! Static source-tree scanner.
//!
//! Walks a directory, applies every [`ScanRule`](crate::patterns::rules::ScanRule)
//! whose extension filter matches, and rolls finding severities up into an
//! overall risk level. Scans are stateless and deterministic: identical input
//! trees always produce byte-identical reports, with findings ordered by
//! `(file_path, line, rule_id)`.
//!
//! Two modes:
//!
//! - [`scan_dir`] — full scan, including the base64 re-scan pass and content
//!   snippets in findings.
//! - [`quick_scan`] — same rules, no base64 re-scan, no snippets. Used on hot
//!   paths (session startup, plugin registration).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::Engine;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::ScanError;
use crate::patterns::rules::{self, RuleCategory, ScanRule};
use crate::types::RiskLevel;

/// Extensions the scanner picks up.
pub static SCAN_EXTENSIONS: &[&str] = &[
    "js", "ts", "jsx", "tsx", "mjs", "cjs", "py", "json", "yaml", "yml", "toml", "sol", "sh",
    "bash", "md",
];

/// Directories never descended into.
pub static EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    ".git",
    "coverage",
    "__pycache__",
    ".venv",
    "venv",
];

/// Exact file names never scanned.
pub static EXCLUDED_FILES: &[&str] = &["package-lock.json", "yarn.lock", "pnpm-lock.yaml"];

const SNIPPET_MAX: usize = 120;
const BASE64_RESCAN_MIN: usize = 80;

/// A single rule hit in a scanned file.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanFinding {
    pub rule_id: String,
    pub severity: RiskLevel,
    /// Path relative to the scan root.
    pub file_path: PathBuf,
    /// 1-based line number.
    pub line: usize,
    /// Offending text, truncated; empty in quick scans.
    pub matched_text: String,
    pub category: RuleCategory,
    /// Set when the finding came from re-scanning a decoded base64 blob; names
    /// the rule that surfaced the blob.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_rule: Option<String>,
}

/// Aggregated output of one scan.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanReport {
    /// `max(severity)` over findings; `low` for a clean tree.
    pub risk_level: RiskLevel,
    /// Distinct rule ids in finding order.
    pub risk_tags: Vec<String>,
    pub findings: Vec<ScanFinding>,
    pub files_scanned: usize,
    /// Files that could not be read or decoded; skipped without findings.
    pub skipped_files: usize,
    /// Short count-by-category string.
    pub summary: String,
}

/// Scan tuning knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Skip the base64 re-scan and omit content snippets.
    pub quick: bool,
}

/// Cooperative cancellation flag for long scans.
///
/// Checked between files; a cancelled scan returns [`ScanError::Cancelled`]
/// rather than surfacing partial results.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs a full scan of `root`.
pub fn scan_dir(root: &Path) -> Result<ScanReport, ScanError> {
    scan_dir_with(root, ScanOptions::default(), None)
}

/// Runs a quick scan: no base64 re-scan, no snippets.
pub fn quick_scan(root: &Path) -> Result<ScanReport, ScanError> {
    scan_dir_with(root, ScanOptions { quick: true }, None)
}

/// Runs a scan with explicit options and an optional cancel token.
pub fn scan_dir_with(
    root: &Path,
    options: ScanOptions,
    cancel: Option<&CancelToken>,
) -> Result<ScanReport, ScanError> {
    if !root.exists() {
        return Err(ScanError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let files = discover_files(root);

    // Per-file work is CPU-bound and shares no state; rayon fans it out and
    // the deterministic sort below fixes the ordering afterwards.
    let per_file: Vec<FileOutcome> = files
        .par_iter()
        .map(|file| {
            if cancel.map(CancelToken::is_cancelled).unwrap_or(false) {
                return FileOutcome::Cancelled;
            }
            scan_file(root, file, options)
        })
        .collect();

    if cancel.map(CancelToken::is_cancelled).unwrap_or(false) {
        return Err(ScanError::Cancelled);
    }

    let mut findings = Vec::new();
    let mut files_scanned = 0usize;
    let mut skipped_files = 0usize;
    for outcome in per_file {
        match outcome {
            FileOutcome::Scanned(mut f) => {
                files_scanned += 1;
                findings.append(&mut f);
            }
            FileOutcome::Skipped => skipped_files += 1,
            FileOutcome::Cancelled => return Err(ScanError::Cancelled),
        }
    }

    findings.sort_by(|a, b| {
        (&a.file_path, a.line, a.rule_id.as_str()).cmp(&(&b.file_path, b.line, b.rule_id.as_str()))
    });

    let risk_level = findings
        .iter()
        .map(|f| f.severity)
        .max()
        .unwrap_or(RiskLevel::Low);

    let mut risk_tags: Vec<String> = Vec::new();
    for f in &findings {
        if !risk_tags.iter().any(|t| t == &f.rule_id) {
            risk_tags.push(f.rule_id.clone());
        }
    }

    let summary = summarize(&findings, files_scanned, skipped_files);

    Ok(ScanReport {
        risk_level,
        risk_tags,
        findings,
        files_scanned,
        skipped_files,
        summary,
    })
}

enum FileOutcome {
    Scanned(Vec<ScanFinding>),
    Skipped,
    Cancelled,
}

/// Collects scannable files under `root`, sorted by path.
fn discover_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| {
            if !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !EXCLUDED_DIRS.contains(&name.as_ref())
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            let name = match p.file_name() {
                Some(n) => n.to_string_lossy().to_lowercase(),
                None => return false,
            };
            if EXCLUDED_FILES.contains(&name.as_str())
                || name.ends_with(".min.js")
                || name.ends_with(".min.css")
            {
                return false;
            }
            p.extension()
                .map(|ext| {
                    SCAN_EXTENSIONS.contains(&ext.to_string_lossy().to_lowercase().as_str())
                })
                .unwrap_or(false)
        })
        .collect();

    files.sort();
    files
}

fn scan_file(root: &Path, file: &Path, options: ScanOptions) -> FileOutcome {
    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(_) => return FileOutcome::Skipped,
    };

    let ext = file
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let rel = file.strip_prefix(root).unwrap_or(file).to_path_buf();

    let applicable: Vec<&'static ScanRule> = rules::rules()
        .iter()
        .filter(|r| r.applies_to(&ext))
        .collect();

    let mut findings = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        for &rule in &applicable {
            let Some(matched) = rule.find(line) else {
                continue;
            };
            findings.push(make_finding(rule, &rel, line_no, matched, None, options));

            // Base64 payloads get decoded and run back through the rule set so
            // encoding a webhook URL or key does not hide it.
            if !options.quick && rule.id == "BASE64_BLOB" && matched.len() >= BASE64_RESCAN_MIN {
                findings.extend(rescan_base64(&applicable, &rel, line_no, matched, options));
            }
        }
    }

    FileOutcome::Scanned(findings)
}

fn rescan_base64(
    applicable: &[&'static ScanRule],
    rel: &Path,
    line_no: usize,
    token: &str,
    options: ScanOptions,
) -> Vec<ScanFinding> {
    let decoded_bytes = base64::engine::general_purpose::STANDARD
        .decode(token)
        .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(token));
    let Ok(bytes) = decoded_bytes else {
        return vec![];
    };
    let Ok(text) = String::from_utf8(bytes) else {
        return vec![];
    };

    let mut findings = Vec::new();
    for decoded_line in text.lines() {
        for &rule in applicable {
            if rule.id == "BASE64_BLOB" {
                continue;
            }
            if let Some(matched) = rule.find(decoded_line) {
                findings.push(make_finding(
                    rule,
                    rel,
                    line_no,
                    matched,
                    Some("BASE64_BLOB".to_string()),
                    options,
                ));
            }
        }
    }
    findings
}

fn make_finding(
    rule: &'static ScanRule,
    rel: &Path,
    line_no: usize,
    matched: &str,
    parent_rule: Option<String>,
    options: ScanOptions,
) -> ScanFinding {
    let matched_text = if options.quick {
        String::new()
    } else if matched.len() > SNIPPET_MAX {
        // Cut on a char boundary; a raw byte index can fall mid-codepoint.
        let cut = matched
            .char_indices()
            .nth(SNIPPET_MAX - 3)
            .map(|(i, _)| i)
            .unwrap_or(matched.len());
        format!("{}...", &matched[..cut])
    } else {
        matched.to_string()
    };

    ScanFinding {
        rule_id: rule.id.to_string(),
        severity: rule.severity,
        file_path: rel.to_path_buf(),
        line: line_no,
        matched_text,
        category: rule.category,
        parent_rule,
    }
}

fn summarize(findings: &[ScanFinding], files_scanned: usize, skipped_files: usize) -> String {
    use std::collections::BTreeMap;

    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    for f in findings {
        *by_category.entry(f.category.to_string()).or_default() += 1;
    }

    let categories = if by_category.is_empty() {
        "clean".to_string()
    } else {
        by_category
            .iter()
            .map(|(cat, n)| format!("{cat}:{n}"))
            .collect::<Vec<_>>()
            .join(" ")
    };

    if skipped_files > 0 {
        format!(
            "{categories} ({} findings, {files_scanned} files, {skipped_files} skipped)",
            findings.len()
        )
    } else {
        format!(
            "{categories} ({} findings, {files_scanned} files)",
            findings.len()
        )
    }
}
