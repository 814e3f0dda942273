//! Prioritised secret patterns.
//!
//! Each pattern carries a fixed priority that maps onto a [`RiskLevel`]:
//! ≥ 90 critical, ≥ 70 high, ≥ 50 medium, below that low. The network
//! detector uses the highest-priority match in a request body; the static
//! scanner applies the same set per line.

use crate::types::RiskLevel;
use regex::Regex;
use std::sync::LazyLock;

pub(crate) static RE_PRIVATE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0x[a-fA-F0-9]{64}\b").unwrap());

// Candidate runs of 12-24 lowercase words; the validator narrows to the legal
// BIP-39 phrase lengths so prose does not fire.
pub(crate) static RE_MNEMONIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[a-z]{3,9}[ \t]+){11,23}[a-z]{3,9}\b").unwrap());

pub(crate) static RE_PEM_PRIVATE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-----BEGIN [A-Z ]*PRIVATE KEY-----").unwrap());

// 40-char base64 value within 30 chars of an "aws" mention. The proximity
// window keeps generic base64 noise out.
static RE_AWS_SECRET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)aws.{0,30}['"][A-Za-z0-9/+=]{40}['"]"#).unwrap()
});

pub(crate) static RE_AWS_ACCESS_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bAKIA[0-9A-Z]{16}\b").unwrap());

pub(crate) static RE_GITHUB_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bgh[pousr]_[A-Za-z0-9_]{36,}\b").unwrap());

static RE_JWT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bey[A-Za-z0-9_-]+\.ey[A-Za-z0-9_-]+").unwrap());

static RE_API_SECRET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:api|access)[_-]?(?:key|secret|token)\s*[:=]\s*['"]?[A-Za-z0-9_\-]{16,}"#)
        .unwrap()
});

pub(crate) static RE_DB_DSN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:postgres|postgresql|mysql|mongodb(?:\+srv)?)://\S+").unwrap()
});

static RE_PASSWORD_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpassword\s*[:=]").unwrap());

pub(crate) fn valid_mnemonic_length(candidate: &str) -> bool {
    let words = candidate.split_whitespace().count();
    matches!(words, 12 | 15 | 18 | 21 | 24)
}

/// One entry in the secret catalog.
pub struct SecretPattern {
    /// Stable identifier, also used as a static-scan rule id.
    pub id: &'static str,
    /// Fixed priority; see [`risk_for_priority`].
    pub priority: u8,
    regex: &'static LazyLock<Regex>,
    /// Optional post-match check applied to the matched text.
    validate: Option<fn(&str) -> bool>,
    pub description: &'static str,
}

impl SecretPattern {
    /// Returns the first validated match of this pattern in `text`.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        for m in self.regex.find_iter(text) {
            let matched = m.as_str();
            match self.validate {
                Some(check) if !check(matched) => continue,
                _ => return Some(matched),
            }
        }
        None
    }

    /// The risk level this pattern's priority maps to.
    pub fn risk_level(&self) -> RiskLevel {
        risk_for_priority(self.priority)
    }
}

/// The full secret catalog, highest priority first.
pub static SECRET_PATTERNS: &[SecretPattern] = &[
    SecretPattern {
        id: "PRIVATE_KEY_PATTERN",
        priority: 100,
        regex: &RE_PRIVATE_KEY,
        validate: None,
        description: "Hex-encoded private key (0x + 64 hex chars)",
    },
    SecretPattern {
        id: "MNEMONIC_PATTERN",
        priority: 100,
        regex: &RE_MNEMONIC,
        validate: Some(valid_mnemonic_length),
        description: "BIP-39 mnemonic phrase (12/15/18/21/24 words)",
    },
    SecretPattern {
        id: "PEM_PRIVATE_KEY",
        priority: 90,
        regex: &RE_PEM_PRIVATE_KEY,
        validate: None,
        description: "PEM private key header",
    },
    SecretPattern {
        id: "AWS_SECRET_KEY",
        priority: 80,
        regex: &RE_AWS_SECRET,
        validate: None,
        description: "AWS secret access key near an AWS context",
    },
    SecretPattern {
        id: "AWS_ACCESS_KEY",
        priority: 70,
        regex: &RE_AWS_ACCESS_KEY,
        validate: None,
        description: "AWS access key id",
    },
    SecretPattern {
        id: "GITHUB_TOKEN",
        priority: 70,
        regex: &RE_GITHUB_TOKEN,
        validate: None,
        description: "GitHub token (ghp_/gho_/ghu_/ghs_/ghr_)",
    },
    SecretPattern {
        id: "JWT_TOKEN",
        priority: 60,
        regex: &RE_JWT,
        validate: None,
        description: "JSON Web Token",
    },
    SecretPattern {
        id: "GENERIC_API_SECRET",
        priority: 50,
        regex: &RE_API_SECRET,
        validate: None,
        description: "Generic API key/secret assignment",
    },
    SecretPattern {
        id: "DB_CONNECTION_STRING",
        priority: 50,
        regex: &RE_DB_DSN,
        validate: None,
        description: "Database connection string with embedded credentials",
    },
    SecretPattern {
        id: "PASSWORD_ASSIGNMENT",
        priority: 40,
        regex: &RE_PASSWORD_ASSIGNMENT,
        validate: None,
        description: "Password literal assignment",
    },
];

/// Maps a pattern priority onto a [`RiskLevel`].
pub fn risk_for_priority(priority: u8) -> RiskLevel {
    if priority >= 90 {
        RiskLevel::Critical
    } else if priority >= 70 {
        RiskLevel::High
    } else if priority >= 50 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// A secret match found in free text.
pub struct SecretHit<'t> {
    pub pattern: &'static SecretPattern,
    pub matched: &'t str,
}

/// Returns the highest-priority secret match in `text`, if any.
///
/// `SECRET_PATTERNS` is ordered by priority, so the first pattern that fires
/// wins.
pub fn highest_priority_hit(text: &str) -> Option<SecretHit<'_>> {
    for pattern in SECRET_PATTERNS {
        if let Some(matched) = pattern.find(text) {
            return Some(SecretHit { pattern, matched });
        }
    }
    None
}
