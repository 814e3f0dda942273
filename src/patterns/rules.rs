//! The static-scan rule table.
//!
//! An ordered catalog of per-extension regex rules applied line-by-line by the
//! [static scanner](crate::scan). Secret-shaped rules reuse the definitions in
//! [`secrets`](crate::patterns::secrets) — the catalogs share one source of
//! truth for what a private key or mnemonic looks like.

use crate::types::RiskLevel;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Coarse grouping used in scan summaries and rule listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Execution,
    Secrets,
    Exfiltration,
    Obfuscation,
    PromptInjection,
    Web3,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Execution => write!(f, "execution"),
            RuleCategory::Secrets => write!(f, "secrets"),
            RuleCategory::Exfiltration => write!(f, "exfiltration"),
            RuleCategory::Obfuscation => write!(f, "obfuscation"),
            RuleCategory::PromptInjection => write!(f, "prompt_injection"),
            RuleCategory::Web3 => write!(f, "web3"),
        }
    }
}

/// One static-scan rule.
pub struct ScanRule {
    pub id: &'static str,
    pub severity: RiskLevel,
    pub category: RuleCategory,
    /// File extensions this rule applies to; empty means every scanned file.
    pub extensions: &'static [&'static str],
    regex: &'static LazyLock<Regex>,
    /// Optional post-match check on the matched text.
    validate: Option<fn(&str) -> bool>,
    pub description: &'static str,
}

impl ScanRule {
    /// Returns `true` when this rule applies to files with `ext`.
    pub fn applies_to(&self, ext: &str) -> bool {
        self.extensions.is_empty() || self.extensions.contains(&ext)
    }

    /// Returns the first validated match of this rule in `line`.
    pub fn find<'t>(&self, line: &'t str) -> Option<&'t str> {
        for m in self.regex.find_iter(line) {
            let matched = m.as_str();
            match self.validate {
                Some(check) if !check(matched) => continue,
                _ => return Some(matched),
            }
        }
        None
    }
}

const JS: &[&str] = &["js", "ts", "jsx", "tsx", "mjs", "cjs"];
const JS_PY: &[&str] = &["js", "ts", "jsx", "tsx", "mjs", "cjs", "py"];
const PY: &[&str] = &["py"];
const SHELL: &[&str] = &["sh", "bash"];
const SHELL_DOCS: &[&str] = &["sh", "bash", "md", "yml", "yaml"];
const SOLIDITY: &[&str] = &["sol"];
const SOL_JS: &[&str] = &["sol", "js", "ts"];
const MARKDOWN: &[&str] = &["md"];
const ALL: &[&str] = &[];

// Execution

static RE_SHELL_EXEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bchild_process\b|\bexecSync\s*\(|\bspawnSync\s*\("#).unwrap()
});
static RE_EVAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\beval\s*\(").unwrap());
static RE_NEW_FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bnew\s+Function\s*\(").unwrap());
static RE_OS_SYSTEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bos\.system\s*\(").unwrap());
static RE_SUBPROCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bsubprocess\.(?:run|call|Popen|check_output)\b").unwrap()
});
static RE_CURL_PIPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:curl|wget)\b[^|]*\|\s*(?:sudo\s+)?(?:ba|z|fi)?sh\b").unwrap()
});
static RE_RM_RF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\brm\s+-(?:rf|fr)\b").unwrap());
static RE_CHMOD_777: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bchmod\s+(?:-R\s+)?777\b").unwrap());

// Secrets (the private-key / mnemonic / token shapes live in `secrets`)

static RE_ENV_FILE_READ: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"readFileSync\s*\([^)]*\.env|open\s*\([^)]*\.env['"]"#).unwrap()
});

// Exfiltration

static RE_WEBHOOK_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)discord(?:app)?\.com/api/webhooks|hooks\.slack\.com|api\.telegram\.org/bot|webhook\.site|requestbin\.com|pipedream\.com|ngrok(?:-free)?\.(?:io|app)|beeceptor\.com|mockbin\.org",
    )
    .unwrap()
});
static RE_RAW_IP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:\d{1,3}\.){3}\d{1,3}").unwrap()
});
static RE_POST_ENV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:fetch|axios\.(?:post|put))\s*\([^)]*process\.env").unwrap()
});

// Obfuscation

static RE_EVAL_ATOB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\beval\s*\(\s*atob\s*\(").unwrap());
static RE_CHARCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"String\.fromCharCode\s*\((?:\s*\d+\s*,){8,}").unwrap()
});
static RE_HEX_ESCAPES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\\x[0-9a-fA-F]{2}){16,}").unwrap());
static RE_BASE64_BLOB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9+/]{80,}={0,2}").unwrap());

// Prompt injection

static RE_IGNORE_INSTRUCTIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ignore\s+(?:all|any|previous|prior|above)\s+(?:previous\s+|prior\s+)?instructions")
        .unwrap()
});
static RE_SYSTEM_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*/?\s*system\s*>|\[\s*SYSTEM\s*\]").unwrap()
});
static RE_SOCIAL_ENGINEERING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:do\s+not|don'?t)\s+(?:tell|inform|alert|notify)\s+the\s+user|keep\s+this\s+(?:a\s+)?secret")
        .unwrap()
});

// Web3 / Solidity

static RE_SELFDESTRUCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bselfdestruct\s*\(").unwrap());
static RE_UNLIMITED_APPROVAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"type\s*\(\s*uint256\s*\)\s*\.\s*max|0x[fF]{64}\b").unwrap()
});
static RE_REENTRANCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.call\s*\{\s*value\s*:").unwrap());
static RE_ECRECOVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\becrecover\s*\(").unwrap());
static RE_PROXY_SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"IMPLEMENTATION_SLOT").unwrap());
static RE_FLASH_LOAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:flashLoan|executeOperation|onFlashLoan|receiveFlashLoan)\b").unwrap()
});
static RE_DELEGATECALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.delegatecall\s*\(").unwrap());

// Secret shapes are shared with the runtime catalog — same statics, one
// definition (see `secrets`).
use super::secrets::{
    valid_mnemonic_length, RE_AWS_ACCESS_KEY as RE_AKIA, RE_DB_DSN as RE_DSN,
    RE_GITHUB_TOKEN as RE_GH_TOKEN, RE_MNEMONIC, RE_PEM_PRIVATE_KEY as RE_PEM, RE_PRIVATE_KEY,
};

/// The ordered rule table. Order is significant only for deterministic
/// `risk_tags` output; every applicable rule is always evaluated.
pub static SCAN_RULES: &[ScanRule] = &[
    ScanRule {
        id: "SHELL_EXEC",
        severity: RiskLevel::High,
        category: RuleCategory::Execution,
        extensions: JS,
        regex: &RE_SHELL_EXEC,
        validate: None,
        description: "Child process execution from JavaScript",
    },
    ScanRule {
        id: "EVAL_USAGE",
        severity: RiskLevel::High,
        category: RuleCategory::Execution,
        extensions: JS_PY,
        regex: &RE_EVAL,
        validate: None,
        description: "eval() of dynamic content",
    },
    ScanRule {
        id: "FUNCTION_CONSTRUCTOR",
        severity: RiskLevel::Medium,
        category: RuleCategory::Execution,
        extensions: JS,
        regex: &RE_NEW_FUNCTION,
        validate: None,
        description: "Function constructor — eval in disguise",
    },
    ScanRule {
        id: "PY_OS_SYSTEM",
        severity: RiskLevel::High,
        category: RuleCategory::Execution,
        extensions: PY,
        regex: &RE_OS_SYSTEM,
        validate: None,
        description: "os.system() shell execution",
    },
    ScanRule {
        id: "PY_SUBPROCESS",
        severity: RiskLevel::Medium,
        category: RuleCategory::Execution,
        extensions: PY,
        regex: &RE_SUBPROCESS,
        validate: None,
        description: "subprocess invocation",
    },
    ScanRule {
        id: "CURL_PIPE_SHELL",
        severity: RiskLevel::Critical,
        category: RuleCategory::Execution,
        extensions: SHELL_DOCS,
        regex: &RE_CURL_PIPE,
        validate: None,
        description: "Download piped straight into a shell",
    },
    ScanRule {
        id: "RM_RF",
        severity: RiskLevel::High,
        category: RuleCategory::Execution,
        extensions: SHELL,
        regex: &RE_RM_RF,
        validate: None,
        description: "Recursive force delete",
    },
    ScanRule {
        id: "CHMOD_WORLD_WRITABLE",
        severity: RiskLevel::Medium,
        category: RuleCategory::Execution,
        extensions: SHELL,
        regex: &RE_CHMOD_777,
        validate: None,
        description: "World-writable permissions",
    },
    ScanRule {
        id: "PRIVATE_KEY_PATTERN",
        severity: RiskLevel::Critical,
        category: RuleCategory::Secrets,
        extensions: ALL,
        regex: &RE_PRIVATE_KEY,
        validate: None,
        description: "Hardcoded hex private key",
    },
    ScanRule {
        id: "MNEMONIC_PATTERN",
        severity: RiskLevel::Critical,
        category: RuleCategory::Secrets,
        extensions: ALL,
        regex: &RE_MNEMONIC,
        validate: Some(valid_mnemonic_length),
        description: "BIP-39 mnemonic phrase",
    },
    ScanRule {
        id: "PEM_PRIVATE_KEY",
        severity: RiskLevel::Critical,
        category: RuleCategory::Secrets,
        extensions: ALL,
        regex: &RE_PEM,
        validate: None,
        description: "PEM private key block",
    },
    ScanRule {
        id: "AWS_ACCESS_KEY",
        severity: RiskLevel::High,
        category: RuleCategory::Secrets,
        extensions: ALL,
        regex: &RE_AKIA,
        validate: None,
        description: "AWS access key id",
    },
    ScanRule {
        id: "GITHUB_TOKEN",
        severity: RiskLevel::High,
        category: RuleCategory::Secrets,
        extensions: ALL,
        regex: &RE_GH_TOKEN,
        validate: None,
        description: "GitHub token",
    },
    ScanRule {
        id: "ENV_FILE_READ",
        severity: RiskLevel::Medium,
        category: RuleCategory::Secrets,
        extensions: JS_PY,
        regex: &RE_ENV_FILE_READ,
        validate: None,
        description: "Programmatic .env file read",
    },
    ScanRule {
        id: "DB_CONNECTION_STRING",
        severity: RiskLevel::Medium,
        category: RuleCategory::Secrets,
        extensions: ALL,
        regex: &RE_DSN,
        validate: None,
        description: "Database DSN with embedded credentials",
    },
    ScanRule {
        id: "WEBHOOK_EXFIL",
        severity: RiskLevel::High,
        category: RuleCategory::Exfiltration,
        extensions: ALL,
        regex: &RE_WEBHOOK_URL,
        validate: None,
        description: "Webhook/exfiltration drop-box URL",
    },
    ScanRule {
        id: "RAW_IP_URL",
        severity: RiskLevel::Medium,
        category: RuleCategory::Exfiltration,
        extensions: ALL,
        regex: &RE_RAW_IP_URL,
        validate: None,
        description: "URL addressing a raw IP",
    },
    ScanRule {
        id: "HTTP_POST_ENV",
        severity: RiskLevel::High,
        category: RuleCategory::Exfiltration,
        extensions: JS,
        regex: &RE_POST_ENV,
        validate: None,
        description: "Environment variables sent in an HTTP request",
    },
    ScanRule {
        id: "EVAL_ATOB",
        severity: RiskLevel::High,
        category: RuleCategory::Obfuscation,
        extensions: JS,
        regex: &RE_EVAL_ATOB,
        validate: None,
        description: "eval of base64-decoded content",
    },
    ScanRule {
        id: "CHARCODE_OBFUSCATION",
        severity: RiskLevel::Medium,
        category: RuleCategory::Obfuscation,
        extensions: JS,
        regex: &RE_CHARCODE,
        validate: None,
        description: "Long String.fromCharCode chain",
    },
    ScanRule {
        id: "HEX_ESCAPE_BLOB",
        severity: RiskLevel::Medium,
        category: RuleCategory::Obfuscation,
        extensions: ALL,
        regex: &RE_HEX_ESCAPES,
        validate: None,
        description: "Long hex-escape sequence",
    },
    ScanRule {
        id: "BASE64_BLOB",
        severity: RiskLevel::Low,
        category: RuleCategory::Obfuscation,
        extensions: ALL,
        regex: &RE_BASE64_BLOB,
        validate: None,
        description: "Large base64 blob",
    },
    ScanRule {
        id: "PROMPT_INJECTION",
        severity: RiskLevel::High,
        category: RuleCategory::PromptInjection,
        extensions: MARKDOWN,
        regex: &RE_IGNORE_INSTRUCTIONS,
        validate: None,
        description: "Instruction-override phrasing",
    },
    ScanRule {
        id: "SYSTEM_TAG_SPOOF",
        severity: RiskLevel::High,
        category: RuleCategory::PromptInjection,
        extensions: MARKDOWN,
        regex: &RE_SYSTEM_TAG,
        validate: None,
        description: "Spoofed system prompt tag",
    },
    ScanRule {
        id: "SOCIAL_ENGINEERING",
        severity: RiskLevel::Medium,
        category: RuleCategory::PromptInjection,
        extensions: MARKDOWN,
        regex: &RE_SOCIAL_ENGINEERING,
        validate: None,
        description: "Concealment instruction aimed at the agent",
    },
    ScanRule {
        id: "DANGEROUS_SELFDESTRUCT",
        severity: RiskLevel::Critical,
        category: RuleCategory::Web3,
        extensions: SOLIDITY,
        regex: &RE_SELFDESTRUCT,
        validate: None,
        description: "selfdestruct call",
    },
    ScanRule {
        id: "UNLIMITED_APPROVAL",
        severity: RiskLevel::High,
        category: RuleCategory::Web3,
        extensions: SOL_JS,
        regex: &RE_UNLIMITED_APPROVAL,
        validate: None,
        description: "Unlimited token approval amount",
    },
    ScanRule {
        id: "REENTRANCY_RISK",
        severity: RiskLevel::High,
        category: RuleCategory::Web3,
        extensions: SOLIDITY,
        regex: &RE_REENTRANCY,
        validate: None,
        description: "Low-level value call (reentrancy surface)",
    },
    ScanRule {
        id: "ECRECOVER_NO_NONCE",
        severity: RiskLevel::Medium,
        category: RuleCategory::Web3,
        extensions: SOLIDITY,
        regex: &RE_ECRECOVER,
        validate: None,
        description: "ecrecover without replay protection",
    },
    ScanRule {
        id: "PROXY_UPGRADE",
        severity: RiskLevel::Medium,
        category: RuleCategory::Web3,
        extensions: SOLIDITY,
        regex: &RE_PROXY_SLOT,
        validate: None,
        description: "Proxy implementation slot manipulation",
    },
    ScanRule {
        id: "FLASH_LOAN",
        severity: RiskLevel::Medium,
        category: RuleCategory::Web3,
        extensions: SOLIDITY,
        regex: &RE_FLASH_LOAN,
        validate: None,
        description: "Flash-loan entrypoint",
    },
    ScanRule {
        id: "DELEGATECALL",
        severity: RiskLevel::High,
        category: RuleCategory::Web3,
        extensions: SOLIDITY,
        regex: &RE_DELEGATECALL,
        validate: None,
        description: "delegatecall to dynamic target",
    },
];

/// Returns the full rule table.
pub fn rules() -> &'static [ScanRule] {
    SCAN_RULES
}

/// Looks up a rule by id.
pub fn find_rule(id: &str) -> Option<&'static ScanRule> {
    SCAN_RULES.iter().find(|r| r.id == id)
}
