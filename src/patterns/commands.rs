//! Shell command classification sets.
//!
//! Consumed by the exec detector (§ runtime path) in a fixed order: fork-bomb
//! and dangerous substrings first, then the safe-prefix allowlist (only valid
//! when the command carries no shell metacharacter and no sensitive
//! substring), then the audit-level system/network/injection sets.
//!
//! All matching here happens on the lowercased full command line.

use regex::Regex;
use std::sync::LazyLock;

/// Fork bomb, tolerant of arbitrary whitespace between tokens.
pub static FORK_BOMB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*\(\s*\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;").unwrap());

/// Download piped into a shell interpreter.
pub static PIPE_TO_SHELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:curl|wget)\b[^|]*\|\s*(?:sudo\s+)?(?:ba|z|fi)?sh\b").unwrap()
});

/// Substrings that block a command outright regardless of capabilities.
pub static DANGEROUS_SUBSTRINGS: &[&str] = &[
    "rm -rf",
    "rm -fr",
    "mkfs",
    "dd if=",
    "chmod 777",
    "chmod -r 777",
    "> /dev/sda",
    "mv /* ",
];

/// Read-only utilities, common VCS/build/install commands, version probes.
///
/// Only honoured when the full command contains no shell metacharacter and no
/// sensitive substring — `cat` is safe, `cat /etc/shadow` is not.
pub static SAFE_PREFIXES: &[&str] = &[
    "ls", "pwd", "echo", "cd", "cat", "less", "head", "tail", "grep", "rg", "find", "wc",
    "which", "whoami", "date", "file", "stat", "tree", "du", "df", "ps",
    "git status", "git log", "git diff", "git show", "git branch", "git remote",
    "git add", "git commit", "git push", "git pull", "git fetch", "git checkout",
    "npm install", "npm ci", "npm run", "npm test", "npx", "yarn", "pnpm install",
    "pip install", "pip3 install", "cargo build", "cargo check", "cargo test",
    "cargo run", "cargo fmt", "go build", "go test", "make",
    "node --version", "python --version", "python3 --version", "npm --version",
    "rustc --version", "cargo --version", "git --version",
];

/// Commands that read credential stores or dump the environment.
///
/// Multi-word entries match as substrings; single-word entries match as whole
/// words so that `echo reset` does not trip on `set`.
pub static SENSITIVE_COMMANDS: &[&str] = &[
    "cat /etc/passwd",
    "cat /etc/shadow",
    "cat ~/.ssh",
    "cat ~/.aws",
    "cat ~/.kube",
    "cat ~/.npmrc",
    "cat ~/.netrc",
    "printenv",
    "env",
    "set",
];

/// System-administration commands; medium risk, audit tag.
pub static SYSTEM_COMMANDS: &[&str] = &[
    "sudo", "su", "chmod", "chown", "chgrp", "kill", "killall", "pkill", "reboot",
    "shutdown", "systemctl", "service", "mount", "umount", "crontab", "useradd",
    "userdel", "passwd", "iptables", "sysctl", "launchctl",
];

/// Network-touching commands; medium risk, audit tag.
pub static NETWORK_COMMANDS: &[&str] = &[
    "curl", "wget", "nc", "ncat", "netcat", "ssh", "scp", "sftp", "rsync", "ftp",
    "telnet", "ping", "dig", "nslookup", "traceroute",
];

/// Shell metacharacters that disqualify a command from the safe allowlist.
pub static SHELL_METACHARS: &[char] = &[';', '|', '&', '`', '$', '(', ')', '{', '}'];

/// Substrings indicating command substitution or chaining.
pub static SHELL_INJECTION_PATTERNS: &[&str] = &["$(", "`", ";", "&&", "||"];

/// Environment variable name fragments that suggest credential material.
pub static SENSITIVE_ENV_KEYS: &[&str] =
    &["API_KEY", "SECRET", "PASSWORD", "TOKEN", "PRIVATE", "CREDENTIAL"];

/// Returns the dangerous pattern that matches `full_lower`, if any.
///
/// Checks the fork-bomb regex, the pipe-to-shell regex, and the dangerous
/// substring list. Input must already be lowercased (the regexes are
/// case-insensitive anyway; the substrings are not).
pub fn find_dangerous(full_lower: &str) -> Option<&'static str> {
    if FORK_BOMB.is_match(full_lower) {
        return Some("fork bomb");
    }
    if PIPE_TO_SHELL.is_match(full_lower) {
        return Some("download piped to shell");
    }
    DANGEROUS_SUBSTRINGS
        .iter()
        .find(|s| full_lower.contains(*s))
        .copied()
}

/// Returns `true` when `s` contains any shell metacharacter.
pub fn has_shell_metachar(s: &str) -> bool {
    s.chars().any(|c| SHELL_METACHARS.contains(&c))
}

/// Returns `true` when `full_lower` starts with a safe prefix, either exactly
/// or followed by a space.
pub fn starts_with_safe_prefix(full_lower: &str) -> bool {
    SAFE_PREFIXES.iter().any(|prefix| {
        full_lower == *prefix || full_lower.starts_with(&format!("{prefix} "))
    })
}

fn word_present(full: &str, word: &str) -> bool {
    full == word
        || full.starts_with(&format!("{word} "))
        || full.ends_with(&format!(" {word}"))
        || full.contains(&format!(" {word} "))
}

/// Returns the sensitive-command entry present in `full_lower`, if any.
pub fn find_sensitive(full_lower: &str) -> Option<&'static str> {
    SENSITIVE_COMMANDS
        .iter()
        .find(|entry| {
            if entry.contains(' ') || entry.contains('/') {
                full_lower.contains(*entry)
            } else {
                word_present(full_lower, entry)
            }
        })
        .copied()
}

/// Returns the system command present at the start of `full_lower` or after a
/// space, if any.
pub fn find_system_command(full_lower: &str) -> Option<&'static str> {
    SYSTEM_COMMANDS
        .iter()
        .find(|cmd| word_present(full_lower, cmd))
        .copied()
}

/// Returns the network command present at the start of `full_lower` or after a
/// space, if any.
pub fn find_network_command(full_lower: &str) -> Option<&'static str> {
    NETWORK_COMMANDS
        .iter()
        .find(|cmd| word_present(full_lower, cmd))
        .copied()
}

/// Returns the first shell-injection sub-pattern present in `full`, if any.
pub fn find_shell_injection(full: &str) -> Option<&'static str> {
    SHELL_INJECTION_PATTERNS
        .iter()
        .find(|p| full.contains(*p))
        .copied()
}

/// Returns `true` when an environment variable name looks credential-bearing.
pub fn is_sensitive_env_key(key: &str) -> bool {
    let upper = key.to_uppercase();
    SENSITIVE_ENV_KEYS.iter().any(|frag| upper.contains(frag))
}
