//! Capability records, named presets, and allowlist matching.
//!
//! A [`Capability`] describes what a skill may do: which hosts it may call,
//! which paths it may touch, whether it may execute commands, which secrets it
//! may read, and (optionally) a Web3 sub-policy. Allowlist entries are
//! glob-like patterns where `*` matches a single segment and `**` matches any
//! suffix.
//!
//! The derived boolean view ([`CapabilityView`]) is computed on demand — it is
//! never stored alongside the structured record.

use std::fmt;

/// Whether a skill may spawn processes at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecPolicy {
    Allow,
    Deny,
}

/// Transaction posture for the Web3 sub-policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxPolicy {
    Allow,
    ConfirmHighRisk,
    Deny,
}

/// Optional Web3 block of a capability record.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Web3Capability {
    /// Chain ids the skill may transact on (e.g., `"1"` for Ethereum mainnet).
    pub chains_allowlist: Vec<String>,
    /// RPC endpoints the skill may talk to.
    pub rpc_allowlist: Vec<String>,
    pub tx_policy: TxPolicy,
}

/// The set of operations a skill may perform.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Capability {
    /// Host patterns the skill may contact (`"api.github.com"`, `"*.npmjs.org"`).
    pub network_allowlist: Vec<String>,
    /// Path patterns the skill may read and write.
    pub filesystem_allowlist: Vec<String>,
    pub exec: ExecPolicy,
    /// Secret names the skill may access.
    pub secrets_allowlist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web3: Option<Web3Capability>,
}

impl Capability {
    /// The `none` preset: no network, no filesystem, no exec, no secrets.
    ///
    /// This is what unknown, revoked, and expired skills get.
    pub fn none() -> Self {
        Capability {
            network_allowlist: vec![],
            filesystem_allowlist: vec![],
            exec: ExecPolicy::Deny,
            secrets_allowlist: vec![],
            web3: None,
        }
    }

    /// The `read_only` preset: full filesystem visibility, nothing else.
    pub fn read_only() -> Self {
        Capability {
            network_allowlist: vec![],
            filesystem_allowlist: vec!["**".to_string()],
            exec: ExecPolicy::Deny,
            secrets_allowlist: vec![],
            web3: None,
        }
    }

    /// The `trading_bot` preset: exchange APIs, a local data directory, and
    /// confirm-gated transactions on major chains.
    pub fn trading_bot() -> Self {
        Capability {
            network_allowlist: vec![
                "api.binance.com".to_string(),
                "api.coinbase.com".to_string(),
                "api.kraken.com".to_string(),
                "*.coingecko.com".to_string(),
            ],
            filesystem_allowlist: vec!["./data/**".to_string()],
            exec: ExecPolicy::Deny,
            secrets_allowlist: vec![],
            web3: Some(Web3Capability {
                chains_allowlist: vec!["1".to_string(), "56".to_string(), "8453".to_string()],
                rpc_allowlist: vec![],
                tx_policy: TxPolicy::ConfirmHighRisk,
            }),
        }
    }

    /// The `defi` preset: RPC infrastructure hosts and confirm-gated
    /// transactions on the common EVM chains.
    pub fn defi() -> Self {
        Capability {
            network_allowlist: vec![
                "*.infura.io".to_string(),
                "*.alchemy.com".to_string(),
                "*.llamarpc.com".to_string(),
            ],
            filesystem_allowlist: vec!["./data/**".to_string()],
            exec: ExecPolicy::Deny,
            secrets_allowlist: vec![],
            web3: Some(Web3Capability {
                chains_allowlist: vec![
                    "1".to_string(),
                    "10".to_string(),
                    "137".to_string(),
                    "42161".to_string(),
                    "8453".to_string(),
                ],
                rpc_allowlist: vec![],
                tx_policy: TxPolicy::ConfirmHighRisk,
            }),
        }
    }

    /// Resolves a named preset. Unknown names return `None`.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::none()),
            "read_only" => Some(Self::read_only()),
            "trading_bot" => Some(Self::trading_bot()),
            "defi" => Some(Self::defi()),
            _ => None,
        }
    }

    /// Computes the boolean view used by the untrusted-skill overlay.
    pub fn view(&self) -> CapabilityView {
        CapabilityView {
            can_exec: self.exec == ExecPolicy::Allow,
            can_network: !self.network_allowlist.is_empty(),
            can_write: !self.filesystem_allowlist.is_empty(),
            can_read: true,
            can_web3: self.web3.is_some(),
        }
    }
}

impl Default for Capability {
    fn default() -> Self {
        Capability::none()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "net:{} fs:{} exec:{} secrets:{} web3:{}",
            self.network_allowlist.len(),
            self.filesystem_allowlist.len(),
            if self.exec == ExecPolicy::Allow { "allow" } else { "deny" },
            self.secrets_allowlist.len(),
            self.web3.is_some(),
        )
    }
}

/// Derived booleans over a [`Capability`], one per action family.
///
/// Computed on demand via [`Capability::view`]; the synthetic set applied to
/// unregistered initiating skills is [`CapabilityView::untrusted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityView {
    pub can_exec: bool,
    pub can_network: bool,
    pub can_write: bool,
    pub can_read: bool,
    pub can_web3: bool,
}

impl CapabilityView {
    /// Read-only synthetic view for skills with no registry record.
    pub fn untrusted() -> Self {
        CapabilityView {
            can_exec: false,
            can_network: false,
            can_write: false,
            can_read: true,
            can_web3: false,
        }
    }
}

/// Matches a single `*`-bearing glob segment against a value segment.
///
/// `*` matches any run of characters within the segment (it never crosses the
/// separator — the caller splits on separators first).
fn segment_match(pattern: &str, value: &str) -> bool {
    // Iterative wildcard match with single-star backtracking.
    let p: Vec<char> = pattern.chars().collect();
    let v: Vec<char> = value.chars().collect();
    let (mut pi, mut vi) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while vi < v.len() {
        if pi < p.len() && (p[pi] == v[vi]) {
            pi += 1;
            vi += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, vi));
            pi += 1;
        } else if let Some((sp, sv)) = star {
            // Let the last star absorb one more character and retry.
            pi = sp + 1;
            vi = sv + 1;
            star = Some((sp, sv + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

/// Matches a glob pattern against a value, splitting both on `sep`.
///
/// - `**` as a pattern segment matches the entire remaining suffix.
/// - `*` within a segment matches any run of non-separator characters.
/// - A pattern with no wildcard must match exactly.
pub fn glob_match_with(pattern: &str, value: &str, sep: char) -> bool {
    let p_segs: Vec<&str> = pattern.split(sep).collect();
    let v_segs: Vec<&str> = value.split(sep).collect();

    let mut vi = 0usize;
    for (i, pseg) in p_segs.iter().enumerate() {
        if *pseg == "**" {
            // `**` at the end of the pattern swallows everything that remains,
            // including an empty remainder.
            return i == p_segs.len() - 1
                || (vi..=v_segs.len()).any(|skip| {
                    glob_match_with(
                        &p_segs[i + 1..].join(&sep.to_string()),
                        &v_segs[skip..].join(&sep.to_string()),
                        sep,
                    )
                });
        }
        if vi >= v_segs.len() || !segment_match(pseg, v_segs[vi]) {
            return false;
        }
        vi += 1;
    }
    vi == v_segs.len()
}

/// Path-style glob match (`/`-separated).
pub fn glob_match(pattern: &str, value: &str) -> bool {
    glob_match_with(pattern, value, '/')
}

/// Checks a filesystem path against an allowlist.
///
/// A bare (wildcard-free) entry matches the path exactly or as a prefix
/// followed by `/`. Backslashes in the candidate path are normalised to `/`
/// before matching.
pub fn path_allowed(allowlist: &[String], path: &str) -> bool {
    let normalized = path.replace('\\', "/");
    allowlist.iter().any(|entry| {
        if entry.contains('*') {
            glob_match(entry, &normalized)
        } else {
            normalized == *entry || normalized.starts_with(&format!("{entry}/"))
        }
    })
}

/// Checks a hostname against an allowlist (`.`-separated glob segments, so
/// `*.example.com` matches `api.example.com` but not `example.com` itself).
pub fn host_allowed(allowlist: &[String], host: &str) -> bool {
    let host = host.to_lowercase();
    allowlist.iter().any(|entry| {
        let entry = entry.to_lowercase();
        if entry.contains('*') {
            glob_match_with(&entry, &host, '.')
        } else {
            host == entry
        }
    })
}
