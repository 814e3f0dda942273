//! Sensitive filesystem paths, webhook/exfil domains, and high-risk TLDs.

/// Credential and key material paths. Writes to any of these short-circuit the
/// action scanner before capability checks run.
pub static SENSITIVE_PATHS: &[&str] = &[
    ".env",
    ".env.local",
    ".env.production",
    ".ssh/",
    "id_rsa",
    "id_ed25519",
    ".aws/credentials",
    ".aws/config",
    ".npmrc",
    ".netrc",
    "credentials.json",
    "serviceAccountKey.json",
    ".kube/config",
];

/// Domains commonly used as exfiltration drop-boxes.
pub static WEBHOOK_DOMAINS: &[&str] = &[
    "discord.com",
    "discordapp.com",
    "api.telegram.org",
    "hooks.slack.com",
    "webhook.site",
    "requestbin.com",
    "pipedream.com",
    "ngrok.io",
    "ngrok-free.app",
    "beeceptor.com",
    "mockbin.org",
];

/// TLDs with disproportionate abuse rates.
pub static HIGH_RISK_TLDS: &[&str] = &[
    ".xyz", ".top", ".tk", ".ml", ".ga", ".cf", ".gq", ".work", ".click", ".link",
];

/// Returns the sensitive-path entry matching `path`, if any.
///
/// Backslashes are normalised to slashes; an entry matches as a suffix or as a
/// `/entry` containment, so both `project/.env` and `/home/u/.ssh/id_rsa` hit.
pub fn find_sensitive_path(path: &str) -> Option<&'static str> {
    let normalized = path.replace('\\', "/");
    SENSITIVE_PATHS.iter().copied().find(|entry| {
        normalized.ends_with(entry) || normalized.contains(&format!("/{entry}"))
    })
}

/// Returns `true` when `path` matches the sensitive-path set.
pub fn is_sensitive_path(path: &str) -> bool {
    find_sensitive_path(path).is_some()
}

/// Returns `true` when `host` is a known webhook/exfil domain or a subdomain
/// of one.
pub fn is_webhook_domain(host: &str) -> bool {
    let host = host.to_lowercase();
    WEBHOOK_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

/// Returns `true` when `host` ends in a high-risk TLD.
pub fn has_high_risk_tld(host: &str) -> bool {
    let host = host.to_lowercase();
    HIGH_RISK_TLDS.iter().any(|tld| host.ends_with(tld))
}
