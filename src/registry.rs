//! The skill trust registry.
//!
//! An identity-keyed store of trust level and capability records, persisted as
//! a single JSON document (`registry.json`, schema version 1). Records are
//! created by [`attest`](TrustRegistry::attest), transitioned to revoked by
//! [`revoke`](TrustRegistry::revoke), and never destroyed.
//!
//! Writes are serialised through an exclusive lock; lookups take a shared
//! lock and observe the most recent completed write. A failed persist leaves
//! the in-memory state untouched, so callers can retry.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use walkdir::WalkDir;

use crate::capability::Capability;
use crate::error::RegistryError;
use crate::scan::EXCLUDED_DIRS;
use crate::types::SkillIdentity;

/// Current on-disk schema version.
pub const REGISTRY_VERSION: u32 = 1;

/// How far a skill is trusted. Ordered so upgrades can be detected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    Untrusted,
    Restricted,
    Trusted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Revoked,
}

/// Who reviewed the skill and what they concluded.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ReviewMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One attested skill version.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrustRecord {
    pub record_key: String,
    pub skill: SkillIdentity,
    pub trust_level: TrustLevel,
    pub capabilities: Capability,
    pub review: ReviewMetadata,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TrustRecord {
    fn expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|t| t <= now).unwrap_or(false)
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct RegistryDocument {
    version: u32,
    updated_at: DateTime<Utc>,
    records: Vec<TrustRecord>,
}

impl RegistryDocument {
    fn empty() -> Self {
        RegistryDocument {
            version: REGISTRY_VERSION,
            updated_at: Utc::now(),
            records: vec![],
        }
    }
}

/// What [`TrustRegistry::lookup`] hands back. Never an error — unknown skills
/// come back untrusted with the `none` capability preset.
#[derive(Debug, Clone)]
pub struct LookupResult {
    pub record: Option<TrustRecord>,
    pub effective_trust_level: TrustLevel,
    pub effective_capabilities: Capability,
}

impl LookupResult {
    fn untrusted(record: Option<TrustRecord>) -> Self {
        LookupResult {
            record,
            effective_trust_level: TrustLevel::Untrusted,
            effective_capabilities: Capability::none(),
        }
    }
}

/// Input to [`TrustRegistry::attest`].
#[derive(Debug, Clone)]
pub struct AttestRequest {
    pub skill: SkillIdentity,
    pub trust_level: TrustLevel,
    pub capabilities: Capability,
    pub review: ReviewMetadata,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Record selector for [`TrustRegistry::revoke`]. At least one field must be
/// set.
#[derive(Debug, Clone, Default)]
pub struct RevokeMatch {
    pub source: Option<String>,
    pub version_ref: Option<String>,
    pub record_key: Option<String>,
}

impl RevokeMatch {
    fn is_empty(&self) -> bool {
        self.source.is_none() && self.version_ref.is_none() && self.record_key.is_none()
    }

    fn matches(&self, record: &TrustRecord) -> bool {
        if let Some(key) = &self.record_key {
            if &record.record_key != key {
                return false;
            }
        }
        if let Some(source) = &self.source {
            if &record.skill.source != source {
                return false;
            }
        }
        if let Some(version_ref) = &self.version_ref {
            if &record.skill.version_ref != version_ref {
                return false;
            }
        }
        true
    }
}

/// Filters for [`TrustRegistry::list`].
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub trust_level: Option<TrustLevel>,
    pub status: Option<RecordStatus>,
    /// Substring match over the record's source.
    pub source_pattern: Option<String>,
    pub include_expired: bool,
}

/// The registry component. Wraps the JSON document behind a [`RwLock`] so
/// concurrent attests linearise (last writer wins) while lookups stay shared.
pub struct TrustRegistry {
    path: PathBuf,
    read_only: bool,
    state: RwLock<RegistryDocument>,
}

impl TrustRegistry {
    /// Opens (or initialises) the registry at `path`.
    ///
    /// Read problems fail closed: a missing file yields an empty registry, a
    /// corrupt or unknown-version document yields an empty, read-only registry
    /// with a warning.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (doc, read_only) = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<RegistryDocument>(&bytes) {
                Ok(doc) if doc.version == REGISTRY_VERSION => (doc, false),
                Ok(doc) => {
                    tracing::warn!(
                        path = %path.display(),
                        version = doc.version,
                        "unknown registry version; opening read-only"
                    );
                    (doc, true)
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "registry document is corrupt; treating as empty, read-only"
                    );
                    (RegistryDocument::empty(), true)
                }
            },
            Err(_) => (RegistryDocument::empty(), false),
        };

        TrustRegistry {
            path,
            read_only,
            state: RwLock::new(doc),
        }
    }

    /// Looks up a skill. Never fails; revoked and expired records come back as
    /// untrusted with `none` capabilities (the record itself is still
    /// returned for inspection).
    pub async fn lookup(&self, skill: &SkillIdentity) -> LookupResult {
        let key = record_key(skill);
        let doc = self.state.read().await;
        let record = doc.records.iter().find(|r| r.record_key == key).cloned();

        match record {
            None => LookupResult::untrusted(None),
            Some(r) if r.status == RecordStatus::Revoked || r.expired(Utc::now()) => {
                LookupResult::untrusted(Some(r))
            }
            Some(r) => LookupResult {
                effective_trust_level: r.trust_level,
                effective_capabilities: r.capabilities.clone(),
                record: Some(r),
            },
        }
    }

    /// Finds the active, unexpired record for a skill id (used for
    /// initiating-skill attribution, where only the id is known).
    pub async fn lookup_by_skill_id(&self, skill_id: &str) -> Option<TrustRecord> {
        let now = Utc::now();
        let doc = self.state.read().await;
        doc.records
            .iter()
            .find(|r| r.skill.id == skill_id && r.status == RecordStatus::Active && !r.expired(now))
            .cloned()
    }

    /// Creates or updates a trust record.
    ///
    /// Without `force`, two transitions require confirmation: raising the
    /// trust level of an existing active record, and re-activating a revoked
    /// key (revocation is monotonic).
    pub async fn attest(
        &self,
        request: AttestRequest,
        force: bool,
    ) -> Result<TrustRecord, RegistryError> {
        if self.read_only {
            return Err(RegistryError::ReadOnly(REGISTRY_VERSION));
        }

        let key = record_key(&request.skill);
        let now = Utc::now();

        let mut guard = self.state.write().await;
        let mut doc = guard.clone();

        let record = match doc.records.iter_mut().find(|r| r.record_key == key) {
            Some(existing) => {
                if !force {
                    if existing.status == RecordStatus::Revoked {
                        return Err(RegistryError::NeedsConfirmation(format!(
                            "record {key} is revoked; re-attest requires force"
                        )));
                    }
                    if request.trust_level > existing.trust_level {
                        return Err(RegistryError::NeedsConfirmation(format!(
                            "attest raises trust of {key} from {:?} to {:?}; requires force",
                            existing.trust_level, request.trust_level
                        )));
                    }
                }
                existing.skill = request.skill;
                existing.trust_level = request.trust_level;
                existing.capabilities = request.capabilities;
                existing.review = request.review;
                existing.status = RecordStatus::Active;
                existing.updated_at = now;
                existing.expires_at = request.expires_at;
                existing.clone()
            }
            None => {
                let record = TrustRecord {
                    record_key: key.clone(),
                    skill: request.skill,
                    trust_level: request.trust_level,
                    capabilities: request.capabilities,
                    review: request.review,
                    status: RecordStatus::Active,
                    created_at: now,
                    updated_at: now,
                    expires_at: request.expires_at,
                };
                doc.records.push(record.clone());
                record
            }
        };

        doc.updated_at = now;
        self.persist(&doc).await?;
        *guard = doc;

        Ok(record)
    }

    /// Unconditional upsert; never asks for confirmation.
    pub async fn force_attest(&self, request: AttestRequest) -> Result<TrustRecord, RegistryError> {
        self.attest(request, true).await
    }

    /// Revokes every record matching `matcher`. Returns the number of records
    /// transitioned; already-revoked records are not counted.
    pub async fn revoke(
        &self,
        matcher: &RevokeMatch,
        reason: &str,
    ) -> Result<usize, RegistryError> {
        if matcher.is_empty() {
            return Err(RegistryError::InvalidMatch);
        }
        if self.read_only {
            return Err(RegistryError::ReadOnly(REGISTRY_VERSION));
        }

        let now = Utc::now();
        let mut guard = self.state.write().await;
        let mut doc = guard.clone();

        let mut revoked = 0usize;
        for record in doc
            .records
            .iter_mut()
            .filter(|r| r.status == RecordStatus::Active && matcher.matches(r))
        {
            record.status = RecordStatus::Revoked;
            record.updated_at = now;
            let notes = match record.review.notes.take() {
                Some(notes) => format!("{notes}; revoked: {reason}"),
                None => format!("revoked: {reason}"),
            };
            record.review.notes = Some(notes);
            revoked += 1;
        }

        if revoked > 0 {
            doc.updated_at = now;
            self.persist(&doc).await?;
            *guard = doc;
        }

        Ok(revoked)
    }

    /// Lists records matching `filter`. Expired records are excluded unless
    /// `include_expired` is set.
    pub async fn list(&self, filter: &ListFilter) -> Vec<TrustRecord> {
        let now = Utc::now();
        let doc = self.state.read().await;
        doc.records
            .iter()
            .filter(|r| {
                if let Some(level) = filter.trust_level {
                    if r.trust_level != level {
                        return false;
                    }
                }
                if let Some(status) = filter.status {
                    if r.status != status {
                        return false;
                    }
                }
                if let Some(pattern) = &filter.source_pattern {
                    if !r.skill.source.contains(pattern.as_str()) {
                        return false;
                    }
                }
                filter.include_expired || !r.expired(now)
            })
            .cloned()
            .collect()
    }

    /// Writes `doc` to disk. The in-memory state is only replaced after this
    /// succeeds, so a failed write leaves the registry unchanged.
    async fn persist(&self, doc: &RegistryDocument) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(doc)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

/// Derives the stable short key for a skill identity.
///
/// Records with the same `source` and `version_ref` but different artifact
/// hashes get distinct keys.
pub fn record_key(skill: &SkillIdentity) -> String {
    let mut hasher = Sha256::new();
    hasher.update(skill.source.as_bytes());
    hasher.update(b":");
    hasher.update(skill.version_ref.as_bytes());
    hasher.update(b":");
    hasher.update(skill.artifact_hash.as_bytes());
    let digest = hasher.finalize();
    hex_encode(&digest)[..16].to_string()
}

/// Hashes a skill artifact tree.
///
/// Files are walked in sorted relative-path order (excluded directories
/// skipped), each contributing `relative_path \0 sha256(contents)` to an
/// outer hash, so the result is stable across runs and machines.
pub fn calculate_artifact_hash(dir: &Path) -> Result<String, RegistryError> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
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
        .collect();
    files.sort();

    let mut outer = Sha256::new();
    for file in files {
        let rel = file.strip_prefix(dir).unwrap_or(&file);
        let contents = std::fs::read(&file)?;
        let mut inner = Sha256::new();
        inner.update(&contents);

        outer.update(rel.to_string_lossy().replace('\\', "/").as_bytes());
        outer.update(b"\0");
        outer.update(hex_encode(&inner.finalize()).as_bytes());
    }

    Ok(hex_encode(&outer.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
