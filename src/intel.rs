//! Web3 threat-intelligence client.
//!
//! Thin client over three provider endpoints: phishing-site lookup, address
//! reputation, and transaction simulation. The provider is optional by
//! design — when credentials are missing or a call fails or times out, every
//! method returns a neutral result flagged `unavailable` and the engine falls
//! back to rule-based decisioning. **No method ever returns an error.**
//!
//! Credentials come from `GOPLUS_API_KEY` / `GOPLUS_API_SECRET`; the client
//! counts as configured only when both are present.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::RiskLevel;

/// Per-endpoint deadline. A slow provider degrades, it does not stall the
/// evaluation.
const ENDPOINT_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_BASE_URL: &str = "https://api.gopluslabs.io";

/// Result of a phishing-site lookup.
#[derive(Debug, Clone, Default)]
pub struct PhishingCheck {
    pub is_phishing: bool,
    pub unavailable: bool,
}

/// Reputation flags for one address.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressFlags {
    pub is_blacklisted: bool,
    pub is_phishing_activities: bool,
    pub is_stealing_attack: bool,
    pub is_honeypot_related_address: bool,
}

impl AddressFlags {
    /// Any flag that warrants an outright deny.
    pub fn is_malicious(&self) -> bool {
        self.is_blacklisted || self.is_phishing_activities || self.is_stealing_attack
    }
}

/// Reputation report keyed by address.
#[derive(Debug, Clone, Default)]
pub struct AddressReport {
    pub flags: HashMap<String, AddressFlags>,
    pub unavailable: bool,
}

/// Transaction to simulate.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SimulationRequest {
    pub chain_id: String,
    pub from: String,
    pub to: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Simulated balance movement.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceChange {
    pub token: String,
    pub amount: String,
}

/// Simulated approval change.
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalChange {
    pub token: String,
    pub spender: String,
    pub amount: String,
    #[serde(default)]
    pub is_unlimited: bool,
}

/// Outcome of a transaction simulation.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub success: bool,
    pub balance_changes: Vec<BalanceChange>,
    pub approval_changes: Vec<ApprovalChange>,
    pub risk_tags: Vec<String>,
    pub risk_level: RiskLevel,
    pub error_message: Option<String>,
    pub unavailable: bool,
}

impl SimulationResult {
    fn unavailable() -> Self {
        SimulationResult {
            success: false,
            balance_changes: vec![],
            approval_changes: vec![],
            risk_tags: vec![],
            risk_level: RiskLevel::Low,
            error_message: None,
            unavailable: true,
        }
    }
}

/// The provider interface the engine consumes. Implemented by
/// [`GoPlusClient`]; tests substitute stubs.
#[async_trait]
pub trait ThreatIntel: Send + Sync {
    /// `true` when the provider has credentials and calls will be attempted.
    fn is_configured(&self) -> bool;

    async fn phishing_site(&self, url: &str) -> PhishingCheck;

    async fn address_security(&self, chain_id: &str, addresses: &[String]) -> AddressReport;

    async fn simulate_transaction(&self, request: &SimulationRequest) -> SimulationResult;
}

// Wire format: `{code, message, result}` with "0"/"1" string flags.

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[allow(dead_code)]
    message: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PhishingResult {
    phishing_site: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct AddressSecurityResult {
    #[serde(default)]
    blacklist_doubt: Option<String>,
    #[serde(default)]
    phishing_activities: Option<String>,
    #[serde(default)]
    stealing_attack: Option<String>,
    #[serde(default)]
    honeypot_related_address: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    value.as_deref() == Some("1")
}

#[derive(Debug, Deserialize)]
struct SimulationWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    balance_changes: Vec<BalanceChange>,
    #[serde(default)]
    approval_changes: Vec<ApprovalChange>,
    #[serde(default)]
    risk_tags: Vec<String>,
    #[serde(default)]
    risk_level: Option<RiskLevel>,
    #[serde(default)]
    error_message: Option<String>,
}

/// HTTP client for the GoPlus security API.
pub struct GoPlusClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl GoPlusClient {
    /// Builds a client from `GOPLUS_API_KEY` / `GOPLUS_API_SECRET`. Missing
    /// credentials are legal — the client reports unconfigured and degrades.
    pub fn from_env() -> Self {
        let credentials = match (
            std::env::var("GOPLUS_API_KEY"),
            std::env::var("GOPLUS_API_SECRET"),
        ) {
            (Ok(key), Ok(secret)) if !key.is_empty() && !secret.is_empty() => Some((key, secret)),
            _ => None,
        };
        Self::new(DEFAULT_BASE_URL, credentials)
    }

    /// Builds a client against an explicit base URL (test servers).
    pub fn new(base_url: &str, credentials: Option<(String, String)>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(ENDPOINT_TIMEOUT)
            .build()
            .unwrap_or_default();
        GoPlusClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, format!("{}{path}", self.base_url));
        if let Some((key, _)) = &self.credentials {
            builder = builder.header("Authorization", key.clone());
        }
        builder
    }
}

#[async_trait]
impl ThreatIntel for GoPlusClient {
    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn phishing_site(&self, url: &str) -> PhishingCheck {
        if !self.is_configured() {
            return PhishingCheck {
                is_phishing: false,
                unavailable: true,
            };
        }

        let response = self
            .request(reqwest::Method::GET, "/api/v1/phishing_site")
            .query(&[("url", url)])
            .send()
            .await;

        match parse_envelope::<PhishingResult>(response).await {
            Some(result) => PhishingCheck {
                is_phishing: result
                    .phishing_site
                    .map(|v| v == serde_json::json!(1) || v == serde_json::json!("1"))
                    .unwrap_or(false),
                unavailable: false,
            },
            None => PhishingCheck {
                is_phishing: false,
                unavailable: true,
            },
        }
    }

    async fn address_security(&self, chain_id: &str, addresses: &[String]) -> AddressReport {
        if !self.is_configured() {
            return AddressReport {
                flags: HashMap::new(),
                unavailable: true,
            };
        }

        let mut flags = HashMap::new();
        for address in addresses {
            let response = self
                .request(
                    reqwest::Method::GET,
                    &format!("/api/v1/address_security/{address}"),
                )
                .query(&[("chain_id", chain_id)])
                .send()
                .await;

            match parse_envelope::<AddressSecurityResult>(response).await {
                Some(result) => {
                    flags.insert(
                        address.clone(),
                        AddressFlags {
                            is_blacklisted: flag(&result.blacklist_doubt),
                            is_phishing_activities: flag(&result.phishing_activities),
                            is_stealing_attack: flag(&result.stealing_attack),
                            is_honeypot_related_address: flag(&result.honeypot_related_address),
                        },
                    );
                }
                // One failed address degrades the whole report; a partial
                // reputation map would read as a clean bill for the missing
                // addresses.
                None => {
                    return AddressReport {
                        flags: HashMap::new(),
                        unavailable: true,
                    }
                }
            }
        }

        AddressReport {
            flags,
            unavailable: false,
        }
    }

    async fn simulate_transaction(&self, request: &SimulationRequest) -> SimulationResult {
        if !self.is_configured() {
            return SimulationResult::unavailable();
        }

        let response = self
            .request(reqwest::Method::POST, "/api/v1/transaction_simulation")
            .json(request)
            .send()
            .await;

        match parse_envelope::<SimulationWire>(response).await {
            Some(wire) => SimulationResult {
                success: wire.success,
                balance_changes: wire.balance_changes,
                approval_changes: wire.approval_changes,
                risk_tags: wire.risk_tags,
                risk_level: wire.risk_level.unwrap_or(RiskLevel::Low),
                error_message: wire.error_message,
                unavailable: false,
            },
            None => SimulationResult::unavailable(),
        }
    }
}

/// Unwraps `{code: 1, result}` responses; anything else (transport error,
/// non-2xx, provider error code, parse failure) becomes `None`.
async fn parse_envelope<T: serde::de::DeserializeOwned>(
    response: Result<reqwest::Response, reqwest::Error>,
) -> Option<T> {
    let response = match response {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, "threat intel transport error");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(status = %response.status(), "threat intel non-success status");
        return None;
    }

    match response.json::<ApiEnvelope<T>>().await {
        Ok(envelope) if envelope.code == 1 => envelope.result,
        Ok(envelope) => {
            tracing::debug!(code = envelope.code, "threat intel provider error code");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "threat intel response parse error");
            None
        }
    }
}
