//! The action scanner.
//!
//! [`ActionScanner::decide`] is the single entry point for runtime policy
//! evaluation. It looks the actor up in the trust registry, short-circuits
//! sensitive-path writes, dispatches to the per-type detector, runs the Web3
//! threat-intel fan-out where applicable, applies the untrusted-skill overlay,
//! and always terminates in a [`PolicyDecision`] — this component never
//! raises.

use std::sync::Arc;

use crate::capability::{Capability, CapabilityView};
use crate::detectors::{exec, file, network, secret, web3, Analysis};
use crate::intel::{SimulationRequest, ThreatIntel};
use crate::patterns::paths;
use crate::registry::TrustRegistry;
use crate::types::{
    Action, ActionEnvelope, Decision, Evidence, PolicyDecision, RiskLevel,
};

/// Evaluates action envelopes against the registry, the detectors, and the
/// threat-intel provider.
pub struct ActionScanner {
    registry: Arc<TrustRegistry>,
    intel: Arc<dyn ThreatIntel>,
}

impl ActionScanner {
    pub fn new(registry: Arc<TrustRegistry>, intel: Arc<dyn ThreatIntel>) -> Self {
        ActionScanner { registry, intel }
    }

    /// Evaluates one envelope. Every path returns a decision; nothing here
    /// errors.
    pub async fn decide(&self, envelope: &ActionEnvelope) -> PolicyDecision {
        let lookup = self.registry.lookup(&envelope.actor.skill).await;
        let capabilities = lookup.effective_capabilities;

        tracing::debug!(
            skill = %envelope.actor.skill.id,
            action = envelope.action.kind(),
            trust = ?lookup.effective_trust_level,
            "evaluating action"
        );

        // Sensitive-path writes are decided before capabilities or detectors
        // get a say, so a misconfigured allowlist cannot open them up.
        if let Action::WriteFile { path } = &envelope.action {
            if let Some(entry) = paths::find_sensitive_path(path) {
                let mut decision = PolicyDecision {
                    decision: Decision::Deny,
                    risk_level: RiskLevel::Critical,
                    risk_tags: vec!["SENSITIVE_PATH".to_string()],
                    evidence: vec![Evidence::new(
                        "SENSITIVE_PATH",
                        format!("write to protected path ({entry})"),
                    )
                    .with_field("path")
                    .with_match(path.as_str())],
                    explanation: String::new(),
                    effective_capabilities: Some(capabilities),
                };
                decision.explanation = build_explanation(
                    "Write to a sensitive path",
                    &decision.risk_tags,
                    envelope.context.initiating_skill.as_deref(),
                );
                return decision;
            }
        }

        let analysis = match &envelope.action {
            Action::ExecCommand {
                command, args, env, ..
            } => exec::analyze(command, args.as_deref(), env.as_ref(), &capabilities),
            Action::NetworkRequest {
                method,
                url,
                body_preview,
                ..
            } => network::analyze(method, url, body_preview.as_deref(), &capabilities),
            Action::ReadFile { path } => file::analyze(path, file::FileOp::Read, &capabilities),
            Action::WriteFile { path } => file::analyze(path, file::FileOp::Write, &capabilities),
            Action::SecretAccess {
                secret_name,
                access_type,
            } => secret::analyze(secret_name, access_type, &capabilities),
            Action::Web3Tx {
                chain_id,
                from,
                to,
                value,
                data,
                origin,
            } => {
                self.analyze_web3_tx(
                    envelope,
                    &capabilities,
                    chain_id,
                    from,
                    to,
                    value,
                    data.as_deref(),
                    origin.as_deref(),
                )
                .await
            }
            Action::Web3Sign {
                chain_id,
                message,
                typed_data,
                origin,
            } => {
                self.analyze_web3_sign(
                    envelope,
                    &capabilities,
                    chain_id,
                    message.as_deref(),
                    typed_data.as_deref(),
                    origin.as_deref(),
                )
                .await
            }
        };

        let block_reason = analysis.block_reason.clone();
        let mut decision = combine(&envelope.action, analysis);

        self.apply_skill_overlay(envelope, &mut decision).await;

        let driver = decision
            .evidence
            .first()
            .map(|e| e.description.clone())
            .or(block_reason)
            .unwrap_or_else(|| "Policy evaluation".to_string());
        decision.explanation = build_explanation(
            &driver,
            &decision.risk_tags,
            envelope.context.initiating_skill.as_deref(),
        );
        if decision.decision == Decision::Allow {
            decision.explanation.clear();
            decision.effective_capabilities = None;
        } else if decision.effective_capabilities.is_none() {
            decision.effective_capabilities = Some(capabilities);
        }

        decision
    }

    /// Panic-isolated variant of [`decide`](Self::decide): an internal error
    /// becomes a deny tagged `ENGINE_ERROR` instead of a crash.
    pub async fn decide_guarded(self: Arc<Self>, envelope: &ActionEnvelope) -> PolicyDecision {
        let scanner = self;
        let envelope = envelope.clone();
        match tokio::spawn(async move { scanner.decide(&envelope).await }).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::error!(error = %e, "policy evaluation failed internally");
                PolicyDecision {
                    decision: Decision::Deny,
                    risk_level: RiskLevel::High,
                    risk_tags: vec!["ENGINE_ERROR".to_string()],
                    evidence: vec![Evidence::new(
                        "ENGINE_ERROR",
                        "internal evaluation error; failing closed",
                    )],
                    explanation: "Internal evaluation error [ENGINE_ERROR]".to_string(),
                    effective_capabilities: None,
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn analyze_web3_tx(
        &self,
        envelope: &ActionEnvelope,
        capabilities: &Capability,
        chain_id: &str,
        from: &str,
        to: &str,
        value: &str,
        data: Option<&str>,
        origin: Option<&str>,
    ) -> Analysis {
        let mut analysis = web3::analyze_tx(chain_id, capabilities);
        if analysis.forced_decision == Some(Decision::Deny) {
            return analysis;
        }

        let request = SimulationRequest {
            chain_id: chain_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            value: value.to_string(),
            data: data.map(str::to_string),
        };
        let targets = vec![to.to_string()];

        // All three provider calls go out together; combination below applies
        // them in severity order once everything has settled.
        let (phishing, addresses, simulation) = tokio::join!(
            async {
                match origin {
                    Some(origin) => Some(self.intel.phishing_site(origin).await),
                    None => None,
                }
            },
            self.intel.address_security(chain_id, &targets),
            self.intel.simulate_transaction(&request),
        );

        let mut unavailable = simulation.unavailable || addresses.unavailable;

        if let Some(phishing) = phishing {
            unavailable |= phishing.unavailable;
            if phishing.is_phishing {
                analysis.lift(RiskLevel::Critical);
                analysis.tag(
                    "PHISHING_ORIGIN",
                    Evidence::new("PHISHING_ORIGIN", "transaction origin is a known phishing site")
                        .with_field("origin")
                        .with_match(origin.unwrap_or_default()),
                );
                analysis.block("Transaction originates from a phishing site");
                analysis.forced_decision = Some(Decision::Deny);
                return self.finish_web3(envelope, capabilities, analysis, unavailable);
            }
        }

        if let Some(flags) = addresses.flags.get(to) {
            if flags.is_malicious() {
                analysis.lift(RiskLevel::Critical);
                analysis.tag(
                    "MALICIOUS_ADDRESS",
                    Evidence::new("MALICIOUS_ADDRESS", "target address has malicious reputation")
                        .with_field("to")
                        .with_match(to),
                );
                analysis.block("Target address is flagged malicious");
                analysis.forced_decision = Some(Decision::Deny);
                return self.finish_web3(envelope, capabilities, analysis, unavailable);
            }
            if flags.is_honeypot_related_address {
                analysis.lift(RiskLevel::High);
                analysis.tag(
                    "HONEYPOT_RELATED",
                    Evidence::new("HONEYPOT_RELATED", "target address is honeypot-related")
                        .with_field("to")
                        .with_match(to),
                );
            }
        }

        if !simulation.unavailable {
            if simulation.approval_changes.iter().any(|a| a.is_unlimited) {
                analysis.lift(RiskLevel::High);
                analysis.tag(
                    "UNLIMITED_APPROVAL",
                    Evidence::new(
                        "UNLIMITED_APPROVAL",
                        "simulation shows an unlimited token approval",
                    )
                    .with_field("data"),
                );
                if analysis.forced_decision.is_none() {
                    analysis.forced_decision = Some(Decision::Confirm);
                }
            }
            for tag in &simulation.risk_tags {
                analysis.tag(
                    tag,
                    Evidence::new(tag, "reported by transaction simulation").with_field("data"),
                );
            }
            if simulation.risk_level >= RiskLevel::High {
                analysis.lift(simulation.risk_level);
            }
        }

        self.finish_web3(envelope, capabilities, analysis, unavailable)
    }

    async fn analyze_web3_sign(
        &self,
        envelope: &ActionEnvelope,
        capabilities: &Capability,
        chain_id: &str,
        message: Option<&str>,
        typed_data: Option<&str>,
        origin: Option<&str>,
    ) -> Analysis {
        let mut analysis = web3::analyze_sign(chain_id, message, typed_data, capabilities);
        if analysis.forced_decision == Some(Decision::Deny) {
            return analysis;
        }

        let mut unavailable = false;
        if let Some(origin) = origin {
            let phishing = self.intel.phishing_site(origin).await;
            unavailable = phishing.unavailable;
            if phishing.is_phishing {
                analysis.lift(RiskLevel::Critical);
                analysis.tag(
                    "PHISHING_ORIGIN",
                    Evidence::new("PHISHING_ORIGIN", "signature request from a phishing site")
                        .with_field("origin")
                        .with_match(origin),
                );
                analysis.block("Signature requested by a phishing site");
                analysis.forced_decision = Some(Decision::Deny);
            }
        }

        self.finish_web3(envelope, capabilities, analysis, unavailable)
    }

    /// Applies the tx policy, the unavailability tag, and the user-presence
    /// upgrade — the steps shared by both Web3 action types.
    fn finish_web3(
        &self,
        envelope: &ActionEnvelope,
        capabilities: &Capability,
        mut analysis: Analysis,
        intel_unavailable: bool,
    ) -> Analysis {
        if intel_unavailable {
            analysis.tag(
                "SIMULATION_UNAVAILABLE",
                Evidence::new(
                    "SIMULATION_UNAVAILABLE",
                    "threat intelligence unavailable; rule-based evaluation only",
                ),
            );
        }

        if let Some(web3) = &capabilities.web3 {
            match web3.tx_policy {
                crate::capability::TxPolicy::Deny => {
                    analysis.lift(RiskLevel::High);
                    analysis.evidence.push(Evidence::new(
                        "tx_policy",
                        "capability transaction policy is deny",
                    ));
                    analysis.block("Transactions are denied by capability policy");
                    analysis.forced_decision = Some(Decision::Deny);
                }
                crate::capability::TxPolicy::ConfirmHighRisk => {
                    if analysis.risk_level > RiskLevel::Low
                        && analysis.forced_decision.is_none()
                        && !analysis.should_block
                    {
                        analysis.forced_decision = Some(Decision::Confirm);
                    }
                }
                crate::capability::TxPolicy::Allow => {}
            }
        }

        // Confirmation needs someone to confirm. Headless sessions fail
        // closed instead.
        if !envelope.context.user_present {
            let will_confirm = analysis.forced_decision == Some(Decision::Confirm)
                || (analysis.should_block && analysis.risk_level < RiskLevel::Critical);
            if will_confirm {
                analysis.tag(
                    "user_not_present",
                    Evidence::new("user_not_present", "no user available to confirm; denying"),
                );
                analysis.forced_decision = Some(Decision::Deny);
            }
        }

        analysis
    }

    /// The initiating-skill overlay: an unregistered skill driving this action
    /// downgrades to ask; a registered skill acting outside its capabilities
    /// is denied.
    async fn apply_skill_overlay(&self, envelope: &ActionEnvelope, decision: &mut PolicyDecision) {
        let Some(skill_id) = envelope.context.initiating_skill.as_deref() else {
            return;
        };
        if decision.decision == Decision::Deny {
            return;
        }

        match self.registry.lookup_by_skill_id(skill_id).await {
            None => {
                let view = CapabilityView::untrusted();
                if !view_allows(&view, &envelope.action) {
                    decision.decision = Decision::Confirm;
                    if RiskLevel::High > decision.risk_level {
                        decision.risk_level = RiskLevel::High;
                    }
                    push_tag(decision, "UNTRUSTED_SKILL");
                    decision.evidence.insert(
                        0,
                        Evidence::new(
                            "UNTRUSTED_SKILL",
                            format!("skill {skill_id} has no trust record"),
                        ),
                    );
                }
            }
            Some(record) => {
                let view = record.capabilities.view();
                if !view_allows(&view, &envelope.action) {
                    decision.decision = Decision::Deny;
                    if RiskLevel::High > decision.risk_level {
                        decision.risk_level = RiskLevel::High;
                    }
                    push_tag(decision, "CAPABILITY_EXCEEDED");
                    decision.evidence.insert(
                        0,
                        Evidence::new(
                            "CAPABILITY_EXCEEDED",
                            format!(
                                "skill {skill_id} is not granted {} capability",
                                envelope.action.kind()
                            ),
                        ),
                    );
                }
            }
        }
    }
}

fn push_tag(decision: &mut PolicyDecision, tag: &str) {
    if !decision.risk_tags.iter().any(|t| t == tag) {
        decision.risk_tags.insert(0, tag.to_string());
    }
}

fn view_allows(view: &CapabilityView, action: &Action) -> bool {
    match action {
        Action::ExecCommand { .. } => view.can_exec,
        Action::NetworkRequest { .. } => view.can_network,
        Action::ReadFile { .. } => view.can_read,
        Action::WriteFile { .. } => view.can_write,
        // Secret access is write-level privilege; the synthetic read-only
        // view never grants it.
        Action::SecretAccess { .. } => view.can_write,
        Action::Web3Tx { .. } | Action::Web3Sign { .. } => view.can_web3,
    }
}

/// Folds a detector analysis into a decision.
fn combine(action: &Action, analysis: Analysis) -> PolicyDecision {
    let network_facing = matches!(
        action,
        Action::NetworkRequest { .. } | Action::Web3Tx { .. } | Action::Web3Sign { .. }
    );

    let decision = if let Some(forced) = analysis.forced_decision {
        forced
    } else if analysis.should_block {
        if analysis.risk_level == RiskLevel::Critical {
            Decision::Deny
        } else {
            Decision::Confirm
        }
    } else if network_facing && analysis.risk_level >= RiskLevel::High {
        Decision::Confirm
    } else {
        Decision::Allow
    };

    PolicyDecision {
        decision,
        risk_level: analysis.risk_level,
        risk_tags: analysis.risk_tags,
        evidence: analysis.evidence,
        explanation: String::new(),
        effective_capabilities: None,
    }
}

/// Decision for an envelope that could not be parsed at all.
pub fn invalid_input(reason: &str) -> PolicyDecision {
    PolicyDecision {
        decision: Decision::Deny,
        risk_level: RiskLevel::High,
        risk_tags: vec!["INVALID_INPUT".to_string()],
        evidence: vec![Evidence::new("INVALID_INPUT", reason.to_string())],
        explanation: format!("Malformed action envelope [INVALID_INPUT]: {reason}"),
        effective_capabilities: None,
    }
}

fn build_explanation(driver: &str, tags: &[String], initiating_skill: Option<&str>) -> String {
    let mut explanation = driver.to_string();
    if !tags.is_empty() {
        explanation.push_str(&format!(" [{}]", tags.join(", ")));
    }
    if let Some(skill) = initiating_skill {
        explanation.push_str(&format!(" (initiated by skill {skill})"));
    }
    explanation
}
