//! # agentguard
//!
//! Security policy engine for AI coding agents.
//!
//! `agentguard` sits between an agent and its tool calls. It classifies
//! proposed runtime actions (shell execution, network requests, file
//! operations, secret access, blockchain transactions and signatures) as
//! *allow*, *deny*, or *confirm*, and complements this with a static scanner
//! that grades source trees against a catalog of risky code patterns.
//! Decisions are parameterised by a skill trust registry and a global
//! protection level.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agentguard::{arbiter, engine::ActionScanner, intel::GoPlusClient, registry::TrustRegistry};
//!
//! # async fn example(envelope: agentguard::types::ActionEnvelope) {
//! let registry = Arc::new(TrustRegistry::open("registry.json").await);
//! let intel = Arc::new(GoPlusClient::from_env());
//! let scanner = ActionScanner::new(registry, intel);
//!
//! let decision = scanner.decide(&envelope).await;
//! let verdict = arbiter::arbitrate(&decision, arbiter::ProtectionLevel::Balanced, None);
//! println!("{verdict}");
//! # }
//! ```
//!
//! ## Architecture
//!
//! The crate is organised as a pipeline of small components:
//!
//! 1. **[`patterns`]** — the frozen catalog of secret patterns, command sets,
//!    sensitive paths, and static-scan rules.
//! 2. **[`registry`]** — the skill trust registry consulted for effective
//!    trust and capabilities.
//! 3. **[`detectors`]** — pure per-action-type analysers.
//! 4. **[`intel`]** — the Web3 threat-intelligence client, with offline
//!    degradation.
//! 5. **[`engine`]** — the action scanner combining all of the above into a
//!    [`types::PolicyDecision`].
//! 6. **[`arbiter`]** — maps decisions through the configured protection
//!    level to `allow | deny | ask`.
//! 7. **[`scan`]** — the static source-tree scanner.
//! 8. **[`hook`]**, **[`audit`]**, **[`config`]**, **[`output`]** — transport
//!    contract, audit trail, configuration, and report formatting.

pub mod arbiter;
pub mod audit;
pub mod capability;
pub mod config;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod hook;
pub mod intel;
pub mod output;
pub mod patterns;
pub mod registry;
pub mod scan;
pub mod types;
