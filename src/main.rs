mod cli;

use std::io::Read;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;

use agentguard::audit::{AuditEntry, AuditLog};
use agentguard::engine::{self, ActionScanner};
use agentguard::intel::GoPlusClient;
use agentguard::registry::{
    calculate_artifact_hash, AttestRequest, ListFilter, RevokeMatch, ReviewMetadata, TrustRegistry,
};
use agentguard::types::{ActionEnvelope, SkillIdentity};
use agentguard::{arbiter, capability, config, hook, output, patterns, scan};
use cli::{Cli, Commands, RegistryCommands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            path,
            format,
            output: output_path,
            quick,
        } => {
            let options = scan::ScanOptions { quick };
            let report = match scan::scan_dir_with(&path, options, None) {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(2);
                }
            };

            let formatted = output::format_report(&report, &format);
            if let Some(out_path) = output_path {
                std::fs::write(&out_path, &formatted).unwrap_or_else(|e| {
                    eprintln!("Error writing output: {e}");
                    std::process::exit(2);
                });
                eprintln!("Output written to {}", out_path.display());
            } else {
                print!("{formatted}");
            }

            let failed = report.risk_level >= agentguard::types::RiskLevel::High;
            std::process::exit(if failed { 1 } else { 0 });
        }

        Commands::Hook { level } => {
            let home = config::state_home();
            let guard_config = config::GuardConfig::load(&home).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(2);
            });
            let level = level.unwrap_or(guard_config.level);

            let mut raw = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
                eprintln!("Error reading stdin: {e}");
                std::process::exit(2);
            }

            let registry = Arc::new(TrustRegistry::open(config::registry_path(&home)).await);
            let intel = Arc::new(GoPlusClient::from_env());
            let scanner = Arc::new(ActionScanner::new(registry, intel));
            let audit_log = AuditLog::new(config::audit_log_path(&home));

            let (decision, envelope) = match serde_json::from_str::<ActionEnvelope>(&raw) {
                Ok(envelope) => {
                    let decision = Arc::clone(&scanner).decide_guarded(&envelope).await;
                    (decision, Some(envelope))
                }
                Err(e) => (engine::invalid_input(&e.to_string()), None),
            };

            let initiating = envelope
                .as_ref()
                .and_then(|e| e.context.initiating_skill.clone());
            let tool_name = envelope
                .as_ref()
                .map(|e| e.action.kind().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let tool_input = envelope
                .as_ref()
                .and_then(|e| serde_json::to_value(&e.action).ok())
                .unwrap_or(serde_json::Value::Null);

            audit_log
                .record(&AuditEntry::from_decision(
                    &tool_name,
                    &tool_input,
                    &decision,
                    initiating.as_deref(),
                ))
                .await;

            let verdict = arbiter::arbitrate(&decision, level, initiating.as_deref());
            let outcome = hook::hook_outcome(verdict, &decision.explanation);
            if let Some(stdout) = outcome.stdout {
                println!("{stdout}");
            }
            if let Some(stderr) = outcome.stderr {
                eprintln!("{stderr}");
            }
            std::process::exit(outcome.exit_code);
        }

        Commands::Registry(command) => {
            let home = config::state_home();
            let registry = TrustRegistry::open(config::registry_path(&home)).await;
            run_registry_command(&registry, command).await;
        }

        Commands::ListRules => {
            println!("{}", "Static Scan Rules".bold().underline());
            println!();

            let mut current_category = String::new();
            for rule in patterns::rules::rules() {
                let category = rule.category.to_string();
                if category != current_category {
                    if !current_category.is_empty() {
                        println!();
                    }
                    println!("  {}", category.bold());
                    current_category = category;
                }

                let severity = match rule.severity {
                    agentguard::types::RiskLevel::Low => "  low".blue().to_string(),
                    agentguard::types::RiskLevel::Medium => "  med".yellow().to_string(),
                    agentguard::types::RiskLevel::High => " high".red().bold().to_string(),
                    agentguard::types::RiskLevel::Critical => " CRIT".red().bold().to_string(),
                };

                println!(
                    "    [{severity}] {id:<26} {desc}",
                    id = rule.id,
                    desc = rule.description,
                );
            }

            println!();
            println!("  Total: {} rules", patterns::rules::rules().len());
        }

        Commands::Explain { rule_id } => match patterns::rules::find_rule(&rule_id) {
            Some(rule) => {
                println!("{}", rule.id.bold());
                println!();
                println!("  Category:     {}", rule.category);
                println!("  Severity:     {}", rule.severity);
                println!("  Description:  {}", rule.description);
            }
            None => {
                eprintln!("Unknown rule: {rule_id}");
                eprintln!("Use 'agentguard list-rules' to see all available rules.");
                std::process::exit(2);
            }
        },
    }
}

async fn run_registry_command(registry: &TrustRegistry, command: RegistryCommands) {
    match command {
        RegistryCommands::Attest {
            path,
            id,
            source,
            version,
            level,
            preset,
            force,
        } => {
            let artifact_hash = calculate_artifact_hash(&path).unwrap_or_else(|e| {
                eprintln!("Error hashing {}: {e}", path.display());
                std::process::exit(2);
            });

            let capabilities = capability::Capability::preset(&preset).unwrap_or_else(|| {
                eprintln!("Unknown preset: {preset} (none, read_only, trading_bot, defi)");
                std::process::exit(2);
            });

            let request = AttestRequest {
                skill: SkillIdentity {
                    id,
                    source,
                    version_ref: version,
                    artifact_hash,
                },
                trust_level: level.into(),
                capabilities,
                review: ReviewMetadata::default(),
                expires_at: None,
            };

            match registry.attest(request, force).await {
                Ok(record) => {
                    println!(
                        "{} {} ({:?}, {})",
                        "Attested".green().bold(),
                        record.skill.id,
                        record.trust_level,
                        record.record_key,
                    );
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }

        RegistryCommands::Revoke {
            source,
            version,
            record_key,
            reason,
        } => {
            let matcher = RevokeMatch {
                source,
                version_ref: version,
                record_key,
            };
            match registry.revoke(&matcher, &reason).await {
                Ok(count) => println!("{} {count} record(s)", "Revoked".red().bold()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }

        RegistryCommands::List {
            level,
            include_expired,
        } => {
            let filter = ListFilter {
                trust_level: level.map(Into::into),
                status: None,
                source_pattern: None,
                include_expired,
            };
            let records = registry.list(&filter).await;
            if records.is_empty() {
                println!("No records.");
                return;
            }
            for record in records {
                println!(
                    "  {:<18} {:<12} {:?}/{:?}  {}",
                    record.record_key,
                    record.skill.id,
                    record.trust_level,
                    record.status,
                    record.skill.source,
                );
            }
        }
    }
}
