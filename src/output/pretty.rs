//! Human-readable terminal output.

use colored::Colorize;

use crate::scan::ScanReport;
use crate::types::RiskLevel;

fn risk_badge(level: RiskLevel) -> String {
    match level {
        RiskLevel::Low => "LOW".green().bold().to_string(),
        RiskLevel::Medium => "MEDIUM".yellow().bold().to_string(),
        RiskLevel::High => "HIGH".red().bold().to_string(),
        RiskLevel::Critical => "CRITICAL".red().bold().underline().to_string(),
    }
}

/// Formats a [`ScanReport`] for the terminal.
pub fn format(report: &ScanReport) -> String {
    let mut out = String::new();
    let separator = "─".repeat(60);

    out.push_str(&format!(
        "{} {}\n",
        "Risk level:".bold(),
        risk_badge(report.risk_level)
    ));
    out.push_str(&format!("{} {}\n", "Summary:".bold(), report.summary));
    out.push_str(&format!("{}\n", separator.dimmed()));

    if report.findings.is_empty() {
        out.push_str(&format!("{}\n", "No findings.".green()));
        return out;
    }

    for finding in &report.findings {
        let severity = match finding.severity {
            RiskLevel::Low => " low ".blue().to_string(),
            RiskLevel::Medium => " med ".yellow().to_string(),
            RiskLevel::High => "high ".red().bold().to_string(),
            RiskLevel::Critical => "CRIT ".red().bold().to_string(),
        };

        out.push_str(&format!(
            "  [{severity}] {id:<26} {path}:{line}\n",
            id = finding.rule_id,
            path = finding.file_path.display(),
            line = finding.line,
        ));

        if !finding.matched_text.is_empty() {
            out.push_str(&format!("          {}\n", finding.matched_text.dimmed()));
        }
        if let Some(parent) = &finding.parent_rule {
            out.push_str(&format!(
                "          {}\n",
                format!("decoded from {parent}").dimmed()
            ));
        }
    }

    out.push_str(&format!("{}\n", separator.dimmed()));
    out.push_str(&format!(
        "  {} findings across {} files",
        report.findings.len(),
        report.files_scanned
    ));
    if report.skipped_files > 0 {
        out.push_str(&format!(" ({} skipped)", report.skipped_files));
    }
    out.push('\n');

    out
}
