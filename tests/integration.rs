use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn agentguard() -> Command {
    assert_cmd::cargo::cargo_bin_cmd!("agentguard")
}

fn hook_cmd(home: &TempDir) -> Command {
    let mut cmd = agentguard();
    cmd.env("AGENTGUARD_HOME", home.path());
    cmd.env_remove("GOPLUS_API_KEY");
    cmd.env_remove("GOPLUS_API_SECRET");
    cmd.arg("hook");
    cmd
}

fn envelope(action: &str) -> String {
    format!(
        r#"{{
            "actor": {{"skill": {{"id": "x", "source": "mp/x", "version_ref": "1", "artifact_hash": "h"}}}},
            "action": {action},
            "context": {{"session_id": "s", "user_present": true, "env": "dev", "time": "2026-01-01T00:00:00Z"}}
        }}"#
    )
}

#[test]
fn scan_clean_skill_passes() {
    agentguard()
        .args(["scan", "tests/fixtures/clean-skill"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No findings."));
}

#[test]
fn scan_vulnerable_skill_fails_with_critical() {
    agentguard()
        .args(["scan", "tests/fixtures/vulnerable-skill"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("CRITICAL"));
}

#[test]
fn scan_vulnerable_skill_json_format() {
    agentguard()
        .args(["scan", "tests/fixtures/vulnerable-skill", "--format", "json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"risk_level\": \"critical\""))
        .stdout(predicate::str::contains("MNEMONIC_PATTERN"));
}

#[test]
fn scan_nonexistent_path_exits_2() {
    agentguard()
        .args(["scan", "tests/fixtures/does-not-exist"])
        .assert()
        .code(2);
}

#[test]
fn hook_allows_safe_command_silently() {
    let home = TempDir::new().unwrap();
    hook_cmd(&home)
        .write_stdin(envelope(
            r#"{"type": "exec_command", "data": {"command": "git status"}}"#,
        ))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn hook_denies_fork_bomb_with_reason_on_stderr() {
    let home = TempDir::new().unwrap();
    hook_cmd(&home)
        .write_stdin(envelope(
            r#"{"type": "exec_command", "data": {"command": ":(){:|:&};:"}}"#,
        ))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("DANGEROUS_COMMAND"));
}

#[test]
fn hook_asks_for_blocked_noncritical_command_under_balanced() {
    let home = TempDir::new().unwrap();
    hook_cmd(&home)
        .write_stdin(envelope(
            r#"{"type": "exec_command", "data": {"command": "terraform apply"}}"#,
        ))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"permissionDecision\":\"ask\""));
}

#[test]
fn hook_strict_denies_what_balanced_asks() {
    let home = TempDir::new().unwrap();
    hook_cmd(&home)
        .arg("--level")
        .arg("strict")
        .write_stdin(envelope(
            r#"{"type": "exec_command", "data": {"command": "terraform apply"}}"#,
        ))
        .assert()
        .code(2);
}

#[test]
fn hook_denies_sensitive_write_under_balanced() {
    let home = TempDir::new().unwrap();
    hook_cmd(&home)
        .write_stdin(envelope(
            r#"{"type": "write_file", "data": {"path": "/project/.env"}}"#,
        ))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("SENSITIVE_PATH"));
}

#[test]
fn hook_rejects_malformed_envelope_as_invalid_input() {
    let home = TempDir::new().unwrap();
    hook_cmd(&home)
        .write_stdin("{not json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("INVALID_INPUT"));
}

#[test]
fn hook_appends_audit_entries() {
    let home = TempDir::new().unwrap();
    hook_cmd(&home)
        .write_stdin(envelope(
            r#"{"type": "exec_command", "data": {"command": "git status"}}"#,
        ))
        .assert()
        .success();

    let log = std::fs::read_to_string(home.path().join("audit.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 1);
    let entry: serde_json::Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
    assert_eq!(entry["tool_name"], "exec_command");
    assert_eq!(entry["decision"], "allow");
}

#[test]
fn hook_honours_configured_level() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("config.json"),
        r#"{"level": "strict"}"#,
    )
    .unwrap();

    hook_cmd(&home)
        .write_stdin(envelope(
            r#"{"type": "exec_command", "data": {"command": "terraform apply"}}"#,
        ))
        .assert()
        .code(2);
}

#[test]
fn registry_attest_and_list_round_trip() {
    let home = TempDir::new().unwrap();

    agentguard()
        .env("AGENTGUARD_HOME", home.path())
        .args([
            "registry",
            "attest",
            "tests/fixtures/clean-skill",
            "--id",
            "greeter",
            "--source",
            "local/greeter",
            "--preset",
            "read_only",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Attested"));

    agentguard()
        .env("AGENTGUARD_HOME", home.path())
        .args(["registry", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("greeter"));
}

#[test]
fn registry_revoke_reports_count() {
    let home = TempDir::new().unwrap();

    agentguard()
        .env("AGENTGUARD_HOME", home.path())
        .args([
            "registry",
            "attest",
            "tests/fixtures/clean-skill",
            "--id",
            "greeter",
            "--source",
            "local/greeter",
        ])
        .assert()
        .success();

    agentguard()
        .env("AGENTGUARD_HOME", home.path())
        .args(["registry", "revoke", "--source", "local/greeter"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 record(s)"));
}

#[test]
fn list_rules_shows_catalog() {
    agentguard()
        .arg("list-rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("SHELL_EXEC"))
        .stdout(predicate::str::contains("DANGEROUS_SELFDESTRUCT"));
}

#[test]
fn explain_known_rule() {
    agentguard()
        .args(["explain", "MNEMONIC_PATTERN"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BIP-39"));
}

#[test]
fn explain_unknown_rule_exits_2() {
    agentguard()
        .args(["explain", "NOT_A_RULE"])
        .assert()
        .code(2);
}
