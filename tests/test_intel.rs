use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agentguard::intel::{GoPlusClient, SimulationRequest, ThreatIntel};
use agentguard::types::RiskLevel;

fn creds() -> Option<(String, String)> {
    Some(("key".to_string(), "secret".to_string()))
}

fn sim_request() -> SimulationRequest {
    SimulationRequest {
        chain_id: "1".to_string(),
        from: "0xabc".to_string(),
        to: "0xdef".to_string(),
        value: "0".to_string(),
        data: None,
    }
}

#[tokio::test]
async fn unconfigured_client_is_unavailable_without_io() {
    let client = GoPlusClient::new("http://127.0.0.1:9", None);
    assert!(!client.is_configured());

    let phishing = client.phishing_site("https://x.example").await;
    assert!(phishing.unavailable);
    assert!(!phishing.is_phishing);

    let report = client.address_security("1", &["0xabc".to_string()]).await;
    assert!(report.unavailable);

    let sim = client.simulate_transaction(&sim_request()).await;
    assert!(sim.unavailable);
}

#[tokio::test]
async fn phishing_site_parses_positive_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/phishing_site"))
        .and(query_param("url", "https://bad.example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 1,
            "message": "ok",
            "result": { "phishing_site": 1 }
        })))
        .mount(&server)
        .await;

    let client = GoPlusClient::new(&server.uri(), creds());
    let check = client.phishing_site("https://bad.example").await;
    assert!(!check.unavailable);
    assert!(check.is_phishing);
}

#[tokio::test]
async fn address_security_parses_string_flags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/address_security/0xdef"))
        .and(query_param("chain_id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 1,
            "message": "ok",
            "result": {
                "blacklist_doubt": "1",
                "phishing_activities": "0",
                "stealing_attack": "0",
                "honeypot_related_address": "1"
            }
        })))
        .mount(&server)
        .await;

    let client = GoPlusClient::new(&server.uri(), creds());
    let report = client.address_security("1", &["0xdef".to_string()]).await;
    assert!(!report.unavailable);

    let flags = report.flags.get("0xdef").expect("flags for queried address");
    assert!(flags.is_blacklisted);
    assert!(!flags.is_phishing_activities);
    assert!(flags.is_honeypot_related_address);
    assert!(flags.is_malicious());
}

#[tokio::test]
async fn simulation_parses_approvals_and_risk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/transaction_simulation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 1,
            "message": "ok",
            "result": {
                "success": true,
                "balance_changes": [],
                "approval_changes": [
                    { "token": "0xtoken", "spender": "0xspender", "amount": "max", "is_unlimited": true }
                ],
                "risk_tags": ["APPROVAL_TO_EOA"],
                "risk_level": "high"
            }
        })))
        .mount(&server)
        .await;

    let client = GoPlusClient::new(&server.uri(), creds());
    let sim = client.simulate_transaction(&sim_request()).await;
    assert!(!sim.unavailable);
    assert!(sim.success);
    assert!(sim.approval_changes[0].is_unlimited);
    assert_eq!(sim.risk_tags, vec!["APPROVAL_TO_EOA"]);
    assert_eq!(sim.risk_level, RiskLevel::High);
}

#[tokio::test]
async fn provider_error_code_degrades() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/phishing_site"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 4029,
            "message": "rate limited",
            "result": null
        })))
        .mount(&server)
        .await;

    let client = GoPlusClient::new(&server.uri(), creds());
    let check = client.phishing_site("https://x.example").await;
    assert!(check.unavailable);
}

#[tokio::test]
async fn non_2xx_degrades() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/phishing_site"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = GoPlusClient::new(&server.uri(), creds());
    let check = client.phishing_site("https://x.example").await;
    assert!(check.unavailable);
}

#[tokio::test]
async fn unreachable_host_degrades_instead_of_erroring() {
    // Nothing listens on this port; the transport error must be absorbed.
    let client = GoPlusClient::new("http://127.0.0.1:1", creds());
    let check = client.phishing_site("https://x.example").await;
    assert!(check.unavailable);

    let report = client.address_security("1", &["0xabc".to_string()]).await;
    assert!(report.unavailable);
    assert!(report.flags.is_empty());
}
