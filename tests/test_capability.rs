use agentguard::capability::{
    glob_match, host_allowed, path_allowed, Capability, CapabilityView, ExecPolicy, TxPolicy,
};

#[test]
fn bare_patterns_match_exact_and_prefix() {
    let allow = vec!["./data".to_string()];
    assert!(path_allowed(&allow, "./data"));
    assert!(path_allowed(&allow, "./data/cache.json"));
    assert!(!path_allowed(&allow, "./database"));
}

#[test]
fn single_star_stays_within_a_segment() {
    assert!(glob_match("src/*.rs", "src/main.rs"));
    assert!(!glob_match("src/*.rs", "src/sub/main.rs"));
}

#[test]
fn double_star_matches_any_suffix() {
    assert!(glob_match("./data/**", "./data/a/b/c.json"));
    assert!(glob_match("**", "anything/at/all"));
    assert!(!glob_match("./data/**", "./other/a.json"));
}

#[test]
fn backslash_paths_normalise() {
    let allow = vec!["src/**".to_string()];
    assert!(path_allowed(&allow, "src\\nested\\file.ts"));
}

#[test]
fn host_allowlist_exact_and_wildcard() {
    let allow = vec!["api.github.com".to_string(), "*.npmjs.org".to_string()];
    assert!(host_allowed(&allow, "api.github.com"));
    assert!(host_allowed(&allow, "API.GITHUB.COM"));
    assert!(host_allowed(&allow, "registry.npmjs.org"));
    assert!(!host_allowed(&allow, "npmjs.org"));
    assert!(!host_allowed(&allow, "evil.com"));
}

#[test]
fn wildcard_host_does_not_cross_labels() {
    let allow = vec!["*.example.com".to_string()];
    assert!(host_allowed(&allow, "api.example.com"));
    assert!(!host_allowed(&allow, "a.b.example.com"));
}

#[test]
fn none_preset_denies_everything() {
    let none = Capability::none();
    assert_eq!(none.exec, ExecPolicy::Deny);
    assert!(none.network_allowlist.is_empty());
    assert!(none.filesystem_allowlist.is_empty());
    assert!(none.web3.is_none());

    let view = none.view();
    assert!(!view.can_exec && !view.can_network && !view.can_write && !view.can_web3);
    assert!(view.can_read);
}

#[test]
fn read_only_preset_grants_filesystem_only() {
    let view = Capability::read_only().view();
    assert!(view.can_write);
    assert!(!view.can_network);
    assert!(!view.can_exec);
}

#[test]
fn trading_presets_carry_confirm_gated_web3() {
    for preset in [Capability::trading_bot(), Capability::defi()] {
        let web3 = preset.web3.as_ref().expect("web3 block");
        assert!(!web3.chains_allowlist.is_empty());
        assert_eq!(web3.tx_policy, TxPolicy::ConfirmHighRisk);
    }
}

#[test]
fn preset_lookup_by_name() {
    assert!(Capability::preset("none").is_some());
    assert!(Capability::preset("read_only").is_some());
    assert!(Capability::preset("trading_bot").is_some());
    assert!(Capability::preset("defi").is_some());
    assert!(Capability::preset("root").is_none());
}

#[test]
fn untrusted_view_is_read_only() {
    let view = CapabilityView::untrusted();
    assert!(view.can_read);
    assert!(!view.can_exec && !view.can_network && !view.can_write && !view.can_web3);
}
