//! Integration tests: navigation.
mod common;

use std::time::Duration;

use bridgekit_core::{
    BridgeConfig, BridgeError, NavigationChoice, NavigationOutcome, SecurityLists, WarningKind,
};
use common::{Harness, ADDRESS, DAPP_URL};
use serde_json::json;

fn warning_kinds(warnings: &[bridgekit_core::NavigationWarning]) -> Vec<WarningKind> {
    warnings.iter().map(|w| w.kind).collect()
}

#[tokio::test]
async fn test_trusted_site_loads_without_warning() {
    let mut harness = Harness::new();
    assert_eq!(harness.load("https://www.zfnd.org/grants").await.as_deref(), Some(ADDRESS));

    assert!(harness.presenter.confirmations.lock().unwrap().is_empty());
    assert!(harness.presenter.advisories.lock().unwrap().is_empty());
    assert_eq!(harness.bridge.current_origin(), "https://www.zfnd.org");
}

#[tokio::test]
async fn test_malicious_domain_warns_even_when_allow_listed() {
    let lists = SecurityLists {
        trusted_domains: vec!["zcash-wallet.com".to_string()],
        ..SecurityLists::default()
    };
    let harness = Harness::with_config(BridgeConfig::default(), lists);
    *harness.presenter.navigation_choice.lock().unwrap() = Some(NavigationChoice::GoBack);

    let outcome = harness
        .bridge
        .navigate("https://zcash-wallet.com/login".to_string())
        .await
        .unwrap();
    assert_eq!(outcome, NavigationOutcome::Cancelled);

    let confirmations = harness.presenter.confirmations.lock().unwrap().clone();
    assert_eq!(warning_kinds(&confirmations), vec![WarningKind::MaliciousDomain]);
    assert_eq!(
        confirmations[0].message,
        "This domain is known to be malicious. Do not enter your wallet password or private keys."
    );
    assert_eq!(harness.bridge.page_url(), None);
}

#[tokio::test]
async fn test_malicious_domain_can_be_entered_explicitly() {
    let mut harness = Harness::new();
    harness.load("https://zcash-recovery.com/").await;

    let confirmations = harness.presenter.confirmations.lock().unwrap().clone();
    // the malicious warning replaces the generic one
    assert_eq!(warning_kinds(&confirmations), vec![WarningKind::MaliciousDomain]);
    assert_eq!(harness.bridge.current_origin(), "https://zcash-recovery.com");
}

#[tokio::test]
async fn test_phishing_pattern_is_advisory() {
    let mut harness = Harness::new();
    harness.load("https://example.net/zcash-wallet-login").await;

    let advisories = harness.presenter.advisories.lock().unwrap().clone();
    assert_eq!(warning_kinds(&advisories), vec![WarningKind::PhishingPattern]);
    let confirmations = harness.presenter.confirmations.lock().unwrap().clone();
    assert_eq!(warning_kinds(&confirmations), vec![WarningKind::UntrustedSite]);
    assert_eq!(
        harness.bridge.page_url().as_deref(),
        Some("https://example.net/zcash-wallet-login")
    );
}

#[tokio::test(start_paused = true)]
async fn test_untrusted_warning_proceeds_after_grace_period() {
    let mut harness = Harness::new();
    *harness.presenter.navigation_choice.lock().unwrap() = None;

    let started = tokio::time::Instant::now();
    let outcome = harness.bridge.navigate(DAPP_URL.to_string()).await.unwrap();
    assert_eq!(outcome, NavigationOutcome::Committed);
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(harness.next_announcement().await.address.as_deref(), Some(ADDRESS));
}

#[tokio::test]
async fn test_going_back_from_untrusted_site_keeps_current_page() {
    let mut harness = Harness::new();
    harness.load("https://z.cash/").await;
    *harness.presenter.navigation_choice.lock().unwrap() = Some(NavigationChoice::GoBack);

    let outcome = harness.bridge.navigate(DAPP_URL.to_string()).await.unwrap();
    assert_eq!(outcome, NavigationOutcome::Cancelled);
    assert_eq!(harness.bridge.current_origin(), "https://z.cash");
}

#[tokio::test]
async fn test_destination_without_scheme_gets_https() {
    let mut harness = Harness::new();
    harness.load("z.cash/download").await;
    assert_eq!(harness.bridge.page_url().as_deref(), Some("https://z.cash/download"));
}

#[tokio::test]
async fn test_invalid_destination() {
    let harness = Harness::new();
    assert!(matches!(
        harness.bridge.navigate("https://".to_string()).await,
        Err(BridgeError::InvalidUrl { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_navigation_resets_rate_window_of_previous_page() {
    let config = BridgeConfig {
        rate_limit_max_requests: 1,
        ..BridgeConfig::default()
    };
    let mut harness = Harness::with_config(config, SecurityLists::default());
    harness.load("https://z.cash/").await;

    assert!(harness.call("eth_chainId", vec![]).await.is_ok());
    assert!(harness.call("eth_chainId", vec![]).await.is_err());

    harness.load("https://zfnd.org/").await;
    harness.load("https://z.cash/").await;
    assert_eq!(harness.call("eth_chainId", vec![]).await, Ok(json!("0x5ba3")));
}

#[tokio::test]
async fn test_origin_follows_navigation() {
    let mut harness = Harness::new();
    harness.load("https://z.cash/").await;
    harness.call("eth_requestAccounts", vec![]).await.unwrap();

    harness.load(DAPP_URL).await;
    harness.call("eth_requestAccounts", vec![]).await.unwrap();

    assert_eq!(
        *harness.presenter.connection_prompts.lock().unwrap(),
        vec!["https://z.cash".to_string(), "https://dapp.example".to_string()]
    );
}
