//! Integration tests: provider roundtrip.
mod common;

use std::sync::Arc;
use std::time::Duration;

use bridgekit_core::storage::MemoryBlobStore;
use bridgekit_core::{
    BridgeConfig, ChannelPort, HostBridge, Listener, Provider, ProviderError, RpcPayload,
    SecurityLists, SitePermissions, ACCOUNTS_CHANGED,
};
use common::{ScriptedBackend, ScriptedPresenter, ADDRESS, DAPP_URL};
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// A provider and a host bridge connected by two forwarding tasks.
struct Wired {
    provider: Arc<Provider>,
    bridge: Arc<HostBridge>,
}

fn wire() -> Wired {
    let (to_host, mut host_inbox) = ChannelPort::pair();
    let (to_page, mut page_inbox) = ChannelPort::pair();

    let store = Arc::new(MemoryBlobStore::new());
    let bridge = Arc::new(
        HostBridge::new(
            BridgeConfig::default(),
            SecurityLists::default(),
            Arc::new(ScriptedBackend::new(Some(ADDRESS))),
            Arc::new(ScriptedPresenter::new()),
            to_page,
            Arc::new(SitePermissions::load(store).unwrap()),
        )
        .unwrap(),
    );
    let provider = Arc::new(Provider::new(Some(to_host), &BridgeConfig::default()));

    let host = Arc::clone(&bridge);
    tokio::spawn(async move {
        while let Some(message) = host_inbox.recv().await {
            host.receive_message(message).await;
        }
    });
    let page = Arc::clone(&provider);
    tokio::spawn(async move {
        while let Some(message) = page_inbox.recv().await {
            page.receive_message(&message);
        }
    });

    Wired { provider, bridge }
}

#[tokio::test]
async fn test_request_reaches_host_and_resolves() {
    let wired = wire();
    assert_eq!(
        wired.provider.request("eth_chainId", vec![]).await,
        Ok(json!("0x5ba3"))
    );
    assert_eq!(
        wired.provider.send("zcash_accounts", vec![]).await,
        Ok(json!([ADDRESS]))
    );
    assert_eq!(wired.provider.pending_calls(), 0);
}

#[tokio::test]
async fn test_host_error_is_rejected_with_its_message() {
    let wired = wire();
    assert_eq!(
        wired.provider.request("eth_getBalance", vec![]).await,
        Err(ProviderError::Rejected(
            "Unsupported method: eth_getBalance".to_string()
        ))
    );
}

#[tokio::test]
async fn test_send_async_wraps_result() {
    let wired = wire();
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let payload: RpcPayload =
        serde_json::from_value(json!({"method": "eth_chainId"})).unwrap();

    wired
        .provider
        .send_async(payload, move |error, response| {
            sender.send((error, response)).unwrap();
        })
        .await;

    assert_eq!(
        receiver.recv().await.unwrap(),
        (None, Some(json!({"result": "0x5ba3"})))
    );
}

#[tokio::test]
async fn test_navigation_announces_account_to_page() {
    let wired = wire();
    let (sender, mut events) = mpsc::unbounded_channel::<Vec<Value>>();
    let listener: Listener = Arc::new(move |args: &[Value]| {
        let _ = sender.send(args.to_vec());
    });
    wired.provider.on(ACCOUNTS_CHANGED, listener);

    wired.bridge.navigate(DAPP_URL.to_string()).await.unwrap();

    assert_eq!(events.recv().await.unwrap(), vec![json!([ADDRESS])]);
    assert_eq!(wired.provider.selected_address().as_deref(), Some(ADDRESS));
    assert!(wired.provider.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_silent_host_times_out_without_leaking_calls() {
    let (to_host, _host_inbox) = ChannelPort::pair();
    let provider = Provider::new(Some(to_host), &BridgeConfig::default());

    for _ in 0..3 {
        let started = tokio::time::Instant::now();
        assert_eq!(
            provider.request("eth_accounts", vec![]).await,
            Err(ProviderError::Timeout)
        );
        assert!(started.elapsed() >= Duration::from_secs(30));
    }
    assert_eq!(provider.pending_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_call_is_forgotten() {
    let (to_host, _host_inbox) = ChannelPort::pair();
    let provider = Provider::new(Some(to_host), &BridgeConfig::default());

    let call = provider.request("eth_accounts", vec![]);
    let outcome = tokio::time::timeout(Duration::from_secs(1), call).await;
    assert!(outcome.is_err());
    assert_eq!(provider.pending_calls(), 0);
}
