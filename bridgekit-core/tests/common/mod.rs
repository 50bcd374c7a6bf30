//! Scripted host capabilities and a harness driving a `HostBridge` the way an
//! embedded page would.

// each test binary uses a different subset of the helpers
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bridgekit_core::storage::MemoryBlobStore;
use bridgekit_core::{
    BackendError, BridgeConfig, ChannelEnvelope, ChannelPort, ConnectDecision,
    ConsentPresenter, HostBridge, MessagePreview, NavigationChoice, NavigationWarning,
    ProviderAnnouncement, RequestEnvelope, ResponseEnvelope, SecurityLists, SendOutcome,
    SignedMessage, SitePermissions, TransactionPreview, WalletBackend,
};
use serde_json::Value;
use tokio::sync::{mpsc, Notify};

pub const ADDRESS: &str = "zs1testaddress";
pub const SECRET: &str = "correct horse battery staple";
pub const TXID: &str = "f00dcafe";
pub const DAPP_URL: &str = "https://dapp.example/app";
pub const DAPP_ORIGIN: &str = "https://dapp.example";

/// A `send_transaction` call the backend received.
#[derive(Debug, Clone, PartialEq)]
pub struct SentTransaction {
    pub recipient: String,
    pub amount: f64,
    pub memo: Option<String>,
}

/// Wallet backend accepting only [`SECRET`].
pub struct ScriptedBackend {
    pub address: Mutex<Option<String>>,
    pub sent: Mutex<Vec<SentTransaction>>,
    pub signed: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(address: Option<&str>) -> Self {
        Self {
            address: Mutex::new(address.map(ToString::to_string)),
            sent: Mutex::new(Vec::new()),
            signed: Mutex::new(Vec::new()),
        }
    }

    fn authenticate(secret: &str) -> Result<(), BackendError> {
        if secret == SECRET {
            Ok(())
        } else {
            Err(BackendError::Authentication("Invalid password".to_string()))
        }
    }
}

#[async_trait]
impl WalletBackend for ScriptedBackend {
    async fn send_transaction(
        &self,
        recipient: String,
        amount: f64,
        memo: Option<String>,
        secret: String,
    ) -> Result<SendOutcome, BackendError> {
        Self::authenticate(&secret)?;
        self.sent.lock().unwrap().push(SentTransaction {
            recipient,
            amount,
            memo,
        });
        Ok(SendOutcome {
            success: true,
            txid: Some(TXID.to_string()),
            message: "Transaction sent".to_string(),
        })
    }

    async fn sign_message(
        &self,
        message: String,
        secret: String,
    ) -> Result<SignedMessage, BackendError> {
        Self::authenticate(&secret)?;
        let signature = format!("sig:{}", hex::encode(message.as_bytes()));
        self.signed.lock().unwrap().push(message);
        Ok(SignedMessage { signature })
    }

    async fn get_address(&self) -> Result<Option<String>, BackendError> {
        Ok(self.address.lock().unwrap().clone())
    }
}

/// Consent UI answering with preset choices. A `None` choice never answers.
pub struct ScriptedPresenter {
    pub connect_decision: Mutex<Option<ConnectDecision>>,
    pub navigation_choice: Mutex<Option<NavigationChoice>>,
    pub connection_prompts: Mutex<Vec<String>>,
    pub transactions: Mutex<Vec<TransactionPreview>>,
    pub messages: Mutex<Vec<MessagePreview>>,
    pub advisories: Mutex<Vec<NavigationWarning>>,
    pub confirmations: Mutex<Vec<NavigationWarning>>,
    pub dismissals: AtomicUsize,
    /// Signalled each time a consent dialog is shown.
    pub presented: Notify,
}

impl ScriptedPresenter {
    pub fn new() -> Self {
        Self {
            connect_decision: Mutex::new(Some(ConnectDecision::Allow)),
            navigation_choice: Mutex::new(Some(NavigationChoice::Proceed)),
            connection_prompts: Mutex::new(Vec::new()),
            transactions: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            advisories: Mutex::new(Vec::new()),
            confirmations: Mutex::new(Vec::new()),
            dismissals: AtomicUsize::new(0),
            presented: Notify::new(),
        }
    }

    pub fn dismissals(&self) -> usize {
        self.dismissals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsentPresenter for ScriptedPresenter {
    async fn request_connection(&self, origin: String) -> ConnectDecision {
        self.connection_prompts.lock().unwrap().push(origin);
        let decision = *self.connect_decision.lock().unwrap();
        match decision {
            Some(decision) => decision,
            None => std::future::pending().await,
        }
    }

    fn present_transaction(&self, preview: TransactionPreview) {
        self.transactions.lock().unwrap().push(preview);
        self.presented.notify_one();
    }

    fn present_message(&self, preview: MessagePreview) {
        self.messages.lock().unwrap().push(preview);
        self.presented.notify_one();
    }

    fn dismiss_consent(&self) {
        self.dismissals.fetch_add(1, Ordering::SeqCst);
    }

    fn show_navigation_warning(&self, warning: NavigationWarning) {
        self.advisories.lock().unwrap().push(warning);
    }

    async fn confirm_navigation(&self, warning: NavigationWarning) -> NavigationChoice {
        self.confirmations.lock().unwrap().push(warning);
        let choice = *self.navigation_choice.lock().unwrap();
        match choice {
            Some(choice) => choice,
            None => std::future::pending().await,
        }
    }
}

/// A bridge wired to scripted capabilities, with the page side of the
/// channel exposed as `outbox`.
pub struct Harness {
    pub bridge: HostBridge,
    pub backend: Arc<ScriptedBackend>,
    pub presenter: Arc<ScriptedPresenter>,
    pub permissions: Arc<SitePermissions>,
    pub store: Arc<MemoryBlobStore>,
    pub outbox: mpsc::UnboundedReceiver<String>,
    next_id: usize,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default(), SecurityLists::default())
    }

    pub fn with_config(config: BridgeConfig, lists: SecurityLists) -> Self {
        let backend = Arc::new(ScriptedBackend::new(Some(ADDRESS)));
        let presenter = Arc::new(ScriptedPresenter::new());
        let store = Arc::new(MemoryBlobStore::new());
        let permissions = Arc::new(SitePermissions::load(store.clone()).unwrap());
        let (port, outbox) = ChannelPort::pair();
        let bridge = HostBridge::new(
            config,
            lists,
            backend.clone(),
            presenter.clone(),
            port,
            permissions.clone(),
        )
        .unwrap();
        Self {
            bridge,
            backend,
            presenter,
            permissions,
            store,
            outbox,
            next_id: 0,
        }
    }

    /// Navigates to `url` and drains the provider announcement that follows.
    pub async fn load(&mut self, url: &str) -> Option<String> {
        self.bridge.navigate(url.to_string()).await.unwrap();
        self.next_announcement().await.address
    }

    /// Posts a request envelope and returns the id used.
    pub async fn send(&mut self, method: &str, params: Vec<Value>) -> String {
        self.next_id += 1;
        let request_id = format!("req-{}", self.next_id);
        let envelope = ChannelEnvelope::Request(RequestEnvelope {
            method: method.to_string(),
            params,
            request_id: request_id.clone(),
        });
        self.bridge
            .receive_message(envelope.to_json().unwrap())
            .await;
        request_id
    }

    /// Posts a request and waits for its response.
    pub async fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, String> {
        let request_id = self.send(method, params).await;
        let response = self.next_response().await;
        assert_eq!(response.request_id(), request_id);
        response.into_result()
    }

    pub async fn next_envelope(&mut self) -> ChannelEnvelope {
        let message = self.outbox.recv().await.expect("bridge dropped its port");
        ChannelEnvelope::parse(&message).unwrap()
    }

    pub async fn next_response(&mut self) -> ResponseEnvelope {
        loop {
            if let ChannelEnvelope::Response(response) = self.next_envelope().await {
                return response;
            }
        }
    }

    pub async fn next_announcement(&mut self) -> ProviderAnnouncement {
        loop {
            if let ChannelEnvelope::ProviderInject { provider } = self.next_envelope().await {
                return provider;
            }
        }
    }

    /// Waits until the bridge shows a consent dialog.
    pub async fn consent_shown(&self) {
        self.presenter.presented.notified().await;
    }
}
