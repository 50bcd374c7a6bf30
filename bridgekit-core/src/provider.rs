//! The page half of the bridge: the wallet-RPC client handed to page scripts.
//!
//! A [`Provider`] turns method calls into correlated request envelopes posted
//! to the parent host, and settles each call when the matching response
//! arrives or the provider timeout passes, whichever comes first.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::channel::MessagePort;
use crate::config::BridgeConfig;
use crate::envelope::{self, ChannelEnvelope, ProviderAnnouncement, RequestEnvelope};
use crate::error::ProviderError;

/// Event fired when the host announces an account.
pub const ACCOUNTS_CHANGED: &str = "accountsChanged";

/// Callback registered with [`Provider::on`]. Receives the event arguments.
pub type Listener = Arc<dyn Fn(&[Value]) + Send + Sync>;

type CallResult = Result<Value, ProviderError>;
type PendingCalls = Mutex<HashMap<String, oneshot::Sender<CallResult>>>;

/// Legacy JSON-RPC payload accepted by [`Provider::send_async`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcPayload {
    /// Requested method.
    pub method: String,
    /// Method arguments.
    #[serde(default)]
    pub params: Vec<Value>,
}

#[derive(Debug, Default)]
struct AccountState {
    address: Option<String>,
    connected: bool,
}

/// Wallet-RPC client running inside the embedded page.
pub struct Provider {
    parent: Option<Arc<dyn MessagePort>>,
    timeout: Duration,
    chain_id: String,
    pending: PendingCalls,
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
    account: RwLock<AccountState>,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("embedded", &self.parent.is_some())
            .field("pending_calls", &self.pending_calls())
            .field("selected_address", &self.selected_address())
            .finish_non_exhaustive()
    }
}

/// Removes a pending call when the waiting future completes or is dropped.
struct PendingGuard<'a> {
    pending: &'a PendingCalls,
    request_id: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.request_id);
    }
}

impl Provider {
    /// Creates a provider. `parent` is the port towards the wallet host, or
    /// `None` when the page is not embedded.
    ///
    /// An embedded provider immediately asks the host to announce the
    /// current account.
    #[must_use]
    pub fn new(parent: Option<Arc<dyn MessagePort>>, config: &BridgeConfig) -> Self {
        let provider = Self {
            parent,
            timeout: Duration::from_millis(config.provider_timeout_ms),
            chain_id: config.chain_id.clone(),
            pending: Mutex::new(HashMap::new()),
            listeners: Mutex::new(HashMap::new()),
            account: RwLock::new(AccountState::default()),
        };
        if let Some(parent) = &provider.parent {
            match ChannelEnvelope::RequestProvider.to_json() {
                Ok(json) => parent.post_message(json),
                Err(e) => log::error!("failed to encode provider request: {e}"),
            }
        }
        provider
    }

    /// Calls `method` on the wallet host.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Unavailable`] when the page is not embedded.
    /// - [`ProviderError::InvalidRequest`] for an empty method name.
    /// - [`ProviderError::Timeout`] when no response arrives in time.
    /// - [`ProviderError::Rejected`] with the host's message when the host
    ///   answers with an error.
    pub async fn request(&self, method: &str, params: Vec<Value>) -> CallResult {
        if method.is_empty() {
            return Err(ProviderError::InvalidRequest("method must not be empty".to_string()));
        }
        let Some(parent) = &self.parent else {
            return Err(ProviderError::Unavailable);
        };

        let request_id = envelope::generate_request_id();
        let envelope = ChannelEnvelope::Request(RequestEnvelope {
            method: method.to_string(),
            params,
            request_id: request_id.clone(),
        });
        let message = envelope
            .to_json()
            .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?;

        let (sender, receiver) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request_id.clone(), sender);
        let _guard = PendingGuard {
            pending: &self.pending,
            request_id,
        };
        parent.post_message(message);

        match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(result)) => result,
            // the sender only goes away with the pending table
            Ok(Err(_)) => Err(ProviderError::Unavailable),
            Err(_) => {
                log::debug!("{method} timed out after {:?}", self.timeout);
                Err(ProviderError::Timeout)
            }
        }
    }

    /// Legacy alias of [`Provider::request`].
    ///
    /// # Errors
    ///
    /// Same as [`Provider::request`].
    pub async fn send(&self, method: &str, params: Vec<Value>) -> CallResult {
        self.request(method, params).await
    }

    /// Legacy node-style adapter: `callback(error, response)` where a success
    /// is wrapped as `{"result": value}`.
    pub async fn send_async<F>(&self, payload: RpcPayload, callback: F)
    where
        F: FnOnce(Option<ProviderError>, Option<Value>),
    {
        match self.request(&payload.method, payload.params).await {
            Ok(result) => callback(None, Some(json!({ "result": result }))),
            Err(e) => callback(Some(e), None),
        }
    }

    /// Handles one message posted by the host.
    ///
    /// Responses settle the matching pending call; responses for unknown or
    /// expired ids are dropped. Account announcements update the cached
    /// address and fire `accountsChanged`. Anything else is ignored.
    pub fn receive_message(&self, message: &str) {
        let envelope = match ChannelEnvelope::parse(message) {
            Ok(envelope) => envelope,
            Err(_) => {
                log::debug!("ignoring non-wallet message ({} bytes)", message.len());
                return;
            }
        };

        match envelope {
            ChannelEnvelope::Response(response) => {
                let sender = self
                    .pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(response.request_id());
                match sender {
                    Some(sender) => {
                        let _ = sender.send(response.into_result().map_err(ProviderError::Rejected));
                    }
                    None => log::debug!("dropping response for unknown request {}", response.request_id()),
                }
            }
            ChannelEnvelope::ProviderInject { provider } => self.apply_announcement(provider),
            other => log::debug!("ignoring {} envelope on the page side", other.kind()),
        }
    }

    fn apply_announcement(&self, announcement: ProviderAnnouncement) {
        let address = announcement.address.filter(|address| !address.is_empty());
        {
            let mut account = self.account.write().unwrap_or_else(PoisonError::into_inner);
            account.connected = address.is_some();
            account.address.clone_from(&address);
        }
        if let Some(address) = address {
            self.emit(ACCOUNTS_CHANGED, &[json!([address])]);
        }
    }

    /// Registers `listener` for `event`. Listeners run in registration order;
    /// the same listener may be registered more than once.
    pub fn on(&self, event: &str, listener: Listener) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// Removes the first registration of `listener` for `event`.
    pub fn remove_listener(&self, event: &str, listener: &Listener) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(registered) = listeners.get_mut(event) {
            if let Some(index) = registered.iter().position(|l| Arc::ptr_eq(l, listener)) {
                registered.remove(index);
            }
        }
    }

    fn emit(&self, event: &str, args: &[Value]) {
        // snapshot so a listener may (un)register without deadlocking
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .cloned()
            .unwrap_or_default();
        for listener in listeners {
            listener(args);
        }
    }

    /// Address last announced by the host.
    #[must_use]
    pub fn selected_address(&self) -> Option<String> {
        self.account
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .address
            .clone()
    }

    /// Whether the host announced an address.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.account
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .connected
    }

    /// Network identifier of the wallet.
    #[must_use]
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Marks the provider as this wallet's, for pages probing several
    /// injected providers.
    #[must_use]
    pub const fn is_bridge_wallet(&self) -> bool {
        true
    }

    /// Whether the provider can reach a host.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        self.parent.is_some()
    }

    /// Number of calls waiting for a response.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
