//! The host half of the bridge: one [`HostBridge`] per embedded page.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};
use tokio::sync::{oneshot, Mutex as AsyncMutex};

use crate::approval::{ApprovalMachine, ConsentPayload, ConsentResult};
use crate::backend::{SendOutcome, WalletBackend};
use crate::channel::MessagePort;
use crate::config::BridgeConfig;
use crate::consent::{
    ConnectDecision, ConsentPresenter, ConsentSnapshot, MessagePreview, TransactionPreview,
};
use crate::envelope::{ChannelEnvelope, ProviderAnnouncement, RequestEnvelope, ResponseEnvelope};
use crate::error::BridgeError;
use crate::method::WalletMethod;
use crate::origin::Origin;
use crate::permissions::SitePermissions;
use crate::security::{RateLimiter, SecurityLists, SecurityPolicy};
use crate::units;

/// Serves the wallet requests of the page loaded in one embedded frame.
///
/// Every inbound request is handled on its own task and answered with exactly
/// one response envelope, so a consent waiting on the user does not hold up
/// cheap queries like `eth_accounts`.
///
/// Request handling goes through these steps:
///
/// 1. The origin is resolved from the current page URL.
/// 2. The origin's rate budget is charged.
/// 3. The method is dispatched to the connect flow, a state query, or one of
///    the two consent flows.
/// 4. The outcome is posted back under the request's `requestId`.
#[derive(uniffi::Object)]
pub struct HostBridge {
    pub(crate) inner: Arc<BridgeInner>,
}

pub(crate) struct BridgeInner {
    pub(crate) config: BridgeConfig,
    pub(crate) policy: SecurityPolicy,
    pub(crate) rate_limiter: RateLimiter,
    permissions: Arc<SitePermissions>,
    approvals: Arc<ApprovalMachine>,
    backend: Arc<dyn WalletBackend>,
    pub(crate) presenter: Arc<dyn ConsentPresenter>,
    page: Arc<dyn MessagePort>,
    page_url: RwLock<Option<String>>,
    connect_gate: AsyncMutex<()>,
}

impl std::fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBridge")
            .field("page_url", &self.inner.page_url())
            .field("pending_consent", &self.inner.approvals.snapshot())
            .finish_non_exhaustive()
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl HostBridge {
    /// Creates a bridge for one embedded page.
    ///
    /// `page` posts envelopes into the frame. `permissions` may be shared
    /// between bridges; everything else (rate windows, the consent slot) is
    /// owned by this instance.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidParams`] if `config` is out of range or a
    /// phishing pattern does not compile.
    #[uniffi::constructor]
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(
        config: BridgeConfig,
        lists: SecurityLists,
        backend: Arc<dyn WalletBackend>,
        presenter: Arc<dyn ConsentPresenter>,
        page: Arc<dyn MessagePort>,
        permissions: Arc<SitePermissions>,
    ) -> Result<Self, BridgeError> {
        config.validate()?;
        let policy = SecurityPolicy::new(&lists)?;
        let rate_limiter =
            RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window());
        Ok(Self {
            inner: Arc::new(BridgeInner {
                config,
                policy,
                rate_limiter,
                permissions,
                approvals: Arc::new(ApprovalMachine::default()),
                backend,
                presenter,
                page,
                page_url: RwLock::new(None),
                connect_gate: AsyncMutex::new(()),
            }),
        })
    }

    /// Handles one message posted by the page.
    ///
    /// Requests are answered asynchronously on their own task. Messages that
    /// are not a known envelope, or that only travel towards the page, are
    /// logged and dropped.
    #[allow(clippy::needless_pass_by_value)]
    pub async fn receive_message(&self, message: String) {
        let envelope = match ChannelEnvelope::parse(&message) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::warn!("ignoring unrecognized page message ({} bytes): {e}", message.len());
                return;
            }
        };

        match envelope {
            ChannelEnvelope::Request(request) => {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move { inner.handle_request(request).await });
            }
            ChannelEnvelope::RequestProvider => {
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move { inner.announce_current_account().await });
            }
            other => log::warn!("ignoring {} envelope sent by the page", other.kind()),
        }
    }

    /// Approves the open consent with the user's unlock secret.
    ///
    /// The backend is called with the consent's payload; its outcome settles
    /// the waiting request and is also returned here so the dialog can show
    /// a failure.
    ///
    /// If this future is dropped while the backend call is in flight, the
    /// page is told "Approval was interrupted" and the slot is freed. The
    /// backend may still have completed the call (a transaction may already
    /// be broadcast), so hosts should let the approval run to completion.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidParams`] if `secret` is blank; the
    /// consent stays open so the user can try again.
    /// Returns [`BridgeError::NoPendingRequest`] if no consent is open (or it
    /// is already being approved), or the backend's failure.
    pub async fn approve_pending(&self, secret: String) -> Result<(), BridgeError> {
        let secret = SecretString::from(secret);
        if secret.expose_secret().trim().is_empty() {
            log::info!("approval attempted without an unlock secret");
            return Err(BridgeError::invalid_params("Unlock secret required"));
        }
        let approval = self.inner.approvals.take_for_approval()?;

        let result = self.inner.run_approved(approval.payload(), &secret).await;
        if let Err(e) = &result {
            log::warn!("approved consent failed in the backend: {e}");
        }
        approval.settle(result.clone());
        result.map(|_| ())
    }

    /// Rejects the open consent, as when the user closes the dialog.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NoPendingRequest`] if no consent is waiting for
    /// the user.
    pub fn reject_pending(&self) -> Result<(), BridgeError> {
        let kind = self.inner.approvals.reject()?;
        log::info!("user rejected {kind:?} consent");
        Ok(())
    }

    /// The consent currently open, if any.
    #[must_use]
    pub fn pending_consent(&self) -> Option<ConsentSnapshot> {
        self.inner.approvals.snapshot()
    }

    /// Announces `address` to the page, e.g. after an account switch or lock.
    pub fn announce_account(&self, address: Option<String>) {
        self.inner.announce(address);
    }

    /// URL of the page currently bound to this bridge.
    #[must_use]
    pub fn page_url(&self) -> Option<String> {
        self.inner.page_url()
    }

    /// Origin of the page currently bound to this bridge.
    #[must_use]
    pub fn current_origin(&self) -> String {
        self.inner.current_origin().as_str().to_string()
    }
}

impl BridgeInner {
    pub(crate) fn page_url(&self) -> Option<String> {
        self.page_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Binds the bridge to a newly loaded page.
    ///
    /// A consent opened by the previous page is rejected, the previous
    /// origin's rate window is cleared and the provider is announced to the
    /// new page.
    pub(crate) async fn commit_navigation(&self, url: String) {
        if let Ok(kind) = self.approvals.reject() {
            log::info!("rejected {kind:?} consent left open by the previous page");
        }
        let previous = self.current_origin();
        self.rate_limiter.reset(previous.as_str());
        *self.page_url.write().unwrap_or_else(PoisonError::into_inner) = Some(url);
        log::info!("navigated to {}", self.current_origin());
        self.announce_current_account().await;
    }

    /// Resolved fresh on every call so a navigation is seen immediately.
    pub(crate) fn current_origin(&self) -> Origin {
        Origin::resolve(self.page_url().as_deref().unwrap_or_default())
    }

    /// Hands an approved consent to the backend. The secret leaves its
    /// wrapper here and nowhere else.
    async fn run_approved(&self, payload: &ConsentPayload, secret: &SecretString) -> ConsentResult {
        let secret = secret.expose_secret().to_owned();
        match payload {
            ConsentPayload::Transaction {
                recipient,
                amount,
                memo,
            } => {
                log::info!("sending approved transaction of {amount} to {recipient}");
                self.backend
                    .send_transaction(recipient.clone(), *amount, memo.clone(), secret)
                    .await
                    .and_then(SendOutcome::into_txid)
                    .map(Value::String)
                    .map_err(BridgeError::from)
            }
            ConsentPayload::Message { message } => {
                log::info!("signing approved message ({} bytes)", message.len());
                self.backend
                    .sign_message(message.clone(), secret)
                    .await
                    .map(|signed| Value::String(signed.signature))
                    .map_err(BridgeError::from)
            }
        }
    }

    fn post(&self, envelope: &ChannelEnvelope) {
        match envelope.to_json() {
            Ok(json) => self.page.post_message(json),
            Err(e) => log::error!("failed to encode {} envelope: {e}", envelope.kind()),
        }
    }

    pub(crate) fn announce(&self, address: Option<String>) {
        log::debug!("announcing provider (connected: {})", address.is_some());
        self.post(&ChannelEnvelope::ProviderInject {
            provider: ProviderAnnouncement { address },
        });
    }

    pub(crate) async fn announce_current_account(&self) {
        let address = self.address().await;
        self.announce(address);
    }

    async fn address(&self) -> Option<String> {
        match self.backend.get_address().await {
            Ok(address) => address.filter(|address| !address.is_empty()),
            Err(e) => {
                log::warn!("wallet backend could not report an address: {e}");
                None
            }
        }
    }

    async fn handle_request(&self, request: RequestEnvelope) {
        let origin = self.current_origin();
        let response = match self.dispatch(&origin, &request).await {
            Ok(result) => ResponseEnvelope::success(&request.request_id, result),
            Err(e) => {
                log::info!("{} from {origin} failed: {e}", request.method);
                ResponseEnvelope::failure(&request.request_id, e.to_string())
            }
        };
        self.post(&ChannelEnvelope::Response(response));
    }

    async fn dispatch(&self, origin: &Origin, request: &RequestEnvelope) -> Result<Value, BridgeError> {
        if !self.rate_limiter.is_allowed(origin.as_str()) {
            log::warn!("rate limit exceeded for {origin}");
            return Err(BridgeError::RateLimited);
        }

        let method = WalletMethod::resolve(&request.method).ok_or_else(|| {
            BridgeError::UnsupportedMethod {
                method: request.method.clone(),
            }
        })?;
        if method.requires_consent() {
            log::info!("{origin} requested {method:?}");
        } else {
            log::debug!("{origin} requested {method:?}");
        }

        match method {
            WalletMethod::RequestAccounts => self.request_accounts(origin).await,
            WalletMethod::Accounts => {
                let accounts: Vec<String> = self.address().await.into_iter().collect();
                Ok(json!(accounts))
            }
            WalletMethod::ChainId => Ok(Value::String(self.config.chain_id.clone())),
            WalletMethod::SendTransaction => self.send_transaction(origin, &request.params).await,
            WalletMethod::SignMessage => self.sign_message(origin, &request.params).await,
        }
    }

    async fn request_accounts(&self, origin: &Origin) -> Result<Value, BridgeError> {
        let address = self.address().await.ok_or(BridgeError::WalletNotConnected)?;

        // one connect prompt at a time; a request queued behind an Allow
        // sees the fresh grant
        let gate = self.connect_gate.lock().await;
        if !self.permissions.is_granted(origin.as_str()) {
            let decision = tokio::time::timeout(
                self.config.connect_prompt_timeout(),
                self.presenter.request_connection(origin.as_str().to_string()),
            )
            .await
            .unwrap_or_else(|_| {
                log::info!("connect prompt for {origin} expired");
                self.presenter.dismiss_consent();
                ConnectDecision::Deny
            });

            if decision == ConnectDecision::Deny {
                log::info!("connection denied for {origin}");
                return Err(BridgeError::PermissionDenied);
            }
            log::info!("connection allowed for {origin}");
            if !origin.is_resolved() {
                log::warn!("not remembering a grant for unresolved origin");
            } else if let Err(e) = self.permissions.grant(origin.as_str()) {
                log::warn!("failed to persist grant for {origin}: {e}");
            }
        }
        drop(gate);

        Ok(json!([address]))
    }

    async fn send_transaction(&self, origin: &Origin, params: &[Value]) -> Result<Value, BridgeError> {
        let (tx, recipient) = params
            .first()
            .and_then(Value::as_object)
            .and_then(|tx| Some((tx, recipient(tx)?)))
            .ok_or_else(|| BridgeError::invalid_params("Invalid transaction parameters"))?;

        let base_units = units::parse_base_units(tx.get("value"))?;
        let amount = units::to_display_amount(base_units, self.config.atomic_units_per_coin);
        let memo = tx
            .get("data")
            .and_then(Value::as_str)
            .filter(|data| !data.is_empty() && *data != "0x")
            .map(ToString::to_string);

        let preview = TransactionPreview {
            origin: origin.as_str().to_string(),
            from: self.address().await,
            recipient: recipient.clone(),
            amount: units::format_display_amount(amount),
            amount_value: amount,
            has_data: memo.is_some(),
            memo: memo.clone(),
        };
        let receiver = self.approvals.begin(
            origin.as_str().to_string(),
            ConsentPayload::Transaction {
                recipient,
                amount,
                memo,
            },
            Some(self.config.approval_timeout()),
        )?;
        log::info!("transaction consent opened for {origin}");
        self.presenter.present_transaction(preview);
        self.await_consent(receiver).await
    }

    async fn sign_message(&self, origin: &Origin, params: &[Value]) -> Result<Value, BridgeError> {
        let raw = match params.first() {
            Some(Value::String(message)) if !message.is_empty() => message.clone(),
            _ => return Err(BridgeError::invalid_params("Invalid message parameters")),
        };
        let message = units::decode_message(&raw);

        let receiver = self.approvals.begin(
            origin.as_str().to_string(),
            ConsentPayload::Message {
                message: message.clone(),
            },
            self.config.message_approval_timeout(),
        )?;
        log::info!("message consent opened for {origin} ({} bytes)", message.len());
        self.presenter.present_message(MessagePreview {
            origin: origin.as_str().to_string(),
            message,
        });
        self.await_consent(receiver).await
    }

    async fn await_consent(&self, receiver: oneshot::Receiver<ConsentResult>) -> ConsentResult {
        let outcome = receiver.await.unwrap_or_else(|_| {
            Err(BridgeError::BackendFailure {
                message: "Approval was interrupted".to_string(),
            })
        });
        self.presenter.dismiss_consent();
        outcome
    }
}

fn recipient(tx: &Map<String, Value>) -> Option<String> {
    tx.get("to")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|to| !to.is_empty())
        .map(ToString::to_string)
}
