//! The single consent slot.
//!
//! At most one consent is open at a time. A consent moves
//! `Idle -> Pending -> (Approving ->) Idle`; every exit from `Pending` aborts
//! its timer and consumes its completion sender, so a consent settles exactly
//! once.

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use crate::consent::{ConsentKind, ConsentSnapshot};
use crate::error::BridgeError;

/// Outcome delivered to the request waiting on a consent.
pub(crate) type ConsentResult = Result<Value, BridgeError>;

/// What the backend needs once a consent is approved.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConsentPayload {
    Transaction {
        recipient: String,
        amount: f64,
        memo: Option<String>,
    },
    Message {
        message: String,
    },
}

impl ConsentPayload {
    const fn kind(&self) -> ConsentKind {
        match self {
            Self::Transaction { .. } => ConsentKind::Transaction,
            Self::Message { .. } => ConsentKind::Message,
        }
    }
}

const fn rejection_message(kind: ConsentKind) -> &'static str {
    match kind {
        ConsentKind::Transaction => "User rejected transaction",
        ConsentKind::Message => "User rejected message signing",
    }
}

const fn timeout_message(kind: ConsentKind) -> &'static str {
    match kind {
        ConsentKind::Transaction => "Transaction request timed out",
        ConsentKind::Message => "Message signing request timed out",
    }
}

const INTERRUPTED_MESSAGE: &str = "Approval was interrupted";

struct PendingConsent {
    id: u64,
    origin: String,
    payload: ConsentPayload,
    completion: oneshot::Sender<ConsentResult>,
    timer: Option<AbortHandle>,
}

impl PendingConsent {
    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

#[derive(Default)]
enum State {
    #[default]
    Idle,
    Pending(PendingConsent),
    Approving {
        kind: ConsentKind,
        origin: String,
    },
}

impl State {
    /// Takes the pending consent out, leaving `Idle`. Other states are left
    /// untouched.
    fn take_pending(&mut self) -> Option<PendingConsent> {
        match mem::take(self) {
            Self::Pending(pending) => Some(pending),
            other => {
                *self = other;
                None
            }
        }
    }
}

/// Owner of the consent slot of one bridge.
#[derive(Default)]
pub(crate) struct ApprovalMachine {
    state: Mutex<State>,
    next_id: Mutex<u64>,
}

impl ApprovalMachine {
    /// Opens a consent. The returned receiver yields its single outcome.
    ///
    /// With a `timeout`, the consent fails with a timeout error if it is
    /// still pending when the timer fires. Must be called within a tokio
    /// runtime when `timeout` is set.
    pub(crate) fn begin(
        self: &Arc<Self>,
        origin: String,
        payload: ConsentPayload,
        timeout: Option<Duration>,
    ) -> Result<oneshot::Receiver<ConsentResult>, BridgeError> {
        let mut state = self.lock();
        if !matches!(*state, State::Idle) {
            return Err(BridgeError::RequestAlreadyPending);
        }

        let id = {
            let mut next_id = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
            *next_id += 1;
            *next_id
        };
        let timer = timeout.map(|timeout| {
            let machine = Arc::downgrade(self);
            tokio::spawn(Self::expire_after(machine, id, timeout)).abort_handle()
        });
        let (completion, receiver) = oneshot::channel();
        *state = State::Pending(PendingConsent {
            id,
            origin,
            payload,
            completion,
            timer,
        });
        Ok(receiver)
    }

    async fn expire_after(machine: Weak<Self>, id: u64, timeout: Duration) {
        tokio::time::sleep(timeout).await;
        if let Some(machine) = machine.upgrade() {
            machine.time_out(id);
        }
    }

    /// Moves the pending consent to `Approving` and hands out its payload.
    ///
    /// The returned [`Approval`] must be settled with the backend's outcome;
    /// dropping it unsettled fails the consent and frees the slot.
    pub(crate) fn take_for_approval(self: &Arc<Self>) -> Result<Approval, BridgeError> {
        let mut state = self.lock();
        let mut pending = state.take_pending().ok_or(BridgeError::NoPendingRequest)?;
        pending.stop_timer();
        *state = State::Approving {
            kind: pending.payload.kind(),
            origin: pending.origin,
        };
        Ok(Approval {
            machine: Arc::clone(self),
            payload: pending.payload,
            completion: Some(pending.completion),
        })
    }

    /// Rejects the pending consent on the user's behalf.
    pub(crate) fn reject(&self) -> Result<ConsentKind, BridgeError> {
        let mut pending = self
            .lock()
            .take_pending()
            .ok_or(BridgeError::NoPendingRequest)?;
        pending.stop_timer();
        let kind = pending.payload.kind();
        // the waiting request may already be gone
        let _ = pending
            .completion
            .send(Err(BridgeError::user_rejected(rejection_message(kind))));
        Ok(kind)
    }

    fn time_out(&self, id: u64) {
        let mut state = self.lock();
        if !matches!(&*state, State::Pending(pending) if pending.id == id) {
            return;
        }
        if let Some(pending) = state.take_pending() {
            let kind = pending.payload.kind();
            log::info!("{kind:?} consent for {} timed out", pending.origin);
            let _ = pending
                .completion
                .send(Err(BridgeError::timeout(timeout_message(kind))));
        }
    }

    /// The consent currently open, if any.
    pub(crate) fn snapshot(&self) -> Option<ConsentSnapshot> {
        match &*self.lock() {
            State::Idle => None,
            State::Pending(pending) => Some(ConsentSnapshot {
                kind: pending.payload.kind(),
                origin: pending.origin.clone(),
                approving: false,
            }),
            State::Approving { kind, origin } => Some(ConsentSnapshot {
                kind: *kind,
                origin: origin.clone(),
                approving: true,
            }),
        }
    }

    fn finish_approval(&self) {
        let mut state = self.lock();
        if matches!(*state, State::Approving { .. }) {
            *state = State::Idle;
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An approved consent whose backend call is in flight.
pub(crate) struct Approval {
    machine: Arc<ApprovalMachine>,
    payload: ConsentPayload,
    completion: Option<oneshot::Sender<ConsentResult>>,
}

impl Approval {
    pub(crate) const fn payload(&self) -> &ConsentPayload {
        &self.payload
    }

    /// Frees the slot, then delivers `result` to the waiting request.
    pub(crate) fn settle(mut self, result: ConsentResult) {
        self.machine.finish_approval();
        if let Some(completion) = self.completion.take() {
            let _ = completion.send(result);
        }
    }
}

impl Drop for Approval {
    fn drop(&mut self) {
        if let Some(completion) = self.completion.take() {
            log::warn!(
                "{:?} approval dropped before the backend answered; its outcome is unknown",
                self.payload.kind()
            );
            self.machine.finish_approval();
            let _ = completion.send(Err(BridgeError::BackendFailure {
                message: INTERRUPTED_MESSAGE.to_string(),
            }));
        }
    }
}
