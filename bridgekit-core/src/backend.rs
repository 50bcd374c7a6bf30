//! The custody boundary: everything that touches keys goes through
//! [`WalletBackend`].

use crate::error::BackendError;

/// Message reported when a send fails without saying why.
pub const DEFAULT_SEND_FAILURE: &str = "Transaction failed";

/// Wallet operations implemented by the host.
///
/// The bridge calls these only after the user approved the matching consent.
/// The unlock secret is passed through untouched; validating it is the
/// backend's job, and a wrong secret should surface as
/// [`BackendError::Authentication`].
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait WalletBackend: Send + Sync {
    /// Builds, signs and broadcasts a transaction of `amount` coins to
    /// `recipient`, with an optional memo.
    async fn send_transaction(
        &self,
        recipient: String,
        amount: f64,
        memo: Option<String>,
        secret: String,
    ) -> Result<SendOutcome, BackendError>;

    /// Signs `message` with the wallet key.
    async fn sign_message(
        &self,
        message: String,
        secret: String,
    ) -> Result<SignedMessage, BackendError>;

    /// Returns the selected address, or `None` when no wallet is unlocked.
    async fn get_address(&self) -> Result<Option<String>, BackendError>;
}

/// What the backend reports after a send attempt.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SendOutcome {
    /// Whether the transaction was broadcast.
    pub success: bool,
    /// Identifier of the broadcast transaction.
    pub txid: Option<String>,
    /// Human readable status.
    pub message: String,
}

impl SendOutcome {
    /// Returns the transaction id of a successful send.
    ///
    /// # Errors
    ///
    /// An outcome that is not successful, or has no id, is a
    /// [`BackendError::Failed`] carrying the backend's message (or
    /// "Transaction failed" when it gave none).
    pub fn into_txid(self) -> Result<String, BackendError> {
        match self.txid {
            Some(txid) if self.success => Ok(txid),
            _ if self.message.is_empty() => Err(BackendError::Failed(DEFAULT_SEND_FAILURE.to_string())),
            _ => Err(BackendError::Failed(self.message)),
        }
    }
}

/// A detached signature produced by the backend.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SignedMessage {
    /// The encoded signature.
    pub signature: String,
}
