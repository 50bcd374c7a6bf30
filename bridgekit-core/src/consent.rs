//! The user-facing side of the bridge: prompts, dialogs and warnings the host
//! renders on the bridge's behalf.

use crate::security::{NavigationChoice, NavigationWarning};

/// UI surface implemented by the host.
///
/// Dialog methods return immediately; the user's answer comes back through
/// [`crate::HostBridge::approve_pending`] or
/// [`crate::HostBridge::reject_pending`]. Closing or escaping a dialog must be
/// reported as a rejection.
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait ConsentPresenter: Send + Sync {
    /// Asks whether `origin` may see the wallet address. Resolves when the
    /// user picks Allow or Deny.
    ///
    /// The bridge stops waiting after the connect prompt timeout and treats
    /// that as Deny. It then drops this future and calls
    /// [`ConsentPresenter::dismiss_consent`]; the host must close the prompt
    /// on either signal.
    async fn request_connection(&self, origin: String) -> ConnectDecision;

    /// Shows the transaction approval dialog.
    fn present_transaction(&self, preview: TransactionPreview);

    /// Shows the message signing dialog.
    fn present_message(&self, preview: MessagePreview);

    /// Closes whichever consent dialog is open. Called once per consent,
    /// after it settles for any reason, and once for each connect prompt
    /// that expires unanswered.
    fn dismiss_consent(&self);

    /// Shows an advisory warning that does not block navigation.
    fn show_navigation_warning(&self, warning: NavigationWarning);

    /// Shows a warning and waits for the user's choice.
    async fn confirm_navigation(&self, warning: NavigationWarning) -> NavigationChoice;
}

/// Answer to a connect prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ConnectDecision {
    /// Share the address and remember the grant.
    Allow,
    /// Refuse this request. Nothing is remembered.
    Deny,
}

/// Which consent dialog is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum ConsentKind {
    /// A transaction approval.
    Transaction,
    /// A message signature.
    Message,
}

/// Everything the transaction dialog displays.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct TransactionPreview {
    /// Page origin that asked for the transaction.
    pub origin: String,
    /// Address the funds leave from, if a wallet is unlocked.
    pub from: Option<String>,
    /// Destination address.
    pub recipient: String,
    /// Amount in coins with eight decimals, e.g. `1.00000000`.
    pub amount: String,
    /// Amount in coins.
    pub amount_value: f64,
    /// The memo passed along with the transaction.
    pub memo: Option<String>,
    /// Whether the page attached extra data the user should review.
    pub has_data: bool,
}

/// Everything the signing dialog displays.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct MessagePreview {
    /// Page origin that asked for the signature.
    pub origin: String,
    /// Message text after hex decoding; this is what gets signed.
    pub message: String,
}

/// The consent currently open, for the host UI.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct ConsentSnapshot {
    /// Dialog kind.
    pub kind: ConsentKind,
    /// Requesting origin.
    pub origin: String,
    /// Whether the user already approved and the backend call is running.
    pub approving: bool,
}
