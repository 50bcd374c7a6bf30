use std::str::FromStr;

use strum::EnumString;

/// A wallet operation the bridge serves.
///
/// Each operation is reachable under an Ethereum-style `eth_*` name and a
/// chain-native `zcash_*` alias; both resolve to the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString)]
pub enum WalletMethod {
    /// Ask for the connected account, prompting the user on first use.
    #[strum(serialize = "eth_requestAccounts", serialize = "zcash_requestAccounts")]
    RequestAccounts,
    /// Read the connected account without prompting.
    #[strum(serialize = "eth_accounts", serialize = "zcash_accounts")]
    Accounts,
    /// Read the network identifier.
    #[strum(serialize = "eth_chainId", serialize = "zcash_chainId")]
    ChainId,
    /// Submit a transaction after user approval.
    #[strum(serialize = "eth_sendTransaction", serialize = "zcash_sendTransaction")]
    SendTransaction,
    /// Sign a message after user approval.
    #[strum(
        serialize = "personal_sign",
        serialize = "eth_signMessage",
        serialize = "zcash_signMessage"
    )]
    SignMessage,
}

impl WalletMethod {
    /// Resolves a method name sent by the page. Names outside the supported
    /// namespace yield `None`.
    #[must_use]
    pub fn resolve(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }

    /// Whether the method opens a user-facing consent dialog.
    #[must_use]
    pub const fn requires_consent(self) -> bool {
        matches!(self, Self::SendTransaction | Self::SignMessage)
    }
}
