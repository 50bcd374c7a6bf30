use thiserror::Error;

use crate::storage::StorageError;

/// Error outputs from the host bridge.
///
/// The `Display` form of each variant is the exact message posted back to the
/// page in the `error` field of a response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error, uniffi::Error)]
pub enum BridgeError {
    /// A provider or consent timer elapsed before the request settled.
    #[error("{message}")]
    Timeout {
        /// Human readable description of what timed out.
        message: String,
    },
    /// The user explicitly rejected or dismissed a consent dialog.
    #[error("{message}")]
    UserRejected {
        /// Which dialog was rejected.
        message: String,
    },
    /// The method arguments are missing or malformed.
    #[error("{message}")]
    InvalidParams {
        /// Description of the invalid parameter.
        message: String,
    },
    /// The requested method is not part of the supported namespace.
    #[error("Unsupported method: {method}")]
    UnsupportedMethod {
        /// The method name sent by the page.
        method: String,
    },
    /// The user refused to connect the wallet to the requesting origin.
    #[error("User denied connection")]
    PermissionDenied,
    /// The origin exceeded its request budget.
    #[error("Too many requests. Please wait a moment.")]
    RateLimited,
    /// No wallet address is available (locked or missing wallet).
    #[error("Wallet not connected")]
    WalletNotConnected,
    /// A consent dialog is already open.
    #[error("A request is already pending")]
    RequestAlreadyPending,
    /// An approval or rejection arrived while no consent was pending.
    #[error("No pending request")]
    NoPendingRequest,
    /// The wallet backend refused or failed the operation.
    #[error("{message}")]
    BackendFailure {
        /// The backend's message, propagated verbatim.
        message: String,
    },
    /// The page is not embedded, so no host can be reached.
    #[error("provider not available")]
    ProviderUnavailable,
    /// The address could not be parsed as a URL.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// The rejected address.
        url: String,
    },
    /// Unexpected error serializing information.
    #[error("serialization_error: {0}")]
    Serialization(String),
    /// Persisting or loading bridge state failed.
    #[error("storage_error: {0}")]
    Storage(String),
}

impl BridgeError {
    pub(crate) fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    pub(crate) fn user_rejected(message: impl Into<String>) -> Self {
        Self::UserRejected {
            message: message.into(),
        }
    }

    pub(crate) fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }
}

impl From<BackendError> for BridgeError {
    fn from(error: BackendError) -> Self {
        Self::BackendFailure {
            message: error.to_string(),
        }
    }
}

impl From<StorageError> for BridgeError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Errors raised by a host-implemented [`crate::WalletBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Error, uniffi::Error)]
pub enum BackendError {
    /// The unlock secret was not accepted.
    #[error("{0}")]
    Authentication(String),
    /// The operation was attempted and failed.
    #[error("{0}")]
    Failed(String),
    /// Unexpected `UniFFI` callback error.
    #[error("unexpected uniffi callback error: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for BackendError {
    fn from(error: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(error.reason)
    }
}

/// Failures seen by page scripts calling the injected [`crate::Provider`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The page is not embedded in a wallet host.
    #[error("provider not available")]
    Unavailable,
    /// No response arrived within the provider timeout.
    #[error("Request timeout")]
    Timeout,
    /// The host answered with an error.
    #[error("{0}")]
    Rejected(String),
    /// The call could not be sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ProviderError> for BridgeError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Unavailable => Self::ProviderUnavailable,
            ProviderError::Timeout => Self::timeout(ProviderError::Timeout.to_string()),
            ProviderError::Rejected(message) => Self::BackendFailure { message },
            ProviderError::InvalidRequest(message) => Self::InvalidParams { message },
        }
    }
}
