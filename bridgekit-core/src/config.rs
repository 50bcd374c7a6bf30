//! Bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::BridgeError;

/// Tunables for one host bridge instance.
///
/// Every field has a default, so a partial JSON document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct BridgeConfig {
    /// Identifier answered to `*_chainId`.
    pub chain_id: String,
    /// Provider-side wait for a response envelope.
    pub provider_timeout_ms: u64,
    /// Lifetime of a transaction consent.
    pub approval_timeout_ms: u64,
    /// Lifetime of a message-signing consent. `None` leaves it open until the
    /// user acts.
    pub message_approval_timeout_ms: Option<u64>,
    /// Lifetime of the connect prompt; expiry counts as a denial.
    pub connect_prompt_timeout_ms: u64,
    /// Requests admitted per origin within one window.
    pub rate_limit_max_requests: u32,
    /// Length of the trailing rate window.
    pub rate_limit_window_ms: u64,
    /// Grace period of the generic untrusted-site warning. `None` waits for an
    /// explicit choice.
    pub untrusted_warning_grace_ms: Option<u64>,
    /// Base units per displayed coin.
    pub atomic_units_per_coin: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            chain_id: defaults::CHAIN_ID.to_string(),
            provider_timeout_ms: defaults::PROVIDER_TIMEOUT_MS,
            approval_timeout_ms: defaults::APPROVAL_TIMEOUT_MS,
            message_approval_timeout_ms: Some(defaults::APPROVAL_TIMEOUT_MS),
            connect_prompt_timeout_ms: defaults::CONNECT_PROMPT_TIMEOUT_MS,
            rate_limit_max_requests: defaults::RATE_LIMIT_MAX_REQUESTS,
            rate_limit_window_ms: defaults::RATE_LIMIT_WINDOW_MS,
            untrusted_warning_grace_ms: Some(defaults::UNTRUSTED_WARNING_GRACE_MS),
            atomic_units_per_coin: defaults::ATOMIC_UNITS_PER_COIN,
        }
    }
}

impl BridgeConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidParams`] if the document is not valid or
    /// a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| BridgeError::invalid_params(format!("invalid bridge config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configured limits are usable.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidParams`] naming the first bad field.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.rate_limit_max_requests == 0 {
            return Err(BridgeError::invalid_params(
                "rate_limit_max_requests must be at least 1",
            ));
        }
        if self.atomic_units_per_coin == 0 {
            return Err(BridgeError::invalid_params(
                "atomic_units_per_coin must be at least 1",
            ));
        }
        Ok(())
    }

    pub(crate) const fn approval_timeout(&self) -> Duration {
        Duration::from_millis(self.approval_timeout_ms)
    }

    pub(crate) fn message_approval_timeout(&self) -> Option<Duration> {
        self.message_approval_timeout_ms.map(Duration::from_millis)
    }

    pub(crate) const fn connect_prompt_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_prompt_timeout_ms)
    }

    pub(crate) const fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub(crate) fn untrusted_warning_grace(&self) -> Option<Duration> {
        self.untrusted_warning_grace_ms.map(Duration::from_millis)
    }
}
