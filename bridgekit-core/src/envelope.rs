//! Wire format of the cross-context message channel.
//!
//! Every message crossing the channel is a JSON object whose `type` field
//! selects one of four envelope kinds. Anything else is not an envelope and
//! is dropped by the receiver.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

const REQUEST_ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A message exchanged between the injected provider and the host bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelEnvelope {
    /// Page to host: a correlated method call.
    #[serde(rename = "WALLET_REQUEST")]
    Request(RequestEnvelope),
    /// Host to page: the single settle of a correlated call.
    #[serde(rename = "WALLET_RESPONSE")]
    Response(ResponseEnvelope),
    /// Host to page: unsolicited account announcement.
    #[serde(rename = "WALLET_PROVIDER_INJECT")]
    ProviderInject {
        /// The announced account state.
        provider: ProviderAnnouncement,
    },
    /// Page to host: asks the host to announce the provider again.
    #[serde(rename = "WALLET_REQUEST_PROVIDER")]
    RequestProvider,
}

impl ChannelEnvelope {
    /// Parses one channel message.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON and for objects whose `type` is not
    /// one of the known tags. Receivers log and drop such messages.
    pub fn parse(message: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(message)
    }

    /// Serializes the envelope for posting on a channel.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Serialization`] if a payload value cannot be
    /// encoded.
    pub fn to_json(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Short name of the envelope kind, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Request(_) => "WALLET_REQUEST",
            Self::Response(_) => "WALLET_RESPONSE",
            Self::ProviderInject { .. } => "WALLET_PROVIDER_INJECT",
            Self::RequestProvider => "WALLET_REQUEST_PROVIDER",
        }
    }
}

/// A correlated method call sent by the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    /// Requested method, e.g. `eth_requestAccounts`.
    pub method: String,
    /// Ordered method arguments.
    #[serde(default)]
    pub params: Vec<Value>,
    /// Correlation id echoed in the response.
    pub request_id: String,
}

/// The settle of one correlated call.
///
/// Built only through [`ResponseEnvelope::success`] and
/// [`ResponseEnvelope::failure`], so exactly one of `result` or `error` is
/// set on everything the bridge sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ResponseEnvelope {
    /// A successful response carrying `result`.
    #[must_use]
    pub fn success(request_id: impl Into<String>, result: Value) -> Self {
        Self {
            request_id: request_id.into(),
            result: Some(result),
            error: None,
        }
    }

    /// A failed response carrying the page-facing error message.
    #[must_use]
    pub fn failure(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            result: None,
            error: Some(error.into()),
        }
    }

    /// The correlation id this response settles.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Consumes the envelope into the outcome it carries.
    ///
    /// An `error` field wins over `result`; a response carrying neither
    /// settles successfully with `null`.
    ///
    /// # Errors
    ///
    /// Returns the host's error message when the response is a failure.
    pub fn into_result(self) -> Result<Value, String> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Account state announced by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAnnouncement {
    /// The selected address, or `None` when no wallet is unlocked.
    #[serde(default)]
    pub address: Option<String>,
}

/// Generates a correlation id: the current time in milliseconds plus a random
/// base-36 suffix.
#[must_use]
pub fn generate_request_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis());
    let mut rng = rand::thread_rng();
    let suffix: String = (0..REQUEST_ID_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("{millis}-{suffix}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parses_request_from_page() {
        let envelope = ChannelEnvelope::parse(
            r#"{"type":"WALLET_REQUEST","method":"eth_accounts","params":[],"requestId":"1-abc"}"#,
        )
        .unwrap();
        assert_eq!(
            envelope,
            ChannelEnvelope::Request(RequestEnvelope {
                method: "eth_accounts".to_string(),
                params: vec![],
                request_id: "1-abc".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_params_default_to_empty() {
        let envelope = ChannelEnvelope::parse(
            r#"{"type":"WALLET_REQUEST","method":"eth_chainId","requestId":"x"}"#,
        )
        .unwrap();
        let ChannelEnvelope::Request(request) = envelope else {
            panic!("expected a request");
        };
        assert!(request.params.is_empty());
    }

    #[test]
    fn test_unknown_or_untagged_payloads_are_rejected() {
        assert!(ChannelEnvelope::parse(r#"{"type":"SOMETHING_ELSE"}"#).is_err());
        assert!(ChannelEnvelope::parse(r#"{"method":"eth_accounts"}"#).is_err());
        assert!(ChannelEnvelope::parse("\"hello\"").is_err());
    }

    #[test]
    fn test_response_carries_exactly_one_outcome() {
        let ok = ChannelEnvelope::Response(ResponseEnvelope::success("r1", json!(["zs1abc"])));
        let value: Value = serde_json::from_str(&ok.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "WALLET_RESPONSE", "requestId": "r1", "result": ["zs1abc"]})
        );

        let err = ChannelEnvelope::Response(ResponseEnvelope::failure("r2", "No pending request"));
        let value: Value = serde_json::from_str(&err.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "WALLET_RESPONSE", "requestId": "r2", "error": "No pending request"})
        );
    }

    #[test]
    fn test_error_wins_and_empty_response_is_null() {
        let both: ResponseEnvelope =
            serde_json::from_str(r#"{"requestId":"a","result":1,"error":"boom"}"#).unwrap();
        assert_eq!(both.into_result(), Err("boom".to_string()));

        let neither: ResponseEnvelope = serde_json::from_str(r#"{"requestId":"b"}"#).unwrap();
        assert_eq!(neither.into_result(), Ok(Value::Null));
    }

    #[test]
    fn test_announcement_serializes_null_address() {
        let envelope = ChannelEnvelope::ProviderInject {
            provider: ProviderAnnouncement { address: None },
        };
        let value: Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "WALLET_PROVIDER_INJECT", "provider": {"address": null}})
        );
        assert_eq!(
            ChannelEnvelope::parse(r#"{"type":"WALLET_REQUEST_PROVIDER"}"#).unwrap(),
            ChannelEnvelope::RequestProvider
        );
    }

    #[test]
    fn test_request_ids_are_distinct() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert_ne!(a, b);
        let (_, suffix) = a.split_once('-').unwrap();
        assert_eq!(suffix.len(), 9);
    }
}
