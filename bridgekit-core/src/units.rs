//! Value and message decoding for consent previews.

use serde_json::Value;

use crate::defaults::DISPLAY_DECIMALS;
use crate::error::BridgeError;

/// Parses a transaction `value` field into base units.
///
/// Accepts a hex string with or without `0x`, or a JSON integer. A missing or
/// `null` value, and a bare `"0x"`, are zero.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidParams`] for anything else.
pub fn parse_base_units(value: Option<&Value>) -> Result<u64, BridgeError> {
    let invalid = || BridgeError::invalid_params("Invalid transaction value");
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(number)) => number.as_u64().ok_or_else(invalid),
        Some(Value::String(text)) => {
            let digits = strip_hex_prefix(text.trim());
            if digits.is_empty() {
                return Ok(0);
            }
            u64::from_str_radix(digits, 16).map_err(|_| invalid())
        }
        Some(_) => Err(invalid()),
    }
}

/// Converts base units to the display denomination.
#[must_use]
#[allow(clippy::cast_precision_loss)] // display amounts are shown with 8 decimals
pub fn to_display_amount(base_units: u64, units_per_coin: u64) -> f64 {
    base_units as f64 / units_per_coin as f64
}

/// Formats a display amount with a fixed eight decimals, e.g. `1.00000000`.
#[must_use]
pub fn format_display_amount(amount: f64) -> String {
    format!("{amount:.prec$}", prec = DISPLAY_DECIMALS)
}

/// Decodes a `0x`-prefixed hex message into text for the signing dialog.
///
/// Decoding stops at the first zero byte. Messages that are not hex, have an
/// odd number of digits, or decode to nothing are returned unchanged.
#[must_use]
pub fn decode_message(message: &str) -> String {
    let Some(digits) = message.strip_prefix("0x") else {
        return message.to_string();
    };
    let Ok(bytes) = hex::decode(digits) else {
        return message.to_string();
    };
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let bytes = &bytes[..end];
    if bytes.is_empty() {
        return message.to_string();
    }
    std::str::from_utf8(bytes).map_or_else(
        |_| bytes.iter().copied().map(char::from).collect(),
        ToString::to_string,
    )
}

fn strip_hex_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}
