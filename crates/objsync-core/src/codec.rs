//! Conversions between domain values and the ledger's argument encodings.
//!
//! Move call arguments only accept unsigned integers and raw byte vectors, so
//! signed domain values travel as a `(magnitude, is_negative)` pair and
//! loosely formatted hex strings are normalized into fixed-length byte
//! vectors before they reach a transaction plan.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// A signed integer split into its unsigned magnitude and sign flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedMagnitude {
    pub magnitude: u64,
    pub is_negative: bool,
}

/// Encodes a signed integer as magnitude and sign.
///
/// # Errors
///
/// Returns `CodecError::Range` when `|value|` does not fit into a `u64`.
pub fn encode_signed_magnitude(value: i128) -> Result<SignedMagnitude, CodecError> {
    let magnitude = u64::try_from(value.unsigned_abs())
        .map_err(|_| CodecError::range(value, "magnitude exceeds the u64 range"))?;

    Ok(SignedMagnitude {
        magnitude,
        is_negative: value < 0,
    })
}

/// Inverse of [`encode_signed_magnitude`]. A negative zero decodes to zero.
pub fn decode_signed_magnitude(magnitude: u64, is_negative: bool) -> i128 {
    let value = i128::from(magnitude);
    if is_negative { -value } else { value }
}

/// Strips surrounding whitespace and an optional `0x`/`0X` prefix.
pub fn strip_hex_prefix(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

/// Lowercase, `0x`-prefixed form used for equality comparisons.
///
/// Does not validate the digits; use [`encode_fixed_hex`] for that.
pub fn normalize_hex(input: &str) -> String {
    format!("0x{}", strip_hex_prefix(input).to_ascii_lowercase())
}

/// Decodes a hex string into exactly `expected_len` bytes.
///
/// # Errors
///
/// Returns `CodecError::Format` when the digit count differs from
/// `expected_len * 2` or a character is not a hex digit.
pub fn encode_fixed_hex(input: &str, expected_len: usize) -> Result<Vec<u8>, CodecError> {
    let digits = strip_hex_prefix(input);
    if digits.len() != expected_len * 2 {
        return Err(CodecError::format(
            input,
            format!(
                "expected {} hex digits ({expected_len} bytes), found {}",
                expected_len * 2,
                digits.len()
            ),
        ));
    }

    hex::decode(digits).map_err(|e| CodecError::format(input, e.to_string()))
}

/// Renders bytes as lowercase `0x`-prefixed hex.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
