//! Mock oracle price feed values.

use serde::{Deserialize, Serialize};

use crate::codec::{encode_fixed_hex, encode_signed_magnitude};
use crate::error::CodecError;
use crate::matcher::identity_matches;

/// Feed ids are 32 bytes.
pub const FEED_ID_LENGTH: usize = 32;

pub const DEFAULT_FEED_LABEL: &str = "MOCK_SUI_FEED";
pub const DEFAULT_FEED_ID: &str =
    "0x202122232425262728292a2b2c2d2e2f303132333435363738393a3b3c3d3e3f";

/// A labeled price feed with a signed domain value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFeedConfig {
    pub label: String,
    pub feed_id: String,
    pub price: i64,
    pub exponent: i32,
    pub confidence: u64,
}

impl PriceFeedConfig {
    /// Approximate SUI/USD: 1.84 with exponent -2.
    pub fn mock_sui() -> Self {
        Self {
            label: DEFAULT_FEED_LABEL.to_string(),
            feed_id: DEFAULT_FEED_ID.to_string(),
            price: 184,
            exponent: -2,
            confidence: 2,
        }
    }

    /// The 32 raw feed id bytes.
    pub fn feed_id_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode_fixed_hex(&self.feed_id, FEED_ID_LENGTH)
    }

    pub fn value(&self) -> Result<PriceFeedValue, CodecError> {
        PriceFeedValue::from_config(self)
    }
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self::mock_sui()
    }
}

/// Unsigned wire form of a price feed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFeedValue {
    pub magnitude: u64,
    pub is_negative: bool,
    pub exponent_magnitude: u64,
    pub exponent_is_negative: bool,
    pub confidence: u64,
}

impl PriceFeedValue {
    pub fn from_config(config: &PriceFeedConfig) -> Result<Self, CodecError> {
        let price = encode_signed_magnitude(i128::from(config.price))?;
        let exponent = encode_signed_magnitude(i128::from(config.exponent))?;
        Ok(Self {
            magnitude: price.magnitude,
            is_negative: price.is_negative,
            exponent_magnitude: exponent.magnitude,
            exponent_is_negative: exponent.is_negative,
            confidence: config.confidence,
        })
    }
}

/// Finds the first config whose label or feed id identifies the candidate.
pub fn find_feed_config<'a>(
    configs: &'a [PriceFeedConfig],
    label: Option<&str>,
    feed_id: Option<&str>,
) -> Option<&'a PriceFeedConfig> {
    configs
        .iter()
        .find(|config| identity_matches(&config.label, &config.feed_id, label, feed_id))
}
