//! Ledger object identifiers and account addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::strip_hex_prefix;
use crate::error::CodecError;

/// Length in bytes of object ids and addresses.
pub const OBJECT_ID_LENGTH: usize = 32;

/// A 32-byte object id.
///
/// Parsing follows the ledger's normalization rules: an optional `0x`
/// prefix, at most 64 hex digits, left zero-padded. `0x2` and
/// `0x000…002` are the same id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LENGTH]);

/// Account addresses share the object id space.
pub type Address = ObjectId;

/// The shared clock object.
pub const SUI_CLOCK_ID: ObjectId = ObjectId::short(0x6);

/// The shared coin registry object.
pub const SUI_COIN_REGISTRY_ID: ObjectId = ObjectId::short(0xc);

/// The framework package that hosts `coin` and `pay`.
pub const SUI_FRAMEWORK_ID: ObjectId = ObjectId::short(0x2);

impl ObjectId {
    pub const ZERO: Self = Self([0; OBJECT_ID_LENGTH]);

    pub const fn new(bytes: [u8; OBJECT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Well-known system ids such as `0x6`.
    pub const fn short(value: u8) -> Self {
        let mut bytes = [0u8; OBJECT_ID_LENGTH];
        bytes[OBJECT_ID_LENGTH - 1] = value;
        Self(bytes)
    }

    /// Parses a hex id.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Format` for empty, over-long or non-hex input.
    pub fn parse(input: &str) -> Result<Self, CodecError> {
        let digits = strip_hex_prefix(input);
        if digits.is_empty() {
            return Err(CodecError::format(input, "object id is empty"));
        }
        if digits.len() > OBJECT_ID_LENGTH * 2 {
            return Err(CodecError::format(
                input,
                format!("object id has more than {} hex digits", OBJECT_ID_LENGTH * 2),
            ));
        }

        let padded = format!("{digits:0>64}");
        let mut bytes = [0u8; OBJECT_ID_LENGTH];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| CodecError::format(input, e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LENGTH] {
        &self.0
    }

    /// Full-width lowercase hex with `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
