//! Desired-state descriptors.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::id::ObjectId;

/// Kinds of on-chain resources that can be provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Package,
    Currency,
    PriceFeed,
    ConfigObject,
}

impl ResourceKind {
    pub const ALL: [Self; 4] = [
        Self::Package,
        Self::Currency,
        Self::PriceFeed,
        Self::ConfigObject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Currency => "currency",
            Self::PriceFeed => "price_feed",
            Self::ConfigObject => "config_object",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CodecError::format(s, "unknown resource kind"))
    }
}

/// Well-known match keys.
pub mod match_keys {
    /// Substring the discovered object type must contain.
    pub const TYPE_SUFFIX: &str = "type_suffix";
    /// Expected price feed id (hex).
    pub const FEED_ID: &str = "feed_id";
    /// Fully qualified coin type.
    pub const COIN_TYPE: &str = "coin_type";
}

pub const PRICE_INFO_OBJECT_SUFFIX: &str = "::price_info::PriceInfoObject";
pub const AMM_CONFIG_SUFFIX: &str = "::manager::AMMConfig";

/// What should exist on the ledger.
///
/// Descriptors are built once per resolve step and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    kind: ResourceKind,
    label: String,
    match_keys: BTreeMap<String, String>,
}

impl ResourceDescriptor {
    pub fn new(
        kind: ResourceKind,
        label: impl Into<String>,
        match_keys: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            match_keys: match_keys.into_iter().collect(),
        }
    }

    pub fn package(label: impl Into<String>) -> Self {
        Self::new(ResourceKind::Package, label, [])
    }

    /// A currency whose registry entry is `Currency<coin_type>`.
    pub fn currency(label: impl Into<String>, coin_type: impl Into<String>) -> Self {
        let coin_type = coin_type.into();
        Self::new(
            ResourceKind::Currency,
            label,
            [
                (
                    match_keys::TYPE_SUFFIX.to_string(),
                    crate::coin::currency_type(&coin_type),
                ),
                (match_keys::COIN_TYPE.to_string(), coin_type),
            ],
        )
    }

    /// A price info object published by the given oracle package.
    pub fn price_feed(
        label: impl Into<String>,
        feed_id_hex: impl Into<String>,
        package_id: ObjectId,
    ) -> Self {
        Self::new(
            ResourceKind::PriceFeed,
            label,
            [
                (
                    match_keys::TYPE_SUFFIX.to_string(),
                    format!("{package_id}{PRICE_INFO_OBJECT_SUFFIX}"),
                ),
                (match_keys::FEED_ID.to_string(), feed_id_hex.into()),
            ],
        )
    }

    /// A config object of the given package. The type suffix is
    /// package-qualified so configs of older packages do not match.
    pub fn config_object(label: impl Into<String>, package_id: ObjectId) -> Self {
        Self::new(
            ResourceKind::ConfigObject,
            label,
            [(
                match_keys::TYPE_SUFFIX.to_string(),
                format!("{package_id}{AMM_CONFIG_SUFFIX}"),
            )],
        )
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn match_key(&self, key: &str) -> Option<&str> {
        self.match_keys.get(key).map(String::as_str)
    }

    pub fn type_suffix(&self) -> Option<&str> {
        self.match_key(match_keys::TYPE_SUFFIX)
    }

    pub fn feed_id(&self) -> Option<&str> {
        self.match_key(match_keys::FEED_ID)
    }
}
