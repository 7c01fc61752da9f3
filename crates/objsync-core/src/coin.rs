//! Mock coin seeds.

use serde::{Deserialize, Serialize};

use crate::id::ObjectId;

/// A mock coin initialized through the coin registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoinSeed {
    pub label: String,
    pub module: String,
    pub type_name: String,
    /// Entry function taking `(&mut CoinRegistry, address)`.
    pub init_function: String,
}

impl CoinSeed {
    pub fn local_mock_usd() -> Self {
        Self {
            label: "LocalMockUsd".into(),
            module: "mock_coin".into(),
            type_name: "LocalMockUsd".into(),
            init_function: "init_local_mock_usd".into(),
        }
    }

    /// `package::module::Type`
    pub fn coin_type(&self, package: ObjectId) -> String {
        format!("{package}::{}::{}", self.module, self.type_name)
    }
}

/// `0x2::coin_registry::Currency<T>`
pub fn currency_type(coin_type: &str) -> String {
    format!("::coin_registry::Currency<{coin_type}>")
}

pub fn treasury_cap_type(coin_type: &str) -> String {
    format!("::coin::TreasuryCap<{coin_type}>")
}

pub fn metadata_type(coin_type: &str) -> String {
    format!("::coin::CoinMetadata<{coin_type}>")
}

pub fn coin_object_type(coin_type: &str) -> String {
    format!("::coin::Coin<{coin_type}>")
}
