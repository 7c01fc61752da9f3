//! Kind-specific provisioners.

mod amm_config;
mod currency;
mod package;
mod price_feed;

pub use amm_config::{AmmConfigParams, AmmConfigProvisioner};
pub use currency::CurrencyProvisioner;
pub use package::PackageProvisioner;
pub use price_feed::{PriceFeedProvisioner, refresh_price_feeds};
pub(crate) use price_feed::shared_ref;

/// Auxiliary id roles recorded next to the primary object.
pub mod roles {
    pub const UPGRADE_CAP: &str = "upgrade_cap";
    pub const ADMIN_CAP_STORE: &str = "admin_cap_store";
    pub const ADMIN_CAP: &str = "admin_cap";
    pub const TREASURY_CAP: &str = "treasury_cap";
    pub const METADATA: &str = "metadata";
    pub const MINTED_COIN: &str = "minted_coin";
}

/// Record attribute names.
pub mod attrs {
    pub const FEED_ID: &str = "feed_id";
    pub const PACKAGE_ID: &str = "package_id";
    pub const COIN_TYPE: &str = "coin_type";
    pub const SOURCE_PATH: &str = "source_path";
    pub const INITIAL_SHARED_VERSION: &str = "initial_shared_version";
}
