//! # objsync-core
//!
//! Domain types shared by every objsync crate.
//!
//! This crate has no I/O. It defines:
//! - object ids and the signed-magnitude / fixed-hex value codec
//! - resource descriptors and discovered ledger snapshots
//! - the descriptor/candidate matcher
//! - transaction plans and effects
//! - mock coin seeds and the package build abstraction
//! - the [`LedgerClient`] and [`Signer`] traits that ledger backends implement
//!
//! ## Example
//!
//! ```ignore
//! use objsync_core::prelude::*;
//!
//! async fn feed_exists(ledger: &dyn LedgerClient, pyth: ObjectId, id: ObjectId) -> bool {
//!     let desc = ResourceDescriptor::price_feed("MOCK_SUI_FEED", DEFAULT_FEED_ID, pyth);
//!     match ledger.get_object(id).await {
//!         Ok(resource) => matches_type(&desc, &resource).is_matched(),
//!         Err(_) => false,
//!     }
//! }
//! ```

pub mod codec;
pub mod coin;
pub mod descriptor;
mod error;
pub mod fields;
pub mod id;
pub mod ledger;
pub mod matcher;
pub mod object;
pub mod package;
pub mod price;
pub mod transaction;

pub use codec::{
    SignedMagnitude, decode_signed_magnitude, encode_fixed_hex, encode_signed_magnitude,
    normalize_hex, to_hex,
};
pub use coin::CoinSeed;
pub use descriptor::{
    AMM_CONFIG_SUFFIX, PRICE_INFO_OBJECT_SUFFIX, ResourceDescriptor, ResourceKind, match_keys,
};
pub use error::{CodecError, ErrorCategory};
pub use fields::{FieldError, MoveFields};
pub use id::{
    Address, OBJECT_ID_LENGTH, ObjectId, SUI_CLOCK_ID, SUI_COIN_REGISTRY_ID, SUI_FRAMEWORK_ID,
};
pub use ledger::{DynLedger, LedgerClient, LedgerError, LedgerResult, SUI_COIN_TYPE, Signer};
pub use matcher::{
    Candidate, MatchOutcome, MismatchReason, identity_matches, matches, matches_identity,
    matches_type,
};
pub use object::{CapabilityHandle, CoinBalance, DiscoveredResource, Owner, SharedObjectRef};
pub use package::{CompiledPackage, PackageBuilder};
pub use price::{
    DEFAULT_FEED_ID, DEFAULT_FEED_LABEL, FEED_ID_LENGTH, PriceFeedConfig, PriceFeedValue,
    find_feed_config,
};
pub use transaction::{
    CallArg, CreatedObject, DEFAULT_GAS_BUDGET, ExecutionMode, ExecutionStatus, MoveCall,
    PublishPlan, TransactionEffects, TransactionPlan,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        Address, CallArg, Candidate, CodecError, DEFAULT_FEED_ID, DiscoveredResource,
        ExecutionMode, LedgerClient, LedgerError, MatchOutcome, MoveCall, ObjectId, Owner,
        PriceFeedConfig, ResourceDescriptor, ResourceKind, SharedObjectRef, Signer,
        TransactionEffects, TransactionPlan, matches, matches_type,
    };
}
