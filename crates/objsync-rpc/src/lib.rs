//! # objsync-rpc
//!
//! Sui backends for the engine's ledger, signer and package builder seams.
//!
//! - [`SuiRpcClient`]: JSON-RPC reads, BCS transaction building, execution,
//!   dry runs and the localnet faucet
//! - [`KeytoolSigner`]: signs with keys held by `sui keytool`
//! - [`SuiMoveBuilder`]: compiles packages with `sui move build`

mod builder;
mod client;
mod decode;
mod process;
mod signer;
pub mod wire;

pub use builder::SuiMoveBuilder;
pub use client::{DEFAULT_TIMEOUT, SuiRpcClient};
pub use signer::KeytoolSigner;
