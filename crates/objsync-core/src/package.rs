//! Compiled Move packages.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::id::ObjectId;
use crate::ledger::LedgerResult;

/// Bytecode ready for publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledPackage {
    /// Base64-encoded modules.
    pub modules: Vec<String>,
    pub dependencies: Vec<ObjectId>,
}

/// Compiles Move sources into a [`CompiledPackage`].
#[async_trait]
pub trait PackageBuilder: Send + Sync {
    /// `with_unpublished_dependencies` bundles dependencies that have no
    /// on-chain address, which only makes sense on a throwaway network.
    async fn build(
        &self,
        path: &Path,
        with_unpublished_dependencies: bool,
    ) -> LedgerResult<CompiledPackage>;
}
