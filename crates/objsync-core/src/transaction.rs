//! Transaction plans and their effects.
//!
//! A [`TransactionPlan`] is a backend-neutral description of a programmable
//! transaction: an ordered list of Move calls whose arguments are typed pure
//! values, object references or results of earlier calls. Ledger clients turn
//! plans into the binary transaction format.

use serde::{Deserialize, Serialize};

use crate::id::{Address, ObjectId};
use crate::object::{Owner, SharedObjectRef};

/// Gas budget applied to plans that do not set one.
pub const DEFAULT_GAS_BUDGET: u64 = 100_000_000;

/// A Move call argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum CallArg {
    U64(u64),
    Bool(bool),
    Address(Address),
    /// `vector<u8>`
    Bytes(Vec<u8>),
    /// An owned or immutable object, resolved to its latest version.
    Object(ObjectId),
    Shared(SharedObjectRef),
    /// Result of the call at the given index within the same plan.
    Result(u16),
}

impl CallArg {
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            Self::Shared(shared) => Some(shared.object_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<CallArg>,
}

impl MoveCall {
    pub fn new(
        package: ObjectId,
        module: impl Into<String>,
        function: impl Into<String>,
        arguments: Vec<CallArg>,
    ) -> Self {
        Self {
            package,
            module: module.into(),
            function: function.into(),
            type_arguments: Vec::new(),
            arguments,
        }
    }

    pub fn with_type_arguments(mut self, type_arguments: Vec<String>) -> Self {
        self.type_arguments = type_arguments;
        self
    }

    /// `package::module::function`
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

/// An ordered list of Move calls submitted as one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPlan {
    /// Short name used in logs and summaries.
    pub label: String,
    pub calls: Vec<MoveCall>,
    pub gas_budget: u64,
}

impl TransactionPlan {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            calls: Vec::new(),
            gas_budget: DEFAULT_GAS_BUDGET,
        }
    }

    pub fn with_gas_budget(mut self, gas_budget: u64) -> Self {
        self.gas_budget = gas_budget;
        self
    }

    /// Appends a call and returns its result index.
    pub fn push(&mut self, call: MoveCall) -> u16 {
        self.calls.push(call);
        u16::try_from(self.calls.len() - 1).unwrap_or(u16::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Whether any call consumes the result of an earlier one.
    pub fn chains_results(&self) -> bool {
        self.calls
            .iter()
            .flat_map(|call| call.arguments.iter())
            .any(|arg| matches!(arg, CallArg::Result(_)))
    }
}

/// Publication of a compiled Move package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishPlan {
    pub label: String,
    /// Base64-encoded compiled modules.
    pub modules: Vec<String>,
    pub dependencies: Vec<ObjectId>,
    pub gas_budget: u64,
}

impl PublishPlan {
    pub fn new(label: impl Into<String>, modules: Vec<String>, dependencies: Vec<ObjectId>) -> Self {
        Self {
            label: label.into(),
            modules,
            dependencies,
            gas_budget: DEFAULT_GAS_BUDGET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Execute,
    /// Simulate only; no state changes.
    DryRun,
}

impl ExecutionMode {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun)
    }
}

/// An object created by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedObject {
    pub object_id: ObjectId,
    pub object_type: String,
    pub owner: Owner,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ExecutionStatus {
    Success,
    Failure { error: String },
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// The relevant part of a transaction's effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEffects {
    pub digest: String,
    pub status: ExecutionStatus,
    pub created: Vec<CreatedObject>,
    pub published_package: Option<ObjectId>,
    pub dry_run: bool,
}

impl TransactionEffects {
    /// Ids of created objects whose type ends with `suffix`, in effect order.
    pub fn find_created_ids(&self, suffix: &str) -> Vec<ObjectId> {
        self.created
            .iter()
            .filter(|object| object.object_type.ends_with(suffix))
            .map(|object| object.object_id)
            .collect()
    }

    pub fn find_created(&self, suffix: &str) -> Option<&CreatedObject> {
        self.created
            .iter()
            .find(|object| object.object_type.ends_with(suffix))
    }

    pub fn first_created_id(&self, suffix: &str) -> Option<ObjectId> {
        self.find_created(suffix).map(|object| object.object_id)
    }
}
