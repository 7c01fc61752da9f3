//! Snapshots of ledger objects.

use serde::{Deserialize, Serialize};

use crate::fields::MoveFields;
use crate::id::{Address, ObjectId};

/// Object ownership as reported by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Owner {
    Address { address: Address },
    Object { parent: ObjectId },
    Shared { initial_shared_version: u64 },
    Immutable,
}

/// A point-in-time read of one ledger object. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredResource {
    pub object_id: ObjectId,
    /// Fully qualified Move type, `"package"` for packages.
    pub object_type: String,
    pub owner: Owner,
    pub version: u64,
    pub digest: Option<String>,
    pub is_package: bool,
    #[serde(default)]
    pub fields: MoveFields,
}

impl DiscoveredResource {
    pub fn type_contains(&self, needle: &str) -> bool {
        !self.is_package && self.object_type.contains(needle)
    }

    /// Reference for use as a shared transaction input.
    ///
    /// Returns `None` when the object is not shared.
    pub fn shared_ref(&self, mutable: bool) -> Option<SharedObjectRef> {
        match self.owner {
            Owner::Shared {
                initial_shared_version,
            } => Some(SharedObjectRef {
                object_id: self.object_id,
                initial_shared_version,
                mutable,
            }),
            _ => None,
        }
    }

    pub fn owner_address(&self) -> Option<Address> {
        match self.owner {
            Owner::Address { address } => Some(address),
            _ => None,
        }
    }

    /// Package id that defines this object's type, parsed from the type tag.
    pub fn type_package_id(&self) -> Option<ObjectId> {
        if self.is_package {
            return None;
        }
        let (package, _) = self.object_type.split_once("::")?;
        ObjectId::parse(package).ok()
    }
}

/// A shared object input. Re-fetched after contention since
/// `initial_shared_version` never changes but the object may be gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedObjectRef {
    pub object_id: ObjectId,
    pub initial_shared_version: u64,
    pub mutable: bool,
}

/// A capability object held by an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityHandle {
    pub object_id: ObjectId,
    pub owner: Address,
    pub granting_store_id: Option<ObjectId>,
}

/// One coin object and its balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinBalance {
    pub object_id: ObjectId,
    pub coin_type: String,
    pub balance: u64,
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_config() -> DiscoveredResource {
        DiscoveredResource {
            object_id: ObjectId::short(0x99),
            object_type: format!("{}::manager::AMMConfig", ObjectId::short(0x42)),
            owner: Owner::Shared {
                initial_shared_version: 7,
            },
            version: 12,
            digest: None,
            is_package: false,
            fields: MoveFields::default(),
        }
    }

    #[test]
    fn test_shared_ref() {
        let resource = shared_config();
        let shared = resource.shared_ref(true).unwrap();
        assert_eq!(shared.initial_shared_version, 7);
        assert!(shared.mutable);
        assert!(resource.owner_address().is_none());
    }

    #[test]
    fn test_type_package_id() {
        let resource = shared_config();
        assert_eq!(resource.type_package_id(), Some(ObjectId::short(0x42)));
        assert!(resource.type_contains("::manager::AMMConfig"));
    }

    #[test]
    fn test_owned_object_has_no_shared_ref() {
        let mut resource = shared_config();
        resource.owner = Owner::Address {
            address: ObjectId::short(0x1),
        };
        assert!(resource.shared_ref(false).is_none());
        assert_eq!(resource.owner_address(), Some(ObjectId::short(0x1)));
    }
}
