//! Artifact records and their merge semantics.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use objsync_core::{ObjectId, ResourceKind};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;

use crate::error::StorageError;

/// Identifies a record within one network: `kind/label`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    pub kind: ResourceKind,
    pub label: String,
}

impl ArtifactKey {
    pub fn new(kind: ResourceKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.label)
    }
}

impl FromStr for ArtifactKey {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, label) = s
            .split_once('/')
            .ok_or_else(|| StorageError::invalid_record(s, "expected kind/label"))?;
        let kind = kind
            .parse::<ResourceKind>()
            .map_err(|e| StorageError::invalid_record(s, e.to_string()))?;
        Ok(Self::new(kind, label))
    }
}

impl Serialize for ArtifactKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ArtifactKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifiers recorded after a resource was provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub network: String,
    pub kind: ResourceKind,
    pub label: String,
    /// The primary object: package id, currency id, price info id, config id.
    pub object_id: ObjectId,
    /// Related objects created alongside the primary one, by role.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub auxiliary_ids: BTreeMap<String, ObjectId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ArtifactRecord {
    pub fn new(
        network: impl Into<String>,
        kind: ResourceKind,
        label: impl Into<String>,
        object_id: ObjectId,
    ) -> Self {
        Self {
            network: network.into(),
            kind,
            label: label.into(),
            object_id,
            auxiliary_ids: BTreeMap::new(),
            attributes: BTreeMap::new(),
            object_type: None,
            digest: None,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_auxiliary_id(mut self, role: impl Into<String>, id: ObjectId) -> Self {
        self.auxiliary_ids.insert(role.into(), id);
        self
    }

    /// Records `id` under `role` when present.
    pub fn with_optional_auxiliary_id(self, role: impl Into<String>, id: Option<ObjectId>) -> Self {
        match id {
            Some(id) => self.with_auxiliary_id(role, id),
            None => self,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(self.kind, self.label.clone())
    }

    pub fn auxiliary_id(&self, role: &str) -> Option<ObjectId> {
        self.auxiliary_ids.get(role).copied()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Checks the invariants a stored record must satisfy.
    pub fn validate(&self, network: &str) -> Result<(), StorageError> {
        if self.label.trim().is_empty() {
            return Err(StorageError::invalid_record(
                self.key().to_string(),
                "label must not be empty",
            ));
        }
        if self.network != network {
            return Err(StorageError::invalid_record(
                self.key().to_string(),
                format!(
                    "record belongs to network {} but was written to {network}",
                    self.network
                ),
            ));
        }
        Ok(())
    }

    /// Folds a newer record for the same key into this one.
    ///
    /// When the primary object is unchanged, auxiliary ids and attributes
    /// accumulate with the newer values winning. A different primary object
    /// means the resource was recreated and the old record is replaced.
    pub fn merge(&mut self, newer: ArtifactRecord) {
        if self.object_id != newer.object_id {
            *self = newer;
            return;
        }

        self.auxiliary_ids.extend(newer.auxiliary_ids);
        self.attributes.extend(newer.attributes);
        if newer.object_type.is_some() {
            self.object_type = newer.object_type;
        }
        if newer.digest.is_some() {
            self.digest = newer.digest;
        }
        self.updated_at = newer.updated_at;
    }
}

/// Every record of one network.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactSet {
    pub network: String,
    #[serde(default)]
    pub records: BTreeMap<ArtifactKey, ArtifactRecord>,
}

impl ArtifactSet {
    pub fn empty(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            records: BTreeMap::new(),
        }
    }

    pub fn get(&self, kind: ResourceKind, label: &str) -> Option<&ArtifactRecord> {
        self.records.get(&ArtifactKey::new(kind, label))
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ArtifactRecord> {
        self.records.values().filter(move |record| record.kind == kind)
    }

    /// Most recently updated record of `kind` satisfying `predicate`.
    pub fn latest<F>(&self, kind: ResourceKind, predicate: F) -> Option<&ArtifactRecord>
    where
        F: Fn(&ArtifactRecord) -> bool,
    {
        self.of_kind(kind)
            .filter(|record| predicate(record))
            .max_by_key(|record| record.updated_at)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validates and merges every record of `patch` into this set.
    /// Removals run before upserts.
    pub fn apply(&mut self, patch: ArtifactPatch) -> Result<(), StorageError> {
        for record in &patch.records {
            record.validate(&self.network)?;
        }
        for key in &patch.removals {
            if let Some(removed) = self.records.remove(key) {
                tracing::debug!(%key, object_id = %removed.object_id, "dropping artifact record");
            }
        }
        for record in patch.records {
            match self.records.get_mut(&record.key()) {
                Some(existing) => {
                    if existing.object_id != record.object_id {
                        tracing::debug!(
                            key = %record.key(),
                            previous = %existing.object_id,
                            object_id = %record.object_id,
                            "replacing artifact record"
                        );
                    }
                    existing.merge(record);
                }
                None => {
                    self.records.insert(record.key(), record);
                }
            }
        }
        Ok(())
    }
}

/// Records to merge into a network's artifact set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactPatch {
    pub records: Vec<ArtifactRecord>,
    /// Keys dropped from the set, e.g. a record superseded under a new label.
    pub removals: Vec<ArtifactKey>,
}

impl ArtifactPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(record: ArtifactRecord) -> Self {
        Self {
            records: vec![record],
            removals: Vec::new(),
        }
    }

    pub fn upsert(mut self, record: ArtifactRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn remove(mut self, key: ArtifactKey) -> Self {
        self.removals.push(key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.removals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn feed(id: u8) -> ArtifactRecord {
        ArtifactRecord::new("localnet", ResourceKind::PriceFeed, "MOCK_SUI_FEED", ObjectId::short(id))
    }

    #[test]
    fn test_key_round_trip() {
        let key = ArtifactKey::new(ResourceKind::ConfigObject, "amm/primary");
        assert_eq!(key.to_string(), "config_object/amm/primary");
        assert_eq!(key.to_string().parse::<ArtifactKey>().unwrap(), key);
        assert!("nope".parse::<ArtifactKey>().is_err());
    }

    #[test]
    fn test_merge_same_object_accumulates() {
        let mut set = ArtifactSet::empty("localnet");
        set.apply(ArtifactPatch::single(
            feed(1).with_attribute("feed_id", "0x20"),
        ))
        .unwrap();
        set.apply(ArtifactPatch::single(
            feed(1).with_auxiliary_id("clock", ObjectId::short(6)),
        ))
        .unwrap();

        let record = set.get(ResourceKind::PriceFeed, "MOCK_SUI_FEED").unwrap();
        assert_eq!(record.attribute("feed_id"), Some("0x20"));
        assert_eq!(record.auxiliary_id("clock"), Some(ObjectId::short(6)));
    }

    #[test]
    fn test_merge_new_object_replaces() {
        let mut set = ArtifactSet::empty("localnet");
        set.apply(ArtifactPatch::single(
            feed(1).with_attribute("stale", "yes"),
        ))
        .unwrap();
        set.apply(ArtifactPatch::single(feed(2))).unwrap();

        let record = set.get(ResourceKind::PriceFeed, "MOCK_SUI_FEED").unwrap();
        assert_eq!(record.object_id, ObjectId::short(2));
        assert!(record.attribute("stale").is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_patch_drops_superseded_key() {
        let mut set = ArtifactSet::empty("localnet");
        let mut old = feed(1);
        old.label = "OLD_FEED".into();
        set.apply(ArtifactPatch::single(old.clone())).unwrap();

        set.apply(ArtifactPatch::single(feed(2)).remove(old.key())).unwrap();

        assert_eq!(set.len(), 1);
        assert!(set.get(ResourceKind::PriceFeed, "OLD_FEED").is_none());
        assert_eq!(
            set.get(ResourceKind::PriceFeed, "MOCK_SUI_FEED").unwrap().object_id,
            ObjectId::short(2)
        );
    }

    #[test]
    fn test_apply_rejects_foreign_network() {
        let mut set = ArtifactSet::empty("testnet");
        let err = set.apply(ArtifactPatch::single(feed(1))).unwrap_err();
        assert!(matches!(err, StorageError::InvalidRecord { .. }));
        assert!(set.is_empty());
    }

    #[test]
    fn test_latest_by_updated_at() {
        let mut older = ArtifactRecord::new("localnet", ResourceKind::ConfigObject, "a", ObjectId::short(1));
        older.updated_at = datetime!(2026-01-01 00:00 UTC);
        let mut newer = ArtifactRecord::new("localnet", ResourceKind::ConfigObject, "b", ObjectId::short(2));
        newer.updated_at = datetime!(2026-02-01 00:00 UTC);

        let mut set = ArtifactSet::empty("localnet");
        set.apply(ArtifactPatch::new().upsert(older).upsert(newer)).unwrap();

        let latest = set.latest(ResourceKind::ConfigObject, |_| true).unwrap();
        assert_eq!(latest.label, "b");
        assert!(set.latest(ResourceKind::Package, |_| true).is_none());
    }

    #[test]
    fn test_set_json_shape() {
        let mut set = ArtifactSet::empty("localnet");
        set.apply(ArtifactPatch::single(feed(1))).unwrap();
        let json = serde_json::to_value(&set).unwrap();
        assert!(json["records"]["price_feed/MOCK_SUI_FEED"]["object_id"].is_string());

        let back: ArtifactSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }
}
