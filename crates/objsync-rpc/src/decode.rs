//! JSON-RPC response decoding.
//!
//! The node renders numbers inconsistently (`version` is a decimal string,
//! `initial_shared_version` a number), so every numeric field goes through
//! [`de_u64`].

use objsync_core::{
    CoinBalance, CreatedObject, DiscoveredResource, ExecutionStatus, LedgerError, LedgerResult,
    MoveFields, ObjectId, Owner, TransactionEffects,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn de_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

pub(crate) fn from_value<T: for<'de> Deserialize<'de>>(what: &str, value: Value) -> LedgerResult<T> {
    serde_json::from_value(value).map_err(|e| LedgerError::decode(format!("{what}: {e}")))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObjectResponse {
    data: Option<ObjectData>,
    error: Option<ObjectResponseError>,
}

#[derive(Debug, Deserialize)]
struct ObjectResponseError {
    code: String,
    #[serde(default)]
    object_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectData {
    object_id: ObjectId,
    #[serde(deserialize_with = "de_u64")]
    version: u64,
    digest: Option<String>,
    #[serde(rename = "type")]
    object_type: Option<String>,
    owner: Option<Value>,
    content: Option<ObjectContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectContent {
    data_type: String,
    #[serde(default)]
    fields: Value,
}

impl ObjectResponse {
    /// Resolves the response for `requested`; missing and deleted objects
    /// are `NotFound`.
    pub(crate) fn into_resource(self, requested: ObjectId) -> LedgerResult<DiscoveredResource> {
        if let Some(error) = self.error {
            return Err(match error.code.as_str() {
                "notExists" | "deleted" | "dynamicFieldNotFound" => {
                    LedgerError::not_found(error.object_id.unwrap_or_else(|| requested.to_string()))
                }
                other => LedgerError::decode(format!("object {requested}: {other}")),
            });
        }
        let data = self.data.ok_or_else(|| LedgerError::not_found(requested))?;
        data.into_resource()
    }
}

impl ObjectData {
    fn into_resource(self) -> LedgerResult<DiscoveredResource> {
        let is_package = self.object_type.as_deref() == Some("package")
            || self
                .content
                .as_ref()
                .is_some_and(|content| content.data_type == "package");

        let owner = match &self.owner {
            Some(value) => parse_owner(value)?,
            None if is_package => Owner::Immutable,
            None => {
                return Err(LedgerError::decode(format!(
                    "object {} has no owner",
                    self.object_id
                )));
            }
        };

        let object_type = match self.object_type {
            Some(object_type) => object_type,
            None if is_package => "package".to_string(),
            None => {
                return Err(LedgerError::decode(format!(
                    "object {} has no type",
                    self.object_id
                )));
            }
        };

        let fields = match self.content {
            Some(content) if !is_package => MoveFields::from_value(content.fields),
            _ => MoveFields::default(),
        };

        Ok(DiscoveredResource {
            object_id: self.object_id,
            object_type,
            owner,
            version: self.version,
            digest: self.digest,
            is_package,
            fields,
        })
    }
}

/// Ownership in any of the node's renderings: `"Immutable"`,
/// `{"AddressOwner": ..}`, `{"ObjectOwner": ..}` or
/// `{"Shared": {"initial_shared_version": n}}`.
pub(crate) fn parse_owner(value: &Value) -> LedgerResult<Owner> {
    #[derive(Deserialize)]
    enum Tagged {
        AddressOwner(ObjectId),
        ObjectOwner(ObjectId),
        Shared {
            #[serde(deserialize_with = "de_u64")]
            initial_shared_version: u64,
        },
    }

    if value.as_str() == Some("Immutable") {
        return Ok(Owner::Immutable);
    }
    let tagged: Tagged = from_value("owner", value.clone())?;
    Ok(match tagged {
        Tagged::AddressOwner(address) => Owner::Address { address },
        Tagged::ObjectOwner(parent) => Owner::Object { parent },
        Tagged::Shared {
            initial_shared_version,
        } => Owner::Shared {
            initial_shared_version,
        },
    })
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Page<T> {
    pub data: Vec<T>,
    pub next_cursor: Option<Value>,
    #[serde(default)]
    pub has_next_page: bool,
}

impl<T> Page<T> {
    /// The cursor for the following request, if any.
    pub fn next(&self) -> Option<Value> {
        if self.has_next_page {
            self.next_cursor.clone().filter(|cursor| !cursor.is_null())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcCoin {
    pub coin_type: String,
    pub coin_object_id: ObjectId,
    #[serde(deserialize_with = "de_u64")]
    pub version: u64,
    pub digest: String,
    #[serde(deserialize_with = "de_u64")]
    pub balance: u64,
}

impl From<&RpcCoin> for CoinBalance {
    fn from(coin: &RpcCoin) -> Self {
        Self {
            object_id: coin.coin_object_id,
            coin_type: coin.coin_type.clone(),
            balance: coin.balance,
            version: coin.version,
        }
    }
}

/// Result of `sui_tryGetPastObject`.
#[derive(Debug, Deserialize)]
pub(crate) struct PastObjectResponse {
    status: String,
    details: Option<Value>,
}

impl PastObjectResponse {
    pub(crate) fn into_resource(self, requested: ObjectId) -> LedgerResult<DiscoveredResource> {
        match (self.status.as_str(), self.details) {
            ("VersionFound", Some(details)) => {
                from_value::<ObjectData>("past object", details)?.into_resource()
            }
            _ => Err(LedgerError::not_found(requested)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionResponse {
    digest: Option<String>,
    effects: EffectsData,
    #[serde(default)]
    object_changes: Vec<ObjectChange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EffectsData {
    status: StatusData,
    transaction_digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    status: String,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ObjectChange {
    #[serde(rename_all = "camelCase")]
    Created {
        object_id: ObjectId,
        object_type: String,
        owner: Value,
        #[serde(deserialize_with = "de_u64")]
        version: u64,
    },
    #[serde(rename_all = "camelCase")]
    Published { package_id: ObjectId },
    #[serde(other)]
    Other,
}

/// Decodes an execute or dry-run response. A failed status is returned as
/// data, not as an error.
pub(crate) fn parse_effects(value: Value, dry_run: bool) -> LedgerResult<TransactionEffects> {
    let response: ExecutionResponse = from_value("transaction response", value)?;

    let digest = response
        .digest
        .or(response.effects.transaction_digest)
        .ok_or_else(|| LedgerError::decode("transaction response has no digest"))?;

    let status = match response.effects.status.status.as_str() {
        "success" => ExecutionStatus::Success,
        _ => ExecutionStatus::Failure {
            error: response
                .effects
                .status
                .error
                .unwrap_or_else(|| "unknown execution failure".to_string()),
        },
    };

    let mut created = Vec::new();
    let mut published_package = None;
    for change in response.object_changes {
        match change {
            ObjectChange::Created {
                object_id,
                object_type,
                owner,
                version,
            } => created.push(CreatedObject {
                object_id,
                object_type,
                owner: parse_owner(&owner)?,
                version,
            }),
            ObjectChange::Published { package_id } => published_package = Some(package_id),
            ObjectChange::Other => {}
        }
    }

    Ok(TransactionEffects {
        digest,
        status,
        created,
        published_package,
        dry_run,
    })
}
