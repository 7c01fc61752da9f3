//! JSON-RPC ledger client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use objsync_core::{
    Address, CoinBalance, DiscoveredResource, ExecutionMode, LedgerClient, LedgerError,
    LedgerResult, ObjectId, PublishPlan, SUI_COIN_TYPE, Signer, TransactionEffects,
    TransactionPlan,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::decode::{self, ObjectResponse, Page, PastObjectResponse, RpcCoin};
use crate::wire::{self, ObjectRef, ProgrammableTransaction};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Envelope {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

fn object_options() -> Value {
    json!({ "showType": true, "showOwner": true, "showContent": true })
}

/// A Sui full node reached over JSON-RPC, plus an optional faucet.
pub struct SuiRpcClient {
    http: reqwest::Client,
    rpc_url: String,
    faucet_url: Option<String>,
    next_id: AtomicU64,
}

impl SuiRpcClient {
    pub fn new(rpc_url: impl Into<String>) -> LedgerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            rpc_url: rpc_url.into(),
            faucet_url: None,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn with_faucet(mut self, faucet_url: Option<String>) -> Self {
        self.faucet_url = faucet_url;
        self
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn rpc_call<T: DeserializeOwned>(&self, method: &str, params: Value) -> LedgerResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });

        tracing::debug!(method, id, "rpc request");
        let resp = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::transport(format!("{method}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LedgerError::transport(format!(
                "{method}: HTTP {status}: {text}"
            )));
        }

        let envelope: Envelope = resp
            .json()
            .await
            .map_err(|e| LedgerError::decode(format!("{method}: {e}")))?;

        if let Some(error) = envelope.error {
            tracing::debug!(method, code = error.code, message = %error.message, "rpc error");
            // Lock and gas failures are reported as RPC errors before execution.
            let classified = LedgerError::from_execution_failure(&error.message);
            return Err(if classified.is_contention() {
                classified
            } else {
                LedgerError::rpc(error.code, error.message)
            });
        }

        let result = envelope
            .result
            .ok_or_else(|| LedgerError::decode(format!("{method}: response has no result")))?;
        decode::from_value(method, result)
    }

    pub async fn reference_gas_price(&self) -> LedgerResult<u64> {
        let price: Value = self.rpc_call("suix_getReferenceGasPrice", json!([])).await?;
        let parsed = match &price {
            Value::String(text) => text.parse().ok(),
            Value::Number(number) => number.as_u64(),
            _ => None,
        };
        parsed.ok_or_else(|| LedgerError::decode(format!("invalid reference gas price: {price}")))
    }

    async fn fetch_coins(&self, owner: Address, coin_type: &str) -> LedgerResult<Vec<RpcCoin>> {
        let mut coins = Vec::new();
        let mut cursor = Value::Null;
        loop {
            let page: Page<RpcCoin> = self
                .rpc_call(
                    "suix_getCoins",
                    json!([owner.to_string(), coin_type, cursor, Value::Null]),
                )
                .await?;
            let next = page.next();
            coins.extend(page.data);
            match next {
                Some(next) => cursor = next,
                None => break,
            }
        }
        Ok(coins)
    }

    /// The largest SUI coin of `owner` that the transaction does not
    /// already use as an input.
    async fn select_gas(&self, owner: Address, exclude: &[ObjectId]) -> LedgerResult<ObjectRef> {
        let coins = self.fetch_coins(owner, SUI_COIN_TYPE).await?;
        let coin = coins
            .iter()
            .filter(|coin| !exclude.contains(&coin.coin_object_id))
            .max_by_key(|coin| coin.balance)
            .ok_or_else(|| LedgerError::insufficient_gas(format!("no gas coins for {owner}")))?;

        tracing::debug!(coin = %coin.coin_object_id, balance = coin.balance, "selected gas coin");
        Ok((
            *coin.coin_object_id.as_bytes(),
            coin.version,
            wire::decode_digest(&coin.digest)?,
        ))
    }

    async fn encode(
        &self,
        programmable: ProgrammableTransaction,
        sender: Address,
        budget: u64,
        exclude: &[ObjectId],
    ) -> LedgerResult<String> {
        let gas = self.select_gas(sender, exclude).await?;
        let price = self.reference_gas_price().await?;
        let data = wire::transaction_data(programmable, sender, gas, price, budget);
        Ok(base64::engine::general_purpose::STANDARD.encode(wire::to_bytes(&data)?))
    }

    async fn execute(&self, tx_bytes: &str, signer: &dyn Signer) -> LedgerResult<TransactionEffects> {
        let signature = signer.sign(tx_bytes).await?;
        let response: Value = self
            .rpc_call(
                "sui_executeTransactionBlock",
                json!([
                    tx_bytes,
                    [signature],
                    { "showEffects": true, "showObjectChanges": true },
                    "WaitForLocalExecution"
                ]),
            )
            .await?;
        decode::parse_effects(response, false)
    }

    async fn dry_run(&self, tx_bytes: &str) -> LedgerResult<TransactionEffects> {
        let response: Value = self
            .rpc_call("sui_dryRunTransactionBlock", json!([tx_bytes]))
            .await?;
        decode::parse_effects(response, true)
    }
}

#[async_trait]
impl LedgerClient for SuiRpcClient {
    async fn get_object(&self, id: ObjectId) -> LedgerResult<DiscoveredResource> {
        let response: ObjectResponse = self
            .rpc_call("sui_getObject", json!([id.to_string(), object_options()]))
            .await?;
        response.into_resource(id)
    }

    async fn get_object_at_version(
        &self,
        id: ObjectId,
        version: u64,
    ) -> LedgerResult<DiscoveredResource> {
        let response: PastObjectResponse = self
            .rpc_call(
                "sui_tryGetPastObject",
                json!([id.to_string(), version, object_options()]),
            )
            .await?;
        response.into_resource(id)
    }

    async fn get_owned_objects(
        &self,
        owner: Address,
        struct_type: &str,
    ) -> LedgerResult<Vec<DiscoveredResource>> {
        let query = json!({
            "filter": { "StructType": struct_type },
            "options": object_options(),
        });

        let mut objects = Vec::new();
        let mut cursor = Value::Null;
        loop {
            let page: Page<ObjectResponse> = self
                .rpc_call(
                    "suix_getOwnedObjects",
                    json!([owner.to_string(), query, cursor, Value::Null]),
                )
                .await?;
            let next = page.next();
            for entry in page.data {
                match entry.into_resource(ObjectId::ZERO) {
                    Ok(resource) => objects.push(resource),
                    Err(err) if err.is_not_found() => continue,
                    Err(err) => return Err(err),
                }
            }
            match next {
                Some(next) => cursor = next,
                None => break,
            }
        }
        Ok(objects)
    }

    async fn get_coins(&self, owner: Address, coin_type: &str) -> LedgerResult<Vec<CoinBalance>> {
        let coins = self.fetch_coins(owner, coin_type).await?;
        Ok(coins.iter().map(CoinBalance::from).collect())
    }

    async fn submit(
        &self,
        plan: &TransactionPlan,
        signer: &dyn Signer,
        mode: ExecutionMode,
    ) -> LedgerResult<TransactionEffects> {
        let sender = signer.address();

        let mut resolved = HashMap::new();
        for id in wire::owned_inputs(plan) {
            resolved.insert(id, self.get_object(id).await?);
        }
        let programmable = wire::build_programmable(plan, &resolved)?;

        let inputs: Vec<ObjectId> = plan
            .calls
            .iter()
            .flat_map(|call| call.arguments.iter())
            .filter_map(|arg| arg.object_id())
            .collect();
        let tx_bytes = self
            .encode(programmable, sender, plan.gas_budget, &inputs)
            .await?;

        tracing::info!(plan = %plan.label, calls = plan.calls.len(), ?mode, "submitting transaction");
        match mode {
            ExecutionMode::DryRun => self.dry_run(&tx_bytes).await,
            ExecutionMode::Execute => self.execute(&tx_bytes, signer).await,
        }
    }

    async fn publish(
        &self,
        plan: &PublishPlan,
        signer: &dyn Signer,
    ) -> LedgerResult<TransactionEffects> {
        let sender = signer.address();
        let programmable = wire::build_publish(plan, sender)?;
        let tx_bytes = self
            .encode(programmable, sender, plan.gas_budget, &[])
            .await?;

        tracing::info!(package = %plan.label, modules = plan.modules.len(), "publishing package");
        self.execute(&tx_bytes, signer).await
    }

    async fn request_funds(&self, address: Address) -> LedgerResult<()> {
        let Some(faucet_url) = &self.faucet_url else {
            return Err(LedgerError::unsupported("this network has no faucet"));
        };

        tracing::info!(%address, faucet = %faucet_url, "requesting funds");
        let resp = self
            .http
            .post(faucet_url)
            .json(&json!({ "FixedAmountRequest": { "recipient": address.to_string() } }))
            .send()
            .await
            .map_err(|e| LedgerError::transport(format!("faucet: {e}")))?;

        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(LedgerError::transport(format!("faucet: HTTP {status}: {body}")));
        }
        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(LedgerError::transport(format!("faucet: {error}")));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sui-jsonrpc"
    }
}
