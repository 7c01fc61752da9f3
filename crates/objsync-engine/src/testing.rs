//! Scripted in-memory ledger for engine tests.
//!
//! [`FakeLedger`] interprets the Move calls objsync issues (price feed
//! publish/update, AMM config create/share/update, admin cap claim, coin
//! registry init, coin split-and-transfer) closely enough to drive the
//! reconciler end to end. Unknown calls succeed without effects.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use objsync_core::{
    Address, CallArg, CoinBalance, CompiledPackage, CreatedObject, DiscoveredResource, ExecutionMode,
    ExecutionStatus, LedgerClient, LedgerError, LedgerResult, MoveCall, MoveFields, ObjectId,
    Owner, PackageBuilder, PublishPlan, SUI_CLOCK_ID, SUI_COIN_REGISTRY_ID, SUI_COIN_TYPE,
    SUI_FRAMEWORK_ID, Signer, TransactionEffects, TransactionPlan,
};
use serde_json::{Value, json};

/// Balance minted by a fake coin init call.
pub const MINTED_BALANCE: u64 = 1_000_000_000;

/// A transfer performed by `pay::split_and_transfer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransfer {
    pub source_coin: ObjectId,
    pub amount: u64,
    pub recipient: Address,
    pub coin_type: String,
}

#[derive(Debug, Clone, Default)]
struct State {
    next_id: u64,
    next_digest: u64,
    objects: HashMap<ObjectId, DiscoveredResource>,
    hidden_reads: HashMap<ObjectId, u32>,
    reads: HashMap<ObjectId, u32>,
    funded: HashSet<Address>,
    failures: VecDeque<LedgerError>,
    read_failures: VecDeque<LedgerError>,
    submissions: u32,
    dry_runs: u32,
    publishes: u32,
    faucet_requests: u32,
    executed: Vec<TransactionPlan>,
    transfers: Vec<RecordedTransfer>,
}

impl State {
    fn fresh_id(&mut self) -> ObjectId {
        self.next_id += 1;
        let mut bytes = [0u8; 32];
        bytes[0] = 0xf0;
        bytes[24..].copy_from_slice(&self.next_id.to_be_bytes());
        ObjectId::new(bytes)
    }

    fn fresh_digest(&mut self) -> String {
        self.next_digest += 1;
        format!("fake-digest-{}", self.next_digest)
    }

    fn insert(&mut self, object_type: String, owner: Owner, fields: Value) -> ObjectId {
        let object_id = self.fresh_id();
        self.objects.insert(
            object_id,
            DiscoveredResource {
                object_id,
                object_type,
                owner,
                version: 1,
                digest: None,
                is_package: false,
                fields: MoveFields::from_value(fields),
            },
        );
        object_id
    }
}

/// In-memory [`LedgerClient`].
pub struct FakeLedger {
    state: Mutex<State>,
    gas_for_everyone: bool,
    publish_lag: u32,
    coin_inits: HashMap<String, String>,
    publish_objects: HashMap<String, Vec<String>>,
}

impl Default for FakeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLedger {
    /// A ledger with the clock and coin registry, where every address
    /// holds gas and `init_local_mock_usd` mints `LocalMockUsd`.
    pub fn new() -> Self {
        let mut state = State::default();
        for (id, object_type) in [
            (SUI_CLOCK_ID, "0x2::clock::Clock"),
            (SUI_COIN_REGISTRY_ID, "0x2::coin_registry::CoinRegistry"),
        ] {
            state.objects.insert(
                id,
                DiscoveredResource {
                    object_id: id,
                    object_type: object_type.to_string(),
                    owner: Owner::Shared {
                        initial_shared_version: 1,
                    },
                    version: 1,
                    digest: None,
                    is_package: false,
                    fields: MoveFields::default(),
                },
            );
        }

        Self {
            state: Mutex::new(state),
            gas_for_everyone: true,
            publish_lag: 0,
            coin_inits: HashMap::from([(
                "init_local_mock_usd".to_string(),
                "LocalMockUsd".to_string(),
            )]),
            publish_objects: HashMap::new(),
        }
    }

    /// Addresses start without gas; the faucet funds them.
    pub fn without_gas(mut self) -> Self {
        self.gas_for_everyone = false;
        self
    }

    /// Packages stay invisible for `reads` reads after publication.
    pub fn with_publish_lag(mut self, reads: u32) -> Self {
        self.publish_lag = reads;
        self
    }

    /// Publishing a plan with `label` also creates shared objects of the
    /// given `module::Type`s inside the new package.
    pub fn with_publish_objects(mut self, label: &str, types: &[&str]) -> Self {
        self.publish_objects.insert(
            label.to_string(),
            types.iter().map(|t| (*t).to_string()).collect(),
        );
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The next submissions or publishes fail with these errors, in order.
    pub fn fail_next_submissions(&self, errors: impl IntoIterator<Item = LedgerError>) {
        self.state().failures.extend(errors);
    }

    /// The next object reads fail with these errors, in order.
    pub fn fail_next_reads(&self, errors: impl IntoIterator<Item = LedgerError>) {
        self.state().read_failures.extend(errors);
    }

    /// Inserts a package subject to the publish lag.
    pub fn insert_package(&self) -> ObjectId {
        let mut state = self.state();
        let id = state.insert("package".into(), Owner::Immutable, Value::Null);
        if let Some(object) = state.objects.get_mut(&id) {
            object.is_package = true;
        }
        if self.publish_lag > 0 {
            state.hidden_reads.insert(id, self.publish_lag);
        }
        id
    }

    pub fn insert_shared(&self, object_type: impl Into<String>, fields: Value) -> ObjectId {
        self.state().insert(
            object_type.into(),
            Owner::Shared {
                initial_shared_version: 1,
            },
            fields,
        )
    }

    pub fn insert_owned(
        &self,
        owner: Address,
        object_type: impl Into<String>,
        fields: Value,
    ) -> ObjectId {
        self.state()
            .insert(object_type.into(), Owner::Address { address: owner }, fields)
    }

    pub fn remove_object(&self, id: ObjectId) {
        self.state().objects.remove(&id);
    }

    /// Rewrites the type of a stored object.
    pub fn set_object_type(&self, id: ObjectId, object_type: impl Into<String>) {
        if let Some(object) = self.state().objects.get_mut(&id) {
            object.object_type = object_type.into();
        }
    }

    pub fn object(&self, id: ObjectId) -> Option<DiscoveredResource> {
        self.state().objects.get(&id).cloned()
    }

    /// Executed (non dry-run) submission attempts, failed ones included.
    pub fn submission_count(&self) -> u32 {
        self.state().submissions
    }

    pub fn dry_run_count(&self) -> u32 {
        self.state().dry_runs
    }

    pub fn publish_count(&self) -> u32 {
        self.state().publishes
    }

    /// Submissions plus publishes.
    pub fn transaction_count(&self) -> u32 {
        let state = self.state();
        state.submissions + state.publishes
    }

    pub fn faucet_requests(&self) -> u32 {
        self.state().faucet_requests
    }

    pub fn read_count(&self, id: ObjectId) -> u32 {
        self.state().reads.get(&id).copied().unwrap_or(0)
    }

    /// Successfully executed plans in submission order.
    pub fn executed_plans(&self) -> Vec<TransactionPlan> {
        self.state().executed.clone()
    }

    pub fn transfers(&self) -> Vec<RecordedTransfer> {
        self.state().transfers.clone()
    }

    fn has_gas(&self, state: &State, owner: Address) -> bool {
        self.gas_for_everyone || state.funded.contains(&owner)
    }

    fn execute(
        &self,
        state: &mut State,
        plan: &TransactionPlan,
        sender: Address,
    ) -> LedgerResult<Vec<ObjectId>> {
        let mut created = Vec::new();
        let mut results: Vec<Option<ObjectId>> = Vec::with_capacity(plan.calls.len());

        for call in &plan.calls {
            let result = self.execute_call(state, call, sender, &results, &mut created)?;
            results.push(result);
        }
        Ok(created)
    }

    fn execute_call(
        &self,
        state: &mut State,
        call: &MoveCall,
        sender: Address,
        results: &[Option<ObjectId>],
        created: &mut Vec<ObjectId>,
    ) -> LedgerResult<Option<ObjectId>> {
        let pkg = call.package;
        let args = &call.arguments;

        match (call.module.as_str(), call.function.as_str()) {
            ("price_info", "publish_price_feed") => {
                let mut fields = price_fields(args, 1)?;
                if let Value::Object(map) = &mut fields {
                    map.insert("feed_id".into(), json!(bytes_arg(args, 0)?));
                }
                let id = state.insert(
                    format!("{pkg}::price_info::PriceInfoObject"),
                    Owner::Shared {
                        initial_shared_version: 1,
                    },
                    fields,
                );
                created.push(id);
                Ok(Some(id))
            }
            ("price_info", "update_price_feed") => {
                let target = shared_arg(args, 0)?;
                let mut fields = price_fields(args, 1)?;
                let object = existing_mut(state, target)?;
                if !object.object_type.ends_with("::price_info::PriceInfoObject") {
                    return Err(LedgerError::execution_failed(
                        "update_price_feed: wrong object type",
                    ));
                }
                if let (Some(feed_id), Value::Object(map)) =
                    (object.fields.get("feed_id").cloned(), &mut fields)
                {
                    map.insert("feed_id".into(), feed_id);
                }
                object.fields = MoveFields::from_value(fields);
                object.version += 1;
                Ok(None)
            }
            ("manager", "create_amm_config") => {
                let fields = json!({
                    "base_spread_bps": u64_arg(args, 0)?.to_string(),
                    "volatility_multiplier_bps": u64_arg(args, 1)?.to_string(),
                    "use_laser": bool_arg(args, 2)?,
                    "trading_paused": false,
                    "pyth_price_feed_id": bytes_arg(args, 3)?,
                });
                let id = state.insert(
                    format!("{pkg}::manager::AMMConfig"),
                    Owner::Address { address: sender },
                    fields,
                );
                created.push(id);
                Ok(Some(id))
            }
            ("manager", "share_amm_config") => {
                let id = result_arg(args, 0, results)?;
                let object = existing_mut(state, id)?;
                object.owner = Owner::Shared {
                    initial_shared_version: object.version,
                };
                Ok(None)
            }
            ("manager", "update_amm_config") => {
                let config = shared_arg(args, 0)?;
                let cap = object_arg(args, 1)?;
                let cap_type = format!("{pkg}::manager::AMMAdminCap");
                match state.objects.get(&cap) {
                    Some(object)
                        if object.object_type == cap_type
                            && object.owner_address() == Some(sender) => {}
                    _ => return Err(LedgerError::execution_failed("MoveAbort: ENotAdmin")),
                }
                let fields = json!({
                    "base_spread_bps": u64_arg(args, 2)?.to_string(),
                    "volatility_multiplier_bps": u64_arg(args, 3)?.to_string(),
                    "use_laser": bool_arg(args, 4)?,
                    "trading_paused": bool_arg(args, 5)?,
                    "pyth_price_feed_id": bytes_arg(args, 6)?,
                });
                let object = existing_mut(state, config)?;
                object.fields = MoveFields::from_value(fields);
                object.version += 1;
                Ok(None)
            }
            ("manager", "claim_admin_cap") => {
                let store = shared_arg(args, 0)?;
                let object = existing_mut(state, store)?;
                if object.fields.require_bool("claimed").unwrap_or(false) {
                    return Err(LedgerError::execution_failed("MoveAbort: EAlreadyClaimed"));
                }
                object.fields = MoveFields::from_value(json!({ "claimed": true }));
                let id = state.insert(
                    format!("{pkg}::manager::AMMAdminCap"),
                    Owner::Address { address: sender },
                    json!({}),
                );
                created.push(id);
                Ok(Some(id))
            }
            ("pay", "split_and_transfer") => {
                let coin = object_arg(args, 0)?;
                let amount = u64_arg(args, 1)?;
                let recipient = address_arg(args, 2)?;
                let object = existing_mut(state, coin)?;
                if object.owner_address() != Some(sender) {
                    return Err(LedgerError::execution_failed("coin is not owned by the sender"));
                }
                let balance = object.fields.require_u64("balance").unwrap_or(0);
                if balance < amount {
                    return Err(LedgerError::execution_failed("MoveAbort: ENotEnough"));
                }
                object.fields =
                    MoveFields::from_value(json!({ "balance": (balance - amount).to_string() }));
                object.version += 1;
                let object_type = object.object_type.clone();
                let coin_type = call.type_arguments.first().cloned().unwrap_or_default();
                let id = state.insert(
                    object_type,
                    Owner::Address { address: recipient },
                    json!({ "balance": amount.to_string() }),
                );
                created.push(id);
                state.transfers.push(RecordedTransfer {
                    source_coin: coin,
                    amount,
                    recipient,
                    coin_type,
                });
                Ok(Some(id))
            }
            (module, function) if self.coin_inits.contains_key(function) => {
                shared_arg(args, 0)?;
                let owner = address_arg(args, 1)?;
                let type_name = &self.coin_inits[function];
                let coin_type = format!("{pkg}::{module}::{type_name}");
                let objects = [
                    (
                        format!("0x2::coin_registry::Currency<{coin_type}>"),
                        Owner::Shared {
                            initial_shared_version: 1,
                        },
                        json!({}),
                    ),
                    (
                        format!("0x2::coin::TreasuryCap<{coin_type}>"),
                        Owner::Address { address: owner },
                        json!({}),
                    ),
                    (
                        format!("0x2::coin::CoinMetadata<{coin_type}>"),
                        Owner::Immutable,
                        json!({}),
                    ),
                    (
                        format!("0x2::coin::Coin<{coin_type}>"),
                        Owner::Address { address: owner },
                        json!({ "balance": MINTED_BALANCE.to_string() }),
                    ),
                ];
                for (object_type, owner, fields) in objects {
                    let id = state.insert(object_type, owner, fields);
                    created.push(id);
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn effects(state: &mut State, created: &[ObjectId], dry_run: bool) -> TransactionEffects {
        let created = created
            .iter()
            .filter_map(|id| state.objects.get(id))
            .map(|object| CreatedObject {
                object_id: object.object_id,
                object_type: object.object_type.clone(),
                owner: object.owner,
                version: object.version,
            })
            .collect();
        TransactionEffects {
            digest: state.fresh_digest(),
            status: ExecutionStatus::Success,
            created,
            published_package: None,
            dry_run,
        }
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn get_object(&self, id: ObjectId) -> LedgerResult<DiscoveredResource> {
        let mut state = self.state();
        *state.reads.entry(id).or_default() += 1;
        if let Some(err) = state.read_failures.pop_front() {
            return Err(err);
        }
        if let Some(remaining) = state.hidden_reads.get_mut(&id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(LedgerError::not_found(id));
            }
        }
        state
            .objects
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found(id))
    }

    async fn get_object_at_version(
        &self,
        id: ObjectId,
        version: u64,
    ) -> LedgerResult<DiscoveredResource> {
        let object = self.get_object(id).await?;
        if object.version == version {
            Ok(object)
        } else {
            Err(LedgerError::not_found(format!("{id}@{version}")))
        }
    }

    async fn get_owned_objects(
        &self,
        owner: Address,
        struct_type: &str,
    ) -> LedgerResult<Vec<DiscoveredResource>> {
        let state = self.state();
        let mut owned: Vec<_> = state
            .objects
            .values()
            .filter(|object| {
                object.owner_address() == Some(owner) && object.object_type == struct_type
            })
            .cloned()
            .collect();
        owned.sort_by_key(|object| object.object_id);
        Ok(owned)
    }

    async fn get_coins(&self, owner: Address, coin_type: &str) -> LedgerResult<Vec<CoinBalance>> {
        let state = self.state();
        if coin_type == SUI_COIN_TYPE {
            if !self.has_gas(&state, owner) {
                return Ok(Vec::new());
            }
            return Ok(vec![CoinBalance {
                object_id: ObjectId::short(0xfe),
                coin_type: SUI_COIN_TYPE.to_string(),
                balance: 10_000_000_000,
                version: 1,
            }]);
        }

        let object_type = format!("0x2::coin::Coin<{coin_type}>");
        let mut coins: Vec<_> = state
            .objects
            .values()
            .filter(|object| {
                object.owner_address() == Some(owner) && object.object_type == object_type
            })
            .map(|object| CoinBalance {
                object_id: object.object_id,
                coin_type: coin_type.to_string(),
                balance: object.fields.require_u64("balance").unwrap_or(0),
                version: object.version,
            })
            .collect();
        coins.sort_by_key(|coin| coin.object_id);
        Ok(coins)
    }

    async fn submit(
        &self,
        plan: &TransactionPlan,
        signer: &dyn Signer,
        mode: ExecutionMode,
    ) -> LedgerResult<TransactionEffects> {
        let sender = signer.address();
        let mut state = self.state();

        if mode.is_dry_run() {
            state.dry_runs += 1;
            let mut scratch = state.clone();
            let created = self.execute(&mut scratch, plan, sender)?;
            return Ok(Self::effects(&mut scratch, &created, true));
        }

        state.submissions += 1;
        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }
        if !self.has_gas(&state, sender) {
            return Err(LedgerError::insufficient_gas("no gas coins"));
        }

        let mut scratch = state.clone();
        let created = self.execute(&mut scratch, plan, sender)?;
        let effects = Self::effects(&mut scratch, &created, false);
        scratch.executed.push(plan.clone());
        *state = scratch;
        Ok(effects)
    }

    async fn publish(
        &self,
        plan: &PublishPlan,
        signer: &dyn Signer,
    ) -> LedgerResult<TransactionEffects> {
        let sender = signer.address();
        {
            let mut state = self.state();
            state.publishes += 1;
            if let Some(err) = state.failures.pop_front() {
                return Err(err);
            }
            if !self.has_gas(&state, sender) {
                return Err(LedgerError::insufficient_gas("no gas coins"));
            }
        }

        let package = self.insert_package();
        let mut state = self.state();
        let mut created = vec![state.insert(
            "0x2::package::UpgradeCap".into(),
            Owner::Address { address: sender },
            json!({ "package": package.to_string() }),
        )];
        for object_type in self.publish_objects.get(&plan.label).into_iter().flatten() {
            created.push(state.insert(
                format!("{package}::{object_type}"),
                Owner::Shared {
                    initial_shared_version: 1,
                },
                json!({ "claimed": false }),
            ));
        }

        let mut effects = Self::effects(&mut state, &created, false);
        effects.published_package = Some(package);
        Ok(effects)
    }

    async fn request_funds(&self, address: Address) -> LedgerResult<()> {
        let mut state = self.state();
        state.faucet_requests += 1;
        state.funded.insert(address);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }
}

fn arg(args: &[CallArg], index: usize) -> LedgerResult<&CallArg> {
    args.get(index)
        .ok_or_else(|| LedgerError::execution_failed(format!("missing argument {index}")))
}

fn u64_arg(args: &[CallArg], index: usize) -> LedgerResult<u64> {
    match arg(args, index)? {
        CallArg::U64(value) => Ok(*value),
        other => Err(wrong_arg(index, "u64", other)),
    }
}

fn bool_arg(args: &[CallArg], index: usize) -> LedgerResult<bool> {
    match arg(args, index)? {
        CallArg::Bool(value) => Ok(*value),
        other => Err(wrong_arg(index, "bool", other)),
    }
}

fn bytes_arg(args: &[CallArg], index: usize) -> LedgerResult<Vec<u8>> {
    match arg(args, index)? {
        CallArg::Bytes(value) => Ok(value.clone()),
        other => Err(wrong_arg(index, "vector<u8>", other)),
    }
}

fn address_arg(args: &[CallArg], index: usize) -> LedgerResult<Address> {
    match arg(args, index)? {
        CallArg::Address(value) => Ok(*value),
        other => Err(wrong_arg(index, "address", other)),
    }
}

fn object_arg(args: &[CallArg], index: usize) -> LedgerResult<ObjectId> {
    match arg(args, index)? {
        CallArg::Object(id) => Ok(*id),
        other => Err(wrong_arg(index, "object", other)),
    }
}

fn shared_arg(args: &[CallArg], index: usize) -> LedgerResult<ObjectId> {
    match arg(args, index)? {
        CallArg::Shared(shared) => Ok(shared.object_id),
        other => Err(wrong_arg(index, "shared object", other)),
    }
}

fn result_arg(
    args: &[CallArg],
    index: usize,
    results: &[Option<ObjectId>],
) -> LedgerResult<ObjectId> {
    match arg(args, index)? {
        CallArg::Result(i) => results
            .get(usize::from(*i))
            .copied()
            .flatten()
            .ok_or_else(|| LedgerError::execution_failed(format!("result {i} has no object"))),
        other => Err(wrong_arg(index, "result", other)),
    }
}

fn wrong_arg(index: usize, expected: &str, actual: &CallArg) -> LedgerError {
    LedgerError::execution_failed(format!("argument {index}: expected {expected}, got {actual:?}"))
}

fn existing_mut(state: &mut State, id: ObjectId) -> LedgerResult<&mut DiscoveredResource> {
    state
        .objects
        .get_mut(&id)
        .ok_or_else(|| LedgerError::execution_failed(format!("object {id} does not exist")))
}

/// `(magnitude, is_negative, confidence, exponent_magnitude,
/// exponent_is_negative)` starting at `start`.
fn price_fields(args: &[CallArg], start: usize) -> LedgerResult<Value> {
    Ok(json!({
        "magnitude": u64_arg(args, start)?.to_string(),
        "is_negative": bool_arg(args, start + 1)?,
        "confidence": u64_arg(args, start + 2)?.to_string(),
        "exponent_magnitude": u64_arg(args, start + 3)?.to_string(),
        "exponent_is_negative": bool_arg(args, start + 4)?,
    }))
}

/// Signer with a fixed address and a placeholder signature.
#[derive(Debug, Clone, Copy)]
pub struct FakeSigner {
    address: Address,
}

impl FakeSigner {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

#[async_trait]
impl Signer for FakeSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign(&self, tx_bytes_b64: &str) -> LedgerResult<String> {
        Ok(format!("fake-signature:{}", tx_bytes_b64.len()))
    }
}

/// Builder that returns one placeholder module without compiling anything.
#[derive(Debug, Default)]
pub struct FakeBuilder {
    builds: AtomicU32,
}

impl FakeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build_count(&self) -> u32 {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PackageBuilder for FakeBuilder {
    async fn build(
        &self,
        _path: &Path,
        _with_unpublished_dependencies: bool,
    ) -> LedgerResult<CompiledPackage> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(CompiledPackage {
            modules: vec!["oRzrCwYAAAAKAQAC".to_string()],
            dependencies: vec![ObjectId::short(0x1), SUI_FRAMEWORK_ID],
        })
    }
}

#[cfg(test)]
mod tests {
    use objsync_core::SharedObjectRef;

    use super::*;

    const SENDER: Address = ObjectId::short(0xa1);

    fn registry() -> CallArg {
        CallArg::Shared(SharedObjectRef {
            object_id: SUI_COIN_REGISTRY_ID,
            initial_shared_version: 1,
            mutable: true,
        })
    }

    #[tokio::test]
    async fn test_coin_init_mints_to_owner() {
        let ledger = FakeLedger::new();
        let pkg = ObjectId::short(0xc0);
        let mut plan = TransactionPlan::new("coin");
        plan.push(MoveCall::new(
            pkg,
            "mock_coin",
            "init_local_mock_usd",
            vec![registry(), CallArg::Address(SENDER)],
        ));

        let effects = ledger
            .submit(&plan, &FakeSigner::new(SENDER), ExecutionMode::Execute)
            .await
            .unwrap();
        assert_eq!(effects.created.len(), 4);

        let coin_type = format!("{pkg}::mock_coin::LocalMockUsd");
        let coins = ledger.get_coins(SENDER, &coin_type).await.unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].balance, MINTED_BALANCE);
    }

    #[tokio::test]
    async fn test_dry_run_leaves_no_trace() {
        let ledger = FakeLedger::new();
        let mut plan = TransactionPlan::new("coin");
        plan.push(MoveCall::new(
            ObjectId::short(0xc0),
            "mock_coin",
            "init_local_mock_usd",
            vec![registry(), CallArg::Address(SENDER)],
        ));

        let effects = ledger
            .submit(&plan, &FakeSigner::new(SENDER), ExecutionMode::DryRun)
            .await
            .unwrap();
        assert!(effects.dry_run);
        assert_eq!(effects.created.len(), 4);
        assert!(ledger.object(effects.created[0].object_id).is_none());
        assert_eq!(ledger.dry_run_count(), 1);
        assert_eq!(ledger.submission_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_call_rolls_back() {
        let ledger = FakeLedger::new();
        let mut plan = TransactionPlan::new("bad");
        plan.push(MoveCall::new(
            ObjectId::short(0xc0),
            "mock_coin",
            "init_local_mock_usd",
            vec![registry(), CallArg::Address(SENDER)],
        ));
        plan.push(MoveCall::new(
            ObjectId::short(0xb0),
            "price_info",
            "update_price_feed",
            vec![CallArg::U64(1)],
        ));

        let err = ledger
            .submit(&plan, &FakeSigner::new(SENDER), ExecutionMode::Execute)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ExecutionFailed { .. }));
        let coin_type = format!("{}::mock_coin::LocalMockUsd", ObjectId::short(0xc0));
        assert!(ledger.get_coins(SENDER, &coin_type).await.unwrap().is_empty());
    }
}
