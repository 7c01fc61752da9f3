//! BCS transaction encoding.
//!
//! These types mirror the on-chain serialization of a programmable
//! transaction closely enough for `bcs::to_bytes` to produce bytes the node
//! accepts. Enum variants are encoded by declaration index, so variants the
//! client never builds still have to be declared in order.

use std::collections::HashMap;

use objsync_core::{
    Address, CallArg as PlanArg, DiscoveredResource, LedgerError, LedgerResult, ObjectId,
    PublishPlan, SharedObjectRef, TransactionPlan,
};
use serde::Serialize;

type AccountAddress = [u8; 32];

/// `(id, version, digest)`
pub type ObjectRef = (AccountAddress, u64, Vec<u8>);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionData {
    V1(TransactionDataV1),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionDataV1 {
    pub kind: TransactionKind,
    pub sender: AccountAddress,
    pub gas_data: GasData,
    pub expiration: TransactionExpiration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionKind {
    ProgrammableTransaction(ProgrammableTransaction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GasData {
    pub payment: Vec<ObjectRef>,
    pub owner: AccountAddress,
    pub price: u64,
    pub budget: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionExpiration {
    None,
    #[allow(dead_code)]
    Epoch(u64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgrammableTransaction {
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallArg {
    Pure(Vec<u8>),
    Object(ObjectArg),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ObjectArg {
    ImmOrOwnedObject(ObjectRef),
    SharedObject {
        id: AccountAddress,
        initial_shared_version: u64,
        mutable: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Command {
    MoveCall(Box<ProgrammableMoveCall>),
    TransferObjects(Vec<Argument>, Argument),
    #[allow(dead_code)]
    SplitCoins(Argument, Vec<Argument>),
    #[allow(dead_code)]
    MergeCoins(Argument, Vec<Argument>),
    Publish(Vec<Vec<u8>>, Vec<AccountAddress>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgrammableMoveCall {
    pub package: AccountAddress,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<TypeTag>,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Argument {
    #[allow(dead_code)]
    GasCoin,
    Input(u16),
    Result(u16),
    #[allow(dead_code)]
    NestedResult(u16, u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
    U16,
    U32,
    U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructTag {
    pub address: AccountAddress,
    pub module: String,
    pub name: String,
    pub type_params: Vec<TypeTag>,
}

/// Parses a Move type such as `0x2::coin::Coin<0x2::sui::SUI>`.
pub fn parse_type_tag(input: &str) -> LedgerResult<TypeTag> {
    let input = input.trim();
    let tag = match input {
        "bool" => TypeTag::Bool,
        "u8" => TypeTag::U8,
        "u16" => TypeTag::U16,
        "u32" => TypeTag::U32,
        "u64" => TypeTag::U64,
        "u128" => TypeTag::U128,
        "u256" => TypeTag::U256,
        "address" => TypeTag::Address,
        "signer" => TypeTag::Signer,
        _ => {
            if let Some(inner) = input
                .strip_prefix("vector<")
                .and_then(|rest| rest.strip_suffix('>'))
            {
                return Ok(TypeTag::Vector(Box::new(parse_type_tag(inner)?)));
            }
            TypeTag::Struct(Box::new(parse_struct_tag(input)?))
        }
    };
    Ok(tag)
}

fn parse_struct_tag(input: &str) -> LedgerResult<StructTag> {
    let bad = |reason: &str| LedgerError::decode(format!("invalid type '{input}': {reason}"));

    let (head, type_params) = match input.find('<') {
        Some(open) => {
            let inner = input[open + 1..]
                .strip_suffix('>')
                .ok_or_else(|| bad("unbalanced '<'"))?;
            let params = split_top_level(inner)
                .into_iter()
                .map(parse_type_tag)
                .collect::<LedgerResult<Vec<_>>>()?;
            (&input[..open], params)
        }
        None => (input, Vec::new()),
    };

    let mut parts = head.split("::");
    let (Some(address), Some(module), Some(name), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(bad("expected address::module::Name"));
    };
    let address = ObjectId::parse(address).map_err(|e| bad(&e.to_string()))?;
    if module.is_empty() || name.is_empty() {
        return Err(bad("empty module or name"));
    }

    Ok(StructTag {
        address: *address.as_bytes(),
        module: module.to_string(),
        name: name.to_string(),
        type_params,
    })
}

/// Splits on commas that are not nested inside angle brackets.
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in input.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(input[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    let last = input[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

fn pure<T: Serialize>(value: &T) -> LedgerResult<CallArg> {
    bcs::to_bytes(value)
        .map(CallArg::Pure)
        .map_err(|e| LedgerError::decode(format!("bcs encoding failed: {e}")))
}

fn index(position: usize) -> LedgerResult<u16> {
    u16::try_from(position).map_err(|_| LedgerError::decode("too many transaction inputs"))
}

/// Reference of an owned or immutable object read from the ledger.
pub fn object_ref(resource: &DiscoveredResource) -> LedgerResult<ObjectRef> {
    let digest = resource
        .digest
        .as_deref()
        .ok_or_else(|| LedgerError::decode(format!("object {} has no digest", resource.object_id)))?;
    Ok((
        *resource.object_id.as_bytes(),
        resource.version,
        decode_digest(digest)?,
    ))
}

pub fn decode_digest(digest: &str) -> LedgerResult<Vec<u8>> {
    bs58::decode(digest)
        .into_vec()
        .map_err(|e| LedgerError::decode(format!("invalid digest '{digest}': {e}")))
}

/// Accumulates inputs, deduplicating object inputs by id.
#[derive(Default)]
struct InputBuilder {
    inputs: Vec<CallArg>,
    objects: HashMap<ObjectId, u16>,
}

impl InputBuilder {
    fn push(&mut self, arg: CallArg) -> LedgerResult<Argument> {
        let position = index(self.inputs.len())?;
        self.inputs.push(arg);
        Ok(Argument::Input(position))
    }

    fn shared(&mut self, shared: SharedObjectRef) -> LedgerResult<Argument> {
        if let Some(&position) = self.objects.get(&shared.object_id) {
            // A mutable use anywhere makes the single input mutable.
            if let CallArg::Object(ObjectArg::SharedObject { mutable, .. }) =
                &mut self.inputs[usize::from(position)]
            {
                *mutable |= shared.mutable;
            }
            return Ok(Argument::Input(position));
        }
        let argument = self.push(CallArg::Object(ObjectArg::SharedObject {
            id: *shared.object_id.as_bytes(),
            initial_shared_version: shared.initial_shared_version,
            mutable: shared.mutable,
        }))?;
        if let Argument::Input(position) = argument {
            self.objects.insert(shared.object_id, position);
        }
        Ok(argument)
    }

    fn object(&mut self, resource: &DiscoveredResource) -> LedgerResult<Argument> {
        if let Some(shared) = resource.shared_ref(true) {
            return self.shared(shared);
        }
        if let Some(&position) = self.objects.get(&resource.object_id) {
            return Ok(Argument::Input(position));
        }
        let argument = self.push(CallArg::Object(ObjectArg::ImmOrOwnedObject(object_ref(
            resource,
        )?)))?;
        if let Argument::Input(position) = argument {
            self.objects.insert(resource.object_id, position);
        }
        Ok(argument)
    }
}

/// Encodes a plan. `resolved` must hold the latest read of every
/// [`PlanArg::Object`] the plan references.
pub fn build_programmable(
    plan: &TransactionPlan,
    resolved: &HashMap<ObjectId, DiscoveredResource>,
) -> LedgerResult<ProgrammableTransaction> {
    let mut builder = InputBuilder::default();
    let mut commands = Vec::with_capacity(plan.calls.len());

    for call in &plan.calls {
        let mut arguments = Vec::with_capacity(call.arguments.len());
        for arg in &call.arguments {
            let argument = match arg {
                PlanArg::U64(value) => builder.push(pure(value)?)?,
                PlanArg::Bool(value) => builder.push(pure(value)?)?,
                PlanArg::Address(address) => builder.push(pure(address.as_bytes())?)?,
                PlanArg::Bytes(bytes) => builder.push(pure(bytes)?)?,
                PlanArg::Object(id) => {
                    let resource = resolved
                        .get(id)
                        .ok_or_else(|| LedgerError::not_found(id))?;
                    builder.object(resource)?
                }
                PlanArg::Shared(shared) => builder.shared(*shared)?,
                PlanArg::Result(position) => Argument::Result(*position),
            };
            arguments.push(argument);
        }

        let type_arguments = call
            .type_arguments
            .iter()
            .map(|tag| parse_type_tag(tag))
            .collect::<LedgerResult<Vec<_>>>()?;

        commands.push(Command::MoveCall(Box::new(ProgrammableMoveCall {
            package: *call.package.as_bytes(),
            module: call.module.clone(),
            function: call.function.clone(),
            type_arguments,
            arguments,
        })));
    }

    Ok(ProgrammableTransaction {
        inputs: builder.inputs,
        commands,
    })
}

/// Publishes the modules and hands the upgrade capability to `sender`.
pub fn build_publish(plan: &PublishPlan, sender: Address) -> LedgerResult<ProgrammableTransaction> {
    use base64::Engine as _;

    let modules = plan
        .modules
        .iter()
        .map(|module| {
            base64::engine::general_purpose::STANDARD
                .decode(module)
                .map_err(|e| LedgerError::decode(format!("invalid module bytecode: {e}")))
        })
        .collect::<LedgerResult<Vec<_>>>()?;
    let dependencies = plan
        .dependencies
        .iter()
        .map(|id| *id.as_bytes())
        .collect();

    let mut builder = InputBuilder::default();
    let recipient = builder.push(pure(sender.as_bytes())?)?;

    Ok(ProgrammableTransaction {
        inputs: builder.inputs,
        commands: vec![
            Command::Publish(modules, dependencies),
            Command::TransferObjects(vec![Argument::Result(0)], recipient),
        ],
    })
}

/// Wraps a programmable transaction with sender and gas.
pub fn transaction_data(
    programmable: ProgrammableTransaction,
    sender: Address,
    gas: ObjectRef,
    price: u64,
    budget: u64,
) -> TransactionData {
    TransactionData::V1(TransactionDataV1 {
        kind: TransactionKind::ProgrammableTransaction(programmable),
        sender: *sender.as_bytes(),
        gas_data: GasData {
            payment: vec![gas],
            owner: *sender.as_bytes(),
            price,
            budget,
        },
        expiration: TransactionExpiration::None,
    })
}

pub fn to_bytes(data: &TransactionData) -> LedgerResult<Vec<u8>> {
    bcs::to_bytes(data).map_err(|e| LedgerError::decode(format!("bcs encoding failed: {e}")))
}

/// Ids of owned objects a plan needs resolved before encoding.
pub fn owned_inputs(plan: &TransactionPlan) -> Vec<ObjectId> {
    let mut ids: Vec<ObjectId> = Vec::new();
    for arg in plan.calls.iter().flat_map(|call| call.arguments.iter()) {
        if let PlanArg::Object(id) = arg {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use objsync_core::{MoveCall, Owner, SUI_CLOCK_ID, SUI_FRAMEWORK_ID};

    use super::*;

    fn owned(id: u8) -> DiscoveredResource {
        DiscoveredResource {
            object_id: ObjectId::short(id),
            object_type: "0x2::coin::TreasuryCap<0xa::usd::USD>".to_string(),
            owner: Owner::Address {
                address: ObjectId::short(0xaa),
            },
            version: 7,
            digest: Some("11111111111111111111111111111111".to_string()),
            is_package: false,
            fields: Default::default(),
        }
    }

    #[test]
    fn test_parse_nested_type_tag() {
        let tag = parse_type_tag("0x2::coin::Coin<0xa::pair::Pair<u64, vector<u8>>>").unwrap();
        let TypeTag::Struct(coin) = tag else {
            panic!("expected struct");
        };
        assert_eq!(coin.address, *SUI_FRAMEWORK_ID.as_bytes());
        assert_eq!((coin.module.as_str(), coin.name.as_str()), ("coin", "Coin"));

        let TypeTag::Struct(pair) = &coin.type_params[0] else {
            panic!("expected struct parameter");
        };
        assert_eq!(
            pair.type_params,
            vec![TypeTag::U64, TypeTag::Vector(Box::new(TypeTag::U8))]
        );
    }

    #[test]
    fn test_parse_type_tag_rejects_garbage() {
        assert!(parse_type_tag("0x2::coin").is_err());
        assert!(parse_type_tag("0x2::coin::Coin<u64").is_err());
        assert!(parse_type_tag("zz::m::N").is_err());
    }

    #[test]
    fn test_object_inputs_are_deduplicated() {
        let package = ObjectId::short(0x42);
        let clock = SharedObjectRef {
            object_id: SUI_CLOCK_ID,
            initial_shared_version: 1,
            mutable: false,
        };
        let mut plan = TransactionPlan::new("mint");
        let minted = plan.push(MoveCall::new(
            package,
            "usd",
            "mint",
            vec![
                PlanArg::Object(ObjectId::short(5)),
                PlanArg::U64(10),
                PlanArg::Shared(clock),
            ],
        ));
        plan.push(MoveCall::new(
            package,
            "usd",
            "burn",
            vec![
                PlanArg::Object(ObjectId::short(5)),
                PlanArg::Result(minted),
                PlanArg::Shared(SharedObjectRef {
                    mutable: true,
                    ..clock
                }),
            ],
        ));

        let resolved = HashMap::from([(ObjectId::short(5), owned(5))]);
        let tx = build_programmable(&plan, &resolved).unwrap();

        // treasury cap, 10u64, clock
        assert_eq!(tx.inputs.len(), 3);
        assert_eq!(tx.inputs[1], CallArg::Pure(10u64.to_le_bytes().to_vec()));
        assert!(matches!(
            tx.inputs[2],
            CallArg::Object(ObjectArg::SharedObject { mutable: true, .. })
        ));

        let Command::MoveCall(burn) = &tx.commands[1] else {
            panic!("expected move call");
        };
        assert_eq!(
            burn.arguments,
            vec![Argument::Input(0), Argument::Result(0), Argument::Input(2)]
        );
    }

    #[test]
    fn test_unresolved_object_is_not_found() {
        let mut plan = TransactionPlan::new("use");
        plan.push(MoveCall::new(
            ObjectId::short(0x42),
            "m",
            "f",
            vec![PlanArg::Object(ObjectId::short(9))],
        ));
        let err = build_programmable(&plan, &HashMap::new()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_publish_transfers_upgrade_cap_to_sender() {
        let sender = ObjectId::short(0xaa);
        let plan = PublishPlan::new(
            "pyth-mock",
            vec!["oRzrCwYAAAAKAQAC".to_string()],
            vec![ObjectId::short(1), SUI_FRAMEWORK_ID],
        );
        let tx = build_publish(&plan, sender).unwrap();

        assert_eq!(tx.inputs, vec![CallArg::Pure(sender.as_bytes().to_vec())]);
        assert!(matches!(&tx.commands[0], Command::Publish(modules, deps)
            if modules.len() == 1 && deps.len() == 2));
        assert_eq!(
            tx.commands[1],
            Command::TransferObjects(vec![Argument::Result(0)], Argument::Input(0))
        );
    }

    #[test]
    fn test_transaction_data_layout() {
        let sender = ObjectId::short(0xaa);
        let gas = object_ref(&owned(3)).unwrap();
        let data = transaction_data(ProgrammableTransaction::default(), sender, gas, 1000, 5000);
        let bytes = to_bytes(&data).unwrap();

        // V1 tag, ProgrammableTransaction tag, empty inputs, empty commands
        assert_eq!(&bytes[..4], &[0, 0, 0, 0]);
        assert_eq!(&bytes[4..36], sender.as_bytes());
        // the trailing expiration is `None`
        assert_eq!(bytes.last(), Some(&0));
    }
}
