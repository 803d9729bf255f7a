//! Summary fields of Soroban operations: footprint hashes, contract and code
//! ids, argument listings and asset balance changes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use efx_types::contract::ContractIdPreimage;
use efx_types::{
    HostFunction, LedgerKey, ScAddress, ScVal, SorobanTransactionData, ToXdr, TransactionEnvelope,
};

use crate::context::OperationContext;
use crate::details::{add_asset, DetailValue, Details};
use crate::error::{EffectError, EffectResult};
use crate::sac;

// ---------------------------------------------------------------------------
// Footprint
// ---------------------------------------------------------------------------

fn footprint(envelope: &TransactionEnvelope) -> Option<&SorobanTransactionData> {
    envelope.soroban_data.as_ref()
}

/// Hex SHA-256 of every footprint key, read-only keys first.
pub fn ledger_key_hashes(envelope: &TransactionEnvelope) -> Vec<String> {
    footprint(envelope)
        .map(|data| {
            data.footprint
                .read_only
                .iter()
                .chain(&data.footprint.read_write)
                .map(LedgerKey::hash_hex)
                .collect()
        })
        .unwrap_or_default()
}

/// First contract named by a contract-data key, read-write keys first.
pub fn footprint_contract_id(envelope: &TransactionEnvelope) -> Option<String> {
    let data = footprint(envelope)?;
    data.footprint
        .read_write
        .iter()
        .chain(&data.footprint.read_only)
        .find_map(|key| match key {
            LedgerKey::ContractData { contract: ScAddress::Contract(id), .. } => {
                Some(id.to_contract_address())
            }
            _ => None,
        })
}

/// First contract-code hash in the footprint, read-only keys first.
pub fn footprint_code_hash(envelope: &TransactionEnvelope) -> Option<String> {
    let data = footprint(envelope)?;
    data.footprint
        .read_only
        .iter()
        .chain(&data.footprint.read_write)
        .find_map(|key| match key {
            LedgerKey::ContractCode { hash } => Some(hash.to_hex()),
            _ => None,
        })
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Human-readable rendering of a contract value.
pub fn decode_value(val: &ScVal) -> String {
    match val {
        ScVal::Bool(b) => b.to_string(),
        ScVal::Void => "void".to_string(),
        ScVal::U32(v) => v.to_string(),
        ScVal::I32(v) => v.to_string(),
        ScVal::U64(v) | ScVal::Timepoint(v) | ScVal::Duration(v) => v.to_string(),
        ScVal::I64(v) | ScVal::LedgerKeyNonce(v) => v.to_string(),
        ScVal::U128(v) => v.to_string(),
        ScVal::I128(v) => v.to_string(),
        ScVal::Bytes(bytes) => hex::encode(bytes),
        ScVal::String(s) | ScVal::Symbol(s) => s.clone(),
        ScVal::Vec(items) => {
            let inner: Vec<String> = items.iter().map(decode_value).collect();
            format!("[{}]", inner.join(", "))
        }
        ScVal::Map(entries) => {
            let inner: Vec<String> = entries
                .iter()
                .map(|e| format!("{}: {}", decode_value(&e.key), decode_value(&e.val)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
        ScVal::Address(address) => address.to_strkey(),
        ScVal::LedgerKeyContractInstance => "contract_instance".to_string(),
    }
}

/// `(encoded, decoded)` listings: `[{type, value}]` with the value as base64
/// XDR and as text respectively.
pub fn parameters(args: &[ScVal]) -> (DetailValue, DetailValue) {
    let mut encoded = Vec::with_capacity(args.len());
    let mut decoded = Vec::with_capacity(args.len());
    for arg in args {
        encoded.push(
            Details::new()
                .with("type", arg.type_name())
                .with("value", STANDARD.encode(arg.to_xdr())),
        );
        decoded.push(
            Details::new()
                .with("type", arg.type_name())
                .with("value", decode_value(arg)),
        );
    }
    (encoded.into(), decoded.into())
}

/// Decimal form of a big-endian unsigned integer.
fn big_endian_decimal(bytes: &[u8]) -> String {
    let mut digits = Vec::new();
    let mut n: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    while !n.is_empty() {
        let mut remainder = 0u32;
        for byte in n.iter_mut() {
            let acc = (remainder << 8) | u32::from(*byte);
            *byte = (acc / 10) as u8;
            remainder = acc % 10;
        }
        digits.push(char::from(b'0' + remainder as u8));
        let leading = n.iter().take_while(|b| **b == 0).count();
        n.drain(..leading);
    }
    if digits.is_empty() {
        return "0".to_string();
    }
    digits.iter().rev().collect()
}

fn add_preimage(details: &mut Details, preimage: &ContractIdPreimage) {
    match preimage {
        ContractIdPreimage::FromAddress { address, salt } => {
            details.insert("from", "address");
            details.insert("address", address.to_strkey());
            details.insert("salt", big_endian_decimal(salt.as_bytes()));
        }
        ContractIdPreimage::FromAsset(asset) => {
            details.insert("from", "asset");
            add_asset(details, asset, "");
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Name of the host function kind as recorded by the ledger.
pub fn function_name(function: &HostFunction) -> EffectResult<&'static str> {
    match function {
        HostFunction::InvokeContract(_) => Ok("HostFunctionTypeHostFunctionTypeInvokeContract"),
        HostFunction::CreateContract(_) => Ok("HostFunctionTypeHostFunctionTypeCreateContract"),
        HostFunction::UploadContractWasm(_) => {
            Ok("HostFunctionTypeHostFunctionTypeUploadContractWasm")
        }
        HostFunction::CreateContractV2(_) => {
            Ok("HostFunctionTypeHostFunctionTypeCreateContractV2")
        }
        HostFunction::Unrecognized(kind) => Err(EffectError::UnknownHostFunctionKind(*kind)),
    }
}

fn created_contract_id(
    ctx: &OperationContext<'_>,
    preimage: &ContractIdPreimage,
) -> EffectResult<String> {
    Ok(preimage.contract_id(&ctx.network_id()?).to_contract_address())
}

/// Detail fields of an invoke-host-function operation.
pub fn host_function_details(
    ctx: &OperationContext<'_>,
    function: &HostFunction,
    details: &mut Details,
) -> EffectResult<()> {
    details.insert("function", function_name(function)?);
    let envelope = ctx.envelope();
    let key_hashes = ledger_key_hashes(envelope);
    let code_hash = footprint_code_hash(envelope);

    match function {
        HostFunction::InvokeContract(invoke) => {
            let mut args = Vec::with_capacity(invoke.args.len() + 2);
            args.push(ScVal::Address(invoke.contract_address.clone()));
            args.push(ScVal::Symbol(invoke.function_name.clone()));
            args.extend(invoke.args.iter().cloned());

            details.insert("type", "invoke_contract");
            details.insert("ledger_key_hash", key_hashes);
            details.insert("contract_id", invoke.contract_address.to_strkey());
            details.insert("contract_code_hash", code_hash);
            let (encoded, decoded) = parameters(&args);
            details.insert("parameters", encoded);
            details.insert("parameters_decoded", decoded);
            let changes: Vec<Details> = sac::asset_events(ctx)?
                .iter()
                .map(sac::SacEvent::balance_change)
                .collect();
            details.insert("asset_balance_changes", changes);
        }
        HostFunction::CreateContract(create) => {
            details.insert("type", "create_contract");
            details.insert("ledger_key_hash", key_hashes);
            details.insert(
                "contract_id",
                created_contract_id(ctx, &create.contract_id_preimage)?,
            );
            details.insert("contract_code_hash", code_hash);
            add_preimage(details, &create.contract_id_preimage);
        }
        HostFunction::UploadContractWasm(_) => {
            details.insert("type", "upload_wasm");
            details.insert("ledger_key_hash", key_hashes);
            details.insert("contract_code_hash", code_hash);
        }
        HostFunction::CreateContractV2(create) => {
            details.insert("type", "create_contract_v2");
            details.insert("ledger_key_hash", key_hashes);
            details.insert(
                "contract_id",
                created_contract_id(ctx, &create.contract_id_preimage)?,
            );
            details.insert("contract_code_hash", code_hash);
            let (encoded, decoded) = parameters(&create.constructor_args);
            details.insert("parameters", encoded);
            details.insert("parameters_decoded", decoded);
            add_preimage(details, &create.contract_id_preimage);
        }
        HostFunction::Unrecognized(kind) => {
            return Err(EffectError::UnknownHostFunctionKind(*kind))
        }
    }
    Ok(())
}

/// Footprint fields shared by TTL extension and restoration.
pub fn footprint_details(envelope: &TransactionEnvelope, details: &mut Details) {
    details.insert("ledger_key_hash", ledger_key_hashes(envelope));
    details.insert("contract_id", footprint_contract_id(envelope));
    details.insert("contract_code_hash", footprint_code_hash(envelope));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::*;
    use crate::pool::fixtures::usd;
    use efx_types::contract::{network_id, ContractExecutable, CreateContractArgs, InvokeContractArgs};
    use efx_types::entry::ContractDataDurability;
    use efx_types::operation::InvokeHostFunctionOp;
    use efx_types::{Hash, LedgerFootprint, OperationBody, ScMapEntry};

    fn contract_key(byte: u8) -> LedgerKey {
        LedgerKey::ContractData {
            contract: ScAddress::Contract(Hash::from_bytes([byte; 32])),
            key: ScVal::LedgerKeyContractInstance,
            durability: ContractDataDurability::Persistent,
        }
    }

    fn envelope_with(read_only: Vec<LedgerKey>, read_write: Vec<LedgerKey>) -> TransactionEnvelope {
        let mut tx = transaction(OperationBody::Inflation, None, vec![]);
        tx.envelope.soroban_data = Some(SorobanTransactionData {
            footprint: LedgerFootprint { read_only, read_write },
        });
        tx.envelope
    }

    #[test]
    fn footprint_lookups_follow_their_order() {
        let code = LedgerKey::ContractCode { hash: Hash::from_bytes([7; 32]) };
        let envelope = envelope_with(vec![contract_key(1), code.clone()], vec![contract_key(2)]);
        assert_eq!(
            ledger_key_hashes(&envelope),
            vec![contract_key(1).hash_hex(), code.hash_hex(), contract_key(2).hash_hex()]
        );
        assert_eq!(
            footprint_contract_id(&envelope),
            Some(Hash::from_bytes([2; 32]).to_contract_address())
        );
        assert_eq!(footprint_code_hash(&envelope), Some(Hash::from_bytes([7; 32]).to_hex()));
    }

    #[test]
    fn no_soroban_data_means_empty_footprint() {
        let tx = transaction(OperationBody::Inflation, None, vec![]);
        assert!(ledger_key_hashes(&tx.envelope).is_empty());
        assert_eq!(footprint_contract_id(&tx.envelope), None);
    }

    #[test]
    fn values_decode_to_text() {
        let map = ScVal::Map(vec![ScMapEntry {
            key: ScVal::Symbol("a".into()),
            val: ScVal::Vec(vec![ScVal::U32(1), ScVal::Bool(true)]),
        }]);
        assert_eq!(decode_value(&map), "{a: [1, true]}");
        assert_eq!(decode_value(&ScVal::I128(-5)), "-5");
        assert_eq!(decode_value(&ScVal::Bytes(vec![0xab, 0x01])), "ab01");
    }

    #[test]
    fn parameter_listings() {
        let (encoded, decoded) = parameters(&[ScVal::Symbol("hi".into())]);
        let encoded = encoded.as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(encoded.get_str("type"), Some("Sym"));
        assert_eq!(
            encoded.get_str("value"),
            Some(STANDARD.encode(ScVal::Symbol("hi".into()).to_xdr()).as_str())
        );
        let decoded = decoded.as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(decoded.get_str("value"), Some("hi"));
    }

    #[test]
    fn salt_renders_as_decimal() {
        let mut bytes = [0u8; 32];
        bytes[30] = 1;
        bytes[31] = 2;
        assert_eq!(big_endian_decimal(&bytes), "258");
        assert_eq!(big_endian_decimal(&[0u8; 32]), "0");
        assert_eq!(big_endian_decimal(&[0xff; 8]), u64::MAX.to_string());
    }

    #[test]
    fn invoke_contract_summary() {
        let address = ScAddress::Contract(Hash::from_bytes([3; 32]));
        let op = InvokeHostFunctionOp {
            host_function: HostFunction::InvokeContract(InvokeContractArgs {
                contract_address: address.clone(),
                function_name: "hello".into(),
                args: vec![ScVal::U32(9)],
            }),
        };
        let tx = transaction(OperationBody::InvokeHostFunction(op.clone()), None, vec![]);
        let ctx = OperationContext::new(&tx, 0, 1, ledger(), TESTNET).unwrap();
        let mut details = Details::new();
        host_function_details(&ctx, &op.host_function, &mut details).unwrap();
        assert_eq!(details.get_str("type"), Some("invoke_contract"));
        assert_eq!(details.get_str("contract_id"), Some(address.to_strkey().as_str()));
        assert_eq!(details.get("contract_code_hash"), Some(&DetailValue::Null));
        let decoded = details.get("parameters_decoded").and_then(|v| v.as_list()).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[1].as_map().unwrap().get_str("value"), Some("hello"));
        assert_eq!(
            details.get("asset_balance_changes").and_then(|v| v.as_list()).map(<[_]>::len),
            Some(0)
        );
    }

    #[test]
    fn create_contract_from_asset() {
        let preimage = ContractIdPreimage::FromAsset(usd());
        let function = HostFunction::CreateContract(CreateContractArgs {
            contract_id_preimage: preimage.clone(),
            executable: ContractExecutable::StellarAsset,
        });
        let tx = transaction(
            OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: function.clone(),
            }),
            None,
            vec![],
        );
        let ctx = OperationContext::new(&tx, 0, 1, ledger(), TESTNET).unwrap();
        let mut details = Details::new();
        host_function_details(&ctx, &function, &mut details).unwrap();
        let expected = preimage.contract_id(&network_id(TESTNET)).to_contract_address();
        assert_eq!(details.get_str("contract_id"), Some(expected.as_str()));
        assert_eq!(details.get_str("from"), Some("asset"));
        assert_eq!(details.get_str("asset_code"), Some("USD"));
    }

    #[test]
    fn unknown_host_function() {
        assert_eq!(
            function_name(&HostFunction::Unrecognized(9)).unwrap_err(),
            EffectError::UnknownHostFunctionKind(9)
        );
    }
}
