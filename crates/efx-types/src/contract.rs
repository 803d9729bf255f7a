//! Smart-contract values, addresses, host functions and events.

use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::asset::Asset;
use crate::hash::Hash;
use crate::ledger_key::LedgerKey;
use crate::xdr::{ToXdr, XdrWriter};

/// XDR envelope type tag for contract-id preimages.
const ENVELOPE_TYPE_CONTRACT_ID: i32 = 8;

/// Address of a contract-layer party.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScAddress {
    Account(AccountId),
    Contract(Hash),
}

impl ScAddress {
    /// `G...` for accounts, `C...` for contracts.
    pub fn to_strkey(&self) -> String {
        match self {
            Self::Account(account) => account.address(),
            Self::Contract(hash) => hash.to_contract_address(),
        }
    }
}

impl ToXdr for ScAddress {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::Account(account) => {
                w.write_i32(0);
                account.write_xdr(w);
            }
            Self::Contract(hash) => {
                w.write_i32(1);
                hash.write_xdr(w);
            }
        }
    }
}

/// One key/value pair of an [`ScVal::Map`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScMapEntry {
    pub key: ScVal,
    pub val: ScVal,
}

impl ToXdr for ScMapEntry {
    fn write_xdr(&self, w: &mut XdrWriter) {
        self.key.write_xdr(w);
        self.val.write_xdr(w);
    }
}

/// A contract value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScVal {
    Bool(bool),
    Void,
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    Timepoint(u64),
    Duration(u64),
    U128(u128),
    I128(i128),
    Bytes(Vec<u8>),
    String(String),
    Symbol(String),
    Vec(Vec<ScVal>),
    Map(Vec<ScMapEntry>),
    Address(ScAddress),
    LedgerKeyContractInstance,
    LedgerKeyNonce(i64),
}

impl ScVal {
    /// XDR discriminant of the value type.
    pub fn discriminant(&self) -> i32 {
        match self {
            Self::Bool(_) => 0,
            Self::Void => 1,
            Self::U32(_) => 3,
            Self::I32(_) => 4,
            Self::U64(_) => 5,
            Self::I64(_) => 6,
            Self::Timepoint(_) => 7,
            Self::Duration(_) => 8,
            Self::U128(_) => 9,
            Self::I128(_) => 10,
            Self::Bytes(_) => 13,
            Self::String(_) => 14,
            Self::Symbol(_) => 15,
            Self::Vec(_) => 16,
            Self::Map(_) => 17,
            Self::Address(_) => 18,
            Self::LedgerKeyContractInstance => 20,
            Self::LedgerKeyNonce(_) => 21,
        }
    }

    /// Type name as used in parameter listings, e.g. `Sym`, `I128`, `Address`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "B",
            Self::Void => "Void",
            Self::U32(_) => "U32",
            Self::I32(_) => "I32",
            Self::U64(_) => "U64",
            Self::I64(_) => "I64",
            Self::Timepoint(_) => "Timepoint",
            Self::Duration(_) => "Duration",
            Self::U128(_) => "U128",
            Self::I128(_) => "I128",
            Self::Bytes(_) => "Bytes",
            Self::String(_) => "Str",
            Self::Symbol(_) => "Sym",
            Self::Vec(_) => "Vec",
            Self::Map(_) => "Map",
            Self::Address(_) => "Address",
            Self::LedgerKeyContractInstance => "LedgerKeyContractInstance",
            Self::LedgerKeyNonce(_) => "LedgerKeyNonce",
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&ScAddress> {
        match self {
            Self::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::I128(v) => Some(*v),
            _ => None,
        }
    }
}

impl ToXdr for ScVal {
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_i32(self.discriminant());
        match self {
            Self::Bool(b) => w.write_bool(*b),
            Self::Void | Self::LedgerKeyContractInstance => {}
            Self::U32(v) => w.write_u32(*v),
            Self::I32(v) => w.write_i32(*v),
            Self::U64(v) | Self::Timepoint(v) | Self::Duration(v) => w.write_u64(*v),
            Self::I64(v) | Self::LedgerKeyNonce(v) => w.write_i64(*v),
            Self::U128(v) => {
                w.write_u64((*v >> 64) as u64);
                w.write_u64(*v as u64);
            }
            Self::I128(v) => {
                w.write_i64((*v >> 64) as i64);
                w.write_u64(*v as u64);
            }
            Self::Bytes(bytes) => w.write_var(bytes),
            Self::String(s) | Self::Symbol(s) => w.write_string(s),
            Self::Vec(items) => {
                w.write_bool(true);
                w.write_array(items);
            }
            Self::Map(entries) => {
                w.write_bool(true);
                w.write_array(entries);
            }
            Self::Address(address) => address.write_xdr(w),
        }
    }
}

/// How a new contract's id is derived.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractIdPreimage {
    FromAddress { address: ScAddress, salt: Hash },
    FromAsset(Asset),
}

impl ToXdr for ContractIdPreimage {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::FromAddress { address, salt } => {
                w.write_i32(0);
                address.write_xdr(w);
                salt.write_xdr(w);
            }
            Self::FromAsset(asset) => {
                w.write_i32(1);
                asset.write_xdr(w);
            }
        }
    }
}

impl ContractIdPreimage {
    /// Contract id on the network identified by `network_id`.
    pub fn contract_id(&self, network_id: &Hash) -> Hash {
        let mut w = XdrWriter::new();
        w.write_i32(ENVELOPE_TYPE_CONTRACT_ID);
        network_id.write_xdr(&mut w);
        self.write_xdr(&mut w);
        Hash::sha256(&w.into_bytes())
    }
}

/// Network id: SHA-256 of the network passphrase.
pub fn network_id(passphrase: &str) -> Hash {
    Hash::sha256(passphrase.as_bytes())
}

/// Executable backing a contract instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractExecutable {
    Wasm(Hash),
    StellarAsset,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeContractArgs {
    pub contract_address: ScAddress,
    pub function_name: String,
    #[serde(default)]
    pub args: Vec<ScVal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateContractArgs {
    pub contract_id_preimage: ContractIdPreimage,
    pub executable: ContractExecutable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateContractArgsV2 {
    pub contract_id_preimage: ContractIdPreimage,
    pub executable: ContractExecutable,
    #[serde(default)]
    pub constructor_args: Vec<ScVal>,
}

/// The function run by an invoke-host-function operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostFunction {
    InvokeContract(InvokeContractArgs),
    CreateContract(CreateContractArgs),
    UploadContractWasm(Vec<u8>),
    CreateContractV2(CreateContractArgsV2),
    /// A host function kind this model does not know.
    Unrecognized(i32),
}

/// Kind of a contract event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractEventType {
    System,
    Contract,
    Diagnostic,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub contract_id: Option<Hash>,
    #[serde(rename = "type")]
    pub event_type: ContractEventType,
    pub topics: Vec<ScVal>,
    pub data: ScVal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub in_successful_contract_call: bool,
    pub event: ContractEvent,
}

/// Ledger keys a contract transaction declared it may touch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFootprint {
    #[serde(default)]
    pub read_only: Vec<LedgerKey>,
    #[serde(default)]
    pub read_write: Vec<LedgerKey>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SorobanTransactionData {
    pub footprint: LedgerFootprint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i128_xdr_splits_hi_lo() {
        let bytes = ScVal::I128(-1).to_xdr();
        assert_eq!(&bytes[..4], &[0, 0, 0, 10]);
        assert!(bytes[4..].iter().all(|b| *b == 0xff));
        assert_eq!(bytes.len(), 4 + 16);
    }

    #[test]
    fn symbol_xdr_is_padded_string() {
        let bytes = ScVal::Symbol("mint".into()).to_xdr();
        assert_eq!(bytes, vec![0, 0, 0, 15, 0, 0, 0, 4, b'm', b'i', b'n', b't']);
    }

    #[test]
    fn vec_is_encoded_as_present_option() {
        let bytes = ScVal::Vec(vec![ScVal::Void]).to_xdr();
        assert_eq!(bytes, vec![0, 0, 0, 16, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn contract_address_strkey() {
        let addr = ScAddress::Contract(Hash::from_bytes([0u8; 32]));
        assert_eq!(
            addr.to_strkey(),
            "CAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABSC4"
        );
    }

    #[test]
    fn native_asset_contract_on_testnet() {
        let id = ContractIdPreimage::FromAsset(Asset::Native)
            .contract_id(&network_id("Test SDF Network ; September 2015"));
        assert_eq!(
            id.to_contract_address(),
            "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC"
        );
    }

    #[test]
    fn asset_contract_id_is_network_specific() {
        let preimage = ContractIdPreimage::FromAsset(Asset::Native);
        let testnet = preimage.contract_id(&network_id("Test SDF Network ; September 2015"));
        let pubnet = preimage.contract_id(&network_id(
            "Public Global Stellar Network ; September 2015",
        ));
        assert_ne!(testnet, pubnet);
        assert_eq!(testnet, preimage.contract_id(&network_id("Test SDF Network ; September 2015")));
    }
}
