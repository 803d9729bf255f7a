//! Ledger model consumed by the effects engine.
//!
//! These types describe what the decoding layer hands over for one
//! transaction: operations with typed payloads, their results, and the
//! pre/post ledger-entry changes each operation caused. Identifiers render
//! in their text forms (StrKey addresses, hex hashes, canonical asset strings).
//!
//! # Key Types
//!
//! - [`AccountId`] / [`MuxedAccount`]: account addresses
//! - [`Asset`]: classic assets with canonical ordering
//! - [`LedgerEntryChange`]: pre/post snapshot pair of one entry
//! - [`Operation`] / [`OperationBody`]: closed set of operation kinds
//! - [`TransactionResult`] / [`ClaimAtom`]: results and trade legs
//! - [`ScVal`] / [`HostFunction`] / [`DiagnosticEvent`]: contract layer
//! - [`LedgerTransaction`]: everything derivation needs about a transaction

pub mod account;
pub mod amount;
pub mod asset;
pub mod contract;
pub mod entry;
pub mod error;
pub mod hash;
pub mod ledger_key;
pub mod operation;
pub mod result;
pub mod strkey;
pub mod transaction;
pub mod xdr;

pub use account::{AccountId, MuxedAccount, Signer, SignerKey};
pub use asset::{Asset, ChangeTrustAsset, LiquidityPoolParameters, Price, TrustLineAsset};
pub use contract::{
    ContractEvent, ContractEventType, ContractIdPreimage, DiagnosticEvent, HostFunction,
    LedgerFootprint, ScAddress, ScMapEntry, ScVal, SorobanTransactionData,
};
pub use entry::{
    AccountEntry, ClaimPredicate, ClaimableBalanceEntry, ClaimableBalanceId, Claimant,
    ConstantProductPool, LedgerEntry, LedgerEntryChange, LedgerEntryData, LedgerEntryType,
    LiquidityPoolBody, LiquidityPoolEntry, TrustLineEntry,
};
pub use error::TypeError;
pub use hash::{Hash, PoolId};
pub use ledger_key::LedgerKey;
pub use operation::{Operation, OperationBody, OperationType};
pub use result::{ClaimAtom, OperationResult, OperationResultTr, TransactionResult};
pub use transaction::{LedgerInfo, LedgerTransaction, TransactionEnvelope};
pub use xdr::ToXdr;
