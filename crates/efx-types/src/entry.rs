//! Ledger entries and the pre/post changes applied to them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::account::{AccountId, Signer, SignerKey};
use crate::asset::{Asset, LiquidityPoolParameters, Price, TrustLineAsset};
use crate::contract::{ScAddress, ScVal};
use crate::error::TypeError;
use crate::hash::{Hash, PoolId};
use crate::strkey::{self, Version};
use crate::xdr::{ToXdr, XdrWriter};

/// Kind of a ledger entry. Discriminants match the XDR encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    Account = 0,
    Trustline = 1,
    Offer = 2,
    Data = 3,
    ClaimableBalance = 4,
    LiquidityPool = 5,
    ContractData = 6,
    ContractCode = 7,
    ConfigSetting = 8,
    Ttl = 9,
}

impl fmt::Display for LedgerEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Account => "account",
            Self::Trustline => "trustline",
            Self::Offer => "offer",
            Self::Data => "data",
            Self::ClaimableBalance => "claimable_balance",
            Self::LiquidityPool => "liquidity_pool",
            Self::ContractData => "contract_data",
            Self::ContractCode => "contract_code",
            Self::ConfigSetting => "config_setting",
            Self::Ttl => "ttl",
        };
        f.write_str(name)
    }
}

/// Account flag bits.
pub mod account_flags {
    pub const AUTH_REQUIRED: u32 = 0x1;
    pub const AUTH_REVOCABLE: u32 = 0x2;
    pub const AUTH_IMMUTABLE: u32 = 0x4;
    pub const AUTH_CLAWBACK_ENABLED: u32 = 0x8;
}

/// Trustline flag bits.
pub mod trustline_flags {
    pub const AUTHORIZED: u32 = 0x1;
    pub const AUTHORIZED_TO_MAINTAIN_LIABILITIES: u32 = 0x2;
    pub const TRUSTLINE_CLAWBACK_ENABLED: u32 = 0x4;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub account_id: AccountId,
    pub balance: i64,
    pub seq_num: i64,
    #[serde(default)]
    pub num_sub_entries: u32,
    #[serde(default)]
    pub inflation_dest: Option<AccountId>,
    #[serde(default)]
    pub flags: u32,
    #[serde(default)]
    pub home_domain: String,
    /// `[master_weight, low, medium, high]`.
    pub thresholds: [u8; 4],
    #[serde(default)]
    pub signers: Vec<Signer>,
    /// Sponsor of each signer, parallel to `signers`.
    #[serde(default)]
    pub signer_sponsoring_ids: Vec<Option<AccountId>>,
}

impl AccountEntry {
    pub fn master_key_weight(&self) -> u8 {
        self.thresholds[0]
    }

    /// Signer key address to weight, including the master key when its
    /// weight is non-zero.
    pub fn signer_summary(&self) -> BTreeMap<String, u32> {
        let mut summary = BTreeMap::new();
        if self.master_key_weight() > 0 {
            summary.insert(
                SignerKey::from(self.account_id).address(),
                self.master_key_weight() as u32,
            );
        }
        for signer in &self.signers {
            summary.insert(signer.key.address(), signer.weight);
        }
        summary
    }

    /// Signer key address to sponsoring account, for sponsored signers only.
    pub fn sponsor_per_signer(&self) -> BTreeMap<String, AccountId> {
        self.signers
            .iter()
            .zip(&self.signer_sponsoring_ids)
            .filter_map(|(signer, sponsor)| sponsor.map(|s| (signer.key.address(), s)))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustLineEntry {
    pub account_id: AccountId,
    pub asset: TrustLineAsset,
    pub balance: i64,
    pub limit: i64,
    #[serde(default)]
    pub flags: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferEntry {
    pub seller_id: AccountId,
    pub offer_id: i64,
    pub selling: Asset,
    pub buying: Asset,
    pub amount: i64,
    pub price: Price,
    #[serde(default)]
    pub flags: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEntry {
    pub account_id: AccountId,
    pub data_name: String,
    pub data_value: Vec<u8>,
}

/// Identifier of a claimable balance: a typed 32-byte hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimableBalanceId {
    #[serde(default)]
    pub id_type: i32,
    pub hash: Hash,
}

impl ClaimableBalanceId {
    /// A version-0 balance id.
    pub fn v0(hash: Hash) -> Self {
        Self { id_type: 0, hash }
    }

    /// Hex of the XDR encoding: the 4-byte type followed by the hash.
    pub fn to_hex(&self) -> Result<String, TypeError> {
        self.check_type()?;
        Ok(hex::encode(self.to_xdr()))
    }

    /// `B...` StrKey form.
    pub fn to_strkey(&self) -> Result<String, TypeError> {
        self.check_type()?;
        let mut payload = Vec::with_capacity(33);
        payload.push(self.id_type as u8);
        payload.extend_from_slice(self.hash.as_bytes());
        Ok(strkey::encode(Version::ClaimableBalance, &payload))
    }

    fn check_type(&self) -> Result<(), TypeError> {
        if self.id_type != 0 {
            return Err(TypeError::UnsupportedBalanceIdType(self.id_type));
        }
        Ok(())
    }
}

impl ToXdr for ClaimableBalanceId {
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_i32(self.id_type);
        self.hash.write_xdr(w);
    }
}

/// Condition under which a claimant may claim a balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimPredicate {
    Unconditional,
    And(Vec<ClaimPredicate>),
    Or(Vec<ClaimPredicate>),
    Not(Option<Box<ClaimPredicate>>),
    /// Unix seconds.
    BeforeAbsoluteTime(i64),
    /// Seconds after the balance was created.
    BeforeRelativeTime(i64),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claimant {
    pub destination: AccountId,
    pub predicate: ClaimPredicate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimableBalanceEntry {
    pub balance_id: ClaimableBalanceId,
    pub claimants: Vec<Claimant>,
    pub asset: Asset,
    pub amount: i64,
    #[serde(default)]
    pub flags: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantProductPool {
    pub params: LiquidityPoolParameters,
    pub reserve_a: i64,
    pub reserve_b: i64,
    pub total_pool_shares: i64,
    pub pool_shares_trust_line_count: i64,
}

/// Body of a liquidity pool entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityPoolBody {
    ConstantProduct(ConstantProductPool),
    /// A pool type this model does not know.
    Unrecognized(i32),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPoolEntry {
    pub liquidity_pool_id: PoolId,
    pub body: LiquidityPoolBody,
}

impl LiquidityPoolEntry {
    pub fn constant_product(&self) -> Result<&ConstantProductPool, TypeError> {
        match &self.body {
            LiquidityPoolBody::ConstantProduct(cp) => Ok(cp),
            LiquidityPoolBody::Unrecognized(kind) => Err(TypeError::UnsupportedPoolType(*kind)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractDataDurability {
    Temporary = 0,
    Persistent = 1,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDataEntry {
    pub contract: ScAddress,
    pub key: ScVal,
    pub durability: ContractDataDurability,
    pub val: ScVal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCodeEntry {
    pub hash: Hash,
    #[serde(default)]
    pub code: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlEntry {
    pub key_hash: Hash,
    pub live_until_ledger_seq: u32,
}

/// Typed body of a ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryData {
    Account(AccountEntry),
    Trustline(TrustLineEntry),
    Offer(OfferEntry),
    Data(DataEntry),
    ClaimableBalance(ClaimableBalanceEntry),
    LiquidityPool(LiquidityPoolEntry),
    ContractData(ContractDataEntry),
    ContractCode(ContractCodeEntry),
    ConfigSetting { config_setting_id: i32 },
    Ttl(TtlEntry),
}

impl LedgerEntryData {
    pub fn entry_type(&self) -> LedgerEntryType {
        match self {
            Self::Account(_) => LedgerEntryType::Account,
            Self::Trustline(_) => LedgerEntryType::Trustline,
            Self::Offer(_) => LedgerEntryType::Offer,
            Self::Data(_) => LedgerEntryType::Data,
            Self::ClaimableBalance(_) => LedgerEntryType::ClaimableBalance,
            Self::LiquidityPool(_) => LedgerEntryType::LiquidityPool,
            Self::ContractData(_) => LedgerEntryType::ContractData,
            Self::ContractCode(_) => LedgerEntryType::ContractCode,
            Self::ConfigSetting { .. } => LedgerEntryType::ConfigSetting,
            Self::Ttl(_) => LedgerEntryType::Ttl,
        }
    }

    pub fn as_account(&self) -> Option<&AccountEntry> {
        match self {
            Self::Account(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_trustline(&self) -> Option<&TrustLineEntry> {
        match self {
            Self::Trustline(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&DataEntry> {
        match self {
            Self::Data(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_claimable_balance(&self) -> Option<&ClaimableBalanceEntry> {
        match self {
            Self::ClaimableBalance(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_liquidity_pool(&self) -> Option<&LiquidityPoolEntry> {
        match self {
            Self::LiquidityPool(lp) => Some(lp),
            _ => None,
        }
    }

    pub fn as_ttl(&self) -> Option<&TtlEntry> {
        match self {
            Self::Ttl(t) => Some(t),
            _ => None,
        }
    }
}

/// A ledger entry snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(default)]
    pub last_modified_ledger_seq: u32,
    pub data: LedgerEntryData,
    /// Account paying the reserve for this entry, if sponsored.
    #[serde(default)]
    pub sponsoring_id: Option<AccountId>,
}

impl LedgerEntry {
    pub fn new(data: LedgerEntryData) -> Self {
        Self {
            last_modified_ledger_seq: 0,
            data,
            sponsoring_id: None,
        }
    }

    pub fn sponsored_by(mut self, sponsor: AccountId) -> Self {
        self.sponsoring_id = Some(sponsor);
        self
    }
}

/// How one ledger entry was affected by one operation.
///
/// At least one of `pre` and `post` is present, and both carry data of
/// `entry_type`. Use [`LedgerEntryChange::validate`] to check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntryChange {
    pub entry_type: LedgerEntryType,
    pub pre: Option<LedgerEntry>,
    pub post: Option<LedgerEntry>,
}

impl LedgerEntryChange {
    pub fn created(post: LedgerEntry) -> Self {
        Self {
            entry_type: post.data.entry_type(),
            pre: None,
            post: Some(post),
        }
    }

    pub fn updated(pre: LedgerEntry, post: LedgerEntry) -> Self {
        Self {
            entry_type: post.data.entry_type(),
            pre: Some(pre),
            post: Some(post),
        }
    }

    pub fn removed(pre: LedgerEntry) -> Self {
        Self {
            entry_type: pre.data.entry_type(),
            pre: Some(pre),
            post: None,
        }
    }

    /// Returns a description of the problem if the change is malformed.
    pub fn validate(&self) -> Result<(), String> {
        if self.pre.is_none() && self.post.is_none() {
            return Err(format!("{} change has neither pre nor post state", self.entry_type));
        }
        for entry in self.pre.iter().chain(self.post.iter()) {
            let actual = entry.data.entry_type();
            if actual != self.entry_type {
                return Err(format!(
                    "{} change carries a {actual} entry",
                    self.entry_type
                ));
            }
        }
        Ok(())
    }

    /// The post state if present, otherwise the pre state.
    pub fn latest(&self) -> Option<&LedgerEntry> {
        self.post.as_ref().or(self.pre.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(weight: u8) -> AccountEntry {
        AccountEntry {
            account_id: AccountId::from_bytes([1u8; 32]),
            balance: 0,
            seq_num: 1,
            num_sub_entries: 0,
            inflation_dest: None,
            flags: 0,
            home_domain: String::new(),
            thresholds: [weight, 0, 0, 0],
            signers: vec![
                Signer { key: SignerKey::Ed25519([2u8; 32]), weight: 5 },
                Signer { key: SignerKey::Ed25519([3u8; 32]), weight: 7 },
            ],
            signer_sponsoring_ids: vec![Some(AccountId::from_bytes([9u8; 32])), None],
        }
    }

    #[test]
    fn signer_summary_includes_master_when_weighted() {
        let summary = account(1).signer_summary();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[&AccountId::from_bytes([1u8; 32]).address()], 1);
        assert_eq!(account(0).signer_summary().len(), 2);
    }

    #[test]
    fn sponsor_per_signer_skips_unsponsored() {
        let sponsors = account(1).sponsor_per_signer();
        assert_eq!(sponsors.len(), 1);
        let key = SignerKey::Ed25519([2u8; 32]).address();
        assert_eq!(sponsors[&key], AccountId::from_bytes([9u8; 32]));
    }

    #[test]
    fn balance_id_hex_and_strkey() {
        let id = ClaimableBalanceId::v0(Hash::from_bytes([5u8; 32]));
        assert_eq!(id.to_hex().unwrap(), format!("00000000{}", "05".repeat(32)));
        assert_eq!(
            id.to_strkey().unwrap(),
            "BAAAKBIFAUCQKBIFAUCQKBIFAUCQKBIFAUCQKBIFAUCQKBIFAUCQKBPPVE"
        );
    }

    #[test]
    fn balance_id_rejects_unknown_type() {
        let id = ClaimableBalanceId { id_type: 3, hash: Hash::default() };
        assert_eq!(id.to_hex().unwrap_err(), TypeError::UnsupportedBalanceIdType(3));
    }

    #[test]
    fn change_validation() {
        let entry = LedgerEntry::new(LedgerEntryData::Account(account(1)));
        assert!(LedgerEntryChange::created(entry.clone()).validate().is_ok());

        let empty = LedgerEntryChange {
            entry_type: LedgerEntryType::Account,
            pre: None,
            post: None,
        };
        assert!(empty.validate().is_err());

        let mismatched = LedgerEntryChange {
            entry_type: LedgerEntryType::Trustline,
            pre: None,
            post: Some(entry),
        };
        assert!(mismatched.validate().is_err());
    }

    #[test]
    fn unrecognized_pool_body() {
        let lp = LiquidityPoolEntry {
            liquidity_pool_id: PoolId::default(),
            body: LiquidityPoolBody::Unrecognized(4),
        };
        assert_eq!(lp.constant_product().unwrap_err(), TypeError::UnsupportedPoolType(4));
    }
}
