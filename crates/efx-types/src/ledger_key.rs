use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::asset::TrustLineAsset;
use crate::contract::{ScAddress, ScVal};
use crate::entry::{ClaimableBalanceId, ContractDataDurability, LedgerEntryType};
use crate::hash::{Hash, PoolId};
use crate::xdr::{ToXdr, XdrWriter};

/// Key identifying a single ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKey {
    Account {
        account_id: AccountId,
    },
    Trustline {
        account_id: AccountId,
        asset: TrustLineAsset,
    },
    Offer {
        seller_id: AccountId,
        offer_id: i64,
    },
    Data {
        account_id: AccountId,
        data_name: String,
    },
    ClaimableBalance {
        balance_id: ClaimableBalanceId,
    },
    LiquidityPool {
        liquidity_pool_id: PoolId,
    },
    ContractData {
        contract: ScAddress,
        key: ScVal,
        durability: ContractDataDurability,
    },
    ContractCode {
        hash: Hash,
    },
    ConfigSetting {
        config_setting_id: i32,
    },
    Ttl {
        key_hash: Hash,
    },
}

impl LedgerKey {
    pub fn entry_type(&self) -> LedgerEntryType {
        match self {
            Self::Account { .. } => LedgerEntryType::Account,
            Self::Trustline { .. } => LedgerEntryType::Trustline,
            Self::Offer { .. } => LedgerEntryType::Offer,
            Self::Data { .. } => LedgerEntryType::Data,
            Self::ClaimableBalance { .. } => LedgerEntryType::ClaimableBalance,
            Self::LiquidityPool { .. } => LedgerEntryType::LiquidityPool,
            Self::ContractData { .. } => LedgerEntryType::ContractData,
            Self::ContractCode { .. } => LedgerEntryType::ContractCode,
            Self::ConfigSetting { .. } => LedgerEntryType::ConfigSetting,
            Self::Ttl { .. } => LedgerEntryType::Ttl,
        }
    }

    /// Hex SHA-256 of the XDR-encoded key.
    pub fn hash_hex(&self) -> String {
        Hash::sha256(&self.to_xdr()).to_hex()
    }
}

impl ToXdr for LedgerKey {
    fn write_xdr(&self, w: &mut XdrWriter) {
        w.write_i32(self.entry_type() as i32);
        match self {
            Self::Account { account_id } => account_id.write_xdr(w),
            Self::Trustline { account_id, asset } => {
                account_id.write_xdr(w);
                asset.write_xdr(w);
            }
            Self::Offer { seller_id, offer_id } => {
                seller_id.write_xdr(w);
                w.write_i64(*offer_id);
            }
            Self::Data {
                account_id,
                data_name,
            } => {
                account_id.write_xdr(w);
                w.write_string(data_name);
            }
            Self::ClaimableBalance { balance_id } => balance_id.write_xdr(w),
            Self::LiquidityPool { liquidity_pool_id } => liquidity_pool_id.write_xdr(w),
            Self::ContractData {
                contract,
                key,
                durability,
            } => {
                contract.write_xdr(w);
                key.write_xdr(w);
                w.write_i32(*durability as i32);
            }
            Self::ContractCode { hash } => hash.write_xdr(w),
            Self::ConfigSetting { config_setting_id } => w.write_i32(*config_setting_id),
            Self::Ttl { key_hash } => key_hash.write_xdr(w),
        }
    }
}
