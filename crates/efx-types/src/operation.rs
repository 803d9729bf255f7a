//! Operations: the closed set of operation kinds and their payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::account::{AccountId, MuxedAccount, Signer, SignerKey};
use crate::asset::{Asset, ChangeTrustAsset, Price};
use crate::contract::HostFunction;
use crate::entry::{ClaimableBalanceId, Claimant};
use crate::hash::PoolId;
use crate::ledger_key::LedgerKey;

/// Operation kinds. Discriminants are the protocol's operation type codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    CreateAccount = 0,
    Payment = 1,
    PathPaymentStrictReceive = 2,
    ManageSellOffer = 3,
    CreatePassiveSellOffer = 4,
    SetOptions = 5,
    ChangeTrust = 6,
    AllowTrust = 7,
    AccountMerge = 8,
    Inflation = 9,
    ManageData = 10,
    BumpSequence = 11,
    ManageBuyOffer = 12,
    PathPaymentStrictSend = 13,
    CreateClaimableBalance = 14,
    ClaimClaimableBalance = 15,
    BeginSponsoringFutureReserves = 16,
    EndSponsoringFutureReserves = 17,
    RevokeSponsorship = 18,
    Clawback = 19,
    ClawbackClaimableBalance = 20,
    SetTrustLineFlags = 21,
    LiquidityPoolDeposit = 22,
    LiquidityPoolWithdraw = 23,
    InvokeHostFunction = 24,
    ExtendFootprintTtl = 25,
    RestoreFootprint = 26,
}

impl OperationType {
    pub const ALL: [OperationType; 27] = [
        Self::CreateAccount,
        Self::Payment,
        Self::PathPaymentStrictReceive,
        Self::ManageSellOffer,
        Self::CreatePassiveSellOffer,
        Self::SetOptions,
        Self::ChangeTrust,
        Self::AllowTrust,
        Self::AccountMerge,
        Self::Inflation,
        Self::ManageData,
        Self::BumpSequence,
        Self::ManageBuyOffer,
        Self::PathPaymentStrictSend,
        Self::CreateClaimableBalance,
        Self::ClaimClaimableBalance,
        Self::BeginSponsoringFutureReserves,
        Self::EndSponsoringFutureReserves,
        Self::RevokeSponsorship,
        Self::Clawback,
        Self::ClawbackClaimableBalance,
        Self::SetTrustLineFlags,
        Self::LiquidityPoolDeposit,
        Self::LiquidityPoolWithdraw,
        Self::InvokeHostFunction,
        Self::ExtendFootprintTtl,
        Self::RestoreFootprint,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Snake-case name, e.g. `path_payment_strict_receive`.
    pub fn name(self) -> &'static str {
        match self {
            Self::CreateAccount => "create_account",
            Self::Payment => "payment",
            Self::PathPaymentStrictReceive => "path_payment_strict_receive",
            Self::ManageSellOffer => "manage_sell_offer",
            Self::CreatePassiveSellOffer => "create_passive_sell_offer",
            Self::SetOptions => "set_options",
            Self::ChangeTrust => "change_trust",
            Self::AllowTrust => "allow_trust",
            Self::AccountMerge => "account_merge",
            Self::Inflation => "inflation",
            Self::ManageData => "manage_data",
            Self::BumpSequence => "bump_sequence",
            Self::ManageBuyOffer => "manage_buy_offer",
            Self::PathPaymentStrictSend => "path_payment_strict_send",
            Self::CreateClaimableBalance => "create_claimable_balance",
            Self::ClaimClaimableBalance => "claim_claimable_balance",
            Self::BeginSponsoringFutureReserves => "begin_sponsoring_future_reserves",
            Self::EndSponsoringFutureReserves => "end_sponsoring_future_reserves",
            Self::RevokeSponsorship => "revoke_sponsorship",
            Self::Clawback => "clawback",
            Self::ClawbackClaimableBalance => "clawback_claimable_balance",
            Self::SetTrustLineFlags => "set_trust_line_flags",
            Self::LiquidityPoolDeposit => "liquidity_pool_deposit",
            Self::LiquidityPoolWithdraw => "liquidity_pool_withdraw",
            Self::InvokeHostFunction => "invoke_host_function",
            Self::ExtendFootprintTtl => "extend_footprint_ttl",
            Self::RestoreFootprint => "restore_footprint",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountOp {
    pub destination: AccountId,
    pub starting_balance: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOp {
    pub destination: MuxedAccount,
    pub asset: Asset,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPaymentStrictReceiveOp {
    pub send_asset: Asset,
    pub send_max: i64,
    pub destination: MuxedAccount,
    pub dest_asset: Asset,
    pub dest_amount: i64,
    #[serde(default)]
    pub path: Vec<Asset>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPaymentStrictSendOp {
    pub send_asset: Asset,
    pub send_amount: i64,
    pub destination: MuxedAccount,
    pub dest_asset: Asset,
    pub dest_min: i64,
    #[serde(default)]
    pub path: Vec<Asset>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManageSellOfferOp {
    pub selling: Asset,
    pub buying: Asset,
    pub amount: i64,
    pub price: Price,
    pub offer_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManageBuyOfferOp {
    pub selling: Asset,
    pub buying: Asset,
    pub buy_amount: i64,
    pub price: Price,
    pub offer_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePassiveSellOfferOp {
    pub selling: Asset,
    pub buying: Asset,
    pub amount: i64,
    pub price: Price,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOptionsOp {
    #[serde(default)]
    pub inflation_dest: Option<AccountId>,
    #[serde(default)]
    pub clear_flags: Option<u32>,
    #[serde(default)]
    pub set_flags: Option<u32>,
    #[serde(default)]
    pub master_weight: Option<u32>,
    #[serde(default)]
    pub low_threshold: Option<u32>,
    #[serde(default)]
    pub med_threshold: Option<u32>,
    #[serde(default)]
    pub high_threshold: Option<u32>,
    #[serde(default)]
    pub home_domain: Option<String>,
    #[serde(default)]
    pub signer: Option<Signer>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeTrustOp {
    pub line: ChangeTrustAsset,
    pub limit: i64,
}

/// Deprecated authorization operation; the asset issuer is the source account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowTrustOp {
    pub trustor: AccountId,
    pub asset_code: String,
    pub authorize: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManageDataOp {
    pub data_name: String,
    #[serde(default)]
    pub data_value: Option<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BumpSequenceOp {
    pub bump_to: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateClaimableBalanceOp {
    pub asset: Asset,
    pub amount: i64,
    pub claimants: Vec<Claimant>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimClaimableBalanceOp {
    pub balance_id: ClaimableBalanceId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginSponsoringFutureReservesOp {
    pub sponsored_id: AccountId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevokeSponsorshipOp {
    LedgerEntry(LedgerKey),
    Signer {
        account_id: AccountId,
        signer_key: SignerKey,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClawbackOp {
    pub asset: Asset,
    pub from: MuxedAccount,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClawbackClaimableBalanceOp {
    pub balance_id: ClaimableBalanceId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTrustLineFlagsOp {
    pub trustor: AccountId,
    pub asset: Asset,
    #[serde(default)]
    pub clear_flags: u32,
    #[serde(default)]
    pub set_flags: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPoolDepositOp {
    pub liquidity_pool_id: PoolId,
    pub max_amount_a: i64,
    pub max_amount_b: i64,
    pub min_price: Price,
    pub max_price: Price,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPoolWithdrawOp {
    pub liquidity_pool_id: PoolId,
    pub amount: i64,
    pub min_amount_a: i64,
    pub min_amount_b: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeHostFunctionOp {
    pub host_function: HostFunction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendFootprintTtlOp {
    pub extend_to: u32,
}

/// Kind-specific payload of an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationBody {
    CreateAccount(CreateAccountOp),
    Payment(PaymentOp),
    PathPaymentStrictReceive(PathPaymentStrictReceiveOp),
    ManageSellOffer(ManageSellOfferOp),
    CreatePassiveSellOffer(CreatePassiveSellOfferOp),
    SetOptions(SetOptionsOp),
    ChangeTrust(ChangeTrustOp),
    AllowTrust(AllowTrustOp),
    AccountMerge { destination: MuxedAccount },
    Inflation,
    ManageData(ManageDataOp),
    BumpSequence(BumpSequenceOp),
    ManageBuyOffer(ManageBuyOfferOp),
    PathPaymentStrictSend(PathPaymentStrictSendOp),
    CreateClaimableBalance(CreateClaimableBalanceOp),
    ClaimClaimableBalance(ClaimClaimableBalanceOp),
    BeginSponsoringFutureReserves(BeginSponsoringFutureReservesOp),
    EndSponsoringFutureReserves,
    RevokeSponsorship(RevokeSponsorshipOp),
    Clawback(ClawbackOp),
    ClawbackClaimableBalance(ClawbackClaimableBalanceOp),
    SetTrustLineFlags(SetTrustLineFlagsOp),
    LiquidityPoolDeposit(LiquidityPoolDepositOp),
    LiquidityPoolWithdraw(LiquidityPoolWithdrawOp),
    InvokeHostFunction(InvokeHostFunctionOp),
    ExtendFootprintTtl(ExtendFootprintTtlOp),
    RestoreFootprint,
    /// An operation code outside the known set.
    Unrecognized(i32),
}

impl OperationBody {
    /// The operation kind, or the raw code if it is not a known kind.
    pub fn operation_type(&self) -> Result<OperationType, i32> {
        Ok(match self {
            Self::CreateAccount(_) => OperationType::CreateAccount,
            Self::Payment(_) => OperationType::Payment,
            Self::PathPaymentStrictReceive(_) => OperationType::PathPaymentStrictReceive,
            Self::ManageSellOffer(_) => OperationType::ManageSellOffer,
            Self::CreatePassiveSellOffer(_) => OperationType::CreatePassiveSellOffer,
            Self::SetOptions(_) => OperationType::SetOptions,
            Self::ChangeTrust(_) => OperationType::ChangeTrust,
            Self::AllowTrust(_) => OperationType::AllowTrust,
            Self::AccountMerge { .. } => OperationType::AccountMerge,
            Self::Inflation => OperationType::Inflation,
            Self::ManageData(_) => OperationType::ManageData,
            Self::BumpSequence(_) => OperationType::BumpSequence,
            Self::ManageBuyOffer(_) => OperationType::ManageBuyOffer,
            Self::PathPaymentStrictSend(_) => OperationType::PathPaymentStrictSend,
            Self::CreateClaimableBalance(_) => OperationType::CreateClaimableBalance,
            Self::ClaimClaimableBalance(_) => OperationType::ClaimClaimableBalance,
            Self::BeginSponsoringFutureReserves(_) => OperationType::BeginSponsoringFutureReserves,
            Self::EndSponsoringFutureReserves => OperationType::EndSponsoringFutureReserves,
            Self::RevokeSponsorship(_) => OperationType::RevokeSponsorship,
            Self::Clawback(_) => OperationType::Clawback,
            Self::ClawbackClaimableBalance(_) => OperationType::ClawbackClaimableBalance,
            Self::SetTrustLineFlags(_) => OperationType::SetTrustLineFlags,
            Self::LiquidityPoolDeposit(_) => OperationType::LiquidityPoolDeposit,
            Self::LiquidityPoolWithdraw(_) => OperationType::LiquidityPoolWithdraw,
            Self::InvokeHostFunction(_) => OperationType::InvokeHostFunction,
            Self::ExtendFootprintTtl(_) => OperationType::ExtendFootprintTtl,
            Self::RestoreFootprint => OperationType::RestoreFootprint,
            Self::Unrecognized(code) => return Err(*code),
        })
    }
}

/// One operation of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Overrides the transaction source when present.
    #[serde(default)]
    pub source_account: Option<MuxedAccount>,
    pub body: OperationBody,
}

impl Operation {
    pub fn new(body: OperationBody) -> Self {
        Self {
            source_account: None,
            body,
        }
    }

    pub fn with_source(mut self, source: MuxedAccount) -> Self {
        self.source_account = Some(source);
        self
    }
}
