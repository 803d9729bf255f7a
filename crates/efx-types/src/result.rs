//! Transaction and operation results.

use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::asset::Asset;
use crate::hash::PoolId;
use crate::operation::OperationType;

/// A trade leg against an order-book offer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOfferAtom {
    pub seller_id: AccountId,
    pub offer_id: i64,
    pub asset_sold: Asset,
    pub amount_sold: i64,
    pub asset_bought: Asset,
    pub amount_bought: i64,
}

/// A trade leg against a liquidity pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimLiquidityAtom {
    pub liquidity_pool_id: PoolId,
    pub asset_sold: Asset,
    pub amount_sold: i64,
    pub asset_bought: Asset,
    pub amount_bought: i64,
}

/// One matched trade leg. Assets and amounts are from the counterparty's
/// perspective: `sold` left the counterparty, `bought` went to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimAtom {
    /// Pre-protocol-18 form with the seller as a raw key.
    V0(ClaimOfferAtom),
    OrderBook(ClaimOfferAtom),
    LiquidityPool(ClaimLiquidityAtom),
}

impl ClaimAtom {
    /// Counterparty account, absent for pool legs.
    pub fn seller_id(&self) -> Option<&AccountId> {
        match self {
            Self::V0(a) | Self::OrderBook(a) => Some(&a.seller_id),
            Self::LiquidityPool(_) => None,
        }
    }

    /// Counterparty offer id, zero for pool legs.
    pub fn offer_id(&self) -> i64 {
        match self {
            Self::V0(a) | Self::OrderBook(a) => a.offer_id,
            Self::LiquidityPool(_) => 0,
        }
    }

    pub fn asset_sold(&self) -> &Asset {
        match self {
            Self::V0(a) | Self::OrderBook(a) => &a.asset_sold,
            Self::LiquidityPool(a) => &a.asset_sold,
        }
    }

    pub fn amount_sold(&self) -> i64 {
        match self {
            Self::V0(a) | Self::OrderBook(a) => a.amount_sold,
            Self::LiquidityPool(a) => a.amount_sold,
        }
    }

    pub fn asset_bought(&self) -> &Asset {
        match self {
            Self::V0(a) | Self::OrderBook(a) => &a.asset_bought,
            Self::LiquidityPool(a) => &a.asset_bought,
        }
    }

    pub fn amount_bought(&self) -> i64 {
        match self {
            Self::V0(a) | Self::OrderBook(a) => a.amount_bought,
            Self::LiquidityPool(a) => a.amount_bought,
        }
    }
}

/// Final hop of a path payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplePaymentResult {
    pub destination: AccountId,
    pub asset: Asset,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathPaymentResult {
    Success {
        offers: Vec<ClaimAtom>,
        last: SimplePaymentResult,
    },
    Failure(i32),
}

impl PathPaymentResult {
    /// Amount sent by a strict-receive payment: the leading run of claims
    /// sharing the first claim's bought asset, or the final hop when the
    /// payment crossed no offers.
    pub fn send_amount(&self) -> Option<i64> {
        let Self::Success { offers, last } = self else {
            return None;
        };
        let Some(first) = offers.first() else {
            return Some(last.amount);
        };
        let asset = first.asset_bought();
        Some(
            offers
                .iter()
                .take_while(|claim| claim.asset_bought() == asset)
                .map(ClaimAtom::amount_bought)
                .sum(),
        )
    }

    /// Amount received by the destination of a strict-send payment.
    pub fn dest_amount(&self) -> Option<i64> {
        match self {
            Self::Success { last, .. } => Some(last.amount),
            Self::Failure(_) => None,
        }
    }

    pub fn offers(&self) -> Option<&[ClaimAtom]> {
        match self {
            Self::Success { offers, .. } => Some(offers),
            Self::Failure(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManageOfferResult {
    Success { offers_claimed: Vec<ClaimAtom> },
    Failure(i32),
}

impl ManageOfferResult {
    pub fn offers_claimed(&self) -> Option<&[ClaimAtom]> {
        match self {
            Self::Success { offers_claimed } => Some(offers_claimed),
            Self::Failure(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountMergeResult {
    Success { source_account_balance: i64 },
    Failure(i32),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflationPayout {
    pub destination: AccountId,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InflationResult {
    Success { payouts: Vec<InflationPayout> },
    Failure(i32),
}

/// Result of an operation that was applied. The arm tag normally matches the
/// operation kind, but passive sell offers are known to report under
/// `ManageSellOffer`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationResultTr {
    PathPaymentStrictReceive(PathPaymentResult),
    PathPaymentStrictSend(PathPaymentResult),
    ManageSellOffer(ManageOfferResult),
    ManageBuyOffer(ManageOfferResult),
    CreatePassiveSellOffer(ManageOfferResult),
    AccountMerge(AccountMergeResult),
    Inflation(InflationResult),
    /// Any other kind, reduced to its result code.
    Other { kind: OperationType, code: i32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    Tr(OperationResultTr),
    /// Operation was not applied; carries the outer result code.
    Outer(i32),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub successful: bool,
    #[serde(default)]
    pub operation_results: Vec<OperationResult>,
}
