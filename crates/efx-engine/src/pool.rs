//! Liquidity pool delta lookup and pool snapshot details.

use efx_types::{
    amount, ConstantProductPool, LedgerEntryChange, LedgerEntryType, LiquidityPoolEntry, PoolId,
    TypeError,
};

use crate::details::{asset_amount, DetailValue, Details};
use crate::error::{EffectError, EffectResult};

/// Signed change of a constant-product pool across one operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolDelta {
    pub reserve_a: i64,
    pub reserve_b: i64,
    pub total_pool_shares: i64,
}

/// Find the first pool change (optionally for `pool_id`) and diff it.
///
/// Returns the latest snapshot of the pool (post if present, else pre) and
/// `post - pre`, an absent side counting as zero. No matching change yields
/// [`EffectError::PoolChangeNotFound`].
pub fn pool_delta<'a>(
    changes: &'a [LedgerEntryChange],
    pool_id: Option<&PoolId>,
) -> EffectResult<(&'a LiquidityPoolEntry, PoolDelta)> {
    'changes: for change in changes {
        if change.entry_type != LedgerEntryType::LiquidityPool {
            continue;
        }
        let mut latest = None;
        let mut sides = [PoolDelta::default(); 2];
        for (slot, entry) in [&change.pre, &change.post].into_iter().enumerate() {
            let Some(entry) = entry else { continue };
            let lp = entry.data.as_liquidity_pool().ok_or_else(|| {
                EffectError::invalid_state("liquidity pool change without pool entry")
            })?;
            if pool_id.is_some_and(|id| *id != lp.liquidity_pool_id) {
                continue 'changes;
            }
            let cp = constant_product(lp)?;
            sides[slot] = PoolDelta {
                reserve_a: cp.reserve_a,
                reserve_b: cp.reserve_b,
                total_pool_shares: cp.total_pool_shares,
            };
            latest = Some(lp);
        }
        let Some(lp) = latest else {
            return Err(EffectError::invalid_state(
                "liquidity pool change has neither pre nor post state",
            ));
        };
        let [pre, post] = sides;
        let delta = PoolDelta {
            reserve_a: post.reserve_a - pre.reserve_a,
            reserve_b: post.reserve_b - pre.reserve_b,
            total_pool_shares: post.total_pool_shares - pre.total_pool_shares,
        };
        return Ok((lp, delta));
    }
    Err(EffectError::PoolChangeNotFound)
}

/// The constant-product body of a pool entry.
pub fn constant_product(lp: &LiquidityPoolEntry) -> EffectResult<&ConstantProductPool> {
    lp.constant_product().map_err(|err| match err {
        TypeError::UnsupportedPoolType(kind) => EffectError::LiquidityPoolBodyTypeMismatch(kind),
        other => EffectError::Type(other),
    })
}

/// Snapshot of a pool as carried in pool-related effects.
pub fn pool_details(lp: &LiquidityPoolEntry) -> EffectResult<DetailValue> {
    let cp = constant_product(lp)?;
    Ok(Details::new()
        .with("id", lp.liquidity_pool_id.to_hex())
        .with("fee_bp", cp.params.fee)
        .with("type", "constant_product")
        .with("total_trustlines", cp.pool_shares_trust_line_count.to_string())
        .with("total_shares", amount::format(cp.total_pool_shares))
        .with(
            "reserves",
            vec![
                asset_amount(&cp.params.asset_a, cp.reserve_a),
                asset_amount(&cp.params.asset_b, cp.reserve_b),
            ],
        )
        .into())
}
