//! Liquidity pool deposits and withdrawals.

use efx_types::{amount, OperationBody, PoolId};

use super::body_mismatch;
use crate::accumulator::EffectAccumulator;
use crate::context::OperationContext;
use crate::details::{asset_amount, DetailValue, Details};
use crate::effect_type::EffectType;
use crate::error::EffectResult;
use crate::pool::{constant_product, pool_delta, pool_details, PoolDelta};

/// Pool snapshot, reserve deltas scaled by `sign`, and the share delta.
fn movement(
    ctx: &OperationContext<'_>,
    pool_id: &PoolId,
    sign: i64,
) -> EffectResult<(DetailValue, Vec<DetailValue>, PoolDelta)> {
    let (lp, delta) = pool_delta(ctx.changes()?, Some(pool_id))?;
    let cp = constant_product(lp)?;
    let reserves = vec![
        asset_amount(&cp.params.asset_a, sign * delta.reserve_a),
        asset_amount(&cp.params.asset_b, sign * delta.reserve_b),
    ];
    Ok((pool_details(lp)?, reserves, delta))
}

pub fn deposit(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let OperationBody::LiquidityPoolDeposit(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let (pool, reserves, delta) = movement(ctx, &op.liquidity_pool_id, 1)?;
    acc.add_muxed(
        &ctx.source_account(),
        EffectType::LiquidityPoolDeposited,
        Details::new()
            .with("liquidity_pool", pool)
            .with("reserves_deposited", reserves)
            .with("shares_received", amount::format(delta.total_pool_shares)),
    );
    Ok(())
}

pub fn withdraw(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let OperationBody::LiquidityPoolWithdraw(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let (pool, reserves, delta) = movement(ctx, &op.liquidity_pool_id, -1)?;
    acc.add_muxed(
        &ctx.source_account(),
        EffectType::LiquidityPoolWithdrew,
        Details::new()
            .with("liquidity_pool", pool)
            .with("reserves_received", reserves)
            .with("shares_redeemed", amount::format(-delta.total_pool_shares)),
    );
    Ok(())
}
