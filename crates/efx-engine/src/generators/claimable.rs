//! Claimable balance creation, claiming and clawback.

use efx_types::{amount, ClaimableBalanceEntry, ClaimableBalanceId, LedgerEntryType, OperationBody};

use super::body_mismatch;
use crate::accumulator::EffectAccumulator;
use crate::context::OperationContext;
use crate::details::{add_asset, Details};
use crate::effect_type::EffectType;
use crate::error::{EffectError, EffectResult};
use crate::sweeps::{self, balance_hex};

fn credited(cb: &ClaimableBalanceEntry) -> Details {
    let mut details = Details::new().with("amount", amount::format(cb.amount));
    add_asset(&mut details, &cb.asset, "");
    details
}

/// The balance with `id` that this operation removed, if any.
fn removed_balance<'a>(
    ctx: &OperationContext<'a>,
    id: &ClaimableBalanceId,
) -> EffectResult<Option<&'a ClaimableBalanceEntry>> {
    let wanted = balance_hex(ctx, id)?;
    for change in ctx.changes()? {
        if change.entry_type != LedgerEntryType::ClaimableBalance || change.post.is_some() {
            continue;
        }
        let Some(cb) = change.pre.as_ref().and_then(|e| e.data.as_claimable_balance()) else {
            continue;
        };
        if balance_hex(ctx, &cb.balance_id)? == wanted {
            return Ok(Some(cb));
        }
    }
    Ok(None)
}

/// Claimant effects list the claimants as submitted, not as stored.
pub fn create_claimable_balance(
    ctx: &OperationContext<'_>,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    let OperationBody::CreateClaimableBalance(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let cb = ctx
        .changes()?
        .iter()
        .filter(|c| c.entry_type == LedgerEntryType::ClaimableBalance)
        .find_map(|c| c.post.as_ref().and_then(|e| e.data.as_claimable_balance()))
        .ok_or_else(|| EffectError::EntryChangeNotFound("created claimable balance".into()))?;

    let source = ctx.source_account();
    sweeps::claimable_balance_created(ctx, &source, cb, &op.claimants, acc)?;

    let mut debited = Details::new().with("amount", amount::format(op.amount));
    add_asset(&mut debited, &op.asset, "");
    acc.add_muxed(&source, EffectType::AccountDebited, debited);
    Ok(())
}

pub fn claim_claimable_balance(
    ctx: &OperationContext<'_>,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    let OperationBody::ClaimClaimableBalance(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let cb = removed_balance(ctx, &op.balance_id)?.ok_or_else(|| {
        EffectError::EntryChangeNotFound("claimed claimable balance".into())
    })?;
    let source = ctx.source_account();
    acc.add_muxed(
        &source,
        EffectType::ClaimableBalanceClaimed,
        Details::new()
            .with("balance_id", balance_hex(ctx, &op.balance_id)?)
            .with("amount", amount::format(cb.amount))
            .with("asset", cb.asset.canonical()),
    );
    acc.add_muxed(&source, EffectType::AccountCredited, credited(cb));
    Ok(())
}

/// The clawed-back amount returns to the issuer when the removed balance is
/// visible in the changes.
pub fn clawback_claimable_balance(
    ctx: &OperationContext<'_>,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    let OperationBody::ClawbackClaimableBalance(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let source = ctx.source_account();
    acc.add_muxed(
        &source,
        EffectType::ClaimableBalanceClawedBack,
        Details::new().with("balance_id", balance_hex(ctx, &op.balance_id)?),
    );
    if let Some(cb) = removed_balance(ctx, &op.balance_id)? {
        acc.add_muxed(&source, EffectType::AccountCredited, credited(cb));
    }
    Ok(())
}
