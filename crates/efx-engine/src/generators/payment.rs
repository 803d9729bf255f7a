//! Payments, path payments and clawbacks.

use efx_types::result::PathPaymentResult;
use efx_types::{amount, Asset, MuxedAccount, OperationBody, OperationResultTr, OperationType};

use super::{applied_result, body_mismatch, dex};
use crate::accumulator::EffectAccumulator;
use crate::context::OperationContext;
use crate::details::{add_asset, Details};
use crate::effect_type::EffectType;
use crate::error::{EffectError, EffectResult};

fn movement(raw: i64, asset: &Asset) -> Details {
    let mut details = Details::new().with("amount", amount::format(raw));
    add_asset(&mut details, asset, "");
    details
}

fn credit_then_debit(
    acc: &mut EffectAccumulator,
    destination: &MuxedAccount,
    credited: Details,
    source: &MuxedAccount,
    debited: Details,
) {
    acc.add_muxed(destination, EffectType::AccountCredited, credited);
    acc.add_muxed(source, EffectType::AccountDebited, debited);
}

pub fn payment(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let OperationBody::Payment(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let details = movement(op.amount, &op.asset);
    credit_then_debit(acc, &op.destination, details.clone(), &ctx.source_account(), details);
    Ok(())
}

/// The successful path payment result under the arm for `kind`.
fn path_result<'a>(
    ctx: &OperationContext<'a>,
    kind: OperationType,
) -> EffectResult<&'a PathPaymentResult> {
    let result = match (kind, applied_result(ctx, kind)?) {
        (OperationType::PathPaymentStrictReceive, OperationResultTr::PathPaymentStrictReceive(r))
        | (OperationType::PathPaymentStrictSend, OperationResultTr::PathPaymentStrictSend(r)) => r,
        _ => return Err(EffectError::MissingResultArm(kind, ctx.index())),
    };
    match result {
        PathPaymentResult::Success { .. } => Ok(result),
        PathPaymentResult::Failure(_) => Err(EffectError::MissingResultArm(kind, ctx.index())),
    }
}

/// Destination receives exactly `dest_amount`; the source pays whatever the
/// crossed offers took.
pub fn path_payment_strict_receive(
    ctx: &OperationContext<'_>,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    let OperationBody::PathPaymentStrictReceive(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let kind = OperationType::PathPaymentStrictReceive;
    let result = path_result(ctx, kind)?;
    let sent = result
        .send_amount()
        .ok_or(EffectError::MissingResultArm(kind, ctx.index()))?;
    let source = ctx.source_account();
    credit_then_debit(
        acc,
        &op.destination,
        movement(op.dest_amount, &op.dest_asset),
        &source,
        movement(sent, &op.send_asset),
    );
    dex::trades(ctx, &source, result.offers().unwrap_or_default(), true, acc)
}

/// Source pays exactly `send_amount`; the destination gets whatever the path
/// delivered.
pub fn path_payment_strict_send(
    ctx: &OperationContext<'_>,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    let OperationBody::PathPaymentStrictSend(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let kind = OperationType::PathPaymentStrictSend;
    let result = path_result(ctx, kind)?;
    let received = result
        .dest_amount()
        .ok_or(EffectError::MissingResultArm(kind, ctx.index()))?;
    let source = ctx.source_account();
    credit_then_debit(
        acc,
        &op.destination,
        movement(received, &op.dest_asset),
        &source,
        movement(op.send_amount, &op.send_asset),
    );
    dex::trades(ctx, &source, result.offers().unwrap_or_default(), true, acc)
}

/// Clawback debits the holder. The issuer's side is implicit in the burn.
pub fn clawback(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let OperationBody::Clawback(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    acc.add_muxed(&op.from, EffectType::AccountDebited, movement(op.amount, &op.asset));
    Ok(())
}
