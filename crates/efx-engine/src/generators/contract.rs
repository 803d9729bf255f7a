//! Soroban operations: asset-contract balance movements and footprint
//! maintenance.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use efx_types::{amount, HostFunction, LedgerKey, OperationBody, ToXdr};

use super::body_mismatch;
use crate::accumulator::EffectAccumulator;
use crate::context::OperationContext;
use crate::details::{add_asset, Details};
use crate::effect_type::EffectType;
use crate::error::{EffectError, EffectResult};
use crate::sac::{self, is_account_address, SacEventKind};

/// Which side of a movement an address is on.
#[derive(Clone, Copy)]
enum Side {
    Debit,
    Credit,
}

/// Account parties get account effects; contract parties are reported on the
/// invoking source as contract effects naming the contract.
fn record(
    ctx: &OperationContext<'_>,
    address: &str,
    side: Side,
    mut details: Details,
    acc: &mut EffectAccumulator,
) {
    if is_account_address(address) {
        let effect_type = match side {
            Side::Debit => EffectType::AccountDebited,
            Side::Credit => EffectType::AccountCredited,
        };
        acc.add_address(address.to_string(), effect_type, details);
    } else {
        details.insert("contract", address);
        let effect_type = match side {
            Side::Debit => EffectType::ContractDebited,
            Side::Credit => EffectType::ContractCredited,
        };
        acc.add_muxed(&ctx.source_account(), effect_type, details);
    }
}

/// One debit and/or credit per asset-contract event, in event order.
pub fn invoke_host_function(
    ctx: &OperationContext<'_>,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    let OperationBody::InvokeHostFunction(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    if let HostFunction::Unrecognized(kind) = op.host_function {
        return Err(EffectError::UnknownHostFunctionKind(kind));
    }

    for event in sac::asset_events(ctx)? {
        let mut details = Details::new();
        add_asset(&mut details, &event.asset, "");
        details.insert("contract_event_type", event.kind.name());
        details.insert("amount", amount::format_i128(event.amount));

        match (event.kind, event.from.as_deref(), event.to.as_deref()) {
            (SacEventKind::Transfer, Some(from), Some(to)) => {
                record(ctx, from, Side::Debit, details.clone(), acc);
                record(ctx, to, Side::Credit, details, acc);
            }
            (SacEventKind::Mint, _, Some(to)) => record(ctx, to, Side::Credit, details, acc),
            (SacEventKind::Clawback | SacEventKind::Burn, Some(from), _) => {
                record(ctx, from, Side::Debit, details, acc)
            }
            _ => {}
        }
    }
    Ok(())
}

/// Base64 XDR TTL keys of every TTL entry the operation touched.
fn ttl_entries(ctx: &OperationContext<'_>, what: &str) -> EffectResult<Vec<String>> {
    let mut entries = Vec::new();
    for change in ctx.changes()? {
        let post = change.post.as_ref().ok_or_else(|| {
            EffectError::invalid_state(format!(
                "{what} operation {} has a change without post state",
                ctx.index()
            ))
        })?;
        // Other entries, such as the fee account, may change alongside.
        let Some(ttl) = post.data.as_ttl() else {
            continue;
        };
        let key = LedgerKey::Ttl { key_hash: ttl.key_hash };
        entries.push(STANDARD.encode(key.to_xdr()));
    }
    Ok(entries)
}

pub fn extend_footprint_ttl(
    ctx: &OperationContext<'_>,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    let OperationBody::ExtendFootprintTtl(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let entries = ttl_entries(ctx, "extend footprint ttl")?;
    acc.add_muxed(
        &ctx.source_account(),
        EffectType::ExtendFootprintTtl,
        Details::new()
            .with("entries", entries)
            .with("extend_to", op.extend_to),
    );
    Ok(())
}

pub fn restore_footprint(
    ctx: &OperationContext<'_>,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    let entries = ttl_entries(ctx, "restore footprint")?;
    acc.add_muxed(
        &ctx.source_account(),
        EffectType::RestoreFootprint,
        Details::new().with("entries", entries),
    );
    Ok(())
}
