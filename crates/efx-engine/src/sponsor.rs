//! Resolution of the account sponsoring what an operation created.

use efx_types::{AccountId, LedgerEntryChange, LedgerEntryType, MuxedAccount, OperationBody};

use crate::context::OperationContext;
use crate::error::EffectResult;

/// Sponsor newly attached to `signer_key` by this change, if any.
fn signer_sponsor(signer_key: &str, change: &LedgerEntryChange) -> Option<AccountId> {
    if change.entry_type != LedgerEntryType::Account {
        return None;
    }
    let post = change.post.as_ref()?.data.as_account()?;
    let sponsor = *post.sponsor_per_signer().get(signer_key)?;
    let former = change
        .pre
        .as_ref()
        .and_then(|e| e.data.as_account())
        .and_then(|pre| pre.sponsor_per_signer().get(signer_key).copied());
    match former {
        Some(former) if former == sponsor => None,
        _ => Some(sponsor),
    }
}

/// The sponsor of whatever the operation created.
///
/// A set-options operation adding a signer is matched on that signer first;
/// otherwise the first created entry carrying a sponsoring id wins.
pub fn operation_sponsor(ctx: &OperationContext<'_>) -> EffectResult<Option<AccountId>> {
    let changes = ctx.changes()?;
    let signer_key = match &ctx.operation().body {
        OperationBody::SetOptions(op) => op.signer.as_ref().map(|s| s.key.address()),
        _ => None,
    };
    for change in changes {
        if let Some(sponsor) = signer_key
            .as_deref()
            .and_then(|key| signer_sponsor(key, change))
        {
            return Ok(Some(sponsor));
        }
        if change.pre.is_some() {
            continue;
        }
        if let Some(sponsor) = change.post.as_ref().and_then(|e| e.sponsoring_id) {
            return Ok(Some(sponsor));
        }
    }
    Ok(None)
}

/// Source of the begin-sponsoring operation that opened the sandwich this
/// end-sponsoring operation closes.
///
/// Failed transactions may not nest properly, so they never resolve.
pub fn initiating_begin_sponsor(ctx: &OperationContext<'_>) -> Option<MuxedAccount> {
    if !ctx.transaction_successful() {
        return None;
    }
    let sponsored = ctx.source_account_id();
    let operations = &ctx.envelope().operations;
    let end = usize::try_from(ctx.index()).ok()?.min(operations.len());
    operations[..end].iter().rev().find_map(|op| match &op.body {
        OperationBody::BeginSponsoringFutureReserves(begin) if begin.sponsored_id == sponsored => {
            Some(op.source_account.unwrap_or(ctx.envelope().source_account))
        }
        _ => None,
    })
}
