//! Trustline lifecycle and authorization.

use efx_types::entry::trustline_flags;
use efx_types::{amount, AccountId, Asset, ChangeTrustAsset, LedgerEntryType, OperationBody};

use super::account::insert_flags;
use super::body_mismatch;
use crate::accumulator::EffectAccumulator;
use crate::context::OperationContext;
use crate::details::{add_asset, Details};
use crate::effect_type::EffectType;
use crate::error::EffectResult;
use crate::sweeps;

/// Trustline flag detail keys, by bit.
pub(crate) const TRUSTLINE_FLAG_KEYS: [(u32, &str); 3] = [
    (trustline_flags::AUTHORIZED, "authorized_flag"),
    (
        trustline_flags::AUTHORIZED_TO_MAINTAIN_LIABILITIES,
        "authorized_to_maintain_liabilites",
    ),
    (trustline_flags::TRUSTLINE_CLAWBACK_ENABLED, "clawback_enabled_flag"),
];

/// One effect for the trustline the operation asked for. A self-trust
/// succeeds without touching any entry and yields nothing.
pub fn change_trust(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let OperationBody::ChangeTrust(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let wanted = op.line.to_trust_line_asset();

    for change in ctx.changes()? {
        if change.entry_type != LedgerEntryType::Trustline {
            continue;
        }
        let (effect_type, entry) = match (&change.pre, &change.post) {
            (None, Some(post)) => (EffectType::TrustlineCreated, post),
            (Some(pre), None) => (EffectType::TrustlineRemoved, pre),
            (Some(_), Some(post)) => (EffectType::TrustlineUpdated, post),
            (None, None) => continue,
        };
        let Some(trust_line) = entry.data.as_trustline() else {
            continue;
        };
        if trust_line.asset != wanted {
            continue;
        }

        let mut details = Details::new().with("limit", amount::format(op.limit));
        match &op.line {
            ChangeTrustAsset::PoolShare(params) => {
                details.insert("asset_type", "liquidity_pool_shares");
                details.insert("liquidity_pool_id", params.pool_id().to_hex());
            }
            ChangeTrustAsset::Asset(asset) => add_asset(&mut details, asset, ""),
        }
        acc.add_muxed(&ctx.source_account(), effect_type, details);
        break;
    }
    Ok(())
}

fn flags_updated(
    ctx: &OperationContext<'_>,
    trustor: &AccountId,
    asset: &Asset,
    set: u32,
    cleared: u32,
    acc: &mut EffectAccumulator,
) {
    let mut details = Details::new().with("trustor", trustor.address());
    add_asset(&mut details, asset, "");
    insert_flags(&mut details, &TRUSTLINE_FLAG_KEYS, set, true);
    insert_flags(&mut details, &TRUSTLINE_FLAG_KEYS, cleared, false);
    acc.add_muxed(&ctx.source_account(), EffectType::TrustlineFlagsUpdated, details);
}

/// The legacy authorize value maps to one set bit, or to clearing both
/// authorization bits.
pub fn allow_trust(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let OperationBody::AllowTrust(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    let asset = Asset::credit(&op.asset_code, ctx.source_account_id())?;
    let both = trustline_flags::AUTHORIZED | trustline_flags::AUTHORIZED_TO_MAINTAIN_LIABILITIES;
    let (set, cleared) = if op.authorize & trustline_flags::AUTHORIZED != 0 {
        (trustline_flags::AUTHORIZED, 0)
    } else if op.authorize & trustline_flags::AUTHORIZED_TO_MAINTAIN_LIABILITIES != 0 {
        (trustline_flags::AUTHORIZED_TO_MAINTAIN_LIABILITIES, 0)
    } else {
        (0, both)
    };
    flags_updated(ctx, &op.trustor, &asset, set, cleared, acc);
    sweeps::pool_revocation(ctx, acc)
}

pub fn set_trust_line_flags(
    ctx: &OperationContext<'_>,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    let OperationBody::SetTrustLineFlags(op) = &ctx.operation().body else {
        return Err(body_mismatch(ctx));
    };
    flags_updated(ctx, &op.trustor, &op.asset, op.set_flags, op.clear_flags, acc);
    sweeps::pool_revocation(ctx, acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::*;
    use crate::effect::Effect;
    use crate::generators::Generator;
    use crate::pool::fixtures::{params, usd};
    use efx_types::operation::{AllowTrustOp, ChangeTrustOp, SetTrustLineFlagsOp};
    use efx_types::{
        LedgerEntry, LedgerEntryChange, LedgerEntryData, LedgerTransaction, TrustLineAsset,
        TrustLineEntry,
    };

    fn trust_line(asset: TrustLineAsset, limit: i64) -> LedgerEntry {
        LedgerEntry::new(LedgerEntryData::Trustline(TrustLineEntry {
            account_id: account(1),
            asset,
            balance: 0,
            limit,
            flags: 0,
        }))
    }

    fn run(tx: &LedgerTransaction, generator: Generator) -> Vec<Effect> {
        let ctx = OperationContext::new(tx, 0, 1, ledger(), TESTNET).unwrap();
        let mut acc = EffectAccumulator::new(1);
        generator(&ctx, &mut acc).unwrap();
        acc.finalize(&ledger())
    }

    #[test]
    fn change_trust_picks_the_requested_line() {
        let other = Asset::credit("EUR", account(5)).unwrap();
        let changes = vec![
            LedgerEntryChange::created(trust_line(TrustLineAsset::Asset(other), 10)),
            LedgerEntryChange::updated(
                trust_line(TrustLineAsset::Asset(usd()), 10),
                trust_line(TrustLineAsset::Asset(usd()), 20),
            ),
        ];
        let op = ChangeTrustOp { line: ChangeTrustAsset::Asset(usd()), limit: 20_000_000 };
        let tx = transaction(OperationBody::ChangeTrust(op), None, changes);
        let effects = run(&tx, change_trust);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].effect_type, EffectType::TrustlineUpdated);
        assert_eq!(effects[0].details.get_str("limit"), Some("2.0000000"));
        assert_eq!(effects[0].details.get_str("asset_code"), Some("USD"));
    }

    #[test]
    fn change_trust_on_pool_shares() {
        let id = params().pool_id();
        let changes = vec![LedgerEntryChange::removed(trust_line(TrustLineAsset::PoolShare(id), 5))];
        let op = ChangeTrustOp { line: ChangeTrustAsset::PoolShare(params()), limit: 0 };
        let tx = transaction(OperationBody::ChangeTrust(op), None, changes);
        let effects = run(&tx, change_trust);
        assert_eq!(effects[0].effect_type, EffectType::TrustlineRemoved);
        assert_eq!(effects[0].details.get_str("asset_type"), Some("liquidity_pool_shares"));
        assert_eq!(
            effects[0].details.get_str("liquidity_pool_id"),
            Some(id.to_hex().as_str())
        );
    }

    #[test]
    fn self_trust_has_no_effects() {
        let op = ChangeTrustOp { line: ChangeTrustAsset::Asset(usd()), limit: 1 };
        let tx = transaction(OperationBody::ChangeTrust(op), None, vec![]);
        assert!(run(&tx, change_trust).is_empty());
    }

    #[test]
    fn allow_trust_authorize_and_revoke() {
        let op = AllowTrustOp { trustor: account(2), asset_code: "USD".into(), authorize: 1 };
        let tx = transaction(OperationBody::AllowTrust(op), None, vec![]);
        let effects = run(&tx, allow_trust);
        assert_eq!(effects.len(), 1);
        let details = &effects[0].details;
        assert_eq!(details.get_str("trustor"), Some(account(2).address().as_str()));
        assert_eq!(details.get_str("asset_issuer"), Some(account(1).address().as_str()));
        assert_eq!(details.get("authorized_flag").and_then(|v| v.as_bool()), Some(true));
        assert!(!details.contains_key("authorized_to_maintain_liabilites"));

        let op = AllowTrustOp { trustor: account(2), asset_code: "USD".into(), authorize: 0 };
        let tx = transaction(OperationBody::AllowTrust(op), None, vec![]);
        let details = &run(&tx, allow_trust)[0].details;
        assert_eq!(details.get("authorized_flag").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(
            details.get("authorized_to_maintain_liabilites").and_then(|v| v.as_bool()),
            Some(false)
        );
    }

    #[test]
    fn set_trust_line_flags_lists_set_then_cleared() {
        let op = SetTrustLineFlagsOp {
            trustor: account(2),
            asset: usd(),
            clear_flags: trustline_flags::TRUSTLINE_CLAWBACK_ENABLED,
            set_flags: trustline_flags::AUTHORIZED,
        };
        let tx = transaction(OperationBody::SetTrustLineFlags(op), None, vec![]);
        let effects = run(&tx, set_trust_line_flags);
        assert_eq!(effects.len(), 1);
        let keys: Vec<_> = effects[0].details.keys().collect();
        assert_eq!(
            keys,
            vec![
                "trustor",
                "asset_type",
                "asset_code",
                "asset_issuer",
                "authorized_flag",
                "clawback_enabled_flag"
            ]
        );
    }
}
