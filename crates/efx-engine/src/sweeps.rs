//! Passes that run over an operation's entry changes regardless of its kind.

use std::collections::{BTreeMap, BTreeSet};

use efx_types::{
    amount, AccountEntry, AccountId, ClaimableBalanceEntry, ClaimableBalanceId, Claimant,
    LedgerEntry, LedgerEntryChange, LedgerEntryData, LedgerEntryType, LiquidityPoolEntry,
    MuxedAccount, TrustLineAsset,
};

use crate::accumulator::EffectAccumulator;
use crate::context::OperationContext;
use crate::details::{self, Details};
use crate::effect_type::EffectType;
use crate::error::{EffectError, EffectResult};
use crate::pool::{pool_delta, pool_details};

// ---------------------------------------------------------------------------
// Entry sponsorship
// ---------------------------------------------------------------------------

/// Created, updated and removed sponsorship effects for an entry kind.
/// Offers are absent: they never produce creation effects either.
fn sponsorship_effects(entry_type: LedgerEntryType) -> Option<[EffectType; 3]> {
    use EffectType::*;
    match entry_type {
        LedgerEntryType::Account => Some([
            AccountSponsorshipCreated,
            AccountSponsorshipUpdated,
            AccountSponsorshipRemoved,
        ]),
        LedgerEntryType::Trustline => Some([
            TrustlineSponsorshipCreated,
            TrustlineSponsorshipUpdated,
            TrustlineSponsorshipRemoved,
        ]),
        LedgerEntryType::Data => Some([
            DataSponsorshipCreated,
            DataSponsorshipUpdated,
            DataSponsorshipRemoved,
        ]),
        LedgerEntryType::ClaimableBalance => Some([
            ClaimableBalanceSponsorshipCreated,
            ClaimableBalanceSponsorshipUpdated,
            ClaimableBalanceSponsorshipRemoved,
        ]),
        _ => None,
    }
}

/// Hex form of a balance id, attributing failures to the operation.
pub(crate) fn balance_hex(
    ctx: &OperationContext<'_>,
    id: &ClaimableBalanceId,
) -> EffectResult<String> {
    id.to_hex()
        .map_err(|source| EffectError::InvalidBalanceIdentifier {
            index: ctx.index(),
            source,
        })
}

enum Target {
    Account(AccountId),
    Muxed(MuxedAccount),
}

/// Emit the sponsorship transition of one entry, if any.
pub fn entry_sponsorship(
    ctx: &OperationContext<'_>,
    change: &LedgerEntryChange,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    let Some([created, updated, removed]) = sponsorship_effects(change.entry_type) else {
        return Ok(());
    };
    let pre = change.pre.as_ref().and_then(|e| e.sponsoring_id);
    let post = change.post.as_ref().and_then(|e| e.sponsoring_id);

    let mut details = Details::new();
    let effect_type = match (pre, post) {
        (None, Some(sponsor)) => {
            details.insert("sponsor", sponsor.address());
            created
        }
        (Some(former), None) => {
            details.insert("former_sponsor", former.address());
            removed
        }
        (Some(former), Some(new)) if former != new => {
            details.insert("new_sponsor", new.address());
            details.insert("former_sponsor", former.address());
            updated
        }
        _ => return Ok(()),
    };

    let entry = change
        .latest()
        .ok_or_else(|| EffectError::invalid_state("sponsored change has no entry"))?;
    let target = match &entry.data {
        LedgerEntryData::Account(account) => Target::Account(account.account_id),
        LedgerEntryData::Trustline(line) => {
            match &line.asset {
                TrustLineAsset::PoolShare(pool_id) => {
                    details.insert("asset_type", "liquidity_pool");
                    details.insert("liquidity_pool_id", pool_id.to_hex());
                }
                TrustLineAsset::Asset(asset) => details.insert("asset", asset.canonical()),
            }
            Target::Account(line.account_id)
        }
        LedgerEntryData::Data(data) => {
            details.insert("data_name", data.data_name.clone());
            Target::Muxed(ctx.source_account())
        }
        LedgerEntryData::ClaimableBalance(cb) => {
            details.insert("balance_id", balance_hex(ctx, &cb.balance_id)?);
            Target::Muxed(ctx.source_account())
        }
        other => {
            return Err(EffectError::invalid_state(format!(
                "invalid sponsorship ledger entry type {}",
                other.entry_type()
            )))
        }
    };

    match target {
        Target::Account(account) => acc.add(&account, effect_type, details),
        Target::Muxed(account) => acc.add_muxed(&account, effect_type, details),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Signer sponsorship
// ---------------------------------------------------------------------------

fn account_of(entry: Option<&LedgerEntry>) -> Option<&AccountEntry> {
    entry.and_then(|e| e.data.as_account())
}

/// Emit per-signer sponsorship transitions of an account change, in signer
/// key order.
pub fn signer_sponsorship(change: &LedgerEntryChange, acc: &mut EffectAccumulator) {
    if change.entry_type != LedgerEntryType::Account {
        return;
    }
    let pre_account = account_of(change.pre.as_ref());
    let post_account = account_of(change.post.as_ref());
    let pre = pre_account.map(|a| a.sponsor_per_signer()).unwrap_or_default();
    let post = post_account.map(|a| a.sponsor_per_signer()).unwrap_or_default();

    let signers: BTreeSet<&String> = pre.keys().chain(post.keys()).collect();
    for signer in signers {
        match (pre.get(signer), post.get(signer), pre_account, post_account) {
            (None, Some(sponsor), _, Some(owner)) => acc.add(
                &owner.account_id,
                EffectType::SignerSponsorshipCreated,
                Details::new()
                    .with("sponsor", sponsor.address())
                    .with("signer", signer.as_str()),
            ),
            (Some(former), None, Some(owner), _) => acc.add(
                &owner.account_id,
                EffectType::SignerSponsorshipRemoved,
                Details::new()
                    .with("former_sponsor", former.address())
                    .with("signer", signer.as_str()),
            ),
            (Some(former), Some(new), _, Some(owner)) if former != new => acc.add(
                &owner.account_id,
                EffectType::SignerSponsorshipUpdated,
                Details::new()
                    .with("former_sponsor", former.address())
                    .with("new_sponsor", new.address())
                    .with("signer", signer.as_str()),
            ),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Liquidity pools
// ---------------------------------------------------------------------------

fn pool_entry(entry: &LedgerEntry) -> EffectResult<&LiquidityPoolEntry> {
    entry
        .data
        .as_liquidity_pool()
        .ok_or_else(|| EffectError::invalid_state("liquidity pool change without pool entry"))
}

/// Pool creation and removal seen in one change.
pub fn pool_lifecycle(
    ctx: &OperationContext<'_>,
    change: &LedgerEntryChange,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    if change.entry_type != LedgerEntryType::LiquidityPool {
        return Ok(());
    }
    match (&change.pre, &change.post) {
        (None, Some(post)) => {
            let details = Details::new().with("liquidity_pool", pool_details(pool_entry(post)?)?);
            acc.add_muxed(&ctx.source_account(), EffectType::LiquidityPoolCreated, details);
        }
        (Some(pre), None) => {
            let details =
                Details::new().with("liquidity_pool_id", pool_entry(pre)?.liquidity_pool_id.to_hex());
            acc.add_muxed(&ctx.source_account(), EffectType::LiquidityPoolRemoved, details);
        }
        _ => {}
    }
    Ok(())
}

/// `ClaimableBalanceCreated` on `owner` followed by one
/// `ClaimableBalanceClaimantCreated` per claimant.
pub fn claimable_balance_created(
    ctx: &OperationContext<'_>,
    owner: &MuxedAccount,
    cb: &ClaimableBalanceEntry,
    claimants: &[Claimant],
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    let id = balance_hex(ctx, &cb.balance_id)?;
    let amount = amount::format(cb.amount);
    let asset = cb.asset.canonical();
    acc.add_muxed(
        owner,
        EffectType::ClaimableBalanceCreated,
        Details::new()
            .with("balance_id", id.clone())
            .with("amount", amount.clone())
            .with("asset", asset.clone()),
    );
    for claimant in claimants {
        acc.add(
            &claimant.destination,
            EffectType::ClaimableBalanceClaimantCreated,
            Details::new()
                .with("balance_id", id.clone())
                .with("amount", amount.clone())
                .with("predicate", details::predicate(&claimant.predicate))
                .with("asset", asset.clone()),
        );
    }
    Ok(())
}

/// Pool position force-removed by an authorization revocation.
///
/// A revocation shows up as a pool change plus claimable balances created in
/// the same operation. Without either, nothing happened and nothing is emitted.
pub fn pool_revocation(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let changes = ctx.changes()?;
    let (lp, delta) = match pool_delta(changes, None) {
        Ok(found) => found,
        Err(EffectError::PoolChangeNotFound) => return Ok(()),
        Err(err) => return Err(err),
    };

    let mut balance_ids = BTreeMap::new();
    let mut created = Vec::new();
    for change in changes {
        if change.entry_type != LedgerEntryType::ClaimableBalance || change.pre.is_some() {
            continue;
        }
        let Some(cb) = change.post.as_ref().and_then(|e| e.data.as_claimable_balance()) else {
            continue;
        };
        let id = balance_hex(ctx, &cb.balance_id)?;
        balance_ids.insert(cb.asset.canonical(), id);
        created.push(cb);
    }
    if balance_ids.is_empty() {
        return Ok(());
    }

    // Change order is not stable across core versions.
    created.sort_by(|a, b| a.asset.cmp(&b.asset));
    let source = ctx.source_account();
    for cb in created {
        claimable_balance_created(ctx, &source, cb, &cb.claimants, acc)?;
    }

    let cp = crate::pool::constant_product(lp)?;
    let mut reserves_revoked = Vec::with_capacity(2);
    for (asset, reserve_delta) in [
        (&cp.params.asset_a, delta.reserve_a),
        (&cp.params.asset_b, delta.reserve_b),
    ] {
        let asset = asset.canonical();
        if let Some(id) = balance_ids.get(&asset) {
            reserves_revoked.push(
                Details::new()
                    .with("asset", asset.clone())
                    .with("amount", amount::format(-reserve_delta))
                    .with("claimable_balance_id", id.clone()),
            );
        }
    }
    let details = Details::new()
        .with("liquidity_pool", pool_details(lp)?)
        .with("reserves_revoked", reserves_revoked)
        .with("shares_revoked", amount::format(-delta.total_pool_shares));
    acc.add_muxed(&source, EffectType::LiquidityPoolRevoked, details);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::*;
    use crate::pool::fixtures::{params, pool, usd};
    use efx_types::entry::{DataEntry, TrustLineEntry};
    use efx_types::{ClaimPredicate, Hash, OperationBody, Signer, SignerKey};

    fn ctx_for(tx: &efx_types::LedgerTransaction) -> OperationContext<'_> {
        OperationContext::new(tx, 0, 42, ledger(), TESTNET).unwrap()
    }

    #[test]
    fn account_sponsorship_created() {
        let tx = transaction(OperationBody::Inflation, None, vec![]);
        let ctx = ctx_for(&tx);
        let change = LedgerEntryChange::updated(
            account_ledger_entry(account(2), 10),
            account_ledger_entry(account(2), 10).sponsored_by(account(9)),
        );
        let mut acc = EffectAccumulator::new(42);
        entry_sponsorship(&ctx, &change, &mut acc).unwrap();
        let effects = acc.finalize(&ledger());
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].effect_type, EffectType::AccountSponsorshipCreated);
        assert_eq!(effects[0].address, account(2).address());
        assert_eq!(effects[0].details.get_str("sponsor"), Some(account(9).address().as_str()));
    }

    #[test]
    fn unchanged_sponsor_emits_nothing() {
        let tx = transaction(OperationBody::Inflation, None, vec![]);
        let ctx = ctx_for(&tx);
        let entry = account_ledger_entry(account(2), 10).sponsored_by(account(9));
        let change = LedgerEntryChange::updated(entry.clone(), entry);
        let mut acc = EffectAccumulator::new(42);
        entry_sponsorship(&ctx, &change, &mut acc).unwrap();
        assert!(acc.is_empty());
    }

    #[test]
    fn sponsor_transfer_lists_new_then_former() {
        let tx = transaction(OperationBody::Inflation, None, vec![]);
        let ctx = ctx_for(&tx);
        let line = |sponsor: u8| {
            LedgerEntry::new(LedgerEntryData::Trustline(TrustLineEntry {
                account_id: account(2),
                asset: TrustLineAsset::Asset(usd()),
                balance: 0,
                limit: 100,
                flags: 0,
            }))
            .sponsored_by(account(sponsor))
        };
        let change = LedgerEntryChange::updated(line(8), line(9));
        let mut acc = EffectAccumulator::new(42);
        entry_sponsorship(&ctx, &change, &mut acc).unwrap();
        let effects = acc.finalize(&ledger());
        assert_eq!(effects[0].effect_type, EffectType::TrustlineSponsorshipUpdated);
        let keys: Vec<_> = effects[0].details.keys().collect();
        assert_eq!(keys, vec!["new_sponsor", "former_sponsor", "asset"]);
        assert_eq!(effects[0].details.get_str("asset"), Some(usd().canonical().as_str()));
    }

    #[test]
    fn data_sponsorship_targets_operation_source() {
        let tx = transaction(OperationBody::Inflation, None, vec![]);
        let ctx = ctx_for(&tx);
        let data = LedgerEntry::new(LedgerEntryData::Data(DataEntry {
            account_id: account(2),
            data_name: "config".into(),
            data_value: vec![1],
        }))
        .sponsored_by(account(9));
        let change = LedgerEntryChange::removed(data);
        let mut acc = EffectAccumulator::new(42);
        entry_sponsorship(&ctx, &change, &mut acc).unwrap();
        let effects = acc.finalize(&ledger());
        assert_eq!(effects[0].effect_type, EffectType::DataSponsorshipRemoved);
        assert_eq!(effects[0].address, account(1).address());
        assert_eq!(effects[0].details.get_str("data_name"), Some("config"));
    }

    #[test]
    fn bad_balance_id_is_reported_with_index() {
        let tx = transaction(OperationBody::Inflation, None, vec![]);
        let ctx = ctx_for(&tx);
        let cb = LedgerEntry::new(LedgerEntryData::ClaimableBalance(ClaimableBalanceEntry {
            balance_id: ClaimableBalanceId { id_type: 7, hash: Hash::default() },
            claimants: vec![],
            asset: efx_types::Asset::Native,
            amount: 1,
            flags: 0,
        }))
        .sponsored_by(account(9));
        let mut acc = EffectAccumulator::new(42);
        let err = entry_sponsorship(&ctx, &LedgerEntryChange::created(cb), &mut acc).unwrap_err();
        assert!(matches!(err, EffectError::InvalidBalanceIdentifier { index: 0, .. }));
    }

    #[test]
    fn signer_sponsorship_in_key_order() {
        let signer = |b: u8| Signer { key: SignerKey::Ed25519([b; 32]), weight: 1 };
        let mut pre = account_entry(account(2), 10);
        pre.signers = vec![signer(5), signer(3)];
        pre.signer_sponsoring_ids = vec![Some(account(8)), Some(account(8))];
        let mut post = pre.clone();
        post.signers = vec![signer(3), signer(4)];
        post.signer_sponsoring_ids = vec![Some(account(9)), Some(account(9))];

        let change = LedgerEntryChange::updated(
            LedgerEntry::new(LedgerEntryData::Account(pre)),
            LedgerEntry::new(LedgerEntryData::Account(post)),
        );
        let mut acc = EffectAccumulator::new(1);
        signer_sponsorship(&change, &mut acc);
        assert_eq!(
            acc.types(),
            vec![
                EffectType::SignerSponsorshipUpdated,
                EffectType::SignerSponsorshipCreated,
                EffectType::SignerSponsorshipRemoved,
            ]
        );
        let effects = acc.finalize(&ledger());
        assert_eq!(
            effects[0].details.get_str("signer"),
            Some(SignerKey::Ed25519([3; 32]).address().as_str())
        );
    }

    #[test]
    fn pool_created_and_removed() {
        let tx = transaction(OperationBody::Inflation, None, vec![]);
        let ctx = ctx_for(&tx);
        let mut acc = EffectAccumulator::new(42);
        pool_lifecycle(&ctx, &LedgerEntryChange::created(pool(0, 0, 0)), &mut acc).unwrap();
        pool_lifecycle(&ctx, &LedgerEntryChange::removed(pool(0, 0, 0)), &mut acc).unwrap();
        pool_lifecycle(
            &ctx,
            &LedgerEntryChange::updated(pool(1, 1, 1), pool(2, 2, 2)),
            &mut acc,
        )
        .unwrap();
        let effects = acc.finalize(&ledger());
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0].effect_type, EffectType::LiquidityPoolCreated);
        assert_eq!(
            effects[1].details.get_str("liquidity_pool_id"),
            Some(params().pool_id().to_hex().as_str())
        );
    }

    fn created_balance(byte: u8, asset: efx_types::Asset, amount: i64) -> LedgerEntryChange {
        LedgerEntryChange::created(LedgerEntry::new(LedgerEntryData::ClaimableBalance(
            ClaimableBalanceEntry {
                balance_id: ClaimableBalanceId::v0(Hash::from_bytes([byte; 32])),
                claimants: vec![Claimant {
                    destination: account(2),
                    predicate: ClaimPredicate::Unconditional,
                }],
                asset,
                amount,
                flags: 0,
            },
        )))
    }

    #[test]
    fn revocation_sorts_balances_by_asset() {
        let changes = vec![
            LedgerEntryChange::updated(pool(100, 200, 50), pool(60, 120, 30)),
            created_balance(2, usd(), 80),
            created_balance(1, efx_types::Asset::Native, 40),
        ];
        let tx = transaction(OperationBody::Inflation, None, changes);
        let ctx = ctx_for(&tx);
        let mut acc = EffectAccumulator::new(42);
        pool_revocation(&ctx, &mut acc).unwrap();
        assert_eq!(
            acc.types(),
            vec![
                EffectType::ClaimableBalanceCreated,
                EffectType::ClaimableBalanceClaimantCreated,
                EffectType::ClaimableBalanceCreated,
                EffectType::ClaimableBalanceClaimantCreated,
                EffectType::LiquidityPoolRevoked,
            ]
        );
        let effects = acc.finalize(&ledger());
        assert_eq!(effects[0].details.get_str("asset"), Some("native"));
        let revoked = &effects[4].details;
        assert_eq!(revoked.get_str("shares_revoked"), Some("0.0000020"));
        let reserves = revoked.get("reserves_revoked").and_then(|v| v.as_list()).unwrap();
        assert_eq!(reserves.len(), 2);
        let first = reserves[0].as_map().unwrap();
        assert_eq!(first.get_str("amount"), Some("0.0000040"));
        assert_eq!(
            first.get_str("claimable_balance_id"),
            Some(format!("00000000{}", "01".repeat(32)).as_str())
        );
    }

    #[test]
    fn revocation_without_pool_change_is_a_no_op() {
        let tx = transaction(
            OperationBody::Inflation,
            None,
            vec![created_balance(1, efx_types::Asset::Native, 40)],
        );
        let mut acc = EffectAccumulator::new(42);
        pool_revocation(&ctx_for(&tx), &mut acc).unwrap();
        assert!(acc.is_empty());
    }

    #[test]
    fn revocation_without_balances_is_a_no_op() {
        let tx = transaction(
            OperationBody::Inflation,
            None,
            vec![LedgerEntryChange::updated(pool(100, 200, 50), pool(100, 200, 50))],
        );
        let mut acc = EffectAccumulator::new(42);
        pool_revocation(&ctx_for(&tx), &mut acc).unwrap();
        assert!(acc.is_empty());
    }
}
