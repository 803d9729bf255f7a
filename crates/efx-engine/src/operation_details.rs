//! Per-operation detail sets, the exporter's view of what an operation asked
//! for and, where the ledger recorded it, what it did.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use efx_types::entry::{account_flags, trustline_flags};
use efx_types::operation::RevokeSponsorshipOp;
use efx_types::result::PathPaymentResult;
use efx_types::{
    amount, Asset, ChangeTrustAsset, ClaimableBalanceId, LedgerKey, OperationBody,
    OperationResultTr, OperationType, PoolId, Price, TrustLineAsset,
};

use crate::context::OperationContext;
use crate::details::{add_account, add_asset, claimants, DetailValue, Details};
use crate::error::{EffectError, EffectResult};
use crate::host_function::{footprint_details, host_function_details};
use crate::pool::{constant_product, pool_delta, PoolDelta};
use crate::sponsor::{initiating_begin_sponsor, operation_sponsor};
use crate::sweeps::balance_hex;

const ACCOUNT_FLAG_NAMES: [(u32, &str); 4] = [
    (account_flags::AUTH_REQUIRED, "auth_required"),
    (account_flags::AUTH_REVOCABLE, "auth_revocable"),
    (account_flags::AUTH_IMMUTABLE, "auth_immutable"),
    (account_flags::AUTH_CLAWBACK_ENABLED, "auth_clawback_enabled"),
];

const TRUSTLINE_FLAG_NAMES: [(u32, &str); 3] = [
    (trustline_flags::AUTHORIZED, "authorized"),
    (
        trustline_flags::AUTHORIZED_TO_MAINTAIN_LIABILITIES,
        "authorized_to_maintain_liabilities",
    ),
    (trustline_flags::TRUSTLINE_CLAWBACK_ENABLED, "clawback_enabled"),
];

// ---------------------------------------------------------------------------
// Field builders
// ---------------------------------------------------------------------------

/// `{prefix}_flags` as bit values and `{prefix}_flags_s` as names.
fn add_flags(details: &mut Details, names: &[(u32, &str)], flags: u32, prefix: &str) {
    let set: Vec<_> = names.iter().filter(|(bit, _)| flags & bit != 0).collect();
    details.insert(
        format!("{prefix}_flags"),
        set.iter().map(|(bit, _)| *bit).collect::<Vec<_>>(),
    );
    details.insert(
        format!("{prefix}_flags_s"),
        set.iter().map(|(_, name)| *name).collect::<Vec<_>>(),
    );
}

/// `{prefix}price` as a decimal string and `{prefix}price_r` as `{n, d}`.
fn add_price(details: &mut Details, price: Price, prefix: &str) -> EffectResult<()> {
    details.insert(format!("{prefix}price"), price.to_decimal_string()?);
    details.insert(
        format!("{prefix}price_r"),
        Details::new().with("n", price.n).with("d", price.d),
    );
    Ok(())
}

fn path(assets: &[Asset]) -> DetailValue {
    if assets.is_empty() {
        return DetailValue::Null;
    }
    assets
        .iter()
        .map(|asset| {
            let mut hop = Details::new();
            add_asset(&mut hop, asset, "");
            hop
        })
        .collect::<Vec<_>>()
        .into()
}

fn add_pool_id(details: &mut Details, id: &PoolId) {
    details.insert("liquidity_pool_id", id.to_hex());
    details.insert("liquidity_pool_id_strkey", id.to_strkey());
}

fn add_balance_id(
    ctx: &OperationContext<'_>,
    details: &mut Details,
    id: &ClaimableBalanceId,
) -> EffectResult<()> {
    details.insert("balance_id", balance_hex(ctx, id)?);
    let strkey = id
        .to_strkey()
        .map_err(|source| EffectError::InvalidBalanceIdentifier { index: ctx.index(), source })?;
    details.insert("balance_id_strkey", strkey);
    Ok(())
}

fn add_ledger_key(
    ctx: &OperationContext<'_>,
    details: &mut Details,
    key: &LedgerKey,
) -> EffectResult<()> {
    match key {
        LedgerKey::Account { account_id } => details.insert("account_id", account_id.address()),
        LedgerKey::ClaimableBalance { balance_id } => {
            details.insert("claimable_balance_id", balance_hex(ctx, balance_id)?)
        }
        LedgerKey::Data { account_id, data_name } => {
            details.insert("data_account_id", account_id.address());
            details.insert("data_name", data_name.as_str());
        }
        LedgerKey::Offer { offer_id, .. } => details.insert("offer_id", *offer_id),
        LedgerKey::Trustline { account_id, asset } => {
            details.insert("trustline_account_id", account_id.address());
            match asset {
                TrustLineAsset::Asset(asset) => {
                    details.insert("trustline_asset", asset.canonical())
                }
                TrustLineAsset::PoolShare(id) => {
                    details.insert("trustline_liquidity_pool_id", id.to_hex())
                }
            }
        }
        LedgerKey::LiquidityPool { liquidity_pool_id } => {
            details.insert("liquidity_pool_id", liquidity_pool_id.to_hex())
        }
        _ => {}
    }
    Ok(())
}

/// Path payment result, only consulted when the transaction succeeded.
fn applied_path_result<'a>(
    ctx: &OperationContext<'a>,
    kind: OperationType,
) -> EffectResult<Option<&'a PathPaymentResult>> {
    if !ctx.transaction_successful() {
        return Ok(None);
    }
    match (kind, ctx.result()) {
        (OperationType::PathPaymentStrictReceive, Some(OperationResultTr::PathPaymentStrictReceive(r)))
        | (OperationType::PathPaymentStrictSend, Some(OperationResultTr::PathPaymentStrictSend(r))) => {
            Ok(Some(r))
        }
        _ => Err(EffectError::MissingResultArm(kind, ctx.index())),
    }
}

/// Pool assets and delta for deposit/withdraw details. A failed transaction
/// left no pool change, so it reports native placeholders and zeros.
fn pool_movement(
    ctx: &OperationContext<'_>,
    pool_id: &PoolId,
) -> EffectResult<(Asset, Asset, PoolDelta)> {
    if !ctx.transaction_successful() {
        return Ok((Asset::Native, Asset::Native, PoolDelta::default()));
    }
    let (lp, delta) = pool_delta(ctx.changes()?, Some(pool_id))?;
    let params = &constant_product(lp)?.params;
    Ok((params.asset_a.clone(), params.asset_b.clone(), delta))
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

/// Detail set of the operation, ending with its `sponsor` when one exists.
pub fn operation_details(ctx: &OperationContext<'_>) -> EffectResult<Details> {
    let mut details = Details::new();
    let d = &mut details;
    let source = ctx.source_account();

    match &ctx.operation().body {
        OperationBody::CreateAccount(op) => {
            add_account(d, &source, "funder");
            d.insert("account", op.destination.address());
            d.insert("starting_balance", amount::format(op.starting_balance));
        }
        OperationBody::Payment(op) => {
            add_account(d, &source, "from");
            add_account(d, &op.destination, "to");
            d.insert("amount", amount::format(op.amount));
            add_asset(d, &op.asset, "");
        }
        OperationBody::PathPaymentStrictReceive(op) => {
            add_account(d, &source, "from");
            add_account(d, &op.destination, "to");
            d.insert("amount", amount::format(op.dest_amount));
            d.insert("source_amount", amount::format(0));
            d.insert("source_max", amount::format(op.send_max));
            add_asset(d, &op.dest_asset, "");
            add_asset(d, &op.send_asset, "source_");
            if let Some(result) = applied_path_result(ctx, OperationType::PathPaymentStrictReceive)? {
                let sent = result.send_amount().ok_or(EffectError::MissingResultArm(
                    OperationType::PathPaymentStrictReceive,
                    ctx.index(),
                ))?;
                d.insert("source_amount", amount::format(sent));
            }
            d.insert("path", path(&op.path));
        }
        OperationBody::PathPaymentStrictSend(op) => {
            add_account(d, &source, "from");
            add_account(d, &op.destination, "to");
            d.insert("amount", amount::format(0));
            d.insert("source_amount", amount::format(op.send_amount));
            d.insert("destination_min", amount::format(op.dest_min));
            add_asset(d, &op.dest_asset, "");
            add_asset(d, &op.send_asset, "source_");
            if let Some(result) = applied_path_result(ctx, OperationType::PathPaymentStrictSend)? {
                let received = result.dest_amount().ok_or(EffectError::MissingResultArm(
                    OperationType::PathPaymentStrictSend,
                    ctx.index(),
                ))?;
                d.insert("amount", amount::format(received));
            }
            d.insert("path", path(&op.path));
        }
        OperationBody::ManageBuyOffer(op) => {
            d.insert("offer_id", op.offer_id);
            d.insert("amount", amount::format(op.buy_amount));
            add_price(d, op.price, "")?;
            add_asset(d, &op.buying, "buying_");
            add_asset(d, &op.selling, "selling_");
        }
        OperationBody::ManageSellOffer(op) => {
            d.insert("offer_id", op.offer_id);
            d.insert("amount", amount::format(op.amount));
            add_price(d, op.price, "")?;
            add_asset(d, &op.buying, "buying_");
            add_asset(d, &op.selling, "selling_");
        }
        OperationBody::CreatePassiveSellOffer(op) => {
            d.insert("amount", amount::format(op.amount));
            add_price(d, op.price, "")?;
            add_asset(d, &op.buying, "buying_");
            add_asset(d, &op.selling, "selling_");
        }
        OperationBody::SetOptions(op) => {
            if let Some(dest) = &op.inflation_dest {
                d.insert("inflation_dest", dest.address());
            }
            if let Some(flags) = op.set_flags.filter(|f| *f > 0) {
                add_flags(d, &ACCOUNT_FLAG_NAMES, flags, "set");
            }
            if let Some(flags) = op.clear_flags.filter(|f| *f > 0) {
                add_flags(d, &ACCOUNT_FLAG_NAMES, flags, "clear");
            }
            for (key, value) in [
                ("master_key_weight", op.master_weight),
                ("low_threshold", op.low_threshold),
                ("med_threshold", op.med_threshold),
                ("high_threshold", op.high_threshold),
            ] {
                if let Some(value) = value {
                    d.insert(key, value);
                }
            }
            if let Some(domain) = &op.home_domain {
                d.insert("home_domain", domain.as_str());
            }
            if let Some(signer) = &op.signer {
                d.insert("signer_key", signer.key.address());
                d.insert("signer_weight", signer.weight);
            }
        }
        OperationBody::ChangeTrust(op) => {
            match &op.line {
                ChangeTrustAsset::PoolShare(params) => {
                    d.insert("asset_type", "liquidity_pool_shares");
                    d.insert("liquidity_pool_id", params.pool_id().to_hex());
                }
                ChangeTrustAsset::Asset(asset) => {
                    add_asset(d, asset, "");
                    if let Some(issuer) = asset.issuer() {
                        d.insert("trustee", issuer.address());
                    }
                }
            }
            add_account(d, &source, "trustor");
            d.insert("limit", amount::format(op.limit));
        }
        OperationBody::AllowTrust(op) => {
            add_asset(d, &Asset::credit(&op.asset_code, source.account_id())?, "");
            add_account(d, &source, "trustee");
            d.insert("trustor", op.trustor.address());
            d.insert("authorize", op.authorize & trustline_flags::AUTHORIZED != 0);
            if op.authorize & trustline_flags::AUTHORIZED_TO_MAINTAIN_LIABILITIES != 0 {
                d.insert("authorize_to_maintain_liabilities", true);
            }
            if op.authorize & trustline_flags::TRUSTLINE_CLAWBACK_ENABLED != 0 {
                d.insert("clawback_enabled", true);
            }
        }
        OperationBody::AccountMerge { destination } => {
            add_account(d, &source, "account");
            add_account(d, destination, "into");
        }
        OperationBody::Inflation => {}
        OperationBody::ManageData(op) => {
            d.insert("name", op.data_name.as_str());
            d.insert("value", op.data_value.as_ref().map(|v| STANDARD.encode(v)));
        }
        OperationBody::BumpSequence(op) => d.insert("bump_to", op.bump_to.to_string()),
        OperationBody::CreateClaimableBalance(op) => {
            d.insert("asset", op.asset.canonical());
            d.insert("amount", amount::format(op.amount));
            d.insert("claimants", claimants(&op.claimants));
        }
        OperationBody::ClaimClaimableBalance(op) => {
            add_balance_id(ctx, d, &op.balance_id)?;
            add_account(d, &source, "claimant");
        }
        OperationBody::BeginSponsoringFutureReserves(op) => {
            d.insert("sponsored_id", op.sponsored_id.address());
        }
        OperationBody::EndSponsoringFutureReserves => {
            if let Some(begin_sponsor) = initiating_begin_sponsor(ctx) {
                add_account(d, &begin_sponsor, "begin_sponsor");
            }
        }
        OperationBody::RevokeSponsorship(op) => match op {
            RevokeSponsorshipOp::LedgerEntry(key) => {
                add_ledger_key(ctx, d, key)?
            }
            RevokeSponsorshipOp::Signer { account_id, signer_key } => {
                d.insert("signer_account_id", account_id.address());
                d.insert("signer_key", signer_key.address());
            }
        },
        OperationBody::Clawback(op) => {
            add_asset(d, &op.asset, "");
            add_account(d, &op.from, "from");
            d.insert("amount", amount::format(op.amount));
        }
        OperationBody::ClawbackClaimableBalance(op) => add_balance_id(ctx, d, &op.balance_id)?,
        OperationBody::SetTrustLineFlags(op) => {
            d.insert("trustor", op.trustor.address());
            add_asset(d, &op.asset, "");
            if op.set_flags > 0 {
                add_flags(d, &TRUSTLINE_FLAG_NAMES, op.set_flags, "set");
            }
            if op.clear_flags > 0 {
                add_flags(d, &TRUSTLINE_FLAG_NAMES, op.clear_flags, "clear");
            }
        }
        OperationBody::LiquidityPoolDeposit(op) => {
            add_pool_id(d, &op.liquidity_pool_id);
            let (asset_a, asset_b, delta) = pool_movement(ctx, &op.liquidity_pool_id)?;
            add_asset(d, &asset_a, "reserve_a_");
            d.insert("reserve_a_max_amount", amount::format(op.max_amount_a));
            d.insert("reserve_a_deposit_amount", amount::format(delta.reserve_a));
            add_asset(d, &asset_b, "reserve_b_");
            d.insert("reserve_b_max_amount", amount::format(op.max_amount_b));
            d.insert("reserve_b_deposit_amount", amount::format(delta.reserve_b));
            add_price(d, op.min_price, "min_")?;
            add_price(d, op.max_price, "max_")?;
            d.insert("shares_received", amount::format(delta.total_pool_shares));
        }
        OperationBody::LiquidityPoolWithdraw(op) => {
            add_pool_id(d, &op.liquidity_pool_id);
            let (asset_a, asset_b, delta) = pool_movement(ctx, &op.liquidity_pool_id)?;
            add_asset(d, &asset_a, "reserve_a_");
            d.insert("reserve_a_min_amount", amount::format(op.min_amount_a));
            d.insert("reserve_a_withdraw_amount", amount::format(-delta.reserve_a));
            add_asset(d, &asset_b, "reserve_b_");
            d.insert("reserve_b_min_amount", amount::format(op.min_amount_b));
            d.insert("reserve_b_withdraw_amount", amount::format(-delta.reserve_b));
            d.insert("shares", amount::format(op.amount));
        }
        OperationBody::InvokeHostFunction(op) => {
            host_function_details(ctx, &op.host_function, d)?;
        }
        OperationBody::ExtendFootprintTtl(op) => {
            d.insert("type", "extend_footprint_ttl");
            d.insert("extend_to", op.extend_to);
            footprint_details(ctx.envelope(), d);
        }
        OperationBody::RestoreFootprint => {
            d.insert("type", "restore_footprint");
            footprint_details(ctx.envelope(), d);
        }
        OperationBody::Unrecognized(kind) => return Err(EffectError::UnknownOperationType(*kind)),
    }

    if let Some(sponsor) = operation_sponsor(ctx)? {
        details.insert("sponsor", sponsor.address());
    }
    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::*;
    use crate::pool::fixtures::{params, pool, usd};
    use efx_types::operation::{
        AllowTrustOp, CreateAccountOp, LiquidityPoolDepositOp, ManageSellOfferOp,
        PathPaymentStrictReceiveOp, SetOptionsOp, SetTrustLineFlagsOp,
    };
    use efx_types::result::SimplePaymentResult;
    use efx_types::{LedgerEntryChange, LedgerTransaction, MuxedAccount, OperationResult};

    fn details_of(tx: &LedgerTransaction) -> Details {
        let ctx = OperationContext::new(tx, 0, 1, ledger(), TESTNET).unwrap();
        operation_details(&ctx).unwrap()
    }

    #[test]
    fn create_account_with_sponsor() {
        let op = CreateAccountOp { destination: account(2), starting_balance: 1_000_000_000 };
        let changes = vec![LedgerEntryChange::created(
            account_ledger_entry(account(2), 1_000_000_000).sponsored_by(account(9)),
        )];
        let tx = transaction(OperationBody::CreateAccount(op), None, changes);
        let d = details_of(&tx);
        assert_eq!(
            d.keys().collect::<Vec<_>>(),
            vec!["funder", "account", "starting_balance", "sponsor"]
        );
        assert_eq!(d.get_str("starting_balance"), Some("100.0000000"));
        assert_eq!(d.get_str("sponsor"), Some(account(9).address().as_str()));
    }

    #[test]
    fn path_payment_reads_the_sent_amount() {
        let op = PathPaymentStrictReceiveOp {
            send_asset: Asset::Native,
            send_max: 90,
            destination: MuxedAccount::MuxedEd25519 { id: 3, ed25519: account(2) },
            dest_asset: usd(),
            dest_amount: 50,
            path: vec![],
        };
        let result = PathPaymentResult::Success {
            offers: vec![],
            last: SimplePaymentResult { destination: account(2), asset: usd(), amount: 50 },
        };
        let mut tx = transaction(
            OperationBody::PathPaymentStrictReceive(op),
            Some(OperationResult::Tr(OperationResultTr::PathPaymentStrictReceive(result))),
            vec![],
        );
        let d = details_of(&tx);
        assert_eq!(d.get_str("source_amount"), Some("0.0000050"));
        assert_eq!(d.get_str("source_asset_type"), Some("native"));
        assert_eq!(d.get("to_muxed_id").and_then(|v| v.as_i64()), Some(3));
        assert_eq!(d.get("path"), Some(&DetailValue::Null));

        tx.result.successful = false;
        assert_eq!(details_of(&tx).get_str("source_amount"), Some("0.0000000"));
    }

    #[test]
    fn offer_price_and_assets() {
        let op = ManageSellOfferOp {
            selling: usd(),
            buying: Asset::Native,
            amount: 10_000_000,
            price: Price { n: 1, d: 4 },
            offer_id: 0,
        };
        let d = details_of(&transaction(OperationBody::ManageSellOffer(op), None, vec![]));
        assert_eq!(d.get_str("price"), Some("0.2500000"));
        let ratio = d.get("price_r").and_then(|v| v.as_map()).unwrap();
        assert_eq!(ratio.get("d").and_then(|v| v.as_i64()), Some(4));
        assert_eq!(d.get_str("selling_asset_code"), Some("USD"));
        assert_eq!(d.get_str("buying_asset_type"), Some("native"));
    }

    #[test]
    fn set_options_flag_lists() {
        let op = SetOptionsOp {
            set_flags: Some(account_flags::AUTH_REQUIRED | account_flags::AUTH_REVOCABLE),
            clear_flags: Some(0),
            low_threshold: Some(2),
            ..SetOptionsOp::default()
        };
        let d = details_of(&transaction(OperationBody::SetOptions(op), None, vec![]));
        let names = d.get("set_flags_s").and_then(|v| v.as_list()).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[1].as_str(), Some("auth_revocable"));
        assert!(!d.contains_key("clear_flags"));
        assert_eq!(d.get("low_threshold").and_then(|v| v.as_i64()), Some(2));
    }

    #[test]
    fn allow_trust_and_trustline_flags() {
        let op = AllowTrustOp { trustor: account(2), asset_code: "USD".into(), authorize: 2 };
        let d = details_of(&transaction(OperationBody::AllowTrust(op), None, vec![]));
        assert_eq!(d.get("authorize").and_then(|v| v.as_bool()), Some(false));
        assert_eq!(
            d.get("authorize_to_maintain_liabilities").and_then(|v| v.as_bool()),
            Some(true)
        );
        assert_eq!(d.get_str("trustee"), Some(account(1).address().as_str()));

        let op = SetTrustLineFlagsOp {
            trustor: account(2),
            asset: usd(),
            clear_flags: trustline_flags::AUTHORIZED,
            set_flags: 0,
        };
        let d = details_of(&transaction(OperationBody::SetTrustLineFlags(op), None, vec![]));
        assert!(!d.contains_key("set_flags"));
        let cleared = d.get("clear_flags_s").and_then(|v| v.as_list()).unwrap();
        assert_eq!(cleared[0].as_str(), Some("authorized"));
    }

    #[test]
    fn deposit_reads_the_pool_delta() {
        let op = LiquidityPoolDepositOp {
            liquidity_pool_id: params().pool_id(),
            max_amount_a: 100,
            max_amount_b: 100,
            min_price: Price { n: 1, d: 1 },
            max_price: Price { n: 2, d: 1 },
        };
        let changes = vec![LedgerEntryChange::updated(pool(10, 10, 10), pool(40, 50, 30))];
        let mut tx = transaction(OperationBody::LiquidityPoolDeposit(op), None, changes);
        let d = details_of(&tx);
        assert_eq!(d.get_str("reserve_b_asset_code"), Some("USD"));
        assert_eq!(d.get_str("reserve_b_deposit_amount"), Some("0.0000040"));
        assert_eq!(d.get_str("shares_received"), Some("0.0000020"));
        assert_eq!(d.get_str("min_price"), Some("1.0000000"));

        tx.result.successful = false;
        let d = details_of(&tx);
        assert_eq!(d.get_str("reserve_a_deposit_amount"), Some("0.0000000"));
        assert_eq!(d.get_str("reserve_b_asset_type"), Some("native"));
    }

    #[test]
    fn unrecognized_operation() {
        let tx = transaction(OperationBody::Unrecognized(99), None, vec![]);
        let ctx = OperationContext::new(&tx, 0, 1, ledger(), TESTNET).unwrap();
        assert_eq!(
            operation_details(&ctx).unwrap_err(),
            EffectError::UnknownOperationType(99)
        );
    }
}
