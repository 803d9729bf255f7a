//! Order-book offers and the trade effects of matched claims.

use efx_types::result::ManageOfferResult;
use efx_types::{amount, ClaimAtom, MuxedAccount, OperationResultTr, OperationType};
use tracing::debug;

use super::applied_result;
use crate::accumulator::EffectAccumulator;
use crate::context::OperationContext;
use crate::details::{add_account, add_asset, asset_amount, Details};
use crate::effect_type::EffectType;
use crate::error::{EffectError, EffectResult};
use crate::pool::{pool_delta, pool_details};

/// Per-claim effect kinds, in emission order. `OfferCreated` is last so a
/// path payment can drop it.
const TRADE_EFFECTS: [EffectType; 4] = [
    EffectType::Trade,
    EffectType::OfferUpdated,
    EffectType::OfferRemoved,
    EffectType::OfferCreated,
];

/// Emit the effects of every matched claim.
///
/// `buyer` is the party that crossed the offers. Claims that moved nothing
/// are skipped.
pub fn trades(
    ctx: &OperationContext<'_>,
    buyer: &MuxedAccount,
    claims: &[ClaimAtom],
    is_path_payment: bool,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    for claim in claims {
        if claim.amount_sold() == 0 && claim.amount_bought() == 0 {
            debug!(offer_id = claim.offer_id(), "skipping empty claim");
            continue;
        }
        match claim {
            ClaimAtom::LiquidityPool(pool_claim) => {
                let (lp, _) = pool_delta(ctx.changes()?, Some(&pool_claim.liquidity_pool_id))?;
                let details = Details::new()
                    .with("liquidity_pool", pool_details(lp)?)
                    .with("sold", asset_amount(&pool_claim.asset_sold, pool_claim.amount_sold))
                    .with(
                        "bought",
                        asset_amount(&pool_claim.asset_bought, pool_claim.amount_bought),
                    );
                acc.add_muxed(&ctx.source_account(), EffectType::LiquidityPoolTrade, details);
            }
            ClaimAtom::V0(offer) | ClaimAtom::OrderBook(offer) => {
                let mut buyer_side = Details::new()
                    .with("offer_id", offer.offer_id)
                    .with("seller", offer.seller_id.address())
                    .with("bought_amount", amount::format(offer.amount_sold))
                    .with("sold_amount", amount::format(offer.amount_bought));
                add_asset(&mut buyer_side, &offer.asset_sold, "bought_");
                add_asset(&mut buyer_side, &offer.asset_bought, "sold_");

                let mut seller_side = Details::new()
                    .with("offer_id", offer.offer_id)
                    .with("bought_amount", amount::format(offer.amount_bought))
                    .with("sold_amount", amount::format(offer.amount_sold));
                add_account(&mut seller_side, buyer, "seller");
                add_asset(&mut seller_side, &offer.asset_bought, "bought_");
                add_asset(&mut seller_side, &offer.asset_sold, "sold_");

                let kinds = if is_path_payment {
                    &TRADE_EFFECTS[..3]
                } else {
                    &TRADE_EFFECTS[..]
                };
                for kind in kinds {
                    acc.add_muxed(buyer, *kind, buyer_side.clone());
                    acc.add(&offer.seller_id, *kind, seller_side.clone());
                }
            }
        }
    }
    Ok(())
}

fn claimed<'r>(
    ctx: &OperationContext<'_>,
    kind: OperationType,
    result: &'r ManageOfferResult,
) -> EffectResult<&'r [ClaimAtom]> {
    result
        .offers_claimed()
        .ok_or(EffectError::MissingResultArm(kind, ctx.index()))
}

pub fn manage_sell_offer(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let kind = OperationType::ManageSellOffer;
    let OperationResultTr::ManageSellOffer(result) = applied_result(ctx, kind)? else {
        return Err(EffectError::MissingResultArm(kind, ctx.index()));
    };
    trades(ctx, &ctx.source_account(), claimed(ctx, kind, result)?, false, acc)
}

pub fn manage_buy_offer(ctx: &OperationContext<'_>, acc: &mut EffectAccumulator) -> EffectResult<()> {
    let kind = OperationType::ManageBuyOffer;
    let OperationResultTr::ManageBuyOffer(result) = applied_result(ctx, kind)? else {
        return Err(EffectError::MissingResultArm(kind, ctx.index()));
    };
    trades(ctx, &ctx.source_account(), claimed(ctx, kind, result)?, false, acc)
}

/// Passive offers may report their result under the manage-sell-offer arm;
/// that arm is read first.
pub fn create_passive_sell_offer(
    ctx: &OperationContext<'_>,
    acc: &mut EffectAccumulator,
) -> EffectResult<()> {
    let kind = OperationType::CreatePassiveSellOffer;
    let result = match applied_result(ctx, kind)? {
        OperationResultTr::ManageSellOffer(result)
        | OperationResultTr::CreatePassiveSellOffer(result) => result,
        _ => return Err(EffectError::MissingResultArm(kind, ctx.index())),
    };
    trades(ctx, &ctx.source_account(), claimed(ctx, kind, result)?, false, acc)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use efx_types::result::ClaimOfferAtom;
    use efx_types::{Asset, ClaimAtom};

    use crate::context::fixtures::account;
    use crate::pool::fixtures::usd;

    /// Seller `3` gives 10 XLM for 5 USD on offer 77.
    pub fn offer_claim() -> ClaimAtom {
        ClaimAtom::OrderBook(ClaimOfferAtom {
            seller_id: account(3),
            offer_id: 77,
            asset_sold: Asset::Native,
            amount_sold: 100_000_000,
            asset_bought: usd(),
            amount_bought: 50_000_000,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::offer_claim;
    use super::*;
    use crate::context::fixtures::*;
    use crate::pool::fixtures::{params, pool, usd};
    use efx_types::operation::CreatePassiveSellOfferOp;
    use efx_types::result::ClaimLiquidityAtom;
    use efx_types::{Asset, LedgerEntryChange, OperationBody, OperationResult, Price};

    fn passive(result: OperationResultTr) -> efx_types::LedgerTransaction {
        transaction(
            OperationBody::CreatePassiveSellOffer(CreatePassiveSellOfferOp {
                selling: usd(),
                buying: Asset::Native,
                amount: 50_000_000,
                price: Price { n: 2, d: 1 },
            }),
            Some(OperationResult::Tr(result)),
            vec![],
        )
    }

    #[test]
    fn offer_claim_emits_eight_effects() {
        let tx = transaction(OperationBody::Inflation, None, vec![]);
        let ctx = OperationContext::new(&tx, 0, 1, ledger(), TESTNET).unwrap();
        let mut acc = EffectAccumulator::new(1);
        trades(&ctx, &ctx.source_account(), &[offer_claim()], false, &mut acc).unwrap();
        assert_eq!(
            acc.types(),
            vec![
                EffectType::Trade,
                EffectType::Trade,
                EffectType::OfferUpdated,
                EffectType::OfferUpdated,
                EffectType::OfferRemoved,
                EffectType::OfferRemoved,
                EffectType::OfferCreated,
                EffectType::OfferCreated,
            ]
        );
        let effects = acc.finalize(&ledger());
        let buyer = &effects[0];
        assert_eq!(buyer.address, account(1).address());
        assert_eq!(buyer.details.get_str("bought_amount"), Some("10.0000000"));
        assert_eq!(buyer.details.get_str("bought_asset_type"), Some("native"));
        assert_eq!(buyer.details.get_str("sold_asset_code"), Some("USD"));
        let seller = &effects[1];
        assert_eq!(seller.address, account(3).address());
        assert_eq!(seller.details.get_str("seller"), Some(account(1).address().as_str()));
        assert_eq!(seller.details.get_str("bought_amount"), Some("5.0000000"));
        assert_eq!(seller.details.get("offer_id").and_then(|v| v.as_i64()), Some(77));
    }

    #[test]
    fn path_payment_drops_offer_created() {
        let tx = transaction(OperationBody::Inflation, None, vec![]);
        let ctx = OperationContext::new(&tx, 0, 1, ledger(), TESTNET).unwrap();
        let mut acc = EffectAccumulator::new(1);
        trades(&ctx, &ctx.source_account(), &[offer_claim()], true, &mut acc).unwrap();
        assert_eq!(acc.len(), 6);
        assert!(!acc.types().contains(&EffectType::OfferCreated));
    }

    #[test]
    fn empty_claims_are_skipped() {
        let ClaimAtom::OrderBook(mut offer) = offer_claim() else { unreachable!() };
        offer.amount_sold = 0;
        offer.amount_bought = 0;
        let tx = transaction(OperationBody::Inflation, None, vec![]);
        let ctx = OperationContext::new(&tx, 0, 1, ledger(), TESTNET).unwrap();
        let mut acc = EffectAccumulator::new(1);
        trades(&ctx, &ctx.source_account(), &[ClaimAtom::OrderBook(offer)], false, &mut acc)
            .unwrap();
        assert!(acc.is_empty());
    }

    #[test]
    fn pool_claim_emits_pool_trade() {
        let claim = ClaimAtom::LiquidityPool(ClaimLiquidityAtom {
            liquidity_pool_id: params().pool_id(),
            asset_sold: usd(),
            amount_sold: 20,
            asset_bought: Asset::Native,
            amount_bought: 10,
        });
        let changes = vec![LedgerEntryChange::updated(pool(100, 200, 50), pool(110, 180, 50))];
        let tx = transaction(OperationBody::Inflation, None, changes);
        let ctx = OperationContext::new(&tx, 0, 1, ledger(), TESTNET).unwrap();
        let mut acc = EffectAccumulator::new(1);
        trades(&ctx, &ctx.source_account(), &[claim], false, &mut acc).unwrap();
        let effects = acc.finalize(&ledger());
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].effect_type, EffectType::LiquidityPoolTrade);
        let sold = effects[0].details.get("sold").and_then(|v| v.as_map()).unwrap();
        assert_eq!(sold.get_str("asset"), Some(usd().canonical().as_str()));
        assert_eq!(sold.get_str("amount"), Some("0.0000020"));
    }

    #[test]
    fn passive_offer_reads_manage_sell_arm_first() {
        let claims = vec![offer_claim()];
        let tx = passive(OperationResultTr::ManageSellOffer(ManageOfferResult::Success {
            offers_claimed: claims.clone(),
        }));
        let ctx = OperationContext::new(&tx, 0, 1, ledger(), TESTNET).unwrap();
        let mut acc = EffectAccumulator::new(1);
        create_passive_sell_offer(&ctx, &mut acc).unwrap();
        assert_eq!(acc.len(), 8);

        let tx = passive(OperationResultTr::CreatePassiveSellOffer(
            ManageOfferResult::Success { offers_claimed: claims },
        ));
        let ctx = OperationContext::new(&tx, 0, 1, ledger(), TESTNET).unwrap();
        let mut acc = EffectAccumulator::new(1);
        create_passive_sell_offer(&ctx, &mut acc).unwrap();
        assert_eq!(acc.len(), 8);
    }

    #[test]
    fn failed_offer_result_is_missing_arm() {
        let tx = passive(OperationResultTr::ManageSellOffer(ManageOfferResult::Failure(-5)));
        let ctx = OperationContext::new(&tx, 0, 1, ledger(), TESTNET).unwrap();
        let mut acc = EffectAccumulator::new(1);
        assert_eq!(
            create_passive_sell_offer(&ctx, &mut acc).unwrap_err(),
            EffectError::MissingResultArm(OperationType::CreatePassiveSellOffer, 0)
        );
    }
}
