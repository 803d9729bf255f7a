//! Per-operation-kind effect generators.
//!
//! Every generator has the [`Generator`] signature: it reads one operation
//! through its [`OperationContext`] and appends effects to the accumulator.
//! [`generator_for`] is the dispatch table; the match over [`OperationType`]
//! is exhaustive so a new kind cannot be added without a handler.

pub mod account;
pub mod claimable;
pub mod contract;
pub mod dex;
pub mod liquidity_pool;
pub mod payment;
pub mod trust;

use efx_types::{OperationResultTr, OperationType};

use crate::accumulator::EffectAccumulator;
use crate::context::OperationContext;
use crate::error::{EffectError, EffectResult};

/// Effect generator for one operation kind.
pub type Generator = fn(&OperationContext<'_>, &mut EffectAccumulator) -> EffectResult<()>;

/// The generator registered for `kind`.
pub fn generator_for(kind: OperationType) -> Generator {
    use OperationType::*;
    match kind {
        CreateAccount => account::create_account,
        Payment => payment::payment,
        PathPaymentStrictReceive => payment::path_payment_strict_receive,
        PathPaymentStrictSend => payment::path_payment_strict_send,
        ManageSellOffer => dex::manage_sell_offer,
        ManageBuyOffer => dex::manage_buy_offer,
        CreatePassiveSellOffer => dex::create_passive_sell_offer,
        SetOptions => account::set_options,
        ChangeTrust => trust::change_trust,
        AllowTrust => trust::allow_trust,
        AccountMerge => account::account_merge,
        Inflation => account::inflation,
        ManageData => account::manage_data,
        BumpSequence => account::bump_sequence,
        CreateClaimableBalance => claimable::create_claimable_balance,
        ClaimClaimableBalance => claimable::claim_claimable_balance,
        // Sponsorship sandwiches surface through the entry sweeps only.
        BeginSponsoringFutureReserves | EndSponsoringFutureReserves | RevokeSponsorship => {
            no_effects
        }
        Clawback => payment::clawback,
        ClawbackClaimableBalance => claimable::clawback_claimable_balance,
        SetTrustLineFlags => trust::set_trust_line_flags,
        LiquidityPoolDeposit => liquidity_pool::deposit,
        LiquidityPoolWithdraw => liquidity_pool::withdraw,
        InvokeHostFunction => contract::invoke_host_function,
        ExtendFootprintTtl => contract::extend_footprint_ttl,
        RestoreFootprint => contract::restore_footprint,
    }
}

fn no_effects(_: &OperationContext<'_>, _: &mut EffectAccumulator) -> EffectResult<()> {
    Ok(())
}

/// Error for an operation body that does not carry the payload of its kind.
pub(crate) fn body_mismatch(ctx: &OperationContext<'_>) -> EffectError {
    EffectError::invalid_state(format!(
        "operation {} body does not match its kind",
        ctx.index()
    ))
}

/// The applied result, or [`EffectError::MissingResultArm`].
pub(crate) fn applied_result<'a>(
    ctx: &OperationContext<'a>,
    kind: OperationType,
) -> EffectResult<&'a OperationResultTr> {
    ctx.result()
        .ok_or(EffectError::MissingResultArm(kind, ctx.index()))
}
