//! Derivation entry points: one operation, or every operation of a
//! transaction.

use efx_types::{LedgerInfo, LedgerTransaction};
use tracing::{debug, trace};

use crate::accumulator::EffectAccumulator;
use crate::context::{OperationContext, OperationIds};
use crate::effect::Effect;
use crate::error::{EffectError, EffectResult};
use crate::generators::generator_for;
use crate::sweeps;

/// Derive the ordered effects of one operation.
///
/// An operation of a failed transaction yields no effects and no error. Any
/// error aborts the operation as a whole; no partial list is returned.
pub fn derive_effects(ctx: &OperationContext<'_>) -> EffectResult<Vec<Effect>> {
    if !ctx.transaction_successful() {
        trace!(operation_id = ctx.operation_id(), "transaction failed, no effects");
        return Ok(Vec::new());
    }

    let changes = ctx.changes()?;
    for change in changes {
        change.validate().map_err(EffectError::InvalidEntryState)?;
    }

    let kind = ctx.operation_type()?;
    let mut acc = EffectAccumulator::new(ctx.operation_id());
    generator_for(kind)(ctx, &mut acc)?;

    for change in changes {
        sweeps::entry_sponsorship(ctx, change, &mut acc)?;
        sweeps::signer_sponsorship(change, &mut acc);
    }
    for change in changes {
        sweeps::pool_lifecycle(ctx, change, &mut acc)?;
    }

    debug!(
        operation_id = ctx.operation_id(),
        kind = %kind,
        effects = acc.len(),
        "derived operation effects"
    );
    Ok(acc.finalize(&ctx.ledger()))
}

/// Derive every operation of `tx` in envelope order and concatenate the
/// results. A failing operation aborts the transaction with its id attached.
pub fn transaction_effects(
    tx: &LedgerTransaction,
    ledger: LedgerInfo,
    network_passphrase: &str,
    ids: &dyn OperationIds,
) -> EffectResult<Vec<Effect>> {
    let mut effects = Vec::new();
    for index in 0..tx.envelope.operations.len() {
        let index = u32::try_from(index).map_err(|_| {
            EffectError::invalid_state(format!("operation index {index} exceeds u32"))
        })?;
        let operation_id = ids.operation_id(ledger.sequence, tx.index, index);
        let derived = OperationContext::new(tx, index, operation_id, ledger, network_passphrase)
            .and_then(|ctx| derive_effects(&ctx))
            .map_err(|source| EffectError::Operation {
                operation_id,
                source: Box::new(source),
            })?;
        effects.extend(derived);
    }
    Ok(effects)
}
