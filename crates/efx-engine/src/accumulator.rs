//! Append-only effect builder and the finalizer that stamps its output.

use efx_types::{AccountId, LedgerInfo, MuxedAccount};

use crate::details::Details;
use crate::effect::Effect;
use crate::effect_type::EffectType;

#[derive(Clone, Debug)]
struct PendingEffect {
    address: String,
    address_muxed: Option<String>,
    effect_type: EffectType,
    details: Details,
}

/// Collects the effects of one operation in emission order.
#[derive(Clone, Debug)]
pub struct EffectAccumulator {
    operation_id: i64,
    pending: Vec<PendingEffect>,
}

impl EffectAccumulator {
    pub fn new(operation_id: i64) -> Self {
        Self {
            operation_id,
            pending: Vec::new(),
        }
    }

    /// Record an effect on a plain address.
    pub fn add_address(&mut self, address: String, effect_type: EffectType, details: Details) {
        self.pending.push(PendingEffect {
            address,
            address_muxed: None,
            effect_type,
            details,
        });
    }

    /// Record an effect on an unmultiplexed account.
    pub fn add(&mut self, account: &AccountId, effect_type: EffectType, details: Details) {
        self.add_address(account.address(), effect_type, details);
    }

    /// Record an effect on a possibly multiplexed account. The base account
    /// becomes the address and the `M...` form, if any, the annotation.
    pub fn add_muxed(&mut self, account: &MuxedAccount, effect_type: EffectType, details: Details) {
        self.pending.push(PendingEffect {
            address: account.account_id().address(),
            address_muxed: account.muxed_address(),
            effect_type,
            details,
        });
    }

    pub fn operation_id(&self) -> i64 {
        self.operation_id
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Effect kinds recorded so far, in order.
    pub fn types(&self) -> Vec<EffectType> {
        self.pending.iter().map(|p| p.effect_type).collect()
    }

    /// Stamp every effect with the ledger, its index and its composite id.
    pub fn finalize(self, ledger: &LedgerInfo) -> Vec<Effect> {
        let operation_id = self.operation_id;
        self.pending
            .into_iter()
            .zip(0u32..)
            .map(|(p, index)| Effect {
                address: p.address,
                address_muxed: p.address_muxed,
                operation_id,
                details: p.details,
                effect_type: p.effect_type,
                type_string: p.effect_type.name(),
                ledger_closed: ledger.closed_at,
                ledger_sequence: ledger.sequence,
                effect_index: index,
                effect_id: format!("{operation_id}-{index}"),
            })
            .collect()
    }
}
