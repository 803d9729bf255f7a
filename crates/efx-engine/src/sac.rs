//! Stellar Asset Contract events: recognition and the balance movements
//! they describe.
//!
//! An event counts as an asset-contract event only when its last topic names
//! an asset whose deterministic contract id equals the emitting contract.
//! Anything else is some other contract's event and is ignored.

use std::fmt;

use efx_types::contract::ContractIdPreimage;
use efx_types::{
    amount, strkey, Asset, ContractEvent, ContractEventType, DiagnosticEvent, Hash, ScVal,
};
use tracing::debug;

use crate::context::OperationContext;
use crate::details::{add_asset, Details};
use crate::error::EffectResult;

/// Balance-moving function of the asset contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SacEventKind {
    Transfer,
    Mint,
    Clawback,
    Burn,
}

impl SacEventKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Mint => "mint",
            Self::Clawback => "clawback",
            Self::Burn => "burn",
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "transfer" => Some(Self::Transfer),
            "mint" => Some(Self::Mint),
            "clawback" => Some(Self::Clawback),
            "burn" => Some(Self::Burn),
            _ => None,
        }
    }
}

impl fmt::Display for SacEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed asset-contract event. Parties are StrKey addresses, `G...` for
/// accounts and `C...` for contracts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SacEvent {
    pub kind: SacEventKind,
    pub asset: Asset,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: i128,
}

impl SacEvent {
    /// Parse `event` as emitted by an asset contract on the network with
    /// `network_id`. Returns `None` for anything else.
    pub fn parse(event: &ContractEvent, network_id: &Hash) -> Option<Self> {
        if event.event_type != ContractEventType::Contract {
            return None;
        }
        let emitter = event.contract_id.as_ref()?;
        let topics = &event.topics;
        if !(3..=4).contains(&topics.len()) {
            return None;
        }
        let kind = SacEventKind::from_symbol(topics[0].as_symbol()?)?;
        let asset: Asset = topics[topics.len() - 1].as_string()?.parse().ok()?;
        if ContractIdPreimage::FromAsset(asset.clone()).contract_id(network_id) != *emitter {
            return None;
        }

        let party = |i: usize| topics[i].as_address().map(|a| a.to_strkey());
        // Admin-signed functions carry the admin as an extra leading party.
        let (from, to) = match (kind, topics.len()) {
            (SacEventKind::Transfer, 4) => (Some(party(1)?), Some(party(2)?)),
            (SacEventKind::Mint, 4) => (None, Some(party(2)?)),
            (SacEventKind::Mint, 3) => (None, Some(party(1)?)),
            (SacEventKind::Clawback, 4) => (Some(party(2)?), None),
            (SacEventKind::Clawback, 3) | (SacEventKind::Burn, 3) => (Some(party(1)?), None),
            _ => return None,
        };
        Some(Self {
            kind,
            asset,
            from,
            to,
            amount: event_amount(&event.data)?,
        })
    }

    /// Balance-change record: `{from?, to?, type, amount, asset...}`.
    pub fn balance_change(&self) -> Details {
        let mut details = Details::new();
        if let Some(from) = &self.from {
            details.insert("from", from.as_str());
        }
        if let Some(to) = &self.to {
            details.insert("to", to.as_str());
        }
        details.insert("type", self.kind.name());
        details.insert("amount", amount::format_i128(self.amount));
        add_asset(&mut details, &self.asset, "");
        details
    }
}

/// The amount is either the bare `i128` data or, when the recipient is
/// multiplexed, the `amount` field of a map.
fn event_amount(data: &ScVal) -> Option<i128> {
    match data {
        ScVal::I128(v) => Some(*v),
        ScVal::Map(entries) => entries
            .iter()
            .find(|e| e.key.as_symbol() == Some("amount"))
            .and_then(|e| e.val.as_i128()),
        _ => None,
    }
}

/// Whether `address` is a plain account rather than a contract.
pub fn is_account_address(address: &str) -> bool {
    strkey::is_valid_account_id(address)
}

/// Contract-emitted events from calls that succeeded.
pub fn successful_contract_events(
    events: &[DiagnosticEvent],
) -> impl Iterator<Item = &ContractEvent> {
    events
        .iter()
        .filter(|d| d.in_successful_contract_call && d.event.event_type == ContractEventType::Contract)
        .map(|d| &d.event)
}

/// Every asset-contract event the operation's transaction emitted.
pub fn asset_events(ctx: &OperationContext<'_>) -> EffectResult<Vec<SacEvent>> {
    let network_id = ctx.network_id()?;
    let events = successful_contract_events(ctx.diagnostic_events())
        .filter_map(|event| {
            let parsed = SacEvent::parse(event, &network_id);
            if parsed.is_none() {
                debug!(topics = event.topics.len(), "ignoring non asset-contract event");
            }
            parsed
        })
        .collect();
    Ok(events)
}
