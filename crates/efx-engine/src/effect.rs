use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::details::Details;
use crate::effect_type::EffectType;

/// A stamped effect record.
///
/// `address` is always the base `G...` account; a multiplexed source is
/// carried separately in `address_muxed`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Effect {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_muxed: Option<String>,
    pub operation_id: i64,
    pub details: Details,
    #[serde(rename = "type")]
    pub effect_type: EffectType,
    pub type_string: &'static str,
    #[serde(rename = "closed_at")]
    pub ledger_closed: DateTime<Utc>,
    pub ledger_sequence: u32,
    /// Zero-based position within the operation's effects.
    #[serde(rename = "index")]
    pub effect_index: u32,
    /// `"{operation_id}-{effect_index}"`.
    #[serde(rename = "id")]
    pub effect_id: String,
}
