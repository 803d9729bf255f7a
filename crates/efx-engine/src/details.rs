//! Ordered, typed detail sets attached to effects and operations.
//!
//! A [`Details`] value is a list of key/value pairs kept in insertion order, so
//! serialized output is stable byte-for-byte across runs. Inserting an existing
//! key replaces its value in place.

use chrono::DateTime;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use efx_types::{amount, Asset, ClaimPredicate, Claimant, MuxedAccount};

/// One detail value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetailValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
    List(Vec<DetailValue>),
    Map(Details),
}

impl DetailValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DetailValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Details> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for DetailValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for DetailValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for DetailValue {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<u32> for DetailValue {
    fn from(n: u32) -> Self {
        Self::Int(n.into())
    }
}

impl From<i64> for DetailValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u64> for DetailValue {
    fn from(n: u64) -> Self {
        Self::UInt(n)
    }
}

impl From<Details> for DetailValue {
    fn from(map: Details) -> Self {
        Self::Map(map)
    }
}

impl<T: Into<DetailValue>> From<Vec<T>> for DetailValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<DetailValue>> From<Option<T>> for DetailValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl Serialize for DetailValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::UInt(n) => serializer.serialize_u64(*n),
            Self::Str(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => map.serialize(serializer),
        }
    }
}

/// Insertion-ordered string-keyed detail set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Details(Vec<(String, DetailValue)>);

impl Details {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value at its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<DetailValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Builder form of [`Details::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DetailValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&DetailValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(DetailValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DetailValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Details {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Shared detail builders
// ---------------------------------------------------------------------------

/// `{prefix}asset_type`, plus code and issuer for credit assets.
pub fn add_asset(details: &mut Details, asset: &Asset, prefix: &str) {
    details.insert(format!("{prefix}asset_type"), asset.asset_type());
    if let (Some(code), Some(issuer)) = (asset.code(), asset.issuer()) {
        details.insert(format!("{prefix}asset_code"), code);
        details.insert(format!("{prefix}asset_issuer"), issuer.address());
    }
}

/// `{field}` with the base account, plus `{field}_muxed` and
/// `{field}_muxed_id` when the account is multiplexed.
pub fn add_account(details: &mut Details, account: &MuxedAccount, field: &str) {
    details.insert(field, account.account_id().address());
    if let (Some(muxed), Some(id)) = (account.muxed_address(), account.muxed_id()) {
        details.insert(format!("{field}_muxed"), muxed);
        details.insert(format!("{field}_muxed_id"), id);
    }
}

/// `{asset, amount}` pair used in pool reserves and trade legs.
pub fn asset_amount(asset: &Asset, raw: i64) -> DetailValue {
    Details::new()
        .with("asset", asset.canonical())
        .with("amount", amount::format(raw))
        .into()
}

/// Render a claim predicate as nested detail maps.
pub fn predicate(predicate: &ClaimPredicate) -> DetailValue {
    let rendered = match predicate {
        ClaimPredicate::Unconditional => Details::new().with("unconditional", true),
        ClaimPredicate::And(inner) => {
            Details::new().with("and", inner.iter().map(self::predicate).collect::<Vec<_>>())
        }
        ClaimPredicate::Or(inner) => {
            Details::new().with("or", inner.iter().map(self::predicate).collect::<Vec<_>>())
        }
        ClaimPredicate::Not(inner) => Details::new().with(
            "not",
            inner.as_deref().map_or(DetailValue::Null, self::predicate),
        ),
        ClaimPredicate::BeforeAbsoluteTime(epoch) => {
            let mut d = Details::new();
            // Timestamps beyond the calendar range keep only the epoch form.
            if let Some(at) = DateTime::from_timestamp(*epoch, 0) {
                d.insert("abs_before", at.format("%Y-%m-%dT%H:%M:%SZ").to_string());
            }
            d.insert("abs_before_epoch", epoch.to_string());
            d
        }
        ClaimPredicate::BeforeRelativeTime(secs) => {
            Details::new().with("rel_before", secs.to_string())
        }
    };
    rendered.into()
}

/// `[{destination, predicate}]` for each claimant.
pub fn claimants(claimants: &[Claimant]) -> DetailValue {
    claimants
        .iter()
        .map(|c| {
            Details::new()
                .with("destination", c.destination.address())
                .with("predicate", predicate(&c.predicate))
        })
        .collect::<Vec<_>>()
        .into()
}
