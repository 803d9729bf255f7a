use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::account::AccountId;
use crate::error::TypeError;
use crate::hash::{Hash, PoolId};
use crate::xdr::{ToXdr, XdrWriter};

/// Constant-product pool fee in basis points used by the protocol.
pub const LIQUIDITY_POOL_FEE_V18: i32 = 30;

/// A classic ledger asset.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Asset {
    Native,
    CreditAlphanum4 { code: String, issuer: AccountId },
    CreditAlphanum12 { code: String, issuer: AccountId },
}

impl Asset {
    /// Build a credit asset, choosing the 4- or 12-character form from the
    /// code length.
    pub fn credit(code: &str, issuer: AccountId) -> Result<Self, TypeError> {
        if code.is_empty() || code.len() > 12 || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(TypeError::InvalidAsset(code.to_string()));
        }
        let code = code.to_string();
        Ok(if code.len() <= 4 {
            Self::CreditAlphanum4 { code, issuer }
        } else {
            Self::CreditAlphanum12 { code, issuer }
        })
    }

    /// `native`, `credit_alphanum4` or `credit_alphanum12`.
    pub fn asset_type(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::CreditAlphanum4 { .. } => "credit_alphanum4",
            Self::CreditAlphanum12 { .. } => "credit_alphanum12",
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Native => None,
            Self::CreditAlphanum4 { code, .. } | Self::CreditAlphanum12 { code, .. } => Some(code),
        }
    }

    pub fn issuer(&self) -> Option<&AccountId> {
        match self {
            Self::Native => None,
            Self::CreditAlphanum4 { issuer, .. } | Self::CreditAlphanum12 { issuer, .. } => {
                Some(issuer)
            }
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    /// `native` or `CODE:ISSUER`.
    pub fn canonical(&self) -> String {
        match self {
            Self::Native => "native".to_string(),
            Self::CreditAlphanum4 { code, issuer } | Self::CreditAlphanum12 { code, issuer } => {
                format!("{code}:{}", issuer.address())
            }
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Self::Native => 0,
            Self::CreditAlphanum4 { .. } => 1,
            Self::CreditAlphanum12 { .. } => 2,
        }
    }
}

/// Ordering is by asset type, then code, then issuer address. This is the
/// canonical asset order used for pool parameters and for sorting effects.
impl Ord for Asset {
    fn cmp(&self, other: &Self) -> Ordering {
        self.type_rank()
            .cmp(&other.type_rank())
            .then_with(|| self.code().cmp(&other.code()))
            .then_with(|| {
                let a = self.issuer().map(AccountId::address);
                let b = other.issuer().map(AccountId::address);
                a.cmp(&b)
            })
    }
}

impl PartialOrd for Asset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({})", self.canonical())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for Asset {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "native" {
            return Ok(Self::Native);
        }
        let (code, issuer) = s
            .split_once(':')
            .ok_or_else(|| TypeError::InvalidAsset(s.to_string()))?;
        Self::credit(code, AccountId::from_address(issuer)?)
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl ToXdr for Asset {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::Native => w.write_i32(0),
            Self::CreditAlphanum4 { code, issuer } => {
                w.write_i32(1);
                w.write_fixed(&padded_code::<4>(code));
                issuer.write_xdr(w);
            }
            Self::CreditAlphanum12 { code, issuer } => {
                w.write_i32(2);
                w.write_fixed(&padded_code::<12>(code));
                issuer.write_xdr(w);
            }
        }
    }
}

fn padded_code<const N: usize>(code: &str) -> [u8; N] {
    let mut out = [0u8; N];
    for (slot, byte) in out.iter_mut().zip(code.bytes()) {
        *slot = byte;
    }
    out
}

/// Parameters of a constant-product liquidity pool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LiquidityPoolParameters {
    pub asset_a: Asset,
    pub asset_b: Asset,
    pub fee: i32,
}

impl LiquidityPoolParameters {
    /// The pool id: SHA-256 of the XDR-encoded parameters.
    pub fn pool_id(&self) -> PoolId {
        PoolId::from_bytes(*Hash::sha256(&self.to_xdr()).as_bytes())
    }
}

impl ToXdr for LiquidityPoolParameters {
    fn write_xdr(&self, w: &mut XdrWriter) {
        // LIQUIDITY_POOL_CONSTANT_PRODUCT
        w.write_i32(0);
        self.asset_a.write_xdr(w);
        self.asset_b.write_xdr(w);
        w.write_i32(self.fee);
    }
}

/// The asset held by a trustline: a classic asset or a pool share.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLineAsset {
    Asset(Asset),
    PoolShare(PoolId),
}

impl ToXdr for TrustLineAsset {
    fn write_xdr(&self, w: &mut XdrWriter) {
        match self {
            Self::Asset(asset) => asset.write_xdr(w),
            Self::PoolShare(id) => {
                // ASSET_TYPE_POOL_SHARE
                w.write_i32(3);
                id.write_xdr(w);
            }
        }
    }
}

/// The line requested by a change-trust operation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTrustAsset {
    Asset(Asset),
    PoolShare(LiquidityPoolParameters),
}

impl ChangeTrustAsset {
    /// The trustline asset this line resolves to.
    pub fn to_trust_line_asset(&self) -> TrustLineAsset {
        match self {
            Self::Asset(asset) => TrustLineAsset::Asset(asset.clone()),
            Self::PoolShare(params) => TrustLineAsset::PoolShare(params.pool_id()),
        }
    }
}

/// A price expressed as the rational `n / d`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    pub n: i32,
    pub d: i32,
}

impl Price {
    /// Seven-digit decimal rendering of `n / d`.
    pub fn to_decimal_string(&self) -> Result<String, TypeError> {
        crate::amount::format_ratio(self.n as i64, self.d as i64)
    }
}
