use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::strkey::{self, Version};
use crate::xdr::{ToXdr, XdrWriter};

/// An ed25519 account identifier, rendered as a `G...` address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId([u8; 32]);

impl AccountId {
    pub const fn from_bytes(key: [u8; 32]) -> Self {
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The `G...` StrKey address.
    pub fn address(&self) -> String {
        strkey::encode(Version::AccountId, &self.0)
    }

    /// Parse a `G...` address.
    pub fn from_address(s: &str) -> Result<Self, TypeError> {
        strkey::decode_32(Version::AccountId, s).map(Self)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.address())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

impl FromStr for AccountId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_address(s)
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.address())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_address(&s).map_err(serde::de::Error::custom)
    }
}

impl ToXdr for AccountId {
    fn write_xdr(&self, w: &mut XdrWriter) {
        // PublicKey union, PUBLIC_KEY_TYPE_ED25519
        w.write_i32(0);
        w.write_fixed(&self.0);
    }
}

/// An account reference that may carry a multiplexing sub-account id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum MuxedAccount {
    Ed25519(AccountId),
    MuxedEd25519 { id: u64, ed25519: AccountId },
}

impl MuxedAccount {
    /// The underlying account, with any multiplexing id stripped.
    pub fn account_id(&self) -> AccountId {
        match self {
            Self::Ed25519(account) => *account,
            Self::MuxedEd25519 { ed25519, .. } => *ed25519,
        }
    }

    /// `G...` for plain accounts, `M...` for multiplexed ones.
    pub fn address(&self) -> String {
        match self {
            Self::Ed25519(account) => account.address(),
            Self::MuxedEd25519 { id, ed25519 } => {
                let mut payload = Vec::with_capacity(40);
                payload.extend_from_slice(ed25519.as_bytes());
                payload.extend_from_slice(&id.to_be_bytes());
                strkey::encode(Version::MuxedAccount, &payload)
            }
        }
    }

    /// The `M...` address when multiplexed.
    pub fn muxed_address(&self) -> Option<String> {
        match self {
            Self::Ed25519(_) => None,
            Self::MuxedEd25519 { .. } => Some(self.address()),
        }
    }

    pub fn muxed_id(&self) -> Option<u64> {
        match self {
            Self::Ed25519(_) => None,
            Self::MuxedEd25519 { id, .. } => Some(*id),
        }
    }

    /// Parse either a `G...` or an `M...` address.
    pub fn from_address(s: &str) -> Result<Self, TypeError> {
        if s.starts_with('M') {
            let payload = strkey::decode(Version::MuxedAccount, s)?;
            if payload.len() != 40 {
                return Err(TypeError::InvalidLength {
                    expected: 40,
                    actual: payload.len(),
                });
            }
            let mut key = [0u8; 32];
            key.copy_from_slice(&payload[..32]);
            let mut id = [0u8; 8];
            id.copy_from_slice(&payload[32..]);
            Ok(Self::MuxedEd25519 {
                id: u64::from_be_bytes(id),
                ed25519: AccountId(key),
            })
        } else {
            AccountId::from_address(s).map(Self::Ed25519)
        }
    }
}

impl From<AccountId> for MuxedAccount {
    fn from(account: AccountId) -> Self {
        Self::Ed25519(account)
    }
}

impl fmt::Debug for MuxedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MuxedAccount({})", self.address())
    }
}

impl fmt::Display for MuxedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

impl Serialize for MuxedAccount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.address())
    }
}

impl<'de> Deserialize<'de> for MuxedAccount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_address(&s).map_err(serde::de::Error::custom)
    }
}

/// Key of an account signer.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignerKey {
    Ed25519([u8; 32]),
    PreAuthTx([u8; 32]),
    HashX([u8; 32]),
    Ed25519SignedPayload { ed25519: [u8; 32], payload: Vec<u8> },
}

impl SignerKey {
    /// StrKey text form (`G`, `T`, `X` or `P` prefix).
    pub fn address(&self) -> String {
        match self {
            Self::Ed25519(key) => strkey::encode(Version::AccountId, key),
            Self::PreAuthTx(hash) => strkey::encode(Version::PreAuthTx, hash),
            Self::HashX(hash) => strkey::encode(Version::HashX, hash),
            Self::Ed25519SignedPayload { ed25519, payload } => {
                let mut w = XdrWriter::new();
                w.write_fixed(ed25519);
                w.write_var(payload);
                strkey::encode(Version::SignedPayload, &w.into_bytes())
            }
        }
    }

    pub fn from_address(s: &str) -> Result<Self, TypeError> {
        match s.chars().next() {
            Some('G') => strkey::decode_32(Version::AccountId, s).map(Self::Ed25519),
            Some('T') => strkey::decode_32(Version::PreAuthTx, s).map(Self::PreAuthTx),
            Some('X') => strkey::decode_32(Version::HashX, s).map(Self::HashX),
            Some('P') => {
                let raw = strkey::decode(Version::SignedPayload, s)?;
                if raw.len() < 36 {
                    return Err(TypeError::InvalidStrkey(format!("{s:?} is too short")));
                }
                let mut ed25519 = [0u8; 32];
                ed25519.copy_from_slice(&raw[..32]);
                let len = u32::from_be_bytes([raw[32], raw[33], raw[34], raw[35]]) as usize;
                let payload = raw
                    .get(36..36 + len)
                    .ok_or_else(|| TypeError::InvalidStrkey(format!("{s:?} payload truncated")))?
                    .to_vec();
                Ok(Self::Ed25519SignedPayload { ed25519, payload })
            }
            _ => Err(TypeError::InvalidStrkey(format!("{s:?} is not a signer key"))),
        }
    }
}

impl From<AccountId> for SignerKey {
    fn from(account: AccountId) -> Self {
        Self::Ed25519(account.0)
    }
}

impl fmt::Debug for SignerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignerKey({})", self.address())
    }
}

impl Serialize for SignerKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.address())
    }
}

impl<'de> Deserialize<'de> for SignerKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_address(&s).map_err(serde::de::Error::custom)
    }
}

/// A signer attached to an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub key: SignerKey,
    pub weight: u32,
}
