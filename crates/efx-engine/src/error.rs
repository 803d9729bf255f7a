use std::fmt;

use efx_types::{OperationType, TypeError};

/// Errors that abort effect derivation for one operation.
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    /// The operation kind is outside the known set.
    #[error("unknown operation type: {0}")]
    UnknownOperationType(i32),

    /// The host function kind is outside the known set.
    #[error("unknown host function type: {0}")]
    UnknownHostFunctionKind(i32),

    /// The operation's success result arm is absent.
    #[error("missing {0} success result for operation {1}")]
    MissingResultArm(OperationType, u32),

    /// A ledger-entry change is malformed or has an unexpected shape.
    #[error("invalid entry state: {0}")]
    InvalidEntryState(String),

    /// A liquidity pool entry is not a constant-product pool.
    #[error("unexpected liquidity pool body type {0}")]
    LiquidityPoolBodyTypeMismatch(i32),

    /// A claimable balance id could not be re-encoded.
    #[error("invalid balance id in change from operation {index}: {source}")]
    InvalidBalanceIdentifier { index: u32, source: TypeError },

    /// No liquidity pool change matched the lookup.
    #[error("liquidity pool change not found")]
    PoolChangeNotFound,

    /// Contract events cannot be interpreted without a network passphrase.
    #[error("invoke host function effects cannot be determined unless network passphrase is set")]
    MissingNetworkPassphrase,

    /// A generator needed a specific entry change that is not present.
    #[error("entry change not found: {0}")]
    EntryChangeNotFound(String),

    /// The change source has nothing for this operation index.
    #[error("no entry changes available for operation {0}")]
    ChangesUnavailable(u32),

    /// The operation index is past the end of the envelope.
    #[error("operation index {0} out of range")]
    OperationIndexOutOfRange(u32),

    /// Encoding failure in the ledger model.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Derivation failed for one operation of a transaction.
    #[error("reading operation {operation_id} effects: {source}")]
    Operation {
        operation_id: i64,
        source: Box<EffectError>,
    },
}

impl EffectError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidEntryState(message.into())
    }

    /// The innermost error, looking through [`EffectError::Operation`] wrappers.
    pub fn root(&self) -> &EffectError {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }
}

impl PartialEq for EffectError {
    fn eq(&self, other: &Self) -> bool {
        // Compare by display representation for test convenience.
        fmt::format(format_args!("{self}")) == fmt::format(format_args!("{other}"))
    }
}

impl Eq for EffectError {}

/// Convenience alias for effect derivation results.
pub type EffectResult<T> = Result<T, EffectError>;
