use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid strkey: {0}")]
    InvalidStrkey(String),

    #[error("strkey checksum mismatch")]
    ChecksumMismatch,

    #[error("unexpected strkey version byte {actual:#04x}, expected {expected:#04x}")]
    UnexpectedVersion { expected: u8, actual: u8 },

    #[error("invalid asset string: {0}")]
    InvalidAsset(String),

    #[error("unsupported claimable balance id type {0}")]
    UnsupportedBalanceIdType(i32),

    #[error("unsupported liquidity pool type {0}")]
    UnsupportedPoolType(i32),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    #[error("price has a zero denominator")]
    ZeroDenominator,
}
