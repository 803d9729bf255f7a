use thiserror::Error;

use efx_engine::EffectError;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid ledger close time: {0}")]
    InvalidCloseTime(i64),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("effect error: {0}")]
    Effect(#[from] EffectError),

    #[error("ledger {ledger} transaction {index}: {source}")]
    Transaction {
        ledger: u32,
        index: u32,
        source: EffectError,
    },
}

pub type SdkResult<T> = Result<T, SdkError>;
