//! High-level effects SDK.
//!
//! Wraps the effect engine with network configuration, ledger and
//! transaction drivers that apply a failure policy, and a logging bootstrap.
//! This is the main entry point for applications turning ledgers into
//! effect records.

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use config::{EffectsConfig, Network};
pub use error::{SdkError, SdkResult};
pub use pipeline::{EffectsPipeline, LedgerBatch, LedgerEffects, TransformStats};

// Re-export key types
pub use efx_engine::{operation_details, Details, DetailValue, Effect, EffectType, OperationIds};
pub use efx_types::{LedgerInfo, LedgerTransaction};
