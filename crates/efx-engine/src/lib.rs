//! Effect engine: derives the ordered semantic effects of ledger operations
//! from the operations themselves, their results, and the pre/post entry
//! changes they caused.
//!
//! Derivation is a pure function of its inputs. Each operation is handled by
//! exactly one generator chosen by kind, followed by the cross-cutting
//! sweeps (entry and signer sponsorship, liquidity pool lifecycle). The
//! accumulated effects are then stamped with ids, indices and ledger facts.
//!
//! # Key Types
//!
//! - [`OperationContext`]: read-only view of one operation
//! - [`ChangeSource`] / [`OperationIds`]: collaborator seams
//! - [`EffectAccumulator`]: ordered effect buffer and finalizer
//! - [`Effect`] / [`EffectType`]: stamped records and their closed type set
//! - [`Details`] / [`DetailValue`]: insertion-ordered detail maps

pub mod accumulator;
pub mod context;
pub mod details;
pub mod dispatch;
pub mod effect;
pub mod effect_type;
pub mod error;
pub mod generators;
pub mod host_function;
pub mod operation_details;
pub mod pool;
pub mod sac;
pub mod sponsor;
pub mod sweeps;

pub use accumulator::EffectAccumulator;
pub use context::{ChangeSource, OperationContext, OperationIds};
pub use details::{DetailValue, Details};
pub use dispatch::{derive_effects, transaction_effects};
pub use effect::Effect;
pub use effect_type::EffectType;
pub use error::{EffectError, EffectResult};
pub use operation_details::operation_details;
