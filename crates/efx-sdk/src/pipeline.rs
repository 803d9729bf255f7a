//! Ledger and transaction drivers over the effect engine.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use efx_engine::{transaction_effects, Effect, OperationIds};
use efx_types::{LedgerInfo, LedgerTransaction};

use crate::config::EffectsConfig;
use crate::error::{SdkError, SdkResult};

/// The transactions of one closed ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBatch {
    pub sequence: u32,
    /// Unix seconds.
    pub close_time: i64,
    pub transactions: Vec<LedgerTransaction>,
}

impl LedgerBatch {
    pub fn ledger_info(&self) -> SdkResult<LedgerInfo> {
        LedgerInfo::from_unix(self.sequence, self.close_time)
            .map_err(|_| SdkError::InvalidCloseTime(self.close_time))
    }
}

/// Counters for one ledger transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub attempted_transactions: usize,
    pub failed_transactions: usize,
    pub effects: usize,
}

/// Effects of one ledger plus its counters.
#[derive(Clone, Debug)]
pub struct LedgerEffects {
    pub effects: Vec<Effect>,
    pub stats: TransformStats,
}

/// Turns ledgers into effect records for one network.
pub struct EffectsPipeline<I> {
    config: EffectsConfig,
    ids: I,
}

impl<I: OperationIds> EffectsPipeline<I> {
    pub fn new(config: EffectsConfig, ids: I) -> Self {
        Self { config, ids }
    }

    pub fn config(&self) -> &EffectsConfig {
        &self.config
    }

    /// Effects of every operation in `tx`.
    pub fn transform_transaction(
        &self,
        tx: &LedgerTransaction,
        ledger: LedgerInfo,
    ) -> SdkResult<Vec<Effect>> {
        transaction_effects(tx, ledger, self.config.network_passphrase(), &self.ids).map_err(
            |source| SdkError::Transaction {
                ledger: ledger.sequence,
                index: tx.index,
                source,
            },
        )
    }

    /// Effects of every transaction in `batch`, in ledger order.
    ///
    /// A failing transaction aborts the ledger in strict mode; otherwise it
    /// is logged, counted and skipped.
    pub fn transform_ledger(&self, batch: &LedgerBatch) -> SdkResult<LedgerEffects> {
        let ledger = batch.ledger_info()?;
        let mut stats = TransformStats::default();
        let mut effects = Vec::new();

        for tx in &batch.transactions {
            stats.attempted_transactions += 1;
            match self.transform_transaction(tx, ledger) {
                Ok(derived) => effects.extend(derived),
                Err(err) if self.config.strict => return Err(err),
                Err(err) => {
                    stats.failed_transactions += 1;
                    warn!(
                        ledger = batch.sequence,
                        transaction = tx.index,
                        error = %err,
                        "skipping transaction"
                    );
                }
            }
        }
        stats.effects = effects.len();

        info!(
            ledger = batch.sequence,
            network = %self.config.network,
            attempted = stats.attempted_transactions,
            failed = stats.failed_transactions,
            effects = stats.effects,
            "transformed ledger"
        );
        Ok(LedgerEffects { effects, stats })
    }
}
