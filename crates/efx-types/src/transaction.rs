use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::account::MuxedAccount;
use crate::contract::{DiagnosticEvent, SorobanTransactionData};
use crate::entry::LedgerEntryChange;
use crate::error::TypeError;
use crate::operation::Operation;
use crate::result::{OperationResult, TransactionResult};

/// The signed body of a transaction, reduced to what effect derivation reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub source_account: MuxedAccount,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub soroban_data: Option<SorobanTransactionData>,
}

/// A transaction as applied in a ledger, with its result and the per-operation
/// entry changes already computed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// 1-based position of the transaction within its ledger.
    pub index: u32,
    pub envelope: TransactionEnvelope,
    pub result: TransactionResult,
    /// Entry changes for each operation, by operation index.
    #[serde(default)]
    pub operation_changes: Vec<Vec<LedgerEntryChange>>,
    #[serde(default)]
    pub diagnostic_events: Vec<DiagnosticEvent>,
}

impl LedgerTransaction {
    pub fn successful(&self) -> bool {
        self.result.successful
    }

    pub fn operation_result(&self, index: usize) -> Option<&OperationResult> {
        self.result.operation_results.get(index)
    }
}

/// Ledger-level facts stamped onto every effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerInfo {
    pub sequence: u32,
    pub closed_at: DateTime<Utc>,
}

impl LedgerInfo {
    /// Build from a unix close time in seconds.
    pub fn from_unix(sequence: u32, close_time: i64) -> Result<Self, TypeError> {
        if close_time < 0 {
            return Err(TypeError::InvalidTimestamp(close_time));
        }
        let closed_at = Utc
            .timestamp_opt(close_time, 0)
            .single()
            .ok_or(TypeError::InvalidTimestamp(close_time))?;
        Ok(Self { sequence, closed_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_info_from_unix() {
        let info = LedgerInfo::from_unix(10, 1_600_000_000).unwrap();
        assert_eq!(info.closed_at.to_rfc3339(), "2020-09-13T12:26:40+00:00");
        assert_eq!(info.sequence, 10);
    }

    #[test]
    fn negative_close_time_rejected() {
        assert_eq!(
            LedgerInfo::from_unix(1, -5).unwrap_err(),
            TypeError::InvalidTimestamp(-5)
        );
    }
}
