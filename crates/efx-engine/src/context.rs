//! Read-only view of one operation and the collaborator seams it draws on.

use efx_types::contract::network_id;
use efx_types::{
    AccountId, DiagnosticEvent, Hash, LedgerEntryChange, LedgerInfo, LedgerTransaction,
    MuxedAccount, Operation, OperationResult, OperationResultTr, OperationType,
    TransactionEnvelope,
};

use crate::error::{EffectError, EffectResult};

/// Supplies the pre/post entry changes caused by each operation.
///
/// How the pairs were computed is not this crate's concern, only their
/// shape and order.
pub trait ChangeSource {
    /// Changes for the operation at `index`, or `None` if unavailable.
    fn operation_changes(&self, index: u32) -> Option<&[LedgerEntryChange]>;
}

impl ChangeSource for LedgerTransaction {
    fn operation_changes(&self, index: u32) -> Option<&[LedgerEntryChange]> {
        self.operation_changes
            .get(usize::try_from(index).ok()?)
            .map(Vec::as_slice)
    }
}

impl ChangeSource for Vec<Vec<LedgerEntryChange>> {
    fn operation_changes(&self, index: u32) -> Option<&[LedgerEntryChange]> {
        self.get(usize::try_from(index).ok()?).map(Vec::as_slice)
    }
}

/// Assigns the opaque operation identifiers effect ids are built from.
pub trait OperationIds {
    /// Identifier of operation `op_index` (0-based) in transaction
    /// `tx_index` (1-based) of ledger `ledger_sequence`.
    fn operation_id(&self, ledger_sequence: u32, tx_index: u32, op_index: u32) -> i64;
}

impl<F> OperationIds for F
where
    F: Fn(u32, u32, u32) -> i64,
{
    fn operation_id(&self, ledger_sequence: u32, tx_index: u32, op_index: u32) -> i64 {
        self(ledger_sequence, tx_index, op_index)
    }
}

/// Immutable view of one operation within its transaction and ledger.
#[derive(Clone, Copy)]
pub struct OperationContext<'a> {
    index: u32,
    operation_id: i64,
    operation: &'a Operation,
    transaction: &'a LedgerTransaction,
    changes: &'a dyn ChangeSource,
    network_passphrase: &'a str,
    ledger: LedgerInfo,
}

impl<'a> OperationContext<'a> {
    /// View of operation `index` of `transaction`, with changes read from
    /// the transaction itself.
    pub fn new(
        transaction: &'a LedgerTransaction,
        index: u32,
        operation_id: i64,
        ledger: LedgerInfo,
        network_passphrase: &'a str,
    ) -> EffectResult<Self> {
        let operation = usize::try_from(index)
            .ok()
            .and_then(|i| transaction.envelope.operations.get(i))
            .ok_or(EffectError::OperationIndexOutOfRange(index))?;
        Ok(Self {
            index,
            operation_id,
            operation,
            transaction,
            changes: transaction,
            network_passphrase,
            ledger,
        })
    }

    /// Read entry changes from another source.
    pub fn with_changes(mut self, changes: &'a dyn ChangeSource) -> Self {
        self.changes = changes;
        self
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn operation_id(&self) -> i64 {
        self.operation_id
    }

    pub fn operation(&self) -> &'a Operation {
        self.operation
    }

    pub fn operation_type(&self) -> EffectResult<OperationType> {
        self.operation
            .body
            .operation_type()
            .map_err(EffectError::UnknownOperationType)
    }

    pub fn transaction(&self) -> &'a LedgerTransaction {
        self.transaction
    }

    pub fn envelope(&self) -> &'a TransactionEnvelope {
        &self.transaction.envelope
    }

    pub fn transaction_successful(&self) -> bool {
        self.transaction.successful()
    }

    pub fn ledger(&self) -> LedgerInfo {
        self.ledger
    }

    pub fn network_passphrase(&self) -> &'a str {
        self.network_passphrase
    }

    /// Network id derived from the passphrase.
    pub fn network_id(&self) -> EffectResult<Hash> {
        if self.network_passphrase.is_empty() {
            return Err(EffectError::MissingNetworkPassphrase);
        }
        Ok(network_id(self.network_passphrase))
    }

    /// The operation's own source, falling back to the transaction's.
    pub fn source_account(&self) -> MuxedAccount {
        self.operation
            .source_account
            .unwrap_or(self.transaction.envelope.source_account)
    }

    pub fn source_account_id(&self) -> AccountId {
        self.source_account().account_id()
    }

    /// Entry changes caused by this operation.
    pub fn changes(&self) -> EffectResult<&'a [LedgerEntryChange]> {
        self.changes
            .operation_changes(self.index)
            .ok_or(EffectError::ChangesUnavailable(self.index))
    }

    /// The applied result body, if the operation was applied.
    pub fn result(&self) -> Option<&'a OperationResultTr> {
        match self.transaction.operation_result(self.index as usize)? {
            OperationResult::Tr(tr) => Some(tr),
            OperationResult::Outer(_) => None,
        }
    }

    pub fn diagnostic_events(&self) -> &'a [DiagnosticEvent] {
        &self.transaction.diagnostic_events
    }

    /// Context for another operation of the same transaction.
    pub fn sibling(&self, index: u32, operation_id: i64) -> EffectResult<Self> {
        Ok(Self::new(
            self.transaction,
            index,
            operation_id,
            self.ledger,
            self.network_passphrase,
        )?
        .with_changes(self.changes))
    }
}
