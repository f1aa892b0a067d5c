//! Per-invocation ledger context

use crate::{
    codec::{self, Entity},
    Result,
};
use ledger_store::{LedgerStore, TxnId, Write};

/// Ledger handle plus the transaction id every write of one invocation carries
pub struct TxContext<'a> {
    store: &'a dyn LedgerStore,
    txn_id: TxnId,
}

impl std::fmt::Debug for TxContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxContext")
            .field("txn_id", &self.txn_id)
            .finish()
    }
}

impl<'a> TxContext<'a> {
    /// Create new context
    pub fn new(store: &'a dyn LedgerStore, txn_id: TxnId) -> Self {
        Self { store, txn_id }
    }

    /// Transaction id of this invocation
    pub fn txn_id(&self) -> &TxnId {
        &self.txn_id
    }

    /// Underlying ledger
    pub fn store(&self) -> &'a dyn LedgerStore {
        self.store
    }

    /// Read and decode the record under `key`
    pub fn read<T: Entity>(&self, key: &str) -> Result<Option<T>> {
        let record = match self.store.get(key)? {
            Some(bytes) => Some(codec::decode(key, &bytes)?),
            None => None,
        };

        tracing::debug!(key, kind = %T::KIND, found = record.is_some(), "Ledger read");
        Ok(record)
    }

    /// Read the record under `key`, or its zero value when absent
    pub fn read_or_default<T: Entity>(&self, key: &str) -> Result<T> {
        Ok(self.read(key)?.unwrap_or_default())
    }

    /// Encode and write `entity` under `key`
    pub fn put<T: Entity>(&self, key: &str, entity: &T) -> Result<()> {
        let bytes = codec::encode(entity)?;
        self.store.put(&self.txn_id, key, &bytes)?;

        tracing::debug!(key, kind = %T::KIND, txn_id = %self.txn_id, "Ledger write");
        Ok(())
    }

    /// Commit staged writes as one batch
    pub fn commit(&self, writes: &[Write]) -> Result<()> {
        self.store.commit_batch(&self.txn_id, writes)?;

        tracing::debug!(txn_id = %self.txn_id, writes = writes.len(), "Ledger batch write");
        Ok(())
    }
}
