//! Core types and the ledger contract
//!
//! Every backend implements [`LedgerStore`]. Callers only ever see the trait,
//! so the same domain code runs against RocksDB in production and the
//! in-memory store in tests.

use crate::{Error, Result, TxnId};
use chrono::{DateTime, Utc};

/// One committed revision of a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// Transaction that produced this revision
    pub txn_id: TxnId,

    /// Commit time
    pub timestamp: DateTime<Utc>,

    /// Value written, `None` for a delete (tombstone)
    pub value: Option<Vec<u8>>,
}

impl Revision {
    /// Whether this revision deleted the key
    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }
}

/// A single staged write for [`LedgerStore::commit_batch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    /// Target key
    pub key: String,

    /// New value, `None` deletes the key
    pub value: Option<Vec<u8>>,
}

impl Write {
    /// Stage a put
    pub fn put(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
        }
    }

    /// Stage a delete
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }
}

/// Oldest-first iterator over the revisions of one key
///
/// [`RocksStore`](crate::RocksStore) streams from a live cursor, released when
/// the iterator drops. [`MemoryStore`](crate::MemoryStore) iterates a snapshot
/// taken when `history` is called.
pub type HistoryIter<'a> = Box<dyn Iterator<Item = Result<Revision>> + 'a>;

/// Versioned key-value ledger
pub trait LedgerStore: Send + Sync {
    /// Latest value of `key`, `None` if absent or deleted
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a new revision of `key`
    fn put(&self, txn_id: &TxnId, key: &str, value: &[u8]) -> Result<()>;

    /// Record a tombstone revision for `key`
    fn delete(&self, txn_id: &TxnId, key: &str) -> Result<()>;

    /// Full revision history of `key`, oldest first
    fn history<'a>(&'a self, key: &str) -> Result<HistoryIter<'a>>;

    /// Live keys in `[start, end)`, in key order
    fn scan_range(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>>;

    /// Whether [`commit_batch`](Self::commit_batch) is all-or-nothing
    fn supports_atomic_batch(&self) -> bool {
        false
    }

    /// Apply several writes under one transaction id
    ///
    /// The default applies them one by one; a failure part way leaves the
    /// earlier writes committed.
    fn commit_batch(&self, txn_id: &TxnId, writes: &[Write]) -> Result<()> {
        for write in writes {
            match &write.value {
                Some(value) => self.put(txn_id, &write.key, value)?,
                None => self.delete(txn_id, &write.key)?,
            }
        }
        Ok(())
    }
}

/// Reject keys the history encoding cannot represent
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains('\0') {
        return Err(Error::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("1001").is_ok());
        assert!(matches!(validate_key(""), Err(Error::InvalidKey(_))));
        assert!(matches!(validate_key("a\0b"), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_revision_is_delete() {
        let rev = Revision {
            txn_id: TxnId::from("tx-1"),
            timestamp: Utc::now(),
            value: None,
        };
        assert!(rev.is_delete());
    }
}
