//! In-memory ledger store
//!
//! Same contract as [`RocksStore`](crate::RocksStore), backed by a `BTreeMap`
//! so range scans come out in key order. Used by tests and by nodes that do
//! not need durability.

use crate::types::{validate_key, HistoryIter, LedgerStore, Revision, Write};
use crate::{Result, TxnId};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

#[derive(Debug, Default)]
struct Inner {
    state: BTreeMap<String, Vec<u8>>,
    history: HashMap<String, Vec<Revision>>,
}

impl Inner {
    fn apply(&mut self, txn_id: &TxnId, key: &str, value: Option<&[u8]>) {
        match value {
            Some(bytes) => {
                self.state.insert(key.to_string(), bytes.to_vec());
            }
            None => {
                self.state.remove(key);
            }
        }

        self.history
            .entry(key.to_string())
            .or_default()
            .push(Revision {
                txn_id: txn_id.clone(),
                timestamp: Utc::now(),
                value: value.map(<[u8]>::to_vec),
            });
    }
}

/// In-memory ledger store
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.inner.read().state.len()
    }

    /// Whether no live keys exist
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LedgerStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.read().state.get(key).cloned())
    }

    fn put(&self, txn_id: &TxnId, key: &str, value: &[u8]) -> Result<()> {
        validate_key(key)?;
        self.inner.write().apply(txn_id, key, Some(value));
        tracing::debug!(key, txn_id = %txn_id, "Revision written");
        Ok(())
    }

    fn delete(&self, txn_id: &TxnId, key: &str) -> Result<()> {
        validate_key(key)?;
        self.inner.write().apply(txn_id, key, None);
        tracing::debug!(key, txn_id = %txn_id, "Tombstone written");
        Ok(())
    }

    /// Copies the revisions out under the read lock; later writes are not seen
    fn history<'a>(&'a self, key: &str) -> Result<HistoryIter<'a>> {
        let revisions = self
            .inner
            .read()
            .history
            .get(key)
            .cloned()
            .unwrap_or_default();

        Ok(Box::new(revisions.into_iter().map(Ok)))
    }

    fn scan_range(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>> {
        if start >= end {
            return Ok(Vec::new());
        }

        let inner = self.inner.read();
        Ok(inner
            .state
            .range::<str, _>((Bound::Included(start), Bound::Excluded(end)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn supports_atomic_batch(&self) -> bool {
        true
    }

    fn commit_batch(&self, txn_id: &TxnId, writes: &[Write]) -> Result<()> {
        for write in writes {
            validate_key(&write.key)?;
        }

        let mut inner = self.inner.write();
        for write in writes {
            inner.apply(txn_id, &write.key, write.value.as_deref());
        }

        tracing::debug!(txn_id = %txn_id, writes = writes.len(), "Batch committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn txn(id: &str) -> TxnId {
        TxnId::from(id)
    }

    #[test]
    fn test_put_and_get() {
        let store = MemoryStore::new();
        assert!(store.get("1001").unwrap().is_none());

        store.put(&txn("t1"), "1001", b"one").unwrap();
        assert_eq!(store.get("1001").unwrap().as_deref(), Some(&b"one"[..]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_history_order_and_tombstones() {
        let store = MemoryStore::new();
        store.put(&txn("t1"), "1001", b"v1").unwrap();
        store.put(&txn("t2"), "1001", b"v2").unwrap();
        store.delete(&txn("t3"), "1001").unwrap();

        let revisions: Vec<Revision> = store
            .history("1001")
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        let ids: Vec<&str> = revisions.iter().map(|r| r.txn_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
        assert_eq!(revisions[1].value.as_deref(), Some(&b"v2"[..]));
        assert!(revisions[2].is_delete());
        assert!(store.get("1001").unwrap().is_none());
    }

    #[test]
    fn test_history_of_unknown_key_is_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.history("nope").unwrap().count(), 0);
    }

    #[test]
    fn test_history_is_a_snapshot() {
        let store = MemoryStore::new();
        store.put(&txn("tx-1"), "1001", b"v1").unwrap();

        let history = store.history("1001").unwrap();
        store.put(&txn("tx-2"), "1001", b"v2").unwrap();

        let seen: Vec<_> = history.map(|rev| rev.unwrap().txn_id.to_string()).collect();
        assert_eq!(seen, vec!["tx-1"]);
        assert_eq!(store.history("1001").unwrap().count(), 2);
    }

    #[test]
    fn test_scan_range_is_half_open() {
        let store = MemoryStore::new();
        for key in ["1000", "1001", "5000", "9999999", "C1"] {
            store.put(&txn("t"), key, key.as_bytes()).unwrap();
        }
        store.delete(&txn("t"), "5000").unwrap();

        let keys: Vec<String> = store
            .scan_range("1001", "9999999")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["1001"]);
        assert!(store.scan_range("9", "1").unwrap().is_empty());
    }

    #[test]
    fn test_commit_batch_rejects_before_writing() {
        let store = MemoryStore::new();
        let writes = vec![Write::put("a", b"1".to_vec()), Write::put("", b"2".to_vec())];

        let err = store.commit_batch(&txn("t"), &writes).unwrap_err();
        assert!(matches!(err, Error::InvalidKey(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_commit_batch_shares_txn_id() {
        let store = MemoryStore::new();
        let writes = vec![
            Write::put("a", b"1".to_vec()),
            Write::put("b", b"2".to_vec()),
            Write::delete("a"),
        ];
        store.commit_batch(&txn("batch"), &writes).unwrap();

        assert!(store.get("a").unwrap().is_none());
        assert_eq!(store.history("a").unwrap().count(), 2);
        let rev = store.history("b").unwrap().next().unwrap().unwrap();
        assert_eq!(rev.txn_id.as_str(), "batch");
    }
}
