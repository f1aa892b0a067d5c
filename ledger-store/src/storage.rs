//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `state` - Latest value per key (key: ledger key)
//! - `history` - Append-only revision log (key: ledger key || 0x00 || seq BE)
//! - `meta` - Last allocated revision sequence per key (key: ledger key)

use crate::{
    error::{Error, Result},
    types::{validate_key, HistoryIter, LedgerStore, Revision, Write},
    Config, TxnId,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Column family names
const CF_STATE: &str = "state";
const CF_HISTORY: &str = "history";
const CF_META: &str = "meta";

/// Separates the ledger key from the sequence number in history keys
const HISTORY_SEPARATOR: u8 = 0x00;

/// On-disk form of a [`Revision`]
#[derive(Debug, Serialize, Deserialize)]
struct RevisionRecord {
    txn_id: TxnId,
    timestamp_nanos: i64,
    value: Option<Vec<u8>>,
}

impl From<RevisionRecord> for Revision {
    fn from(record: RevisionRecord) -> Self {
        Revision {
            txn_id: record.txn_id,
            timestamp: DateTime::from_timestamp_nanos(record.timestamp_nanos),
            value: record.value,
        }
    }
}

/// RocksDB-backed ledger store
pub struct RocksStore {
    db: Arc<DB>,

    /// Serializes sequence allocation (single writer)
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore")
            .field("path", &self.db.path())
            .finish()
    }
}

impl RocksStore {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_STATE, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_HISTORY, Self::cf_options_history()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB ledger at {:?}", path);

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    // Column family options

    fn cf_options_state() -> Options {
        let mut opts = Options::default();
        // State is frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_history() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    // Helper: get column family handle

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Key helpers

    fn history_prefix(key: &str) -> Vec<u8> {
        let mut prefix = key.as_bytes().to_vec();
        prefix.push(HISTORY_SEPARATOR);
        prefix
    }

    fn history_key(key: &str, seq: u64) -> Vec<u8> {
        let mut history_key = Self::history_prefix(key);
        history_key.extend_from_slice(&seq.to_be_bytes());
        history_key
    }

    fn last_seq(&self, key: &str) -> Result<Option<u64>> {
        let cf_meta = self.cf_handle(CF_META)?;
        match self.db.get_cf(cf_meta, key.as_bytes())? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    Error::Storage(format!("Corrupt sequence number for key {:?}", key))
                })?;
                Ok(Some(u64::from_be_bytes(raw)))
            }
            None => Ok(None),
        }
    }

    /// Stage one revision into `batch`, returning the sequence it will take
    fn stage_revision(
        &self,
        batch: &mut WriteBatch,
        pending: &mut std::collections::HashMap<String, u64>,
        txn_id: &TxnId,
        key: &str,
        value: Option<&[u8]>,
    ) -> Result<u64> {
        validate_key(key)?;

        let seq = match pending.get(key) {
            Some(seq) => seq + 1,
            None => self.last_seq(key)?.map_or(0, |seq| seq + 1),
        };
        pending.insert(key.to_string(), seq);

        let cf_state = self.cf_handle(CF_STATE)?;
        match value {
            Some(bytes) => batch.put_cf(cf_state, key.as_bytes(), bytes),
            None => batch.delete_cf(cf_state, key.as_bytes()),
        }

        let record = RevisionRecord {
            txn_id: txn_id.clone(),
            timestamp_nanos: Utc::now().timestamp_nanos_opt().unwrap_or(0),
            value: value.map(<[u8]>::to_vec),
        };
        let cf_history = self.cf_handle(CF_HISTORY)?;
        batch.put_cf(cf_history, Self::history_key(key, seq), bincode::serialize(&record)?);

        let cf_meta = self.cf_handle(CF_META)?;
        batch.put_cf(cf_meta, key.as_bytes(), seq.to_be_bytes());

        Ok(seq)
    }

    fn write_revisions(&self, txn_id: &TxnId, writes: &[(&str, Option<&[u8]>)]) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut batch = WriteBatch::default();
        let mut pending = std::collections::HashMap::new();
        for (key, value) in writes {
            let seq = self.stage_revision(&mut batch, &mut pending, txn_id, key, *value)?;
            tracing::debug!(key, seq, txn_id = %txn_id, deleted = value.is_none(), "Revision staged");
        }

        // Atomic commit
        self.db.write(batch)?;
        Ok(())
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

impl LedgerStore for RocksStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let cf = self.cf_handle(CF_STATE)?;
        Ok(self.db.get_cf(cf, key.as_bytes())?)
    }

    fn put(&self, txn_id: &TxnId, key: &str, value: &[u8]) -> Result<()> {
        self.write_revisions(txn_id, &[(key, Some(value))])
    }

    fn delete(&self, txn_id: &TxnId, key: &str) -> Result<()> {
        self.write_revisions(txn_id, &[(key, None)])
    }

    fn history<'a>(&'a self, key: &str) -> Result<HistoryIter<'a>> {
        let cf = self.cf_handle(CF_HISTORY)?;
        let prefix = Self::history_prefix(key);

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));

        let revisions = iter
            .take_while(move |item| match item {
                Ok((k, _)) => k.starts_with(&prefix),
                Err(_) => true,
            })
            .map(|item| -> Result<Revision> {
                let (_, value) = item?;
                let record: RevisionRecord = bincode::deserialize(&value)?;
                Ok(Revision::from(record))
            });

        Ok(Box::new(revisions))
    }

    fn scan_range(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let cf = self.cf_handle(CF_STATE)?;
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(start.as_bytes(), Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if &*key >= end.as_bytes() {
                break;
            }
            let key = String::from_utf8(key.into_vec())
                .map_err(|e| Error::Storage(format!("Non UTF-8 key in state: {}", e)))?;
            entries.push((key, value.into_vec()));
        }

        Ok(entries)
    }

    fn supports_atomic_batch(&self) -> bool {
        true
    }

    fn commit_batch(&self, txn_id: &TxnId, writes: &[Write]) -> Result<()> {
        let staged: Vec<(&str, Option<&[u8]>)> = writes
            .iter()
            .map(|w| (w.key.as_str(), w.value.as_deref()))
            .collect();
        self.write_revisions(txn_id, &staged)
    }
}
