//! Versioned key-value ledger
//!
//! Stores every revision of every key as an immutable, ordered history while
//! keeping the latest value available for point lookups and range scans.
//!
//! # Architecture
//!
//! - **World state**: Latest value per key, scanned in lexical key order
//! - **History**: Append-only revision log per key, oldest first
//! - **Tombstones**: Deletes are recorded as revisions without a value
//! - **Single Writer**: Revision sequence numbers are allocated under one lock

#![forbid(unsafe_code)]
//!
//! # Invariants
//!
//! - Append-only: Revisions are never modified or removed
//! - Read-your-writes: A `get` after `put` observes the written value
//! - Ordered history: `history(key)` yields revisions in commit order

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod memory;
pub mod storage;
pub mod txn;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use storage::RocksStore;
pub use txn::TxnId;
pub use types::{HistoryIter, LedgerStore, Revision, Write};
