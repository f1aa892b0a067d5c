//! Property-based tests for ledger invariants
//!
//! - Append-only: history length equals the number of writes per key
//! - Read-your-writes: `get` returns the last written value
//! - Range scans: live keys in `[start, end)`, in key order
//!
//! Each property runs against both backends.

use ledger_store::{Config, LedgerStore, MemoryStore, RocksStore, TxnId};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// One write against the ledger: `None` deletes
type Op = (String, Option<Vec<u8>>);

/// Strategy for generating keys from a small alphabet so keys collide
fn key_strategy() -> impl Strategy<Value = String> {
    "[0-9A-C]{1,4}"
}

/// Strategy for generating write sequences
fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        (
            key_strategy(),
            proptest::option::weighted(0.85, prop::collection::vec(any::<u8>(), 0..32)),
        ),
        1..40,
    )
}

/// Run `check` against a fresh memory store and a fresh RocksDB store
fn with_stores(check: impl Fn(&dyn LedgerStore) -> Result<(), TestCaseError>) -> Result<(), TestCaseError> {
    check(&MemoryStore::new())?;

    let temp_dir = tempfile::tempdir().unwrap();
    let config = Config {
        data_dir: temp_dir.path().to_path_buf(),
        ..Default::default()
    };
    let store = RocksStore::open(&config).unwrap();
    check(&store)
}

fn apply(store: &dyn LedgerStore, ops: &[Op]) -> BTreeMap<String, Vec<u8>> {
    let mut model = BTreeMap::new();
    for (i, (key, value)) in ops.iter().enumerate() {
        let txn_id = TxnId::from(format!("tx-{}", i));
        match value {
            Some(bytes) => {
                store.put(&txn_id, key, bytes).unwrap();
                model.insert(key.clone(), bytes.clone());
            }
            None => {
                store.delete(&txn_id, key).unwrap();
                model.remove(key);
            }
        }
    }
    model
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: Every write appends exactly one revision, in commit order
    #[test]
    fn prop_history_is_append_only(ops in ops_strategy()) {
        with_stores(|store| {
            apply(store, &ops);

            let mut expected: BTreeMap<&str, Vec<(String, Option<Vec<u8>>)>> = BTreeMap::new();
            for (i, (key, value)) in ops.iter().enumerate() {
                expected
                    .entry(key.as_str())
                    .or_default()
                    .push((format!("tx-{}", i), value.clone()));
            }

            for (key, writes) in expected {
                let history: Vec<_> = store
                    .history(key)
                    .unwrap()
                    .map(|rev| rev.unwrap())
                    .map(|rev| (rev.txn_id.to_string(), rev.value))
                    .collect();
                prop_assert_eq!(history, writes);
            }
            Ok(())
        })?;
    }

    /// Property: Reads observe the latest write, deletes hide the key
    #[test]
    fn prop_read_your_writes(ops in ops_strategy()) {
        with_stores(|store| {
            let model = apply(store, &ops);

            for (key, _) in &ops {
                prop_assert_eq!(store.get(key).unwrap(), model.get(key).cloned());
            }
            Ok(())
        })?;
    }

    /// Property: Range scans match the model's half-open range
    #[test]
    fn prop_scan_range_is_half_open(
        ops in ops_strategy(),
        start in key_strategy(),
        end in key_strategy(),
    ) {
        with_stores(|store| {
            let model = apply(store, &ops);

            let expected: Vec<(String, Vec<u8>)> = model
                .iter()
                .filter(|(key, _)| key.as_str() >= start.as_str() && key.as_str() < end.as_str())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            prop_assert_eq!(store.scan_range(&start, &end).unwrap(), expected);
            Ok(())
        })?;
    }
}
