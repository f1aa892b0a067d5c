//! Provenance queries
//!
//! Trace and track read the ledger directly and never go through the
//! transition engine.

use crate::{
    codec::{self, Entity, StatusBearing},
    config::ScanRange,
    context::TxContext,
    types::TraceEntry,
    Error, Result,
};
use ledger_store::LedgerStore;

/// Lazy, oldest-first revision history of `key` decoded as `T`
///
/// Each call opens a fresh cursor on the ledger; dropping the iterator
/// releases it. Tombstones yield the zero value with `is_delete` set.
pub fn trace_iter<'a, T: Entity + 'a>(
    store: &'a dyn LedgerStore,
    key: &str,
) -> Result<impl Iterator<Item = Result<TraceEntry<T>>> + 'a> {
    let key = key.to_string();
    let revisions = store.history(&key)?;

    Ok(revisions.map(move |revision| {
        let revision = revision?;
        let value = match &revision.value {
            Some(bytes) => codec::decode(&key, bytes)?,
            None => T::default(),
        };

        Ok(TraceEntry {
            tx_id: revision.txn_id.to_string(),
            timestamp: revision.timestamp,
            is_delete: revision.is_delete(),
            value,
        })
    }))
}

/// Full revision history of `key`; empty when the key was never written
pub fn trace<T: Entity>(store: &dyn LedgerStore, key: &str) -> Result<Vec<TraceEntry<T>>> {
    let entries = trace_iter(store, key)?.collect::<Result<Vec<_>>>()?;

    tracing::debug!(key, kind = %T::KIND, revisions = entries.len(), "Trace materialized");
    Ok(entries)
}

/// Current state of `key`
pub fn track<T: Entity>(ctx: &TxContext<'_>, key: &str) -> Result<T> {
    ctx.read(key)?
        .ok_or_else(|| Error::NotFound(format!("{} {} does not exist", T::KIND, key)))
}

/// Every `T` in `range` whose current status equals `status`, in key order
///
/// Records of another kind inside the range are skipped.
pub fn list_by_status<T: StatusBearing>(
    store: &dyn LedgerStore,
    range: &ScanRange,
    status: &str,
) -> Result<Vec<T>> {
    let mut matches = Vec::new();
    let mut scanned = 0usize;

    for (key, bytes) in store.scan_range(&range.start, &range.end)? {
        scanned += 1;

        if let Some(kind) = codec::peek_kind(&bytes) {
            if kind != T::KIND.as_str() {
                continue;
            }
        }

        let entity: T = codec::decode(&key, &bytes)?;
        if entity.status_str() == status {
            matches.push(entity);
        }
    }

    tracing::debug!(
        kind = %T::KIND,
        status,
        scanned,
        matched = matches.len(),
        "Status scan complete"
    );

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cargo, CargoStatus, Container, ContainerStatus};
    use ledger_store::{MemoryStore, TxnId};

    fn container(hash_id: &str, status: ContainerStatus) -> Container {
        Container {
            hash_id: hash_id.into(),
            status: Some(status),
            ..Default::default()
        }
    }

    #[test]
    fn test_trace_orders_revisions() {
        let store = MemoryStore::new();

        let mut c = container("1001", ContainerStatus::Available);
        TxContext::new(&store, TxnId::from("t1")).put("1001", &c).unwrap();
        c.status = Some(ContainerStatus::Loaded);
        TxContext::new(&store, TxnId::from("t2")).put("1001", &c).unwrap();

        let trace: Vec<TraceEntry<Container>> = trace(&store, "1001").unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].tx_id, "t1");
        assert_eq!(trace[0].value.status, Some(ContainerStatus::Available));
        assert_eq!(trace[1].tx_id, "t2");
        assert!(trace[0].timestamp <= trace[1].timestamp);

        let ctx = TxContext::new(&store, TxnId::from("q"));
        assert_eq!(track::<Container>(&ctx, "1001").unwrap(), trace[1].value);
    }

    #[test]
    fn test_trace_tombstone_is_zero_value() {
        let store = MemoryStore::new();
        TxContext::new(&store, TxnId::from("t1"))
            .put("1001", &container("1001", ContainerStatus::Available))
            .unwrap();
        store.delete(&TxnId::from("t2"), "1001").unwrap();

        let trace: Vec<TraceEntry<Container>> = trace(&store, "1001").unwrap();
        assert_eq!(trace.len(), 2);
        assert!(trace[1].is_delete);
        assert_eq!(trace[1].value, Container::default());

        let ctx = TxContext::new(&store, TxnId::from("q"));
        assert!(matches!(
            track::<Container>(&ctx, "1001"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_trace_unknown_key_is_empty() {
        let store = MemoryStore::new();
        assert!(trace::<Cargo>(&store, "C404").unwrap().is_empty());
    }

    #[test]
    fn test_trace_iter_is_fresh_per_call() {
        let store = MemoryStore::new();
        let ctx = TxContext::new(&store, TxnId::from("t1"));
        ctx.put("C1", &Cargo::default()).unwrap();

        let first = trace_iter::<Cargo>(&store, "C1").unwrap().count();
        ctx.put("C1", &Cargo::default()).unwrap();
        let second = trace_iter::<Cargo>(&store, "C1").unwrap().count();

        assert_eq!((first, second), (1, 2));
    }

    #[test]
    fn test_list_by_status_filters_range_and_kind() {
        let store = MemoryStore::new();
        let ctx = TxContext::new(&store, TxnId::from("t1"));

        ctx.put("1001", &container("1001", ContainerStatus::Available))
            .unwrap();
        ctx.put("1002", &container("1002", ContainerStatus::Loaded))
            .unwrap();
        ctx.put("2000", &container("2000", ContainerStatus::Available))
            .unwrap();
        // Out of range
        ctx.put("0999", &container("0999", ContainerStatus::Available))
            .unwrap();
        // Another kind inside the range
        ctx.put(
            "1500",
            &Cargo {
                status: CargoStatus::new("Available"),
                ..Default::default()
            },
        )
        .unwrap();

        let available: Vec<Container> =
            list_by_status(&store, &ScanRange::default(), "Available").unwrap();
        let ids: Vec<&str> = available.iter().map(|c| c.hash_id.as_str()).collect();
        assert_eq!(ids, vec!["1001", "2000"]);

        let loaded: Vec<Container> =
            list_by_status(&store, &ScanRange::default(), "Loaded").unwrap();
        assert_eq!(loaded.len(), 1);

        let none: Vec<Container> =
            list_by_status(&store, &ScanRange::default(), "Unloaded").unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_list_by_status_custom_range() {
        let store = MemoryStore::new();
        let ctx = TxContext::new(&store, TxnId::from("t1"));
        ctx.put("CT-1", &container("CT-1", ContainerStatus::Available))
            .unwrap();
        ctx.put("1001", &container("1001", ContainerStatus::Available))
            .unwrap();

        let found: Vec<Container> =
            list_by_status(&store, &ScanRange::new("CT-", "CT-~"), "Available").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].hash_id, "CT-1");
    }
}
