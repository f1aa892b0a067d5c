//! Configuration for the consignment contract

use ledger_store::{LedgerStore, MemoryStore, RocksStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Contract configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name, also the creator name mixed into transaction ids
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Which ledger backend to open
    pub store: StoreBackend,

    /// Ledger store configuration (RocksDB backend)
    pub ledger: ledger_store::Config,

    /// Key range scanned by the status list queries
    pub scan: ScanRange,

    /// Transition engine configuration
    pub engine: EngineConfig,

    /// Actor configuration
    pub actor: ActorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "consignment-node".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            store: StoreBackend::RocksDb,
            ledger: ledger_store::Config::default(),
            scan: ScanRange::default(),
            engine: EngineConfig::default(),
            actor: ActorConfig::default(),
        }
    }
}

/// Ledger backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Volatile, in-process
    Memory,
    /// Durable RocksDB under `ledger.data_dir`
    RocksDb,
}

impl StoreBackend {
    /// Parse from config/env value
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Some(StoreBackend::Memory),
            "rocksdb" => Some(StoreBackend::RocksDb),
            _ => None,
        }
    }
}

/// Half-open key range `[start, end)` holding container records
///
/// Container hashIds are allocated as numeric-looking strings, so the default
/// range covers `1001` up to (not including) `9999999` in lexical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanRange {
    /// Inclusive lower bound
    pub start: String,

    /// Exclusive upper bound
    pub end: String,
}

impl Default for ScanRange {
    fn default() -> Self {
        Self {
            start: "1001".to_string(),
            end: "9999999".to_string(),
        }
    }
}

impl ScanRange {
    /// Create new range
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Whether `key` falls inside the range
    pub fn contains(&self, key: &str) -> bool {
        key >= self.start.as_str() && key < self.end.as_str()
    }
}

/// Transition engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Commit cargo creation and its container updates as one batch when the
    /// ledger supports atomic multi-key commits
    pub atomic_bulk_association: bool,
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from a variable lookup, defaults for anything unset
    ///
    /// The `ledger` section comes from [`ledger_store::Config::from_lookup`];
    /// on top of it this reads `CONSIGNMENT_STORE`, `CONSIGNMENT_SCAN_START`,
    /// `CONSIGNMENT_SCAN_END` and `CONSIGNMENT_ATOMIC_BULK`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let mut config = Config {
            ledger: ledger_store::Config::from_lookup(&lookup)?,
            ..Default::default()
        };

        if let Some(store) = lookup("CONSIGNMENT_STORE") {
            config.store = StoreBackend::parse(&store).ok_or_else(|| {
                crate::Error::Config(format!("Unknown store backend: {}", store))
            })?;
        }

        if let Some(start) = lookup("CONSIGNMENT_SCAN_START") {
            config.scan.start = start;
        }

        if let Some(end) = lookup("CONSIGNMENT_SCAN_END") {
            config.scan.end = end;
        }

        if let Some(flag) = lookup("CONSIGNMENT_ATOMIC_BULK") {
            config.engine.atomic_bulk_association = flag.parse().map_err(|_| {
                crate::Error::Config(format!("CONSIGNMENT_ATOMIC_BULK: not a bool: {}", flag))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings no backend can honor
    pub fn validate(&self) -> crate::Result<()> {
        if self.scan.start >= self.scan.end {
            return Err(crate::Error::Config(format!(
                "Empty scan range: {:?}..{:?}",
                self.scan.start, self.scan.end
            )));
        }

        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "actor.mailbox_capacity must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Open the configured ledger backend
    pub fn open_store(&self) -> crate::Result<Arc<dyn LedgerStore>> {
        let store: Arc<dyn LedgerStore> = match self.store {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::RocksDb => Arc::new(RocksStore::open(&self.ledger)?),
        };

        tracing::info!(backend = ?self.store, "Ledger store opened");
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "consignment-node");
        assert_eq!(config.scan, ScanRange::new("1001", "9999999"));
        assert!(!config.engine.atomic_bulk_association);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scan_range_contains() {
        let range = ScanRange::default();
        assert!(range.contains("1001"));
        assert!(range.contains("5"));
        assert!(!range.contains("1000"));
        assert!(!range.contains("9999999"));
        assert!(!range.contains("C1"));
    }

    #[test]
    fn test_toml_config() {
        let config: Config = toml::from_str(
            r#"
            store = "memory"

            [scan]
            start = "CT-"
            end = "CT-~"

            [engine]
            atomic_bulk_association = true
            "#,
        )
        .unwrap();

        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.scan.start, "CT-");
        assert!(config.engine.atomic_bulk_association);
        assert_eq!(config.actor.mailbox_capacity, 1000);
    }

    #[test]
    fn test_from_file_rejects_empty_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(&path, "[scan]\nstart = \"9\"\nend = \"1\"\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let config = Config::from_lookup(vars(&[
            ("CONSIGNMENT_STORE", "Memory"),
            ("CONSIGNMENT_SCAN_START", "CT-"),
            ("CONSIGNMENT_SCAN_END", "CT-~"),
            ("CONSIGNMENT_ATOMIC_BULK", "true"),
            ("LEDGER_DATA_DIR", "/srv/consignment"),
        ]))
        .unwrap();

        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.scan, ScanRange::new("CT-", "CT-~"));
        assert!(config.engine.atomic_bulk_association);
        assert_eq!(
            config.ledger.data_dir,
            std::path::PathBuf::from("/srv/consignment")
        );
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = Config::from_lookup(vars(&[])).unwrap();
        assert_eq!(config.store, StoreBackend::RocksDb);
        assert_eq!(config.scan, ScanRange::default());
        assert_eq!(config.ledger.data_dir, ledger_store::Config::default().data_dir);
    }

    #[test]
    fn test_from_lookup_rejects_unknown_backend() {
        let err = Config::from_lookup(vars(&[("CONSIGNMENT_STORE", "postgres")])).unwrap_err();
        assert!(matches!(err, crate::Error::Config(ref msg) if msg.contains("postgres")));
    }

    #[test]
    fn test_from_lookup_rejects_inverted_range() {
        let err = Config::from_lookup(vars(&[
            ("CONSIGNMENT_SCAN_START", "9"),
            ("CONSIGNMENT_SCAN_END", "1"),
        ]))
        .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_from_lookup_propagates_ledger_errors() {
        let err = Config::from_lookup(vars(&[("LEDGER_ENABLE_STATISTICS", "maybe")])).unwrap_err();
        assert!(matches!(err, crate::Error::Ledger(ledger_store::Error::Config(_))));
    }

    #[test]
    fn test_open_memory_store() {
        let config = Config {
            store: StoreBackend::Memory,
            ..Default::default()
        };
        let store = config.open_store().unwrap();
        assert!(store.get("1001").unwrap().is_none());
    }
}
