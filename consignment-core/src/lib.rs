//! Consignment Core
//!
//! Track & trace of shipping containers and the cargo consignments that
//! carry them, recorded as an append-only revision history on a versioned
//! key-value ledger.
//!
//! # Architecture

#![forbid(unsafe_code)]
//!
//! Every invocation flows through the same pipeline:
//!
//! 1. **Dispatch**: Resolve the operation name and check its arity
//! 2. **Validation**: Role and status gates, existence checks
//! 3. **Transition**: Read current records, compute next state, write back
//! 4. **Provenance**: Trace and track queries read the ledger directly
//!
//! The ledger handle is passed explicitly as a [`TxContext`]; nothing in this
//! crate holds global state.
//!
//! # Example
//!
//! ```no_run
//! use consignment_core::{Config, Contract, Metrics};
//!
//! fn main() -> consignment_core::Result<()> {
//!     let config = Config::default();
//!     let store = config.open_store()?;
//!     let contract = Contract::new(store, &config, Metrics::new()?);
//!
//!     let args: Vec<String> = ["1001"].iter().map(|s| s.to_string()).collect();
//!     let payload = contract.invoke("traceContainer", &args)?;
//!     println!("{}", String::from_utf8_lossy(&payload));
//!
//!     Ok(())
//! }
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod codec;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod participant;
pub mod provenance;
pub mod types;
pub mod validator;

// Re-exports
pub use config::{Config, ScanRange, StoreBackend};
pub use context::TxContext;
pub use dispatch::{Contract, Operation, Response};
pub use engine::TransitionEngine;
pub use error::{Error, ErrorKind, Result};
pub use metrics::Metrics;
pub use types::{
    Cargo, CargoStatus, Container, ContainerStatus, EntityKind, Participant, ParticipantRole,
    TraceEntry,
};
