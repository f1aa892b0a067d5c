//! Operation dispatch
//!
//! Maps a function name plus positional string arguments onto the engine,
//! the provenance queries and the participant registry, and encodes the
//! result as a JSON payload.
//!
//! Every invocation gets its own [`TxnId`]; all writes it makes share that id.

use crate::{
    config::{Config, ScanRange},
    context::TxContext,
    engine::{ContainerUpdate, CargoUpdate, NewCargo, NewContainer, PackageLoad, TransitionEngine},
    error::ErrorKind,
    metrics::Metrics,
    participant, provenance,
    types::{Cargo, CargoStatus, Container, ContainerList, ContainerStatus, Participant},
    validator, Error, Result,
};
use ledger_store::{LedgerStore, TxnId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Contract operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `registerParticipant(hashId, name, emailId, role)`
    RegisterParticipant,
    /// `addNewContainer(hashId, timestamp, manufacturer, status, loadedItems, owner, ownerRole, customClearance, shippedFrom, shippedTo, location)`
    AddNewContainer,
    /// `getParticipant(hashId)`
    GetParticipant,
    /// `loadContainerWithPackages(hashId, timestamp, status, loadedItems, customClearance, shippedFrom, shippedTo, location)`
    LoadContainerWithPackages,
    /// `createCargoLoadContainers(hashId, txnId, timestamp, cargoId, shippedFrom, shippedTo, location, transportType, containerQty, owner, containerIds, status)`
    CreateCargoLoadContainers,
    /// `updateCargoAttributes(hashId, txnId, timestamp, shippedFrom, shippedTo, transportType, containerQty, containerIds, status)`
    UpdateCargoAttributes,
    /// `updateCargoCoordinates(hashId, timestamp, location)`
    UpdateCargoCoordinates,
    /// `changeCargoCustody(hashId, newOwner)`
    ChangeCargoCustody,
    /// `changeContainerCustody(hashId, newOwner)`
    ChangeContainerCustody,
    /// `updateContainerAttributes(hashId, timestamp, manufacturer, status, loadedItems, customClearance, shippedFrom, shippedTo, location)`
    UpdateContainerAttributes,
    /// `unloadContainerFromCargo(cargoHashId, containerHashId)`
    UnloadContainerFromCargo,
    /// `traceCargo(hashId)`
    TraceCargo,
    /// `traceContainer(hashId)`
    TraceContainer,
    /// `trackCargoDetails(hashId)`
    TrackCargoDetails,
    /// `trackContainerDetails(hashId)`
    TrackContainerDetails,
    /// `getLoadedContainers()`
    GetLoadedContainers,
    /// `getAvailableContainers()`
    GetAvailableContainers,
}

impl Operation {
    /// Every operation
    pub const ALL: [Operation; 17] = [
        Operation::RegisterParticipant,
        Operation::AddNewContainer,
        Operation::GetParticipant,
        Operation::LoadContainerWithPackages,
        Operation::CreateCargoLoadContainers,
        Operation::UpdateCargoAttributes,
        Operation::UpdateCargoCoordinates,
        Operation::ChangeCargoCustody,
        Operation::ChangeContainerCustody,
        Operation::UpdateContainerAttributes,
        Operation::UnloadContainerFromCargo,
        Operation::TraceCargo,
        Operation::TraceContainer,
        Operation::TrackCargoDetails,
        Operation::TrackContainerDetails,
        Operation::GetLoadedContainers,
        Operation::GetAvailableContainers,
    ];

    /// Resolve a function name
    pub fn parse(function: &str) -> Option<Self> {
        match function {
            // Legacy spelling still sent by older clients
            "getAvilableContainers" => Some(Operation::GetAvailableContainers),
            _ => Self::ALL.iter().copied().find(|op| op.name() == function),
        }
    }

    /// Function name
    pub fn name(&self) -> &'static str {
        match self {
            Operation::RegisterParticipant => "registerParticipant",
            Operation::AddNewContainer => "addNewContainer",
            Operation::GetParticipant => "getParticipant",
            Operation::LoadContainerWithPackages => "loadContainerWithPackages",
            Operation::CreateCargoLoadContainers => "createCargoLoadContainers",
            Operation::UpdateCargoAttributes => "updateCargoAttributes",
            Operation::UpdateCargoCoordinates => "updateCargoCoordinates",
            Operation::ChangeCargoCustody => "changeCargoCustody",
            Operation::ChangeContainerCustody => "changeContainerCustody",
            Operation::UpdateContainerAttributes => "updateContainerAttributes",
            Operation::UnloadContainerFromCargo => "unloadContainerFromCargo",
            Operation::TraceCargo => "traceCargo",
            Operation::TraceContainer => "traceContainer",
            Operation::TrackCargoDetails => "trackCargoDetails",
            Operation::TrackContainerDetails => "trackContainerDetails",
            Operation::GetLoadedContainers => "getLoadedContainers",
            Operation::GetAvailableContainers => "getAvailableContainers",
        }
    }

    /// Number of positional arguments
    pub fn arity(&self) -> usize {
        match self {
            Operation::GetLoadedContainers | Operation::GetAvailableContainers => 0,
            Operation::GetParticipant
            | Operation::TraceCargo
            | Operation::TraceContainer
            | Operation::TrackCargoDetails
            | Operation::TrackContainerDetails => 1,
            Operation::ChangeCargoCustody
            | Operation::ChangeContainerCustody
            | Operation::UnloadContainerFromCargo => 2,
            Operation::UpdateCargoCoordinates => 3,
            Operation::RegisterParticipant => 4,
            Operation::LoadContainerWithPackages => 8,
            Operation::UpdateCargoAttributes | Operation::UpdateContainerAttributes => 9,
            Operation::AddNewContainer => 11,
            Operation::CreateCargoLoadContainers => 12,
        }
    }

    /// Whether the operation writes to the ledger
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::RegisterParticipant
                | Operation::AddNewContainer
                | Operation::LoadContainerWithPackages
                | Operation::CreateCargoLoadContainers
                | Operation::UpdateCargoAttributes
                | Operation::UpdateCargoCoordinates
                | Operation::ChangeCargoCustody
                | Operation::ChangeContainerCustody
                | Operation::UpdateContainerAttributes
                | Operation::UnloadContainerFromCargo
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Check arity and view `args` as a fixed-size array
fn positional<const N: usize>(operation: Operation, args: &[String]) -> Result<&[String; N]> {
    validator::expect_arity(operation.name(), args, N)?;
    args.try_into().map_err(|_| {
        Error::InvalidArgument(format!("Malformed arguments for {}", operation))
    })
}

/// The consignment contract
///
/// Owns the ledger handle and dispatches invocations against it. Cheap to
/// share behind an `Arc`; the actor front-end owns one instance.
pub struct Contract {
    store: Arc<dyn LedgerStore>,
    engine: TransitionEngine,
    scan: ScanRange,
    creator: String,
    metrics: Metrics,
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("engine", &self.engine)
            .field("scan", &self.scan)
            .field("creator", &self.creator)
            .finish_non_exhaustive()
    }
}

impl Contract {
    /// Create new contract
    pub fn new(store: Arc<dyn LedgerStore>, config: &Config, metrics: Metrics) -> Self {
        Self {
            store,
            engine: TransitionEngine::new(&config.engine),
            scan: config.scan.clone(),
            creator: config.service_name.clone(),
            metrics,
        }
    }

    /// Ledger this contract writes to
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Run `function` with positional `args`
    ///
    /// Returns the JSON payload; mutations return an empty payload.
    pub fn invoke(&self, function: &str, args: &[String]) -> Result<Vec<u8>> {
        let started = Instant::now();

        let (label, result) = match Operation::parse(function) {
            Some(operation) => (operation.name(), self.execute(operation, args)),
            None => (
                "unknown",
                Err(Error::InvalidArgument(format!(
                    "Received unknown function invocation: {}",
                    function
                ))),
            ),
        };

        let failure = result.as_ref().err().map(Error::kind);
        self.metrics
            .record_invocation(label, failure, started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::warn!(function, kind = %e.kind(), error = %e, "Invocation failed");
        }

        result
    }

    /// Run a resolved operation
    pub fn execute(&self, operation: Operation, args: &[String]) -> Result<Vec<u8>> {
        let ctx = TxContext::new(self.store.as_ref(), TxnId::generate(&self.creator));

        tracing::debug!(
            operation = %operation,
            mutation = operation.is_mutation(),
            txn_id = %ctx.txn_id(),
            args = args.len(),
            "Invoking"
        );

        match operation {
            Operation::RegisterParticipant => {
                let [hash_id, name, email_id, role] = positional::<4>(operation, args)?;
                participant::register_participant(
                    &ctx,
                    Participant {
                        hash_id: hash_id.clone(),
                        name: name.clone(),
                        email_id: email_id.clone(),
                        role: role.clone(),
                    },
                )?;
                Ok(Vec::new())
            }

            Operation::AddNewContainer => {
                let [hash_id, timestamp, manufacturer, status, loaded_items, owner, owner_role, custom_clearance, shipped_from, shipped_to, location] =
                    positional::<11>(operation, args)?;
                self.engine.create_container(
                    &ctx,
                    NewContainer {
                        hash_id: hash_id.clone(),
                        timestamp: timestamp.clone(),
                        manufacturer: manufacturer.clone(),
                        status: validator::parse_container_status(status)?,
                        loaded_items: loaded_items.clone(),
                        owner: owner.clone(),
                        owner_role: owner_role.clone(),
                        custom_clearance: custom_clearance.clone(),
                        shipped_from: shipped_from.clone(),
                        shipped_to: shipped_to.clone(),
                        location: location.clone(),
                    },
                )?;
                Ok(Vec::new())
            }

            Operation::GetParticipant => {
                let [hash_id] = positional::<1>(operation, args)?;
                let record = participant::get_participant(&ctx, hash_id)?;
                Ok(serde_json::to_vec(&record)?)
            }

            Operation::LoadContainerWithPackages => {
                let [hash_id, timestamp, status, loaded_items, custom_clearance, shipped_from, shipped_to, location] =
                    positional::<8>(operation, args)?;
                self.engine.load_container_with_packages(
                    &ctx,
                    hash_id,
                    PackageLoad {
                        timestamp: timestamp.clone(),
                        status: validator::parse_container_status(status)?,
                        loaded_items: loaded_items.clone(),
                        custom_clearance: custom_clearance.clone(),
                        shipped_from: shipped_from.clone(),
                        shipped_to: shipped_to.clone(),
                        location: location.clone(),
                    },
                )?;
                Ok(Vec::new())
            }

            Operation::CreateCargoLoadContainers => {
                let [hash_id, txn_id, timestamp, cargo_id, shipped_from, shipped_to, location, transport_type, container_qty, owner, container_ids, status] =
                    positional::<12>(operation, args)?;
                let cargo = self.engine.create_cargo_and_load_containers(
                    &ctx,
                    NewCargo {
                        hash_id: hash_id.clone(),
                        txn_id: txn_id.clone(),
                        timestamp: timestamp.clone(),
                        cargo_id: cargo_id.clone(),
                        shipped_from: shipped_from.clone(),
                        shipped_to: shipped_to.clone(),
                        location: location.clone(),
                        transport_type: transport_type.clone(),
                        container_qty: container_qty.clone(),
                        owner: owner.clone(),
                        container_ids: validator::split_container_ids(container_ids),
                        status: CargoStatus::new(status.as_str()),
                    },
                )?;
                self.metrics
                    .record_containers_associated(cargo.associated_container_hash_ids.len());
                Ok(Vec::new())
            }

            Operation::UpdateCargoAttributes => {
                let [hash_id, txn_id, timestamp, shipped_from, shipped_to, transport_type, container_qty, container_ids, status] =
                    positional::<9>(operation, args)?;
                self.engine.update_cargo_attributes(
                    &ctx,
                    hash_id,
                    CargoUpdate {
                        txn_id: txn_id.clone(),
                        timestamp: timestamp.clone(),
                        shipped_from: shipped_from.clone(),
                        shipped_to: shipped_to.clone(),
                        transport_type: transport_type.clone(),
                        container_qty: container_qty.clone(),
                        container_ids: validator::split_container_ids(container_ids),
                        status: CargoStatus::new(status.as_str()),
                    },
                )?;
                Ok(Vec::new())
            }

            Operation::UpdateCargoCoordinates => {
                let [hash_id, timestamp, location] = positional::<3>(operation, args)?;
                self.engine
                    .update_cargo_coordinates(&ctx, hash_id, timestamp, location)?;
                Ok(Vec::new())
            }

            Operation::ChangeCargoCustody => {
                let [hash_id, new_owner] = positional::<2>(operation, args)?;
                self.engine.change_cargo_custody(&ctx, hash_id, new_owner)?;
                Ok(Vec::new())
            }

            Operation::ChangeContainerCustody => {
                let [hash_id, new_owner] = positional::<2>(operation, args)?;
                self.engine
                    .change_container_custody(&ctx, hash_id, new_owner)?;
                Ok(Vec::new())
            }

            Operation::UpdateContainerAttributes => {
                let [hash_id, timestamp, manufacturer, status, loaded_items, custom_clearance, shipped_from, shipped_to, location] =
                    positional::<9>(operation, args)?;
                self.engine.update_container_attributes(
                    &ctx,
                    hash_id,
                    ContainerUpdate {
                        timestamp: timestamp.clone(),
                        manufacturer: manufacturer.clone(),
                        status: validator::parse_container_status(status)?,
                        loaded_items: loaded_items.clone(),
                        custom_clearance: custom_clearance.clone(),
                        shipped_from: shipped_from.clone(),
                        shipped_to: shipped_to.clone(),
                        location: location.clone(),
                    },
                )?;
                Ok(Vec::new())
            }

            Operation::UnloadContainerFromCargo => {
                let [cargo_hash_id, container_hash_id] = positional::<2>(operation, args)?;
                self.engine
                    .unload_container_from_cargo(&ctx, cargo_hash_id, container_hash_id)?;
                Ok(Vec::new())
            }

            Operation::TraceCargo => {
                let [hash_id] = positional::<1>(operation, args)?;
                let entries = provenance::trace::<Cargo>(ctx.store(), hash_id)?;
                Ok(serde_json::to_vec(&entries)?)
            }

            Operation::TraceContainer => {
                let [hash_id] = positional::<1>(operation, args)?;
                let entries = provenance::trace::<Container>(ctx.store(), hash_id)?;
                Ok(serde_json::to_vec(&entries)?)
            }

            Operation::TrackCargoDetails => {
                let [hash_id] = positional::<1>(operation, args)?;
                let cargo = provenance::track::<Cargo>(&ctx, hash_id)?;
                Ok(serde_json::to_vec(&cargo)?)
            }

            Operation::TrackContainerDetails => {
                let [hash_id] = positional::<1>(operation, args)?;
                let container = provenance::track::<Container>(&ctx, hash_id)?;
                Ok(serde_json::to_vec(&container)?)
            }

            Operation::GetLoadedContainers => {
                let [] = positional::<0>(operation, args)?;
                self.container_list(ContainerStatus::Loaded)
            }

            Operation::GetAvailableContainers => {
                let [] = positional::<0>(operation, args)?;
                self.container_list(ContainerStatus::Available)
            }
        }
    }

    fn container_list(&self, status: ContainerStatus) -> Result<Vec<u8>> {
        let containers =
            provenance::list_by_status::<Container>(self.store.as_ref(), &self.scan, status.as_str())?;
        Ok(serde_json::to_vec(&ContainerList { containers })?)
    }
}

/// Outcome of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    /// Operation applied or query answered
    Success,
    /// Operation rejected or failed
    Error,
}

/// Response envelope returned to external callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Outcome
    pub status: ResponseStatus,

    /// JSON payload, absent for mutations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,

    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Failure class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl Response {
    /// Build from an invocation result
    pub fn from_result(result: Result<Vec<u8>>) -> Self {
        match result {
            Ok(bytes) if bytes.is_empty() => Self::success(None),
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => Self::success(Some(value)),
                Err(e) => Self::error(&Error::Codec(e)),
            },
            Err(e) => Self::error(&e),
        }
    }

    fn success(payload: Option<serde_json::Value>) -> Self {
        Self {
            status: ResponseStatus::Success,
            payload,
            message: None,
            kind: None,
        }
    }

    /// Build a failure response
    pub fn error(error: &Error) -> Self {
        Self {
            status: ResponseStatus::Error,
            payload: None,
            message: Some(error.to_string()),
            kind: Some(error.kind()),
        }
    }

    /// Whether the invocation succeeded
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}
