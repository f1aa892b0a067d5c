//! State transition engine
//!
//! Applies the container and cargo operations. Each one reads the current
//! records through the [`TxContext`], validates, computes the next state and
//! writes it back under the invocation's transaction id.
//!
//! # Container status
//!
//! ```text
//! Available ──load──▶ Loaded
//!     │                 │
//!     └────associate────┴──▶ InCargo ──unload──▶ Unloaded
//! ```
//!
//! Transitions are only checked where an operation names them; attribute
//! updates may set any status.
//!
//! # Multi-key writes
//!
//! Cargo creation, coordinate updates and unloading write several keys. The
//! writes are independent: a failure part way leaves earlier writes in place.
//! With `atomic_bulk_association` enabled and a ledger that supports it,
//! cargo creation commits the cargo and all its containers in one batch.
//!
//! Two gaps in the Cargo↔Container association are kept as they are:
//! [`update_cargo_attributes`](TransitionEngine::update_cargo_attributes)
//! replaces the association list without touching container back-references,
//! and [`unload_container_from_cargo`](TransitionEngine::unload_container_from_cargo)
//! leaves the unloaded container's `cargo_id` set.

use crate::{
    codec,
    config::EngineConfig,
    context::TxContext,
    types::{Cargo, CargoStatus, Container, ContainerStatus},
    validator, Result,
};
use ledger_store::Write;

/// Arguments of `addNewContainer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContainer {
    /// Ledger key
    pub hash_id: String,
    /// Event time
    pub timestamp: String,
    /// Manufacturer
    pub manufacturer: String,
    /// Initial status
    pub status: ContainerStatus,
    /// Contents
    pub loaded_items: String,
    /// Receiving participant
    pub owner: String,
    /// Role of the receiving participant
    pub owner_role: String,
    /// Customs clearance status
    pub custom_clearance: String,
    /// Origin
    pub shipped_from: String,
    /// Destination
    pub shipped_to: String,
    /// Current location
    pub location: String,
}

/// Arguments of `loadContainerWithPackages` (after the hashId)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLoad {
    /// Event time
    pub timestamp: String,
    /// Status after loading
    pub status: ContainerStatus,
    /// Contents
    pub loaded_items: String,
    /// Customs clearance status
    pub custom_clearance: String,
    /// Origin
    pub shipped_from: String,
    /// Destination
    pub shipped_to: String,
    /// Current location
    pub location: String,
}

/// Arguments of `updateContainerAttributes` (after the hashId)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerUpdate {
    /// Event time
    pub timestamp: String,
    /// Manufacturer
    pub manufacturer: String,
    /// New status
    pub status: ContainerStatus,
    /// Contents
    pub loaded_items: String,
    /// Customs clearance status
    pub custom_clearance: String,
    /// Origin
    pub shipped_from: String,
    /// Destination
    pub shipped_to: String,
    /// Current location
    pub location: String,
}

/// Arguments of `createCargoLoadContainers`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCargo {
    /// Ledger key
    pub hash_id: String,
    /// Caller transaction reference
    pub txn_id: String,
    /// Event time
    pub timestamp: String,
    /// Human-facing identifier
    pub cargo_id: String,
    /// Origin
    pub shipped_from: String,
    /// Destination
    pub shipped_to: String,
    /// Current location
    pub location: String,
    /// Transportation type
    pub transport_type: String,
    /// Declared container count
    pub container_qty: String,
    /// Custodian
    pub owner: String,
    /// Containers to associate, in order
    pub container_ids: Vec<String>,
    /// Initial status
    pub status: CargoStatus,
}

/// Arguments of `updateCargoAttributes` (after the hashId)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoUpdate {
    /// Caller transaction reference
    pub txn_id: String,
    /// Event time
    pub timestamp: String,
    /// Origin
    pub shipped_from: String,
    /// Destination
    pub shipped_to: String,
    /// Transportation type
    pub transport_type: String,
    /// Declared container count
    pub container_qty: String,
    /// Replacement association list
    pub container_ids: Vec<String>,
    /// New status
    pub status: CargoStatus,
}

/// Applies domain operations to ledger records
#[derive(Debug, Clone, Default)]
pub struct TransitionEngine {
    atomic_bulk_association: bool,
}

impl TransitionEngine {
    /// Create new engine
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            atomic_bulk_association: config.atomic_bulk_association,
        }
    }

    /// Grant a new container to a Transporter
    ///
    /// The caller-supplied status is stored as is. No write happens when the
    /// role check fails.
    pub fn create_container(&self, ctx: &TxContext<'_>, req: NewContainer) -> Result<Container> {
        validator::require_transporter(&req.owner, &req.owner_role)?;

        let container = Container {
            hash_id: req.hash_id,
            timestamp: req.timestamp,
            manufacturer: req.manufacturer,
            status: Some(req.status),
            loaded_items: req.loaded_items,
            owner: req.owner,
            cargo_id: String::new(),
            custom_clearance_status: req.custom_clearance,
            shipped_from: req.shipped_from,
            shipped_to: req.shipped_to,
            container_location: req.location,
        };

        ctx.put(&container.hash_id, &container)?;

        tracing::info!(
            container = %container.hash_id,
            owner = %container.owner,
            status = %container.status_str(),
            "Container created"
        );

        Ok(container)
    }

    /// Load packages into an Available container
    pub fn load_container_with_packages(
        &self,
        ctx: &TxContext<'_>,
        hash_id: &str,
        load: PackageLoad,
    ) -> Result<Container> {
        let mut container: Container = ctx.read_or_default(hash_id)?;
        validator::require_available(hash_id, &container)?;

        container.timestamp = load.timestamp;
        container.status = Some(load.status);
        container.loaded_items = load.loaded_items;
        container.custom_clearance_status = load.custom_clearance;
        container.shipped_from = load.shipped_from;
        container.shipped_to = load.shipped_to;
        container.container_location = load.location;

        ctx.put(hash_id, &container)?;

        tracing::info!(container = hash_id, status = %container.status_str(), "Packages loaded");
        Ok(container)
    }

    /// Create a cargo and associate its containers
    ///
    /// Writes the cargo first, then each listed container in list order with
    /// `cargo_id`, timestamp, `InCargo` status and the cargo's location. A
    /// container id with no record gets a zero-value record carrying just
    /// those fields.
    pub fn create_cargo_and_load_containers(
        &self,
        ctx: &TxContext<'_>,
        req: NewCargo,
    ) -> Result<Cargo> {
        let cargo = Cargo {
            hash_id: req.hash_id,
            txn_id: req.txn_id,
            timestamp: req.timestamp,
            cargo_id: req.cargo_id,
            shipped_from: req.shipped_from,
            shipped_to: req.shipped_to,
            cargo_location: req.location,
            transportation_type: req.transport_type,
            container_qty: req.container_qty,
            owner: req.owner,
            associated_container_hash_ids: req.container_ids,
            status: req.status,
        };

        if self.atomic_bulk_association && ctx.store().supports_atomic_batch() {
            let mut writes = Vec::with_capacity(cargo.associated_container_hash_ids.len() + 1);
            writes.push(Write::put(cargo.hash_id.clone(), codec::encode(&cargo)?));

            for container_id in &cargo.associated_container_hash_ids {
                let container = self.associated_container(ctx, &cargo, container_id)?;
                writes.push(Write::put(container_id.clone(), codec::encode(&container)?));
            }

            ctx.commit(&writes)?;
        } else {
            ctx.put(&cargo.hash_id, &cargo)?;

            for (written, container_id) in cargo.associated_container_hash_ids.iter().enumerate() {
                let result = self
                    .associated_container(ctx, &cargo, container_id)
                    .and_then(|container| ctx.put(container_id, &container));

                if let Err(e) = result {
                    tracing::warn!(
                        cargo = %cargo.hash_id,
                        container = %container_id,
                        containers_written = written,
                        error = %e,
                        "Container association stopped part way; earlier writes remain"
                    );
                    return Err(e);
                }
            }
        }

        tracing::info!(
            cargo = %cargo.hash_id,
            containers = cargo.associated_container_hash_ids.len(),
            status = %cargo.status,
            "Cargo created and containers loaded"
        );

        Ok(cargo)
    }

    fn associated_container(
        &self,
        ctx: &TxContext<'_>,
        cargo: &Cargo,
        container_id: &str,
    ) -> Result<Container> {
        let mut container = match ctx.read::<Container>(container_id)? {
            Some(container) => container,
            None => {
                tracing::warn!(
                    cargo = %cargo.hash_id,
                    container = container_id,
                    "Associated container has no record; writing zero-value container"
                );
                Container::default()
            }
        };

        container.cargo_id = cargo.hash_id.clone();
        container.timestamp = cargo.timestamp.clone();
        container.status = Some(ContainerStatus::InCargo);
        container.container_location = cargo.cargo_location.clone();
        Ok(container)
    }

    /// Overwrite cargo attributes and replace its association list
    ///
    /// Container `cargo_id` back-references are not updated.
    pub fn update_cargo_attributes(
        &self,
        ctx: &TxContext<'_>,
        hash_id: &str,
        update: CargoUpdate,
    ) -> Result<Cargo> {
        let mut cargo: Cargo = validator::require_existing(ctx, hash_id)?;

        cargo.txn_id = update.txn_id;
        cargo.timestamp = update.timestamp;
        cargo.shipped_from = update.shipped_from;
        cargo.shipped_to = update.shipped_to;
        cargo.transportation_type = update.transport_type;
        cargo.container_qty = update.container_qty;
        cargo.associated_container_hash_ids = update.container_ids;
        cargo.status = update.status;

        ctx.put(hash_id, &cargo)?;

        tracing::info!(cargo = hash_id, status = %cargo.status, "Cargo attributes updated");
        Ok(cargo)
    }

    /// Move a cargo and every associated container to a new location
    pub fn update_cargo_coordinates(
        &self,
        ctx: &TxContext<'_>,
        hash_id: &str,
        timestamp: &str,
        location: &str,
    ) -> Result<Cargo> {
        let mut cargo: Cargo = validator::require_existing(ctx, hash_id)?;

        cargo.timestamp = timestamp.to_string();
        cargo.cargo_location = location.to_string();
        ctx.put(hash_id, &cargo)?;

        for (written, container_id) in cargo.associated_container_hash_ids.iter().enumerate() {
            let result = ctx.read::<Container>(container_id).and_then(|existing| {
                let mut container = existing.unwrap_or_else(|| {
                    tracing::warn!(
                        cargo = hash_id,
                        container = %container_id,
                        "Associated container has no record; writing zero-value container"
                    );
                    Container::default()
                });
                container.container_location = location.to_string();
                ctx.put(container_id, &container)
            });

            if let Err(e) = result {
                tracing::warn!(
                    cargo = hash_id,
                    container = %container_id,
                    containers_written = written,
                    error = %e,
                    "Coordinate propagation stopped part way; earlier writes remain"
                );
                return Err(e);
            }
        }

        tracing::info!(
            cargo = hash_id,
            location,
            containers = cargo.associated_container_hash_ids.len(),
            "Cargo coordinates updated"
        );

        Ok(cargo)
    }

    /// Record a cargo custody change; the new owner's role is not checked
    pub fn change_cargo_custody(
        &self,
        ctx: &TxContext<'_>,
        hash_id: &str,
        new_owner: &str,
    ) -> Result<Cargo> {
        let mut cargo: Cargo = validator::require_existing(ctx, hash_id)?;
        let previous = std::mem::replace(&mut cargo.owner, new_owner.to_string());

        ctx.put(hash_id, &cargo)?;

        tracing::info!(cargo = hash_id, from = %previous, to = new_owner, "Cargo custody changed");
        Ok(cargo)
    }

    /// Record a container custody change; the new owner's role is not checked
    pub fn change_container_custody(
        &self,
        ctx: &TxContext<'_>,
        hash_id: &str,
        new_owner: &str,
    ) -> Result<Container> {
        let mut container: Container = validator::require_existing(ctx, hash_id)?;
        let previous = std::mem::replace(&mut container.owner, new_owner.to_string());

        ctx.put(hash_id, &container)?;

        tracing::info!(
            container = hash_id,
            from = %previous,
            to = new_owner,
            "Container custody changed"
        );
        Ok(container)
    }

    /// Overwrite every mutable container field except `cargo_id`
    pub fn update_container_attributes(
        &self,
        ctx: &TxContext<'_>,
        hash_id: &str,
        update: ContainerUpdate,
    ) -> Result<Container> {
        let mut container: Container = validator::require_existing(ctx, hash_id)?;

        container.timestamp = update.timestamp;
        container.manufacturer = update.manufacturer;
        container.status = Some(update.status);
        container.loaded_items = update.loaded_items;
        container.custom_clearance_status = update.custom_clearance;
        container.shipped_from = update.shipped_from;
        container.shipped_to = update.shipped_to;
        container.container_location = update.location;

        ctx.put(hash_id, &container)?;

        tracing::info!(
            container = hash_id,
            status = %container.status_str(),
            "Container attributes updated"
        );
        Ok(container)
    }

    /// Remove a container from a cargo and mark it Unloaded
    ///
    /// Removal swaps the last id into the removed slot, so the order of the
    /// remaining ids can change. Unloading an id that is not listed leaves
    /// the list as is but still marks the container Unloaded.
    pub fn unload_container_from_cargo(
        &self,
        ctx: &TxContext<'_>,
        cargo_hash_id: &str,
        container_hash_id: &str,
    ) -> Result<Cargo> {
        let mut cargo: Cargo = validator::require_existing(ctx, cargo_hash_id)?;

        let removed = match cargo
            .associated_container_hash_ids
            .iter()
            .position(|id| id == container_hash_id)
        {
            Some(index) => {
                cargo.associated_container_hash_ids.swap_remove(index);
                true
            }
            None => false,
        };

        ctx.put(cargo_hash_id, &cargo)?;

        let mut container: Container = ctx.read_or_default(container_hash_id)?;
        container.status = Some(ContainerStatus::Unloaded);
        ctx.put(container_hash_id, &container)?;

        tracing::info!(
            cargo = cargo_hash_id,
            container = container_hash_id,
            removed,
            "Container unloaded"
        );

        Ok(cargo)
    }
}
