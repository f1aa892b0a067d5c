//! Domain records stored on the ledger
//!
//! Field names serialize in camelCase so records stay readable by the
//! existing client applications that query the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record kind, written alongside each record as `docType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Shipping container
    Container,
    /// Cargo consignment
    Cargo,
    /// Registered participant
    Participant,
}

impl EntityKind {
    /// Stable label
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Container => "container",
            EntityKind::Cargo => "cargo",
            EntityKind::Participant => "participant",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Container lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerStatus {
    /// Granted to a transporter, empty
    Available,
    /// Packages loaded
    Loaded,
    /// Associated with a cargo consignment
    InCargo,
    /// Removed from its cargo (terminal)
    Unloaded,
    /// Held for customs clearance
    CustomsPending,
}

impl ContainerStatus {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Available => "Available",
            ContainerStatus::Loaded => "Loaded",
            ContainerStatus::InCargo => "InCargo",
            ContainerStatus::Unloaded => "Unloaded",
            ContainerStatus::CustomsPending => "CustomsPending",
        }
    }

    /// Parse from wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Available" => Some(ContainerStatus::Available),
            "Loaded" => Some(ContainerStatus::Loaded),
            "InCargo" => Some(ContainerStatus::InCargo),
            "Unloaded" => Some(ContainerStatus::Unloaded),
            "CustomsPending" => Some(ContainerStatus::CustomsPending),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serializes a missing status as `""`, the zero value older records carry
mod status_field {
    use super::ContainerStatus;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        status: &Option<ContainerStatus>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(status.map_or("", |s| s.as_str()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ContainerStatus>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        ContainerStatus::parse(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unknown container status {:?}", raw)))
    }
}

/// Shipping container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    /// Ledger key
    pub hash_id: String,
    /// Caller-supplied time of the last change
    pub timestamp: String,
    /// Manufacturer
    pub manufacturer: String,
    /// Lifecycle status, `None` on a zero-value record
    #[serde(with = "status_field")]
    pub status: Option<ContainerStatus>,
    /// Free-form description of the packages inside
    pub loaded_items: String,
    /// Participant hashId of the current custodian
    pub owner: String,
    /// hashId of the owning cargo, empty when unassociated
    pub cargo_id: String,
    /// Customs clearance status
    pub custom_clearance_status: String,
    /// Origin
    pub shipped_from: String,
    /// Destination
    pub shipped_to: String,
    /// Current location
    pub container_location: String,
}

impl Container {
    /// Status as written on the wire
    pub fn status_str(&self) -> &'static str {
        self.status.map_or("", |s| s.as_str())
    }
}

/// Cargo status
///
/// Free text: `Ready`, `In-Transit` and `Arrived` are customary but any value
/// supplied by the caller is stored as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CargoStatus(String);

impl CargoStatus {
    /// Consignment assembled
    pub const READY: &'static str = "Ready";
    /// Consignment moving
    pub const IN_TRANSIT: &'static str = "In-Transit";
    /// Consignment delivered
    pub const ARRIVED: &'static str = "Arrived";

    /// Create new status
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CargoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cargo consignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cargo {
    /// Ledger key
    pub hash_id: String,
    /// Caller transaction reference
    pub txn_id: String,
    /// Caller-supplied time of the last change
    pub timestamp: String,
    /// Human-facing identifier
    pub cargo_id: String,
    /// Origin
    pub shipped_from: String,
    /// Destination
    pub shipped_to: String,
    /// Current location
    pub cargo_location: String,
    /// Sea, air, rail, road...
    pub transportation_type: String,
    /// Declared container count
    pub container_qty: String,
    /// Participant hashId of the current custodian
    pub owner: String,
    /// Container hashIds in mutation order, duplicates allowed
    pub associated_container_hash_ids: Vec<String>,
    /// Free-text status
    pub status: CargoStatus,
}

/// Participant role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticipantRole {
    /// Grants containers to transporters
    ContainerSupplier,
    /// Holds and moves containers
    Transporter,
    /// Ships goods out
    Exporter,
    /// Receives goods
    Importer,
    /// Clears customs
    CustomsOfficer,
}

impl ParticipantRole {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::ContainerSupplier => "Container Supplier",
            ParticipantRole::Transporter => "Transporter",
            ParticipantRole::Exporter => "Exporter",
            ParticipantRole::Importer => "Importer",
            ParticipantRole::CustomsOfficer => "Customs Officer",
        }
    }

    /// Parse from wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Container Supplier" => Some(ParticipantRole::ContainerSupplier),
            "Transporter" => Some(ParticipantRole::Transporter),
            "Exporter" => Some(ParticipantRole::Exporter),
            "Importer" => Some(ParticipantRole::Importer),
            "Customs Officer" => Some(ParticipantRole::CustomsOfficer),
            _ => None,
        }
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registered participant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Participant {
    /// Ledger key
    pub hash_id: String,
    /// Display name
    pub name: String,
    /// Contact address
    pub email_id: String,
    /// Role name, see [`ParticipantRole`]
    pub role: String,
}

/// One revision in an entity's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry<T> {
    /// Ledger transaction that wrote the revision
    pub tx_id: String,
    /// Commit time
    pub timestamp: DateTime<Utc>,
    /// Revision was a delete; `value` is then the zero value
    pub is_delete: bool,
    /// Snapshot of the record
    pub value: T,
}

/// Payload of the status list queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerList {
    /// Matching containers in scan order
    pub containers: Vec<Container>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_status_from_str() {
        assert_eq!(ContainerStatus::parse("InCargo"), Some(ContainerStatus::InCargo));
        assert_eq!(ContainerStatus::parse("In-Transit"), None);
    }

    #[test]
    fn test_participant_role_from_str() {
        assert_eq!(
            ParticipantRole::parse("Customs Officer"),
            Some(ParticipantRole::CustomsOfficer)
        );
        assert_eq!(ParticipantRole::parse("transporter"), None);
    }

    #[test]
    fn test_zero_value_container_wire_form() {
        let json = serde_json::to_value(Container::default()).unwrap();
        assert_eq!(json["status"], "");
        assert_eq!(json["cargoId"], "");
        assert_eq!(json["containerLocation"], "");
    }

    #[test]
    fn test_container_rejects_unknown_status() {
        let err = serde_json::from_str::<Container>(r#"{"status":"Lost"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown container status"));
    }

    #[test]
    fn test_cargo_wire_names() {
        let cargo = Cargo {
            hash_id: "C1".into(),
            associated_container_hash_ids: vec!["1001".into()],
            status: CargoStatus::new(CargoStatus::IN_TRANSIT),
            ..Default::default()
        };
        let json = serde_json::to_value(&cargo).unwrap();
        assert_eq!(json["hashId"], "C1");
        assert_eq!(json["associatedContainerHashIds"][0], "1001");
        assert_eq!(json["status"], "In-Transit");
    }
}
