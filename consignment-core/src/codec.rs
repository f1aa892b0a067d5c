//! Entity codec
//!
//! Records are stored as JSON objects tagged with a `docType` field so a key
//! range holding several kinds of record can be filtered without guessing.
//! Pure functions, no I/O.

use crate::{
    types::{Cargo, Container, EntityKind, Participant},
    Error, Result,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A record type that lives under its own ledger key
pub trait Entity: Serialize + DeserializeOwned + Default + Clone {
    /// Tag written as `docType`
    const KIND: EntityKind;

    /// Ledger key of this record
    fn hash_id(&self) -> &str;
}

/// An entity that can be filtered by status
pub trait StatusBearing: Entity {
    /// Current status as written on the wire
    fn status_str(&self) -> &str;
}

impl Entity for Container {
    const KIND: EntityKind = EntityKind::Container;

    fn hash_id(&self) -> &str {
        &self.hash_id
    }
}

impl StatusBearing for Container {
    fn status_str(&self) -> &str {
        Container::status_str(self)
    }
}

impl Entity for Cargo {
    const KIND: EntityKind = EntityKind::Cargo;

    fn hash_id(&self) -> &str {
        &self.hash_id
    }
}

impl StatusBearing for Cargo {
    fn status_str(&self) -> &str {
        self.status.as_str()
    }
}

impl Entity for Participant {
    const KIND: EntityKind = EntityKind::Participant;

    fn hash_id(&self) -> &str {
        &self.hash_id
    }
}

#[derive(Serialize)]
struct TaggedRef<'a, T> {
    #[serde(rename = "docType")]
    doc_type: EntityKind,
    #[serde(flatten)]
    entity: &'a T,
}

#[derive(Deserialize)]
struct Tagged<T> {
    #[serde(rename = "docType", default)]
    doc_type: Option<String>,
    #[serde(flatten)]
    entity: T,
}

#[derive(Deserialize)]
struct TagOnly {
    #[serde(rename = "docType", default)]
    doc_type: Option<String>,
}

/// Encode a record for the ledger
pub fn encode<T: Entity>(entity: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&TaggedRef {
        doc_type: T::KIND,
        entity,
    })?)
}

/// Decode a record stored under `key`
///
/// Untagged records are accepted as `T`; a record tagged with another kind
/// fails with [`Error::KindMismatch`].
pub fn decode<T: Entity>(key: &str, bytes: &[u8]) -> Result<T> {
    let tagged: Tagged<T> = serde_json::from_slice(bytes)?;
    match tagged.doc_type {
        Some(found) if found != T::KIND.as_str() => Err(Error::KindMismatch {
            key: key.to_string(),
            expected: T::KIND.to_string(),
            found,
        }),
        _ => Ok(tagged.entity),
    }
}

/// Read only the `docType` tag
pub fn peek_kind(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<TagOnly>(bytes)
        .ok()
        .and_then(|tag| tag.doc_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CargoStatus, ContainerStatus};

    fn sample_container() -> Container {
        Container {
            hash_id: "1001".into(),
            timestamp: "2024-03-01T10:00:00Z".into(),
            manufacturer: "Maersk".into(),
            status: Some(ContainerStatus::Loaded),
            loaded_items: "40 pallets".into(),
            owner: "P-TRANS".into(),
            cargo_id: String::new(),
            custom_clearance_status: "Pending".into(),
            shipped_from: "Rotterdam".into(),
            shipped_to: "Singapore".into(),
            container_location: "Rotterdam".into(),
        }
    }

    #[test]
    fn test_container_round_trip() {
        let container = sample_container();
        let bytes = encode(&container).unwrap();
        assert_eq!(decode::<Container>("1001", &bytes).unwrap(), container);
    }

    #[test]
    fn test_cargo_round_trip() {
        let cargo = Cargo {
            hash_id: "C1".into(),
            txn_id: "T-9".into(),
            cargo_id: "CARGO-1".into(),
            associated_container_hash_ids: vec!["1001".into(), "1001".into()],
            status: CargoStatus::new(CargoStatus::READY),
            ..Default::default()
        };
        let bytes = encode(&cargo).unwrap();
        assert_eq!(decode::<Cargo>("C1", &bytes).unwrap(), cargo);
    }

    #[test]
    fn test_encoded_record_is_tagged() {
        let bytes = encode(&sample_container()).unwrap();
        assert_eq!(peek_kind(&bytes).as_deref(), Some("container"));

        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["docType"], "container");
        assert_eq!(json["loadedItems"], "40 pallets");
    }

    #[test]
    fn test_decode_kind_mismatch() {
        let bytes = encode(&Cargo::default()).unwrap();
        let err = decode::<Container>("C1", &bytes).unwrap_err();
        assert!(matches!(err, Error::KindMismatch { ref found, .. } if found == "cargo"));
    }

    #[test]
    fn test_decode_untagged_record() {
        let bytes = br#"{"hashId":"P1","name":"Acme","emailId":"ops@acme.test","role":"Exporter"}"#;
        let participant: Participant = decode("P1", bytes).unwrap();
        assert_eq!(participant.role, "Exporter");
        assert_eq!(peek_kind(bytes), None);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode::<Container>("1001", b"not json"),
            Err(Error::Codec(_))
        ));
    }
}
